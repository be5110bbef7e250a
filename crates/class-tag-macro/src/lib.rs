use std::collections::HashMap;

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{braced, Error, Ident, LitStr, Result, Token, Visibility};

use proc_macro_crate::{crate_name, FoundCrate};

/// Parsed attributes for a class.
#[derive(Clone, Default)]
struct ClassAttrs {
    /// Registry name override (#[name = "Class::Tag"])
    name: Option<LitStr>,
    /// Host-defined members (#[members(import, new)])
    members: Vec<Ident>,
}

struct ClassNode {
    ident: Ident,
    attrs: ClassAttrs,
    parents: Vec<Ident>,
}

impl ClassNode {
    /// Name the class is registered under.
    fn name(&self) -> String {
        match &self.attrs.name {
            Some(lit) => lit.value(),
            None => self.ident.to_string(),
        }
    }
}

struct HierarchyInput {
    vis: Visibility,
    root: Ident,
    classes: Vec<ClassNode>,
}

impl Parse for HierarchyInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let vis: Visibility = input.parse()?;
        input.parse::<Token![mod]>()?;
        let root: Ident = input.parse()?;
        let content;
        braced!(content in input);
        let classes = parse_classes(&content)?;
        Ok(Self {
            vis,
            root,
            classes,
        })
    }
}

fn parse_classes(input: ParseStream) -> Result<Vec<ClassNode>> {
    let mut classes = Vec::new();
    while !input.is_empty() {
        let attrs = parse_all_attrs(input)?;
        let ident: Ident = input.parse()?;

        // Parents: `Name: A, B;`
        let mut parents = Vec::new();
        if input.peek(Token![:]) {
            input.parse::<Token![:]>()?;
            loop {
                parents.push(input.parse::<Ident>()?);
                if input.peek(Token![,]) {
                    input.parse::<Token![,]>()?;
                } else {
                    break;
                }
            }
        }

        input.parse::<Token![;]>()?;
        classes.push(ClassNode {
            ident,
            attrs,
            parents,
        });
    }
    Ok(classes)
}

/// Parse all attributes into ClassAttrs.
///
/// Handles:
/// - `#[name = "Some::Class"]`
/// - `#[members(a, b)]`
fn parse_all_attrs(input: ParseStream) -> Result<ClassAttrs> {
    let mut result = ClassAttrs::default();

    while input.peek(Token![#]) {
        input.parse::<Token![#]>()?;
        let content;
        syn::bracketed!(content in input);

        let key: Ident = content.parse()?;

        if key == "name" {
            content.parse::<Token![=]>()?;
            let name: LitStr = content.parse()?;
            if name.value().is_empty() {
                return Err(Error::new(name.span(), "class name cannot be empty"));
            }
            result.name = Some(name);
        } else if key == "members" {
            let inner;
            syn::parenthesized!(inner in content);
            let members = Punctuated::<Ident, Token![,]>::parse_terminated(&inner)?;
            result.members.extend(members);
        } else {
            return Err(Error::new(
                key.span(),
                format!("unknown class attribute `{}`, expected `name` or `members`", key),
            ));
        }
    }

    Ok(result)
}

// =============================================================================
// Validation (runs at macro expansion time)
// =============================================================================

/// Resolve every parent ident to its registry name.
///
/// Rejects duplicate classes, unknown or repeated parents and self-parenting.
fn resolve_parents(classes: &[ClassNode]) -> Result<Vec<Vec<String>>> {
    let mut by_ident: HashMap<String, String> = HashMap::new();
    let mut names: HashMap<String, &Ident> = HashMap::new();

    for class in classes {
        let name = class.name();
        if by_ident
            .insert(class.ident.to_string(), name.clone())
            .is_some()
        {
            return Err(Error::new(
                class.ident.span(),
                format!("class `{}` declared twice", class.ident),
            ));
        }
        if let Some(first) = names.insert(name.clone(), &class.ident) {
            return Err(Error::new(
                class.ident.span(),
                format!("class name \"{}\" already used by `{}`", name, first),
            ));
        }
    }

    classes
        .iter()
        .map(|class| {
            class
                .parents
                .iter()
                .enumerate()
                .map(|(i, parent)| {
                    if class.parents[..i].contains(parent) {
                        return Err(Error::new(
                            parent.span(),
                            format!("parent `{}` listed twice for `{}`", parent, class.ident),
                        ));
                    }
                    if *parent == class.ident {
                        return Err(Error::new(
                            parent.span(),
                            format!("class `{}` cannot inherit from itself", parent),
                        ));
                    }
                    by_ident.get(&parent.to_string()).cloned().ok_or_else(|| {
                        Error::new(
                            parent.span(),
                            format!("unknown parent class `{}`", parent),
                        )
                    })
                })
                .collect()
        })
        .collect()
}

// =============================================================================
// Crate path resolution
// =============================================================================

fn class_tag_crate_path() -> TokenStream2 {
    match crate_name("class-tag") {
        Ok(FoundCrate::Itself) => {
            quote!(::class_tag)
        }
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Err(_) => quote!(::class_tag),
    }
}

// =============================================================================
// Code generation
// =============================================================================

/// Generate one marker module per class.
///
/// Example:
/// ```ignore
/// hierarchy! {
///     pub mod Classes {
///         Foo;
///         Bar: Foo;
///         #[name = "Class::Tag"]
///         ClassTag;
///     }
/// }
///
/// // Generates:
/// #[allow(non_snake_case)]
/// pub mod Classes {
///     pub mod Foo {
///         pub struct Class;
///         pub const NAME: &str = "Foo";
///     }
///     pub mod Bar {
///         pub struct Class;
///         pub const NAME: &str = "Bar";
///         pub const PARENTS: &[&str] = &["Foo"];
///     }
///     pub mod ClassTag {
///         pub struct Class;
///         pub const NAME: &str = "Class::Tag";
///     }
/// }
///
/// // Usage:
/// registry.get("Awesome", "class", Classes::Bar::NAME)
/// <Classes::Bar::Class as ClassMarker>::target()
/// ```
fn generate_classes(
    classes: &[ClassNode],
    parents: &[Vec<String>],
    ct_crate: &TokenStream2,
) -> Vec<TokenStream2> {
    classes
        .iter()
        .zip(parents)
        .map(|(class, parents)| {
            let ident = &class.ident;
            let name_lit = LitStr::new(&class.name(), Span::call_site());
            let parent_lits: Vec<LitStr> = parents
                .iter()
                .map(|p| LitStr::new(p, Span::call_site()))
                .collect();

            quote! {
                #[allow(non_snake_case)]
                pub mod #ident {
                    /// Zero-sized marker type for this class.
                    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
                    pub struct Class;

                    impl Class {
                        /// Registry name.
                        pub const NAME: &'static str = #name_lit;

                        /// Direct parents, in declaration order.
                        pub const PARENTS: &'static [&'static str] = &[#(#parent_lits),*];
                    }

                    impl core::fmt::Display for Class {
                        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                            f.write_str(Self::NAME)
                        }
                    }

                    impl #ct_crate::ClassMarker for Class {
                        const NAME: &'static str = #name_lit;
                        const PARENTS: &'static [&'static str] = Class::PARENTS;
                    }

                    // Module-level convenience constants
                    pub const NAME: &'static str = Class::NAME;
                    pub const PARENTS: &'static [&'static str] = Class::PARENTS;
                }
            }
        })
        .collect()
}

/// Generate `ClassDef` entries.
fn collect_defs(
    classes: &[ClassNode],
    parents: &[Vec<String>],
    ct_crate: &TokenStream2,
) -> Vec<TokenStream2> {
    classes
        .iter()
        .zip(parents)
        .map(|(class, parents)| {
            let name_lit = LitStr::new(&class.name(), Span::call_site());
            let parent_lits = parents.iter().map(|p| LitStr::new(p, Span::call_site()));
            let member_lits = class
                .attrs
                .members
                .iter()
                .map(|m| LitStr::new(&m.to_string(), Span::call_site()));

            quote! {
                #ct_crate::ClassDef {
                    name: #name_lit,
                    parents: &[#(#parent_lits),*],
                    members: &[#(#member_lits),*],
                },
            }
        })
        .collect()
}

fn expand(input: HierarchyInput, ct_crate: &TokenStream2) -> Result<TokenStream2> {
    // 1. Validate names and resolve parents
    let parents = resolve_parents(&input.classes)?;

    // 2. Generate marker modules
    let markers = generate_classes(&input.classes, &parents, ct_crate);

    // 3. Generate ClassDef entries
    let defs = collect_defs(&input.classes, &parents, ct_crate);

    // 4. Assemble
    let vis = input.vis;
    let root = input.root;
    let class_count = input.classes.len();

    Ok(quote! {
        #[allow(non_snake_case, non_camel_case_types)]
        #vis mod #root {
            /// Total number of classes.
            pub const CLASS_COUNT: usize = #class_count;

            /// Flat ClassDef table (for `ClassGraph::build`).
            pub const DEFINITIONS: &'static [#ct_crate::ClassDef] = &[
                #(#defs)*
            ];

            #(#markers)*
        }
    })
}

// =============================================================================
// Entry point
// =============================================================================

/// Declare a class hierarchy at compile time.
///
/// ```ignore
/// hierarchy! {
///     pub mod Classes {
///         Foo;
///         #[members(import)]
///         Awesome;
///         Bar: Foo;
///         Baz: Bar, Awesome;
///     }
/// }
///
/// let graph = ClassGraph::build(Classes::DEFINITIONS)?;
/// ```
#[proc_macro]
pub fn hierarchy(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as HierarchyInput);
    let ct_crate = class_tag_crate_path();

    match expand(input, &ct_crate) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
