//! Traits implemented by `hierarchy!`-generated class markers.

use crate::target::Target;

/// Zero-sized marker standing for one class of a compile-time hierarchy.
pub trait ClassMarker {
    /// Full class name, as used in the registry.
    const NAME: &'static str;
    /// Direct parents, in declaration order.
    const PARENTS: &'static [&'static str];

    /// The class as a tag target.
    #[inline]
    fn target() -> Target<'static> {
        Target::Type(Self::NAME)
    }
}
