//! Tag sets: the argument of every registration call.
//!
//! A call may name tags as a sequence (each valued `1`) or as a mapping of
//! tag name to value. Both normalize to an ordered mapping, and an empty set
//! normalizes to `{"is": 1}`.

use indexmap::IndexMap;

use crate::value::TagValue;

/// Tag name used when a call names no tags at all.
pub const DEFAULT_TAG: &str = "is";

/// Ordered tag name → value mapping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagSet {
    entries: IndexMap<String, TagValue>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: add a tag with an explicit value.
    pub fn with(mut self, tag: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.entries.insert(tag.into(), value.into());
        self
    }

    /// Builder method: add a tag with the default value.
    pub fn flag(self, tag: impl Into<String>) -> Self {
        self.with(tag, TagValue::default())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalized entries, substituting `{"is": 1}` for an empty set.
    pub fn into_entries(self) -> IndexMap<String, TagValue> {
        if self.entries.is_empty() {
            IndexMap::from([(DEFAULT_TAG.to_string(), TagValue::default())])
        } else {
            self.entries
        }
    }
}

impl From<&str> for TagSet {
    fn from(tag: &str) -> Self {
        TagSet::new().flag(tag)
    }
}

impl From<String> for TagSet {
    fn from(tag: String) -> Self {
        TagSet::new().flag(tag)
    }
}

impl From<&[&str]> for TagSet {
    fn from(tags: &[&str]) -> Self {
        tags.iter().copied().collect()
    }
}

impl<const N: usize> From<[&str; N]> for TagSet {
    fn from(tags: [&str; N]) -> Self {
        tags.into_iter().collect()
    }
}

impl From<Vec<&str>> for TagSet {
    fn from(tags: Vec<&str>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<Vec<String>> for TagSet {
    fn from(tags: Vec<String>) -> Self {
        Self {
            entries: tags.into_iter().map(|t| (t, TagValue::default())).collect(),
        }
    }
}

impl<V: Into<TagValue>, const N: usize> From<[(&str, V); N]> for TagSet {
    fn from(pairs: [(&str, V); N]) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        }
    }
}

impl From<IndexMap<String, TagValue>> for TagSet {
    fn from(entries: IndexMap<String, TagValue>) -> Self {
        Self { entries }
    }
}

impl<'a> FromIterator<&'a str> for TagSet {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|t| (t.to_string(), TagValue::default()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_means_is() {
        let entries = TagSet::new().into_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.get("is"), Some(&TagValue::Int(1)));

        let entries = TagSet::from(Vec::<&str>::new()).into_entries();
        assert_eq!(entries.get("is"), Some(&TagValue::Int(1)));
    }

    #[test]
    fn sequence_values_default_to_one() {
        let entries = TagSet::from(["class", "pureperl"]).into_entries();
        assert_eq!(
            entries.into_iter().collect::<Vec<_>>(),
            vec![
                ("class".to_string(), TagValue::Int(1)),
                ("pureperl".to_string(), TagValue::Int(1)),
            ]
        );
    }

    #[test]
    fn mapping_keeps_caller_order() {
        let entries = TagSet::from([("class", "is awesome"), ("author", "metadoo")]).into_entries();
        let keys: Vec<_> = entries.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["class", "author"]);
        assert_eq!(entries["class"], TagValue::from("is awesome"));
    }

    #[test]
    fn repeated_name_keeps_last_value() {
        let set = TagSet::new().with("x", 1).with("x", 2);
        assert_eq!(set.len(), 1);
        assert_eq!(set.into_entries()["x"], TagValue::Int(2));
    }
}
