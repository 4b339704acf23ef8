//! Subdirectory selections that narrow which parts of a pack are archived.
//!
//! A selection maps a parent directory name onto the child directory names to
//! retain beneath it, for example `{"tiles":["dxt"],"spritesheets":["png","xml"]}`.
//! Siblings of a retained child are left out of the archive; parents that are
//! not mentioned are archived in full.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::SelectionError;

/// Parent directory name to retained child names.
///
/// Parents are held in ascending byte order so every consumer sees the same
/// iteration order regardless of how the selection was supplied. Each child
/// list keeps its supplied order and is never empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSpec {
    parents: BTreeMap<String, Vec<String>>,
}

impl SelectionSpec {
    /// Returns a selection that keeps every directory.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a selection from its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectionError`] when the text is not a JSON object, or when
    /// any value is not a non-empty array of strings.
    ///
    /// # Examples
    ///
    /// ```
    /// use asset_pack_cache::SelectionSpec;
    ///
    /// let spec = SelectionSpec::from_json(r#"{"tiles":["dxt"]}"#)?;
    /// assert!(spec.retains("tiles", "dxt"));
    /// assert!(!spec.retains("tiles", "png"));
    /// assert!(spec.retains("sounds", "ogg"));
    /// # Ok::<(), asset_pack_cache::SelectionError>(())
    /// ```
    pub fn from_json(text: &str) -> Result<Self, SelectionError> {
        let value: Value = serde_json::from_str(text).map_err(SelectionError::Malformed)?;
        let Value::Object(object) = value else {
            return Err(SelectionError::NotAnObject);
        };

        let mut spec = Self::empty();
        for (parent, value) in object {
            let children = parse_children(&parent, value)?;
            spec.parents.insert(parent, children);
        }
        Ok(spec)
    }

    /// Adds or replaces the retained children for `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::Empty`] if `children` yields nothing.
    pub fn insert<I, S>(
        &mut self,
        parent: impl Into<String>,
        children: I,
    ) -> Result<(), SelectionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = parent.into();
        let retained: Vec<String> = children.into_iter().map(Into::into).collect();
        if retained.is_empty() {
            return Err(SelectionError::Empty { parent: name });
        }
        self.parents.insert(name, retained);
        Ok(())
    }

    /// Returns `true` when no parent is filtered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Iterates parents in ascending name order with their retained children.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.parents
            .iter()
            .map(|(parent, children)| (parent.as_str(), children.as_slice()))
    }

    /// Returns `true` if the selection narrows the children of `parent`.
    #[must_use]
    pub fn filters(&self, parent: &str) -> bool {
        self.parents.contains_key(parent)
    }

    /// Decides whether directory `child`, found directly beneath a directory
    /// named `parent`, belongs in the archive.
    #[must_use]
    pub fn retains(&self, parent: &str, child: &str) -> bool {
        self.parents
            .get(parent)
            .is_none_or(|children| children.iter().any(|name| name == child))
    }
}

fn parse_children(parent: &str, children: Value) -> Result<Vec<String>, SelectionError> {
    let Value::Array(items) = children else {
        return Err(SelectionError::NotAnArray {
            parent: parent.to_owned(),
        });
    };
    if items.is_empty() {
        return Err(SelectionError::Empty {
            parent: parent.to_owned(),
        });
    }
    items
        .into_iter()
        .map(|item| match item {
            Value::String(name) => Ok(name),
            _ => Err(SelectionError::NonStringEntry {
                parent: parent.to_owned(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_parents_in_sorted_order() {
        let spec = SelectionSpec::from_json(r#"{"tiles":["dxt"],"spritesheets":["png","xml"]}"#)
            .expect("valid selection");
        let parents: Vec<&str> = spec.iter().map(|(parent, _)| parent).collect();
        assert_eq!(parents, ["spritesheets", "tiles"]);
    }

    #[test]
    fn keeps_child_order_as_supplied() {
        let spec = SelectionSpec::from_json(r#"{"spritesheets":["xml","png"]}"#)
            .expect("valid selection");
        let (_, children) = spec.iter().next().expect("one parent");
        assert_eq!(children, ["xml", "png"]);
    }

    #[test]
    fn empty_object_selects_everything() {
        let spec = SelectionSpec::from_json("{}").expect("valid selection");
        assert!(spec.is_empty());
        assert!(spec.retains("tiles", "png"));
    }

    #[rstest]
    #[case::not_json("{tiles", "not valid JSON")]
    #[case::array(r#"["tiles"]"#, "must be a JSON object")]
    #[case::scalar("7", "must be a JSON object")]
    #[case::value_not_array(r#"{"tiles":"dxt"}"#, "must be an array")]
    #[case::empty_array(r#"{"tiles":[]}"#, "at least one subdirectory")]
    #[case::non_string(r#"{"tiles":[3]}"#, "only contain directory names")]
    fn rejects_malformed_selections(#[case] text: &str, #[case] expected: &str) {
        let err = SelectionSpec::from_json(text).expect_err("selection should be rejected");
        assert!(
            err.to_string().contains(expected),
            "unexpected error for {text}: {err}"
        );
    }

    #[test]
    fn insert_rejects_empty_children() {
        let mut spec = SelectionSpec::empty();
        let err = spec
            .insert("tiles", Vec::<String>::new())
            .expect_err("empty list must be rejected");
        assert!(matches!(err, SelectionError::Empty { parent } if parent == "tiles"));
        assert!(spec.is_empty());
    }

    #[rstest]
    #[case("tiles", "dxt", true)]
    #[case("tiles", "png", false)]
    #[case("sounds", "png", true)]
    fn retains_only_listed_children_of_named_parents(
        #[case] parent: &str,
        #[case] child: &str,
        #[case] expected: bool,
    ) {
        let mut spec = SelectionSpec::empty();
        spec.insert("tiles", ["dxt"]).expect("insert");
        assert_eq!(spec.retains(parent, child), expected);
    }

    #[test]
    fn filters_only_named_parents() {
        let spec = SelectionSpec::from_json(r#"{"tiles":["dxt"]}"#).expect("valid selection");
        assert!(spec.filters("tiles"));
        assert!(!spec.filters("sounds"));
    }
}
