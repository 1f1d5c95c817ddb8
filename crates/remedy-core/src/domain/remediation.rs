//! Remediated file content keyed by relative path.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Full replacement content per relative file path.
///
/// Keys are unique; inserting an existing key replaces its content (last
/// writer wins). Iteration is in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemediationMap(BTreeMap<String, String>);

impl RemediationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert content for `path`, returning the content it replaced.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) -> Option<String> {
        self.0.insert(path.into(), content.into())
    }

    /// Merge `other` into `self`; entries in `other` win on collision.
    pub fn merge(&mut self, other: RemediationMap) {
        self.0.extend(other.0);
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for RemediationMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_last_writer_wins() {
        let mut first = RemediationMap::new();
        first.insert("a.py", "old a");
        first.insert("b.py", "b");

        let mut second = RemediationMap::new();
        second.insert("a.py", "new a");
        second.insert("c.py", "c");

        first.merge(second);
        assert_eq!(first.len(), 3);
        assert_eq!(first.get("a.py"), Some("new a"));
        assert_eq!(first.get("b.py"), Some("b"));
        assert_eq!(first.paths().collect::<Vec<_>>(), vec!["a.py", "b.py", "c.py"]);
    }

    #[test]
    fn insert_reports_replaced_content() {
        let mut map = RemediationMap::new();
        assert!(map.insert("x", "1").is_none());
        assert_eq!(map.insert("x", "2").as_deref(), Some("1"));
    }
}
