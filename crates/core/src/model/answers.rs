use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Selected option per question index for one quiz attempt.
///
/// Live sessions only mutate this through `SessionState`, which keeps every key
/// inside the quiz's question range. Snapshots (persisted results, test
/// fixtures) are built with `FromIterator`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<usize, String>);

impl AnswerMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(&index).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.0.contains_key(&index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate answers in ascending question order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.0.iter().map(|(i, v)| (*i, v.as_str()))
    }

    pub(crate) fn insert(&mut self, index: usize, value: String) {
        self.0.insert(index, value);
    }
}

impl FromIterator<(usize, String)> for AnswerMap {
    fn from_iter<T: IntoIterator<Item = (usize, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<(usize, &'a str)> for AnswerMap {
    fn from_iter<T: IntoIterator<Item = (usize, &'a str)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(i, v)| (i, v.to_owned())).collect())
    }
}
