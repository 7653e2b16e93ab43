use serde::{Deserialize, Deserializer, Serialize};

/// An insertion-ordered set of property values.
///
/// Property values only need `PartialEq`, so membership is a linear scan.
/// The sets involved are small (a handful of languages or theme types).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValueSet<T>(Vec<T>);

impl<T: PartialEq> ValueSet<T> {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Inserts `value` unless an equal value is already present.
    /// Returns whether the set changed.
    pub fn insert(&mut self, value: T) -> bool {
        if self.contains(&value) {
            false
        } else {
            self.0.push(value);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.0.iter().any(|v| v == value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    /// Set equality: same size and every member of `self` is in `other`.
    #[must_use]
    pub fn same_members(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

impl<T: PartialEq> Default for ValueSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> FromIterator<T> for ValueSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl<T: PartialEq> From<Vec<T>> for ValueSet<T> {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().collect()
    }
}

impl<T: PartialEq, const N: usize> From<[T; N]> for ValueSet<T> {
    fn from(values: [T; N]) -> Self {
        values.into_iter().collect()
    }
}

impl<'a, T> IntoIterator for &'a ValueSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// Deserialize through `Vec` so duplicates on the wire collapse the same way
// they do on construction.
impl<'de, T: PartialEq + Deserialize<'de>> Deserialize<'de> for ValueSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from)
    }
}
