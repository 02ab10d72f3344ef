//! An ordered, duplicate-free sequence of ids.
//!
//! Room membership and the three session partitions are persisted as
//! arrays, and their order carries meaning: join order picks the next host,
//! and seat order drives turn rotation. A `HashSet` would lose that; a raw
//! `Vec` would let duplicates creep in. `OrderedIds` is a `Vec` that only
//! exposes order-preserving, membership-aware operations.

use serde::{Deserialize, Serialize};

/// Insertion-ordered set backed by a `Vec`.
///
/// Deserialization rejects duplicate entries, so a corrupted persisted array
/// fails at the decode boundary instead of leaking inward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<T>", into = "Vec<T>")]
#[serde(bound(
    serialize = "T: Clone + Serialize",
    deserialize = "T: PartialEq + Deserialize<'de>"
))]
pub struct OrderedIds<T> {
    items: Vec<T>,
}

impl<T> OrderedIds<T> {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// The earliest inserted element still present.
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T: PartialEq> OrderedIds<T> {
    pub fn contains(&self, id: &T) -> bool {
        self.items.contains(id)
    }

    pub fn position(&self, id: &T) -> Option<usize> {
        self.items.iter().position(|x| x == id)
    }

    /// Appends `id` if absent. Returns `true` if it was inserted.
    pub fn insert(&mut self, id: T) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.items.push(id);
        true
    }

    /// Removes `id`, keeping the relative order of the rest.
    /// Returns `true` if it was present.
    pub fn remove(&mut self, id: &T) -> bool {
        match self.position(id) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }
}

impl<T> Default for OrderedIds<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> TryFrom<Vec<T>> for OrderedIds<T> {
    type Error = String;

    fn try_from(items: Vec<T>) -> Result<Self, Self::Error> {
        for (i, item) in items.iter().enumerate() {
            if items[..i].contains(item) {
                return Err(format!("duplicate entry at position {i}"));
            }
        }
        Ok(Self { items })
    }
}

impl<T> From<OrderedIds<T>> for Vec<T> {
    fn from(ids: OrderedIds<T>) -> Self {
        ids.items
    }
}

impl<T: PartialEq> FromIterator<T> for OrderedIds<T> {
    /// Collects, silently dropping later duplicates.
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut ids = Self::new();
        for item in iter {
            ids.insert(item);
        }
        ids
    }
}

impl<'a, T> IntoIterator for &'a OrderedIds<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlayerId;

    fn pid(s: &str) -> PlayerId {
        PlayerId::new(s)
    }

    #[test]
    fn test_insert_keeps_join_order_and_ignores_duplicates() {
        let mut ids = OrderedIds::new();
        assert!(ids.insert(pid("a")));
        assert!(ids.insert(pid("b")));
        assert!(!ids.insert(pid("a")));

        assert_eq!(ids.as_slice(), &[pid("a"), pid("b")]);
    }

    #[test]
    fn test_remove_preserves_relative_order() {
        let mut ids: OrderedIds<_> = ["a", "b", "c"].into_iter().map(pid).collect();
        assert!(ids.remove(&pid("b")));
        assert!(!ids.remove(&pid("zzz")));

        assert_eq!(ids.as_slice(), &[pid("a"), pid("c")]);
        assert_eq!(ids.position(&pid("c")), Some(1));
    }

    #[test]
    fn test_deserialize_rejects_duplicates() {
        let result: Result<OrderedIds<PlayerId>, _> =
            serde_json::from_str(r#"["a","b","a"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let ids: OrderedIds<_> = ["x", "y"].into_iter().map(pid).collect();
        assert_eq!(serde_json::to_string(&ids).unwrap(), r#"["x","y"]"#);
    }
}
