//! Collection normalization.
//!
//! Every input shape the combinators accept is resolved once, up front, into
//! an ordered list of [`Entry`] values plus a [`Shape`] tag. Nothing
//! downstream of [`Collection::normalize`] looks at the original container
//! again.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use indexmap::IndexMap;

/// Identity of an entry: its position in a sequence or its name in a map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Index(_) => None,
            Key::Name(n) => Some(n),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{}", i),
            Key::Name(n) => write!(f, "{}", n),
        }
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

/// Shape family of the input collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Keys are `0..n`, visited in index order.
    Sequence,
    /// Keys are names, visited in the map's own enumeration order.
    Mapping,
    /// Keys are names, visited in insertion order.
    Ordered,
}

/// A single `(key, value)` pair produced by normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<V> {
    key: Key,
    value: V,
}

impl<V> Entry<V> {
    pub(crate) fn new(key: Key, value: V) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn into_parts(self) -> (Key, V) {
        (self.key, self.value)
    }
}

/// Visitation order for one run, fixed at normalization time.
#[derive(Debug, Clone, PartialEq)]
pub struct Entries<V> {
    items: Vec<Entry<V>>,
    shape: Shape,
}

impl<V> Entries<V> {
    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry<V>> {
        self.items.iter()
    }

    /// Keys in visitation order.
    pub fn keys(&self) -> Vec<Key> {
        self.items.iter().map(|e| e.key.clone()).collect()
    }
}

impl<V> IntoIterator for Entries<V> {
    type Item = Entry<V>;
    type IntoIter = std::vec::IntoIter<Entry<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Any input the combinators can walk.
///
/// `Absent` covers inputs that are missing or cannot be iterated; it
/// normalizes to an empty, mapping-shaped entry list rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection<V> {
    Absent,
    Sequence(Vec<V>),
    Mapping(HashMap<String, V>),
    Ordered(IndexMap<String, V>),
}

impl<V> Collection<V> {
    /// Build an ordered collection from `(name, value)` pairs.
    ///
    /// A repeated name keeps its first position and its last value.
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Collection::Ordered(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn shape(&self) -> Shape {
        match self {
            Collection::Absent | Collection::Mapping(_) => Shape::Mapping,
            Collection::Sequence(_) => Shape::Sequence,
            Collection::Ordered(_) => Shape::Ordered,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Collection::Absent => 0,
            Collection::Sequence(v) => v.len(),
            Collection::Mapping(m) => m.len(),
            Collection::Ordered(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve the collection into its visitation order.
    pub fn normalize(self) -> Entries<V> {
        let shape = self.shape();
        let items = match self {
            Collection::Absent => Vec::new(),
            Collection::Sequence(values) => values
                .into_iter()
                .enumerate()
                .map(|(i, v)| Entry::new(Key::Index(i), v))
                .collect(),
            Collection::Mapping(map) => map
                .into_iter()
                .map(|(k, v)| Entry::new(Key::Name(k), v))
                .collect(),
            Collection::Ordered(map) => map
                .into_iter()
                .map(|(k, v)| Entry::new(Key::Name(k), v))
                .collect(),
        };
        Entries { items, shape }
    }
}

impl<V> Default for Collection<V> {
    fn default() -> Self {
        Collection::Absent
    }
}

impl<V> From<Vec<V>> for Collection<V> {
    fn from(values: Vec<V>) -> Self {
        Collection::Sequence(values)
    }
}

impl<V, const N: usize> From<[V; N]> for Collection<V> {
    fn from(values: [V; N]) -> Self {
        Collection::Sequence(values.into())
    }
}

impl<V> From<HashMap<String, V>> for Collection<V> {
    fn from(map: HashMap<String, V>) -> Self {
        Collection::Mapping(map)
    }
}

impl<V> From<IndexMap<String, V>> for Collection<V> {
    fn from(map: IndexMap<String, V>) -> Self {
        Collection::Ordered(map)
    }
}

impl<V> From<BTreeMap<String, V>> for Collection<V> {
    fn from(map: BTreeMap<String, V>) -> Self {
        Collection::Ordered(map.into_iter().collect())
    }
}

impl<V, C> From<Option<C>> for Collection<V>
where
    C: Into<Collection<V>>,
{
    fn from(input: Option<C>) -> Self {
        input.map(Into::into).unwrap_or(Collection::Absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<V>(entries: &Entries<V>) -> Vec<Key> {
        entries.keys()
    }

    #[test]
    fn sequence_uses_index_keys_in_order() {
        let entries = Collection::from(vec![1, 3, 2, 4]).normalize();
        assert_eq!(entries.shape(), Shape::Sequence);
        assert_eq!(
            keys(&entries),
            vec![Key::Index(0), Key::Index(1), Key::Index(2), Key::Index(3)]
        );
        let values: Vec<i32> = entries.into_iter().map(|e| *e.value()).collect();
        assert_eq!(values, vec![1, 3, 2, 4]);
    }

    #[test]
    fn ordered_keeps_insertion_order() {
        let entries = Collection::from_pairs([("c", 2), ("a", 4), ("b", 3)]).normalize();
        assert_eq!(entries.shape(), Shape::Ordered);
        assert_eq!(keys(&entries), vec![Key::from("c"), Key::from("a"), Key::from("b")]);
    }

    #[test]
    fn mapping_visits_every_key_once() {
        let mut map = HashMap::new();
        map.insert("a".to_string(), 4);
        map.insert("b".to_string(), 3);
        map.insert("c".to_string(), 2);
        let entries = Collection::from(map).normalize();
        assert_eq!(entries.shape(), Shape::Mapping);

        let mut seen = keys(&entries);
        seen.sort();
        assert_eq!(seen, vec![Key::from("a"), Key::from("b"), Key::from("c")]);
    }

    #[test]
    fn btree_map_becomes_ordered_by_key() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), 1);
        map.insert("a".to_string(), 2);
        let entries = Collection::from(map).normalize();
        assert_eq!(entries.shape(), Shape::Ordered);
        assert_eq!(keys(&entries), vec![Key::from("a"), Key::from("b")]);
    }

    #[test]
    fn absent_input_is_empty_mapping() {
        let entries = Collection::<i32>::from(None::<Vec<i32>>).normalize();
        assert!(entries.is_empty());
        assert_eq!(entries.shape(), Shape::Mapping);

        let entries = Collection::<i32>::Absent.normalize();
        assert_eq!(entries.shape(), Shape::Mapping);
    }

    #[test]
    fn empty_sequence_keeps_sequence_shape() {
        let entries = Collection::<i32>::from(Vec::new()).normalize();
        assert!(entries.is_empty());
        assert_eq!(entries.shape(), Shape::Sequence);
    }

    #[test]
    fn key_display_and_accessors() {
        assert_eq!(Key::Index(3).to_string(), "3");
        assert_eq!(Key::from("a").to_string(), "a");
        assert_eq!(Key::Index(3).as_index(), Some(3));
        assert_eq!(Key::from("a").as_name(), Some("a"));
        assert_eq!(Key::from("a").as_index(), None);
    }
}
