//! Hierarchical counter tree
//!
//! Counters are addressed by dotted paths (`"invocations.verbose_true"`) and
//! stored as a tree of named segments. Merging sums values path by path.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};

/// A dotted counter path split into its non-empty segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CounterPath(Vec<String>);

impl CounterPath {
    /// Parse a dotted path, rejecting empty paths and empty segments
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<String> = path.split('.').map(str::to_owned).collect();
        if segments.iter().any(String::is_empty) {
            return Err(StatsError::InvalidCounterPath { path: path.into() });
        }
        Ok(Self(segments))
    }

    /// Path segments, root first
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl FromStr for CounterPath {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CounterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// One segment of the tree. A node may carry its own value and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CounterNode {
    value: Option<i64>,
    children: BTreeMap<String, CounterNode>,
}

impl CounterNode {
    fn merge_from(&mut self, other: &CounterNode) {
        if let Some(theirs) = other.value {
            let ours = self.value.get_or_insert(0);
            *ours = ours.wrapping_add(theirs);
        }
        for (name, child) in &other.children {
            self.children
                .entry(name.clone())
                .or_default()
                .merge_from(child);
        }
    }

    fn collect(&self, prefix: &mut Vec<String>, out: &mut BTreeMap<String, i64>) {
        if let Some(value) = self.value {
            out.insert(prefix.join("."), value);
        }
        for (name, child) in &self.children {
            prefix.push(name.clone());
            child.collect(prefix, out);
            prefix.pop();
        }
    }
}

/// Path-keyed numeric accumulator, merged by per-path summation.
///
/// Absent paths read as zero. [`CounterTree::merge`] is commutative and
/// associative with the empty tree as identity. Arithmetic wraps on `i64`
/// overflow so those properties hold for every input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<String, i64>", try_from = "BTreeMap<String, i64>")]
pub struct CounterTree {
    root: CounterNode,
}

impl CounterTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from `(dotted path, value)` pairs, summing repeated paths
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        let mut tree = Self::new();
        for (path, value) in pairs {
            tree.inc(path.as_ref(), value)?;
        }
        Ok(tree)
    }

    /// Add `by` to the counter at a dotted path
    pub fn inc(&mut self, path: &str, by: i64) -> Result<()> {
        let path = CounterPath::parse(path)?;
        self.inc_path(&path, by);
        Ok(())
    }

    /// Add `by` to the counter at a parsed path
    pub fn inc_path(&mut self, path: &CounterPath, by: i64) {
        let mut node = &mut self.root;
        for segment in path.segments() {
            node = node.children.entry(segment.clone()).or_default();
        }
        let value = node.value.get_or_insert(0);
        *value = value.wrapping_add(by);
    }

    /// Value at a dotted path, zero when absent
    pub fn get(&self, path: &str) -> i64 {
        self.lookup(path).and_then(|node| node.value).unwrap_or(0)
    }

    /// Whether a value was ever recorded at this exact path
    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some_and(|node| node.value.is_some())
    }

    fn lookup(&self, path: &str) -> Option<&CounterNode> {
        let path = CounterPath::parse(path).ok()?;
        path.segments()
            .iter()
            .try_fold(&self.root, |node, segment| node.children.get(segment))
    }

    /// True when no path carries a value
    pub fn is_empty(&self) -> bool {
        self.root.value.is_none() && self.root.children.is_empty()
    }

    /// Number of paths carrying a value
    pub fn len(&self) -> usize {
        self.to_flat_map().len()
    }

    /// Flatten into dotted path keys, sorted
    pub fn to_flat_map(&self) -> BTreeMap<String, i64> {
        let mut out = BTreeMap::new();
        self.root.collect(&mut Vec::new(), &mut out);
        out
    }

    /// Sum another tree into this one
    pub fn merge_from(&mut self, other: &CounterTree) {
        self.root.merge_from(&other.root);
    }

    /// Per-path sum of two trees
    pub fn merge(a: &CounterTree, b: &CounterTree) -> CounterTree {
        let mut merged = a.clone();
        merged.merge_from(b);
        merged
    }

    /// Left fold of [`CounterTree::merge`] from the empty tree
    pub fn merge_all<'a, I>(trees: I) -> CounterTree
    where
        I: IntoIterator<Item = &'a CounterTree>,
    {
        trees.into_iter().fold(CounterTree::new(), |mut acc, tree| {
            acc.merge_from(tree);
            acc
        })
    }
}

impl From<CounterTree> for BTreeMap<String, i64> {
    fn from(tree: CounterTree) -> Self {
        tree.to_flat_map()
    }
}

impl TryFrom<BTreeMap<String, i64>> for CounterTree {
    type Error = StatsError;

    fn try_from(map: BTreeMap<String, i64>) -> Result<Self> {
        Self::from_pairs(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(pairs: &[(&str, i64)]) -> CounterTree {
        CounterTree::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_path_parsing() {
        let path = CounterPath::parse("a.b.c").unwrap();
        assert_eq!(path.segments(), ["a", "b", "c"]);
        assert_eq!(path.to_string(), "a.b.c");

        assert!(CounterPath::parse("").is_err());
        assert!(CounterPath::parse("a..b").is_err());
        assert!(CounterPath::parse(".a").is_err());
        assert!(CounterPath::parse("a.").is_err());
    }

    #[test]
    fn test_inc_and_get() {
        let mut t = CounterTree::new();
        t.inc("invocations.total", 1).unwrap();
        t.inc("invocations.total", 2).unwrap();
        t.inc("invocations", 7).unwrap();

        assert_eq!(t.get("invocations.total"), 3);
        assert_eq!(t.get("invocations"), 7);
        assert_eq!(t.get("missing.path"), 0);
        assert!(t.contains("invocations"));
        assert!(!t.contains("invocations.verbose"));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_merge_sums_by_path() {
        let a = tree(&[("a.b", 2)]);
        let b = tree(&[("a.b", 3), ("c", 1)]);
        let merged = CounterTree::merge(&a, &b);

        assert_eq!(merged, tree(&[("a.b", 5), ("c", 1)]));
        assert_eq!(merged, CounterTree::merge(&b, &a));
    }

    #[test]
    fn test_empty_is_identity() {
        let x = tree(&[("x", 4), ("x.y.z", -2)]);
        assert_eq!(CounterTree::merge(&CounterTree::new(), &x), x);
        assert_eq!(CounterTree::merge(&x, &CounterTree::new()), x);
    }

    #[test]
    fn test_merge_all_empty_input() {
        let merged = CounterTree::merge_all(std::iter::empty());
        assert!(merged.is_empty());
        assert_eq!(merged.get("anything"), 0);
    }

    #[test]
    fn test_overflow_wraps() {
        let a = tree(&[("n", i64::MAX)]);
        let b = tree(&[("n", 1)]);
        assert_eq!(CounterTree::merge(&a, &b).get("n"), i64::MIN);
    }

    #[test]
    fn test_serde_flat_map() {
        let t = tree(&[("a.b", 5), ("c", 1)]);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"a.b":5,"c":1}"#);

        let back: CounterTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert!(serde_json::from_str::<CounterTree>(r#"{"a..b":1}"#).is_err());
    }
}
