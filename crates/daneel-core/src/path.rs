//! Hierarchical blackboard paths.
//!
//! A path is an ordered sequence of keys. Keys are strings, integers, or
//! `(root, tip)` pairs; the pair form keys forward-kinematics caches
//! without string mangling.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One segment of a [`Path`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum PathKey {
    /// Named child.
    Name(String),
    /// Positional child.
    Index(usize),
    /// `(root, tip)` frame pair.
    Pair(String, String),
}

impl PathKey {
    pub fn name(s: impl Into<String>) -> Self {
        Self::Name(s.into())
    }

    pub fn pair(root: impl Into<String>, tip: impl Into<String>) -> Self {
        Self::Pair(root.into(), tip.into())
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(s) => write!(f, "{s}"),
            Self::Index(i) => write!(f, "{i}"),
            Self::Pair(a, b) => write!(f, "({a},{b})"),
        }
    }
}

impl From<&str> for PathKey {
    fn from(s: &str) -> Self {
        Self::Name(s.to_owned())
    }
}

impl From<usize> for PathKey {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

/// An ordered sequence of keys addressing one blackboard leaf.
///
/// Paths are cheap to clone and hash; the blackboard's symbol table keys
/// its interner on them. The rendered form (`a/b/0/(r,t)`) is used in
/// diagnostics and cache keys only.
#[derive(Clone, PartialEq, Eq, Hash, Default, Debug, Serialize, Deserialize)]
pub struct Path(Vec<PathKey>);

impl Path {
    /// The empty path (the blackboard root).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from name segments.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(|s| PathKey::Name(s.into())).collect())
    }

    /// Append one key, returning the extended path.
    #[must_use]
    pub fn child(&self, key: impl Into<PathKey>) -> Self {
        let mut keys = self.0.clone();
        keys.push(key.into());
        Self(keys)
    }

    /// Append a key in place.
    pub fn push(&mut self, key: impl Into<PathKey>) {
        self.0.push(key.into());
    }

    #[inline]
    pub fn keys(&self) -> &[PathKey] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The path consisting of the first `n` keys.
    pub fn prefix(&self, n: usize) -> Self {
        Self(self.0[..n.min(self.0.len())].to_vec())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

impl<K: Into<PathKey>> FromIterator<K> for Path {
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
