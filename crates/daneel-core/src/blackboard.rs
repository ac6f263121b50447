//! The blackboard: a hierarchical typed store with late-bound symbols.
//!
//! Compiled evaluators never embed numeric values. A goal binds a path
//! with [`Blackboard::to_symbol`] once; between ticks only the blackboard
//! mutates, and [`Blackboard::resolve`] re-reads the current values in
//! symbol order. This is what lets one compiled program serve both the
//! real and the planning universe.

use indexmap::IndexMap;

use crate::{CoreError, Path, PathKey, Result, Symbol, SymbolTable, Value};

#[derive(Clone, Debug)]
enum Node {
    Branch(IndexMap<PathKey, Node>),
    Leaf(Value),
}

impl Node {
    fn branch() -> Self {
        Self::Branch(IndexMap::new())
    }
}

/// A structural copy of the blackboard data, used to enter and exit a
/// planning universe. Snapshots nest with stack discipline: the owner
/// restores them in reverse order of creation.
#[derive(Clone, Debug)]
pub struct Snapshot {
    root: Node,
}

/// Hierarchical typed store binding symbols to live values.
///
/// The symbol table is monotonic and deliberately excluded from
/// snapshot/restore, so symbol identity is stable across universes.
#[derive(Clone, Debug, Default)]
pub struct Blackboard {
    root: Option<Node>,
    symbols: SymbolTable,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the value at `path`.
    ///
    /// Fails with [`CoreError::PathMissing`] if any key is absent. If the
    /// leaf is a closure it is invoked with the blackboard and its result
    /// returned.
    pub fn get(&self, path: &Path) -> Result<Value> {
        let mut node = self.root.as_ref().ok_or_else(|| missing(path, 0))?;
        for (depth, key) in path.keys().iter().enumerate() {
            match node {
                Node::Branch(children) => {
                    node = children.get(key).ok_or_else(|| missing(path, depth))?;
                }
                Node::Leaf(_) => return Err(missing(path, depth)),
            }
        }
        match node {
            Node::Leaf(Value::Lazy(lazy)) => Ok(lazy.call(self)),
            Node::Leaf(value) => Ok(value.clone()),
            Node::Branch(_) => Err(missing(path, path.len())),
        }
    }

    /// Read a scalar at `path`, invoking closures as needed.
    pub fn get_scalar(&self, path: &Path) -> Result<f64> {
        self.get(path)?
            .as_scalar()
            .ok_or_else(|| CoreError::NonScalar {
                path: path.to_string(),
            })
    }

    /// Write `value` at `path`, creating intermediate branches as needed.
    ///
    /// An existing leaf on the way is replaced by a branch; an existing
    /// terminal value is replaced.
    pub fn set(&mut self, path: &Path, value: impl Into<Value>) {
        let mut node = self.root.get_or_insert_with(Node::branch);
        for key in path.keys() {
            if !matches!(node, Node::Branch(_)) {
                *node = Node::branch();
            }
            let Node::Branch(children) = node else {
                unreachable!()
            };
            node = children.entry(key.clone()).or_insert_with(Node::branch);
        }
        *node = Node::Leaf(value.into());
    }

    /// Whether a value exists at `path`.
    pub fn contains(&self, path: &Path) -> bool {
        self.get(path).is_ok()
    }

    /// Remove the subtree at `path`. Returns whether anything was removed.
    pub fn remove(&mut self, path: &Path) -> bool {
        let Some(root) = self.root.as_mut() else {
            return false;
        };
        let Some((last, prefix)) = path.keys().split_last() else {
            self.root = None;
            return true;
        };
        let mut node = root;
        for key in prefix {
            match node {
                Node::Branch(children) => match children.get_mut(key) {
                    Some(child) => node = child,
                    None => return false,
                },
                Node::Leaf(_) => return false,
            }
        }
        match node {
            Node::Branch(children) => children.shift_remove(last).is_some(),
            Node::Leaf(_) => false,
        }
    }

    /// Return (creating if needed) the unique symbol for `path`.
    ///
    /// Idempotent: two calls with the same path return the same symbol,
    /// across snapshot/restore.
    pub fn to_symbol(&mut self, path: &Path) -> Symbol {
        self.symbols.intern(path)
    }

    /// The path a symbol was issued for.
    pub fn symbol_path(&self, symbol: Symbol) -> Result<&Path> {
        self.symbols
            .resolve(symbol)
            .ok_or(CoreError::UnknownSymbol(symbol))
    }

    /// Materialize the numeric values of `symbols` into `out`, in order.
    ///
    /// This is the once-per-tick bridge between the blackboard and a
    /// compiled evaluator.
    pub fn resolve(&self, symbols: &[Symbol], out: &mut [f64]) -> Result<()> {
        assert_eq!(symbols.len(), out.len(), "resolve buffer size mismatch");
        for (slot, &symbol) in out.iter_mut().zip(symbols) {
            let path = self.symbol_path(symbol)?;
            *slot = self.get_scalar(path)?;
        }
        Ok(())
    }

    /// Structural copy of the current data (not the symbol table).
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            root: self.root.clone().unwrap_or_else(Node::branch),
        }
    }

    /// Overwrite the current data with `snapshot`.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.root = Some(snapshot.root);
    }

    /// Number of symbols issued so far.
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }
}

fn missing(path: &Path, depth: usize) -> CoreError {
    CoreError::PathMissing {
        path: path.to_string(),
        prefix: path.prefix(depth).to_string(),
    }
}
