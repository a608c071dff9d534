use fxhash::FxBuildHasher;
use indexmap::{IndexMap, IndexSet};

/// [Index map](https://docs.rs/indexmap/latest) with [Fx hash function](https://docs.rs/fxhash/latest).
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// [Index set](https://docs.rs/indexmap/latest) with [Fx hash function](https://docs.rs/fxhash/latest).
pub type FxIndexSet<T> = IndexSet<T, FxBuildHasher>;

/// A variable identifier.
pub type Variable = usize;

/// An index into the domain of a variable.
pub type DomainIndex = usize;
