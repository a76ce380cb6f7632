//! Hash container choice for the queue index and compiled pattern sets.

use hashbrown::HashMap as HbMap;

/// Hash map used on every lookup path.
pub type HotMap<K, V> = HbMap<K, V>;
