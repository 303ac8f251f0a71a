//! Hot-path container aliases used by dispatch tables.
//!
//! Container choices are centralized here so future allocator/container upgrades can be
//! done in one place without touching command logic modules.

use hashbrown::HashMap as HbMap;

/// Hot-path hash map used by the command registry.
pub type HotMap<K, V> = HbMap<K, V>;
