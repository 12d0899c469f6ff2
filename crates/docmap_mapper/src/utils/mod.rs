//! Hash containers shared by the registry and the type cells.

// -----------------------------------------------------------------------------
// Modules

mod hasher;
mod typeid_map;

// -----------------------------------------------------------------------------
// Exports

pub(crate) use hasher::{FixedHashState, NoOpHashState};
pub(crate) use typeid_map::TypeIdMap;

/// A [`hashbrown::HashMap`] with a fixed `foldhash` seed.
pub(crate) type HashMap<K, V> = hashbrown::HashMap<K, V, FixedHashState>;

/// A [`hashbrown::HashSet`] with a fixed `foldhash` seed.
pub(crate) type HashSet<K> = hashbrown::HashSet<K, FixedHashState>;
