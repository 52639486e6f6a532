// Linkvault record store
// Managers handle stateful operations against SQLite: bookmark rows, tags,
// and their associations.

pub mod bookmark_store;
