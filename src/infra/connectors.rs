pub mod embedded;

// re-export connector implementations at `crate::connectors` level
pub use embedded::{EmbeddedGraphDatabase, EmbeddedGraphStore};
