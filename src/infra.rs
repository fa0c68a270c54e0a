//! The embedded graph store: [interfaces](pi) of the store boundary, and the
//! [connectors] implementing them.

pub mod connectors;
pub mod pi;
