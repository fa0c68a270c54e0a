use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Column types of the embedded graph store. Only these five primitive kinds are materialized.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ColumnType {
    Boolean,
    Float,
    Int32,
    String,
    Timestamp,
}
