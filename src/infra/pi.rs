//! Interfaces of the graph store boundary. The loader only talks to a store through
//! [GraphDatabase] and [GraphConnection].

mod statement;

pub use statement::{EdgeCreation, MatchCreate, NodeBinding, Statement};

use std::path::{Path, PathBuf};

use crate::schema::ColumnType;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("a graph store already exists at {}", .0.display())]
    AlreadyExists(PathBuf),
    #[error("no graph store found at {}", .0.display())]
    NotFound(PathBuf),
    #[error("table {0} already exists")]
    TableExists(String),
    #[error("table {0} does not exist")]
    UnknownTable(String),
    #[error("table {table} has no column {column}")]
    UnknownColumn { table: String, column: String },
    #[error("column {table}.{column} expects {expected}, got {found}")]
    TypeMismatch {
        table: String,
        column: String,
        expected: ColumnType,
        found: String,
    },
    #[error("primary key {key} already present in {table}")]
    DuplicatePrimaryKey { table: String, key: String },
    #[error("no node with key {key} in {table}")]
    MissingNode { table: String, key: String },
    #[error("malformed statement: {0}")]
    MalformedStatement(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatementSummary {
    pub rows_affected: usize,
}

/// Creates graph store instances. Creation must fail on a path that already holds anything.
pub trait GraphDatabase: std::fmt::Debug {
    fn create(&self, path: &Path) -> Result<Box<dyn GraphConnection>, StoreError>;
}

/// A connection to one store instance, used for every statement of an ingestion.
pub trait GraphConnection {
    fn execute(&mut self, statement: &Statement) -> Result<StatementSummary, StoreError>;

    /// Makes everything executed so far durable.
    fn checkpoint(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}
