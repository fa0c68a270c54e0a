//! Bulk loading of sampled records into a new graph store.
//!
//! Statements are issued in dependency order: node tables, node data, relation tables, then
//! edges. The first failing statement aborts the ingestion. Nothing is rolled back.

mod frames;
mod report;

pub use report::IngestionReport;

use log::{debug, info};
use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use crate::{
    infra::pi::{GraphConnection, GraphDatabase, Statement, StoreError},
    record::{EdgeRecord, NodeKey, NodeRecord},
    schema::{NodeSchema, NodeTableDef, RelTableDef},
    IngestError, IngestResult,
};
use frames::{node_frame, rel_frame, MatchCreateBuilder};

pub const DEFAULT_EDGE_BATCH_SIZE: usize = 50;

/// How edges reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeLoadMode {
    /// batches of `MATCH` on the endpoints followed by one `CREATE` of every edge
    MatchCreate,
    /// one bulk copy per relation table
    BulkCopy,
}

/// Everything to materialize in one store.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    /// node tables by record type tag
    pub node_tables: NodeSchema,
    pub rel_tables: Vec<RelTableDef>,
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    pub edge_mode: EdgeLoadMode,
}

#[derive(Debug)]
pub struct BulkGraphLoader<'a> {
    database: &'a dyn GraphDatabase,
    batch_size: usize,
}

/// An edge with its resolved tables.
struct Routed<'p> {
    edge: &'p EdgeRecord,
    rel_table: &'p RelTableDef,
    from: &'p NodeTableDef,
    to: &'p NodeTableDef,
}

struct LoadSession {
    connection: Box<dyn GraphConnection>,
    report: IngestionReport,
}

impl LoadSession {
    fn run(&mut self, statement: Statement) -> IngestResult<usize> {
        if statement.is_schema_definition() {
            info!("Schema Cypher Statement: {}", statement);
        } else {
            debug!("Data Cypher Statement: {}", statement);
        }
        let summary = self.connection.execute(&statement).map_err(|e| {
            let target = statement.target();
            if statement.is_schema_definition() {
                IngestError::SchemaDefinitionFailure {
                    target,
                    super_error: Box::new(e),
                }
            } else {
                IngestError::DataLoadFailure {
                    target,
                    super_error: Box::new(e),
                }
            }
        })?;
        self.report.statements += 1;
        Ok(summary.rows_affected)
    }
}

fn unplanned(target: String, reason: String) -> IngestError {
    IngestError::DataLoadFailure {
        target,
        super_error: reason.into(),
    }
}

impl<'a> BulkGraphLoader<'a> {
    pub fn new(database: &'a dyn GraphDatabase, batch_size: usize) -> IngestResult<Self> {
        if batch_size == 0 {
            return Err(IngestError::Config(
                "edge batch size must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            database,
            batch_size,
        })
    }

    /// Creates a store at `store_path` and materializes `plan` in it.
    pub fn instantiate(&self, store_path: &Path, plan: &LoadPlan) -> IngestResult<IngestionReport> {
        if store_path.exists() {
            return Err(IngestError::TargetAlreadyExists {
                path: store_path.to_path_buf(),
            });
        }
        let connection = self.database.create(store_path).map_err(|e| match e {
            StoreError::AlreadyExists(path) => IngestError::TargetAlreadyExists { path },
            other => IngestError::Store(other),
        })?;
        info!("Created graph store at {}", store_path.display());
        let mut session = LoadSession {
            connection,
            report: IngestionReport::new(store_path.to_path_buf()),
        };

        for table in plan.node_tables.values() {
            session.run(Statement::CreateNodeTable(table.clone()))?;
        }
        self.load_nodes(&mut session, plan)?;
        for table in &plan.rel_tables {
            session.run(Statement::CreateRelTable(table.clone()))?;
        }
        let routed = self.route_edges(&mut session.report, plan)?;
        match plan.edge_mode {
            EdgeLoadMode::MatchCreate => self.match_create_edges(&mut session, &routed)?,
            EdgeLoadMode::BulkCopy => self.copy_edges(&mut session, plan, &routed)?,
        }

        session
            .connection
            .checkpoint()
            .map_err(|e| IngestError::DataLoadFailure {
                target: format!("checkpoint of {}", store_path.display()),
                super_error: Box::new(e),
            })?;
        info!(
            "Loaded {} nodes and {} edges into {} ({} dangling edges skipped)",
            session.report.total_nodes(),
            session.report.total_edges(),
            store_path.display(),
            session.report.dangling_edges
        );
        Ok(session.report)
    }

    fn load_nodes(&self, session: &mut LoadSession, plan: &LoadPlan) -> IngestResult<()> {
        let mut by_type: HashMap<&str, Vec<&NodeRecord>> = HashMap::new();
        for node in &plan.nodes {
            if !plan.node_tables.contains_key(&node.type_tag) {
                return Err(unplanned(
                    format!("node {}", node.key),
                    format!("no node table for type `{}`", node.type_tag),
                ));
            }
            by_type.entry(node.type_tag.as_str()).or_default().push(node);
        }
        for (type_tag, table) in &plan.node_tables {
            let Some(nodes) = by_type.get(type_tag.as_str()) else {
                continue;
            };
            let loaded = session.run(Statement::LoadNodes {
                table: table.name.clone(),
                frame: node_frame(table, nodes),
            })?;
            session.report.node_counts.insert(table.name.clone(), loaded);
        }
        Ok(())
    }

    /// Resolves the tables of every edge, counting edges with a missing endpoint as dangling.
    fn route_edges<'p>(
        &self,
        report: &mut IngestionReport,
        plan: &'p LoadPlan,
    ) -> IngestResult<Vec<Routed<'p>>> {
        let loaded: HashSet<(&str, &NodeKey)> = plan
            .nodes
            .iter()
            .map(|n| (n.type_tag.as_str(), &n.key))
            .collect();
        let rel_tables: HashMap<(&str, &str, &str), &RelTableDef> = plan
            .rel_tables
            .iter()
            .map(|t| ((t.label.as_str(), t.from.as_str(), t.to.as_str()), t))
            .collect();

        let mut routed = Vec::with_capacity(plan.edges.len());
        for edge in &plan.edges {
            if !loaded.contains(&(edge.source_type.as_str(), &edge.source))
                || !loaded.contains(&(edge.target_type.as_str(), &edge.target))
            {
                report.dangling_edges += 1;
                continue;
            }
            let (Some(from), Some(to)) = (
                plan.node_tables.get(&edge.source_type),
                plan.node_tables.get(&edge.target_type),
            ) else {
                report.dangling_edges += 1;
                continue;
            };
            let rel_table = rel_tables
                .get(&(edge.label.as_str(), from.name.as_str(), to.name.as_str()))
                .ok_or_else(|| {
                    unplanned(
                        format!("edge {} -> {}", edge.source, edge.target),
                        format!(
                            "no relation table for `{}` from {} to {}",
                            edge.label, from.name, to.name
                        ),
                    )
                })?;
            routed.push(Routed {
                edge,
                rel_table,
                from,
                to,
            });
        }
        if report.dangling_edges > 0 {
            info!(
                "{} edges have an endpoint outside the loaded nodes and are skipped",
                report.dangling_edges
            );
        }
        Ok(routed)
    }

    fn match_create_edges(&self, session: &mut LoadSession, routed: &[Routed]) -> IngestResult<()> {
        for chunk in routed.chunks(self.batch_size) {
            let mut builder = MatchCreateBuilder::default();
            for r in chunk {
                builder.push(r.rel_table, r.from, r.to, r.edge);
            }
            let created = session.run(Statement::MatchCreate(builder.finish()))?;
            for r in chunk {
                *session
                    .report
                    .edge_counts
                    .entry(r.rel_table.name.clone())
                    .or_default() += 1;
            }
            session.report.edge_batches.push(created);
        }
        Ok(())
    }

    fn copy_edges(
        &self,
        session: &mut LoadSession,
        plan: &LoadPlan,
        routed: &[Routed],
    ) -> IngestResult<()> {
        for table in &plan.rel_tables {
            let edges: Vec<&EdgeRecord> = routed
                .iter()
                .filter(|r| r.rel_table.name == table.name)
                .map(|r| r.edge)
                .collect();
            let Some(first) = routed.iter().find(|r| r.rel_table.name == table.name) else {
                continue;
            };
            let copied = session.run(Statement::CopyRel {
                table: table.name.clone(),
                frame: rel_frame(table, first.from, first.to, &edges),
            })?;
            session.report.edge_counts.insert(table.name.clone(), copied);
            session.report.edge_batches.push(copied);
        }
        Ok(())
    }
}
