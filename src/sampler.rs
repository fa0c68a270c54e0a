//! Node sampling with edge cascade.

use log::info;
use rand::{seq::index, Rng};
use std::collections::HashSet;

use crate::{
    dataset::SamplingPolicy,
    record::{EdgeRecord, NodeKey, NodeRecord},
    IngestResult,
};

/// Which endpoints of an edge must survive sampling for the edge to be kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRule {
    AtLeastOne,
    Both,
}

/// Retains the number of items the policy asks for, chosen uniformly at random.
///
/// Retained items keep their relative input order.
pub fn sample<T, R: Rng + ?Sized>(
    items: Vec<T>,
    policy: &SamplingPolicy,
    rng: &mut R,
) -> IngestResult<Vec<T>> {
    let total = items.len();
    let retained = policy.retained_count(total)?;
    if retained == total {
        return Ok(items);
    }
    let mut chosen = vec![false; total];
    for i in index::sample(rng, total, retained) {
        chosen[i] = true;
    }
    info!("Sampling retains {retained} out of {total} nodes");
    Ok(items
        .into_iter()
        .zip(chosen)
        .filter_map(|(item, keep)| keep.then_some(item))
        .collect())
}

/// Drops the edges whose endpoints are not retained according to `rule`.
pub fn filter_edges(
    edges: Vec<EdgeRecord>,
    nodes: &[NodeRecord],
    rule: EndpointRule,
) -> Vec<EdgeRecord> {
    let retained: HashSet<&NodeKey> = nodes.iter().map(|n| &n.key).collect();
    let total = edges.len();
    let kept: Vec<EdgeRecord> = edges
        .into_iter()
        .filter(|edge| {
            let source = retained.contains(&edge.source);
            let target = retained.contains(&edge.target);
            match rule {
                EndpointRule::AtLeastOne => source || target,
                EndpointRule::Both => source && target,
            }
        })
        .collect();
    if kept.len() < total {
        info!("{} of {total} edges dropped by sampling", total - kept.len());
    }
    kept
}
