mod graph;
mod parse;

pub use graph::{Edge, Network, Node, NodeKind, TopologyGraph, build_graph};
pub use parse::{
    ActivitySample, Envelope, NetworkUpdate, NodeStats, StatsMap, TopologySnapshot, parse_envelope,
    parse_stats_body, parse_topology, parse_update,
};
#[cfg(test)]
pub use parse::{NetworkDescriptor, NodeDescriptor};

use serde_json::Value;

use crate::error::VizError;

/// Validates a raw `topology` payload and derives the renderable graph from it.
pub fn build_from_value(value: &Value) -> Result<TopologyGraph, VizError> {
    let snapshot = parse_topology(value)?;
    Ok(build_graph(&snapshot))
}
