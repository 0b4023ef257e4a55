use std::collections::{HashMap, HashSet};

use super::parse::TopologySnapshot;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Router,
    Switch,
    Dns,
    Web,
    Client,
    Dhcp,
    External,
    Other(String),
}

impl NodeKind {
    pub fn from_type_name(name: Option<&str>) -> Self {
        match name.map(str::to_ascii_lowercase).as_deref() {
            Some("router") => Self::Router,
            Some("switch") => Self::Switch,
            Some("dns") => Self::Dns,
            Some("web") => Self::Web,
            Some("client") => Self::Client,
            Some("dhcp") => Self::Dhcp,
            Some("external") => Self::External,
            Some(other) => Self::Other(other.to_owned()),
            None => Self::Other(String::new()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Router => "router",
            Self::Switch => "switch",
            Self::Dns => "dns",
            Self::Web => "web",
            Self::Client => "client",
            Self::Dhcp => "dhcp",
            Self::External => "external",
            Self::Other(name) if name.is_empty() => "unknown",
            Self::Other(name) => name,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub ip: Option<String>,
    pub kind: NodeKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Network {
    pub id: String,
    pub label: Option<String>,
    pub members: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub network: String,
}

#[cfg(test)]
impl Edge {
    /// Endpoints in a canonical order, for comparing undirected edges.
    pub fn key(&self) -> (&str, &str, &str) {
        if self.source <= self.target {
            (&self.source, &self.target, &self.network)
        } else {
            (&self.target, &self.source, &self.network)
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopologyGraph {
    pub nodes: Vec<Node>,
    pub networks: Vec<Network>,
    pub edges: Vec<Edge>,
    pub index_by_id: HashMap<String, usize>,
}

impl TopologyGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn edge_indices(&self) -> Vec<(usize, usize)> {
        self.edges
            .iter()
            .filter_map(|edge| {
                let source = *self.index_by_id.get(&edge.source)?;
                let target = *self.index_by_id.get(&edge.target)?;
                Some((source, target))
            })
            .collect()
    }
}

pub fn build_graph(snapshot: &TopologySnapshot) -> TopologyGraph {
    let mut nodes = Vec::with_capacity(snapshot.nodes.len());
    let mut index_by_id = HashMap::with_capacity(snapshot.nodes.len());

    for descriptor in &snapshot.nodes {
        if index_by_id.contains_key(&descriptor.id) {
            continue;
        }

        index_by_id.insert(descriptor.id.clone(), nodes.len());
        nodes.push(Node {
            id: descriptor.id.clone(),
            label: descriptor
                .label
                .clone()
                .unwrap_or_else(|| descriptor.id.clone()),
            ip: descriptor.ip.clone(),
            kind: NodeKind::from_type_name(descriptor.kind.as_deref()),
        });
    }

    let mut networks = Vec::with_capacity(snapshot.networks.len());
    let mut edges = Vec::new();

    for descriptor in &snapshot.networks {
        let mut seen = HashSet::new();
        let members = descriptor
            .members
            .iter()
            .filter(|member| index_by_id.contains_key(member.as_str()))
            .filter(|member| seen.insert(member.as_str()))
            .cloned()
            .collect::<Vec<_>>();

        for (offset, source) in members.iter().enumerate() {
            for target in &members[offset + 1..] {
                edges.push(Edge {
                    source: source.clone(),
                    target: target.clone(),
                    network: descriptor.id.clone(),
                });
            }
        }

        networks.push(Network {
            id: descriptor.id.clone(),
            label: descriptor.label.clone(),
            members,
        });
    }

    TopologyGraph {
        nodes,
        networks,
        edges,
        index_by_id,
    }
}
