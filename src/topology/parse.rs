use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::VizError;

#[derive(Clone, Debug, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TopologySnapshot {
    pub nodes: Vec<NodeDescriptor>,
    pub networks: Vec<NetworkDescriptor>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NodeDescriptor {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NetworkDescriptor {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

/// The readable parts of a `network_update`. Each part is decoded on its own, so a bad
/// `activity` list does not cost the `stats` or `iptables` that came with it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkUpdate {
    pub activity: Option<Vec<ActivitySample>>,
    pub stats: Option<StatsMap>,
    pub iptables: Option<String>,
    pub rejected: Vec<String>,
}

impl NetworkUpdate {
    /// One error describing every part that had to be skipped.
    pub fn rejection(&self) -> Option<VizError> {
        (!self.rejected.is_empty()).then(|| VizError::MalformedUpdate(self.rejected.join("; ")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ActivitySample {
    pub node: String,
    #[serde(default)]
    pub rx: u64,
    #[serde(default)]
    pub tx: u64,
    #[serde(default)]
    pub rx_packets: Option<u64>,
    #[serde(default)]
    pub tx_packets: Option<u64>,
}

pub type StatsMap = BTreeMap<String, NodeStats>;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NodeStats {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub rx_bytes: u64,
    #[serde(default)]
    pub tx_bytes: u64,
    #[serde(default)]
    pub rx_packets: Option<u64>,
    #[serde(default)]
    pub tx_packets: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl NodeStats {
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }

    pub fn total_bytes(&self) -> u64 {
        self.rx_bytes.saturating_add(self.tx_bytes)
    }
}

pub fn parse_envelope(raw: &str) -> Result<Envelope, VizError> {
    serde_json::from_str(raw)
        .map_err(|error| VizError::Transport(format!("unreadable frame: {error}")))
}

pub fn parse_topology(value: &Value) -> Result<TopologySnapshot, VizError> {
    let object = value
        .as_object()
        .ok_or_else(|| VizError::MalformedTopology("snapshot is not an object".to_owned()))?;

    for field in ["nodes", "networks"] {
        if !object.contains_key(field) {
            return Err(VizError::MalformedTopology(format!(
                "missing `{field}` field"
            )));
        }
    }

    TopologySnapshot::deserialize(value)
        .map_err(|error| VizError::MalformedTopology(error.to_string()))
}

pub fn parse_update(value: &Value) -> Result<NetworkUpdate, VizError> {
    if value.is_null() {
        return Ok(NetworkUpdate::default());
    }

    let object = value
        .as_object()
        .ok_or_else(|| VizError::MalformedUpdate("update is not an object".to_owned()))?;

    let mut update = NetworkUpdate::default();
    update.activity = update_part(object, "activity", &mut update.rejected);
    update.stats = update_part(object, "stats", &mut update.rejected);
    update.iptables = update_part(object, "iptables", &mut update.rejected);
    Ok(update)
}

fn update_part<T: DeserializeOwned>(
    object: &Map<String, Value>,
    field: &str,
    rejected: &mut Vec<String>,
) -> Option<T> {
    let value = object.get(field).filter(|value| !value.is_null())?;
    match T::deserialize(value) {
        Ok(part) => Some(part),
        Err(error) => {
            rejected.push(format!("`{field}`: {error}"));
            None
        }
    }
}

pub fn parse_stats_body(raw: &str) -> Result<StatsMap, VizError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|error| VizError::Fetch(format!("invalid JSON: {error}")))?;

    if value.is_null() {
        return Ok(StatsMap::new());
    }

    StatsMap::deserialize(&value).map_err(|error| VizError::Fetch(format!("invalid stats: {error}")))
}
