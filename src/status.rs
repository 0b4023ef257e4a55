use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::VizError;
use crate::topology::{NodeStats, StatsMap, parse_stats_body};
use crate::util::wall_clock;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusRow {
    pub name: String,
    pub running: bool,
    pub error: Option<String>,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub tx_packets: u64,
}

impl StatusRow {
    fn from_stats(name: &str, stats: &NodeStats) -> Self {
        Self {
            name: name.to_owned(),
            running: stats.is_running(),
            error: stats.error.clone(),
            rx_bytes: stats.rx_bytes,
            tx_bytes: stats.tx_bytes,
            rx_packets: stats.rx_packets.unwrap_or(0),
            tx_packets: stats.tx_packets.unwrap_or(0),
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.running { "Running" } else { "Unavailable" }
    }
}

/// What the status table currently shows.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StatusTable {
    #[default]
    Loading,
    Empty,
    Rows { rows: Vec<StatusRow>, updated: String },
    Failed(String),
}

impl StatusTable {
    pub fn apply(&mut self, result: Result<StatsMap, VizError>) {
        *self = match result {
            Ok(stats) if stats.is_empty() => Self::Empty,
            Ok(stats) => Self::Rows {
                rows: stats
                    .iter()
                    .map(|(name, stats)| StatusRow::from_stats(name, stats))
                    .collect(),
                updated: wall_clock(),
            },
            Err(error) => Self::Failed(error.to_string()),
        };
    }
}

/// Polls `url` every `interval` on its own thread. Failures are delivered, never retried early.
pub fn spawn_status_poller<W>(
    url: String,
    interval: Duration,
    wake: W,
) -> Receiver<Result<StatsMap, VizError>>
where
    W: Fn() + Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let client = match reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
        {
            Ok(client) => client,
            Err(error) => {
                warn!(%error, "failed to build HTTP client for status polling");
                let _ = tx.send(Err(VizError::Fetch(error.to_string())));
                wake();
                return;
            }
        };

        loop {
            let result = fetch_stats(&client, &url);
            if let Err(error) = &result {
                warn!(%url, %error, "status poll failed");
            } else {
                debug!(%url, "status poll succeeded");
            }
            if tx.send(result).is_err() {
                return;
            }
            wake();
            thread::sleep(interval);
        }
    });

    rx
}

fn fetch_stats(client: &reqwest::blocking::Client, url: &str) -> Result<StatsMap, VizError> {
    let response = client
        .get(url)
        .send()
        .map_err(|error| VizError::Fetch(format!("request failed: {error}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(VizError::Fetch(format!("Server responded with {}", status.as_u16())));
    }

    let body = response
        .text()
        .map_err(|error| VizError::Fetch(format!("unreadable body: {error}")))?;
    parse_stats_body(&body)
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    use super::*;

    fn stats(status: &str) -> NodeStats {
        NodeStats {
            status: status.to_owned(),
            rx_bytes: 2048,
            tx_bytes: 10,
            rx_packets: Some(1500),
            tx_packets: None,
            error: (status != "running").then(|| "No such container".to_owned()),
        }
    }

    #[test]
    fn test_starts_loading() {
        assert_eq!(StatusTable::default(), StatusTable::Loading);
    }

    #[test]
    fn test_empty_map_is_explicit_no_data() {
        let mut table = StatusTable::default();
        table.apply(Ok(StatsMap::new()));
        assert_eq!(table, StatusTable::Empty);
    }

    #[test]
    fn test_rows_follow_name_order() {
        let mut table = StatusTable::default();
        table.apply(Ok(StatsMap::from([
            ("router".to_owned(), stats("running")),
            ("coredns".to_owned(), stats("error")),
        ])));

        let StatusTable::Rows { rows, updated } = table else {
            panic!("expected rows");
        };
        assert_eq!(updated.len(), 8);
        assert_eq!(rows[0].name, "coredns");
        assert_eq!(rows[0].status_label(), "Unavailable");
        assert_eq!(rows[0].error.as_deref(), Some("No such container"));
        assert_eq!(rows[1].status_label(), "Running");
        assert_eq!(rows[1].rx_packets, 1500);
        assert_eq!(rows[1].tx_packets, 0);
    }

    #[test]
    fn test_failure_replaces_rows_and_recovers() {
        let mut table = StatusTable::default();
        table.apply(Err(VizError::Fetch("Server responded with 500".to_owned())));
        assert_eq!(
            table,
            StatusTable::Failed("unable to load status: Server responded with 500".to_owned())
        );

        table.apply(Ok(StatsMap::from([("router".to_owned(), stats("running"))])));
        assert!(matches!(table, StatusTable::Rows { .. }));
    }

    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = [0u8; 1024];
                let _ = stream.read(&mut request);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{address}/api/stats")
    }

    #[test]
    fn test_fetch_reports_non_success_status() {
        let url = serve_once("HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let client = reqwest::blocking::Client::new();
        assert_eq!(
            fetch_stats(&client, &url),
            Err(VizError::Fetch("Server responded with 503".to_owned()))
        );
    }

    #[test]
    fn test_fetch_parses_stats_body() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 54\r\nConnection: close\r\n\r\n{\"web\":{\"status\":\"running\",\"rx_bytes\":1,\"tx_bytes\":2}}",
        );
        let client = reqwest::blocking::Client::new();
        let stats = fetch_stats(&client, &url).unwrap();
        assert_eq!(stats["web"].total_bytes(), 3);
    }
}
