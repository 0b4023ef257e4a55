use std::collections::VecDeque;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::VizError;
use crate::session::VisualizationSession;
use crate::topology::parse_envelope;

pub const TOPOLOGY_EVENT: &str = "topology";
pub const NETWORK_UPDATE_EVENT: &str = "network_update";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Disconnected => "Disconnected",
            Self::Connected => "Connected",
        }
    }
}

/// What the background event source hands to the UI thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    Disconnected { reason: Option<String> },
    Frame(String),
}

/// Applies transport events to a session strictly in arrival order.
#[derive(Default)]
pub struct UpdateChannel {
    status: ConnectionStatus,
    pending: VecDeque<TransportEvent>,
    frames: u64,
}

impl UpdateChannel {
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    pub fn push(&mut self, event: TransportEvent) {
        self.pending.push_back(event);
    }

    /// Drains everything queued so far. Returns how many events were handled.
    pub fn process(&mut self, session: &mut VisualizationSession, now: Instant) -> usize {
        let mut handled = 0;
        while let Some(event) = self.pending.pop_front() {
            self.handle(session, event, now);
            handled += 1;
        }
        handled
    }

    fn handle(&mut self, session: &mut VisualizationSession, event: TransportEvent, now: Instant) {
        match event {
            TransportEvent::Connected => {
                if self.status != ConnectionStatus::Connected {
                    info!("event source connected");
                }
                self.status = ConnectionStatus::Connected;
            }
            TransportEvent::Disconnected { reason } => {
                if self.status == ConnectionStatus::Connected {
                    info!(reason = reason.as_deref().unwrap_or("end of stream"), "event source disconnected");
                }
                self.status = ConnectionStatus::Disconnected;
                if let Some(reason) = reason {
                    session.report(VizError::Transport(reason));
                }
            }
            TransportEvent::Frame(raw) => {
                self.frames += 1;
                if let Err(error) = route_frame(session, &raw, now) {
                    session.report(error);
                }
            }
        }
    }
}

fn route_frame(session: &mut VisualizationSession, raw: &str, now: Instant) -> Result<(), VizError> {
    let envelope = parse_envelope(raw)?;
    match envelope.event.as_str() {
        TOPOLOGY_EVENT => session.apply_topology(&envelope.data),
        NETWORK_UPDATE_EVENT => session.apply_update(&envelope.data, now),
        other => {
            debug!(event = other, "ignoring unknown event");
            Ok(())
        }
    }
}
