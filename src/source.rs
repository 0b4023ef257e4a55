use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::net::TcpStream;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::channel::TransportEvent;

pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventSource {
    Stdin,
    File(PathBuf),
    Tcp(String),
}

impl EventSource {
    /// `-` means stdin, anything else is a file path.
    pub fn from_events_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(arg))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Stdin => "stdin".to_owned(),
            Self::File(path) => path.display().to_string(),
            Self::Tcp(address) => format!("tcp://{address}"),
        }
    }
}

enum PumpEnd {
    Eof,
    ReceiverGone,
    Failed(io::Error),
}

struct Link<W> {
    tx: Sender<TransportEvent>,
    wake: W,
}

impl<W: Fn()> Link<W> {
    fn send(&self, event: TransportEvent) -> bool {
        let delivered = self.tx.send(event).is_ok();
        if delivered {
            (self.wake)();
        }
        delivered
    }
}

/// Reads newline-delimited envelopes on a background thread and forwards them as transport events.
pub fn spawn_event_source<W>(
    source: EventSource,
    replay_interval: Option<Duration>,
    wake: W,
) -> Receiver<TransportEvent>
where
    W: Fn() + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let link = Link { tx, wake };

    thread::spawn(move || {
        info!(source = %source.describe(), "starting event source");
        match source {
            EventSource::Stdin => read_once(&link, io::stdin().lock(), None),
            EventSource::File(path) => match File::open(&path) {
                Ok(file) => read_once(&link, BufReader::new(file), replay_interval),
                Err(error) => {
                    link.send(TransportEvent::Disconnected {
                        reason: Some(format!("unable to open {}: {error}", path.display())),
                    });
                }
            },
            EventSource::Tcp(address) => read_tcp(&link, &address),
        }
    });

    rx
}

fn read_once<W: Fn(), R: BufRead>(link: &Link<W>, reader: R, pace: Option<Duration>) {
    if !link.send(TransportEvent::Connected) {
        return;
    }

    let reason = match pump_lines(link, reader, pace) {
        PumpEnd::ReceiverGone => return,
        PumpEnd::Eof => None,
        PumpEnd::Failed(error) => Some(format!("read failed: {error}")),
    };
    link.send(TransportEvent::Disconnected { reason });
}

fn read_tcp<W: Fn()>(link: &Link<W>, address: &str) {
    let mut announced_failure = false;

    loop {
        match TcpStream::connect(address) {
            Ok(stream) => {
                announced_failure = false;
                if !link.send(TransportEvent::Connected) {
                    return;
                }
                let reason = match pump_lines(link, BufReader::new(stream), None) {
                    PumpEnd::ReceiverGone => return,
                    PumpEnd::Eof => "connection closed by peer".to_owned(),
                    PumpEnd::Failed(error) => format!("connection lost: {error}"),
                };
                if !link.send(TransportEvent::Disconnected {
                    reason: Some(reason),
                }) {
                    return;
                }
            }
            Err(error) => {
                debug!(%address, %error, "connect attempt failed");
                if !announced_failure {
                    announced_failure = true;
                    if !link.send(TransportEvent::Disconnected {
                        reason: Some(format!("unable to reach {address}: {error}")),
                    }) {
                        return;
                    }
                }
            }
        }

        thread::sleep(RECONNECT_DELAY);
    }
}

fn pump_lines<W: Fn(), R: BufRead>(link: &Link<W>, reader: R, pace: Option<Duration>) -> PumpEnd {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(error) => {
                warn!(%error, "event source read failed");
                return PumpEnd::Failed(error);
            }
        };

        let frame = line.trim();
        if frame.is_empty() {
            continue;
        }
        if !link.send(TransportEvent::Frame(frame.to_owned())) {
            return PumpEnd::ReceiverGone;
        }
        if let Some(pace) = pace {
            thread::sleep(pace);
        }
    }
    PumpEnd::Eof
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn link() -> (Link<impl Fn()>, Receiver<TransportEvent>, Arc<AtomicUsize>) {
        let (tx, rx) = mpsc::channel();
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let wake = move || {
            counter.fetch_add(1, Ordering::SeqCst);
        };
        (Link { tx, wake }, rx, wakes)
    }

    #[test]
    fn test_read_once_frames_lines_and_skips_blanks() {
        let (link, rx, wakes) = link();
        let input = Cursor::new("{\"event\":\"a\"}\n\n   \n{\"event\":\"b\"}\n");
        read_once(&link, input, None);
        drop(link);

        let events = rx.iter().collect::<Vec<_>>();
        assert_eq!(
            events,
            vec![
                TransportEvent::Connected,
                TransportEvent::Frame("{\"event\":\"a\"}".to_owned()),
                TransportEvent::Frame("{\"event\":\"b\"}".to_owned()),
                TransportEvent::Disconnected { reason: None },
            ]
        );
        assert_eq!(wakes.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_missing_file_reports_disconnect() {
        let rx = spawn_event_source(
            EventSource::File(PathBuf::from("/nonexistent/netviz-events.ndjson")),
            None,
            || {},
        );
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(TransportEvent::Disconnected { reason: Some(reason) }) => {
                assert!(reason.contains("unable to open"), "{reason}");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_tcp_source_streams_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let rx = spawn_event_source(EventSource::Tcp(address), None, || {});

        let (mut stream, _) = listener.accept().unwrap();
        stream.write_all(b"{\"event\":\"topology\"}\n").unwrap();
        drop(stream);

        let timeout = Duration::from_secs(5);
        assert_eq!(rx.recv_timeout(timeout), Ok(TransportEvent::Connected));
        assert_eq!(
            rx.recv_timeout(timeout),
            Ok(TransportEvent::Frame("{\"event\":\"topology\"}".to_owned()))
        );
        assert!(matches!(
            rx.recv_timeout(timeout),
            Ok(TransportEvent::Disconnected { reason: Some(_) })
        ));
    }

    #[test]
    fn test_events_arg_parsing() {
        assert_eq!(EventSource::from_events_arg("-"), EventSource::Stdin);
        assert_eq!(
            EventSource::from_events_arg("demo.ndjson"),
            EventSource::File(PathBuf::from("demo.ndjson"))
        );
        assert_eq!(EventSource::Tcp("127.0.0.1:9000".to_owned()).describe(), "tcp://127.0.0.1:9000");
    }
}
