use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::ActivityConfig;
use crate::topology::ActivitySample;
use crate::util::{format_bytes, wall_clock};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityEvent {
    pub node: String,
    pub rx: u64,
    pub tx: u64,
    pub rx_packets: Option<u64>,
    pub tx_packets: Option<u64>,
    /// Local wall-clock `HH:MM:SS` at receipt.
    pub clock: String,
}

impl ActivityEvent {
    pub fn summary(&self) -> String {
        format!(
            "[{}] {}: ↓{} ↑{}",
            self.clock,
            self.node,
            format_bytes(self.rx),
            format_bytes(self.tx)
        )
    }
}

/// Bounded recency log plus per-node emphasis deadlines.
pub struct ActivityOverlay {
    capacity: usize,
    decay: Duration,
    log: VecDeque<ActivityEvent>,
    emphasis: HashMap<String, Instant>,
}

impl ActivityOverlay {
    pub fn new(config: &ActivityConfig) -> Self {
        Self::with_limits(config.log_capacity, config.emphasis_decay())
    }

    pub fn with_limits(capacity: usize, decay: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            decay,
            log: VecDeque::with_capacity(capacity),
            emphasis: HashMap::new(),
        }
    }

    pub fn record_activity(&mut self, samples: &[ActivitySample], now: Instant) {
        if samples.is_empty() {
            return;
        }

        let clock = wall_clock();
        let deadline = now + self.decay;
        for sample in samples {
            if self.log.len() == self.capacity {
                self.log.pop_back();
            }
            self.log.push_front(ActivityEvent {
                node: sample.node.clone(),
                rx: sample.rx,
                tx: sample.tx,
                rx_packets: sample.rx_packets,
                tx_packets: sample.tx_packets,
                clock: clock.clone(),
            });
            self.emphasis.insert(sample.node.clone(), deadline);
        }

        debug!(
            samples = samples.len(),
            emphasized = self.emphasis.len(),
            "recorded activity"
        );
    }

    pub fn is_emphasized(&self, node: &str, now: Instant) -> bool {
        self.emphasis
            .get(node)
            .is_some_and(|deadline| now < *deadline)
    }

    /// 1.0 right after an event, fading linearly to 0.0 at the deadline.
    pub fn emphasis_level(&self, node: &str, now: Instant) -> f32 {
        let Some(deadline) = self.emphasis.get(node) else {
            return 0.0;
        };
        if self.decay.is_zero() || now >= *deadline {
            return 0.0;
        }

        let remaining = deadline.saturating_duration_since(now);
        (remaining.as_secs_f32() / self.decay.as_secs_f32()).clamp(0.0, 1.0)
    }

    /// Drops deadlines that have passed. Returns true when anything was cleared.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.emphasis.len();
        self.emphasis.retain(|_, deadline| now < *deadline);
        before != self.emphasis.len()
    }

    pub fn next_expiry(&self) -> Option<Instant> {
        self.emphasis.values().min().copied()
    }

    /// Newest first.
    pub fn log(&self) -> impl Iterator<Item = &ActivityEvent> {
        self.log.iter()
    }

    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn sample(node: &str, rx: u64, tx: u64) -> ActivitySample {
        ActivitySample {
            node: node.to_owned(),
            rx,
            tx,
            rx_packets: None,
            tx_packets: None,
        }
    }

    fn overlay() -> ActivityOverlay {
        ActivityOverlay::with_limits(10, Duration::from_millis(1000))
    }

    #[test]
    fn test_emphasis_is_immediate_and_decays() {
        let mut overlay = overlay();
        let now = Instant::now();
        overlay.record_activity(&[sample("client10", 100, 50)], now);

        assert!(overlay.is_emphasized("client10", now));
        assert!(overlay.is_emphasized("client10", now + Duration::from_millis(999)));
        assert!(!overlay.is_emphasized("client10", now + Duration::from_millis(1000)));
        assert!(!overlay.is_emphasized("router", now));

        let entry = overlay.log().next().unwrap();
        assert_eq!(entry.node, "client10");
        assert_eq!((entry.rx, entry.tx), (100, 50));
    }

    #[test]
    fn test_retrigger_restarts_only_that_timer() {
        let mut overlay = overlay();
        let start = Instant::now();
        overlay.record_activity(&[sample("a", 1, 1), sample("b", 1, 1)], start);

        let later = start + Duration::from_millis(600);
        overlay.record_activity(&[sample("a", 2, 2)], later);

        let check = start + Duration::from_millis(1200);
        assert!(overlay.is_emphasized("a", check));
        assert!(!overlay.is_emphasized("b", check));
    }

    #[test]
    fn test_empty_batch_is_a_no_op() {
        let mut overlay = overlay();
        overlay.record_activity(&[], Instant::now());
        assert_eq!(overlay.log_len(), 0);
        assert_eq!(overlay.next_expiry(), None);
    }

    #[test]
    fn test_eleventh_insert_evicts_the_oldest() {
        let mut overlay = overlay();
        let now = Instant::now();
        for index in 0..11 {
            overlay.record_activity(&[sample(&format!("n{index}"), index, 0)], now);
        }

        assert_eq!(overlay.log_len(), 10);
        let nodes = overlay.log().map(|event| event.node.as_str()).collect::<Vec<_>>();
        assert_eq!(nodes.first(), Some(&"n10"));
        assert_eq!(nodes.last(), Some(&"n1"));
        assert!(!nodes.contains(&"n0"));
    }

    #[test]
    fn test_expire_and_next_expiry() {
        let mut overlay = overlay();
        let start = Instant::now();
        overlay.record_activity(&[sample("a", 1, 1)], start);
        overlay.record_activity(&[sample("b", 1, 1)], start + Duration::from_millis(500));

        assert_eq!(overlay.next_expiry(), Some(start + Duration::from_millis(1000)));
        assert!(!overlay.expire(start + Duration::from_millis(10)));
        assert!(overlay.expire(start + Duration::from_millis(1100)));
        assert_eq!(overlay.next_expiry(), Some(start + Duration::from_millis(1500)));
    }

    #[test]
    fn test_emphasis_level_fades() {
        let mut overlay = overlay();
        let now = Instant::now();
        overlay.record_activity(&[sample("a", 1, 1)], now);

        assert!((overlay.emphasis_level("a", now) - 1.0).abs() < 1e-6);
        let halfway = overlay.emphasis_level("a", now + Duration::from_millis(500));
        assert!((halfway - 0.5).abs() < 1e-3);
        assert_eq!(overlay.emphasis_level("a", now + Duration::from_secs(2)), 0.0);
    }

    #[test]
    fn test_summary_uses_byte_formatting() {
        let mut overlay = overlay();
        overlay.record_activity(&[sample("web", 1536, 0)], Instant::now());
        let summary = overlay.log().next().unwrap().summary();
        assert!(summary.ends_with("web: ↓1.50 KB ↑0 B"), "{summary}");
    }

    proptest! {
        #[test]
        fn prop_log_never_exceeds_capacity(capacity in 1usize..20, batches in prop::collection::vec(0usize..5, 0..40)) {
            let mut overlay = ActivityOverlay::with_limits(capacity, Duration::from_millis(1000));
            let now = Instant::now();
            let mut total = 0usize;
            for (batch, size) in batches.iter().enumerate() {
                let samples = (0..*size)
                    .map(|offset| sample(&format!("n{batch}-{offset}"), 0, 0))
                    .collect::<Vec<_>>();
                overlay.record_activity(&samples, now);
                total += size;
                prop_assert!(overlay.log_len() <= capacity);
            }
            prop_assert_eq!(overlay.log_len(), total.min(capacity));
        }
    }
}
