//! The transcript display buffer.

use super::clock::Clock;
use super::dedup::{fingerprint, DedupLedger};
use super::item::{Candidate, DisplayItem};
use super::subscribers::{Subscribers, Subscription};
use crate::settings::BufferSettings;
use log::debug;
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// Bounded, deduplicating, append-only list of transcript items for one
/// voice session.
///
/// All operations are synchronous and do no I/O. Hosts that share a buffer
/// across threads must wrap the whole buffer in one `Mutex` so that the
/// read-then-write in `add_item` stays atomic.
pub struct TranscriptDisplayBuffer {
    /// Accepted items, oldest first
    items: VecDeque<DisplayItem>,

    /// Recently accepted content, kept across `clear_buffer`
    ledger: DedupLedger,

    subscribers: Subscribers,

    settings: BufferSettings,

    clock: Arc<dyn Clock>,
}

impl TranscriptDisplayBuffer {
    /// Create an empty buffer.
    ///
    /// A `max_capacity` of 0 is raised to 1.
    pub fn new(settings: BufferSettings, clock: Arc<dyn Clock>) -> Self {
        let settings = BufferSettings {
            max_capacity: settings.max_capacity.max(1),
            ..settings
        };

        debug!(
            "TranscriptDisplayBuffer created: capacity={}, dedup_window={}ms",
            settings.max_capacity, settings.dedup_window_ms
        );

        Self {
            items: VecDeque::with_capacity(settings.max_capacity.min(1024)),
            ledger: DedupLedger::new(settings.dedup_window_ms),
            subscribers: Subscribers::new(),
            settings,
            clock,
        }
    }

    /// Offer a candidate item.
    ///
    /// Returns `true` if it was accepted. Content already accepted within the
    /// dedup window is dropped silently: nothing is stored and nobody is
    /// notified. The dedup key is `content` alone.
    pub fn add_item(&mut self, candidate: Candidate) -> bool {
        let now = self.clock.now_ms();
        let fp = fingerprint(&candidate.content);

        if self.ledger.is_duplicate(&fp, now) {
            debug!(
                "Suppressed duplicate {} fragment from '{}' ({} chars)",
                candidate.kind.as_str(),
                candidate.speaker,
                candidate.content.len()
            );
            return false;
        }

        let item = DisplayItem::accept(candidate, Uuid::new_v4().to_string(), now);
        self.items.push_back(item);
        self.ledger.record(fp, now);

        // Evict oldest; the ledger keeps evicted content until it ages out
        while self.items.len() > self.settings.max_capacity {
            if let Some(evicted) = self.items.pop_front() {
                debug!("Evicted display item {} (capacity {})", evicted.id, self.settings.max_capacity);
            }
        }

        self.subscribers.notify();
        true
    }

    /// Snapshot of the accepted items, oldest first.
    pub fn get_items(&self) -> Vec<DisplayItem> {
        self.items.iter().cloned().collect()
    }

    /// Register a callback invoked after every accepted item.
    ///
    /// Existing items do not trigger it. Callbacks run synchronously inside
    /// `add_item`, so they must not try to lock whatever owns this buffer;
    /// record the change and re-read `get_items()` afterwards instead.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// Remove all displayed items.
    ///
    /// The dedup ledger is kept: content shown before the clear is still
    /// suppressed for the rest of its window. Subscribers stay registered
    /// and are not notified.
    pub fn clear_buffer(&mut self) {
        let cleared = self.items.len();
        self.items.clear();
        debug!(
            "Cleared {} display items ({} fingerprints retained)",
            cleared,
            self.ledger.len()
        );
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn settings(&self) -> &BufferSettings {
        &self.settings
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Number of fingerprints currently remembered for deduplication.
    pub fn ledger_len(&self) -> usize {
        self.ledger.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display_buffer::clock::ManualClock;
    use crate::display_buffer::item::DisplayItemKind;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn buffer_with(max_capacity: usize, dedup_window_ms: u64) -> (TranscriptDisplayBuffer, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        let settings = BufferSettings {
            max_capacity,
            dedup_window_ms,
        };
        (TranscriptDisplayBuffer::new(settings, Arc::new(clock.clone())), clock)
    }

    fn default_buffer() -> (TranscriptDisplayBuffer, ManualClock) {
        buffer_with(1000, 1000)
    }

    #[test]
    fn test_identical_content_within_window_is_suppressed() {
        let (mut buffer, clock) = default_buffer();

        assert!(buffer.add_item(Candidate::text("photosynthesis", "teacher")));
        clock.advance(999);
        assert!(!buffer.add_item(Candidate::text("photosynthesis", "teacher")));

        let items = buffer.get_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, "photosynthesis");
    }

    #[test]
    fn test_dedup_ignores_type_speaker_and_confidence() {
        let (mut buffer, _clock) = default_buffer();

        assert!(buffer.add_item(Candidate::text("2+2=4", "teacher")));
        assert!(!buffer.add_item(Candidate::math("2+2=4", "student")));
        assert!(!buffer.add_item(
            Candidate::new(DisplayItemKind::Diagram, "2+2=4", "teacher").with_confidence(0.3)
        ));

        let items = buffer.get_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, DisplayItemKind::Text);
        assert_eq!(items[0].speaker, "teacher");
    }

    #[test]
    fn test_content_accepted_again_after_window() {
        let (mut buffer, clock) = default_buffer();

        assert!(buffer.add_item(Candidate::text("again", "teacher")));
        let first_ts = buffer.get_items()[0].timestamp;
        clock.advance(1001);
        assert!(buffer.add_item(Candidate::text("again", "teacher")));

        let items = buffer.get_items();
        assert_eq!(items.len(), 2);
        assert_ne!(items[0].id, items[1].id);
        assert_eq!(items[1].timestamp, first_ts + 1001);
    }

    #[test]
    fn test_window_is_measured_from_last_acceptance() {
        let (mut buffer, clock) = default_buffer();

        buffer.add_item(Candidate::text("burst", "teacher"));
        for _ in 0..9 {
            clock.advance(100);
            assert!(!buffer.add_item(Candidate::text("burst", "teacher")));
        }
        // 1000ms after the accepted one, even though a rejected copy came 100ms ago
        clock.advance(100);
        assert!(buffer.add_item(Candidate::text("burst", "teacher")));
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_burst_of_identical_candidates_accepts_once() {
        let (mut buffer, _clock) = default_buffer();
        let accepted = (0..50)
            .filter(|_| buffer.add_item(Candidate::text("um so", "student")))
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_capacity_keeps_most_recent_in_order() {
        let (mut buffer, _clock) = buffer_with(5, 1000);

        for i in 0..12 {
            assert!(buffer.add_item(Candidate::text(format!("line {}", i), "teacher")));
        }

        let contents: Vec<String> = buffer.get_items().into_iter().map(|i| i.content).collect();
        assert_eq!(contents, vec!["line 7", "line 8", "line 9", "line 10", "line 11"]);
    }

    #[test]
    fn test_default_capacity_bound() {
        let (mut buffer, _clock) = default_buffer();

        for i in 0..1500 {
            buffer.add_item(Candidate::text(format!("fragment {}", i), "teacher"));
        }

        let items = buffer.get_items();
        assert_eq!(items.len(), 1000);
        assert_eq!(items[0].content, "fragment 500");
        assert_eq!(items[999].content, "fragment 1499");

        let ids: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_evicted_content_is_still_deduplicated() {
        let (mut buffer, _clock) = buffer_with(2, 1000);

        buffer.add_item(Candidate::text("a", "teacher"));
        buffer.add_item(Candidate::text("b", "teacher"));
        buffer.add_item(Candidate::text("c", "teacher"));
        assert!(!buffer.add_item(Candidate::text("a", "teacher")));

        let contents: Vec<String> = buffer.get_items().into_iter().map(|i| i.content).collect();
        assert_eq!(contents, vec!["b", "c"]);
    }

    #[test]
    fn test_clear_keeps_dedup_history() {
        let (mut buffer, clock) = default_buffer();

        buffer.add_item(Candidate::text("x", "teacher"));
        buffer.clear_buffer();
        assert!(buffer.get_items().is_empty());

        clock.advance(500);
        assert!(!buffer.add_item(Candidate::text("x", "teacher")));
        assert!(buffer.is_empty());
        assert_eq!(buffer.ledger_len(), 1);

        clock.advance(500);
        assert!(buffer.add_item(Candidate::text("x", "teacher")));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_subscriber_called_once_per_accepted_item() {
        let (mut buffer, _clock) = default_buffer();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let _sub = buffer.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        for i in 0..4 {
            buffer.add_item(Candidate::text(format!("distinct {}", i), "teacher"));
        }
        for _ in 0..3 {
            buffer.add_item(Candidate::text("distinct 0", "student"));
        }
        buffer.clear_buffer();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_subscribe_is_not_retroactive() {
        let (mut buffer, _clock) = default_buffer();
        buffer.add_item(Candidate::text("before", "teacher"));

        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        buffer.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        buffer.add_item(Candidate::text("after", "teacher"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscriber_sees_item_already_stored() {
        let (mut buffer, _clock) = buffer_with(1, 1000);
        let seen = Arc::new(AtomicUsize::new(0));
        let s = seen.clone();
        buffer.subscribe(move || {
            s.fetch_add(1, Ordering::SeqCst);
        });

        buffer.add_item(Candidate::text("one", "teacher"));
        buffer.add_item(Candidate::text("two", "teacher"));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(buffer.get_items()[0].content, "two");
    }

    #[test]
    fn test_unsubscribe_after_clear_and_drop() {
        let (mut buffer, _clock) = default_buffer();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let sub = buffer.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        buffer.clear_buffer();
        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(buffer.subscriber_count(), 0);

        buffer.add_item(Candidate::text("quiet", "teacher"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        drop(buffer);
        sub.unsubscribe();
    }

    #[test]
    fn test_empty_content_is_deduplicated_like_any_other() {
        let (mut buffer, _clock) = default_buffer();

        assert!(buffer.add_item(Candidate::text("", "teacher")));
        assert!(!buffer.add_item(Candidate::text("", "teacher")));
        assert!(buffer.add_item(Candidate::text(" ", "teacher")));
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_content_compared_exactly() {
        let (mut buffer, _clock) = default_buffer();

        assert!(buffer.add_item(Candidate::text("Hello", "teacher")));
        assert!(buffer.add_item(Candidate::text("hello", "teacher")));
        assert!(buffer.add_item(Candidate::text("café ☕", "teacher")));
        assert!(!buffer.add_item(Candidate::text("café ☕", "student")));
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_get_items_returns_snapshot() {
        let (mut buffer, _clock) = default_buffer();
        buffer.add_item(Candidate::text("kept", "teacher"));

        let mut snapshot = buffer.get_items();
        snapshot.clear();
        snapshot.push(DisplayItem::accept(Candidate::text("fake", "x"), "id".into(), 0));

        let items = buffer.get_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, "kept");
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let (mut buffer, _clock) = buffer_with(0, 1000);
        buffer.add_item(Candidate::text("a", "teacher"));
        buffer.add_item(Candidate::text("b", "teacher"));
        assert_eq!(buffer.settings().max_capacity, 1);
        assert_eq!(buffer.get_items()[0].content, "b");
    }

    #[test]
    fn test_metadata_and_confidence_pass_through() {
        let (mut buffer, _clock) = default_buffer();
        buffer.add_item(
            Candidate::math("\\frac{1}{2}", "teacher")
                .with_confidence(0.87)
                .with_metadata("is_final", serde_json::json!(false)),
        );

        let item = &buffer.get_items()[0];
        assert_eq!(item.confidence, Some(0.87));
        assert_eq!(item.metadata.get("is_final"), Some(&serde_json::json!(false)));
        assert_eq!(item.timestamp, 1_700_000_000_000);
    }
}
