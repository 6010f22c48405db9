use fxhash::FxHashMap;
use ln_dom::{Document, HistoryState};
use ln_domain::navigation::NavigationResponse;
use ln_domain::notification::NotificationEvent;
use ln_domain::signals::{LocationCause, LocationChanged};
use ln_event_bus::EventBus;
use parking_lot::Mutex;
use tracing::{debug, trace};
use url::Url;

/// A write target whose last writer is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Slot {
    Title,
    History,
    Region(String),
}

/// Per-target dispatch sequence numbers.
///
/// An exchange may only write a target if no exchange dispatched after it already has,
/// so the last request *sent* wins, whatever order responses arrive in.
#[derive(Debug, Default)]
pub(crate) struct Sequencer {
    written: Mutex<FxHashMap<Slot, u64>>,
}

impl Sequencer {
    /// Runs `write` if `seq` may write `slot`. The check and the write happen under one
    /// lock, so concurrent exchanges cannot interleave between them.
    fn write_if_current(&self, slot: Slot, seq: u64, write: impl FnOnce()) -> bool {
        let mut written = self.written.lock();
        if written.get(&slot).is_some_and(|last| *last > seq) {
            return false;
        }
        written.insert(slot, seq);
        write();
        true
    }
}

/// What one application changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedResponse {
    pub title: bool,
    pub regions: Vec<String>,
    /// Keys with no live element.
    pub missing: Vec<String>,
    /// Keys skipped because a later exchange already wrote them.
    pub superseded: Vec<String>,
    pub history: Option<Url>,
    pub notified: bool,
}

/// Applies a successful navigation response to the document.
#[derive(Debug, Default)]
pub struct ResponseApplier {
    sequencer: Sequencer,
}

impl ResponseApplier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Title, then regions, then history, then the message.
    ///
    /// `history` is the location to record, if the trigger records one. Pushing it
    /// publishes [`LocationChanged`] with [`LocationCause::Navigation`].
    pub fn apply(
        &self,
        document: &Document,
        bus: &EventBus,
        response: NavigationResponse,
        seq: u64,
        history: Option<Url>,
    ) -> AppliedResponse {
        let mut applied = AppliedResponse::default();

        if let Some(title) = response.title {
            applied.title = self.sequencer.write_if_current(Slot::Title, seq, || document.set_title(title));
        }

        for (target, html) in response.content {
            let Some(element) = document.get_element_by_id(&target) else {
                trace!(target, "Response region has no matching element");
                applied.missing.push(target);
                continue;
            };
            if self.sequencer.write_if_current(Slot::Region(target.clone()), seq, || element.set_inner_html(&html)) {
                applied.regions.push(target);
            } else {
                applied.superseded.push(target);
            }
        }

        if let Some(url) = history
            && self.sequencer.write_if_current(Slot::History, seq, || {
                document.push_state(url.clone(), HistoryState::Navigation);
            })
        {
            let _ = bus.publish(LocationChanged::new(url.clone(), LocationCause::Navigation));
            applied.history = Some(url);
        }

        if let Some(message) = response.message {
            let _ = bus.publish(NotificationEvent::from(message));
            applied.notified = true;
        }

        debug!(
            seq,
            title = applied.title,
            regions = applied.regions.len(),
            missing = applied.missing.len(),
            superseded = applied.superseded.len(),
            history = applied.history.is_some(),
            "Navigation response applied"
        );
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ln_domain::navigation::ResponseMessage;
    use ln_domain::notification::NotificationKind;
    use std::sync::{Arc, Barrier};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn page() -> Document {
        Document::parse("https://example.test/", "", r#"<main id="main">old</main><aside id="side">x</aside>"#)
            .unwrap()
    }

    #[test]
    fn test_missing_targets_are_skipped_silently() {
        let document = page();
        let before = document.body().inner_html();
        let applied = ResponseApplier::new().apply(
            &document,
            &EventBus::new(),
            NavigationResponse::new().with_region("missing-id", "<p>x</p>"),
            1,
            None,
        );
        assert_eq!(applied.missing, vec!["missing-id"]);
        assert_eq!(document.body().inner_html(), before);
    }

    #[test]
    fn test_full_response_in_order() {
        let document = page();
        let bus = EventBus::new();
        let notes = Arc::new(AtomicUsize::new(0));
        let seen = notes.clone();
        bus.listen::<NotificationEvent, _>(move |event| {
            assert_eq!(event.kind, NotificationKind::Success);
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        let target = Url::parse("https://example.test/next").unwrap();
        let response = NavigationResponse::new()
            .with_title("Next")
            .with_region("main", "<p>new</p>")
            .with_message(ResponseMessage::new(NotificationKind::Success, "Saved", "ok"));
        let applied = ResponseApplier::new().apply(&document, &bus, response, 1, Some(target.clone()));

        assert!(applied.title && applied.notified);
        assert_eq!(applied.regions, vec!["main"]);
        assert_eq!(document.title(), "Next");
        assert_eq!(document.get_element_by_id("main").unwrap().inner_html(), "<p>new</p>");
        assert_eq!(document.location(), target);
        assert_eq!(notes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_last_sent_wins_per_target() {
        let document = page();
        let bus = EventBus::new();
        let applier = ResponseApplier::new();

        let later = NavigationResponse::new().with_title("Second").with_region("main", "second");
        applier.apply(&document, &bus, later, 2, None);

        let earlier = NavigationResponse::new()
            .with_title("First")
            .with_region("main", "first")
            .with_region("side", "first side");
        let applied = applier.apply(&document, &bus, earlier, 1, None);

        assert_eq!(document.title(), "Second");
        assert_eq!(document.get_element_by_id("main").unwrap().text_content(), "second");
        assert_eq!(document.get_element_by_id("side").unwrap().text_content(), "first side");
        assert_eq!(applied.superseded, vec!["main"]);
    }

    #[test]
    fn test_last_sent_wins_across_threads() {
        let bulky = "<p>first</p>".repeat(200);
        for _ in 0..300 {
            let document = page();
            let bus = EventBus::new();
            let applier = ResponseApplier::new();
            let barrier = Barrier::new(2);

            std::thread::scope(|scope| {
                scope.spawn(|| {
                    let response = NavigationResponse::new().with_title("T1").with_region("main", bulky.as_str());
                    barrier.wait();
                    applier.apply(&document, &bus, response, 1, None);
                });
                scope.spawn(|| {
                    let response = NavigationResponse::new().with_title("T2").with_region("main", "<p>second</p>");
                    barrier.wait();
                    applier.apply(&document, &bus, response, 2, None);
                });
            });

            assert_eq!(document.title(), "T2");
            assert_eq!(document.get_element_by_id("main").unwrap().inner_html(), "<p>second</p>");
        }
    }
}
