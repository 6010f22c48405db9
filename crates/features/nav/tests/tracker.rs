use ln_dom::{Document, Element, HistoryState, Url};
use ln_domain::config::EnhancerConfig;
use ln_domain::signals::{LocationCause, LocationChanged};
use ln_event_bus::EventBus;
use ln_lifecycle::MutationWatcher;
use ln_nav::ActiveLinkTracker;

const NAV: &str = r#"
<nav id="nav" data-ln-nav="active">
  <a id="home" href="/">Home</a>
  <a id="docs" href="/docs">Docs</a>
  <a id="guide" href="/docs/guide/">Guide</a>
  <a id="foo" href="/foo">Foo</a>
  <a id="ext" href="https://other.test/docs/guide/intro">Elsewhere</a>
  <ul id="more"></ul>
</nav>
<a id="stray" href="/docs/guide">Stray</a>
"#;

struct Page {
    document: Document,
    bus: EventBus,
    tracker: ActiveLinkTracker,
    _watcher: MutationWatcher,
}

impl Page {
    fn at(location: &str, body: &str) -> Self {
        let document = Document::parse(location, "", body).unwrap();
        let bus = EventBus::new();
        let watcher = MutationWatcher::new(&document);
        let tracker = ActiveLinkTracker::new(&document, &EnhancerConfig::default());
        tracker.install(&watcher);
        tracker.subscribe(&bus).unwrap();
        Self { document, bus, tracker, _watcher: watcher }
    }

    fn el(&self, id: &str) -> Element {
        self.document.get_element_by_id(id).unwrap()
    }

    fn active(&self) -> Vec<String> {
        self.document
            .query_all(|e| e.has_class("active"))
            .iter()
            .filter_map(Element::id)
            .collect()
    }

    fn navigate(&self, url: &str) {
        let url = Url::parse(url).unwrap();
        self.document.push_state(url.clone(), HistoryState::Navigation);
        self.bus.publish(LocationChanged::new(url, LocationCause::Navigation)).unwrap();
    }
}

#[test]
fn deepest_matching_link_wins() {
    let page = Page::at("https://example.test/docs/guide/intro", NAV);
    assert_eq!(page.active(), vec!["guide"]);
}

#[test]
fn exact_match_and_trailing_slash() {
    let page = Page::at("https://example.test/docs/", NAV);
    assert_eq!(page.active(), vec!["docs"]);
}

#[test]
fn root_only_matches_itself() {
    let page = Page::at("https://example.test/", NAV);
    assert_eq!(page.active(), vec!["home"]);

    let page = Page::at("https://example.test/unknown", NAV);
    assert!(page.active().is_empty());
}

#[test]
fn prefix_without_segment_boundary_does_not_match() {
    let page = Page::at("https://example.test/foo2", NAV);
    assert!(page.active().is_empty());
}

#[test]
fn location_changes_re_evaluate_the_container() {
    let page = Page::at("https://example.test/", NAV);
    page.navigate("https://example.test/foo/bar");
    assert_eq!(page.active(), vec!["foo"]);

    page.document.traverse(-1);
    page.bus
        .publish(LocationChanged::new(page.document.location(), LocationCause::Traversal))
        .unwrap();
    assert_eq!(page.active(), vec!["home"]);
}

#[test]
fn links_added_later_are_evaluated() {
    let page = Page::at("https://example.test/docs/api", NAV);
    assert_eq!(page.active(), vec!["docs"]);

    page.el("more").set_inner_html(r#"<li><a id="api" href="/docs/api">API</a></li>"#);
    assert_eq!(page.active(), vec!["api"]);
    assert_eq!(page.tracker.tracked_links(&page.el("nav")), 6);
}

#[test]
fn removed_links_are_cleared_and_siblings_re_evaluated() {
    let page = Page::at("https://example.test/docs/guide/intro", NAV);
    let guide = page.el("guide");
    guide.remove();

    assert!(!guide.has_class("active"));
    assert_eq!(page.active(), vec!["docs"]);
}

#[test]
fn containers_without_a_class_are_ignored() {
    let page = Page::at(
        "https://example.test/docs",
        r#"<nav data-ln-nav=""><a id="docs" href="/docs">Docs</a></nav>"#,
    );
    assert_eq!(page.tracker.containers(), 0);
    assert!(page.active().is_empty());
}

#[test]
fn removing_the_container_stops_tracking() {
    let page = Page::at("https://example.test/docs", NAV);
    let nav = page.el("nav");
    nav.remove();

    assert_eq!(page.tracker.containers(), 0);
    let docs = nav.find(|e| e.id().as_deref() == Some("docs")).unwrap();
    assert!(!docs.has_class("active"));
}
