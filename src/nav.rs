// nav.rs — page registry and navigation state
//
// Pages never hold a reference to the navigator. They push `NavRequest`s into
// the `PageCx` they are handed, and the loop applies those after dispatch, so
// no page is ever entered while another page's handler is still running.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::pixelui::Painter;
use crate::services::{Services, Tunnel};
use crate::touch::TouchEvent;

// ── page contract ─────────────────────────────────────────────────────────────

/// Payload delivered to the target page just before its `on_enter`.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// SSID the WiFi connect page should join.
    WifiTarget(String),
    EditTunnel(Tunnel),
    NewTunnel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavRequest {
    Go(String),
    GoWith(String, Intent),
    Back,
    /// Replace the current page with home, dropping history.
    Home,
}

/// What a page may touch while handling an event.
pub struct PageCx<'a> {
    pub services: &'a mut dyn Services,
    requests: &'a mut Vec<NavRequest>,
}

impl<'a> PageCx<'a> {
    pub fn new(services: &'a mut dyn Services, requests: &'a mut Vec<NavRequest>) -> Self {
        Self { services, requests }
    }

    pub fn go(&mut self, page: &str) {
        self.requests.push(NavRequest::Go(page.to_string()));
    }

    pub fn go_with(&mut self, page: &str, intent: Intent) {
        self.requests.push(NavRequest::GoWith(page.to_string(), intent));
    }

    pub fn back(&mut self) {
        self.requests.push(NavRequest::Back);
    }

    pub fn home(&mut self) {
        self.requests.push(NavRequest::Home);
    }
}

pub trait Page {
    /// Registry key; unique per process.
    fn name(&self) -> &str;

    fn render(&self, p: &mut Painter);

    /// Returns whether the event was handled.
    fn handle_touch(&mut self, ev: &TouchEvent, cx: &mut PageCx) -> bool;

    fn tick(&mut self, _delta_ms: u64, _cx: &mut PageCx) {}

    fn on_enter(&mut self, _cx: &mut PageCx) {}

    fn on_exit(&mut self) {}

    fn accept(&mut self, _intent: Intent) {}
}

// ── navigation ────────────────────────────────────────────────────────────────

// Requests raised by `on_enter` are applied in the same pass; this caps a
// pair of pages that keep redirecting to each other.
const MAX_REDIRECTS: usize = 8;

pub struct Navigation {
    pages: HashMap<String, Box<dyn Page>>,
    current: Option<String>,
    previous: Option<String>,
    home: String,
    idle_ms: u64,
    idle_timeout_ms: u64,
    pending: Vec<NavRequest>,
}

impl Navigation {
    pub fn new(home: &str, idle_timeout_secs: u64) -> Self {
        Self {
            pages: HashMap::new(),
            current: None,
            previous: None,
            home: home.to_string(),
            idle_ms: 0,
            idle_timeout_ms: idle_timeout_secs.saturating_mul(1000),
            pending: Vec::new(),
        }
    }

    /// Registering a second page under the same name replaces the first.
    pub fn register(&mut self, page: Box<dyn Page>) {
        let name = page.name().to_string();
        if self.pages.insert(name.clone(), page).is_some() {
            tracing::warn!("Page `{name}` registered twice, keeping the last");
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    pub fn home(&self) -> &str {
        &self.home
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.pages.contains_key(name)
    }

    pub fn navigate_to(&mut self, name: &str, services: &mut dyn Services) -> Result<()> {
        self.transition(name, None, true, services)
    }

    /// Like `navigate_to` but forgets the back target.
    pub fn switch_to(&mut self, name: &str, services: &mut dyn Services) -> Result<()> {
        self.transition(name, None, false, services)
    }

    /// No-op without a previous page.
    pub fn back(&mut self, services: &mut dyn Services) -> Result<()> {
        match self.previous.clone() {
            Some(prev) => self.navigate_to(&prev, services),
            None => Ok(()),
        }
    }

    fn transition(
        &mut self,
        name: &str,
        intent: Option<Intent>,
        keep_history: bool,
        services: &mut dyn Services,
    ) -> Result<()> {
        if !self.pages.contains_key(name) {
            return Err(Error::PageNotFound(name.to_string()));
        }

        if let Some(old) = self.current.take() {
            if let Some(page) = self.pages.get_mut(&old) {
                page.on_exit();
            }
            self.previous = keep_history.then_some(old);
        } else if !keep_history {
            self.previous = None;
        }

        tracing::info!(
            "Page -> {name} (previous: {})",
            self.previous.as_deref().unwrap_or("-")
        );
        self.current = Some(name.to_string());
        self.idle_ms = 0;

        if let Some(page) = self.pages.get_mut(name) {
            if let Some(intent) = intent {
                page.accept(intent);
            }
            let mut cx = PageCx::new(services, &mut self.pending);
            page.on_enter(&mut cx);
        }
        Ok(())
    }

    // ── per-frame hooks ──────────────────────────────────────────────────────

    pub fn render(&self, p: &mut Painter) {
        if let Some(page) = self.current.as_ref().and_then(|n| self.pages.get(n)) {
            page.render(p);
        }
    }

    /// Any touch resets the idle timer, handled or not.
    pub fn handle_touch(&mut self, ev: &TouchEvent, services: &mut dyn Services) -> bool {
        self.idle_ms = 0;
        let Some(page) = self.current.as_ref().and_then(|n| self.pages.get_mut(n)) else {
            return false;
        };
        let mut cx = PageCx::new(services, &mut self.pending);
        page.handle_touch(ev, &mut cx)
    }

    pub fn tick(&mut self, delta_ms: u64, services: &mut dyn Services) {
        let Some(current) = self.current.clone() else {
            return;
        };

        self.idle_ms = self.idle_ms.saturating_add(delta_ms);
        if self.idle_timeout_ms > 0
            && current != self.home
            && self.idle_ms > self.idle_timeout_ms
            && self.pages.contains_key(&self.home)
        {
            tracing::info!("Idle for {} ms, returning to {}", self.idle_ms, self.home);
            let home = self.home.clone();
            if let Err(e) = self.switch_to(&home, services) {
                tracing::warn!("Return home failed: {e}");
            }
            return;
        }

        if let Some(page) = self.pages.get_mut(&current) {
            let mut cx = PageCx::new(services, &mut self.pending);
            page.tick(delta_ms, &mut cx);
        }
    }

    /// Apply everything pages asked for since the last call. Unknown targets
    /// are logged and dropped.
    pub fn apply_requests(&mut self, services: &mut dyn Services) {
        for _ in 0..MAX_REDIRECTS {
            if self.pending.is_empty() {
                return;
            }
            for req in std::mem::take(&mut self.pending) {
                let result = match req {
                    NavRequest::Go(name) => self.navigate_to(&name, services),
                    NavRequest::GoWith(name, intent) => {
                        self.transition(&name, Some(intent), true, services)
                    }
                    NavRequest::Back => self.back(services),
                    NavRequest::Home => {
                        let home = self.home.clone();
                        self.switch_to(&home, services)
                    }
                };
                if let Err(e) = result {
                    tracing::warn!("Navigation request failed: {e}");
                }
            }
        }
        if !self.pending.is_empty() {
            tracing::warn!("Dropping {} navigation request(s): redirect loop", self.pending.len());
            self.pending.clear();
        }
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryServices;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Probe {
        name: &'static str,
        log: Log,
        handled: bool,
        on_tap: Option<NavRequest>,
    }

    impl Page for Probe {
        fn name(&self) -> &str {
            self.name
        }
        fn render(&self, _p: &mut Painter) {
            self.log.borrow_mut().push(format!("render {}", self.name));
        }
        fn handle_touch(&mut self, _ev: &TouchEvent, cx: &mut PageCx) -> bool {
            match self.on_tap.clone() {
                Some(NavRequest::Go(n)) => cx.go(&n),
                Some(NavRequest::GoWith(n, i)) => cx.go_with(&n, i),
                Some(NavRequest::Back) => cx.back(),
                Some(NavRequest::Home) => cx.home(),
                None => {}
            }
            self.handled
        }
        fn tick(&mut self, delta_ms: u64, _cx: &mut PageCx) {
            self.log.borrow_mut().push(format!("tick {} {delta_ms}", self.name));
        }
        fn on_enter(&mut self, _cx: &mut PageCx) {
            self.log.borrow_mut().push(format!("enter {}", self.name));
        }
        fn on_exit(&mut self) {
            self.log.borrow_mut().push(format!("exit {}", self.name));
        }
        fn accept(&mut self, intent: Intent) {
            self.log.borrow_mut().push(format!("accept {} {intent:?}", self.name));
        }
    }

    fn probe(name: &'static str, log: &Log) -> Box<Probe> {
        Box::new(Probe {
            name,
            log: log.clone(),
            handled: true,
            on_tap: None,
        })
    }

    fn setup(names: &[&'static str]) -> (Navigation, Log, MemoryServices) {
        let log: Log = Rc::default();
        let mut nav = Navigation::new("a", 30);
        for n in names {
            nav.register(probe(n, &log));
        }
        (nav, log, MemoryServices::default())
    }

    #[test]
    fn back_returns_to_previous() {
        let (mut nav, _log, mut svc) = setup(&["a", "b"]);
        nav.navigate_to("a", &mut svc).unwrap();
        nav.navigate_to("b", &mut svc).unwrap();
        nav.back(&mut svc).unwrap();
        assert_eq!(nav.current(), Some("a"));
        assert_eq!(nav.previous(), Some("b"));
    }

    #[test]
    fn renavigating_current_reruns_exit_then_enter() {
        let (mut nav, log, mut svc) = setup(&["a"]);
        nav.navigate_to("a", &mut svc).unwrap();
        log.borrow_mut().clear();
        nav.navigate_to("a", &mut svc).unwrap();
        assert_eq!(*log.borrow(), vec!["exit a", "enter a"]);
        assert_eq!(nav.previous(), Some("a"));
    }

    #[test]
    fn unknown_page_leaves_state_unchanged() {
        let (mut nav, log, mut svc) = setup(&["a"]);
        nav.navigate_to("a", &mut svc).unwrap();
        log.borrow_mut().clear();
        let err = nav.navigate_to("nope", &mut svc).unwrap_err();
        assert!(matches!(err, Error::PageNotFound(n) if n == "nope"));
        assert_eq!(nav.current(), Some("a"));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn empty_navigation_is_inert() {
        let (mut nav, log, mut svc) = setup(&["a"]);
        assert!(!nav.handle_touch(&TouchEvent::down(1, 1), &mut svc));
        nav.tick(16, &mut svc);
        nav.back(&mut svc).unwrap();
        assert_eq!(nav.current(), None);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn switch_to_clears_history() {
        let (mut nav, _log, mut svc) = setup(&["a", "b", "c"]);
        nav.navigate_to("b", &mut svc).unwrap();
        nav.switch_to("c", &mut svc).unwrap();
        assert_eq!(nav.previous(), None);
        nav.back(&mut svc).unwrap();
        assert_eq!(nav.current(), Some("c"));
    }

    #[test]
    fn idle_timeout_returns_home() {
        let (mut nav, log, mut svc) = setup(&["a", "b"]);
        nav.navigate_to("b", &mut svc).unwrap();
        nav.tick(20_000, &mut svc);
        nav.handle_touch(&TouchEvent::down(5, 5), &mut svc);
        nav.tick(20_000, &mut svc);
        assert_eq!(nav.current(), Some("b"));
        nav.tick(10_001, &mut svc);
        assert_eq!(nav.current(), Some("a"));
        assert_eq!(nav.previous(), None);
        assert!(log.borrow().contains(&"exit b".to_string()));
    }

    #[test]
    fn zero_timeout_disables_idle_home() {
        let log: Log = Rc::default();
        let mut svc = MemoryServices::default();
        let mut nav = Navigation::new("a", 0);
        nav.register(probe("a", &log));
        nav.register(probe("b", &log));
        nav.navigate_to("b", &mut svc).unwrap();
        nav.tick(10_000_000, &mut svc);
        assert_eq!(nav.current(), Some("b"));
    }

    #[test]
    fn requests_apply_after_dispatch_with_intent() {
        let log: Log = Rc::default();
        let mut svc = MemoryServices::default();
        let mut nav = Navigation::new("a", 30);
        nav.register(Box::new(Probe {
            name: "a",
            log: log.clone(),
            handled: true,
            on_tap: Some(NavRequest::GoWith("b".into(), Intent::NewTunnel)),
        }));
        nav.register(probe("b", &log));
        nav.navigate_to("a", &mut svc).unwrap();

        assert!(nav.handle_touch(&TouchEvent::up(10, 10), &mut svc));
        assert_eq!(nav.current(), Some("a"));
        log.borrow_mut().clear();

        nav.apply_requests(&mut svc);
        assert_eq!(nav.current(), Some("b"));
        assert_eq!(
            *log.borrow(),
            vec!["exit a", "accept b NewTunnel", "enter b"]
        );
    }

    #[test]
    fn unhandled_flag_is_passed_through() {
        let log: Log = Rc::default();
        let mut svc = MemoryServices::default();
        let mut nav = Navigation::new("a", 30);
        nav.register(Box::new(Probe {
            name: "a",
            log,
            handled: false,
            on_tap: Some(NavRequest::Go("missing".into())),
        }));
        nav.navigate_to("a", &mut svc).unwrap();
        assert!(!nav.handle_touch(&TouchEvent::up(1, 1), &mut svc));
        nav.apply_requests(&mut svc);
        assert_eq!(nav.current(), Some("a"));
    }
}
