// pages/tunnel_edit.rs — create, edit and delete one tunnel
//
// The form is taller than the screen once a web protocol adds the fallback
// toggle and an error line shows, so everything below the nav bar scrolls.
// All vertical positions are relative to the content top and shifted by
// `scroll` in `layout`.

use crate::font::FontWeight;
use crate::nav::{Intent, Page, PageCx};
use crate::pixelui::widgets::{
    Button, ButtonStyle, ConfirmDialog, DialogResponse, InputField, NavBar, NavBarResponse,
    VirtualKeyboard, NAVBAR_HEIGHT,
};
use crate::pixelui::{text_top_for_center, theme, Painter, Rect, LOGICAL_H};
use crate::services::{Tunnel, TunnelKind};
use crate::touch::{TouchEvent, TouchKind};

use super::{route_form_touch, FormTouch};

const NAME: usize = 0;
const LOCAL_IP: usize = 1;
const LOCAL_PORT: usize = 2;
const REMOTE_PORT: usize = 3;
const DOMAIN: usize = 4;

const LEFT: i32 = 24;
const WIDTH: i32 = 432;

const REL_PROTO_LABEL: i32 = 14;
const REL_PROTO: i32 = 40;
const PROTO_H: i32 = 34;
const PROTO_GAP: i32 = 8;
const FIELD_H: i32 = 46;
/// Remote port and domain share the last slot.
const REL_FIELDS: [i32; 5] = [90, 146, 202, 258, 258];
const REL_TOGGLE: i32 = 316;
const TOGGLE_H: i32 = 44;
const BUTTON_H: i32 = 50;
const BUTTON_W: i32 = 208;
const DRAG_THRESHOLD: i32 = 6;

const DEFAULT_LOCAL_IP: &str = "127.0.0.1";

pub struct TunnelEditPage {
    nav_bar: NavBar,
    fields: [InputField; 5],
    keyboard: VirtualKeyboard,
    save: Button,
    delete: Button,
    dialog: ConfirmDialog,
    kind: TunnelKind,
    fallback: bool,
    /// Name of the tunnel being edited; `None` while creating.
    origin: Option<String>,
    error: String,

    /// ≤ 0; content shift applied by `layout`.
    scroll: i32,
    drag_start_y: i32,
    last_drag_y: i32,
    dragging: bool,
    /// Down landed somewhere drags may start from.
    drag_armed: bool,
    /// Selector pressed on Down, clicked on Up over the same protocol.
    proto_pressed: Option<usize>,
    error_y: i32,
}

impl Default for TunnelEditPage {
    fn default() -> Self {
        Self::new()
    }
}

impl TunnelEditPage {
    pub fn new() -> Self {
        let field = |hint: &str| InputField::new(Rect::new(LEFT, 0, WIDTH, FIELD_H)).placeholder(hint);
        let mut page = Self {
            nav_bar: NavBar::new("Tunnel", true),
            fields: [
                field("Tunnel name"),
                field("Local IP"),
                field("Local port"),
                field("Remote port"),
                field("Domain (e.g. cam.example.net)").max_len(63),
            ],
            keyboard: super::keyboard(),
            save: Button::new(Rect::new(LEFT, 0, BUTTON_W, BUTTON_H), "Save").radius(25),
            delete: Button::new(Rect::new(LEFT + WIDTH - BUTTON_W, 0, BUTTON_W, BUTTON_H), "Delete")
                .style(ButtonStyle::Danger)
                .radius(25),
            dialog: ConfirmDialog::new("Delete tunnel", "Delete"),
            kind: TunnelKind::Tcp,
            fallback: true,
            origin: None,
            error: String::new(),
            scroll: 0,
            drag_start_y: 0,
            last_drag_y: 0,
            dragging: false,
            drag_armed: false,
            proto_pressed: None,
            error_y: 0,
        };
        page.begin_create();
        page
    }

    // ── state ───────────────────────────────────────────────────────────────

    fn begin_create(&mut self) {
        self.origin = None;
        self.kind = TunnelKind::Tcp;
        self.fallback = true;
        for f in &mut self.fields {
            f.set_text("");
        }
        self.fields[LOCAL_IP].set_text(DEFAULT_LOCAL_IP);
        self.nav_bar.set_title("New tunnel");
        self.delete.set_enabled(false);
        self.error.clear();
        self.scroll = 0;
    }

    fn begin_edit(&mut self, t: Tunnel) {
        self.kind = t.kind;
        self.fallback = t.fallback_enabled;
        self.fields[NAME].set_text(t.name.as_str());
        self.fields[LOCAL_IP].set_text(t.local_ip);
        self.fields[LOCAL_PORT].set_text(t.local_port.to_string());
        let remote = if t.remote_port == 0 { String::new() } else { t.remote_port.to_string() };
        self.fields[REMOTE_PORT].set_text(remote);
        self.fields[DOMAIN].set_text(t.domain);
        self.nav_bar.set_title("Edit tunnel");
        self.delete.set_enabled(true);
        self.origin = Some(t.name);
        self.error.clear();
        self.scroll = 0;
    }

    fn is_active(&self, i: usize) -> bool {
        field_active(self.kind, i)
    }

    fn select_kind(&mut self, kind: TunnelKind) {
        if kind == self.kind {
            return;
        }
        tracing::debug!("tunnel: protocol {} → {}", self.kind.as_str(), kind.as_str());
        self.kind = kind;
        self.layout();
    }

    // ── geometry ────────────────────────────────────────────────────────────

    /// Bottom edge (relative) of the last input row.
    fn rel_inputs_bottom(&self) -> i32 {
        if self.kind.is_web() {
            REL_TOGGLE + TOGGLE_H
        } else {
            REL_FIELDS[REMOTE_PORT] + FIELD_H
        }
    }

    fn rel_error(&self) -> i32 {
        self.rel_inputs_bottom() + 12
    }

    fn rel_buttons(&self) -> i32 {
        let err_h = if self.error.is_empty() { 0 } else { 22 };
        self.rel_error() + err_h + 10
    }

    fn content_height(&self) -> i32 {
        self.rel_buttons() + BUTTON_H + 16
    }

    fn visible_bottom(&self) -> i32 {
        if self.keyboard.is_visible() {
            self.keyboard.rect().y
        } else {
            LOGICAL_H
        }
    }

    fn clamp_scroll(&mut self) {
        let visible = self.visible_bottom() - NAVBAR_HEIGHT;
        let min = (visible - self.content_height()).min(0);
        self.scroll = self.scroll.clamp(min, 0);
    }

    fn base(&self) -> i32 {
        NAVBAR_HEIGHT + self.scroll
    }

    fn layout(&mut self) {
        self.clamp_scroll();
        let base = self.base();
        for (f, rel) in self.fields.iter_mut().zip(REL_FIELDS) {
            f.rect.y = base + rel;
        }
        self.error_y = base + self.rel_error();
        let by = base + self.rel_buttons();
        self.save.rect.y = by;
        self.delete.rect.y = by;
    }

    fn proto_rect(&self, i: usize) -> Rect {
        let n = TunnelKind::ALL.len() as i32;
        let w = (WIDTH - PROTO_GAP * (n - 1)) / n;
        Rect::new(LEFT + i as i32 * (w + PROTO_GAP), self.base() + REL_PROTO, w, PROTO_H)
    }

    fn toggle_rect(&self) -> Rect {
        Rect::new(LEFT, self.base() + REL_TOGGLE, WIDTH, TOGGLE_H)
    }

    /// Scroll so field `i` clears the keyboard and the nav bar.
    fn reveal(&mut self, i: usize) {
        let shift = super::reveal_shift(self.fields[i].rect, NAVBAR_HEIGHT, self.visible_bottom());
        self.scroll += shift;
        self.layout();
    }

    // ── actions ─────────────────────────────────────────────────────────────

    fn text(&self, i: usize) -> &str {
        self.fields[i].text().trim()
    }

    /// Build the tunnel from the form, or the first validation message.
    fn collect(&self) -> Result<Tunnel, String> {
        let name = self.text(NAME);
        if name.is_empty() {
            return Err("Tunnel name cannot be empty".into());
        }
        let local_ip = self.text(LOCAL_IP);
        if local_ip.is_empty() {
            return Err("Local IP cannot be empty".into());
        }
        let local_port = parse_port(self.text(LOCAL_PORT)).ok_or("Local port must be 1-65535")?;

        let mut t = Tunnel {
            name: name.to_string(),
            kind: self.kind,
            local_ip: local_ip.to_string(),
            local_port,
            ..Default::default()
        };
        if self.kind.is_web() {
            t.domain = self.text(DOMAIN).to_string();
            t.fallback_enabled = self.fallback;
        } else {
            t.remote_port = parse_port(self.text(REMOTE_PORT)).ok_or("Remote port must be 1-65535")?;
        }
        Ok(t)
    }

    fn submit(&mut self, cx: &mut PageCx) {
        self.error.clear();
        let result = self.collect().and_then(|t| match &self.origin {
            Some(old) => cx.services.update_tunnel(old, t),
            None => cx.services.add_tunnel(t),
        });
        match result {
            Ok(()) => cx.back(),
            Err(e) => {
                tracing::warn!("tunnel: save failed: {e}");
                self.error = e;
            }
        }
        self.layout();
    }

    fn remove(&mut self, cx: &mut PageCx) {
        let Some(name) = self.origin.clone() else {
            return;
        };
        self.error.clear();
        match cx.services.delete_tunnel(&name) {
            Ok(()) => cx.back(),
            Err(e) => self.error = e,
        }
        self.layout();
    }

    // ── touch ───────────────────────────────────────────────────────────────

    /// Content drag. Returns true while the gesture belongs to the scroller.
    fn track_drag(&mut self, ev: &TouchEvent) -> bool {
        match ev.kind {
            TouchKind::Down => {
                self.dragging = false;
                self.drag_armed = ev.y >= NAVBAR_HEIGHT && ev.y < self.visible_bottom();
                self.drag_start_y = ev.y;
                self.last_drag_y = ev.y;
                false
            }
            TouchKind::Move if self.drag_armed => {
                let dy = ev.y - self.last_drag_y;
                if !self.dragging && (ev.y - self.drag_start_y).abs() > DRAG_THRESHOLD {
                    self.dragging = true;
                    self.proto_pressed = None;
                }
                self.last_drag_y = ev.y;
                if self.dragging {
                    self.scroll += dy;
                    self.layout();
                }
                self.dragging
            }
            TouchKind::Up if self.dragging => {
                self.dragging = false;
                self.drag_armed = false;
                true
            }
            _ => false,
        }
    }

    fn handle_proto(&mut self, ev: &TouchEvent) -> bool {
        let hit = (0..TunnelKind::ALL.len()).find(|&i| self.proto_rect(i).contains(ev.x, ev.y));
        match (ev.kind, hit) {
            (TouchKind::Down, Some(i)) => {
                self.proto_pressed = Some(i);
                true
            }
            (TouchKind::Up, Some(i)) => {
                if self.proto_pressed.take() == Some(i) {
                    self.select_kind(TunnelKind::ALL[i]);
                }
                true
            }
            (TouchKind::Move, Some(_)) => true,
            (TouchKind::Up, None) => {
                self.proto_pressed = None;
                false
            }
            _ => false,
        }
    }

    // ── drawing ─────────────────────────────────────────────────────────────

    fn render_selector(&self, p: &mut Painter) {
        let label_y = self.base() + REL_PROTO_LABEL;
        p.text("Protocol", LEFT, label_y, theme::TEXT_SECONDARY, 14.0, FontWeight::Regular);
        for (i, kind) in TunnelKind::ALL.iter().enumerate() {
            let r = self.proto_rect(i);
            let (bg, fg) = if *kind == self.kind {
                (theme::BRAND_BLUE, theme::BACKGROUND)
            } else {
                (theme::PRESSED, theme::TEXT_PRIMARY)
            };
            p.rounded_rect(r.x, r.y, r.w, r.h, 10, bg);
            p.text_centered(&kind.as_str().to_uppercase(), r, fg, 14.0, FontWeight::Medium);
        }
    }

    fn render_toggle(&self, p: &mut Painter) {
        let r = self.toggle_rect();
        let top = text_top_for_center(r.y, r.h, 16.0);
        p.text("Fallback page when offline", r.x, top, theme::TEXT_PRIMARY, 16.0, FontWeight::Regular);

        let (pw, ph) = (48, 26);
        let px = r.right() - pw;
        let py = r.y + (r.h - ph) / 2;
        let track = if self.fallback { theme::SUCCESS_GREEN } else { theme::SEPARATOR };
        p.rounded_rect(px, py, pw, ph, ph / 2, track);
        let knob_x = if self.fallback { px + pw - ph / 2 } else { px + ph / 2 };
        p.circle_aa(knob_x, py + ph / 2, ph / 2 - 3, theme::BACKGROUND);
    }
}

fn field_active(kind: TunnelKind, i: usize) -> bool {
    match i {
        REMOTE_PORT => !kind.is_web(),
        DOMAIN => kind.is_web(),
        _ => true,
    }
}

fn parse_port(s: &str) -> Option<u16> {
    s.parse::<u16>().ok().filter(|&p| p != 0)
}

impl Page for TunnelEditPage {
    fn name(&self) -> &str {
        super::TUNNEL_EDIT
    }

    fn render(&self, p: &mut Painter) {
        super::paint_background(p);
        self.render_selector(p);
        for (i, f) in self.fields.iter().enumerate() {
            if self.is_active(i) {
                f.render(p);
            }
        }
        if self.kind.is_web() {
            self.render_toggle(p);
        }
        if !self.error.is_empty() {
            p.text(&self.error, LEFT, self.error_y, theme::ERROR_RED, 14.0, FontWeight::Regular);
        }
        self.save.render(p);
        self.delete.render(p);

        // drawn last so scrolled content slides under it
        self.nav_bar.render(p);
        self.keyboard.render(p);
        self.dialog.render(p);
    }

    fn handle_touch(&mut self, ev: &TouchEvent, cx: &mut PageCx) -> bool {
        match self.dialog.handle_touch(ev) {
            DialogResponse::Confirmed => {
                self.remove(cx);
                return true;
            }
            DialogResponse::Cancelled | DialogResponse::Consumed => return true,
            DialogResponse::Ignored => {}
        }

        // a drag keeps its events even when it crosses the nav bar
        let on_keyboard = self.keyboard.is_visible() && self.keyboard.rect().contains(ev.x, ev.y);
        if !on_keyboard && self.track_drag(ev) {
            return true;
        }

        if !self.keyboard.is_visible() {
            match self.nav_bar.handle_touch(ev) {
                NavBarResponse::Back => {
                    cx.back();
                    return true;
                }
                NavBarResponse::Consumed => return true,
                NavBarResponse::Ignored => {}
            }
        }

        let kind = self.kind;
        let was_visible = self.keyboard.is_visible();
        match route_form_touch(ev, &mut self.keyboard, &mut self.fields, |i| field_active(kind, i)) {
            FormTouch::Focused(i) => {
                self.reveal(i);
                return true;
            }
            FormTouch::Entered => {
                self.layout();
                return true;
            }
            FormTouch::Handled => {
                if was_visible && !self.keyboard.is_visible() {
                    self.layout();
                }
                return true;
            }
            FormTouch::Unhandled => {}
        }

        if self.handle_proto(ev) {
            return true;
        }
        if self.kind.is_web() && self.toggle_rect().contains(ev.x, ev.y) {
            if ev.kind == TouchKind::Up {
                self.fallback = !self.fallback;
            }
            return true;
        }
        if self.save.handle_touch(ev) {
            self.submit(cx);
            return true;
        }
        if self.delete.handle_touch(ev) {
            if let Some(name) = &self.origin {
                self.dialog.show(format!("Delete tunnel \"{name}\"?"));
            }
            return true;
        }
        self.save.contains(ev.x, ev.y) || self.delete.contains(ev.x, ev.y)
    }

    fn tick(&mut self, _delta_ms: u64, _cx: &mut PageCx) {
        for f in &mut self.fields {
            f.tick();
        }
    }

    fn on_enter(&mut self, _cx: &mut PageCx) {
        self.keyboard.hide(&mut self.fields);
        self.dialog.hide();
        self.dragging = false;
        self.drag_armed = false;
        self.proto_pressed = None;
        self.layout();
    }

    fn accept(&mut self, intent: Intent) {
        match intent {
            Intent::EditTunnel(t) => self.begin_edit(t),
            Intent::NewTunnel => self.begin_create(),
            Intent::WifiTarget(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::NavRequest;
    use crate::pages::testing;
    use crate::services::MemoryServices;

    fn ssh() -> Tunnel {
        Tunnel {
            name: "ssh".into(),
            kind: TunnelKind::Tcp,
            local_ip: "127.0.0.1".into(),
            local_port: 22,
            remote_port: 6022,
            ..Default::default()
        }
    }

    fn open(intent: Intent, svc: &mut MemoryServices) -> TunnelEditPage {
        let mut page = TunnelEditPage::new();
        page.accept(intent);
        testing::enter(&mut page, svc);
        page
    }

    fn tap_rect(page: &mut TunnelEditPage, svc: &mut MemoryServices, r: Rect) -> Vec<NavRequest> {
        let (x, y) = r.center();
        testing::tap(page, svc, x, y).1
    }

    #[test]
    fn new_tunnel_defaults() {
        let mut svc = MemoryServices::default();
        let page = open(Intent::NewTunnel, &mut svc);
        assert_eq!(page.kind, TunnelKind::Tcp);
        assert_eq!(page.fields[LOCAL_IP].text(), "127.0.0.1");
        assert!(page.origin.is_none());
        assert!(!page.delete.is_enabled());
    }

    #[test]
    fn edit_prefills_and_updates_by_origin_name() {
        let mut svc = MemoryServices {
            tunnels: vec![ssh()],
            ..Default::default()
        };
        let mut page = open(Intent::EditTunnel(ssh()), &mut svc);
        assert_eq!(page.fields[REMOTE_PORT].text(), "6022");
        page.fields[NAME].set_text("ssh2");

        let save = page.save.rect;
        let reqs = tap_rect(&mut page, &mut svc, save);
        assert_eq!(reqs, vec![NavRequest::Back]);
        assert!(svc.calls.contains(&"update_tunnel ssh ssh2".to_string()));
        assert_eq!(svc.tunnels[0].name, "ssh2");
    }

    #[test]
    fn validation_messages_stay_on_page() {
        let mut svc = MemoryServices::default();
        let mut page = open(Intent::NewTunnel, &mut svc);
        let save = page.save.rect;
        assert!(tap_rect(&mut page, &mut svc, save).is_empty());
        assert_eq!(page.error, "Tunnel name cannot be empty");

        page.fields[NAME].set_text("db");
        page.fields[LOCAL_PORT].set_text("70000");
        let save = page.save.rect;
        tap_rect(&mut page, &mut svc, save);
        assert_eq!(page.error, "Local port must be 1-65535");

        page.fields[LOCAL_PORT].set_text("5432");
        let save = page.save.rect;
        tap_rect(&mut page, &mut svc, save);
        assert_eq!(page.error, "Remote port must be 1-65535");
        assert!(svc.calls.is_empty());
    }

    #[test]
    fn web_protocol_swaps_remote_port_for_domain() {
        let mut svc = MemoryServices::default();
        let mut page = open(Intent::EditTunnel(ssh()), &mut svc);
        let https = page.proto_rect(3);
        tap_rect(&mut page, &mut svc, https);
        assert_eq!(page.kind, TunnelKind::Https);
        assert!(!page.is_active(REMOTE_PORT));
        assert!(page.is_active(DOMAIN));

        // remote port survives a round trip through a web protocol
        let tcp = page.proto_rect(0);
        tap_rect(&mut page, &mut svc, tcp);
        assert_eq!(page.fields[REMOTE_PORT].text(), "6022");
    }

    #[test]
    fn web_tunnel_saves_domain_and_fallback() {
        let mut svc = MemoryServices::default();
        let mut page = open(Intent::NewTunnel, &mut svc);
        let http = page.proto_rect(2);
        tap_rect(&mut page, &mut svc, http);
        page.fields[NAME].set_text("cam");
        page.fields[LOCAL_PORT].set_text("8080");
        page.fields[DOMAIN].set_text("cam.example.net");

        let toggle = page.toggle_rect();
        tap_rect(&mut page, &mut svc, toggle);
        assert!(!page.fallback);

        let save = page.save.rect;
        assert_eq!(tap_rect(&mut page, &mut svc, save), vec![NavRequest::Back]);
        let t = &svc.tunnels[0];
        assert_eq!(t.kind, TunnelKind::Http);
        assert_eq!(t.domain, "cam.example.net");
        assert_eq!(t.remote_port, 0);
        assert!(!t.fallback_enabled);
    }

    #[test]
    fn delete_asks_first() {
        let mut svc = MemoryServices {
            tunnels: vec![ssh()],
            ..Default::default()
        };
        let mut page = open(Intent::EditTunnel(ssh()), &mut svc);
        let delete = page.delete.rect;
        assert!(tap_rect(&mut page, &mut svc, delete).is_empty());
        assert!(page.dialog.is_visible());

        // outside the dialog cancels
        assert!(tap_rect(&mut page, &mut svc, Rect::new(0, 400, 40, 40)).is_empty());
        assert!(!svc.calls.iter().any(|c| c.starts_with("delete_tunnel")));

        let delete = page.delete.rect;
        tap_rect(&mut page, &mut svc, delete);
        // confirm is the right-hand dialog button
        let reqs = tap_rect(&mut page, &mut svc, Rect::new(250, 280, 170, 40));
        assert_eq!(reqs, vec![NavRequest::Back]);
        assert!(svc.tunnels.is_empty());
    }

    #[test]
    fn focusing_a_low_field_scrolls_it_into_view() {
        let mut svc = MemoryServices::default();
        let mut page = open(Intent::NewTunnel, &mut svc);
        let remote = page.fields[REMOTE_PORT].rect;
        tap_rect(&mut page, &mut svc, remote);
        assert_eq!(page.keyboard.target(), Some(REMOTE_PORT));
        assert!(page.scroll < 0);
        assert!(page.fields[REMOTE_PORT].rect.bottom() <= page.keyboard.rect().y - 10);

        // dismissing the keyboard clamps the scroll back
        tap_rect(&mut page, &mut svc, Rect::new(200, 64, 40, 4));
        assert!(!page.keyboard.is_visible());
        assert_eq!(page.scroll, 0);
    }

    #[test]
    fn drag_scrolls_tall_form_without_clicking() {
        let mut svc = MemoryServices::default();
        let mut page = open(Intent::NewTunnel, &mut svc);
        let http = page.proto_rect(2);
        tap_rect(&mut page, &mut svc, http);
        let save = page.save.rect;
        tap_rect(&mut page, &mut svc, save);
        assert!(!page.error.is_empty());
        let max = page.content_height() - (LOGICAL_H - NAVBAR_HEIGHT);
        assert!(max > 0);

        let mut reqs = Vec::new();
        let mut cx = PageCx::new(&mut svc, &mut reqs);
        let (x, y) = page.proto_rect(0).center();
        page.handle_touch(&TouchEvent::down(x, y), &mut cx);
        page.handle_touch(&TouchEvent::moved(x, y - 20), &mut cx);
        page.handle_touch(&TouchEvent::moved(x, y - 200), &mut cx);
        page.handle_touch(&TouchEvent::up(x, y - 200), &mut cx);
        assert_eq!(page.scroll, -max);
        assert_eq!(page.kind, TunnelKind::Http);
    }
}
