// pages/wifi_connect.rs — password entry for one SSID

use crate::font::FontWeight;
use crate::nav::{Intent, Page, PageCx};
use crate::pixelui::widgets::{
    Button, ButtonStyle, InputField, NavBar, NavBarResponse, VirtualKeyboard,
};
use crate::pixelui::{theme, Painter, Rect};
use crate::touch::{TouchEvent, TouchKind};

use super::{route_form_touch, FormTouch};

const PASSWORD_MAX: usize = 63;
const FIELD: Rect = Rect::new(24, 110, 432, 50);
const TOGGLE: Rect = Rect::new(320, 166, 136, 24);
const ERROR_Y: i32 = 196;

pub struct WifiConnectPage {
    nav_bar: NavBar,
    ssid: String,
    fields: [InputField; 1],
    keyboard: VirtualKeyboard,
    join: Button,
    forget: Button,
    saved: bool,
    error: String,
    /// SSID handed over by the list, applied on enter.
    pending: Option<String>,
}

impl Default for WifiConnectPage {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiConnectPage {
    pub fn new() -> Self {
        Self {
            nav_bar: NavBar::new("Join network", true),
            ssid: String::new(),
            fields: [InputField::new(FIELD)
                .placeholder("Password")
                .password(true)
                .max_len(PASSWORD_MAX)],
            keyboard: super::keyboard(),
            join: Button::new(Rect::new(24, 220, 432, 50), "Join").radius(25),
            forget: Button::new(Rect::new(24, 280, 432, 50), "Forget this network")
                .style(ButtonStyle::Danger)
                .radius(25),
            saved: false,
            error: String::new(),
            pending: None,
        }
    }

    fn password(&self) -> &InputField {
        &self.fields[0]
    }

    /// Reset the form for `ssid`, prefilling a saved password.
    fn target(&mut self, ssid: String, cx: &PageCx) {
        let saved = cx.services.saved_wifi(&ssid);
        self.saved = saved.is_some();
        self.fields[0].set_text(saved.unwrap_or_default());
        self.fields[0].set_password(true);
        self.ssid = ssid;
        self.error.clear();
    }

    fn connect(&mut self, cx: &mut PageCx) {
        self.error.clear();
        tracing::info!("wifi: joining {}", self.ssid);
        match cx.services.connect_wifi(&self.ssid, self.fields[0].text()) {
            Ok(()) => cx.back(),
            Err(e) => self.error = e,
        }
    }

    fn forget(&mut self, cx: &mut PageCx) {
        self.error.clear();
        match cx.services.forget_wifi(&self.ssid) {
            Ok(()) => {
                self.fields[0].set_text("");
                self.saved = false;
                cx.back();
            }
            Err(e) => self.error = e,
        }
    }
}

impl Page for WifiConnectPage {
    fn name(&self) -> &str {
        super::WIFI_CONNECT
    }

    fn render(&self, p: &mut Painter) {
        super::paint_background(p);
        let title = format!("Connecting to: {}", self.ssid);
        p.text(&title, 24, 76, theme::TEXT_PRIMARY, 18.0, FontWeight::Medium);
        self.password().render(p);

        if !self.password().text().is_empty() {
            let label = if self.password().is_password() { "Show" } else { "Hide" };
            let w = p.measure_text(label, 14.0, FontWeight::Regular);
            p.text(label, TOGGLE.right() - w, TOGGLE.y + 4, theme::TEXT_SECONDARY, 14.0, FontWeight::Regular);
        }
        if !self.error.is_empty() {
            p.text(&self.error, 24, ERROR_Y, theme::ERROR_RED, 14.0, FontWeight::Regular);
        }

        self.join.render(p);
        if self.saved {
            self.forget.render(p);
        }
        self.nav_bar.render(p);
        self.keyboard.render(p);
    }

    fn handle_touch(&mut self, ev: &TouchEvent, cx: &mut PageCx) -> bool {
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

        match route_form_touch(ev, &mut self.keyboard, &mut self.fields, |_| true) {
            FormTouch::Entered => {
                self.connect(cx);
                return true;
            }
            FormTouch::Handled | FormTouch::Focused(_) => return true,
            FormTouch::Unhandled => {}
        }

        if !self.password().text().is_empty() && TOGGLE.contains(ev.x, ev.y) {
            if ev.kind == TouchKind::Up {
                let masked = self.password().is_password();
                self.fields[0].set_password(!masked);
            }
            return true;
        }
        if self.join.handle_touch(ev) {
            self.connect(cx);
            return true;
        }
        if self.saved && self.forget.handle_touch(ev) {
            self.forget(cx);
            return true;
        }
        self.join.contains(ev.x, ev.y) || (self.saved && self.forget.contains(ev.x, ev.y))
    }

    fn on_exit(&mut self) {
        self.fields[0].set_text("");
    }

    fn tick(&mut self, _delta_ms: u64, _cx: &mut PageCx) {
        self.fields[0].tick();
    }

    fn on_enter(&mut self, cx: &mut PageCx) {
        self.keyboard.hide(&mut self.fields);
        let ssid = self.pending.take().unwrap_or_else(|| self.ssid.clone());
        self.target(ssid, cx);
    }

    fn accept(&mut self, intent: Intent) {
        if let Intent::WifiTarget(ssid) = intent {
            self.pending = Some(ssid);
        }
    }
}
