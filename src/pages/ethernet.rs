// pages/ethernet.rs — static IP / DHCP form for the wired interface

use crate::font::FontWeight;
use crate::nav::{Page, PageCx};
use crate::pixelui::widgets::{
    Button, ButtonStyle, InputField, NavBar, NavBarResponse, VirtualKeyboard, NAVBAR_HEIGHT,
};
use crate::pixelui::{theme, Painter, Rect};
use crate::services::is_wireless;
use crate::touch::TouchEvent;

use super::{route_form_touch, FormTouch};

const IP: usize = 0;
const MASK: usize = 1;
const GATEWAY: usize = 2;
const DNS: usize = 3;

const FIELD_X: i32 = 24;
const FIELD_W: i32 = 432;
const FIELD_H: i32 = 46;
const FIELD_TOPS: [i32; 4] = [96, 150, 204, 258];
const ERROR_Y: i32 = 314;
const DHCP_Y: i32 = 340;
const STATIC_Y: i32 = 404;
const BUTTON_H: i32 = 50;

const DEFAULT_IFACE: &str = "eth0";

pub struct EthernetPage {
    nav_bar: NavBar,
    fields: [InputField; 4],
    keyboard: VirtualKeyboard,
    dhcp: Button,
    apply: Button,
    iface: String,
    error: String,
    /// ≤ 0; raises the form while the keyboard covers the focused field.
    lift: i32,
}

impl Default for EthernetPage {
    fn default() -> Self {
        Self::new()
    }
}

impl EthernetPage {
    pub fn new() -> Self {
        let field = |i: usize, hint: &str| {
            InputField::new(Rect::new(FIELD_X, FIELD_TOPS[i], FIELD_W, FIELD_H)).placeholder(hint)
        };
        let mut page = Self {
            nav_bar: NavBar::new("Ethernet", true),
            fields: [
                field(IP, "IP address"),
                field(MASK, "Netmask (255.255.255.0 or /24)"),
                field(GATEWAY, "Gateway (optional)"),
                field(DNS, "DNS (e.g. 8.8.8.8)"),
            ],
            keyboard: super::keyboard(),
            dhcp: Button::new(Rect::new(FIELD_X, DHCP_Y, FIELD_W, BUTTON_H), "Use DHCP")
                .style(ButtonStyle::Secondary)
                .radius(25),
            apply: Button::new(Rect::new(FIELD_X, STATIC_Y, FIELD_W, BUTTON_H), "Apply static IP")
                .radius(25),
            iface: DEFAULT_IFACE.into(),
            error: String::new(),
            lift: 0,
        };
        page.layout();
        page
    }

    fn layout(&mut self) {
        for (f, top) in self.fields.iter_mut().zip(FIELD_TOPS) {
            f.rect.y = top + self.lift;
        }
        self.dhcp.rect.y = DHCP_Y + self.lift;
        self.apply.rect.y = STATIC_Y + self.lift;
    }

    fn set_lift(&mut self, focused: Option<usize>) {
        self.lift = match focused {
            Some(i) => {
                let base = Rect::new(FIELD_X, FIELD_TOPS[i], FIELD_W, FIELD_H);
                super::reveal_shift(base, NAVBAR_HEIGHT, self.keyboard.rect().y)
            }
            None => 0,
        };
        self.layout();
    }

    fn text(&self, i: usize) -> &str {
        self.fields[i].text().trim()
    }

    fn apply_static(&mut self, cx: &mut PageCx) {
        self.error.clear();
        let result = cx.services.apply_static_ip(
            &self.iface,
            self.text(IP),
            self.text(MASK),
            self.text(GATEWAY),
            self.text(DNS),
        );
        match result {
            Ok(()) => cx.back(),
            Err(e) => self.error = e,
        }
    }

    fn apply_dhcp(&mut self, cx: &mut PageCx) {
        self.error.clear();
        match cx.services.apply_dhcp(&self.iface, self.text(DNS)) {
            Ok(()) => cx.back(),
            Err(e) => self.error = e,
        }
    }
}

impl Page for EthernetPage {
    fn name(&self) -> &str {
        super::ETHERNET
    }

    fn render(&self, p: &mut Painter) {
        super::paint_background(p);
        let title = format!("IP settings ({})", self.iface);
        p.text(&title, FIELD_X, 72 + self.lift, theme::TEXT_SECONDARY, 14.0, FontWeight::Regular);

        for f in &self.fields {
            f.render(p);
        }
        if !self.error.is_empty() {
            p.text(&self.error, FIELD_X, ERROR_Y + self.lift, theme::ERROR_RED, 14.0, FontWeight::Regular);
        }
        self.dhcp.render(p);
        self.apply.render(p);

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
            FormTouch::Focused(i) => {
                self.set_lift(Some(i));
                return true;
            }
            FormTouch::Entered => {
                self.set_lift(None);
                return true;
            }
            FormTouch::Handled => {
                if !self.keyboard.is_visible() && self.lift != 0 {
                    self.set_lift(None);
                }
                return true;
            }
            FormTouch::Unhandled => {}
        }

        if self.dhcp.handle_touch(ev) {
            self.apply_dhcp(cx);
            return true;
        }
        if self.apply.handle_touch(ev) {
            self.apply_static(cx);
            return true;
        }
        self.dhcp.contains(ev.x, ev.y) || self.apply.contains(ev.x, ev.y)
    }

    fn tick(&mut self, _delta_ms: u64, _cx: &mut PageCx) {
        for f in &mut self.fields {
            f.tick();
        }
    }

    /// Prefill from the live status; a wireless uplink leaves the wired
    /// interface at its default name.
    fn on_enter(&mut self, cx: &mut PageCx) {
        self.error.clear();
        self.keyboard.hide(&mut self.fields);
        self.set_lift(None);
        self.iface = DEFAULT_IFACE.into();

        match cx.services.network_status() {
            Ok(st) => {
                if !st.current_interface.is_empty() && !is_wireless(&st.current_interface) {
                    self.iface = st.current_interface.clone();
                }
                for (i, v) in [(IP, st.ip), (MASK, st.netmask), (GATEWAY, st.gateway), (DNS, st.dns)] {
                    self.fields[i].set_text(v);
                }
            }
            Err(e) => tracing::warn!("ethernet: status unavailable: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::NavRequest;
    use crate::pages::testing;
    use crate::services::{MemoryServices, NetworkStatus};

    fn svc() -> MemoryServices {
        MemoryServices {
            status: NetworkStatus {
                current_interface: "end0".into(),
                ip: "10.0.0.5".into(),
                netmask: "255.255.255.0".into(),
                gateway: "10.0.0.1".into(),
                dns: "1.1.1.1".into(),
                status: "connected".into(),
                ip_mode: "dhcp".into(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn prefills_from_status() {
        let mut page = EthernetPage::new();
        let mut s = svc();
        testing::enter(&mut page, &mut s);
        assert_eq!(page.iface, "end0");
        assert_eq!(page.fields[IP].text(), "10.0.0.5");
        assert_eq!(page.fields[DNS].text(), "1.1.1.1");
    }

    #[test]
    fn wireless_uplink_keeps_default_iface() {
        let mut page = EthernetPage::new();
        let mut s = svc();
        s.status.current_interface = "wlan0".into();
        testing::enter(&mut page, &mut s);
        assert_eq!(page.iface, "eth0");
    }

    #[test]
    fn apply_static_goes_back() {
        let mut page = EthernetPage::new();
        let mut s = svc();
        testing::enter(&mut page, &mut s);
        let (handled, reqs) = testing::tap(&mut page, &mut s, 240, STATIC_Y + 20);
        assert!(handled);
        assert_eq!(reqs, vec![NavRequest::Back]);
        assert!(s
            .calls
            .contains(&"static end0 10.0.0.5 255.255.255.0 10.0.0.1 1.1.1.1".to_string()));
    }

    #[test]
    fn failure_is_shown_inline() {
        let mut page = EthernetPage::new();
        let mut s = svc();
        testing::enter(&mut page, &mut s);
        s.fail_with = Some("Invalid IP address".into());
        let (_, reqs) = testing::tap(&mut page, &mut s, 240, DHCP_Y + 20);
        assert!(reqs.is_empty());
        assert_eq!(page.error, "Invalid IP address");
    }

    #[test]
    fn focusing_low_field_lifts_form() {
        let mut page = EthernetPage::new();
        let mut s = svc();
        testing::enter(&mut page, &mut s);
        testing::tap(&mut page, &mut s, 100, FIELD_TOPS[DNS] + 20);
        assert!(page.keyboard.is_visible());
        assert_eq!(page.keyboard.target(), Some(DNS));
        assert!(page.fields[DNS].rect.bottom() <= page.keyboard.rect().y - 10);

        // the lifted IP field now sits under the nav bar: not hittable
        testing::tap(&mut page, &mut s, 240, 30);
        assert!(!page.keyboard.is_visible());
        assert_eq!(page.lift, 0);
        assert_eq!(page.fields[DNS].rect.y, FIELD_TOPS[DNS]);
    }
}
