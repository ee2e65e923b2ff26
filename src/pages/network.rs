// pages/network.rs — Ethernet / WLAN overview

use crate::nav::{Page, PageCx};
use crate::pixelui::widgets::{ListItem, ListResponse, ListView, NavBar, NavBarResponse};
use crate::pixelui::Painter;
use crate::services::{is_wireless, NetworkStatus};
use crate::touch::TouchEvent;

const ROW_ETHERNET: usize = 0;
const ROW_WLAN: usize = 1;

pub struct NetworkPage {
    nav_bar: NavBar,
    list: ListView,
}

impl Default for NetworkPage {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkPage {
    pub fn new() -> Self {
        let mut page = Self {
            nav_bar: NavBar::new("Network", true),
            list: ListView::new(super::content_rect()),
        };
        page.list.set_items(rows(None));
        page
    }
}

/// The current interface decides which row shows as connected.
fn rows(status: Option<&NetworkStatus>) -> Vec<ListItem> {
    let mut eth = ("Not connected".to_string(), String::new());
    let mut wlan = ("Not connected".to_string(), String::new());

    if let Some(st) = status.filter(|s| s.is_connected()) {
        let slot = if is_wireless(&st.current_interface) {
            &mut wlan
        } else {
            &mut eth
        };
        *slot = (format!("Connected ({})", st.current_interface), st.ip.clone());
    }
    if let Some(st) = status.filter(|s| !is_wireless(&s.current_interface)) {
        match st.ip_mode.as_str() {
            "static" => eth.0.push_str(" · static"),
            "" => {}
            _ => eth.0.push_str(" · DHCP"),
        }
    }

    vec![
        ListItem::new("Ethernet").subtitle(eth.0).value(eth.1).arrow(),
        ListItem::new("WLAN").subtitle(wlan.0).value(wlan.1).arrow(),
    ]
}

impl Page for NetworkPage {
    fn name(&self) -> &str {
        super::NETWORK
    }

    fn render(&self, p: &mut Painter) {
        super::paint_background(p);
        self.list.render(p);
        self.nav_bar.render(p);
    }

    fn handle_touch(&mut self, ev: &TouchEvent, cx: &mut PageCx) -> bool {
        match self.nav_bar.handle_touch(ev) {
            NavBarResponse::Back => {
                cx.back();
                return true;
            }
            NavBarResponse::Consumed => return true,
            NavBarResponse::Ignored => {}
        }
        match self.list.handle_touch(ev) {
            ListResponse::Clicked(ROW_ETHERNET) => cx.go(super::ETHERNET),
            ListResponse::Clicked(ROW_WLAN) => cx.go(super::WIFI_LIST),
            r => return r.handled(),
        }
        true
    }

    fn on_enter(&mut self, cx: &mut PageCx) {
        let status = cx
            .services
            .network_status()
            .map_err(|e| tracing::warn!("network: status unavailable: {e}"))
            .ok();
        self.list.set_items(rows(status.as_ref()));
    }
}
