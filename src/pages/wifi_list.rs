// pages/wifi_list.rs — scan results; tapping a network opens the join form

use crate::nav::{Intent, Page, PageCx};
use crate::pixelui::widgets::{
    ListIcon, ListItem, ListResponse, ListView, NavBar, NavBarResponse,
};
use crate::pixelui::{theme, Painter};
use crate::services::WifiNetwork;
use crate::touch::TouchEvent;

pub struct WifiListPage {
    nav_bar: NavBar,
    list: ListView,
    /// SSID per row; empty when the rows are status messages.
    ssids: Vec<String>,
}

impl Default for WifiListPage {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiListPage {
    pub fn new() -> Self {
        Self {
            nav_bar: NavBar::new("Choose WLAN", true),
            list: ListView::new(super::content_rect()),
            ssids: Vec::new(),
        }
    }

    fn rescan(&mut self, cx: &mut PageCx) {
        self.list.clear();
        self.ssids.clear();

        let nets = match cx.services.scan_wifi() {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!("wifi: scan failed: {e}");
                self.list.push(ListItem::new("WiFi scan failed").subtitle(e));
                return;
            }
        };
        if nets.is_empty() {
            self.list.push(
                ListItem::new("No networks found").subtitle("Make sure WLAN is enabled"),
            );
            return;
        }
        tracing::debug!("wifi: {} networks", nets.len());
        for n in nets {
            self.list.push(row(&n));
            self.ssids.push(n.ssid);
        }
    }
}

fn row(n: &WifiNetwork) -> ListItem {
    let dot = if n.in_use {
        theme::SUCCESS_GREEN
    } else {
        signal_color(n.signal)
    };
    let item = ListItem::new(n.ssid.clone())
        .subtitle(format!("Signal {}% · {}", n.signal, n.security))
        .icon(ListIcon::Dot(dot))
        .arrow();
    if n.in_use {
        item.value("Connected")
    } else {
        item
    }
}

fn signal_color(signal: u8) -> crate::pixelui::Color {
    match signal {
        70.. => theme::BRAND_BLUE,
        40..=69 => theme::WARNING_ORANGE,
        _ => theme::TEXT_LIGHT,
    }
}

impl Page for WifiListPage {
    fn name(&self) -> &str {
        super::WIFI_LIST
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
            ListResponse::Clicked(i) => {
                if let Some(ssid) = self.ssids.get(i) {
                    cx.go_with(super::WIFI_CONNECT, Intent::WifiTarget(ssid.clone()));
                }
                true
            }
            r => r.handled(),
        }
    }

    fn on_enter(&mut self, cx: &mut PageCx) {
        self.rescan(cx);
    }
}
