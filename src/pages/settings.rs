// pages/settings.rs — settings menu

use crate::nav::{Page, PageCx};
use crate::pixelui::widgets::{ListItem, ListResponse, ListView, NavBar, NavBarResponse};
use crate::pixelui::Painter;
use crate::touch::TouchEvent;

const ROW_NETWORK: usize = 0;
const ROW_TUNNELS: usize = 1;

pub struct SettingsPage {
    nav_bar: NavBar,
    list: ListView,
}

impl Default for SettingsPage {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsPage {
    pub fn new() -> Self {
        let mut list = ListView::new(super::content_rect());
        list.push(
            ListItem::new("Network")
                .subtitle("Ethernet and WLAN")
                .arrow(),
        );
        list.push(
            ListItem::new("Tunnels")
                .subtitle("View and edit forwarding tunnels")
                .arrow(),
        );
        list.push(
            ListItem::new("About")
                .subtitle(env!("CARGO_PKG_NAME"))
                .value(concat!("v", env!("CARGO_PKG_VERSION"))),
        );
        Self {
            nav_bar: NavBar::new("Settings", true),
            list,
        }
    }
}

impl Page for SettingsPage {
    fn name(&self) -> &str {
        super::SETTINGS
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
            ListResponse::Clicked(ROW_NETWORK) => cx.go(super::NETWORK),
            ListResponse::Clicked(ROW_TUNNELS) => cx.go(super::TUNNEL_LIST),
            r => return r.handled(),
        }
        true
    }
}
