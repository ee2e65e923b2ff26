// pages/tunnel_list.rs — configured tunnels plus a "New tunnel" entry

use crate::nav::{Intent, Page, PageCx};
use crate::pixelui::widgets::{
    ListIcon, ListItem, ListResponse, ListView, NavBar, NavBarResponse,
};
use crate::pixelui::{theme, Painter};
use crate::services::Tunnel;
use crate::touch::TouchEvent;

const ROW_NEW: usize = 0;

pub struct TunnelListPage {
    nav_bar: NavBar,
    list: ListView,
    /// Tunnel behind row `i + 1`.
    tunnels: Vec<Tunnel>,
}

impl Default for TunnelListPage {
    fn default() -> Self {
        Self::new()
    }
}

impl TunnelListPage {
    pub fn new() -> Self {
        Self {
            nav_bar: NavBar::new("Tunnels", true),
            list: ListView::new(super::content_rect()),
            tunnels: Vec::new(),
        }
    }

    fn refresh(&mut self, cx: &mut PageCx) {
        self.list.clear();
        self.tunnels.clear();
        self.list.push(
            ListItem::new("New tunnel")
                .subtitle("Expose a local service")
                .icon(ListIcon::Plus)
                .arrow(),
        );

        match cx.services.tunnels() {
            Ok(ts) if ts.is_empty() => {
                self.list.push(ListItem::new("No tunnels configured"));
            }
            Ok(ts) => {
                let online = cx.services.tunnels_connected();
                for t in &ts {
                    self.list.push(row(t, online));
                }
                self.tunnels = ts;
            }
            Err(e) => {
                tracing::warn!("tunnels: load failed: {e}");
                self.list.push(ListItem::new("Failed to load tunnels").subtitle(e));
            }
        }
    }
}

fn row(t: &Tunnel, online: bool) -> ListItem {
    let remote = if t.kind.is_web() {
        format!("→ {}", t.domain)
    } else {
        format!("→ :{}", t.remote_port)
    };
    let state = if online { "online" } else { "offline" };
    let dot = if online { theme::STATUS_GREEN } else { theme::TEXT_LIGHT };
    ListItem::new(t.name.clone())
        .subtitle(format!(
            "{} · {} · {}:{} {}",
            t.kind.as_str().to_uppercase(),
            state,
            t.local_ip,
            t.local_port,
            remote
        ))
        .icon(ListIcon::Dot(dot))
        .arrow()
}

impl Page for TunnelListPage {
    fn name(&self) -> &str {
        super::TUNNEL_LIST
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
            ListResponse::Clicked(ROW_NEW) => {
                cx.go_with(super::TUNNEL_EDIT, Intent::NewTunnel);
                true
            }
            ListResponse::Clicked(i) => {
                if let Some(t) = self.tunnels.get(i - 1) {
                    cx.go_with(super::TUNNEL_EDIT, Intent::EditTunnel(t.clone()));
                }
                true
            }
            r => r.handled(),
        }
    }

    fn on_enter(&mut self, cx: &mut PageCx) {
        self.refresh(cx);
    }
}
