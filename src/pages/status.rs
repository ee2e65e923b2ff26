// pages/status.rs — home screen: live rates, tunnel count, uptime
//
// Any tap opens settings. Service data is refreshed on enter and then once a
// second from `tick`; rendering only reads the cached snapshot.

use crate::font::FontWeight;
use crate::nav::{Page, PageCx};
use crate::pixelui::{theme, Color, GradientDir, Painter, LOGICAL_H, LOGICAL_W};
use crate::touch::{TouchEvent, TouchKind};

const REFRESH_MS: u64 = 1000;
const BLINK_PERIOD: u64 = 240;
const BLINK_FRAMES: u64 = 10;

const DOT_RING: Color = theme::SEPARATOR;
const SHADOW: Color = Color::rgb(148, 163, 184);

pub struct StatusPage {
    frame: u64,
    since_refresh_ms: u64,
    uptime_ms: u64,
    up_kbps: f64,
    down_kbps: f64,
    tunnel_count: usize,
    connected: bool,
}

impl Default for StatusPage {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusPage {
    pub fn new() -> Self {
        Self {
            frame: 0,
            since_refresh_ms: 0,
            uptime_ms: 0,
            up_kbps: 0.0,
            down_kbps: 0.0,
            tunnel_count: 0,
            connected: false,
        }
    }

    fn refresh(&mut self, cx: &mut PageCx) {
        let iface = match cx.services.network_status() {
            Ok(st) => {
                self.connected = st.is_connected();
                st.current_interface
            }
            Err(e) => {
                tracing::debug!("status: network status unavailable: {e}");
                self.connected = false;
                String::new()
            }
        };
        let (up, down) = cx.services.transfer_rate_kbps(&iface);
        self.up_kbps = up;
        self.down_kbps = down;
        self.tunnel_count = cx.services.tunnels().map(|t| t.len()).unwrap_or(0);
    }

    /// Vertical hover offset, breathing radius delta and blink flag.
    fn ball_pose(&self) -> (f64, i32, bool) {
        let t = self.frame as f64 * 0.08;
        let hover = t.sin() * 8.0;
        let breath = ((t * 0.5).sin() * 1.0).round() as i32;
        let blinking = self.frame % BLINK_PERIOD < BLINK_FRAMES;
        (hover, breath, blinking)
    }

    fn draw_top_bar(&self, p: &mut Painter) {
        p.text("Kiosk", 30, 22, theme::TEXT_PRIMARY, 22.0, FontWeight::Medium);
        let dot = if self.connected {
            theme::STATUS_GREEN
        } else {
            theme::TEXT_LIGHT
        };
        p.circle_aa(430, 30, 7, DOT_RING);
        p.circle_aa(430, 30, 6, dot);
    }

    fn draw_ball(&self, p: &mut Painter) {
        let (cx, base_y) = (LOGICAL_W / 2, 158);
        let (hover, breath, blinking) = self.ball_pose();
        let y = base_y + hover as i32;

        // Higher ball, smaller and fainter shadow.
        let lift = (hover + 8.0) / 16.0;
        let shadow_rx = 20 - (lift * 2.5) as i32;
        let shadow_a = (40.0 + (1.0 - lift) * 20.0) as u8;
        p.ellipse_aa(cx, base_y + 53, shadow_rx, 3, SHADOW.with_alpha(shadow_a));

        p.circle_aa(cx, y, 42 + breath, theme::BRAND_BLUE);
        p.circle_aa(cx, y + 12, 28, Color::rgba(255, 255, 255, 240));

        let eye_y = y - 8;
        for ex in [cx - 14, cx + 14] {
            if blinking {
                p.fill_rect(ex - 4, eye_y, 8, 2, theme::TEXT_PRIMARY);
            } else {
                p.circle_aa(ex, eye_y, 6, Color::WHITE);
                p.circle_aa(ex, eye_y, 3, theme::TEXT_PRIMARY);
            }
        }
        p.circle_aa(cx + 18, y - 22, 6, Color::rgba(255, 255, 255, 60));
    }

    fn draw_rates(&self, p: &mut Painter) {
        let top = 250;
        p.text("Transfer rate", 30, top, theme::TEXT_SECONDARY, 14.0, FontWeight::Regular);
        let sep = top + 14 + 8;
        p.fill_rect(30, sep, 420, 1, theme::SEPARATOR);

        let label_y = sep + 16;
        let value_y = label_y + 28;
        for (x, label, value, color) in [
            (30, "Upload", self.up_kbps, theme::BRAND_BLUE),
            (264, "Download", self.down_kbps, theme::SUCCESS_GREEN),
        ] {
            p.text(label, x, label_y, theme::TEXT_LIGHT, 12.0, FontWeight::Regular);
            let s = format!("{value:.1}");
            p.text(&s, x, value_y, color, 30.0, FontWeight::Medium);
            let w = p.measure_text(&s, 30.0, FontWeight::Medium);
            p.text("KB/s", x + w + 8, value_y + 12, theme::TEXT_LIGHT, 14.0, FontWeight::Regular);
        }
    }

    fn draw_stats(&self, p: &mut Painter) {
        let top = 350;
        p.fill_rect(LOGICAL_W / 2, top, 1, 60, theme::SEPARATOR);
        let (label_y, value_y) = (top + 14, top + 48);

        p.text("Tunnels", 30, label_y, theme::TEXT_SECONDARY, 13.0, FontWeight::Regular);
        let n = self.tunnel_count.to_string();
        p.text(&n, 30, value_y, theme::WARNING_ORANGE, 28.0, FontWeight::Medium);

        p.text("Uptime", 264, label_y, theme::TEXT_SECONDARY, 13.0, FontWeight::Regular);
        p.text(&format_uptime(self.uptime_ms), 264, value_y, theme::PURPLE, 28.0, FontWeight::Medium);
    }
}

/// `"Hh Mm"` from one hour on, `"Mm"` below.
pub fn format_uptime(ms: u64) -> String {
    let mins = ms / 60_000;
    let (h, m) = (mins / 60, mins % 60);
    if h > 0 {
        format!("{h}h {m}m")
    } else {
        format!("{m}m")
    }
}

impl Page for StatusPage {
    fn name(&self) -> &str {
        super::STATUS
    }

    fn render(&self, p: &mut Painter) {
        p.gradient(
            0,
            0,
            LOGICAL_W,
            LOGICAL_H,
            &[theme::BACKGROUND, theme::BACKGROUND_MID, theme::BACKGROUND_END],
            GradientDir::Vertical,
        );
        self.draw_top_bar(p);
        self.draw_ball(p);
        self.draw_rates(p);
        self.draw_stats(p);

        let tip = "Tap anywhere for settings";
        let w = p.measure_text(tip, 13.0, FontWeight::Regular);
        p.text(tip, (LOGICAL_W - w) / 2, 451, theme::TEXT_LIGHT, 13.0, FontWeight::Regular);
    }

    fn handle_touch(&mut self, ev: &TouchEvent, cx: &mut PageCx) -> bool {
        if ev.kind != TouchKind::Up {
            return false;
        }
        cx.go(super::SETTINGS);
        true
    }

    fn tick(&mut self, delta_ms: u64, cx: &mut PageCx) {
        self.frame = self.frame.wrapping_add(1);
        self.uptime_ms = self.uptime_ms.saturating_add(delta_ms);
        self.since_refresh_ms += delta_ms;
        if self.since_refresh_ms >= REFRESH_MS {
            self.since_refresh_ms = 0;
            self.refresh(cx);
        }
    }

    fn on_enter(&mut self, cx: &mut PageCx) {
        self.since_refresh_ms = 0;
        self.refresh(cx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::NavRequest;
    use crate::pages::testing;
    use crate::services::{MemoryServices, NetworkStatus, Tunnel};

    #[test]
    fn uptime_format() {
        assert_eq!(format_uptime(0), "0m");
        assert_eq!(format_uptime(59 * 60_000), "59m");
        assert_eq!(format_uptime(61 * 60_000), "1h 1m");
        assert_eq!(format_uptime(25 * 3_600_000 + 5 * 60_000), "25h 5m");
    }

    #[test]
    fn tap_opens_settings() {
        let mut page = StatusPage::new();
        let mut svc = MemoryServices::default();
        let (handled, reqs) = testing::tap(&mut page, &mut svc, 240, 240);
        assert!(handled);
        assert_eq!(reqs, vec![NavRequest::Go("settings".into())]);
    }

    #[test]
    fn refreshes_once_per_second() {
        let mut page = StatusPage::new();
        let mut svc = MemoryServices {
            status: NetworkStatus {
                current_interface: "eth0".into(),
                status: "connected".into(),
                ..Default::default()
            },
            tunnels: vec![Tunnel::default(), Tunnel::default()],
            ..Default::default()
        };
        testing::enter(&mut page, &mut svc);
        assert_eq!(page.tunnel_count, 2);
        assert!(page.connected);
        assert!((page.down_kbps - 12.25).abs() < 1e-9);

        svc.calls.clear();
        testing::tick(&mut page, &mut svc, 500);
        assert!(svc.calls.is_empty());
        testing::tick(&mut page, &mut svc, 500);
        assert!(svc.calls.contains(&"tunnels".to_string()));
        assert_eq!(page.uptime_ms, 1000);
    }

    #[test]
    fn service_failure_degrades_quietly() {
        let mut page = StatusPage::new();
        let mut svc = MemoryServices {
            fail_with: Some("offline".into()),
            ..Default::default()
        };
        testing::enter(&mut page, &mut svc);
        assert!(!page.connected);
        assert_eq!(page.tunnel_count, 0);
    }

    #[test]
    fn blink_window() {
        let mut page = StatusPage::new();
        assert!(page.ball_pose().2);
        page.frame = 10;
        assert!(!page.ball_pose().2);
        page.frame = 240;
        assert!(page.ball_pose().2);
    }

    #[test]
    fn renders_gradient_background() {
        let s = testing::render(&StatusPage::new());
        assert_eq!(s.pixel(0, 0), Some(theme::BACKGROUND));
        assert_ne!(s.pixel(240, 158), Some(theme::BACKGROUND));
    }
}
