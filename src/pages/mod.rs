// pages/mod.rs — the appliance's screens
//
// Every page is authored in the 480×480 logical space and talks to the
// outside world only through `PageCx::services`.

pub mod ethernet;
pub mod network;
pub mod settings;
pub mod status;
pub mod tunnel_edit;
pub mod tunnel_list;
pub mod wifi_connect;
pub mod wifi_list;

use crate::nav::Navigation;
use crate::pixelui::widgets::{InputField, KeyboardResponse, VirtualKeyboard, NAVBAR_HEIGHT};
use crate::pixelui::{theme, Painter, Rect, LOGICAL_H, LOGICAL_W};
use crate::touch::{TouchEvent, TouchKind};

pub const STATUS: &str = "status";
pub const SETTINGS: &str = "settings";
pub const NETWORK: &str = "network";
pub const ETHERNET: &str = "ethernet";
pub const WIFI_LIST: &str = "wifi_list";
pub const WIFI_CONNECT: &str = "wifi_connect";
pub const TUNNEL_LIST: &str = "tunnel_list";
pub const TUNNEL_EDIT: &str = "tunnel_edit";

/// Register every stock page.
pub fn register_all(nav: &mut Navigation) {
    nav.register(Box::new(status::StatusPage::new()));
    nav.register(Box::new(settings::SettingsPage::new()));
    nav.register(Box::new(network::NetworkPage::new()));
    nav.register(Box::new(ethernet::EthernetPage::new()));
    nav.register(Box::new(wifi_list::WifiListPage::new()));
    nav.register(Box::new(wifi_connect::WifiConnectPage::new()));
    nav.register(Box::new(tunnel_list::TunnelListPage::new()));
    nav.register(Box::new(tunnel_edit::TunnelEditPage::new()));
}

// ── shared pieces ─────────────────────────────────────────────────────────────

/// Logical height of the on-screen keyboard; it always docks at the bottom.
pub(crate) const KEYBOARD_H: i32 = 240;

/// Space left between a revealed field and the keyboard or nav bar.
const REVEAL_PAD: i32 = 10;

pub(crate) fn keyboard() -> VirtualKeyboard {
    VirtualKeyboard::new(LOGICAL_H - KEYBOARD_H, LOGICAL_W, KEYBOARD_H)
}

pub(crate) fn paint_background(p: &mut Painter) {
    p.fill_rect(0, 0, LOGICAL_W, LOGICAL_H, theme::BACKGROUND);
}

/// Area below the nav bar used by list pages.
pub(crate) fn content_rect() -> Rect {
    Rect::new(0, NAVBAR_HEIGHT, LOGICAL_W, LOGICAL_H - NAVBAR_HEIGHT)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormTouch {
    Unhandled,
    Handled,
    /// Keyboard Enter was released; the keyboard is already hidden.
    Entered,
    /// A field was tapped and now owns the keyboard.
    Focused(usize),
}

/// Keyboard-first routing shared by the form pages.
///
/// While the keyboard is up, a release on another active field moves the
/// binding there and a release anywhere else dismisses it; nothing behind the
/// keyboard sees the touch.
pub(crate) fn route_form_touch(
    ev: &TouchEvent,
    kb: &mut VirtualKeyboard,
    fields: &mut [InputField],
    active: impl Fn(usize) -> bool,
) -> FormTouch {
    match kb.handle_touch(ev, fields) {
        KeyboardResponse::Entered => return FormTouch::Entered,
        KeyboardResponse::Consumed => return FormTouch::Handled,
        KeyboardResponse::Ignored => {}
    }

    // Fields scrolled under the nav bar are not hittable.
    let hit = (ev.y >= NAVBAR_HEIGHT)
        .then(|| (0..fields.len()).find(|&i| active(i) && fields[i].rect.contains(ev.x, ev.y)))
        .flatten();
    if let Some(i) = hit {
        if fields[i].handle_touch(ev) {
            kb.show(i, fields);
            return FormTouch::Focused(i);
        }
    }

    if kb.is_visible() {
        if ev.kind == TouchKind::Up {
            kb.hide(fields);
        }
        return FormTouch::Handled;
    }
    FormTouch::Unhandled
}

/// Vertical shift (≤ 0) that brings `field` above `bottom - pad` without
/// pushing it under `top + pad`.
pub(crate) fn reveal_shift(field: Rect, top: i32, bottom: i32) -> i32 {
    let overflow = field.bottom() - (bottom - REVEAL_PAD);
    if overflow <= 0 {
        return 0;
    }
    let room = field.y - (top + REVEAL_PAD);
    -overflow.min(room.max(0))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixelui::widgets::Key;

    fn fields() -> Vec<InputField> {
        vec![
            InputField::new(Rect::new(24, 100, 432, 46)),
            InputField::new(Rect::new(24, 300, 432, 46)),
        ]
    }

    #[test]
    fn tap_on_field_binds_keyboard() {
        let mut kb = keyboard();
        let mut f = fields();
        assert_eq!(
            route_form_touch(&TouchEvent::down(50, 120), &mut kb, &mut f, |_| true),
            FormTouch::Unhandled
        );
        assert_eq!(
            route_form_touch(&TouchEvent::up(50, 120), &mut kb, &mut f, |_| true),
            FormTouch::Focused(0)
        );
        assert!(kb.is_visible());
        assert_eq!(kb.target(), Some(0));
    }

    #[test]
    fn inactive_field_is_skipped() {
        let mut kb = keyboard();
        let mut f = fields();
        assert_eq!(
            route_form_touch(&TouchEvent::up(50, 120), &mut kb, &mut f, |i| i != 0),
            FormTouch::Unhandled
        );
        assert!(!f[0].is_focused());
    }

    #[test]
    fn tap_outside_dismisses_visible_keyboard() {
        let mut kb = keyboard();
        let mut f = fields();
        kb.show(0, &mut f);
        assert_eq!(
            route_form_touch(&TouchEvent::down(240, 80), &mut kb, &mut f, |_| true),
            FormTouch::Handled
        );
        assert!(kb.is_visible());
        assert_eq!(
            route_form_touch(&TouchEvent::up(240, 80), &mut kb, &mut f, |_| true),
            FormTouch::Handled
        );
        assert!(!kb.is_visible());
        assert!(!f[0].is_focused());
    }

    #[test]
    fn enter_key_reports_entered() {
        let mut kb = keyboard();
        let mut f = fields();
        kb.show(0, &mut f);
        let (_, r) = kb
            .key_rects()
            .into_iter()
            .find(|(k, _)| *k == Key::Enter)
            .unwrap();
        let (x, y) = r.center();
        route_form_touch(&TouchEvent::down(x, y), &mut kb, &mut f, |_| true);
        assert_eq!(
            route_form_touch(&TouchEvent::up(x, y), &mut kb, &mut f, |_| true),
            FormTouch::Entered
        );
    }

    #[test]
    fn reveal_shift_bounds() {
        assert_eq!(reveal_shift(Rect::new(24, 100, 400, 46), 60, 240), 0);
        // bottom 346 must end at 230
        assert_eq!(reveal_shift(Rect::new(24, 300, 400, 46), 60, 240), -116);
        // never pushed under the top edge
        assert_eq!(reveal_shift(Rect::new(24, 80, 400, 300), 60, 240), -10);
    }
}
