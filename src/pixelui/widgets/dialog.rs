// widgets/dialog.rs — modal confirm/cancel dialog

use crate::font::FontWeight;
use crate::pixelui::{text_top_for_center, theme, Painter, Rect, LOGICAL_H, LOGICAL_W};
use crate::touch::{TouchEvent, TouchKind};

const BOX: Rect = Rect::new(40, 140, 400, 200);
const BTN_H: i32 = 46;
const GAP: i32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResponse {
    Ignored,
    Consumed,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    visible: bool,
    title: String,
    message: String,
    confirm_label: String,
    cancel_label: String,
}

impl Default for ConfirmDialog {
    fn default() -> Self {
        Self {
            visible: false,
            title: "Confirm".into(),
            message: String::new(),
            confirm_label: "OK".into(),
            cancel_label: "Cancel".into(),
        }
    }
}

impl ConfirmDialog {
    pub fn new(title: impl Into<String>, confirm_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            confirm_label: confirm_label.into(),
            ..Default::default()
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn show(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    fn buttons() -> (Rect, Rect) {
        let y = BOX.bottom() - 62;
        let w = (BOX.w - GAP * 3) / 2;
        (
            Rect::new(BOX.x + GAP, y, w, BTN_H),
            Rect::new(BOX.x + GAP * 2 + w, y, w, BTN_H),
        )
    }

    pub fn render(&self, p: &mut Painter) {
        if !self.visible {
            return;
        }
        p.overlay(Rect::new(0, 0, LOGICAL_W, LOGICAL_H), theme::OVERLAY);
        p.rounded_rect(BOX.x, BOX.y, BOX.w, BOX.h, 18, theme::BACKGROUND);
        p.fill_rect(BOX.x, BOX.y + 58, BOX.w, 1, theme::SEPARATOR);

        p.text(&self.title, BOX.x + 16, BOX.y + 20, theme::TEXT_PRIMARY, 18.0, FontWeight::Medium);
        p.text(&self.message, BOX.x + 16, BOX.y + 82, theme::TEXT_SECONDARY, 14.0, FontWeight::Regular);

        let (cancel, ok) = Self::buttons();
        for (r, label, bg, fg) in [
            (cancel, &self.cancel_label, theme::PRESSED, theme::TEXT_PRIMARY),
            (ok, &self.confirm_label, theme::BRAND_BLUE, theme::BACKGROUND),
        ] {
            p.rounded_rect(r.x, r.y, r.w, r.h, 14, bg);
            let tw = p.measure_text(label, 16.0, FontWeight::Medium);
            let top = text_top_for_center(r.y, r.h, 16.0);
            p.text(label, r.x + (r.w - tw) / 2, top, fg, 16.0, FontWeight::Medium);
        }
    }

    /// While visible every touch is consumed; only releases act.
    pub fn handle_touch(&mut self, ev: &TouchEvent) -> DialogResponse {
        if !self.visible {
            return DialogResponse::Ignored;
        }
        if ev.kind != TouchKind::Up {
            return DialogResponse::Consumed;
        }
        let (cancel, ok) = Self::buttons();
        if !BOX.contains(ev.x, ev.y) || cancel.contains(ev.x, ev.y) {
            self.visible = false;
            return DialogResponse::Cancelled;
        }
        if ok.contains(ev.x, ev.y) {
            self.visible = false;
            return DialogResponse::Confirmed;
        }
        DialogResponse::Consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_ignores() {
        let mut d = ConfirmDialog::default();
        assert_eq!(d.handle_touch(&TouchEvent::up(240, 240)), DialogResponse::Ignored);
    }

    #[test]
    fn outside_cancels_and_buttons_act() {
        let mut d = ConfirmDialog::new("Delete", "Delete");
        d.show("Delete tunnel web?");
        assert_eq!(d.handle_touch(&TouchEvent::down(5, 5)), DialogResponse::Consumed);
        assert_eq!(d.handle_touch(&TouchEvent::up(5, 5)), DialogResponse::Cancelled);
        assert!(!d.is_visible());

        d.show("again");
        let (cancel, ok) = ConfirmDialog::buttons();
        let (x, y) = ok.center();
        assert_eq!(d.handle_touch(&TouchEvent::up(x, y)), DialogResponse::Confirmed);

        d.show("again");
        let (x, y) = cancel.center();
        assert_eq!(d.handle_touch(&TouchEvent::up(x, y)), DialogResponse::Cancelled);

        d.show("again");
        assert_eq!(d.handle_touch(&TouchEvent::up(240, 180)), DialogResponse::Consumed);
        assert!(d.is_visible());
    }
}
