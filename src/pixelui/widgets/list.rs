// widgets/list.rs — scrollable list of 72 px rows

use crate::font::FontWeight;
use crate::pixelui::{text_top_for_center, theme, Color, Painter, Rect};
use crate::touch::{TouchEvent, TouchKind};

pub const ITEM_HEIGHT: i32 = 72;
const DRAG_THRESHOLD: i32 = 6;

/// Glyph drawn left of the title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListIcon {
    #[default]
    None,
    /// Filled status dot.
    Dot(Color),
    /// "+" in a brand-blue disc.
    Plus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListItem {
    pub title: String,
    pub subtitle: String,
    /// Right-aligned value text.
    pub value: String,
    pub icon: ListIcon,
    pub arrow: bool,
}

impl ListItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
    pub fn subtitle(mut self, s: impl Into<String>) -> Self {
        self.subtitle = s.into();
        self
    }
    pub fn value(mut self, v: impl Into<String>) -> Self {
        self.value = v.into();
        self
    }
    pub fn icon(mut self, i: ListIcon) -> Self {
        self.icon = i;
        self
    }
    pub fn arrow(mut self) -> Self {
        self.arrow = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListResponse {
    Ignored,
    Consumed,
    /// Released over the same row it was pressed on.
    Clicked(usize),
}

impl ListResponse {
    pub fn handled(self) -> bool {
        self != ListResponse::Ignored
    }
}

#[derive(Debug, Clone)]
pub struct ListView {
    rect: Rect,
    items: Vec<ListItem>,
    offset_y: i32,
    pressed: Option<usize>,
    dragging: bool,
    drag_start_y: i32,
    last_drag_y: i32,
}

impl ListView {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            items: Vec::new(),
            offset_y: 0,
            pressed: None,
            dragging: false,
            drag_start_y: 0,
            last_drag_y: 0,
        }
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }
    pub fn offset(&self) -> i32 {
        self.offset_y
    }
    pub fn push(&mut self, item: ListItem) {
        self.items.push(item);
    }

    /// Drop all rows and reset scroll and press state.
    pub fn clear(&mut self) {
        self.items.clear();
        self.offset_y = 0;
        self.pressed = None;
        self.dragging = false;
    }

    /// Replace rows keeping the scroll offset (clamped to the new length).
    pub fn set_items(&mut self, items: Vec<ListItem>) {
        self.items = items;
        self.pressed = None;
        self.scroll(0);
    }

    pub fn scroll(&mut self, dy: i32) {
        let min = (-(self.items.len() as i32 * ITEM_HEIGHT - self.rect.h)).min(0);
        self.offset_y = (self.offset_y + dy).clamp(min, 0);
    }

    fn index_at(&self, y: i32) -> Option<usize> {
        let rel = y - (self.rect.y + self.offset_y);
        if rel < 0 {
            return None;
        }
        let i = (rel / ITEM_HEIGHT) as usize;
        (i < self.items.len()).then_some(i)
    }

    pub fn render(&self, p: &mut Painter) {
        let r = self.rect;
        let start = r.y + self.offset_y;
        let last = self.items.len().saturating_sub(1);

        for (i, item) in self.items.iter().enumerate() {
            let iy = start + i as i32 * ITEM_HEIGHT;
            if iy + ITEM_HEIGHT < r.y || iy > r.bottom() {
                continue;
            }
            if self.pressed == Some(i) {
                p.fill_rect(r.x, iy, r.w, ITEM_HEIGHT, theme::PRESSED);
            }

            let mut content_x = r.x + 24;
            let mid = iy + ITEM_HEIGHT / 2;
            match item.icon {
                ListIcon::None => {}
                ListIcon::Dot(c) => {
                    p.circle_aa(content_x + 8, mid, 6, c);
                    content_x += 40;
                }
                ListIcon::Plus => {
                    p.circle_aa(content_x + 12, mid, 12, theme::BRAND_BLUE);
                    p.fill_rect(content_x + 6, mid - 1, 12, 2, theme::BACKGROUND);
                    p.fill_rect(content_x + 11, mid - 6, 2, 12, theme::BACKGROUND);
                    content_x += 40;
                }
            }

            if item.subtitle.is_empty() {
                let top = text_top_for_center(iy, ITEM_HEIGHT, 18.0);
                p.text(&item.title, content_x, top, theme::TEXT_PRIMARY, 18.0, FontWeight::Regular);
            } else {
                p.text(&item.title, content_x, iy + 14, theme::TEXT_PRIMARY, 18.0, FontWeight::Regular);
                p.text(&item.subtitle, content_x, iy + 42, theme::TEXT_SECONDARY, 14.0, FontWeight::Regular);
            }

            let mut right = r.right() - 24;
            if item.arrow {
                let s = 6;
                for k in 0..2 {
                    p.line(right - s + k, mid - s, right + k, mid, theme::TEXT_LIGHT);
                    p.line(right + k, mid, right - s + k, mid + s, theme::TEXT_LIGHT);
                }
                right -= 20;
            }
            if !item.value.is_empty() {
                let vw = p.measure_text(&item.value, 16.0, FontWeight::Regular);
                let top = text_top_for_center(iy, ITEM_HEIGHT, 16.0);
                p.text(&item.value, right - vw, top, theme::TEXT_SECONDARY, 16.0, FontWeight::Regular);
            }

            if i < last {
                p.fill_rect(content_x, iy + ITEM_HEIGHT - 1, r.right() - content_x, 1, theme::SEPARATOR);
            }
        }
    }

    /// Taps on the empty area below the last row are not consumed.
    pub fn handle_touch(&mut self, ev: &TouchEvent) -> ListResponse {
        let (x, y) = (ev.x, ev.y);
        if !self.rect.contains(x, y) {
            // A gesture that ends elsewhere cannot click later.
            if ev.kind == TouchKind::Up {
                self.pressed = None;
                self.dragging = false;
            }
            return ListResponse::Ignored;
        }

        match ev.kind {
            TouchKind::Down => {
                self.pressed = None;
                self.dragging = false;
                self.drag_start_y = y;
                self.last_drag_y = y;
            }
            TouchKind::Move => {
                let dy = y - self.last_drag_y;
                if !self.dragging && (y - self.drag_start_y).abs() > DRAG_THRESHOLD {
                    self.dragging = true;
                }
                self.last_drag_y = y;
                if self.dragging {
                    self.scroll(dy);
                    self.pressed = None;
                    return ListResponse::Consumed;
                }
            }
            TouchKind::Up if self.dragging => {
                self.dragging = false;
                self.pressed = None;
                return ListResponse::Consumed;
            }
            TouchKind::Up => {}
        }

        let Some(index) = self.index_at(y) else {
            if ev.kind == TouchKind::Up {
                self.pressed = None;
            }
            return ListResponse::Ignored;
        };
        match ev.kind {
            TouchKind::Down => {
                self.pressed = Some(index);
                ListResponse::Consumed
            }
            TouchKind::Up => {
                let clicked = self.pressed.take() == Some(index);
                if clicked {
                    ListResponse::Clicked(index)
                } else {
                    ListResponse::Consumed
                }
            }
            TouchKind::Move => ListResponse::Ignored,
        }
    }
}
