// widgets/keyboard.rs — on-screen keyboard
//
// Four rows per mode, keys sized by width units. Rendering and hit-testing
// both walk `row_geometry`, so a key is hit exactly where it is drawn.
//
// The keyboard does not own the field it edits. Pages keep their fields in a
// slice and bind the keyboard to an index into it.

use crate::font::FontWeight;
use crate::pixelui::{text_top_for_center, theme, Painter, Rect};
use crate::touch::{TouchEvent, TouchKind};

use super::input::InputField;

const ROWS: usize = 4;
const PAD: i32 = 4;
const KEY_RADIUS: i32 = 6;
const LABEL_SIZE: f32 = 18.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardMode {
    Lower,
    Upper,
    Numeric,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Space,
    Enter,
    Delete,
    /// Lower → Upper.
    Shift,
    /// Upper → Lower.
    Unshift,
    /// → Numeric.
    Symbols,
    /// Numeric → Lower.
    Letters,
}

use self::Key::Char as C;

impl Key {
    fn width_unit(self) -> f64 {
        match self {
            Key::Space => 4.0,
            Key::Enter => 2.0,
            Key::Shift | Key::Unshift | Key::Delete | Key::Symbols | Key::Letters => 1.5,
            Key::Char(_) => 1.0,
        }
    }

    fn is_function(self) -> bool {
        !matches!(self, Key::Char(_) | Key::Space)
    }

    /// Text painted on the key cap. Arrow glyphs need an outline font.
    pub fn label(self, outline: bool) -> String {
        match self {
            Key::Char(c) => c.to_string(),
            Key::Space => "space".into(),
            Key::Enter => "OK".into(),
            Key::Delete if outline => "⌫".into(),
            Key::Delete => "DEL".into(),
            Key::Shift if outline => "⇧".into(),
            Key::Shift => "UP".into(),
            Key::Unshift if outline => "⇩".into(),
            Key::Unshift => "LOW".into(),
            Key::Symbols => "123".into(),
            Key::Letters => "ABC".into(),
        }
    }
}

const LOWER: [&[Key]; ROWS] = [
    &[C('q'), C('w'), C('e'), C('r'), C('t'), C('y'), C('u'), C('i'), C('o'), C('p')],
    &[C('a'), C('s'), C('d'), C('f'), C('g'), C('h'), C('j'), C('k'), C('l')],
    &[Key::Shift, C('z'), C('x'), C('c'), C('v'), C('b'), C('n'), C('m'), Key::Delete],
    &[Key::Symbols, Key::Space, Key::Enter],
];

const UPPER: [&[Key]; ROWS] = [
    &[C('Q'), C('W'), C('E'), C('R'), C('T'), C('Y'), C('U'), C('I'), C('O'), C('P')],
    &[C('A'), C('S'), C('D'), C('F'), C('G'), C('H'), C('J'), C('K'), C('L')],
    &[Key::Unshift, C('Z'), C('X'), C('C'), C('V'), C('B'), C('N'), C('M'), Key::Delete],
    &[Key::Symbols, Key::Space, Key::Enter],
];

const NUMERIC: [&[Key]; ROWS] = [
    &[C('1'), C('2'), C('3'), C('4'), C('5'), C('6'), C('7'), C('8'), C('9'), C('0')],
    &[C('-'), C('/'), C(':'), C(';'), C('('), C(')'), C('$'), C('&'), C('@'), C('"')],
    &[Key::Letters, C('.'), C(','), C('?'), C('!'), C('\''), C('#'), C('+'), Key::Delete],
    &[Key::Letters, Key::Space, Key::Enter],
];

/// What a touch did, beyond being consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardResponse {
    /// Not ours: hidden, or outside the keyboard.
    Ignored,
    Consumed,
    /// Enter was released: the keyboard is now hidden.
    Entered,
}

impl KeyboardResponse {
    pub fn handled(self) -> bool {
        self != KeyboardResponse::Ignored
    }
}

#[derive(Debug, Clone)]
pub struct VirtualKeyboard {
    rect: Rect,
    visible: bool,
    mode: KeyboardMode,
    pressed: Option<Key>,
    target: Option<usize>,
}

impl VirtualKeyboard {
    /// Full-width keyboard whose top edge sits at logical `y`.
    pub fn new(y: i32, w: i32, h: i32) -> Self {
        Self {
            rect: Rect::new(0, y, w, h),
            visible: false,
            mode: KeyboardMode::Lower,
            pressed: None,
            target: None,
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }
    pub fn is_visible(&self) -> bool {
        self.visible
    }
    pub fn mode(&self) -> KeyboardMode {
        self.mode
    }
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Bind to `fields[target]`, focus it and reset to lowercase.
    pub fn show(&mut self, target: usize, fields: &mut [InputField]) {
        for (i, f) in fields.iter_mut().enumerate() {
            f.set_focus(i == target);
        }
        self.target = Some(target);
        self.visible = true;
        self.mode = KeyboardMode::Lower;
        self.pressed = None;
    }

    /// Unbind and unfocus the bound field.
    pub fn hide(&mut self, fields: &mut [InputField]) {
        if let Some(f) = self.target.and_then(|i| fields.get_mut(i)) {
            f.set_focus(false);
        }
        self.target = None;
        self.visible = false;
        self.pressed = None;
    }

    fn layout(&self) -> &'static [&'static [Key]; ROWS] {
        match self.mode {
            KeyboardMode::Lower => &LOWER,
            KeyboardMode::Upper => &UPPER,
            KeyboardMode::Numeric => &NUMERIC,
        }
    }

    fn row_height(&self) -> i32 {
        self.rect.h / ROWS as i32
    }

    /// `(key, left, width)` for each key of row `r`.
    fn row_geometry(&self, r: usize) -> Vec<(Key, i32, i32)> {
        let row = self.layout()[r];
        let units: f64 = row.iter().map(|k| k.width_unit()).sum();
        let unit_w = (self.rect.w - PAD * 2) as f64 / units;
        let mut cx = (self.rect.x + PAD) as f64;
        row.iter()
            .map(|&k| {
                let kw = (unit_w * k.width_unit()) as i32 - PAD;
                let left = cx as i32;
                cx += (kw + PAD) as f64;
                (k, left, kw)
            })
            .collect()
    }

    /// Drawn rectangle of every key in the current mode.
    pub fn key_rects(&self) -> Vec<(Key, Rect)> {
        let rh = self.row_height();
        let kh = rh - PAD * 2;
        (0..ROWS)
            .flat_map(|r| {
                let ry = self.rect.y + r as i32 * rh + PAD;
                self.row_geometry(r)
                    .into_iter()
                    .map(move |(k, x, w)| (k, Rect::new(x, ry, w, kh)))
            })
            .collect()
    }

    pub fn hit_test(&self, x: i32, y: i32) -> Option<Key> {
        let rh = self.row_height();
        if rh <= 0 || y < self.rect.y {
            return None;
        }
        let r = ((y - self.rect.y) / rh) as usize;
        if r >= ROWS {
            return None;
        }
        self.row_geometry(r)
            .into_iter()
            .find(|&(_, left, w)| x >= left && x <= left + w)
            .map(|(k, _, _)| k)
    }

    pub fn render(&self, p: &mut Painter) {
        if !self.visible {
            return;
        }
        p.fill(self.rect, theme::KEYBOARD_BG);
        let outline = p.has_outline();

        for (key, r) in self.key_rects() {
            let bg = if self.pressed == Some(key) {
                theme::PRESSED
            } else if key == Key::Enter {
                theme::BRAND_BLUE
            } else if key.is_function() {
                theme::KEY_FUNCTION_BG
            } else {
                theme::KEY_BG
            };
            p.rounded_rect(r.x, r.y, r.w, r.h, KEY_RADIUS, bg);

            let fg = if key == Key::Enter {
                theme::BACKGROUND
            } else {
                theme::TEXT_PRIMARY
            };
            let label = key.label(outline);
            let tw = p.measure_text(&label, LABEL_SIZE, FontWeight::Medium);
            let top = text_top_for_center(r.y, r.h, LABEL_SIZE);
            p.text(&label, r.x + r.w / 2 - tw / 2, top, fg, LABEL_SIZE, FontWeight::Medium);
        }
    }

    /// Every touch inside the visible keyboard is consumed, even between keys.
    pub fn handle_touch(&mut self, ev: &TouchEvent, fields: &mut [InputField]) -> KeyboardResponse {
        if !self.visible || !self.rect.contains(ev.x, ev.y) {
            return KeyboardResponse::Ignored;
        }
        match ev.kind {
            TouchKind::Down => {
                self.pressed = self.hit_test(ev.x, ev.y);
                KeyboardResponse::Consumed
            }
            TouchKind::Up => {
                let key = self.hit_test(ev.x, ev.y);
                let pressed = self.pressed.take();
                match key {
                    Some(k) if pressed == Some(k) => self.press(k, fields),
                    _ => KeyboardResponse::Consumed,
                }
            }
            TouchKind::Move => KeyboardResponse::Consumed,
        }
    }

    fn press(&mut self, key: Key, fields: &mut [InputField]) -> KeyboardResponse {
        if self.target.and_then(|i| fields.get(i)).is_none() {
            return KeyboardResponse::Consumed;
        }
        match key {
            Key::Shift => self.mode = KeyboardMode::Upper,
            Key::Unshift | Key::Letters => self.mode = KeyboardMode::Lower,
            Key::Symbols => self.mode = KeyboardMode::Numeric,
            Key::Enter => {
                self.hide(fields);
                return KeyboardResponse::Entered;
            }
            Key::Delete => {
                if let Some(f) = self.target.and_then(|i| fields.get_mut(i)) {
                    f.pop();
                }
            }
            Key::Space | Key::Char(_) => {
                let ch = if let Key::Char(c) = key { c } else { ' ' };
                if let Some(f) = self.target.and_then(|i| fields.get_mut(i)) {
                    f.push(ch);
                }
            }
        }
        KeyboardResponse::Consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> VirtualKeyboard {
        VirtualKeyboard::new(240, 480, 240)
    }

    fn field() -> Vec<InputField> {
        vec![InputField::new(Rect::new(24, 110, 432, 50))]
    }

    fn tap(kb: &mut VirtualKeyboard, key: Key, fields: &mut [InputField]) -> KeyboardResponse {
        let r = kb
            .key_rects()
            .into_iter()
            .find(|(k, _)| *k == key)
            .map(|(_, r)| r)
            .unwrap_or_else(|| panic!("{key:?} not in layout"));
        let (x, y) = r.center();
        kb.handle_touch(&TouchEvent::down(x, y), fields);
        kb.handle_touch(&TouchEvent::up(x, y), fields)
    }

    #[test]
    fn hit_test_matches_rendered_centers() {
        let mut kb = board();
        for mode in [KeyboardMode::Lower, KeyboardMode::Upper, KeyboardMode::Numeric] {
            kb.mode = mode;
            for (key, r) in kb.key_rects() {
                let (x, y) = r.center();
                assert_eq!(kb.hit_test(x, y), Some(key), "mode {mode:?}");
            }
        }
    }

    #[test]
    fn round_trip_holds_for_odd_sizes() {
        for (y, w, h) in [(200, 480, 280), (0, 333, 101), (300, 481, 179)] {
            let kb = VirtualKeyboard::new(y, w, h);
            for (key, r) in kb.key_rects() {
                let (x, cy) = r.center();
                assert_eq!(kb.hit_test(x, cy), Some(key));
            }
        }
    }

    #[test]
    fn typing_stops_at_max_len() {
        let mut kb = board();
        let mut fields = vec![InputField::new(Rect::new(0, 0, 100, 40)).max_len(4)];
        kb.show(0, &mut fields);
        for c in "abcde".chars() {
            tap(&mut kb, Key::Char(c), &mut fields);
        }
        assert_eq!(fields[0].text(), "abcd");
    }

    #[test]
    fn modes_and_delete() {
        let mut kb = board();
        let mut fields = field();
        kb.show(0, &mut fields);
        tap(&mut kb, Key::Shift, &mut fields);
        assert_eq!(kb.mode(), KeyboardMode::Upper);
        tap(&mut kb, Key::Char('Q'), &mut fields);
        tap(&mut kb, Key::Symbols, &mut fields);
        assert_eq!(kb.mode(), KeyboardMode::Numeric);
        tap(&mut kb, Key::Char('7'), &mut fields);
        tap(&mut kb, Key::Space, &mut fields);
        assert_eq!(fields[0].text(), "Q7 ");
        tap(&mut kb, Key::Delete, &mut fields);
        tap(&mut kb, Key::Delete, &mut fields);
        tap(&mut kb, Key::Delete, &mut fields);
        tap(&mut kb, Key::Delete, &mut fields);
        assert_eq!(fields[0].text(), "");
        tap(&mut kb, Key::Letters, &mut fields);
        assert_eq!(kb.mode(), KeyboardMode::Lower);
    }

    #[test]
    fn enter_hides_and_unfocuses() {
        let mut kb = board();
        let mut fields = field();
        kb.show(0, &mut fields);
        assert!(fields[0].is_focused());
        assert_eq!(tap(&mut kb, Key::Enter, &mut fields), KeyboardResponse::Entered);
        assert!(!kb.is_visible());
        assert!(!fields[0].is_focused());
        assert_eq!(kb.target(), None);
    }

    #[test]
    fn show_resets_to_lowercase() {
        let mut kb = board();
        let mut fields = field();
        kb.show(0, &mut fields);
        tap(&mut kb, Key::Shift, &mut fields);
        kb.hide(&mut fields);
        kb.show(0, &mut fields);
        assert_eq!(kb.mode(), KeyboardMode::Lower);
    }

    #[test]
    fn release_on_other_key_does_nothing() {
        let mut kb = board();
        let mut fields = field();
        kb.show(0, &mut fields);
        let rects = kb.key_rects();
        let (ax, ay) = rects[0].1.center();
        let (bx, by) = rects[1].1.center();
        kb.handle_touch(&TouchEvent::down(ax, ay), &mut fields);
        let resp = kb.handle_touch(&TouchEvent::up(bx, by), &mut fields);
        assert_eq!(resp, KeyboardResponse::Consumed);
        assert_eq!(fields[0].text(), "");
    }

    #[test]
    fn hidden_or_outside_is_ignored() {
        let mut kb = board();
        let mut fields = field();
        assert!(!kb.handle_touch(&TouchEvent::down(100, 300), &mut fields).handled());
        kb.show(0, &mut fields);
        assert!(!kb.handle_touch(&TouchEvent::down(100, 100), &mut fields).handled());
        // gap between rows is still swallowed
        assert!(kb.handle_touch(&TouchEvent::down(1, 241), &mut fields).handled());
    }
}
