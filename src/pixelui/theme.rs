// pixelui/theme.rs — light palette shared by every page

use super::Color;

// backgrounds
pub const BACKGROUND: Color = Color::rgb(255, 255, 255);
pub const BACKGROUND_MID: Color = Color::rgb(248, 250, 252);
pub const BACKGROUND_END: Color = Color::rgb(241, 245, 249);

// text
pub const TEXT_PRIMARY: Color = Color::rgb(30, 41, 59);
pub const TEXT_SECONDARY: Color = Color::rgb(100, 116, 139);
pub const TEXT_LIGHT: Color = Color::rgb(148, 163, 184);

// accents
pub const BRAND_BLUE: Color = Color::rgb(59, 130, 246);
pub const SUCCESS_GREEN: Color = Color::rgb(16, 185, 129);
pub const STATUS_GREEN: Color = Color::rgb(34, 197, 94);
pub const WARNING_ORANGE: Color = Color::rgb(245, 158, 11);
pub const ERROR_RED: Color = Color::rgb(239, 68, 68);
pub const PURPLE: Color = Color::rgb(139, 92, 246);

// interaction
pub const SEPARATOR: Color = Color::rgb(226, 232, 240);
pub const PRESSED: Color = Color::rgb(241, 245, 249);
pub const OVERLAY: Color = Color::rgba(0, 0, 0, 100);
pub const KEYBOARD_BG: Color = Color::rgb(203, 213, 225);
pub const KEY_BG: Color = Color::rgb(255, 255, 255);
pub const KEY_FUNCTION_BG: Color = Color::rgb(180, 190, 200);
