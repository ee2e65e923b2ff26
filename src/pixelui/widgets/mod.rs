// pixelui/widgets/mod.rs — stock widgets shared by the pages
//
// Widgets never navigate. Each `handle_touch` reports what happened and the
// owning page decides what to do about it.

pub mod button;
pub mod dialog;
pub mod input;
pub mod keyboard;
pub mod list;
pub mod navbar;

pub use self::button::{Button, ButtonStyle};
pub use self::dialog::{ConfirmDialog, DialogResponse};
pub use self::input::InputField;
pub use self::keyboard::{Key, KeyboardMode, KeyboardResponse, VirtualKeyboard};
pub use self::list::{ListIcon, ListItem, ListResponse, ListView, ITEM_HEIGHT};
pub use self::navbar::{NavBar, NavBarResponse, NAVBAR_HEIGHT};
