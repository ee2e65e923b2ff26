pub mod app;
pub mod config;
pub mod display;
pub mod error;
pub mod font;
pub mod nav;
pub mod pages;
pub mod pixelui;
pub mod services;
pub mod shaper;
pub mod surface;
pub mod sys;
pub mod touch;
pub mod util;

pub use error::{Error, Result};
