// error.rs — engine error type
//
// Fatal paths only: device bring-up, presentation, unknown pages. Service
// failures stay as plain strings because pages render them inline.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot open {}: {source}", path.display())]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{what} ioctl failed: {source}")]
    Ioctl {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("mmap failed: {0}")]
    Mmap(#[source] std::io::Error),

    #[error("unsupported framebuffer format: {bpp} bits per pixel")]
    UnsupportedFormat { bpp: u32 },

    #[error("no /dev/input/event* device found")]
    NoInputDevice,

    #[error("page not found: {0}")]
    PageNotFound(String),

    #[error("present failed: {0}")]
    Present(String),

    #[error("window error: {0}")]
    Window(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
