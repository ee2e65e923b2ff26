// display/fb.rs — Linux framebuffer (/dev/fbN) output
//
// The device is mapped once at open. `present` converts the RGBA back buffer
// into the panel's packed format, honoring line_length and the visible
// offset inside the virtual resolution. Mapping and descriptor are released
// when the value drops.

use std::os::fd::{AsFd, OwnedFd};
use std::path::{Path, PathBuf};

use rustix::fs::OFlags;

use crate::error::{Error, Result};
use crate::surface::PixelSurface;
use crate::sys::{self, FbBitfield, FbFixScreeninfo, FbVarScreeninfo, MappedRegion};

use super::Display;

/// Where one channel lives inside a packed pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Channel {
    offset: u32,
    length: u32,
}

impl Channel {
    fn from_bitfield(b: FbBitfield) -> Self {
        Self {
            offset: b.offset,
            length: b.length.min(8),
        }
    }

    #[inline]
    fn pack(self, v: u8) -> u32 {
        if self.length == 0 {
            return 0;
        }
        // an offset past the word means the channel is not stored
        ((v as u32) >> (8 - self.length))
            .checked_shl(self.offset)
            .unwrap_or(0)
    }
}

/// Byte layout of the mapped memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    bytes_per_pixel: usize,
    line_length: usize,
    x_offset: usize,
    y_offset: usize,
    red: Channel,
    green: Channel,
    blue: Channel,
    alpha: Channel,
}

impl Layout {
    fn new(var: &FbVarScreeninfo, fix: &FbFixScreeninfo) -> Result<Self> {
        let bpp = var.bits_per_pixel;
        if !matches!(bpp, 16 | 24 | 32) {
            return Err(Error::UnsupportedFormat { bpp });
        }
        let bytes_per_pixel = bpp as usize / 8;
        let line_length = match fix.line_length as usize {
            0 => var.xres_virtual.max(var.xres) as usize * bytes_per_pixel,
            n => n,
        };
        Ok(Self {
            bytes_per_pixel,
            line_length,
            x_offset: var.xoffset as usize,
            y_offset: var.yoffset as usize,
            red: Channel::from_bitfield(var.red),
            green: Channel::from_bitfield(var.green),
            blue: Channel::from_bitfield(var.blue),
            alpha: Channel::from_bitfield(var.transp),
        })
    }

    /// Little-endian XRGB8888 / ARGB8888, the common case on SoC panels.
    fn is_xrgb8888(&self) -> bool {
        self.bytes_per_pixel == 4
            && self.red == Channel { offset: 16, length: 8 }
            && self.green == Channel { offset: 8, length: 8 }
            && self.blue == Channel { offset: 0, length: 8 }
    }

    #[inline]
    fn pack(&self, px: &[u8]) -> u32 {
        self.red.pack(px[0]) | self.green.pack(px[1]) | self.blue.pack(px[2]) | self.alpha.pack(px[3])
    }

    fn row_start(&self, y: usize) -> usize {
        (y + self.y_offset) * self.line_length + self.x_offset * self.bytes_per_pixel
    }
}

/// Copy `src` into `dst` using `layout`. Rows or pixels past the end of
/// `dst` are dropped.
fn blit(src: &PixelSurface, dst: &mut [u8], layout: &Layout) {
    let w = src.width() as usize;
    let bpp = layout.bytes_per_pixel;
    let fast = layout.is_xrgb8888();

    for (y, row) in src.as_bytes().chunks_exact(src.stride()).enumerate() {
        let start = layout.row_start(y);
        if start >= dst.len() {
            break;
        }
        let end = (start + w * bpp).min(dst.len());
        let out = &mut dst[start..end];

        if fast {
            for (d, s) in out.chunks_exact_mut(4).zip(row.chunks_exact(4)) {
                d.copy_from_slice(&[s[2], s[1], s[0], 0xff]);
            }
        } else {
            for (d, s) in out.chunks_exact_mut(bpp).zip(row.chunks_exact(4)) {
                let v = layout.pack(s).to_le_bytes();
                d.copy_from_slice(&v[..bpp]);
            }
        }
    }
}

pub struct FbDisplay {
    path: PathBuf,
    layout: Layout,
    map: MappedRegion,
    back: PixelSurface,
    // Kept open for the mapping's lifetime; dropped after `map`.
    _fd: OwnedFd,
}

impl FbDisplay {
    pub fn open(path: &Path) -> Result<Self> {
        let fd = sys::open_device(path, OFlags::RDWR)?;
        let var = sys::fb_var_info(fd.as_fd())?;
        let fix = sys::fb_fix_info(fd.as_fd())?;
        let layout = Layout::new(&var, &fix)?;

        let len = match fix.smem_len as usize {
            0 => layout.line_length * var.yres_virtual.max(var.yres) as usize,
            n => n,
        };
        let map = MappedRegion::map(fd.as_fd(), len)?;

        tracing::info!(
            "Framebuffer {}: {}x{} {}bpp line {} ({} bytes mapped)",
            path.display(),
            var.xres,
            var.yres,
            var.bits_per_pixel,
            layout.line_length,
            map.len()
        );
        if !layout.is_xrgb8888() {
            tracing::debug!("framebuffer uses generic pixel packing: {layout:?}");
        }

        Ok(Self {
            path: path.to_path_buf(),
            layout,
            map,
            back: PixelSurface::new(var.xres, var.yres),
            _fd: fd,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Display for FbDisplay {
    fn size(&self) -> (u32, u32) {
        (self.back.width(), self.back.height())
    }

    fn back_buffer(&mut self) -> &mut PixelSurface {
        &mut self.back
    }

    fn present(&mut self) -> Result<()> {
        blit(&self.back, self.map.as_mut_slice(), &self.layout);
        Ok(())
    }
}

impl Drop for FbDisplay {
    fn drop(&mut self) {
        tracing::debug!("closing framebuffer {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixelui::Color;

    fn bitfield(offset: u32, length: u32) -> FbBitfield {
        FbBitfield {
            offset,
            length,
            msb_right: 0,
        }
    }

    fn var(bpp: u32, r: (u32, u32), g: (u32, u32), b: (u32, u32)) -> FbVarScreeninfo {
        FbVarScreeninfo {
            xres: 2,
            yres: 2,
            xres_virtual: 2,
            yres_virtual: 4,
            bits_per_pixel: bpp,
            red: bitfield(r.0, r.1),
            green: bitfield(g.0, g.1),
            blue: bitfield(b.0, b.1),
            ..Default::default()
        }
    }

    fn surface() -> PixelSurface {
        let mut s = PixelSurface::new(2, 2);
        s.put(0, 0, Color::rgb(255, 0, 0));
        s.put(1, 0, Color::rgb(0, 255, 0));
        s.put(0, 1, Color::rgb(0, 0, 255));
        s.put(1, 1, Color::WHITE);
        s
    }

    #[test]
    fn channel_offset_past_word_is_dropped() {
        let bogus = Channel::from_bitfield(bitfield(40, 8));
        assert_eq!(bogus.pack(0xff), 0);
        assert_eq!(Channel::from_bitfield(bitfield(32, 8)).pack(0xff), 0);
        assert_eq!(Channel::from_bitfield(bitfield(24, 8)).pack(0xff), 0xff00_0000);

        let mut v = var(32, (16, 8), (8, 8), (0, 8));
        v.transp = bitfield(33, 8);
        let fix = FbFixScreeninfo {
            line_length: 8,
            ..Default::default()
        };
        let layout = Layout::new(&v, &fix).unwrap();
        assert_eq!(layout.pack(&[0x12, 0x34, 0x56, 0xff]), 0x0012_3456);
    }

    #[test]
    fn xrgb8888_fast_path() {
        let v = var(32, (16, 8), (8, 8), (0, 8));
        let fix = FbFixScreeninfo {
            line_length: 12,
            ..Default::default()
        };
        let layout = Layout::new(&v, &fix).unwrap();
        assert!(layout.is_xrgb8888());

        let mut mem = vec![0u8; 12 * 4];
        blit(&surface(), &mut mem, &layout);
        assert_eq!(&mem[0..8], &[0, 0, 255, 255, 0, 255, 0, 255]);
        // padding past the visible width is untouched
        assert_eq!(&mem[8..12], &[0, 0, 0, 0]);
        assert_eq!(&mem[12..16], &[255, 0, 0, 255]);
    }

    #[test]
    fn rgb565_packing() {
        let v = var(16, (11, 5), (5, 6), (0, 5));
        let layout = Layout::new(&v, &FbFixScreeninfo::default()).unwrap();
        assert_eq!(layout.line_length, 4);

        let mut mem = vec![0u8; 4 * 4];
        blit(&surface(), &mut mem, &layout);
        assert_eq!(u16::from_le_bytes([mem[0], mem[1]]), 0xf800);
        assert_eq!(u16::from_le_bytes([mem[2], mem[3]]), 0x07e0);
        assert_eq!(u16::from_le_bytes([mem[4], mem[5]]), 0x001f);
        assert_eq!(u16::from_le_bytes([mem[6], mem[7]]), 0xffff);
    }

    #[test]
    fn visible_offset_is_honored() {
        let mut v = var(32, (16, 8), (8, 8), (0, 8));
        v.yoffset = 2;
        let layout = Layout::new(&v, &FbFixScreeninfo::default()).unwrap();
        let mut mem = vec![0u8; 8 * 4];
        blit(&surface(), &mut mem, &layout);
        assert!(mem[..16].iter().all(|&b| b == 0));
        assert_eq!(&mem[16..20], &[0, 0, 255, 255]);
    }

    #[test]
    fn short_mapping_clips() {
        let v = var(32, (16, 8), (8, 8), (0, 8));
        let layout = Layout::new(&v, &FbFixScreeninfo::default()).unwrap();
        let mut mem = vec![0u8; 10];
        blit(&surface(), &mut mem, &layout);
        assert_eq!(&mem[0..8], &[0, 0, 255, 255, 0, 255, 0, 255]);
    }

    #[test]
    fn unsupported_depth() {
        let v = var(8, (0, 3), (3, 3), (6, 2));
        assert!(matches!(
            Layout::new(&v, &FbFixScreeninfo::default()),
            Err(Error::UnsupportedFormat { bpp: 8 })
        ));
    }
}
