// sys.rs — raw Linux device access
//
// The only module that issues ioctls, maps memory or decodes kernel records.
// Everything above it works with plain Rust values.

use std::ffi::CStr;
use std::io;
use std::net::Ipv4Addr;
use std::os::fd::{AsRawFd, BorrowedFd, OwnedFd};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use rustix::fs::{Mode, OFlags};

use crate::error::{Error, Result};

// ── ioctl numbers ─────────────────────────────────────────────────────────────

const IOC_NRBITS: u32 = 8;
const IOC_TYPEBITS: u32 = 8;
const IOC_SIZEBITS: u32 = 14;
const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = IOC_NRSHIFT + IOC_NRBITS;
const IOC_SIZESHIFT: u32 = IOC_TYPESHIFT + IOC_TYPEBITS;
const IOC_DIRSHIFT: u32 = IOC_SIZESHIFT + IOC_SIZEBITS;
const IOC_READ: u32 = 2;

/// `_IOC(dir, type, nr, size)` from `linux/ioctl.h`.
pub const fn ioc(dir: u32, ty: u8, nr: u32, size: u32) -> u32 {
    (dir << IOC_DIRSHIFT) | ((ty as u32) << IOC_TYPESHIFT) | (nr << IOC_NRSHIFT) | (size << IOC_SIZESHIFT)
}

pub const fn eviocgname(len: u32) -> u32 {
    ioc(IOC_READ, b'E', 0x06, len)
}

pub const fn eviocgabs(axis: u16) -> u32 {
    ioc(IOC_READ, b'E', 0x40 + axis as u32, std::mem::size_of::<AbsInfo>() as u32)
}

pub const FBIOGET_VSCREENINFO: u32 = 0x4600;
pub const FBIOGET_FSCREENINFO: u32 = 0x4602;

// ── evdev records ─────────────────────────────────────────────────────────────

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_ABS: u16 = 0x03;
pub const SYN_REPORT: u16 = 0;
pub const BTN_TOUCH: u16 = 0x14a;
pub const ABS_X: u16 = 0x00;
pub const ABS_Y: u16 = 0x01;
pub const ABS_MT_POSITION_X: u16 = 0x35;
pub const ABS_MT_POSITION_Y: u16 = 0x36;
pub const ABS_MT_TRACKING_ID: u16 = 0x39;

const TIMEVAL_SIZE: usize = std::mem::size_of::<libc::timeval>();
/// `struct input_event`: timeval, u16 type, u16 code, i32 value.
pub const INPUT_EVENT_SIZE: usize = TIMEVAL_SIZE + 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl InputEvent {
    /// Decode one record; `None` unless `b` holds at least a full record.
    pub fn decode(b: &[u8]) -> Option<Self> {
        let rec = b.get(..INPUT_EVENT_SIZE)?;
        let body = &rec[TIMEVAL_SIZE..];
        Some(Self {
            kind: u16::from_ne_bytes([body[0], body[1]]),
            code: u16::from_ne_bytes([body[2], body[3]]),
            value: i32::from_ne_bytes([body[4], body[5], body[6], body[7]]),
        })
    }

    /// Inverse of `decode`, with a zero timestamp.
    pub fn encode(&self) -> [u8; INPUT_EVENT_SIZE] {
        let mut out = [0u8; INPUT_EVENT_SIZE];
        out[TIMEVAL_SIZE..TIMEVAL_SIZE + 2].copy_from_slice(&self.kind.to_ne_bytes());
        out[TIMEVAL_SIZE + 2..TIMEVAL_SIZE + 4].copy_from_slice(&self.code.to_ne_bytes());
        out[TIMEVAL_SIZE + 4..].copy_from_slice(&self.value.to_ne_bytes());
        out
    }
}

/// `struct input_absinfo`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsInfo {
    pub value: i32,
    pub minimum: i32,
    pub maximum: i32,
    pub fuzz: i32,
    pub flat: i32,
    pub resolution: i32,
}

// ── framebuffer info ──────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FbBitfield {
    pub offset: u32,
    pub length: u32,
    pub msb_right: u32,
}

/// `struct fb_var_screeninfo`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FbVarScreeninfo {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    pub grayscale: u32,
    pub red: FbBitfield,
    pub green: FbBitfield,
    pub blue: FbBitfield,
    pub transp: FbBitfield,
    pub nonstd: u32,
    pub activate: u32,
    pub height: u32,
    pub width: u32,
    pub accel_flags: u32,
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    pub rotate: u32,
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

/// `struct fb_fix_screeninfo`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct FbFixScreeninfo {
    pub id: [u8; 16],
    pub smem_start: libc::c_ulong,
    pub smem_len: u32,
    pub kind: u32,
    pub type_aux: u32,
    pub visual: u32,
    pub xpanstep: u16,
    pub ypanstep: u16,
    pub ywrapstep: u16,
    pub line_length: u32,
    pub mmio_start: libc::c_ulong,
    pub mmio_len: u32,
    pub accel: u32,
    pub capabilities: u16,
    pub reserved: [u16; 2],
}

// ── file access ───────────────────────────────────────────────────────────────

/// Open a device node; errors carry the path.
pub fn open_device(path: &Path, flags: OFlags) -> Result<OwnedFd> {
    rustix::fs::open(path, flags | OFlags::CLOEXEC, Mode::empty()).map_err(|e| Error::DeviceOpen {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

/// Non-blocking read. `Ok(0)` when nothing is pending.
pub fn read_nonblocking(fd: BorrowedFd<'_>, buf: &mut [u8]) -> io::Result<usize> {
    match rustix::io::read(fd, buf) {
        Ok(n) => Ok(n),
        Err(rustix::io::Errno::AGAIN) | Err(rustix::io::Errno::INTR) => Ok(0),
        Err(e) => Err(e.into()),
    }
}

/// Issue a read-style ioctl filling `out`.
///
/// # Safety
/// `T` must match the kernel's layout for `request`.
unsafe fn ioctl_read<T>(fd: BorrowedFd<'_>, request: u32, out: &mut T) -> io::Result<()> {
    let rc = unsafe { libc::ioctl(fd.as_raw_fd(), request as _, out as *mut T) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

pub fn evdev_name(fd: BorrowedFd<'_>) -> io::Result<String> {
    let mut buf = [0u8; 256];
    unsafe { ioctl_read(fd, eviocgname(buf.len() as u32), &mut buf)? };
    let name = CStr::from_bytes_until_nul(&buf)
        .map(|c| c.to_string_lossy().into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(&buf).into_owned());
    Ok(name)
}

pub fn evdev_abs(fd: BorrowedFd<'_>, axis: u16) -> io::Result<AbsInfo> {
    let mut info = AbsInfo::default();
    unsafe { ioctl_read(fd, eviocgabs(axis), &mut info)? };
    Ok(info)
}

pub fn fb_var_info(fd: BorrowedFd<'_>) -> Result<FbVarScreeninfo> {
    let mut info = FbVarScreeninfo::default();
    unsafe { ioctl_read(fd, FBIOGET_VSCREENINFO, &mut info) }.map_err(|source| Error::Ioctl {
        what: "FBIOGET_VSCREENINFO",
        source,
    })?;
    Ok(info)
}

pub fn fb_fix_info(fd: BorrowedFd<'_>) -> Result<FbFixScreeninfo> {
    let mut info = FbFixScreeninfo::default();
    unsafe { ioctl_read(fd, FBIOGET_FSCREENINFO, &mut info) }.map_err(|source| Error::Ioctl {
        what: "FBIOGET_FSCREENINFO",
        source,
    })?;
    Ok(info)
}

// ── shared mapping ────────────────────────────────────────────────────────────

/// A read/write shared mapping, unmapped on drop.
pub struct MappedRegion {
    ptr: *mut u8,
    len: usize,
}

// The mapping is plain memory owned by this value.
unsafe impl Send for MappedRegion {}

impl MappedRegion {
    pub fn map(fd: BorrowedFd<'_>, len: usize) -> Result<Self> {
        if len == 0 {
            return Err(Error::Mmap(io::Error::new(io::ErrorKind::InvalidInput, "zero-length mapping")));
        }
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd.as_raw_fd(),
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(Error::Mmap(io::Error::last_os_error()));
        }
        Ok(Self {
            ptr: ptr as *mut u8,
            len,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.ptr as *mut libc::c_void, self.len);
        }
    }
}

// ── interface addresses ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfAddr {
    pub name: String,
    pub addr: Ipv4Addr,
    pub netmask: Option<Ipv4Addr>,
}

fn sockaddr_v4(sa: *const libc::sockaddr) -> Option<Ipv4Addr> {
    if sa.is_null() {
        return None;
    }
    unsafe {
        if (*sa).sa_family as libc::c_int != libc::AF_INET {
            return None;
        }
        let sin = &*(sa as *const libc::sockaddr_in);
        Some(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)))
    }
}

/// IPv4 addresses of all interfaces (`getifaddrs`).
pub fn ipv4_addrs() -> io::Result<Vec<IfAddr>> {
    let mut head: *mut libc::ifaddrs = std::ptr::null_mut();
    if unsafe { libc::getifaddrs(&mut head) } != 0 {
        return Err(io::Error::last_os_error());
    }
    let mut out = Vec::new();
    let mut cur = head;
    while !cur.is_null() {
        let ifa = unsafe { &*cur };
        if let Some(addr) = sockaddr_v4(ifa.ifa_addr) {
            let name = unsafe { CStr::from_ptr(ifa.ifa_name) }
                .to_string_lossy()
                .into_owned();
            out.push(IfAddr {
                name,
                addr,
                netmask: sockaddr_v4(ifa.ifa_netmask),
            });
        }
        cur = ifa.ifa_next;
    }
    unsafe { libc::freeifaddrs(head) };
    Ok(out)
}

// ── termination signals ───────────────────────────────────────────────────────

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn on_terminate(_sig: libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

/// Route SIGINT and SIGTERM to `shutdown_requested`.
pub fn install_termination_handlers() -> io::Result<()> {
    for sig in [libc::SIGINT, libc::SIGTERM] {
        let handler = on_terminate as extern "C" fn(libc::c_int) as libc::sighandler_t;
        if unsafe { libc::signal(sig, handler) } == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

pub fn shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

// ── tests ─────────────────────────────────────────────────────────────────────
