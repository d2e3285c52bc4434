//! The LCD screen, through the Linux framebuffer.
//!
//! Drawing happens off-screen on a [`Canvas`], which implements the `embedded-graphics`
//! [`DrawTarget`] trait. [`Screen::update`] then converts the canvas to the pixel format of
//! the framebuffer and copies it to the mapped video memory in one go.
//!
//! Two framebuffer formats are supported: 1 bit per pixel (the EV3 LCD) and 16 bits per pixel
//! RGB565 (BrickPi with an attached display).
//!
//! ```no_run
//! use embedded_graphics_core::{pixelcolor::Rgb888, prelude::*};
//! use ev3dev_devices::display::Screen;
//!
//! let mut screen = Screen::new().unwrap();
//! screen.canvas_mut().draw_iter([Pixel(Point::new(10, 10), Rgb888::BLACK)]).unwrap();
//! screen.update().unwrap();
//! ```

use std::{
    convert::Infallible,
    fs::{File, OpenOptions},
    io::{self, Write},
    os::unix::io::AsRawFd,
    path::{Path, PathBuf},
    ptr::{self, NonNull},
    slice,
};

use bytemuck::Zeroable;
use embedded_graphics_core::{pixelcolor::Rgb888, prelude::*, primitives::Rectangle};
use ev3dev_core::config;
use rgb::RGB8;
use snafu::{ResultExt, Snafu, ensure};
use tracing::debug;

const FBIOGET_VSCREENINFO: u64 = 0x4600;
const FBIOGET_FSCREENINFO: u64 = 0x4602;

/// Errors that can occur when using the framebuffer.
#[derive(Debug, Snafu)]
pub enum DisplayError {
    /// The framebuffer device could not be opened.
    #[snafu(display("Could not open framebuffer {}: {source}", path.display()))]
    Open {
        /// The framebuffer device
        path: PathBuf,
        /// The underlying I/O error
        source: io::Error,
    },

    /// The screen information could not be queried.
    #[snafu(display("Could not query screen info of {}: {source}", path.display()))]
    ScreenInfo {
        /// The framebuffer device
        path: PathBuf,
        /// The underlying I/O error
        source: io::Error,
    },

    /// The video memory could not be mapped.
    #[snafu(display("Could not map video memory of {}: {source}", path.display()))]
    Map {
        /// The framebuffer device
        path: PathBuf,
        /// The underlying I/O error
        source: io::Error,
    },

    /// The framebuffer uses a pixel format the screen cannot render to.
    #[snafu(display("Unsupported framebuffer depth of {bits} bits per pixel"))]
    UnsupportedDepth {
        /// Bits per pixel reported by the driver
        bits: u32,
    },
}

/// `struct fb_fix_screeninfo` from `linux/fb.h`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Zeroable)]
pub struct FixScreenInfo {
    /// Identification string.
    pub id: [u8; 16],
    /// Physical start address of the video memory.
    pub smem_start: libc::c_ulong,
    /// Length of the video memory.
    pub smem_len: u32,
    /// Framebuffer type.
    pub fb_type: u32,
    /// Interleave for interleaved planes.
    pub type_aux: u32,
    /// Visual type.
    pub visual: u32,
    /// Horizontal hardware panning step.
    pub xpanstep: u16,
    /// Vertical hardware panning step.
    pub ypanstep: u16,
    /// Vertical hardware wrapping step.
    pub ywrapstep: u16,
    /// Length of a line in bytes.
    pub line_length: u32,
    /// Physical start address of the memory mapped I/O.
    pub mmio_start: libc::c_ulong,
    /// Length of the memory mapped I/O.
    pub mmio_len: u32,
    /// Acceleration chip.
    pub accel: u32,
    /// Capability flags.
    pub capabilities: u16,
    /// Reserved.
    pub reserved: [u16; 2],
}

/// `struct fb_bitfield` from `linux/fb.h`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Zeroable)]
pub struct Bitfield {
    /// Beginning of the bitfield.
    pub offset: u32,
    /// Length of the bitfield.
    pub length: u32,
    /// Whether the most significant bit is on the right.
    pub msb_right: u32,
}

/// `struct fb_var_screeninfo` from `linux/fb.h`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Zeroable)]
pub struct VarScreenInfo {
    /// Visible horizontal resolution.
    pub xres: u32,
    /// Visible vertical resolution.
    pub yres: u32,
    /// Virtual horizontal resolution.
    pub xres_virtual: u32,
    /// Virtual vertical resolution.
    pub yres_virtual: u32,
    /// Horizontal offset from virtual to visible.
    pub xoffset: u32,
    /// Vertical offset from virtual to visible.
    pub yoffset: u32,
    /// Bits per pixel.
    pub bits_per_pixel: u32,
    /// Non-zero for grayscale.
    pub grayscale: u32,
    /// Red channel layout.
    pub red: Bitfield,
    /// Green channel layout.
    pub green: Bitfield,
    /// Blue channel layout.
    pub blue: Bitfield,
    /// Transparency channel layout.
    pub transp: Bitfield,
    /// Non-standard pixel format.
    pub nonstd: u32,
    /// Activation flags.
    pub activate: u32,
    /// Height of the picture in mm.
    pub height: u32,
    /// Width of the picture in mm.
    pub width: u32,
    /// Obsolete acceleration flags.
    pub accel_flags: u32,
    /// Pixel clock in ps.
    pub pixclock: u32,
    /// Time from sync to picture.
    pub left_margin: u32,
    /// Time from picture to sync.
    pub right_margin: u32,
    /// Time from sync to picture.
    pub upper_margin: u32,
    /// Time from picture to sync.
    pub lower_margin: u32,
    /// Length of horizontal sync.
    pub hsync_len: u32,
    /// Length of vertical sync.
    pub vsync_len: u32,
    /// Sync flags.
    pub sync: u32,
    /// Video mode flags.
    pub vmode: u32,
    /// Angle of counter-clockwise rotation.
    pub rotate: u32,
    /// Colorspace for FOURCC-based modes.
    pub colorspace: u32,
    /// Reserved.
    pub reserved: [u32; 4],
}

/// An open framebuffer device with its video memory mapped.
#[derive(Debug)]
pub struct Framebuffer {
    path: PathBuf,
    _file: File,
    fix: FixScreenInfo,
    var: VarScreenInfo,
    memory: NonNull<u8>,
    len: usize,
}

// SAFETY: the mapping is owned exclusively by this value and unmapped on drop.
unsafe impl Send for Framebuffer {}

impl Framebuffer {
    /// Opens the framebuffer named by the `FRAMEBUFFER` environment variable, or `/dev/fb0`.
    ///
    /// # Errors
    ///
    /// See [`Framebuffer::open`].
    pub fn open_default() -> Result<Self, DisplayError> {
        Self::open(config::framebuffer_path())
    }

    /// Opens a framebuffer device and maps its video memory.
    ///
    /// # Errors
    ///
    /// A [`DisplayError`] is returned if the device cannot be opened, queried or mapped.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DisplayError> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .context(OpenSnafu { path: &path })?;

        let mut fix = FixScreenInfo::zeroed();
        let mut var = VarScreenInfo::zeroed();

        // SAFETY: both requests fill a structure of exactly the type passed.
        unsafe {
            if libc::ioctl(file.as_raw_fd(), FBIOGET_FSCREENINFO as _, ptr::addr_of_mut!(fix)) < 0 {
                return Err(io::Error::last_os_error()).context(ScreenInfoSnafu { path: &path });
            }
            if libc::ioctl(file.as_raw_fd(), FBIOGET_VSCREENINFO as _, ptr::addr_of_mut!(var)) < 0 {
                return Err(io::Error::last_os_error()).context(ScreenInfoSnafu { path: &path });
            }
        }

        let len = fix.smem_len as usize;

        // SAFETY: mapping a fresh region; the kernel validates the length and descriptor.
        let memory = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        if memory == libc::MAP_FAILED {
            return Err(io::Error::last_os_error()).context(MapSnafu { path: &path });
        }
        let Some(memory) = NonNull::new(memory.cast::<u8>()) else {
            return Err(io::Error::from(io::ErrorKind::InvalidData)).context(MapSnafu { path: &path });
        };

        debug!(
            path = %path.display(),
            xres = var.xres,
            yres = var.yres,
            bits_per_pixel = var.bits_per_pixel,
            line_length = fix.line_length,
            "mapped framebuffer"
        );

        Ok(Self {
            path,
            _file: file,
            fix,
            var,
            memory,
            len,
        })
    }

    /// The framebuffer device.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The fixed screen information.
    #[must_use]
    pub const fn fix_info(&self) -> &FixScreenInfo {
        &self.fix
    }

    /// The variable screen information.
    #[must_use]
    pub const fn var_info(&self) -> &VarScreenInfo {
        &self.var
    }

    /// The mapped video memory.
    pub fn memory_mut(&mut self) -> &mut [u8] {
        // SAFETY: the mapping is `len` bytes long, writable, and lives as long as `self`.
        unsafe { slice::from_raw_parts_mut(self.memory.as_ptr(), self.len) }
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        // SAFETY: the region was mapped in `open` with this length and is not used afterwards.
        unsafe {
            libc::munmap(self.memory.as_ptr().cast(), self.len);
        }
    }
}

/// Packs an RGB color into RGB565.
#[must_use]
pub const fn color565(color: RGB8) -> u16 {
    ((color.r as u16 & 0xF8) << 8) | ((color.g as u16 & 0xFC) << 3) | (color.b as u16 >> 3)
}

/// Determines whether a color is drawn as a set pixel on a monochrome screen.
#[must_use]
pub const fn is_dark(color: RGB8) -> bool {
    let luma = (color.r as u32 * 299 + color.g as u32 * 587 + color.b as u32 * 114) / 1000;
    luma < 128
}

/// An off-screen image the size of the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<RGB8>,
}

impl Canvas {
    /// Creates a white canvas.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![RGB8::new(0xFF, 0xFF, 0xFF); width as usize * height as usize],
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Fills the canvas with white.
    pub fn clear(&mut self) {
        self.pixels.fill(RGB8::new(0xFF, 0xFF, 0xFF));
    }

    /// Returns the color at a position, or `None` outside the canvas.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<RGB8> {
        (x < self.width && y < self.height)
            .then(|| self.pixels[y as usize * self.width as usize + x as usize])
    }

    /// Sets the color at a position. Positions outside the canvas are ignored.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: RGB8) {
        if x < self.width && y < self.height {
            self.pixels[y as usize * self.width as usize + x as usize] = color;
        }
    }

    /// Renders the canvas as a 1 bit per pixel bitmap with `line_length` bytes per row.
    ///
    /// Dark pixels are set bits, the leftmost pixel of a byte is its least significant bit.
    #[must_use]
    pub fn to_mono(&self, line_length: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; line_length * self.height as usize];
        if self.width == 0 {
            return bytes;
        }
        for (y, row) in self.pixels.chunks_exact(self.width as usize).enumerate() {
            for (x, &color) in row.iter().enumerate() {
                if is_dark(color) && x / 8 < line_length {
                    bytes[y * line_length + x / 8] |= 1 << (x % 8);
                }
            }
        }
        bytes
    }

    /// Renders the canvas as RGB565 pixels.
    #[must_use]
    pub fn to_rgb565(&self) -> Vec<u16> {
        self.pixels.iter().map(|&color| color565(color)).collect()
    }
}

impl Dimensions for Canvas {
    fn bounding_box(&self) -> Rectangle {
        Rectangle::new(Point::new(0, 0), Size::new(self.width, self.height))
    }
}

impl DrawTarget for Canvas {
    type Color = Rgb888;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                self.set_pixel(x, y, RGB8::new(color.r(), color.g(), color.b()));
            }
        }
        Ok(())
    }
}

/// The screen: a framebuffer and the canvas drawn onto it.
#[derive(Debug)]
pub struct Screen {
    framebuffer: Framebuffer,
    canvas: Canvas,
}

impl Screen {
    /// Opens the default framebuffer.
    ///
    /// # Errors
    ///
    /// See [`Framebuffer::open`] and [`Screen::with_framebuffer`].
    pub fn new() -> Result<Self, DisplayError> {
        Self::with_framebuffer(Framebuffer::open_default()?)
    }

    /// Creates a screen over an open framebuffer.
    ///
    /// The canvas is `line_length * 8 / bits_per_pixel` pixels wide, which can exceed the
    /// visible resolution.
    ///
    /// # Errors
    ///
    /// A [`DisplayError::UnsupportedDepth`] error is returned unless the framebuffer uses 1 or
    /// 16 bits per pixel.
    pub fn with_framebuffer(framebuffer: Framebuffer) -> Result<Self, DisplayError> {
        let bits = framebuffer.var.bits_per_pixel;
        ensure!(bits == 1 || bits == 16, UnsupportedDepthSnafu { bits });

        let width = framebuffer.fix.line_length * 8 / bits;
        let canvas = Canvas::new(width, framebuffer.var.yres);
        Ok(Self {
            framebuffer,
            canvas,
        })
    }

    /// Visible horizontal resolution.
    #[must_use]
    pub const fn xres(&self) -> u32 {
        self.framebuffer.var.xres
    }

    /// Visible vertical resolution.
    #[must_use]
    pub const fn yres(&self) -> u32 {
        self.framebuffer.var.yres
    }

    /// Visible resolution as `(width, height)`.
    #[must_use]
    pub const fn shape(&self) -> (u32, u32) {
        (self.xres(), self.yres())
    }

    /// The canvas drawn by [`Screen::update`].
    #[must_use]
    pub const fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// The canvas, for drawing.
    pub const fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Fills the canvas with white. The screen changes on the next [`Screen::update`].
    pub fn clear(&mut self) {
        self.canvas.clear();
    }

    /// Copies the canvas to the framebuffer.
    ///
    /// # Errors
    ///
    /// A [`DisplayError::UnsupportedDepth`] error is returned if the depth changed since the
    /// screen was created.
    pub fn update(&mut self) -> Result<(), DisplayError> {
        let line_length = self.framebuffer.fix.line_length as usize;
        let bits = self.framebuffer.var.bits_per_pixel;

        match bits {
            1 => {
                let bytes = self.canvas.to_mono(line_length);
                copy_prefix(self.framebuffer.memory_mut(), &bytes);
            }
            16 => {
                let pixels = self.canvas.to_rgb565();
                copy_prefix(self.framebuffer.memory_mut(), bytemuck::cast_slice(&pixels));
            }
            bits => return UnsupportedDepthSnafu { bits }.fail(),
        }

        Ok(())
    }
}

impl Dimensions for Screen {
    fn bounding_box(&self) -> Rectangle {
        self.canvas.bounding_box()
    }
}

impl DrawTarget for Screen {
    type Color = Rgb888;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.canvas.draw_iter(pixels)
    }
}

fn copy_prefix(destination: &mut [u8], source: &[u8]) {
    let len = destination.len().min(source.len());
    destination[..len].copy_from_slice(&source[..len]);
}

/// Hides the blinking console cursor.
///
/// # Errors
///
/// Errors from writing to standard output are returned.
pub fn hide_cursor() -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(b"\x1b[?25l")?;
    stdout.flush()
}

/// Shows the console cursor again.
///
/// # Errors
///
/// Errors from writing to standard output are returned.
pub fn show_cursor() -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(b"\x1b[?25h")?;
    stdout.flush()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rgb565_packing() {
        assert_eq!(color565(RGB8::new(0xFF, 0xFF, 0xFF)), 0xFFFF);
        assert_eq!(color565(RGB8::new(0xFF, 0, 0)), 0xF800);
        assert_eq!(color565(RGB8::new(0, 0xFF, 0)), 0x07E0);
        assert_eq!(color565(RGB8::new(0, 0, 0xFF)), 0x001F);
    }

    #[test]
    fn canvas_starts_white() {
        let canvas = Canvas::new(178, 128);
        assert_eq!(canvas.pixel(0, 0), Some(RGB8::new(0xFF, 0xFF, 0xFF)));
        assert_eq!(canvas.pixel(178, 0), None);
        assert!(canvas.to_mono(24).iter().all(|&byte| byte == 0));
    }

    #[test]
    fn mono_bits_are_lsb_first() {
        let mut canvas = Canvas::new(16, 2);
        canvas
            .draw_iter([
                Pixel(Point::new(0, 0), Rgb888::BLACK),
                Pixel(Point::new(9, 0), Rgb888::BLACK),
                Pixel(Point::new(7, 1), Rgb888::new(40, 40, 40)),
                Pixel(Point::new(3, 1), Rgb888::new(200, 200, 200)),
                Pixel(Point::new(-1, 0), Rgb888::BLACK),
                Pixel(Point::new(50, 50), Rgb888::BLACK),
            ])
            .unwrap();

        assert_eq!(canvas.to_mono(2), [0b0000_0001, 0b0000_0010, 0b1000_0000, 0]);
        assert_eq!(canvas.to_mono(3), [1, 2, 0, 0x80, 0, 0]);
    }

    #[test]
    fn empty_canvas() {
        let canvas = Canvas::new(0, 4);
        assert_eq!(canvas.to_mono(1), [0; 4]);
        assert!(canvas.to_rgb565().is_empty());
        assert_eq!(canvas.pixel(0, 0), None);
    }

    #[test]
    fn clear_restores_white() {
        let mut canvas = Canvas::new(4, 4);
        canvas.set_pixel(1, 1, RGB8::new(0, 0, 0));
        canvas.clear();
        assert_eq!(canvas, Canvas::new(4, 4));
        assert_eq!(canvas.to_rgb565(), [0xFFFF; 16]);
    }

    #[test]
    fn missing_framebuffer() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Framebuffer::open(dir.path().join("fb7")),
            Err(DisplayError::Open { .. })
        ));
    }
}
