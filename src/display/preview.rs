// display/preview.rs — desktop window standing in for the panel
//
// Built with `--features preview`. The window is 480×scale physical pixels;
// the mouse plays the finger. Events are pumped without blocking once per
// frame so the render loop stays in charge of timing.

use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Duration;

use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowId};

use crate::error::{Error, Result};
use crate::pixelui::{LOGICAL_H, LOGICAL_W};
use crate::surface::PixelSurface;
use crate::touch::TouchEvent;

use super::{Display, DisplayEvent};

type Surface = softbuffer::Surface<Rc<Window>, Rc<Window>>;

struct PreviewApp {
    size: PhysicalSize<u32>,
    window: Option<Rc<Window>>,
    context: Option<softbuffer::Context<Rc<Window>>>,
    surface: Option<Surface>,
    init_error: Option<String>,
    cursor: PhysicalPosition<f64>,
    pressed: bool,
    events: Vec<DisplayEvent>,
}

impl PreviewApp {
    /// Physical cursor → logical 480×480 point.
    fn logical(&self) -> (i32, i32) {
        let sx = LOGICAL_W as f64 / self.size.width as f64;
        let sy = LOGICAL_H as f64 / self.size.height as f64;
        let x = (self.cursor.x * sx).round() as i32;
        let y = (self.cursor.y * sy).round() as i32;
        (x.clamp(0, LOGICAL_W - 1), y.clamp(0, LOGICAL_H - 1))
    }

    fn touch(&mut self, ev: fn(i32, i32) -> TouchEvent) {
        let (x, y) = self.logical();
        self.events.push(DisplayEvent::Touch(ev(x, y)));
    }

    fn create(&mut self, event_loop: &ActiveEventLoop) -> std::result::Result<(), String> {
        let attrs = Window::default_attributes()
            .with_title("kiosk-ui preview")
            .with_inner_size(self.size)
            .with_resizable(false);
        let window = Rc::new(event_loop.create_window(attrs).map_err(|e| e.to_string())?);
        let context = softbuffer::Context::new(window.clone()).map_err(|e| e.to_string())?;
        let mut surface = Surface::new(&context, window.clone()).map_err(|e| e.to_string())?;
        let (w, h) = nonzero(self.size)?;
        surface.resize(w, h).map_err(|e| e.to_string())?;
        self.surface = Some(surface);
        self.context = Some(context);
        self.window = Some(window);
        Ok(())
    }
}

fn nonzero(size: PhysicalSize<u32>) -> std::result::Result<(NonZeroU32, NonZeroU32), String> {
    match (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(format!("degenerate window size {}x{}", size.width, size.height)),
    }
}

impl ApplicationHandler for PreviewApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create(event_loop) {
            self.init_error = Some(e);
            self.events.push(DisplayEvent::Quit);
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.events.push(DisplayEvent::Quit),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.events.push(DisplayEvent::Quit),
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = position;
                if self.pressed {
                    self.touch(TouchEvent::moved);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed if !self.pressed => {
                    self.pressed = true;
                    self.touch(TouchEvent::down);
                }
                ElementState::Released if self.pressed => {
                    self.pressed = false;
                    self.touch(TouchEvent::up);
                }
                _ => {}
            },
            _ => {}
        }
    }
}

pub struct PreviewDisplay {
    event_loop: EventLoop<()>,
    app: PreviewApp,
    back: PixelSurface,
}

impl PreviewDisplay {
    pub fn open(scale: f64) -> Result<Self> {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let w = (LOGICAL_W as f64 * scale).round() as u32;
        let h = (LOGICAL_H as f64 * scale).round() as u32;

        let event_loop = EventLoop::new().map_err(|e| Error::Window(e.to_string()))?;
        let mut display = Self {
            event_loop,
            app: PreviewApp {
                size: PhysicalSize::new(w, h),
                window: None,
                context: None,
                surface: None,
                init_error: None,
                cursor: PhysicalPosition::new(0.0, 0.0),
                pressed: false,
                events: Vec::new(),
            },
            back: PixelSurface::new(w, h),
        };

        // the window is created on the first resume
        display.pump();
        if let Some(e) = display.app.init_error.take() {
            return Err(Error::Window(e));
        }
        tracing::info!("Preview window {w}x{h} (scale {scale})");
        Ok(display)
    }

    fn pump(&mut self) -> PumpStatus {
        self.event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.app)
    }
}

impl Display for PreviewDisplay {
    fn size(&self) -> (u32, u32) {
        (self.back.width(), self.back.height())
    }

    fn back_buffer(&mut self) -> &mut PixelSurface {
        &mut self.back
    }

    fn present(&mut self) -> Result<()> {
        let Some(surface) = self.app.surface.as_mut() else {
            return Err(Error::Present("preview window not created".into()));
        };
        let mut buf = surface.buffer_mut().map_err(|e| Error::Present(e.to_string()))?;
        for (dst, px) in buf.iter_mut().zip(self.back.as_bytes().chunks_exact(4)) {
            *dst = (px[0] as u32) << 16 | (px[1] as u32) << 8 | px[2] as u32;
        }
        buf.present().map_err(|e| Error::Present(e.to_string()))
    }

    fn poll_events(&mut self) -> Vec<DisplayEvent> {
        if let PumpStatus::Exit(code) = self.pump() {
            tracing::debug!("preview event loop exited ({code})");
            self.app.events.push(DisplayEvent::Quit);
        }
        std::mem::take(&mut self.app.events)
    }
}
