// app.rs — the render/input loop
//
// One thread, one loop: poll → tick → clear + render → present → dispatch
// touches → sleep. Pages run their side effects inside `tick` and
// `handle_touch`; navigation they request is applied right after each step.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::DisplayConfig;
use crate::display::{Display, DisplayEvent};
use crate::error::Result;
use crate::font::FontSet;
use crate::nav::Navigation;
use crate::pixelui::{Color, Painter};
use crate::services::Services;
use crate::sys;
use crate::touch::{TouchEvent, TouchSource};

pub struct App<D: Display> {
    display: D,
    touch: Option<Box<dyn TouchSource>>,
    services: Box<dyn Services>,
    nav: Navigation,
    fonts: FontSet,
    background: Color,
    frame: Duration,
    running: Arc<AtomicBool>,
    last_tick: Instant,
}

impl<D: Display> App<D> {
    pub fn new(
        display: D,
        services: Box<dyn Services>,
        nav: Navigation,
        fonts: FontSet,
        cfg: &DisplayConfig,
    ) -> Self {
        Self {
            display,
            touch: None,
            services,
            nav,
            fonts,
            background: cfg.background,
            frame: Duration::from_millis(cfg.frame_ms),
            running: Arc::new(AtomicBool::new(true)),
            last_tick: Instant::now(),
        }
    }

    pub fn with_touch(mut self, source: Box<dyn TouchSource>) -> Self {
        self.touch = Some(source);
        self
    }

    /// Clearing the flag stops `run` after the current iteration.
    pub fn running(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn navigation(&self) -> &Navigation {
        &self.nav
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn run(&mut self) -> Result<()> {
        let (w, h) = self.display.size();
        tracing::info!(
            "UI loop started: {w}x{h}, {} ms/frame, page {}",
            self.frame.as_millis(),
            self.nav.current().unwrap_or("-")
        );
        self.last_tick = Instant::now();

        while self.running.load(Ordering::SeqCst) {
            if sys::shutdown_requested() {
                tracing::info!("Termination signal received");
                self.running.store(false, Ordering::SeqCst);
                break;
            }
            self.step()?;
            if self.running.load(Ordering::SeqCst) && !self.frame.is_zero() {
                std::thread::sleep(self.frame);
            }
        }
        tracing::info!("UI loop stopped");
        Ok(())
    }

    /// One loop iteration without the trailing sleep.
    pub fn step(&mut self) -> Result<()> {
        let mut touches = Vec::new();
        for ev in self.display.poll_events() {
            match ev {
                DisplayEvent::Quit => {
                    tracing::info!("Quit requested by display");
                    self.running.store(false, Ordering::SeqCst);
                    return Ok(());
                }
                DisplayEvent::Touch(t) => touches.push(t),
            }
        }

        let now = Instant::now();
        let delta_ms = now.duration_since(self.last_tick).as_millis() as u64;
        self.last_tick = now;
        self.nav.tick(delta_ms, self.services.as_mut());
        self.nav.apply_requests(self.services.as_mut());

        self.render();
        self.display.present()?;

        if let Some(src) = self.touch.as_mut() {
            touches.extend(src.poll());
        }
        for ev in &touches {
            self.dispatch(ev);
        }
        Ok(())
    }

    fn render(&mut self) {
        let mut p = Painter::new(self.display.back_buffer(), &self.fonts);
        p.clear(self.background);
        self.nav.render(&mut p);
    }

    /// Deliver one touch and apply the navigation it caused, so the next
    /// event already reaches the new page.
    fn dispatch(&mut self, ev: &TouchEvent) {
        let handled = self.nav.handle_touch(ev, self.services.as_mut());
        tracing::trace!("touch {:?} at {},{} handled={handled}", ev.kind, ev.x, ev.y);
        self.nav.apply_requests(self.services.as_mut());
    }
}
