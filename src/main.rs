// main.rs — kiosk-ui entry point

use std::process::ExitCode;

use kiosk_ui::app::App;
use kiosk_ui::config::Config;
use kiosk_ui::display;
use kiosk_ui::font::FontSet;
use kiosk_ui::nav::Navigation;
use kiosk_ui::pages;
use kiosk_ui::services::LocalServices;
use kiosk_ui::sys;
use kiosk_ui::touch::evdev::EvdevTouch;
use kiosk_ui::touch::TouchSource;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> kiosk_ui::Result<()> {
    let config = Config::load();

    if let Err(e) = sys::install_termination_handlers() {
        tracing::warn!("Signal handlers not installed: {e}");
    }

    let fonts = FontSet::load(&config.font);
    let display = display::open(&config.display)?;

    // The preview window delivers mouse input itself; on the panel a missing
    // touch controller is not fatal, the UI just stays read-only.
    let touch: Option<Box<dyn TouchSource>> = match config.display.backend {
        kiosk_ui::config::Backend::Preview => None,
        kiosk_ui::config::Backend::Framebuffer => match EvdevTouch::open(&config.touch) {
            Ok(t) => Some(Box::new(t)),
            Err(e) => {
                tracing::warn!("Touch input unavailable: {e}");
                None
            }
        },
    };

    let mut services = Box::new(LocalServices::open(&config.services));
    let mut nav = Navigation::new(&config.ui.home, config.ui.idle_timeout_secs);
    pages::register_all(&mut nav);
    nav.navigate_to(&config.ui.home, services.as_mut())?;

    let mut app = App::new(display, services, nav, fonts, &config.display);
    if let Some(t) = touch {
        app = app.with_touch(t);
    }
    app.run()
}
