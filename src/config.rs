// config.rs — kiosk configuration
//
// Every `*.conf` file in the config directory is read in name order. Files
// hold `key = value` lines, optionally grouped in `section { }` blocks, and
// may pull in other files with `source = path`. Unknown keys and bad values
// are logged and skipped so a typo never keeps the panel dark.

use std::path::{Path, PathBuf};

use crate::pixelui::Color;
use crate::util::{resolve_path, strip_comment};

// ── types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub display: DisplayConfig,
    pub touch: TouchConfig,
    pub font: FontConfig,
    pub ui: UiConfig,
    pub services: ServicesConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Framebuffer,
    /// Desktop window, only available with the `preview` feature.
    Preview,
}

#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub backend: Backend,
    pub device: PathBuf,
    pub background: Color,
    pub frame_ms: u64,
    pub preview_scale: f64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Framebuffer,
            device: PathBuf::from("/dev/fb0"),
            background: Color::WHITE,
            frame_ms: 16,
            preview_scale: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TouchConfig {
    /// Explicit event node; discovery is skipped when set.
    pub device: Option<PathBuf>,
    pub name_hints: Vec<String>,
    pub swap_xy: bool,
    pub invert_x: bool,
    pub invert_y: bool,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            device: None,
            name_hints: crate::touch::evdev::DEFAULT_NAME_HINTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            swap_xy: false,
            invert_x: false,
            invert_y: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FontConfig {
    pub path: Option<PathBuf>,
    /// File-name needle for the system font search.
    pub search: String,
    pub medium: Option<PathBuf>,
    pub bold: Option<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: None,
            search: "DejaVuSans".into(),
            medium: None,
            bold: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub home: String,
    /// 0 disables the return-home timer.
    pub idle_timeout_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            home: "status".into(),
            idle_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServicesConfig {
    pub state_file: PathBuf,
    /// Interface sampled for the transfer rate; auto-detected when unset.
    pub uplink: Option<String>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            state_file: Config::config_dir().join("state.json"),
            uplink: None,
        }
    }
}

// ── loading ───────────────────────────────────────────────────────────────────

impl Config {
    pub fn load() -> Self {
        let dir = Self::config_dir();
        tracing::info!("Config dir: {}", dir.display());

        let mut paths: Vec<PathBuf> = match std::fs::read_dir(&dir) {
            Ok(rd) => rd
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("conf"))
                .collect(),
            Err(e) => {
                tracing::info!(
                    "Could not read config dir {}: {e}, using defaults",
                    dir.display()
                );
                return Config::default();
            }
        };
        paths.sort();

        let mut cfg = Config::default();
        if paths.is_empty() {
            tracing::info!("No .conf files in {}, using defaults", dir.display());
            return cfg;
        }

        for path in &paths {
            tracing::info!("Loading config: {}", path.display());
            let text = match std::fs::read_to_string(path) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!("Could not read {}: {e}", path.display());
                    continue;
                }
            };
            let mut stack = vec![path.canonicalize().unwrap_or_else(|_| path.clone())];
            if let Err(e) = parse_into(&text, path, &mut stack, &mut cfg) {
                tracing::warn!("Config error in {}: {e}", path.display());
            }
        }

        tracing::info!(
            "Config loaded: backend={:?} fb={} home={} idle={}s frame={}ms",
            cfg.display.backend,
            cfg.display.device.display(),
            cfg.ui.home,
            cfg.ui.idle_timeout_secs,
            cfg.display.frame_ms
        );
        cfg
    }

    pub fn config_dir() -> PathBuf {
        if let Ok(p) = std::env::var("KIOSK_UI_CONFIG_DIR") {
            return PathBuf::from(p);
        }
        let base = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                PathBuf::from(std::env::var("HOME").unwrap_or_default()).join(".config")
            });
        base.join("kiosk-ui")
    }
}

// ── parser ────────────────────────────────────────────────────────────────────

fn parse_into(
    text: &str,
    file: &Path,
    stack: &mut Vec<PathBuf>,
    cfg: &mut Config,
) -> Result<(), String> {
    let mut section_stack: Vec<String> = Vec::new();

    for (raw_no, raw_line) in text.lines().enumerate() {
        let lineno = raw_no + 1;
        let line = strip_comment(raw_line).trim();

        if line.is_empty() {
            continue;
        }

        if line.ends_with('{') {
            let name = line.trim_end_matches('{').trim().to_lowercase();
            section_stack.push(name);
            continue;
        }

        if line == "}" {
            section_stack
                .pop()
                .ok_or_else(|| format!("{}:{}: unexpected `}}`", file.display(), lineno))?;
            continue;
        }

        let (key, value) = split_kv(line).ok_or_else(|| {
            format!(
                "{}:{}: expected `key = value`, got `{line}`",
                file.display(),
                lineno
            )
        })?;

        let section = section_stack.last().map(String::as_str).unwrap_or("");

        if key == "source" && section.is_empty() {
            let path = resolve_path(value, file);
            if !path.exists() {
                tracing::warn!(
                    "{}:{}: source `{}` not found (skipping)",
                    file.display(),
                    lineno,
                    path.display()
                );
                continue;
            }
            let canon = path.canonicalize().unwrap_or_else(|_| path.clone());
            if stack.contains(&canon) {
                return Err(format!("circular source: {}", path.display()));
            }
            let text2 = std::fs::read_to_string(&path)
                .map_err(|e| format!("cannot read source `{}`: {e}", path.display()))?;
            stack.push(canon);
            parse_into(&text2, &path, stack, cfg)?;
            stack.pop();
            continue;
        }

        let at = Loc { file, lineno };
        match section {
            "display" => apply_display(key, value, at, &mut cfg.display, file),
            "touch" => apply_touch(key, value, at, &mut cfg.touch, file),
            "font" => apply_font(key, value, at, &mut cfg.font, file),
            "ui" => apply_ui(key, value, at, &mut cfg.ui),
            "services" => apply_services(key, value, at, &mut cfg.services, file),
            "" => tracing::warn!("{at}: `{key}` outside of a section"),
            other => tracing::warn!("{at}: unknown section `{other}`"),
        }
    }

    if !section_stack.is_empty() {
        return Err(format!(
            "{}: unclosed section(s): {}",
            file.display(),
            section_stack.join(" > ")
        ));
    }
    Ok(())
}

#[derive(Clone, Copy)]
struct Loc<'a> {
    file: &'a Path,
    lineno: usize,
}

impl std::fmt::Display for Loc<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.lineno)
    }
}

// ── section appliers ──────────────────────────────────────────────────────────

fn apply_display(key: &str, value: &str, at: Loc, d: &mut DisplayConfig, file: &Path) {
    match key {
        "backend" => match value.trim().to_lowercase().as_str() {
            "framebuffer" | "fb" => d.backend = Backend::Framebuffer,
            "preview" | "window" => d.backend = Backend::Preview,
            _ => tracing::warn!("{at}: bad backend `{value}`"),
        },
        "device" => d.device = resolve_path(value, file),
        "background" => match Color::from_hex(value) {
            Some(c) => d.background = c,
            None => tracing::warn!("{at}: bad background `{value}`"),
        },
        "frame_ms" => match value.trim().parse::<u64>() {
            Ok(n) if n > 0 => d.frame_ms = n,
            _ => tracing::warn!("{at}: bad frame_ms `{value}`"),
        },
        "preview_scale" => match value.trim().parse::<f64>() {
            Ok(s) if s > 0.0 && s.is_finite() => d.preview_scale = s,
            _ => tracing::warn!("{at}: bad preview_scale `{value}`"),
        },
        _ => tracing::warn!("{at}: unknown display.{key}"),
    }
}

fn apply_touch(key: &str, value: &str, at: Loc, t: &mut TouchConfig, file: &Path) {
    let flag = |slot: &mut bool| match parse_bool(value) {
        Some(b) => *slot = b,
        None => tracing::warn!("{at}: bad bool `{value}`"),
    };
    match key {
        "device" => t.device = Some(resolve_path(value, file)),
        "name_hints" => {
            let hints: Vec<String> = value
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            if hints.is_empty() {
                tracing::warn!("{at}: name_hints is empty, keeping defaults");
            } else {
                t.name_hints = hints;
            }
        }
        "swap_xy" => flag(&mut t.swap_xy),
        "invert_x" => flag(&mut t.invert_x),
        "invert_y" => flag(&mut t.invert_y),
        _ => tracing::warn!("{at}: unknown touch.{key}"),
    }
}

fn apply_font(key: &str, value: &str, at: Loc, f: &mut FontConfig, file: &Path) {
    match key {
        "path" => f.path = Some(resolve_path(value, file)),
        "search" => f.search = value.trim().to_string(),
        "medium" => f.medium = Some(resolve_path(value, file)),
        "bold" => f.bold = Some(resolve_path(value, file)),
        _ => tracing::warn!("{at}: unknown font.{key}"),
    }
}

fn apply_ui(key: &str, value: &str, at: Loc, u: &mut UiConfig) {
    match key {
        "home" => {
            let name = value.trim();
            if name.is_empty() {
                tracing::warn!("{at}: empty home page");
            } else {
                u.home = name.to_string();
            }
        }
        "idle_timeout_secs" | "idle_timeout" => match value.trim().parse::<u64>() {
            Ok(n) => u.idle_timeout_secs = n,
            Err(_) => tracing::warn!("{at}: bad idle_timeout_secs `{value}`"),
        },
        _ => tracing::warn!("{at}: unknown ui.{key}"),
    }
}

fn apply_services(key: &str, value: &str, at: Loc, s: &mut ServicesConfig, file: &Path) {
    match key {
        "state_file" => s.state_file = resolve_path(value, file),
        "uplink" => {
            let iface = value.trim();
            s.uplink = (!iface.is_empty() && iface != "auto").then(|| iface.to_string());
        }
        _ => tracing::warn!("{at}: unknown services.{key}"),
    }
}

// ── primitive parsers ─────────────────────────────────────────────────────────

fn split_kv(line: &str) -> Option<(&str, &str)> {
    line.find('=')
        .map(|i| (line[..i].trim(), line[i + 1..].trim()))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────
