// util.rs — path, comment, color and font-search helpers

use std::path::{Path, PathBuf};

// ── Path helpers ──────────────────────────────────────────────────────────────

pub fn expand_tilde(s: &str) -> String {
    match s.strip_prefix('~') {
        Some(rest) => {
            let home = std::env::var("HOME").unwrap_or_default();
            format!("{home}{rest}")
        }
        None => s.to_owned(),
    }
}

/// Absolute paths pass through; relative ones are taken from the directory
/// of `relative_to`.
pub fn resolve_path(value: &str, relative_to: &Path) -> PathBuf {
    let p = PathBuf::from(expand_tilde(value.trim()));
    if p.is_absolute() {
        p
    } else {
        relative_to.parent().unwrap_or(Path::new(".")).join(p)
    }
}

// ── Comment stripper ──────────────────────────────────────────────────────────
//
// A `#` starts a comment when it is at column 0 or follows whitespace. The
// exception is the first token of a value, so `background = #1E1E2E` keeps
// its color.

pub fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let starts_comment = |i: usize| i == 0 || bytes[i - 1].is_ascii_whitespace();

    let Some(eq_pos) = line.find('=') else {
        return bytes
            .iter()
            .enumerate()
            .find(|&(i, &b)| b == b'#' && starts_comment(i))
            .map_or(line, |(i, _)| &line[..i]);
    };

    if let Some(i) = (0..eq_pos).find(|&i| bytes[i] == b'#' && starts_comment(i)) {
        return &line[..i];
    }

    let mut seen_value = false;
    for i in eq_pos + 1..bytes.len() {
        match bytes[i] {
            b'#' if !seen_value => seen_value = true,
            b'#' if starts_comment(i) => return &line[..i],
            b if b.is_ascii_whitespace() => {}
            _ => seen_value = true,
        }
    }
    line
}

// ── Hex colors ────────────────────────────────────────────────────────────────

/// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
pub fn hex_rgba(s: &str) -> Option<[u8; 4]> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return None;
    }
    let p = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
    match s.len() {
        6 => Some([p(0)?, p(2)?, p(4)?, 0xFF]),
        8 => Some([p(0)?, p(2)?, p(4)?, p(6)?]),
        _ => None,
    }
}

// ── Font search ───────────────────────────────────────────────────────────────

/// First file under the usual font roots whose name contains `needle`
/// (case-insensitive). An empty needle never matches.
pub fn find_font(needle: &str) -> Option<PathBuf> {
    if needle.trim().is_empty() {
        return None;
    }
    let home = std::env::var("HOME").unwrap_or_default();
    let roots = [
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from(format!("{home}/.local/share/fonts")),
        PathBuf::from(format!("{home}/.fonts")),
    ];
    let needle = needle.to_lowercase();
    roots.iter().find_map(|root| walk_fonts(root, &needle))
}

fn walk_fonts(dir: &Path, needle: &str) -> Option<PathBuf> {
    let rd = std::fs::read_dir(dir).ok()?;
    let mut entries: Vec<PathBuf> = rd.flatten().map(|e| e.path()).collect();
    entries.sort();

    let mut subdirs = Vec::new();
    for path in entries {
        if path.is_dir() {
            subdirs.push(path);
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let lower = name.to_lowercase();
        let is_font = lower.ends_with(".ttf") || lower.ends_with(".otf");
        if is_font && lower.contains(needle) {
            tracing::info!("Font search: found '{needle}' at {}", path.display());
            return Some(path);
        }
    }
    subdirs.iter().find_map(|sub| walk_fonts(sub, needle))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_hex_colour_untouched() {
        assert_eq!(strip_comment("background = #1E1E2E"), "background = #1E1E2E");
    }

    #[test]
    fn strip_trailing_comment() {
        assert_eq!(strip_comment("frame_ms = 16  # 60 Hz"), "frame_ms = 16  ");
    }

    #[test]
    fn strip_hex_with_trailing_comment() {
        assert_eq!(
            strip_comment("background = #1E1E2E # light grey"),
            "background = #1E1E2E "
        );
    }

    #[test]
    fn strip_whole_line_and_section_comments() {
        assert_eq!(strip_comment("# just a note"), "");
        assert_eq!(strip_comment("display { # panel"), "display { ");
    }

    #[test]
    fn expand_tilde_home() {
        std::env::set_var("HOME", "/home/user");
        assert_eq!(expand_tilde("~/.config"), "/home/user/.config");
        assert_eq!(expand_tilde("/absolute"), "/absolute");
    }

    #[test]
    fn resolve_relative_to_file() {
        assert_eq!(
            resolve_path("fonts/a.ttf", Path::new("/etc/kiosk-ui/main.conf")),
            PathBuf::from("/etc/kiosk-ui/fonts/a.ttf")
        );
        assert_eq!(
            resolve_path("/dev/fb0", Path::new("/etc/kiosk-ui/main.conf")),
            PathBuf::from("/dev/fb0")
        );
    }

    #[test]
    fn hex_rgba_forms() {
        assert_eq!(hex_rgba("#1E1E2E"), Some([0x1E, 0x1E, 0x2E, 0xFF]));
        assert_eq!(hex_rgba("00000080"), Some([0, 0, 0, 0x80]));
        assert_eq!(hex_rgba("#12345"), None);
        assert_eq!(hex_rgba("#GGGGGG"), None);
        assert_eq!(hex_rgba("#ééé"), None);
    }

    #[test]
    fn empty_needle_finds_nothing() {
        assert_eq!(find_font(""), None);
        assert_eq!(find_font("   "), None);
    }
}
