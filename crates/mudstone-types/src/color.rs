//! In-band color markup.
//!
//! Output text may carry `{X` escapes where `X` selects a palette entry.
//! `{{` emits a literal brace. The session layer either translates the
//! escapes to ANSI or strips them, according to the player's preference.

use serde::{Deserialize, Serialize};

/// Per-session color handling preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Translate `{X` escapes to ANSI sequences.
    Ansi,
    /// Remove all escapes.
    #[default]
    Strip,
}

/// Palette: code letter to ANSI sequence. `x` resets.
fn ansi_for(code: char) -> Option<&'static str> {
    Some(match code {
        'x' => "\x1b[0m",
        'r' => "\x1b[0;31m",
        'g' => "\x1b[0;32m",
        'y' => "\x1b[0;33m",
        'b' => "\x1b[0;34m",
        'm' => "\x1b[0;35m",
        'c' => "\x1b[0;36m",
        'w' => "\x1b[0;37m",
        'D' => "\x1b[1;30m",
        'R' => "\x1b[1;31m",
        'G' => "\x1b[1;32m",
        'Y' => "\x1b[1;33m",
        'B' => "\x1b[1;34m",
        'M' => "\x1b[1;35m",
        'C' => "\x1b[1;36m",
        'W' => "\x1b[1;37m",
        // Structural colors used by system messages.
        'Z' => "\x1b[1;35m",
        '*' => "\x07",
        _ => return None,
    })
}

/// Translates `{X` escapes to ANSI.
pub fn translate_color(text: &str) -> String {
    convert(text, true)
}

/// Removes `{X` escapes, keeping `{{` as a literal brace.
pub fn strip_color(text: &str) -> String {
    convert(text, false)
}

fn convert(text: &str, ansi: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '{' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('{') => out.push('{'),
            Some(code) => {
                if ansi {
                    if let Some(seq) = ansi_for(code) {
                        out.push_str(seq);
                    }
                    // Unknown codes are dropped either way.
                }
            }
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_removes_codes_and_keeps_text() {
        assert_eq!(strip_color("{RHello{x world"), "Hello world");
    }

    #[test]
    fn literal_brace_survives_both_modes() {
        assert_eq!(strip_color("a {{ b"), "a { b");
        assert_eq!(translate_color("a {{ b"), "a { b");
    }

    #[test]
    fn translate_emits_ansi() {
        let t = translate_color("{gok{x");
        assert!(t.starts_with("\x1b[0;32m"));
        assert!(t.ends_with("\x1b[0m"));
        assert!(t.contains("ok"));
    }

    #[test]
    fn trailing_escape_is_dropped() {
        assert_eq!(strip_color("oops{"), "oops");
    }
}
