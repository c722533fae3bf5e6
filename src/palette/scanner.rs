//! Color token scanner
//!
//! Three independent pattern families run over the same text: utility-class
//! colors, hex literals and functional rgb/rgba literals. Results are
//! deduplicated by exact text. Ordering is family order (utility classes, then
//! hex, then rgb), and source order of first occurrence within a family.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::color::Color;
use super::tailwind;

/// Which pattern family produced a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    UtilityClass,
    Hex,
    Rgb,
}

/// A color literal found in source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorToken {
    pub kind: TokenKind,
    /// Exact text as written; the substitution key
    pub text: String,
    /// Value to paint a swatch with
    pub display: String,
    pub color: Option<Color>,
    /// Number of matches of `text` in the scanned source
    pub occurrences: usize,
    /// Byte offset of the first match
    pub first_offset: usize,
}

impl ColorToken {
    fn new(kind: TokenKind, text: &str, offset: usize) -> Self {
        let (display, color) = match kind {
            TokenKind::UtilityClass => {
                let display = tailwind::resolve_class(text);
                (display.to_string(), tailwind::swatch_color(display))
            }
            TokenKind::Hex => (text.to_string(), Color::from_hex(text).ok()),
            TokenKind::Rgb => (text.to_string(), Color::from_rgb_function(text)),
        };
        Self {
            kind,
            text: text.to_string(),
            display,
            color,
            occurrences: 0,
            first_offset: offset,
        }
    }
}

fn utility_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let names: Vec<&str> = tailwind::color_names().collect();
        let pattern = format!(
            r"\b(?:{})-(?:{})-[0-9]+\b",
            tailwind::PREFIXES.join("|"),
            names.join("|")
        );
        Regex::new(&pattern).expect("utility color pattern is valid")
    })
}

fn hex_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Longest alternative first; `\b` then rejects 5 and 7 digit runs
    RE.get_or_init(|| {
        Regex::new(r"#(?:[0-9a-fA-F]{8}|[0-9a-fA-F]{6}|[0-9a-fA-F]{4}|[0-9a-fA-F]{3})\b")
            .expect("hex color pattern is valid")
    })
}

fn rgb_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\brgba?\(\s*\d+\s*,\s*\d+\s*,\s*\d+\s*(?:,\s*[0-9.]+\s*)?\)")
            .expect("rgb color pattern is valid")
    })
}

/// Scan source text for color tokens
///
/// Total: malformed input yields fewer (or zero) tokens, never an error.
pub fn scan(source: &str) -> Vec<ColorToken> {
    let families = [
        (TokenKind::UtilityClass, utility_regex()),
        (TokenKind::Hex, hex_regex()),
        (TokenKind::Rgb, rgb_regex()),
    ];

    let mut tokens: Vec<ColorToken> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (kind, re) in families {
        for m in re.find_iter(source) {
            let slot = match index.get(m.as_str()) {
                Some(&i) => i,
                None => {
                    index.insert(m.as_str().to_string(), tokens.len());
                    tokens.push(ColorToken::new(kind, m.as_str(), m.start()));
                    tokens.len() - 1
                }
            };
            tokens[slot].occurrences += 1;
        }
    }

    tokens
}

/// Find the token with the given exact text
pub fn find<'a>(tokens: &'a [ColorToken], text: &str) -> Option<&'a ColorToken> {
    tokens.iter().find(|t| t.text == text)
}
