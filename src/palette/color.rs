//! RGBA colors for swatch rendering

use serde::Serialize;

/// RGBA color (0-255 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    /// Create a new color from RGB values (alpha defaults to 255)
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a new color from RGBA values
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse from "#RGB", "#RGBA", "#RRGGBB" or "#RRGGBBAA"
    pub fn from_hex(s: &str) -> Result<Self, String> {
        let s = s.trim_start_matches('#');
        if !s.is_ascii() {
            return Err(format!("Invalid color format: {}", s));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&s[range], 16).map_err(|e| e.to_string())
        };
        // Short forms repeat each digit: "f80" -> "ff8800"
        let short = |i: usize| channel(i..i + 1).map(|v| v * 17);
        match s.len() {
            3 => Ok(Color::rgb(short(0)?, short(1)?, short(2)?)),
            4 => Ok(Color::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Ok(Color::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Ok(Color::rgba(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => Err(format!("Invalid color format: {}", s)),
        }
    }

    /// Parse a functional `rgb(r, g, b)` / `rgba(r, g, b, a)` literal
    ///
    /// Channels above 255 are clamped; alpha is a 0..=1 fraction.
    pub fn from_rgb_function(s: &str) -> Option<Self> {
        let s = s.trim();
        let inner = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))?
            .strip_suffix(')')?;
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let channel = |p: &str| p.parse::<u32>().ok().map(|v| v.min(255) as u8);
        let alpha = match parts.get(3) {
            Some(p) => {
                let fraction = p.parse::<f32>().ok()?;
                (fraction.clamp(0.0, 1.0) * 255.0).round() as u8
            }
            None => 255,
        };
        Some(Color::rgba(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
            alpha,
        ))
    }

    /// Format as "#rrggbb", or "#rrggbbaa" when not fully opaque
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Return a new color with the specified alpha value
    pub const fn with_alpha(&self, a: u8) -> Self {
        Self {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }
}
