//! Readable text colors for status backgrounds.
//!
//! Luminance and contrast follow WCAG 2.x. A same-hue ("harmonious") color is
//! preferred when it reaches 4.5:1, then the complementary hue, then plain white
//! or near-black.

use crate::models::schedule::status;

/// WCAG AA contrast ratio for normal text.
pub const MIN_CONTRAST: f64 = 4.5;

const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };
const NEAR_BLACK: Rgb = Rgb { r: 26, g: 26, b: 26 };

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn relative_luminance(self) -> f64 {
        fn linear(channel: u8) -> f64 {
            let c = channel as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }

    /// Hue in degrees, saturation and lightness in `0..=1`.
    pub fn to_hsl(self) -> (f64, f64, f64) {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let d = max - min;
        if d == 0.0 {
            return (0.0, 0.0, l);
        }
        let s = d / (1.0 - (2.0 * l - 1.0).abs());
        let h = if max == r {
            60.0 * (((g - b) / d).rem_euclid(6.0))
        } else if max == g {
            60.0 * ((b - r) / d + 2.0)
        } else {
            60.0 * ((r - g) / d + 4.0)
        };
        (h, s, l)
    }

    pub fn from_hsl(h: f64, s: f64, l: f64) -> Self {
        let h = h.rem_euclid(360.0);
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h / 60.0).rem_euclid(2.0) - 1.0).abs());
        let m = l - c / 2.0;
        let (r, g, b) = match (h / 60.0) as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let to_u8 = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Self {
            r: to_u8(r),
            g: to_u8(g),
            b: to_u8(b),
        }
    }
}

pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let la = a.relative_luminance();
    let lb = b.relative_luminance();
    let (hi, lo) = if la >= lb { (la, lb) } else { (lb, la) };
    (hi + 0.05) / (lo + 0.05)
}

/// Picks the text color for `background` (a `#rrggbb` or `#rgb` string).
pub fn select_text_color(background: &str) -> String {
    let Some(bg) = Rgb::parse_hex(background) else {
        return NEAR_BLACK.to_hex();
    };
    let dark_background = contrast_ratio(bg, WHITE) >= contrast_ratio(bg, NEAR_BLACK);

    let (h, s, _) = bg.to_hsl();
    let candidates = if dark_background {
        [
            Rgb::from_hsl(h, s.min(0.8), 0.92),
            Rgb::from_hsl(h + 180.0, s * 0.5, 0.9),
            WHITE,
        ]
    } else {
        [
            Rgb::from_hsl(h, s.min(0.9), 0.15),
            Rgb::from_hsl(h + 180.0, s * 0.5, 0.18),
            NEAR_BLACK,
        ]
    };

    let chosen = candidates
        .iter()
        .copied()
        .find(|c| contrast_ratio(bg, *c) >= MIN_CONTRAST)
        .unwrap_or_else(|| {
            candidates
                .iter()
                .copied()
                .max_by(|a, b| contrast_ratio(bg, *a).total_cmp(&contrast_ratio(bg, *b)))
                .unwrap_or(NEAR_BLACK)
        });
    chosen.to_hex()
}

/// Default background color of a status; unknown statuses get a neutral slate.
pub fn status_color(value: &str) -> &'static str {
    match value {
        status::ONLINE => "#2e7d32",
        status::REMOTE => "#1565c0",
        status::MEETING => "#ef6c00",
        status::TRAINING => "#6a1b9a",
        status::BREAK => "#fdd835",
        status::OFF => "#bdbdbd",
        status::UNPLANNED => "#c62828",
        status::NIGHT_DUTY => "#283593",
        _ => "#455a64",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_hex() {
        assert_eq!(Rgb::parse_hex("#fff"), Some(Rgb { r: 255, g: 255, b: 255 }));
        assert_eq!(Rgb::parse_hex("1a2B3c"), Some(Rgb { r: 0x1a, g: 0x2b, b: 0x3c }));
        assert_eq!(Rgb::parse_hex("#12345"), None);
        assert_eq!(Rgb::parse_hex("#gggggg"), None);
    }

    #[test]
    fn black_on_white_is_21_to_1() {
        let white = Rgb { r: 255, g: 255, b: 255 };
        let black = Rgb { r: 0, g: 0, b: 0 };
        assert!((contrast_ratio(white, black) - 21.0).abs() < 1e-9);
    }

    #[test]
    fn status_colors_get_readable_text() {
        for value in status::ALL.iter().copied().chain(["custom-status"]) {
            let bg = status_color(value);
            let text = select_text_color(bg);
            let ratio = contrast_ratio(
                Rgb::parse_hex(bg).unwrap(),
                Rgb::parse_hex(&text).unwrap(),
            );
            assert!(ratio >= MIN_CONTRAST, "{value}: {bg} / {text} = {ratio:.2}");
        }
    }

    #[test]
    fn light_background_prefers_same_hue_dark_text() {
        assert_eq!(select_text_color("#fdd835"), "#493c04");
        assert_eq!(select_text_color("#2e7d32"), "#ffffff");
    }

    #[test]
    fn hsl_round_trip_keeps_primary_colors() {
        for hex in ["#ff0000", "#00ff00", "#0000ff", "#808080"] {
            let rgb = Rgb::parse_hex(hex).unwrap();
            let (h, s, l) = rgb.to_hsl();
            assert_eq!(Rgb::from_hsl(h, s, l), rgb);
        }
    }
}
