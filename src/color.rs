//! Mapping of the B concentration onto named color gradients.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Parses `#rrggbb`, `rrggbb` or the short `#rgb` form.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || Error::InvalidHex(hex.to_string());

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(invalid()),
        };

        let n = u32::from_str_radix(&expanded, 16).map_err(|_| invalid())?;
        Ok(Rgb::new((n >> 16) as u8, (n >> 8) as u8, n as u8))
    }

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let mix = |c1: u8, c2: u8| {
            let (c1, c2) = (f32::from(c1), f32::from(c2));
            (c1 + (c2 - c1) * t).round() as u8
        };

        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    pub fn to_rgba(self, alpha: u8) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, alpha])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorScheme {
    pub name: String,
    colors: Vec<Rgb>,
}

impl ColorScheme {
    pub fn new(name: &str, hex_colors: &[&str]) -> Result<Self> {
        if !(2..=3).contains(&hex_colors.len()) {
            return Err(Error::Config(format!(
                "color scheme {:?} needs 2 or 3 colors, got {}",
                name,
                hex_colors.len()
            )));
        }

        let colors = hex_colors
            .iter()
            .map(|h| Rgb::from_hex(h))
            .collect::<Result<Vec<_>>>()?;

        Ok(ColorScheme {
            name: name.to_string(),
            colors,
        })
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Piecewise linear gradient over `t` in `[0, 1]`; three stops split it
    /// in two halves.
    pub fn interpolate(&self, t: f32) -> Rgb {
        let t = t.max(0.0).min(1.0);

        match *self.colors.as_slice() {
            [c1, c2] => c1.lerp(c2, t),
            [c1, c2, c3] => {
                if t < 0.5 {
                    c1.lerp(c2, t * 2.0)
                } else {
                    c2.lerp(c3, (t - 0.5) * 2.0)
                }
            }
            _ => unreachable!("schemes are built with 2 or 3 colors"),
        }
    }
}

#[rustfmt::skip]
const BUILTIN_SCHEMES: [(&str, [&str; 3]); 8] = [
    ("Cyberpunk",       ["#0a0a0a", "#ff006e", "#00f5ff"]),
    ("Acid Trip",       ["#000000", "#39ff14", "#bf00ff"]),
    ("Laser Show",      ["#000000", "#ff0055", "#ffffff"]),
    ("UV Blacklight",   ["#0a0a1a", "#bf00ff", "#00f5ff"]),
    ("Electric Dreams", ["#0a0a0a", "#0066ff", "#ff006e"]),
    ("Toxic Glow",      ["#0a0a0a", "#39ff14", "#ff006e"]),
    ("Neon Noir",       ["#000000", "#00f5ff", "#ff006e"]),
    ("Rave Sunrise",    ["#1a0a2e", "#ff6600", "#dfff00"]),
];

pub fn builtin_schemes() -> Vec<ColorScheme> {
    BUILTIN_SCHEMES
        .iter()
        .filter_map(|(name, colors)| ColorScheme::new(name, colors).ok())
        .collect()
}

/// Finds a scheme by name or by position in the list.
pub fn find_scheme(schemes: &[ColorScheme], key: &str) -> Result<usize> {
    if let Ok(i) = key.parse::<usize>() {
        if i < schemes.len() {
            return Ok(i);
        }
    }

    schemes
        .iter()
        .position(|s| s.name.eq_ignore_ascii_case(key.trim()))
        .ok_or_else(|| Error::UnknownScheme(key.to_string()))
}

/// B rarely goes past 0.5 so it's doubled to use the whole gradient.
pub fn field_to_t(b: f32) -> f32 {
    (b * 2.0).min(1.0)
}

/// `h` in degrees (wrapping), `s` and `l` in `[0, 1]`.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Rgb {
    let h = h.rem_euclid(360.0) / 360.0;

    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return Rgb::new(v, v, v);
    }

    let hue_to_rgb = |p: f32, q: f32, mut t: f32| {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }

        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let channel = |t: f32| (hue_to_rgb(p, q, t) * 255.0).round() as u8;
    Rgb::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Rgb::from_hex("#ff006e").unwrap(), Rgb::new(255, 0, 110));
        assert_eq!(Rgb::from_hex("00F5FF").unwrap(), Rgb::new(0, 245, 255));
        assert_eq!(Rgb::from_hex("#fff").unwrap(), Rgb::new(255, 255, 255));
        assert!(Rgb::from_hex("#12345").is_err());
        assert!(Rgb::from_hex("#zzzzzz").is_err());
    }

    #[test]
    fn endpoints_match_stops_exactly() {
        for scheme in builtin_schemes() {
            let colors = scheme.colors();
            assert_eq!(scheme.interpolate(0.0), colors[0]);
            assert_eq!(scheme.interpolate(1.0), colors[colors.len() - 1]);
        }
    }

    #[test]
    fn three_stops_hit_middle_at_half() {
        let scheme = ColorScheme::new("test", &["#000000", "#ff0000", "#ffffff"]).unwrap();
        assert_eq!(scheme.interpolate(0.5), Rgb::new(255, 0, 0));
        assert_eq!(scheme.interpolate(0.25), Rgb::new(128, 0, 0));
        assert_eq!(scheme.interpolate(0.75), Rgb::new(255, 128, 128));
    }

    #[test]
    fn two_stops_are_linear() {
        let scheme = ColorScheme::new("duo", &["#000000", "#c8c8c8"]).unwrap();
        assert_eq!(scheme.interpolate(0.5), Rgb::new(100, 100, 100));
        assert_eq!(scheme.interpolate(-3.0), Rgb::new(0, 0, 0));
        assert_eq!(scheme.interpolate(7.0), Rgb::new(200, 200, 200));
    }

    #[test]
    fn rejects_wrong_stop_count() {
        assert!(ColorScheme::new("mono", &["#000000"]).is_err());
    }

    #[test]
    fn doubles_b_before_mapping() {
        assert_eq!(field_to_t(0.0), 0.0);
        assert_eq!(field_to_t(0.25), 0.5);
        assert_eq!(field_to_t(0.8), 1.0);
    }

    #[test]
    fn finds_schemes_by_name_or_index() {
        let schemes = builtin_schemes();
        assert_eq!(schemes.len(), 8);
        assert_eq!(find_scheme(&schemes, "neon noir").unwrap(), 6);
        assert_eq!(find_scheme(&schemes, "3").unwrap(), 3);
        assert!(find_scheme(&schemes, "42").is_err());
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), Rgb::new(255, 0, 0));
        assert_eq!(hsl_to_rgb(480.0, 1.0, 0.5), Rgb::new(0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), Rgb::new(0, 0, 255));
        assert_eq!(hsl_to_rgb(10.0, 0.0, 0.2), Rgb::new(51, 51, 51));
    }
}
