//! CSS-style color parsing.
//!
//! Settings store colors as free-form strings. Anything that does not parse
//! paints nothing, which keeps a bad value visible without failing a render.

use image::Rgba;

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

const NAMED: &[(&str, [u8; 4])] = &[
    ("black", [0, 0, 0, 255]),
    ("white", [255, 255, 255, 255]),
    ("red", [255, 0, 0, 255]),
    ("green", [0, 128, 0, 255]),
    ("blue", [0, 0, 255, 255]),
    ("yellow", [255, 255, 0, 255]),
    ("orange", [255, 165, 0, 255]),
    ("gray", [128, 128, 128, 255]),
    ("grey", [128, 128, 128, 255]),
    ("navy", [0, 0, 128, 255]),
    ("maroon", [128, 0, 0, 255]),
    ("teal", [0, 128, 128, 255]),
    ("purple", [128, 0, 128, 255]),
    ("transparent", [0, 0, 0, 0]),
];

/// Parse `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`, `rgba(r, g, b, a)`
/// or a basic named color.
///
/// ```
/// use image::Rgba;
/// use proforma::raster::color::parse_color;
///
/// assert_eq!(parse_color("#1e3a8a"), Some(Rgba([0x1e, 0x3a, 0x8a, 255])));
/// assert_eq!(parse_color("rgba(255, 0, 0, 0.5)"), Some(Rgba([255, 0, 0, 128])));
/// assert_eq!(parse_color("not a color"), None);
/// ```
pub fn parse_color(value: &str) -> Option<Rgba<u8>> {
    let value = value.trim();
    let parsed = if let Some(hex) = value.strip_prefix('#') {
        parse_hex(hex)
    } else if let Some(args) = function_args(value, "rgba").or_else(|| function_args(value, "rgb")) {
        parse_rgb_args(args)
    } else {
        let lower = value.to_ascii_lowercase();
        NAMED
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, rgba)| Rgba(*rgba))
    };

    if parsed.is_none() {
        tracing::debug!(color = value, "unparseable color, painting nothing");
    }
    parsed
}

fn function_args<'a>(value: &'a str, name: &str) -> Option<&'a str> {
    let rest = value.strip_prefix(name)?.trim_start();
    rest.strip_prefix('(')?.strip_suffix(')')
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|n| n * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => Some(Rgba([nibble(0)?, nibble(1)?, nibble(2)?, 255])),
        4 => Some(Rgba([nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?])),
        6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}

fn parse_rgb_args(args: &str) -> Option<Rgba<u8>> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let channel = |s: &str| -> Option<u8> {
        let v: f32 = s.parse().ok()?;
        Some(v.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match parts.get(3) {
        Some(a) => {
            let v: f32 = a.parse().ok()?;
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };
    Some(Rgba([channel(parts[0])?, channel(parts[1])?, channel(parts[2])?, alpha]))
}

/// Scale a color's alpha by `opacity` (0.0–1.0).
pub fn with_opacity(color: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let Rgba([r, g, b, a]) = color;
    Rgba([r, g, b, (a as f32 * opacity.clamp(0.0, 1.0)).round() as u8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hex_expands() {
        assert_eq!(parse_color("#fff"), Some(WHITE));
        assert_eq!(parse_color("#000"), Some(BLACK));
        assert_eq!(parse_color("#f008"), Some(Rgba([255, 0, 0, 136])));
    }

    #[test]
    fn long_hex_with_alpha() {
        assert_eq!(parse_color("#11223380"), Some(Rgba([0x11, 0x22, 0x33, 0x80])));
    }

    #[test]
    fn rgb_function() {
        assert_eq!(parse_color("rgb(10, 20, 30)"), Some(Rgba([10, 20, 30, 255])));
        assert_eq!(parse_color("rgb(300,0,0)"), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(parse_color("rgb(1,2)"), None);
    }

    #[test]
    fn named_colors_are_case_insensitive() {
        assert_eq!(parse_color("Navy"), Some(Rgba([0, 0, 128, 255])));
        assert_eq!(parse_color("transparent"), Some(TRANSPARENT));
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_color(""), None);
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("#gggggg"), None);
        assert_eq!(parse_color("hsl(0, 0%, 0%)"), None);
    }

    #[test]
    fn opacity_scales_alpha() {
        assert_eq!(with_opacity(BLACK, 0.5), Rgba([0, 0, 0, 128]));
        assert_eq!(with_opacity(BLACK, 2.0), BLACK);
    }
}
