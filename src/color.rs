use crate::error::{RenderError, Result};

/// A resolved RGBA color. Spec files and the stylesheet carry color
/// *tokens* (named or hex strings); resolution happens at render time so
/// that a bad token surfaces as [`RenderError::InvalidColor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// SVG attribute form: `#rrggbb`, or `rgba(...)` when translucent.
    pub fn to_svg(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!(
                "rgba({},{},{},{:.3})",
                self.r,
                self.g,
                self.b,
                f32::from(self.a) / 255.0
            )
        }
    }
}

// Named palette: the CSS names the architecture documents actually use,
// plus the usual primaries. Tokens are matched case-insensitively.
const NAMED: &[(&str, Rgba)] = &[
    ("black", Rgba::rgb(0x00, 0x00, 0x00)),
    ("white", Rgba::rgb(0xff, 0xff, 0xff)),
    ("whitesmoke", Rgba::rgb(0xf5, 0xf5, 0xf5)),
    ("gray", Rgba::rgb(0x80, 0x80, 0x80)),
    ("grey", Rgba::rgb(0x80, 0x80, 0x80)),
    ("darkgray", Rgba::rgb(0xa9, 0xa9, 0xa9)),
    ("lightgray", Rgba::rgb(0xd3, 0xd3, 0xd3)),
    ("silver", Rgba::rgb(0xc0, 0xc0, 0xc0)),
    ("red", Rgba::rgb(0xff, 0x00, 0x00)),
    ("darkred", Rgba::rgb(0x8b, 0x00, 0x00)),
    ("crimson", Rgba::rgb(0xdc, 0x14, 0x3c)),
    ("salmon", Rgba::rgb(0xfa, 0x80, 0x72)),
    ("orange", Rgba::rgb(0xff, 0xa5, 0x00)),
    ("gold", Rgba::rgb(0xff, 0xd7, 0x00)),
    ("yellow", Rgba::rgb(0xff, 0xff, 0x00)),
    ("green", Rgba::rgb(0x00, 0x80, 0x00)),
    ("darkgreen", Rgba::rgb(0x00, 0x64, 0x00)),
    ("seagreen", Rgba::rgb(0x2e, 0x8b, 0x57)),
    ("teal", Rgba::rgb(0x00, 0x80, 0x80)),
    ("cyan", Rgba::rgb(0x00, 0xff, 0xff)),
    ("blue", Rgba::rgb(0x00, 0x00, 0xff)),
    ("navy", Rgba::rgb(0x00, 0x00, 0x80)),
    ("royalblue", Rgba::rgb(0x41, 0x69, 0xe1)),
    ("steelblue", Rgba::rgb(0x46, 0x82, 0xb4)),
    ("lightsteelblue", Rgba::rgb(0xb0, 0xc4, 0xde)),
    ("skyblue", Rgba::rgb(0x87, 0xce, 0xeb)),
    ("slategray", Rgba::rgb(0x70, 0x80, 0x90)),
    ("indigo", Rgba::rgb(0x4b, 0x00, 0x82)),
    ("purple", Rgba::rgb(0x80, 0x00, 0x80)),
    ("violet", Rgba::rgb(0xee, 0x82, 0xee)),
    ("orchid", Rgba::rgb(0xda, 0x70, 0xd6)),
    ("magenta", Rgba::rgb(0xff, 0x00, 0xff)),
    ("pink", Rgba::rgb(0xff, 0xc0, 0xcb)),
    ("brown", Rgba::rgb(0xa5, 0x2a, 0x2a)),
    ("chocolate", Rgba::rgb(0xd2, 0x69, 0x1e)),
    ("tan", Rgba::rgb(0xd2, 0xb4, 0x8c)),
    ("beige", Rgba::rgb(0xf5, 0xf5, 0xdc)),
    ("ivory", Rgba::rgb(0xff, 0xff, 0xf0)),
    ("transparent", Rgba { r: 0, g: 0, b: 0, a: 0 }),
];

/// Resolve a named or hex color token.
///
/// Accepted hex forms: `#rgb`, `#rrggbb`, `#rrggbbaa`.
pub fn resolve(token: &str) -> Result<Rgba> {
    let trimmed = token.trim();

    if let Some(hex) = trimmed.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| RenderError::InvalidColor(token.to_string()));
    }

    let lower = trimmed.to_ascii_lowercase();
    NAMED
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, rgba)| *rgba)
        .ok_or_else(|| RenderError::InvalidColor(token.to_string()))
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        3 => {
            let expand = |nibble: u8| nibble << 4 | nibble;
            let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
            Some(Rgba::rgb(expand(r), expand(g), expand(b)))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgba::rgb(r, g, b))
        }
        8 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
            Some(Rgba { r, g, b, a })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Rgba, resolve};
    use proptest::prelude::*;

    #[test]
    fn resolves_named_tokens_case_insensitively() {
        assert_eq!(resolve("SteelBlue").unwrap(), Rgba::rgb(0x46, 0x82, 0xb4));
        assert_eq!(resolve("  white ").unwrap(), Rgba::rgb(0xff, 0xff, 0xff));
    }

    #[test]
    fn resolves_short_and_long_hex() {
        assert_eq!(resolve("#2E86C1").unwrap(), Rgba::rgb(0x2e, 0x86, 0xc1));
        assert_eq!(resolve("#fff").unwrap(), Rgba::rgb(0xff, 0xff, 0xff));
        assert_eq!(
            resolve("#00000080").unwrap(),
            Rgba { r: 0, g: 0, b: 0, a: 0x80 }
        );
    }

    #[test]
    fn rejects_garbage_tokens() {
        assert!(resolve("").is_err());
        assert!(resolve("#12345").is_err());
        assert!(resolve("#gggggg").is_err());
        assert!(resolve("not-a-color").is_err());
    }

    #[test]
    fn translucent_colors_render_as_rgba() {
        let c = resolve("#ff000080").unwrap();
        assert!(c.to_svg().starts_with("rgba(255,0,0,"));
    }

    proptest! {
        #[test]
        fn any_opaque_color_roundtrips_through_hex(r: u8, g: u8, b: u8) {
            let token = format!("#{r:02x}{g:02x}{b:02x}");
            let parsed = resolve(&token).unwrap();
            prop_assert_eq!(parsed, Rgba::rgb(r, g, b));
            prop_assert_eq!(parsed.to_svg(), token);
        }
    }
}
