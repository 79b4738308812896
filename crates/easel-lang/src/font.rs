//! Fonts: host-native faces, or glyph tables read from SVG font markup.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::surface::Surface;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(font-face|font|glyph)\b([^>]*)>").expect("static regex")
});
static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([\w:-]+)\s*=\s*"([^"]*)""#).expect("static regex")
});
static PATH_CMD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z][^A-Za-z]*").expect("static regex")
});
static NUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?").expect("static regex")
});

#[derive(Debug)]
pub struct Font {
    pub name: String,
    pub kind: FontKind,
}

#[derive(Debug)]
pub enum FontKind {
    /// Rendered and measured by the surface.
    Native,
    Svg(GlyphTable),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathCmd {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    QuadTo(f64, f64, f64, f64),
    Close,
}

#[derive(Debug, Clone, Default)]
pub struct Glyph {
    pub name: String,
    pub unicode: String,
    pub horiz_adv_x: f64,
    pub path: Vec<PathCmd>,
}

#[derive(Debug, Clone)]
pub struct GlyphTable {
    pub horiz_adv_x: f64,
    pub units_per_em: f64,
    pub ascent: f64,
    pub descent: f64,
    glyphs: HashMap<String, Glyph>,
}

impl Default for GlyphTable {
    fn default() -> Self {
        Self { horiz_adv_x: 0.0, units_per_em: 1000.0, ascent: 0.0, descent: 0.0, glyphs: HashMap::new() }
    }
}

impl Font {
    pub fn native(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: FontKind::Native }
    }

    pub fn svg(name: impl Into<String>, markup: &str) -> Self {
        Self { name: name.into(), kind: FontKind::Svg(GlyphTable::parse(markup)) }
    }

    pub fn is_svg_name(name: &str) -> bool {
        name.to_ascii_lowercase().ends_with(".svg")
    }

    pub fn text_width(&self, text: &str, size: f64, surface: &dyn Surface) -> f64 {
        match &self.kind {
            FontKind::Native => surface.text_width(text, size),
            FontKind::Svg(table) => table.advance(text) * size / table.units_per_em,
        }
    }
}

impl GlyphTable {
    pub fn parse(markup: &str) -> Self {
        let mut table = GlyphTable::default();
        for tag in TAG.captures_iter(markup) {
            let attrs: HashMap<&str, &str> = ATTR.captures_iter(&tag[2])
                .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
                .collect();
            let num = |key: &str| attrs.get(key).and_then(|v| v.trim().parse::<f64>().ok());
            match &tag[1] {
                "font" => {
                    if let Some(adv) = num("horiz-adv-x") { table.horiz_adv_x = adv; }
                }
                "font-face" => {
                    if let Some(upem) = num("units-per-em").filter(|u| *u > 0.0) { table.units_per_em = upem; }
                    if let Some(a) = num("ascent") { table.ascent = a; }
                    if let Some(d) = num("descent") { table.descent = d; }
                }
                _ => {
                    let glyph = Glyph {
                        name: attrs.get("glyph-name").map(|s| s.to_string()).unwrap_or_default(),
                        unicode: attrs.get("unicode").map(|s| decode_entities(s)).unwrap_or_default(),
                        horiz_adv_x: num("horiz-adv-x").unwrap_or(table.horiz_adv_x),
                        path: attrs.get("d").map(|d| parse_path(d)).unwrap_or_default(),
                    };
                    let key = if glyph.unicode.is_empty() { glyph.name.clone() } else { glyph.unicode.clone() };
                    if !key.is_empty() {
                        table.glyphs.insert(key, glyph);
                    }
                }
            }
        }
        log::debug!("parsed SVG font with {} glyph(s)", table.glyphs.len());
        table
    }

    pub fn glyph(&self, ch: char) -> Option<&Glyph> {
        let mut buf = [0u8; 4];
        self.glyphs.get(&*ch.encode_utf8(&mut buf))
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Total advance of `text` in font units.
    pub fn advance(&self, text: &str) -> f64 {
        text.chars()
            .map(|c| self.glyph(c).map_or(self.horiz_adv_x, |g| g.horiz_adv_x))
            .sum()
    }
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Absolute `M L H V Q T Z` commands; the y axis is flipped to screen space.
pub fn parse_path(d: &str) -> Vec<PathCmd> {
    let mut out = Vec::new();
    let (mut cx, mut cy) = (0.0, 0.0);
    let mut ctrl: Option<(f64, f64)> = None;
    for m in PATH_CMD.find_iter(d) {
        let text = m.as_str();
        let Some(cmd) = text.chars().next() else { continue };
        let nums: Vec<f64> = NUM.find_iter(&text[1..])
            .filter_map(|n| n.as_str().parse().ok())
            .collect();
        let mut last_ctrl = None;
        match cmd {
            'M' | 'L' => {
                for (i, pair) in nums.chunks_exact(2).enumerate() {
                    (cx, cy) = (pair[0], -pair[1]);
                    out.push(if cmd == 'M' && i == 0 { PathCmd::MoveTo(cx, cy) } else { PathCmd::LineTo(cx, cy) });
                }
            }
            'H' => {
                for &x in &nums {
                    cx = x;
                    out.push(PathCmd::LineTo(cx, cy));
                }
            }
            'V' => {
                for &y in &nums {
                    cy = -y;
                    out.push(PathCmd::LineTo(cx, cy));
                }
            }
            'Q' => {
                for q in nums.chunks_exact(4) {
                    let c = (q[0], -q[1]);
                    (cx, cy) = (q[2], -q[3]);
                    out.push(PathCmd::QuadTo(c.0, c.1, cx, cy));
                    last_ctrl = Some(c);
                }
            }
            'T' => {
                let mut prev = ctrl;
                for t in nums.chunks_exact(2) {
                    let c = prev.map_or((cx, cy), |(px, py)| (2.0 * cx - px, 2.0 * cy - py));
                    (cx, cy) = (t[0], -t[1]);
                    out.push(PathCmd::QuadTo(c.0, c.1, cx, cy));
                    prev = Some(c);
                }
                last_ctrl = prev;
            }
            'Z' | 'z' => out.push(PathCmd::Close),
            other => log::warn!("unsupported glyph path command `{other}`"),
        }
        ctrl = last_ctrl;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FONT: &str = r#"
        <svg><defs><font id="f" horiz-adv-x="500">
        <font-face units-per-em="1000" ascent="800" descent="-200"/>
        <glyph unicode="A" glyph-name="A" horiz-adv-x="600" d="M0 0 L300 700 L600 0 Z"/>
        <glyph unicode="&amp;" glyph-name="ampersand" d="M0 0 H100 V100 Z"/>
        </font></defs></svg>"#;

    #[test]
    fn reads_metrics_and_glyphs() {
        let t = GlyphTable::parse(FONT);
        assert_eq!(t.units_per_em, 1000.0);
        assert_eq!(t.ascent, 800.0);
        assert_eq!(t.descent, -200.0);
        assert_eq!(t.len(), 2);
        assert_eq!(t.glyph('A').unwrap().horiz_adv_x, 600.0);
        assert_eq!(t.glyph('&').unwrap().horiz_adv_x, 500.0);
    }

    #[test]
    fn path_flips_y() {
        let path = parse_path("M0 0 L300 700 Z");
        assert_eq!(path, vec![PathCmd::MoveTo(0.0, 0.0), PathCmd::LineTo(300.0, -700.0), PathCmd::Close]);
    }

    #[test]
    fn smooth_quadratic_reflects_control_point() {
        let path = parse_path("M0 0 Q10 10 20 0 T40 0");
        assert_eq!(path[2], PathCmd::QuadTo(30.0, 10.0, 40.0, 0.0));
    }

    #[test]
    fn advance_falls_back_to_font_default() {
        let t = GlyphTable::parse(FONT);
        assert_eq!(t.advance("AA?"), 1700.0);
    }
}
