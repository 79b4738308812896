//! Packed ARGB colors, color-space conversion and blend modes.
//!
//! Colors travel through the script as plain numbers holding a 32-bit
//! `0xAARRGGBB` value, so bitwise channel tricks in sketches keep working.

// ─── Packing ──────────────────────────────────────────────────────────────────

pub const ALPHA_MASK: u32 = 0xff00_0000;
pub const RED_MASK: u32 = 0x00ff_0000;
pub const GREEN_MASK: u32 = 0x0000_ff00;
pub const BLUE_MASK: u32 = 0x0000_00ff;

pub fn pack(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// `(a, r, g, b)`
pub fn unpack(c: u32) -> (u8, u8, u8, u8) {
    ((c >> 24) as u8, (c >> 16) as u8, (c >> 8) as u8, c as u8)
}

/// Interpret a script number as a packed color. Negative numbers come from
/// 32-bit signed bit arithmetic (`0xff << 24`) and wrap around.
pub fn from_number(n: f64) -> u32 {
    if !n.is_finite() {
        return 0;
    }
    let n = n.trunc().rem_euclid(4_294_967_296.0);
    n as u32
}

pub fn to_number(c: u32) -> f64 {
    c as f64
}

fn channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

// ─── Color space ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Rgb,
    Hsb,
}

impl ColorMode {
    /// Script constants: `RGB = 1`, `HSB = 2`.
    pub fn from_constant(n: f64) -> Option<Self> {
        match n as i64 {
            1 => Some(Self::Rgb),
            2 => Some(Self::Hsb),
            _ => None,
        }
    }
}

/// Current `colorMode` plus the per-channel input ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSpace {
    pub mode: ColorMode,
    /// red/hue, green/saturation, blue/brightness, alpha
    pub range: [f64; 4],
}

impl Default for ColorSpace {
    fn default() -> Self {
        Self { mode: ColorMode::Rgb, range: [255.0; 4] }
    }
}

impl ColorSpace {
    /// `colorMode(mode)`, `colorMode(mode, max)`, `colorMode(mode, r, g, b[, a])`.
    pub fn set(&mut self, mode: ColorMode, ranges: &[f64]) {
        self.mode = mode;
        match ranges {
            [max] => self.range = [*max; 4],
            [r, g, b] => self.range[..3].copy_from_slice(&[*r, *g, *b]),
            [r, g, b, a] => self.range = [*r, *g, *b, *a],
            _ => {}
        }
    }

    /// Build a packed color from one to four script arguments.
    ///
    /// One argument is a gray level when it lies in `0..256`, otherwise an
    /// already-packed color. Two arguments are gray and alpha, three are the
    /// channels of the current mode, four add alpha.
    pub fn color(&self, args: &[f64]) -> u32 {
        match *args {
            [v] if (0.0..256.0).contains(&v) => self.gray(v, self.range[3]),
            [v] => from_number(v),
            [v, a] => self.gray(v, a),
            [x, y, z] => self.channels(x, y, z, self.range[3]),
            [x, y, z, a, ..] => self.channels(x, y, z, a),
            [] => pack(255, 255, 255, 255),
        }
    }

    fn gray(&self, v: f64, a: f64) -> u32 {
        match self.mode {
            ColorMode::Rgb => self.channels(
                v / self.range[2] * self.range[0],
                v / self.range[2] * self.range[1],
                v,
                a,
            ),
            ColorMode::Hsb => self.channels(0.0, 0.0, v, a),
        }
    }

    fn channels(&self, x: f64, y: f64, z: f64, a: f64) -> u32 {
        let alpha = a / self.range[3];
        let alpha = if alpha.is_nan() { 1.0 } else { alpha };
        let (r, g, b) = match self.mode {
            ColorMode::Rgb => (
                channel(255.0 * x / self.range[0]),
                channel(255.0 * y / self.range[1]),
                channel(255.0 * z / self.range[2]),
            ),
            ColorMode::Hsb => hsb_to_rgb(
                x / self.range[0] * 360.0,
                y / self.range[1] * 100.0,
                z / self.range[2] * 100.0,
            ),
        };
        pack(channel(alpha * 255.0), r, g, b)
    }

    /// `hue(c)` in the current hue range.
    pub fn hue(&self, c: u32) -> f64 {
        rgb_to_hsb(c).0 / 360.0 * self.range[0]
    }

    pub fn saturation(&self, c: u32) -> f64 {
        rgb_to_hsb(c).1 / 100.0 * self.range[1]
    }

    pub fn brightness(&self, c: u32) -> f64 {
        rgb_to_hsb(c).2 / 100.0 * self.range[2]
    }
}

/// `DefaultColor(r, g, b)`: channels in 0..255 regardless of the current mode.
pub fn default_color(r: f64, g: f64, b: f64) -> u32 {
    pack(255, channel(r), channel(g), channel(b))
}

/// Hue in degrees, saturation and brightness in percent.
pub fn hsb_to_rgb(h: f64, s: f64, b: f64) -> (u8, u8, u8) {
    let br = channel(b / 100.0 * 255.0);
    if s == 0.0 {
        return (br, br, br);
    }
    let hue = h.rem_euclid(360.0);
    let f = hue % 60.0;
    let p = channel(b * (100.0 - s) / 10000.0 * 255.0);
    let q = channel(b * (6000.0 - s * f) / 600000.0 * 255.0);
    let t = channel(b * (6000.0 - s * (60.0 - f)) / 600000.0 * 255.0);
    match (hue / 60.0).floor() as u32 {
        0 => (br, t, p),
        1 => (q, br, p),
        2 => (p, br, t),
        3 => (p, q, br),
        4 => (t, p, br),
        _ => (br, p, q),
    }
}

/// `(hue°, saturation%, brightness%)`
pub fn rgb_to_hsb(c: u32) -> (f64, f64, f64) {
    let (_, r, g, b) = unpack(c);
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let brightness = max / 255.0 * 100.0;
    if max == 0.0 || delta == 0.0 {
        return (0.0, 0.0, brightness);
    }
    let saturation = delta / max * 100.0;
    let hue = if r == max {
        (g - b) / delta
    } else if g == max {
        2.0 + (b - r) / delta
    } else {
        4.0 + (r - g) / delta
    };
    ((hue * 60.0).rem_euclid(360.0), saturation, brightness)
}

/// Per-channel linear interpolation. Color channels truncate, alpha rounds.
pub fn lerp_color(c1: u32, c2: u32, amt: f64) -> u32 {
    let (a1, r1, g1, b1) = unpack(c1);
    let (a2, r2, g2, b2) = unpack(c2);
    let lerp = |x: u8, y: u8| x as f64 + (y as f64 - x as f64) * amt;
    let trunc = |v: f64| v.trunc().clamp(0.0, 255.0) as u8;
    pack(channel(lerp(a1, a2)), trunc(lerp(r1, r2)), trunc(lerp(g1, g2)), trunc(lerp(b1, b2)))
}

// ─── Blending ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Replace,
    Blend,
    Add,
    Subtract,
    Lightest,
    Darkest,
    Difference,
    Exclusion,
    Multiply,
    Screen,
    Overlay,
    HardLight,
    SoftLight,
    Dodge,
    Burn,
}

impl BlendMode {
    pub const ALL: [BlendMode; 15] = [
        Self::Replace, Self::Blend, Self::Add, Self::Subtract, Self::Lightest,
        Self::Darkest, Self::Difference, Self::Exclusion, Self::Multiply, Self::Screen,
        Self::Overlay, Self::HardLight, Self::SoftLight, Self::Dodge, Self::Burn,
    ];

    /// Script constant: `REPLACE = 0`, then one bit per mode from `BLEND = 1`.
    pub fn constant(self) -> u32 {
        match self {
            Self::Replace => 0,
            other => 1 << (Self::ALL.iter().position(|m| *m == other).unwrap_or(1) - 1),
        }
    }

    pub fn from_constant(n: f64) -> Option<Self> {
        let n = n as i64;
        Self::ALL.iter().copied().find(|m| m.constant() as i64 == n)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Replace => "REPLACE",
            Self::Blend => "BLEND",
            Self::Add => "ADD",
            Self::Subtract => "SUBTRACT",
            Self::Lightest => "LIGHTEST",
            Self::Darkest => "DARKEST",
            Self::Difference => "DIFFERENCE",
            Self::Exclusion => "EXCLUSION",
            Self::Multiply => "MULTIPLY",
            Self::Screen => "SCREEN",
            Self::Overlay => "OVERLAY",
            Self::HardLight => "HARD_LIGHT",
            Self::SoftLight => "SOFT_LIGHT",
            Self::Dodge => "DODGE",
            Self::Burn => "BURN",
        }
    }
}

fn peg(n: i32) -> i32 {
    n.clamp(0, 255)
}

fn mix(a: i32, b: i32, f: i32) -> i32 {
    a + (((b - a) * f) >> 8)
}

/// Composite `src` over `dst`. The source alpha is the mixing factor; the
/// result alpha is the saturating sum of both alphas.
pub fn blend(dst: u32, src: u32, mode: BlendMode) -> u32 {
    if mode == BlendMode::Replace {
        return src;
    }
    let (da, dr, dg, db) = unpack(dst);
    let (sa, sr, sg, sb) = unpack(src);
    let f = sa as i32;
    let alpha = (da as i32 + f).min(255) as u8;

    let op = |a: u8, b: u8| -> u8 {
        let (a, b) = (a as i32, b as i32);
        let scaled = (b * f) >> 8;
        let out = match mode {
            BlendMode::Replace => b,
            BlendMode::Blend => mix(a, b, f),
            BlendMode::Add => (a + scaled).min(255),
            BlendMode::Subtract => (a - scaled).max(0),
            BlendMode::Lightest => a.max(scaled),
            BlendMode::Darkest => mix(a, a.min(scaled), f),
            _ => {
                let c = separable(mode, a, b);
                peg(a + (((c - a) * f) >> 8))
            }
        };
        peg(out) as u8
    };

    pack(alpha, op(dr, sr), op(dg, sg), op(db, sb))
}

/// Target channel of the separable modes before the alpha mix.
fn separable(mode: BlendMode, a: i32, b: i32) -> i32 {
    match mode {
        BlendMode::Difference => (a - b).abs(),
        BlendMode::Exclusion => a + b - ((a * b) >> 7),
        BlendMode::Multiply => (a * b) >> 8,
        BlendMode::Screen => 255 - (((255 - a) * (255 - b)) >> 8),
        BlendMode::HardLight if b < 128 => (a * b) >> 7,
        BlendMode::HardLight => 255 - (((255 - a) * (255 - b)) >> 7),
        BlendMode::SoftLight => ((a * b) >> 7) + ((a * a) >> 8) - ((a * a * b) >> 15),
        BlendMode::Overlay if a < 128 => (a * b) >> 7,
        BlendMode::Overlay => 255 - (((255 - a) * (255 - b)) >> 7),
        BlendMode::Dodge if b == 255 => 255,
        BlendMode::Dodge => peg((a << 8) / (255 - b)),
        BlendMode::Burn if b == 0 => 0,
        BlendMode::Burn => 255 - peg(((255 - a) << 8) / b),
        _ => b,
    }
}

/// Plain source-over compositing used by the raster.
pub fn over(dst: u32, src: u32) -> u32 {
    let (sa, sr, sg, sb) = unpack(src);
    match sa {
        255 => src,
        0 => dst,
        _ => {
            let (da, dr, dg, db) = unpack(dst);
            let k = sa as f64 / 255.0;
            let mixc = |d: u8, s: u8| channel(d as f64 + (s as f64 - d as f64) * k);
            let out_a = sa as f64 + da as f64 * (1.0 - k);
            pack(channel(out_a), mixc(dr, sr), mixc(dg, sg), mixc(db, sb))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: u32 = 0xffff_0000;

    #[test]
    fn three_channel_rgb() {
        let cs = ColorSpace::default();
        assert_eq!(cs.color(&[255.0, 0.0, 0.0]), RED);
        assert_eq!(cs.color(&[255.0, 0.0, 0.0, 0.0]), 0x00ff_0000);
    }

    #[test]
    fn single_argument_gray_or_packed() {
        let cs = ColorSpace::default();
        assert_eq!(cs.color(&[0.0]), 0xff00_0000);
        assert_eq!(cs.color(&[255.0]), 0xffff_ffff);
        assert_eq!(cs.color(&[RED as f64]), RED);
        // signed 32-bit form of opaque red
        assert_eq!(cs.color(&[-65536.0]), RED);
    }

    #[test]
    fn gray_with_alpha() {
        let cs = ColorSpace::default();
        assert_eq!(cs.color(&[128.0, 64.0]), pack(64, 128, 128, 128));
    }

    #[test]
    fn custom_ranges_scale_channels() {
        let mut cs = ColorSpace::default();
        cs.set(ColorMode::Rgb, &[1.0]);
        assert_eq!(cs.color(&[1.0, 0.5, 0.0]), pack(255, 255, 128, 0));
    }

    #[test]
    fn hsb_mode_converts() {
        let mut cs = ColorSpace::default();
        cs.set(ColorMode::Hsb, &[360.0, 100.0, 100.0]);
        assert_eq!(cs.color(&[0.0, 100.0, 100.0]), RED);
        assert_eq!(cs.color(&[120.0, 100.0, 100.0]), 0xff00_ff00);
        assert_eq!(cs.color(&[0.0, 0.0, 50.0]), pack(255, 128, 128, 128));
    }

    #[test]
    fn hsb_accessors_round_trip_primary_colors() {
        let mut cs = ColorSpace::default();
        cs.set(ColorMode::Hsb, &[360.0, 100.0, 100.0]);
        let blue = 0xff00_00ff;
        assert_eq!(cs.hue(blue), 240.0);
        assert_eq!(cs.saturation(blue), 100.0);
        assert_eq!(cs.brightness(blue), 100.0);
    }

    #[test]
    fn default_color_ignores_mode() {
        assert_eq!(default_color(255.0, 0.0, 0.0), RED);
    }

    #[test]
    fn lerp_color_halfway() {
        let c = lerp_color(0xff00_0000, 0xffff_ffff, 0.5);
        assert_eq!(unpack(c), (255, 127, 127, 127));
    }

    #[test]
    fn blend_constants_are_bit_flags() {
        assert_eq!(BlendMode::Replace.constant(), 0);
        assert_eq!(BlendMode::Blend.constant(), 1);
        assert_eq!(BlendMode::Add.constant(), 2);
        assert_eq!(BlendMode::Burn.constant(), 1 << 13);
        assert_eq!(BlendMode::from_constant(512.0), Some(BlendMode::Overlay));
    }

    #[test]
    fn replace_returns_source() {
        assert_eq!(blend(0xff12_3456, 0x80ab_cdef, BlendMode::Replace), 0x80ab_cdef);
    }

    #[test]
    fn opaque_blend_takes_source_channels_approximately() {
        let c = blend(0xff00_0000, 0xffff_ffff, BlendMode::Blend);
        let (a, r, g, b) = unpack(c);
        assert_eq!(a, 255);
        assert!(r >= 254 && g >= 254 && b >= 254);
    }

    #[test]
    fn add_saturates_and_subtract_floors() {
        let gray = pack(255, 200, 200, 200);
        assert_eq!(unpack(blend(gray, 0xffff_ffff, BlendMode::Add)).1, 255);
        assert_eq!(unpack(blend(gray, 0xffff_ffff, BlendMode::Subtract)).1, 0);
    }

    #[test]
    fn difference_of_equal_colors_is_black() {
        let c = pack(255, 90, 90, 90);
        let (_, r, g, b) = unpack(blend(c, c, BlendMode::Difference));
        assert!(r <= 1 && g <= 1 && b <= 1);
    }

    #[test]
    fn multiply_with_white_keeps_destination() {
        let c = pack(255, 100, 150, 200);
        let (_, r, g, b) = unpack(blend(c, 0xffff_ffff, BlendMode::Multiply));
        assert!((r as i32 - 100).abs() <= 2);
        assert!((g as i32 - 150).abs() <= 2);
        assert!((b as i32 - 200).abs() <= 2);
    }

    #[test]
    fn dodge_and_burn_extremes() {
        let c = pack(255, 100, 100, 100);
        assert_eq!(unpack(blend(c, 0xffff_ffff, BlendMode::Dodge)).1, 254);
        assert_eq!(unpack(blend(c, 0xff00_0000, BlendMode::Burn)).1, 0);
    }

    #[test]
    fn transparent_source_leaves_destination() {
        let c = pack(255, 10, 20, 30);
        for mode in BlendMode::ALL.into_iter().filter(|m| *m != BlendMode::Replace) {
            let (_, r, g, b) = unpack(blend(c, 0x00ff_ffff, mode));
            assert_eq!((r, g, b), (10, 20, 30), "{}", mode.name());
        }
    }

    #[test]
    fn over_half_alpha() {
        let c = over(0xff00_0000, 0x80ff_ffff);
        assert_eq!(unpack(c), (255, 128, 128, 128));
    }
}
