//! Script-visible constants.

use std::f64::consts::PI;

use crate::runtime::value::Value;
use crate::types::color::BlendMode;

// Shape modes. `CENTER` is also the center mouse button and text alignment;
// the older value 2 is still accepted as a center mode.
pub const CORNER: f64 = 0.0;
pub const RADIUS: f64 = 1.0;
pub const CENTER_RADIUS: f64 = 1.0;
pub const CORNERS: f64 = 10.0;
pub const CENTER: f64 = 88_888_880.0;
pub const CENTER_LEGACY: f64 = 2.0;

// Shape kinds
pub const POLYGON: f64 = 2.0;
pub const QUAD_STRIP: f64 = 3.0;
pub const TRIANGLE_FAN: f64 = 4.0;
pub const QUADS: f64 = 5.0;
pub const TRIANGLES: f64 = 6.0;
pub const POINTS: f64 = 7.0;
pub const LINES: f64 = 8.0;
pub const TRIANGLE_STRIP: f64 = 9.0;

pub const RGB: f64 = 1.0;
pub const HSB: f64 = 2.0;
pub const P3D: f64 = 3.0;
pub const OPENGL: &str = "OPENGL";
pub const P2D: &str = "P2D";

// Keys and mouse buttons
pub const CODED: f64 = 88_888_888.0;
pub const UP: f64 = 88_888_870.0;
pub const RIGHT: f64 = 88_888_871.0;
pub const DOWN: f64 = 88_888_872.0;
pub const LEFT: f64 = 88_888_869.0;

pub const ARROW: &str = "default";
pub const NOCURSOR: &str = "none";

pub fn is_center(mode: f64) -> bool {
    mode == CENTER || mode == CENTER_LEGACY
}

pub fn lookup(name: &str) -> Option<Value> {
    let n = |v: f64| Some(Value::Number(v));
    let s = |v: &str| Some(Value::str(v));
    match name {
        "PI" => n(PI),
        "TWO_PI" => n(2.0 * PI),
        "HALF_PI" => n(PI / 2.0),
        "QUARTER_PI" => n(PI / 4.0),
        "MAX_FLOAT" => n(3.402_823_5e38),
        "MIN_FLOAT" => n(-3.402_823_5e38),
        "MAX_INT" => n(2_147_483_647.0),
        "MIN_INT" => n(-2_147_483_648.0),

        "P2D" => s(P2D),
        "P3D" => n(P3D),
        "OPENGL" => s(OPENGL),

        "CORNER" => n(CORNER),
        "RADIUS" => n(RADIUS),
        "CENTER_RADIUS" => n(CENTER_RADIUS),
        "CORNERS" => n(CORNERS),
        "CENTER" => n(CENTER),

        "POLYGON" => n(POLYGON),
        "QUAD_STRIP" => n(QUAD_STRIP),
        "TRIANGLE_FAN" => n(TRIANGLE_FAN),
        "QUADS" => n(QUADS),
        "TRIANGLES" => n(TRIANGLES),
        "POINTS" => n(POINTS),
        "LINES" => n(LINES),
        "TRIANGLE_STRIP" => n(TRIANGLE_STRIP),
        "CLOSE" => Some(Value::Bool(true)),

        "RGB" => n(RGB),
        "HSB" => n(HSB),
        "ALPHA_MASK" => n(0xff00_0000u32 as f64),
        "RED_MASK" => n(0x00ff_0000 as f64),
        "GREEN_MASK" => n(0x0000_ff00 as f64),
        "BLUE_MASK" => n(0x0000_00ff as f64),

        "ARROW" => s(ARROW),
        "CROSS" => s("crosshair"),
        "HAND" => s("pointer"),
        "MOVE" => s("move"),
        "TEXT" => s("text"),
        "WAIT" => s("wait"),
        "NOCURSOR" => s(NOCURSOR),

        "ROUND" => s("round"),
        "SQUARE" => s("butt"),
        "PROJECT" => s("square"),
        "MITER" => s("miter"),
        "BEVEL" => s("bevel"),

        "CODED" => n(CODED),
        "UP" => n(UP),
        "RIGHT" => n(RIGHT),
        "DOWN" => n(DOWN),
        "LEFT" => n(LEFT),
        "SHIFT" => n(16.0),
        "CONTROL" => n(17.0),
        "ALT" => n(18.0),
        "BACKSPACE" => n(8.0),
        "TAB" => n(9.0),
        "ENTER" => n(10.0),
        "RETURN" => n(13.0),
        "ESC" => n(27.0),
        "DELETE" => n(127.0),

        _ => BlendMode::ALL.iter()
            .find(|m| m.name() == name)
            .map(|m| Value::Number(m.constant() as f64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_constants_are_bit_flags() {
        assert_eq!(lookup("REPLACE").unwrap().to_number(), 0.0);
        assert_eq!(lookup("BLEND").unwrap().to_number(), 1.0);
        assert_eq!(lookup("BURN").unwrap().to_number(), 8192.0);
    }

    #[test]
    fn center_accepts_both_values() {
        assert!(is_center(lookup("CENTER").unwrap().to_number()));
        assert!(is_center(2.0));
        assert!(!is_center(CORNER));
    }
}
