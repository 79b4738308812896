//! 2D affine matrix helpers stored as row-major 3×3 matrices.
//! Element at (row, col) = data[row * 3 + col]; the last row stays `0 0 1`.

use crate::error::RuntimeError;

pub type M3 = [f64; 9];

pub fn m3_identity() -> M3 {
    [1., 0., 0.,
     0., 1., 0.,
     0., 0., 1.]
}

pub fn m3_mul(a: &M3, b: &M3) -> M3 {
    let mut c = [0.0f64; 9];
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                c[i * 3 + j] += a[i * 3 + k] * b[k * 3 + j];
            }
        }
    }
    c
}

/// Transform a point (homogeneous w = 1).
pub fn m3_apply(m: &M3, (x, y): (f64, f64)) -> (f64, f64) {
    (m[0] * x + m[1] * y + m[2], m[3] * x + m[4] * y + m[5])
}

pub fn m3_det(m: &M3) -> f64 {
    m[0] * (m[4] * m[8] - m[5] * m[7])
  - m[1] * (m[3] * m[8] - m[5] * m[6])
  + m[2] * (m[3] * m[7] - m[4] * m[6])
}

pub fn m3_inverse(m: &M3, line: usize) -> Result<M3, RuntimeError> {
    let det = m3_det(m);
    if det.abs() < 1e-15 {
        return Err(RuntimeError::new(line, "transform is singular (not invertible)"));
    }
    let d = 1.0 / det;
    Ok([
         (m[4]*m[8] - m[5]*m[7]) * d,  -(m[1]*m[8] - m[2]*m[7]) * d,  (m[1]*m[5] - m[2]*m[4]) * d,
        -(m[3]*m[8] - m[5]*m[6]) * d,   (m[0]*m[8] - m[2]*m[6]) * d, -(m[0]*m[5] - m[2]*m[3]) * d,
         (m[3]*m[7] - m[4]*m[6]) * d,  -(m[0]*m[7] - m[1]*m[6]) * d,  (m[0]*m[4] - m[1]*m[3]) * d,
    ])
}

pub fn m3_translate2d(tx: f64, ty: f64) -> M3 {
    [1., 0., tx,
     0., 1., ty,
     0., 0., 1.]
}

/// Rotation by `angle` radians. Positive angles turn clockwise on a y-down
/// canvas.
pub fn m3_rotate2d(angle: f64) -> M3 {
    let (s, c) = angle.sin_cos();
    [c,  -s,  0.,
     s,   c,  0.,
     0.,  0., 1.]
}

pub fn m3_scale2d(sx: f64, sy: f64) -> M3 {
    [sx, 0., 0.,
     0., sy, 0.,
     0., 0., 1.]
}

/// `applyMatrix(a, b, c, d, e, f)` row order: `x' = a·x + b·y + c`,
/// `y' = d·x + e·y + f`.
pub fn m3_from_affine(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> M3 {
    [a,  b,  c,
     d,  e,  f,
     0., 0., 1.]
}

/// Average linear scale factor, used to scale stroke widths and text sizes.
pub fn m3_scale_factor(m: &M3) -> f64 {
    m3_det(m).abs().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn translate_then_scale_applies_right_to_left() {
        let m = m3_mul(&m3_translate2d(10.0, 5.0), &m3_scale2d(2.0, 3.0));
        assert_eq!(m3_apply(&m, (1.0, 1.0)), (12.0, 8.0));
    }

    #[test]
    fn quarter_turn_maps_x_axis_to_y_axis() {
        let (x, y) = m3_apply(&m3_rotate2d(std::f64::consts::FRAC_PI_2), (1.0, 0.0));
        assert_approx_eq!(x, 0.0);
        assert_approx_eq!(y, 1.0);
    }

    #[test]
    fn inverse_undoes_transform() {
        let m = m3_mul(&m3_translate2d(4.0, -2.0), &m3_rotate2d(0.7));
        let inv = m3_inverse(&m, 1).unwrap();
        let (x, y) = m3_apply(&inv, m3_apply(&m, (3.0, 9.0)));
        assert_approx_eq!(x, 3.0);
        assert_approx_eq!(y, 9.0);
    }

    #[test]
    fn singular_matrix_is_an_error() {
        assert!(m3_inverse(&m3_scale2d(0.0, 1.0), 7).is_err());
    }

    #[test]
    fn scale_factor_of_uniform_scale() {
        assert_approx_eq!(m3_scale_factor(&m3_scale2d(3.0, 3.0)), 3.0);
    }
}
