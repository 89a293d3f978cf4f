use crate::core::error::{InputError, Result};
use nalgebra::{Matrix3, RowVector3};
use std::f64::consts::PI;

/// Tolerance for snapping near-right angles: two ULPs of 90.0.
fn right_angle_tolerance() -> f64 {
    let ninety = 90.0_f64;
    2.0 * (f64::from_bits(ninety.to_bits() + 1) - ninety)
}

fn degrees_cos(angle: f64) -> f64 {
    (angle * PI / 180.0).cos()
}

fn degrees_sin(angle: f64) -> f64 {
    (angle * PI / 180.0).sin()
}

/// Converts lattice parameters `[a, b, c, alpha, beta, gamma]` (angles in degrees)
/// into cell vectors, returned as the ROWS of the matrix.
///
/// Vector A lies along [1, 0, 0] and B lies in the XY plane. Angles within two
/// ULPs of ±90° are snapped so orthorhombic cells come out exactly diagonal.
///
/// A cell with sin(gamma) = 0 or with no real third component is degenerate
/// and returns a validation error.
pub fn cell_abcs_to_vec(abc: &[f64; 6]) -> Result<Matrix3<f64>> {
    let [a, b, c, alpha, beta, gamma] = *abc;
    let e = right_angle_tolerance();

    let cos_alpha = if (alpha.abs() - 90.0).abs() < e { 0.0 } else { degrees_cos(alpha) };
    let cos_beta = if (beta.abs() - 90.0).abs() < e { 0.0 } else { degrees_cos(beta) };

    let (cos_gamma, sin_gamma) = if (gamma - 90.0).abs() < e {
        (0.0, 1.0)
    } else if (gamma + 90.0).abs() < e {
        (0.0, -1.0)
    } else {
        (degrees_cos(gamma), degrees_sin(gamma))
    };

    if sin_gamma == 0.0 {
        return Err(InputError::validation(format!(
            "degenerate lattice: gamma = {} gives sin(gamma) = 0",
            gamma
        )));
    }

    let cx = cos_beta;
    let cy = (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
    let radicand = 1.0 - cx * cx - cy * cy;
    if radicand < 0.0 || !radicand.is_finite() {
        return Err(InputError::validation(format!(
            "degenerate lattice: angles ({}, {}, {}) do not form a cell",
            alpha, beta, gamma
        )));
    }
    let cz = radicand.sqrt();

    let va = RowVector3::new(1.0, 0.0, 0.0) * a;
    let vb = RowVector3::new(cos_gamma, sin_gamma, 0.0) * b;
    let vc = RowVector3::new(cx, cy, cz) * c;

    Ok(Matrix3::from_rows(&[va, vb, vc]))
}
