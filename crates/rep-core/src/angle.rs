//! Joint angle calculation using the dot product.
//!
//! The angle at vertex `B` is formed by the segments `B→A` and `B→C`:
//! `cos(θ) = (BA · BC) / (|BA| × |BC|)`. Only x/y are used; depth from the
//! estimator is too noisy to help.

use serde::Serialize;

/// Angle reported when the geometry is degenerate (a zero-length segment
/// or non-finite input). 180° reads as "fully extended", which never
/// satisfies any contraction threshold.
pub const FALLBACK_ANGLE_DEGREES: f64 = 180.0;

/// Segments shorter than this (in normalized units) are treated as zero.
const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// A computed angle plus whether the fallback was used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AngleReading {
    pub degrees: f64,
    pub degenerate: bool,
}

/// Included angle at `b`, in degrees within `[0, 180]`.
///
/// Never returns NaN: degenerate input yields [`FALLBACK_ANGLE_DEGREES`].
pub fn joint_angle_degrees(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    joint_angle_checked(a, b, c).degrees
}

/// Like [`joint_angle_degrees`], but reports when the fallback was taken.
pub fn joint_angle_checked(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> AngleReading {
    let ba = (a.0 - b.0, a.1 - b.1);
    let bc = (c.0 - b.0, c.1 - b.1);

    let mag_ba = ba.0.hypot(ba.1);
    let mag_bc = bc.0.hypot(bc.1);

    // NaN magnitudes fail the `>=` check as well.
    if !(mag_ba >= MIN_SEGMENT_LENGTH && mag_bc >= MIN_SEGMENT_LENGTH) {
        return AngleReading::fallback();
    }

    let dot = ba.0 * bc.0 + ba.1 * bc.1;
    let cos_angle = dot / (mag_ba * mag_bc);
    if !cos_angle.is_finite() {
        return AngleReading::fallback();
    }

    AngleReading {
        degrees: cos_angle.clamp(-1.0, 1.0).acos().to_degrees(),
        degenerate: false,
    }
}

impl AngleReading {
    fn fallback() -> Self {
        Self {
            degrees: FALLBACK_ANGLE_DEGREES,
            degenerate: true,
        }
    }
}
