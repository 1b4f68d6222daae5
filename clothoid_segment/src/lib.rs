/*!
Generalized clothoid (Euler spiral) segment

A planar curve whose curvature changes linearly with arc length, evaluated exactly as a line,
a circular arc or a Fresnel-integral spiral depending on its parameters, with the analytic
derivatives of position with respect to those parameters for use in least-squares fitting.
*/
#![no_std]

#[cfg(any(feature = "std", test))]
extern crate std;

use core::f64::consts::PI;

use uom::si::angle::radian;
use uom::si::f64::Angle;

pub mod clothoid;
mod derivative;
mod euler;
#[cfg(feature = "std")]
pub mod fit;
pub mod fresnel;
pub mod position;

pub use clothoid::{Clothoid, Param, ParamDer, Regime, NUM_PARAMS};
pub use fresnel::fresnel;
pub use position::Position;

pub type Float = f64;

/// put an angle in radians into the [-pi, pi) range
pub fn wrap_radian(angle: Float) -> Float {
    angle - 2.0 * PI * libm::floor((angle + PI) / (2.0 * PI))
}

/// put angle into [-pi, pi) range
pub fn angle_unwrap(angle: Angle) -> Angle {
    Angle::new::<radian>(wrap_radian(angle.get::<radian>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn wrap_range() {
        assert_abs_diff_eq!(wrap_radian(0.5), 0.5);
        assert_abs_diff_eq!(wrap_radian(PI), -PI);
        assert_abs_diff_eq!(wrap_radian(-PI), -PI);
        assert_abs_diff_eq!(wrap_radian(3.0 * PI + 0.25), -PI + 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_radian(-4.0), 2.0 * PI - 4.0, epsilon = 1e-12);

        let a = angle_unwrap(Angle::new::<radian>(7.0));
        assert_abs_diff_eq!(a.get::<radian>(), 7.0 - 2.0 * PI, epsilon = 1e-12);
    }
}
