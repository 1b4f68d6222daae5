use core::f64::consts::{FRAC_PI_2, PI};

use libm::{cos, fabs, sin};
use uom::si::{f64::Length, length::meter};

use crate::clothoid::{
    mat_mul, rotation, Clothoid, Mat2, ParamDer, Regime, ANGLE, CURVATURE, DCURVATURE, NUM_PARAMS,
    X, Y,
};
use crate::Float;

/// Below this curvature * arc length the arc derivatives switch to their taylor series
const ARC_SERIES_PHI: Float = 0.05;

/// derivatives with respect to (curvature, curvature rate) of a line
fn line_rows(theta0: Float, s: Float) -> ([Float; 2], [Float; 2]) {
    let normal = [-sin(theta0), cos(theta0)];
    let dk = 0.5 * s * s;
    let ddk = s * s * s / 6.0;
    (
        [dk * normal[0], dk * normal[1]],
        [ddk * normal[0], ddk * normal[1]],
    )
}

/// derivatives with respect to (curvature, curvature rate) of an arc
///
/// In the frame of the start tangent u and normal n, with phi = k s,
/// d/dk = s^2 (a u - b n) and d/d(dk) = s^3 (p u - q n), where
/// a = (phi cos phi - sin phi) / phi^2, b = (1 - cos phi - phi sin phi) / phi^2,
/// p = (1 + (phi^2 / 2 - 1) cos phi - phi sin phi) / phi^3,
/// q = ((1 - phi^2 / 2) sin phi - phi cos phi) / phi^3.
/// These go to the line derivatives as phi -> 0 but lose every digit doing so, hence the series.
fn arc_rows(theta0: Float, curvature: Float, s: Float) -> ([Float; 2], [Float; 2]) {
    let phi = curvature * s;
    let phi2 = phi * phi;
    let (a, b, p, q) = if fabs(phi) < ARC_SERIES_PHI {
        (
            phi * (-1.0 / 3.0 + phi2 * (1.0 / 30.0 - phi2 / 840.0)),
            -0.5 + phi2 * (1.0 / 8.0 - phi2 * (1.0 / 144.0 - phi2 / 5760.0)),
            phi * (-1.0 / 8.0 + phi2 * (1.0 / 72.0 - phi2 / 1920.0)),
            -1.0 / 6.0 + phi2 * (1.0 / 20.0 - phi2 * (1.0 / 336.0 - phi2 / 12960.0)),
        )
    } else {
        let (sin_phi, cos_phi) = (sin(phi), cos(phi));
        let phi3 = phi2 * phi;
        (
            (phi * cos_phi - sin_phi) / phi2,
            (1.0 - cos_phi - phi * sin_phi) / phi2,
            (1.0 + (0.5 * phi2 - 1.0) * cos_phi - phi * sin_phi) / phi3,
            ((1.0 - 0.5 * phi2) * sin_phi - phi * cos_phi) / phi3,
        )
    };

    let (sin0, cos0) = (sin(theta0), cos(theta0));
    let s2 = s * s;
    let s3 = s2 * s;
    (
        [s2 * (a * cos0 + b * sin0), s2 * (a * sin0 - b * cos0)],
        [s3 * (p * cos0 + q * sin0), s3 * (p * sin0 - q * cos0)],
    )
}

impl Clothoid {
    /// Partial derivatives of `get_xy(s)` with respect to each parameter
    ///
    /// Rows are in `Param` order, the length row is zero since a point at fixed arc length
    /// doesn't depend on where the segment ends. Lengths in meters, angles in radians.
    /// The segment must be valid.
    pub fn derivative_at(&self, s: Length) -> ParamDer {
        self.derivative_at_meter(s.get::<meter>())
    }

    pub(crate) fn derivative_at_meter(&self, s: Float) -> ParamDer {
        let [x0, y0, theta0, _, curvature, dcurvature] = self.params();

        let mut out = [[0.0; 2]; NUM_PARAMS];
        out[X][0] = 1.0;
        out[Y][1] = 1.0;

        let [x, y] = self.pos_meter(s);
        out[ANGLE] = [-(y - y0), x - x0];

        let (dk, ddk) = match self.regime() {
            Regime::Line => line_rows(theta0, s),
            Regime::Arc => arc_rows(theta0, curvature, s),
            Regime::Spiral if self.is_near_arc(s) => self.near_arc_rows(theta0, s),
            Regime::Spiral => self.spiral_rows(s, curvature, dcurvature),
        };
        out[CURVATURE] = dk;
        out[DCURVATURE] = ddk;

        out
    }

    /// Position is `start + s exp(i theta0) J_0` so
    /// d/dk = i s^2 exp(i theta0) J_1 and d/d(dk) = i s^3 / 2 exp(i theta0) J_2
    fn near_arc_rows(&self, theta0: Float, s: Float) -> ([Float; 2], [Float; 2]) {
        let [_, j1, j2] = self.euler_moments(s);
        let s2 = s * s;
        (
            mat_mul(&rotation(theta0 + FRAC_PI_2, s2), j1),
            mat_mul(&rotation(theta0 + FRAC_PI_2, 0.5 * s2 * s), j2),
        )
    }

    /// Chain rule through the canonical mapping
    ///
    /// p = start + mat * (cs(t) - cs(t1)), with t1 = k scale, t = t1 + s dk scale and
    /// scale = 1 / sqrt(pi |dk|), so
    /// dp/dx = dmat/dx (cs - cs1) + mat (dcs/dt dt/dx - dcs1/dt1 dt1/dx).
    fn spiral_rows(
        &self,
        s: Float,
        curvature: Float,
        dcurvature: Float,
    ) -> ([Float; 2], [Float; 2]) {
        let canonical = self.canonical();
        let t1 = canonical.t1;
        let t = canonical.t(s);
        let mat = &canonical.mat;
        let theta0 = self.params()[ANGLE];

        let scale = canonical.scale;
        let dt1 = [scale, -curvature * scale / (2.0 * dcurvature)];
        let dt = [dt1[0], dt1[1] + 0.5 * scale * s];

        let dcs = mat_mul(mat, [cos(FRAC_PI_2 * t * t), sin(FRAC_PI_2 * t * t)]);
        let dcs1 = mat_mul(mat, [cos(FRAC_PI_2 * t1 * t1), sin(FRAC_PI_2 * t1 * t1)]);

        // rows x, y; columns curvature, curvature rate
        let mut result: Mat2 = [[0.0; 2]; 2];
        for (row, result_row) in result.iter_mut().enumerate() {
            for (col, value) in result_row.iter_mut().enumerate() {
                *value = dcs[row] * dt[col] - dcs1[row] * dt1[col];
            }
        }

        let angle_shift = if canonical.tdiff > 0.0 {
            theta0 - t1 * t1 * FRAC_PI_2
        } else {
            theta0 + t1 * t1 * FRAC_PI_2
        };
        let (sin_as, cos_as) = (sin(angle_shift), cos(angle_shift));

        let dk_scale = PI * scale * curvature / dcurvature;
        let mut dmat_dk: Mat2 = [
            [dk_scale * sin_as, dk_scale * cos_as],
            [-dk_scale * cos_as, dk_scale * sin_as],
        ];

        let curvature_sqr = curvature * curvature;
        let ddk_scale = FRAC_PI_2 * scale / (dcurvature * dcurvature);
        let diag = ddk_scale * (-dcurvature * cos_as - curvature_sqr * sin_as);
        let off = ddk_scale * (dcurvature * sin_as - curvature_sqr * cos_as);
        let mut dmat_ddk: Mat2 = [[diag, off], [-off, diag]];

        if canonical.tdiff < 0.0 {
            // same reflection as the map itself
            for row in 0..2 {
                dmat_dk[row][0] = -dmat_dk[row][0];
                dmat_ddk[row][0] = -dmat_ddk[row][0];
            }
        }

        let delta = canonical.delta(t);
        let from_dk = mat_mul(&dmat_dk, delta);
        let from_ddk = mat_mul(&dmat_ddk, delta);

        (
            [result[0][0] + from_dk[0], result[1][0] + from_dk[1]],
            [result[0][1] + from_ddk[0], result[1][1] + from_ddk[1]],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clothoid::Param;
    use approx::assert_abs_diff_eq;
    use libm::{hypot, sqrt};

    const H: Float = 1e-6;

    fn central_difference(clothoid: &Clothoid, s: Float) -> ParamDer {
        let mut out = [[0.0; 2]; NUM_PARAMS];
        for param in Param::ALL {
            let i = param.index();
            let mut plus = clothoid.params();
            plus[i] += H;
            let mut minus = clothoid.params();
            minus[i] -= H;
            let p = Clothoid::from_params(plus).pos_meter(s);
            let m = Clothoid::from_params(minus).pos_meter(s);
            out[i] = [(p[0] - m[0]) / (2.0 * H), (p[1] - m[1]) / (2.0 * H)];
        }
        out
    }

    fn assert_matches_finite_difference(clothoid: &Clothoid, s: Float) {
        let analytic = clothoid.derivative_at(Length::new::<meter>(s));
        let numeric = central_difference(clothoid, s);
        for param in Param::ALL {
            let a = analytic[param.index()];
            let n = numeric[param.index()];
            let err = hypot(a[0] - n[0], a[1] - n[1]);
            let size = hypot(a[0], a[1]).max(1.0);
            assert!(
                err / size < 1e-4,
                "{param:?} at s {s}: analytic {a:?} numeric {n:?} ({:?})",
                clothoid.regime()
            );
        }
    }

    #[test]
    fn line() {
        let clothoid = Clothoid::from_params([0.5, -1.0, 0.7, 2.0, 0.0, 0.0]);
        assert_eq!(clothoid.regime(), Regime::Line);
        for s in [0.3, 1.0, 2.0] {
            assert_matches_finite_difference(&clothoid, s);
        }

        let der = clothoid.derivative_at(Length::new::<meter>(2.0));
        assert_abs_diff_eq!(der[CURVATURE][0], -2.0 * sin(0.7), epsilon = 1e-12);
        assert_abs_diff_eq!(der[CURVATURE][1], 2.0 * cos(0.7), epsilon = 1e-12);
        assert_abs_diff_eq!(der[DCURVATURE][0], -8.0 / 6.0 * sin(0.7), epsilon = 1e-12);
        assert_abs_diff_eq!(der[DCURVATURE][1], 8.0 / 6.0 * cos(0.7), epsilon = 1e-12);
    }

    #[test]
    fn arc() {
        for curvature in [0.2, -0.8, 3.0] {
            let clothoid = Clothoid::from_params([1.0, 2.0, -0.4, 2.0, curvature, 0.0]);
            assert_eq!(clothoid.regime(), Regime::Arc);
            for s in [0.01, 0.5, 1.5] {
                assert_matches_finite_difference(&clothoid, s);
            }
        }
    }

    #[test]
    fn arc_series_meets_closed_form() {
        let theta0 = 0.3;
        for s in [1.0, 2.0] {
            let below = arc_rows(theta0, (ARC_SERIES_PHI - 1e-9) / s, s);
            let above = arc_rows(theta0, (ARC_SERIES_PHI + 1e-9) / s, s);
            for i in 0..2 {
                assert_abs_diff_eq!(below.0[i], above.0[i], epsilon = 1e-8);
                assert_abs_diff_eq!(below.1[i], above.1[i], epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn spiral() {
        let clothoids = [
            Clothoid::from_params([1.0, -2.0, 0.3, 1.5, 0.5, 0.3]),
            Clothoid::from_params([0.0, 0.0, -1.2, 3.0, -1.0, 2.0]),
            // canonical parameter beyond 1, past the power series
            Clothoid::from_params([0.0, 1.0, 0.1, 1.5, 2.0, 1.0]),
        ];
        for clothoid in clothoids {
            assert_eq!(clothoid.regime(), Regime::Spiral);
            for s in [0.2, 0.8, 1.5] {
                assert_matches_finite_difference(&clothoid, s);
            }
        }
    }

    #[test]
    fn reflected_spiral() {
        let clothoids = [
            Clothoid::from_params([-3.0, 0.5, 2.0, 1.5, 0.5, -0.3]),
            Clothoid::from_params([2.0, 0.5, -2.5, 1.5, -0.4, -1.5]),
        ];
        for clothoid in clothoids {
            assert!(clothoid.canonical().tdiff < 0.0);
            for s in [0.2, 0.8, 1.5] {
                assert_matches_finite_difference(&clothoid, s);
            }
        }
    }

    #[test]
    fn continuous_across_flat_threshold() {
        let above = Clothoid::from_params([0.0, 0.0, 0.4, 2.0, 1.1e-6, 0.0]);
        let below = Clothoid::from_params([0.0, 0.0, 0.4, 2.0, 0.9e-6, 0.0]);
        assert_eq!(above.regime(), Regime::Arc);
        assert_eq!(below.regime(), Regime::Line);
        for s in [0.5, 2.0] {
            let a = above.derivative_at_meter(s);
            let b = below.derivative_at_meter(s);
            for (ra, rb) in a.iter().zip(b.iter()) {
                assert_abs_diff_eq!(ra[0], rb[0], epsilon = 1e-5);
                assert_abs_diff_eq!(ra[1], rb[1], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn continuous_across_arc_threshold() {
        for curvature in [0.5, 2.0] {
            let above = Clothoid::from_params([0.0, 0.0, 0.4, 2.0, curvature, 1e-11]);
            let below = Clothoid::from_params([0.0, 0.0, 0.4, 2.0, curvature, 1e-13]);
            assert_eq!(above.regime(), Regime::Spiral);
            assert_eq!(below.regime(), Regime::Arc);
            for s in [0.5, 1.5, 2.0] {
                let a = above.derivative_at_meter(s);
                let b = below.derivative_at_meter(s);
                for (ra, rb) in a.iter().zip(b.iter()) {
                    assert_abs_diff_eq!(ra[0], rb[0], epsilon = 1e-9);
                    assert_abs_diff_eq!(ra[1], rb[1], epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn slow_spiral() {
        for curvature in [0.5, 2.0] {
            for dcurvature in [1e-7, 1e-5, -1e-5] {
                let clothoid = Clothoid::from_params([1.0, 2.0, -0.4, 2.0, curvature, dcurvature]);
                assert_eq!(clothoid.regime(), Regime::Spiral);
                for s in [0.01, 0.5, 1.5] {
                    assert!(clothoid.is_near_arc(s));
                    assert_matches_finite_difference(&clothoid, s);
                }
            }
        }
    }

    #[test]
    fn near_arc_meets_fresnel_rows() {
        // switch point of 0.5 |dk| s^2 = 0.1
        for (curvature, dcurvature) in [(0.5, 0.3), (-1.0, 2.0), (0.5, -0.3)] {
            let clothoid = Clothoid::from_params([1.0, -2.0, 0.3, 3.0, curvature, dcurvature]);
            let s = sqrt(0.2 / fabs(dcurvature));
            let series = clothoid.near_arc_rows(0.3, s);
            let fresnel = clothoid.spiral_rows(s, curvature, dcurvature);
            for i in 0..2 {
                assert_abs_diff_eq!(series.0[i], fresnel.0[i], epsilon = 1e-10);
                assert_abs_diff_eq!(series.1[i], fresnel.1[i], epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn translation_and_rotation_rows() {
        let clothoid = Clothoid::from_params([1.0, -2.0, 0.3, 1.5, 0.5, 0.3]);
        let der = clothoid.derivative_at_meter(1.0);
        assert_eq!(der[X], [1.0, 0.0]);
        assert_eq!(der[Y], [0.0, 1.0]);
        assert_eq!(der[Param::Length.index()], [0.0, 0.0]);
        let [x, y] = clothoid.pos_meter(1.0);
        assert_abs_diff_eq!(der[ANGLE][0], -(y + 2.0), epsilon = 1e-12);
        assert_abs_diff_eq!(der[ANGLE][1], x - 1.0, epsilon = 1e-12);
    }
}
