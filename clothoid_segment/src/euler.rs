//! Moments of the Euler spiral integrand
//!
//! ```text
//! J_m(k0, k1) = ∫_0^1 v^m exp(i (k0 v + k1 v² / 2)) dv,   m = 0, 1, 2
//! ```
//!
//! A point at arc length s on a segment with heading theta0, curvature k and curvature rate dk
//! is `start + s exp(i theta0) J_0(k s, dk s²)`, and J_1, J_2 are its derivatives with respect
//! to k and dk up to a factor. Unlike the Fresnel form these stay accurate as dk goes to zero.
//!
//! The unit interval is cut into panels over which the phase moves at most about a radian
//! either side of the midpoint, and the exponential is expanded as a power series there.

use libm::{ceil, cos, fabs, sin};

use crate::Float;

/// (re, im)
pub(crate) type Complex = [Float; 2];

/// Power series terms per panel
const NUM_TERMS: usize = 26;

fn mul(a: Complex, b: Complex) -> Complex {
    [a[0] * b[0] - a[1] * b[1], a[0] * b[1] + a[1] * b[0]]
}

/// `∫_{-1}^{1} w^p exp(i (a w + b w²)) dw` for p = 0, 1, 2, with |a| <= 1 and |b| <= 1/4
fn panel(a: Float, b: Float) -> [Complex; 3] {
    let mut out = [[0.0; 2]; 3];
    // coefficients of the exponential series, (j + 1) e[j + 1] = i a e[j] + 2 i b e[j - 1]
    let mut prev: Complex = [0.0, 0.0];
    let mut cur: Complex = [1.0, 0.0];
    for j in 0..NUM_TERMS {
        for (p, out_p) in out.iter_mut().enumerate() {
            // odd powers integrate to zero over the symmetric panel
            if (j + p) % 2 == 0 {
                let w = 2.0 / (j + p + 1) as Float;
                out_p[0] += w * cur[0];
                out_p[1] += w * cur[1];
            }
        }
        let re = a * cur[0] + 2.0 * b * prev[0];
        let im = a * cur[1] + 2.0 * b * prev[1];
        let n = (j + 1) as Float;
        prev = cur;
        cur = [-im / n, re / n];
    }
    out
}

/// `[J_0, J_1, J_2]` for phase `k0 v + k1 v² / 2`
pub(crate) fn integ_euler_moments(k0: Float, k1: Float) -> [Complex; 3] {
    let n = ceil(0.5 * (fabs(k0) + fabs(k1))).max(1.0) as usize;
    let h = 0.5 / n as Float;

    let mut out = [[0.0; 2]; 3];
    for i in 0..n {
        let c = (2 * i + 1) as Float * h;
        let phase = (k0 + 0.5 * k1 * c) * c;
        let rot = [h * cos(phase), h * sin(phase)];
        let [a0, a1, a2] = panel(h * (k0 + k1 * c), 0.5 * k1 * h * h);

        // v^m = (c + h w)^m
        let moments = [
            a0,
            [c * a0[0] + h * a1[0], c * a0[1] + h * a1[1]],
            [
                c * c * a0[0] + 2.0 * c * h * a1[0] + h * h * a2[0],
                c * c * a0[1] + 2.0 * c * h * a1[1] + h * h * a2[1],
            ],
        ];
        for (o, m) in out.iter_mut().zip(moments) {
            let r = mul(rot, m);
            o[0] += r[0];
            o[1] += r[1];
        }
    }
    out
}
