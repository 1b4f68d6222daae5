//! Normalized Fresnel integrals
//!
//! ```text
//! S(x) = ∫_0^x sin(π t² / 2) dt,   C(x) = ∫_0^x cos(π t² / 2) dt
//! ```
//!
//! | x   | C(x)       | S(x)       |
//! | :-: | :--------: | :--------: |
//! | 0.0 | 0.00000000 | 0.00000000 |
//! | 0.5 | 0.49234423 | 0.06473243 |
//! | 1.0 | 0.77989340 | 0.43825915 |
//! | 1.5 | 0.44526118 | 0.69750496 |
//! | 2.0 | 0.48825341 | 0.34341568 |
//! | 2.5 | 0.45741301 | 0.61918176 |
//!
//! Adapted from William J. Thompson, Atlas for computing mathematical functions (Wiley, 1997),
//! C version by Venkata Sivakanth Telasula, by way of ebertolazzi/Clothoids Fresnel.cc

use core::f64::consts::{FRAC_PI_2, PI};

use libm::{cos, fabs, sin};

use crate::Float;

const EPS: Float = 1E-15;

#[allow(clippy::excessive_precision)]
const FRN: [Float; 11] = [
    0.49999988085884732562,
    1.3511177791210715095,
    1.3175407836168659241,
    1.1861149300293854992,
    0.7709627298888346769,
    0.4173874338787963957,
    0.19044202705272903923,
    0.06655998896627697537,
    0.022789258616785717418,
    0.0040116689358507943804,
    0.0012192036851249883877,
];

#[allow(clippy::excessive_precision)]
const FRD: [Float; 12] = [
    1.0,
    2.7022305772400260215,
    4.2059268151438492767,
    4.5221882840107715516,
    3.7240352281630359588,
    2.4589286254678152943,
    1.3125491629443702962,
    0.5997685720120932908,
    0.20907680750378849485,
    0.07159621634657901433,
    0.012602969513793714191,
    0.0038302423512931250065,
];

#[allow(clippy::excessive_precision)]
const GN: [Float; 11] = [
    0.50000014392706344801,
    0.032346434925349128728,
    0.17619325157863254363,
    0.038606273170706486252,
    0.023693692309257725361,
    0.007092018516845033662,
    0.0012492123212412087428,
    0.00044023040894778468486,
    -8.80266827476172521e-6,
    -1.4033554916580018648e-8,
    2.3509221782155474353e-10,
];

#[allow(clippy::excessive_precision)]
const GD: [Float; 12] = [
    1.0,
    2.0646987497019598937,
    2.9109311766948031235,
    2.6561936751333032911,
    2.0195563983177268073,
    1.1167891129189363902,
    0.57267874755973172715,
    0.19408481169593070798,
    0.07634808341431248904,
    0.011573247407207865977,
    0.0044099273693067311209,
    -0.00009070958410429993314,
];

/// evaluate num(x) / den(x) with horner, num has one less coefficient than den
fn rational(num: &[Float; 11], den: &[Float; 12], x: Float) -> Float {
    let mut sumn = 0.0;
    let mut sumd = den[11];
    for k in (0..=10).rev() {
        sumn = num[k] + x * sumn;
        sumd = den[k] + x * sumd;
    }
    sumn / sumd
}

/// power series for x < 1, returns (C, S)
fn series(x: Float) -> (Float, Float) {
    let s = FRAC_PI_2 * (x * x);
    let t = -s * s;

    let c_value = {
        let mut twofn = 0.0;
        let mut fact = 1.0;
        let mut denterm = 1.0;
        let mut numterm = 1.0;
        let mut sum: Float = 1.0;
        loop {
            twofn += 2.0;
            fact *= twofn * (twofn - 1.0);
            denterm += 4.0;
            numterm *= t;
            let term = numterm / (fact * denterm);
            sum += term;
            if fabs(term) <= EPS * fabs(sum) {
                break;
            }
        }
        x * sum
    };

    let s_value = {
        let mut twofn = 1.0;
        let mut fact = 1.0;
        let mut denterm = 3.0;
        let mut numterm = 1.0;
        let mut sum: Float = numterm / denterm;
        loop {
            twofn += 2.0;
            fact *= twofn * (twofn - 1.0);
            denterm += 4.0;
            numterm *= t;
            let term = numterm / (fact * denterm);
            sum += term;
            if fabs(term) <= EPS * fabs(sum) {
                break;
            }
        }
        FRAC_PI_2 * sum * (x * x * x)
    };

    (c_value, s_value)
}

/// asymptotic expansions of the auxiliary functions f and g for x >= 6
fn asymptotic_fg(x: Float) -> (Float, Float) {
    let s = PI * x * x;
    let t = -1.0 / (s * s);
    let eps10 = 0.1 * EPS;

    let mut numterm = -1.0;
    let mut term = 1.0;
    let mut sum = 1.0;
    loop {
        numterm += 4.0;
        term *= numterm * (numterm - 2.0) * t;
        sum += term;
        if fabs(term) <= eps10 * fabs(sum) {
            break;
        }
    }
    let f = sum / (PI * x);

    numterm = -1.0;
    term = 1.0;
    sum = 1.0;
    loop {
        numterm += 4.0;
        term *= numterm * (numterm + 2.0) * t;
        sum += term;
        if fabs(term) <= eps10 * fabs(sum) {
            break;
        }
    }
    let g0 = PI * x;
    let g = sum / (g0 * g0 * x);

    (f, g)
}

/// Fresnel sine and cosine integrals at `y`, returned as `(S(y), C(y))`
///
/// Both are odd functions, only |y| is evaluated and the sign is applied at the end.
pub fn fresnel(y: Float) -> (Float, Float) {
    let x = fabs(y);

    let (mut c_value, mut s_value) = if x < 1.0 {
        series(x)
    } else {
        let (f, g) = if x < 6.0 {
            (rational(&FRN, &FRD, x), rational(&GN, &GD, x))
        } else {
            asymptotic_fg(x)
        };
        let u_value = FRAC_PI_2 * (x * x);
        let sin_u = sin(u_value);
        let cos_u = cos(u_value);
        (0.5 + f * sin_u - g * cos_u, 0.5 - f * cos_u - g * sin_u)
    };

    if y < 0.0 {
        c_value = -c_value;
        s_value = -s_value;
    }

    (s_value, c_value)
}
