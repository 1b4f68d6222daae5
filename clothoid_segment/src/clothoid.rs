use core::f64::consts::{FRAC_PI_2, PI};
use core::fmt;

use libm::{cos, fabs, sin, sqrt};
use uom::si::{
    angle::radian,
    curvature::radian_per_meter,
    f64::{Angle, Curvature, Length},
    length::meter,
};

use crate::euler::{integ_euler_moments, Complex};
use crate::fresnel::fresnel;
use crate::{wrap_radian, Float, Position};

pub const NUM_PARAMS: usize = 6;

/// Partial derivatives of position, one row of (d/dx, d/dy) per parameter in `Param` order
pub type ParamDer = [[Float; 2]; NUM_PARAMS];

/// Below this curvature rate the segment is evaluated as an arc
const ARC_CURVATURE_RATE: Float = 1e-12;
/// Below this curvature an arc is evaluated as a line
const FLAT_CURVATURE: Float = 1e-6;
/// Spirals that turn less than this (radians) away from their starting arc within |s| are
/// integrated directly, see `euler`
const NEAR_ARC_PHASE: Float = 0.1;

/// Index of each parameter in the parameter vector
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Param {
    X = 0,
    Y = 1,
    Angle = 2,
    Length = 3,
    Curvature = 4,
    /// curvature rate, change in curvature per unit length
    DCurvature = 5,
}

impl Param {
    pub const ALL: [Param; NUM_PARAMS] = [
        Param::X,
        Param::Y,
        Param::Angle,
        Param::Length,
        Param::Curvature,
        Param::DCurvature,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

pub(crate) const X: usize = Param::X as usize;
pub(crate) const Y: usize = Param::Y as usize;
pub(crate) const ANGLE: usize = Param::Angle as usize;
pub(crate) const LENGTH: usize = Param::Length as usize;
pub(crate) const CURVATURE: usize = Param::Curvature as usize;
pub(crate) const DCURVATURE: usize = Param::DCurvature as usize;

/// Which closed form the segment is evaluated with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regime {
    /// straight line, canonical point (t, 0)
    Line,
    /// circular arc, canonical point on the unit circle at angle t
    Arc,
    /// true clothoid, canonical point (C(t), S(t))
    Spiral,
}

pub(crate) type Mat2 = [[Float; 2]; 2];

pub(crate) fn mat_mul(m: &Mat2, v: [Float; 2]) -> [Float; 2] {
    [
        m[0][0] * v[0] + m[0][1] * v[1],
        m[1][0] * v[0] + m[1][1] * v[1],
    ]
}

pub(crate) fn rotation(angle: Float, scale: Float) -> Mat2 {
    let c = scale * cos(angle);
    let s = scale * sin(angle);
    [[c, -s], [s, c]]
}

/// Everything derived from the parameter vector, always rebuilt as a whole
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Canonical {
    pub(crate) regime: Regime,
    /// canonical parameter at s = 0
    pub(crate) t1: Float,
    /// canonical parameter per unit arc length
    pub(crate) tdiff: Float,
    /// 1 / sqrt(pi |dk|) for a spiral, zero otherwise
    pub(crate) scale: Float,
    /// canonical space to world space
    pub(crate) mat: Mat2,
    /// canonical point at s = 0
    pub(crate) start_cs: [Float; 2],
    /// world = start_shift + mat * canonical
    pub(crate) start_shift: [Float; 2],
}

impl Canonical {
    fn new(params: &[Float; NUM_PARAMS]) -> Self {
        let angle = params[ANGLE];
        let curvature = params[CURVATURE];
        let dcurvature = params[DCURVATURE];

        let (regime, t1, tdiff, scale, mat, start_cs) = if fabs(dcurvature) < ARC_CURVATURE_RATE {
            if fabs(curvature) < FLAT_CURVATURE {
                (Regime::Line, 0.0, 1.0, 0.0, rotation(angle, 1.0), [0.0, 0.0])
            } else {
                let mat = rotation(angle - FRAC_PI_2, 1.0 / curvature);
                (Regime::Arc, 0.0, curvature, 0.0, mat, [1.0, 0.0])
            }
        } else {
            let scale = sqrt(fabs(1.0 / (PI * dcurvature)));
            let t1 = curvature * scale;
            let tdiff = dcurvature * scale;

            let mat = if tdiff > 0.0 {
                rotation(angle - t1 * t1 * FRAC_PI_2, PI * scale)
            } else {
                // S and C are odd, mirror the x axis so t can run backwards
                let [[c, _], [s, _]] = rotation(angle + t1 * t1 * FRAC_PI_2, PI * scale);
                [[-c, -s], [-s, c]]
            };

            let (fs, fc) = fresnel(t1);
            (Regime::Spiral, t1, tdiff, scale, mat, [fc, fs])
        };

        let shift = mat_mul(&mat, start_cs);
        let start_shift = [params[X] - shift[0], params[Y] - shift[1]];

        log::trace!("clothoid {regime:?} t1 {t1:.6} tdiff {tdiff:.6}");

        Self {
            regime,
            t1,
            tdiff,
            scale,
            mat,
            start_cs,
            start_shift,
        }
    }

    pub(crate) fn t(&self, s: Float) -> Float {
        self.t1 + s * self.tdiff
    }

    /// canonical point at t minus the canonical start point
    ///
    /// Evaluated as a difference so that the large canonical coordinates of small curvature
    /// arcs don't cancel against start_shift.
    pub(crate) fn delta(&self, t: Float) -> [Float; 2] {
        match self.regime {
            Regime::Line => [t, 0.0],
            Regime::Arc => {
                let half = sin(0.5 * t);
                [-2.0 * half * half, sin(t)]
            }
            Regime::Spiral => {
                let (fs, fc) = fresnel(t);
                [fc - self.start_cs[0], fs - self.start_cs[1]]
            }
        }
    }
}

/// A clothoid segment
///
/// The six parameters are the start point, the start heading, the length, the start
/// curvature and the curvature rate; curvature at arc length s is `curvature + s * dcurvature`.
///
/// Every query assumes a valid segment (see `is_valid`), an invalid one gives meaningless
/// but finite-or-NaN numbers rather than panicking.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Clothoid {
    params: [Float; NUM_PARAMS],
    canonical: Canonical,
}

impl Default for Clothoid {
    fn default() -> Self {
        Self::from_params([0.0; NUM_PARAMS])
    }
}

impl fmt::Display for Clothoid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, theta0, length, kappa0, dk] = self.params;
        write!(f, "Clothoid: [")?;
        write!(f, "\n\tx: {x:0.3}, y: {y:0.3}")?;
        write!(
            f,
            "\n\ttheta0 (initial yaw/heading): {theta0:0.3}radians ({:0.3}°)",
            theta0 * 180.0 / PI
        )?;
        write!(f, "\n\tkappa0 (curvature 1/r): {kappa0:0.3}")?;
        if kappa0 != 0.0 {
            write!(f, " radius: {:.3}", 1.0 / kappa0)?;
        }
        write!(
            f,
            "\n\tdk (curvature rate, curvature per unit length): {dk:0.6}"
        )?;
        write!(f, "\n\tlength: {length:0.3}")?;
        write!(f, "\n\tregime: {:?}\n]", self.canonical.regime)
    }
}

impl Clothoid {
    /// Segment starting at `start` heading along `theta0`, with curvature going linearly from
    /// `curvature0` to `curvature1` over `length`
    ///
    /// A zero length segment gets a zero curvature rate.
    pub fn create(
        start: Position,
        theta0: Angle,
        length: Length,
        curvature0: Curvature,
        curvature1: Curvature,
    ) -> Self {
        let [x, y] = start.as_array_meter();
        let length = length.get::<meter>();
        let curvature0 = curvature0.get::<radian_per_meter>();
        let curvature1 = curvature1.get::<radian_per_meter>();
        let dcurvature = if length == 0.0 {
            0.0
        } else {
            (curvature1 - curvature0) / length
        };
        Self::from_params([
            x,
            y,
            theta0.get::<radian>(),
            length,
            curvature0,
            dcurvature,
        ])
    }

    /// Segment from a raw parameter vector in `Param` order (SI units), the angle gets wrapped
    pub fn from_params(mut params: [Float; NUM_PARAMS]) -> Self {
        params[ANGLE] = wrap_radian(params[ANGLE]);
        let canonical = Canonical::new(&params);
        Self { params, canonical }
    }

    /// The parameter vector in `Param` order (SI units)
    pub fn params(&self) -> [Float; NUM_PARAMS] {
        self.params
    }

    pub fn param(&self, param: Param) -> Float {
        self.params[param.index()]
    }

    pub fn regime(&self) -> Regime {
        self.canonical.regime
    }

    /// The canonical-to-world map and translation for the current regime
    pub fn canonical_transform(&self) -> ([[Float; 2]; 2], [Float; 2]) {
        (self.canonical.mat, self.canonical.start_shift)
    }

    /// A segment is valid when its length isn't negative, every other operation assumes it is
    pub fn is_valid(&self) -> bool {
        self.params[LENGTH] >= 0.0
    }

    pub fn length(&self) -> Length {
        Length::new::<meter>(self.params[LENGTH])
    }

    /// curvature rate in radians per square meter
    pub fn curvature_rate(&self) -> Float {
        self.params[DCURVATURE]
    }

    pub fn start_pos(&self) -> Position {
        Position::from_array_meter([self.params[X], self.params[Y]])
    }

    pub fn end_pos(&self) -> Position {
        self.get_xy(self.length())
    }

    pub fn start_angle(&self) -> Angle {
        Angle::new::<radian>(self.params[ANGLE])
    }

    pub fn end_angle(&self) -> Angle {
        self.get_theta(self.length())
    }

    pub fn start_curvature(&self) -> Curvature {
        Curvature::new::<radian_per_meter>(self.params[CURVATURE])
    }

    pub fn end_curvature(&self) -> Curvature {
        self.get_curvature(self.length())
    }

    pub(crate) fn canonical(&self) -> &Canonical {
        &self.canonical
    }

    /// A spiral so close to an arc up to s that the Fresnel phase `pi t^2 / 2` can't resolve it
    pub(crate) fn is_near_arc(&self, s: Float) -> bool {
        self.canonical.regime == Regime::Spiral
            && 0.5 * fabs(self.params[DCURVATURE]) * s * s < NEAR_ARC_PHASE
    }

    /// Euler moments `[J_0, J_1, J_2]` of the segment up to s
    pub(crate) fn euler_moments(&self, s: Float) -> [Complex; 3] {
        integ_euler_moments(self.params[CURVATURE] * s, self.params[DCURVATURE] * s * s)
    }

    pub(crate) fn pos_meter(&self, s: Float) -> [Float; 2] {
        let delta = if self.is_near_arc(s) {
            let [j0, _, _] = self.euler_moments(s);
            mat_mul(&rotation(self.params[ANGLE], s), j0)
        } else {
            mat_mul(&self.canonical.mat, self.canonical.delta(self.canonical.t(s)))
        };
        [self.params[X] + delta[0], self.params[Y] + delta[1]]
    }

    pub(crate) fn theta_radian(&self, s: Float) -> Float {
        self.params[ANGLE] + s * (self.params[CURVATURE] + 0.5 * s * self.params[DCURVATURE])
    }

    pub(crate) fn curvature_at(&self, s: Float) -> Float {
        self.params[CURVATURE] + s * self.params[DCURVATURE]
    }

    /// position at arc length s of a valid segment, s outside [0, length] extrapolates
    pub fn get_xy(&self, s: Length) -> Position {
        Position::from_array_meter(self.pos_meter(s.get::<meter>()))
    }

    /// unit tangent at arc length s, valid segments only
    pub fn get_tangent(&self, s: Length) -> [Float; 2] {
        let theta = self.theta_radian(s.get::<meter>());
        [cos(theta), sin(theta)]
    }

    /// second derivative of position with respect to arc length, the curvature vector (1/m)
    ///
    /// Only meaningful for a valid segment.
    pub fn get_der2(&self, s: Length) -> [Float; 2] {
        let s = s.get::<meter>();
        let theta = self.theta_radian(s);
        let kappa = self.curvature_at(s);
        [-kappa * sin(theta), kappa * cos(theta)]
    }

    /// position, tangent and second derivative at arc length s of a valid segment
    pub fn eval(&self, s: Length) -> (Position, [Float; 2], [Float; 2]) {
        (self.get_xy(s), self.get_tangent(s), self.get_der2(s))
    }

    /// heading at arc length s, not wrapped; valid segments only
    pub fn get_theta(&self, s: Length) -> Angle {
        Angle::new::<radian>(self.theta_radian(s.get::<meter>()))
    }

    /// curvature at arc length s, valid segments only
    pub fn get_curvature(&self, s: Length) -> Curvature {
        Curvature::new::<radian_per_meter>(self.curvature_at(s.get::<meter>()))
    }

    /// Closest point projection, not supported yet: always None
    pub fn project(&self, _point: &Position) -> Option<Length> {
        None
    }

    /// Keep only the part of a valid segment between s_from and s_to, which the caller keeps
    /// inside [0, length] with s_from <= s_to
    pub fn trim(&mut self, s_from: Length, s_to: Length) {
        let s0 = s_from.get::<meter>();
        let [x, y] = self.pos_meter(s0);
        let mut params = self.params;
        params[X] = x;
        params[Y] = y;
        // heading and curvature both read the old start curvature
        params[ANGLE] = self.theta_radian(s0);
        params[CURVATURE] = self.curvature_at(s0);
        params[LENGTH] = s_to.get::<meter>() - s0;
        *self = Self::from_params(params);
    }

    /// Reverse the direction of travel of a valid segment, the old end becomes the new start
    pub fn flip(&mut self) {
        let length = self.params[LENGTH];
        let [x, y] = self.pos_meter(length);
        let mut params = self.params;
        params[X] = x;
        params[Y] = y;
        params[ANGLE] = PI + self.theta_radian(length);
        params[CURVATURE] = -self.curvature_at(length);
        *self = Self::from_params(params);
    }

    #[must_use]
    pub fn trimmed(&self, s_from: Length, s_to: Length) -> Self {
        let mut clothoid = *self;
        clothoid.trim(s_from, s_to);
        clothoid
    }

    #[must_use]
    pub fn flipped(&self) -> Self {
        let mut clothoid = *self;
        clothoid.flip();
        clothoid
    }

    /// NUM evenly spaced points from start to end of a valid segment
    pub fn get_points<const NUM: usize>(&self) -> [[Float; 2]; NUM] {
        let mut xys = [[0.0; 2]; NUM];

        let step = if NUM > 1 {
            self.params[LENGTH] / ((NUM - 1) as Float)
        } else {
            0.0
        };

        for (i, xys_i) in xys.iter_mut().enumerate() {
            *xys_i = self.pos_meter(i as Float * step);
        }

        xys
    }

    /// `get_points` with a run time count, at least one point
    #[cfg(feature = "std")]
    pub fn get_points_num(&self, num: usize) -> std::vec::Vec<[Float; 2]> {
        let num = num.max(1);
        let step = if num > 1 {
            self.params[LENGTH] / ((num - 1) as Float)
        } else {
            0.0
        };

        (0..num).map(|i| self.pos_meter(i as Float * step)).collect()
    }
}
