//! Fit one segment to points sampled at known arc lengths
//!
//! The curve fitting pipeline that chains many segments lives elsewhere, this is the argmin
//! problem for a single segment, driven by the analytic parameter derivatives.

use std::vec::Vec;

use argmin::{
    core::{observers::ObserverMode, CostFunction, Error, Executor, Gradient, State},
    solver::{gradientdescent::SteepestDescent, linesearch::MoreThuenteLineSearch},
};
use argmin_observer_slog::SlogLogger;
use uom::si::{f64::Length, length::meter};

use crate::{Clothoid, Float, Position, NUM_PARAMS};

/// A point the segment should pass through at arc length `s`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitSample {
    pub s: Length,
    pub target: Position,
}

#[derive(Clone, Debug)]
pub struct FitConfig {
    pub max_iters: u64,
    /// stop once the summed squared distance is below this (square meters)
    pub target_cost: Float,
    /// log every solver iteration to the terminal
    pub verbose: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iters: 150,
            target_cost: 1e-12,
            verbose: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FitResult {
    pub clothoid: Clothoid,
    pub cost: Float,
    pub iterations: u64,
}

/// Least squares distance between a segment and a set of samples
///
/// The argmin parameter vector is the segment parameter vector, the length is held fixed
/// because positions at fixed arc length don't depend on it.
#[derive(Clone, Debug)]
pub struct SegmentFit {
    samples: Vec<FitSample>,
}

fn to_clothoid(p: &[Float]) -> Result<Clothoid, Error> {
    let params: [Float; NUM_PARAMS] = p
        .try_into()
        .map_err(|_| Error::msg("segment parameter vector needs 6 entries"))?;
    Ok(Clothoid::from_params(params))
}

impl SegmentFit {
    pub fn new(samples: Vec<FitSample>) -> Self {
        Self { samples }
    }

    /// num samples evenly spaced along an existing segment
    pub fn sample(clothoid: &Clothoid, num: usize) -> Self {
        let points = clothoid.get_points_num(num);
        let step = if points.len() > 1 {
            clothoid.length() / ((points.len() - 1) as Float)
        } else {
            Length::new::<meter>(0.0)
        };
        let samples = points
            .into_iter()
            .enumerate()
            .map(|(i, xy)| FitSample {
                s: step * i as Float,
                target: Position::from_array_meter(xy),
            })
            .collect();
        Self { samples }
    }

    pub fn samples(&self) -> &[FitSample] {
        &self.samples
    }

    /// sum of squared distances in square meters
    pub fn cost0(&self, clothoid: &Clothoid) -> Float {
        self.samples
            .iter()
            .map(|sample| {
                let [x, y] = clothoid.pos_meter(sample.s.get::<meter>());
                let [tx, ty] = sample.target.as_array_meter();
                (x - tx) * (x - tx) + (y - ty) * (y - ty)
            })
            .sum()
    }

    /// gradient of `cost0` with respect to the parameter vector, 2 J^T r summed over samples
    pub fn gradient0(&self, clothoid: &Clothoid) -> [Float; NUM_PARAMS] {
        let mut gradient = [0.0; NUM_PARAMS];
        for sample in &self.samples {
            let s = sample.s.get::<meter>();
            let [x, y] = clothoid.pos_meter(s);
            let [tx, ty] = sample.target.as_array_meter();
            let residual = [x - tx, y - ty];
            let der = clothoid.derivative_at_meter(s);
            for (g, row) in gradient.iter_mut().zip(der.iter()) {
                *g += 2.0 * (row[0] * residual[0] + row[1] * residual[1]);
            }
        }
        gradient
    }

    /// Steepest descent from `initial`, returns the best segment found
    pub fn fit(&self, initial: &Clothoid, config: &FitConfig) -> Result<FitResult, Error> {
        let init_param: Vec<Float> = initial.params().to_vec();
        log::debug!("initial cost {:.6e}", self.cost0(initial));

        let linesearch = MoreThuenteLineSearch::new();
        let solver = SteepestDescent::new(linesearch);

        let mut executor = Executor::new(self.clone(), solver).configure(|state| {
            state
                .param(init_param)
                .target_cost(config.target_cost)
                .max_iters(config.max_iters)
        });
        if config.verbose {
            executor = executor.add_observer(SlogLogger::term(), ObserverMode::Always);
        }
        let res = executor.run()?;

        let best = res
            .state
            .get_best_param()
            .ok_or_else(|| Error::msg("solver finished without a parameter vector"))?;
        let clothoid = to_clothoid(best)?;
        let cost = self.cost0(&clothoid);
        let iterations = res.state.get_iter();
        log::debug!("fit cost {cost:.6e} after {iterations} iterations");

        Ok(FitResult {
            clothoid,
            cost,
            iterations,
        })
    }
}

impl CostFunction for SegmentFit {
    type Param = Vec<Float>;
    type Output = Float;

    fn cost(&self, p: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.cost0(&to_clothoid(p)?))
    }
}

impl Gradient for SegmentFit {
    type Param = Vec<Float>;
    type Gradient = Vec<Float>;

    fn gradient(&self, p: &Self::Param) -> Result<Self::Gradient, Error> {
        Ok(self.gradient0(&to_clothoid(p)?).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use finitediff::FiniteDiff;
    use std::vec;

    fn target() -> Clothoid {
        Clothoid::from_params([0.5, -0.25, 0.4, 2.0, 0.5, 0.2])
    }

    #[test]
    fn sample_spacing() {
        let fit = SegmentFit::sample(&target(), 5);
        assert_eq!(fit.samples().len(), 5);
        assert_abs_diff_eq!(fit.samples()[4].s.get::<meter>(), 2.0, epsilon = 1e-12);
        assert_eq!(fit.cost0(&target()), 0.0);
    }

    #[test]
    fn gradient_matches_finite_difference() {
        // targets off the curve so every residual is non zero
        let samples = vec![
            FitSample {
                s: Length::new::<meter>(0.3),
                target: Position::new_meter(0.7, 0.1),
            },
            FitSample {
                s: Length::new::<meter>(1.1),
                target: Position::new_meter(1.2, 0.4),
            },
            FitSample {
                s: Length::new::<meter>(1.8),
                target: Position::new_meter(1.4, 1.1),
            },
        ];
        let fit = SegmentFit::new(samples);
        let p = target().params().to_vec();
        let analytic = fit.gradient(&p).unwrap();
        let numeric = p.central_diff(&|x| fit.cost(x).unwrap());
        assert_eq!(analytic[3], 0.0);
        for (a, n) in analytic.iter().zip(numeric.iter()) {
            assert_abs_diff_eq!(a, n, epsilon = 1e-5);
        }
    }

    #[test]
    fn bad_parameter_vector() {
        let fit = SegmentFit::sample(&target(), 3);
        assert!(fit.cost(&vec![0.0; 4]).is_err());
    }

    #[test]
    fn fit_recovers_offset_segment() {
        let fit = SegmentFit::sample(&target(), 12);
        let mut guess = target().params();
        guess[0] += 0.1;
        guess[1] -= 0.05;
        guess[2] += 0.02;
        let initial = Clothoid::from_params(guess);
        let initial_cost = fit.cost0(&initial);

        let config = FitConfig {
            max_iters: 20,
            ..Default::default()
        };
        let result = fit.fit(&initial, &config).unwrap();
        assert!(
            result.cost < 0.5 * initial_cost,
            "{} -> {}",
            initial_cost,
            result.cost
        );
        assert_eq!(result.clothoid.length(), target().length());
    }
}
