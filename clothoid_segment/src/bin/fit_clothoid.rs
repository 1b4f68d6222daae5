/// Fit a clothoid segment to points sampled from another one
///
/// fit_clothoid [theta0] [length] [curvature0] [curvature1]
/// run with RUST_LOG=debug to see the solver
use clothoid_segment::fit::{FitConfig, SegmentFit};
use clothoid_segment::{Clothoid, Float, Param, Position};

use argmin::core::Error;
use uom::si::{
    angle::radian,
    curvature::radian_per_meter,
    f64::{Angle, Curvature, Length},
    length::meter,
};

fn arg_or(args: &[String], index: usize, default: Float) -> Result<Float, Error> {
    match args.get(index) {
        Some(arg) => Ok(arg.parse()?),
        None => Ok(default),
    }
}

fn run() -> Result<(), Error> {
    let args: Vec<_> = std::env::args().collect();
    let theta0 = arg_or(&args, 1, 0.3)?;
    let length = arg_or(&args, 2, 2.0)?;
    let curvature0 = arg_or(&args, 3, 0.2)?;
    let curvature1 = arg_or(&args, 4, 1.0)?;

    let target = Clothoid::create(
        Position::default(),
        Angle::new::<radian>(theta0),
        Length::new::<meter>(length),
        Curvature::new::<radian_per_meter>(curvature0),
        Curvature::new::<radian_per_meter>(curvature1),
    );
    if !target.is_valid() {
        return Err(Error::msg(format!("invalid target segment\n{target}")));
    }
    log::info!("target {target}");

    let fit = SegmentFit::sample(&target, 16);

    // start from a shifted, rotated and flattened guess
    let mut guess = target.params();
    guess[Param::X.index()] += 0.2;
    guess[Param::Y.index()] -= 0.1;
    guess[Param::Angle.index()] += 0.05;
    guess[Param::DCurvature.index()] *= 0.5;
    let initial = Clothoid::from_params(guess);

    let config = FitConfig {
        verbose: true,
        ..Default::default()
    };
    let result = fit.fit(&initial, &config)?;

    log::info!(
        "cost {:.3e} -> {:.3e} after {} iterations",
        fit.cost0(&initial),
        result.cost,
        result.iterations
    );
    log::info!("solution {}", result.clothoid);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(ref e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
