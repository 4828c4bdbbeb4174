//! Robust circle fitting, comparing MSAC with PROMedS on contaminated
//! edge points.

use nalgebra::Point2;
use rand::prelude::*;
use robustfit::{estimate_circle, Method};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Robust circle fitting ===\n");

    let center = Point2::new(3.0, -2.0);
    let radius = 8.0;
    let n_points = 200;
    let n_outliers = 50;

    println!("True circle: center ({:.1}, {:.1}), radius {radius:.1}", center.x, center.y);

    let mut rng = thread_rng();
    let mut points: Vec<Point2<f64>> = (0..n_points)
        .map(|i| {
            let angle = i as f64 * 2.0 * std::f64::consts::PI / n_points as f64;
            Point2::new(
                center.x + radius * angle.cos() + rng.gen_range(-0.01..0.01),
                center.y + radius * angle.sin() + rng.gen_range(-0.01..0.01),
            )
        })
        .collect();
    for p in points.iter_mut().take(n_outliers) {
        p.x += rng.gen_range(3.0..15.0);
        p.y -= rng.gen_range(3.0..15.0);
    }

    let msac = estimate_circle(&points, Method::Msac, 0.05, None, None)?;
    println!(
        "\nMSAC:    center ({:.3}, {:.3}), radius {:.3}, {} iterations",
        msac.model.center.x, msac.model.center.y, msac.model.radius, msac.iterations
    );

    // Quality scores: pretend the detector ranked the contaminated
    // points lowest.
    let scores: Vec<f64> = (0..points.len())
        .map(|i| if i < n_outliers { 0.05 } else { 1.0 })
        .collect();
    let promeds = estimate_circle(&points, Method::Promeds, 0.05, Some(&scores), None)?;
    println!(
        "PROMedS: center ({:.3}, {:.3}), radius {:.3}, {} iterations",
        promeds.model.center.x, promeds.model.center.y, promeds.model.radius, promeds.iterations
    );

    Ok(())
}
