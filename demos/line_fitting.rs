//! Robust line fitting with RANSAC against noisy data and outliers.

use nalgebra::Point2;
use rand::prelude::*;
use robustfit::{estimate_line, EstimatorConfig, Method};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Robust line fitting ===\n");

    let n_inliers = 60;
    let n_outliers = 25;
    let true_slope = 2.0;
    let true_intercept = 1.0;

    println!("True line: y = {true_slope:.2}x + {true_intercept:.2}");
    println!("Generating {n_inliers} inliers and {n_outliers} outliers\n");

    let mut rng = thread_rng();
    let mut points = Vec::new();
    for i in 0..n_inliers {
        let x = (i as f64) * 0.2 - 6.0;
        let y = true_slope * x + true_intercept + rng.gen_range(-0.05..0.05);
        points.push(Point2::new(x, y));
    }
    for _ in 0..n_outliers {
        points.push(Point2::new(
            rng.gen_range(-10.0..10.0),
            rng.gen_range(-20.0..20.0),
        ));
    }
    points.shuffle(&mut rng);

    let mut config = EstimatorConfig::default();
    config.set_keep_inliers(true);
    config.set_refine_result(true);

    let outcome = estimate_line(&points, Method::Ransac, 0.2, None, Some(config))?;

    let line = &outcome.model;
    println!("Estimated line: {:.4}x + {:.4}y + {:.4} = 0", line.a, line.b, line.c);
    if line.b.abs() > 1e-9 {
        println!(
            "  slope-intercept: y = {:.4}x + {:.4}",
            -line.a / line.b,
            -line.c / line.b
        );
    }
    println!("  iterations: {}", outcome.iterations);
    if let Some(inliers) = &outcome.inliers {
        println!(
            "  inliers: {} of {} ({:.1}%)",
            inliers.len(),
            points.len(),
            100.0 * inliers.len() as f64 / points.len() as f64
        );
    }

    Ok(())
}
