// The masked Newton iteration over a grid of complex samples.
//
// For each pixel track the number of iterations its sample stayed above
// the convergence tolerance. Instead of re-walking the full grid every
// iteration the engine keeps a compacted working set of the cells still
// converging; a cell that drops out is never revisited, so late
// iterations only touch the stubborn samples.
//
// A cell whose derivative vanishes gets a non-finite Newton step. Such a
// cell is deactivated on that step exactly as if it had converged. This
// conflates roots with singularities but matches the rendered output the
// tolerance test produces for every other cell, and it keeps the loop
// free of special cases.

use std::io::{Error, ErrorKind};
use std::time::Instant;

use log::info;
use num::complex::Complex64;

use crate::grid::{build_grid, Resolution, SampleGrid, ViewExtent};
use crate::polynomial::Polynomial;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct IterationConfig {
    pub niter : u32,
    pub eps : f64
}

impl IterationConfig {
    pub fn new(niter : u32, eps : f64) -> std::io::Result<IterationConfig> {
        if niter == 0 {
            return Err(Error::new(ErrorKind::InvalidData, "Iteration bound must be positive"))
        }
        if !eps.is_finite() || eps <= 0.0 {
            return Err(Error::new(ErrorKind::InvalidData, "Tolerance must be positive and finite"))
        }
        Ok(IterationConfig { niter : niter, eps : eps })
    }
}

// Per pixel count of iterations spent above the tolerance, row major
// with row 0 at ystart
pub struct IterationGrid {
    width : u32,
    height : u32,
    counts : Vec<u32>
}

impl IterationGrid {
    fn zeros(width : u32, height : u32) -> IterationGrid {
        IterationGrid {
            width : width,
            height : height,
            counts : vec![0; (width as usize) * (height as usize)]
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn at(&self, row : u32, column : u32) -> u32 {
        self.counts[(row as usize) * (self.width as usize) + (column as usize)]
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

pub struct NewtonIterationEngine {
    polynomial : Polynomial,
    differential : Polynomial,
    config : IterationConfig
}

impl NewtonIterationEngine {
    pub fn new(polynomial : Polynomial, config : IterationConfig) -> NewtonIterationEngine {
        let differential = polynomial.derivative();
        NewtonIterationEngine {
            polynomial : polynomial,
            differential : differential,
            config : config
        }
    }

    pub fn polynomial(&self) -> &Polynomial {
        &self.polynomial
    }

    pub fn compute_image(&self, extent : &ViewExtent, resolution : &Resolution) -> IterationGrid {
        let then = Instant::now();
        let grid = build_grid(extent, resolution);
        let (counts, _) = self.iterate(grid);
        let elapsed = then.elapsed().as_secs_f64();
        info!(
            "computed {} pixels in {:.3}s ({:.0} pixels/s)",
            resolution.pixels(), elapsed, resolution.pixels() as f64 / elapsed
        );
        counts
    }

    // Run the Newton loop, also reporting how many cells were still
    // active after each iteration's tolerance test
    fn iterate(&self, grid : SampleGrid) -> (IterationGrid, Vec<usize>) {
        let mut counts = IterationGrid::zeros(grid.width, grid.height);
        let mut zs = grid.samples;
        let mut active : Vec<usize> = (0..zs.len()).collect();
        let mut history = Vec::new();
        let eps = self.config.eps;
        for _ in 1..=self.config.niter {
            let working : Vec<Complex64> = active.iter().map(|&cell| zs[cell]).collect();
            let f = self.polynomial.evaluate_many(&working);
            let fd = self.differential.evaluate_many(&working);
            let mut survivors = Vec::with_capacity(active.len());
            for ((&cell, f), fd) in active.iter().zip(f).zip(fd) {
                // A zero derivative makes the step non-finite; the cell
                // then fails the tolerance test below and drops out
                let delta = f / fd;
                zs[cell] -= delta;
                let step = delta.norm();
                if step.is_finite() && step > eps {
                    survivors.push(cell);
                }
            }
            active = survivors;
            history.push(active.len());
            if active.is_empty() {
                break;
            }
            for &cell in active.iter() {
                counts.counts[cell] += 1;
            }
        }
        (counts, history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_engine(niter : u32, eps : f64) -> NewtonIterationEngine {
        // (z-1)(z-2)(z-3)
        let poly = Polynomial::new(vec!(-6.0, 11.0, -6.0, 1.0));
        NewtonIterationEngine::new(poly, IterationConfig::new(niter, eps).unwrap())
    }

    #[test]
    fn test_counts_bounded_by_iteration_limit() {
        let engine = demo_engine(500, 1e-5);
        let extent = ViewExtent::new(-20.0, 20.0, -20.0, 20.0).unwrap();
        let resolution = Resolution::new(5, 5).unwrap();
        let counts = engine.compute_image(&extent, &resolution);
        assert_eq!(counts.width(), 5);
        assert_eq!(counts.height(), 5);
        assert_eq!(counts.counts().len(), 25);
        assert!(counts.counts().iter().all(|&n| n <= 500));
    }

    #[test]
    fn test_active_set_never_grows() {
        let engine = demo_engine(500, 1e-5);
        let extent = ViewExtent::new(-20.0, 20.0, -20.0, 20.0).unwrap();
        let resolution = Resolution::new(8, 8).unwrap();
        let (_, history) = engine.iterate(build_grid(&extent, &resolution));
        assert!(!history.is_empty());
        for pair in history.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_sample_on_root_converges_immediately() {
        let engine = demo_engine(500, 1e-5);
        // 3x3 grid over (1,3)x(-1,1) puts the centre sample exactly on
        // the root at 2+0i
        let extent = ViewExtent::new(1.0, 3.0, -1.0, 1.0).unwrap();
        let resolution = Resolution::new(3, 3).unwrap();
        let grid = build_grid(&extent, &resolution);
        assert_eq!(grid.at(1, 1), Complex64::new(2.0, 0.0));
        let counts = engine.compute_image(&extent, &resolution);
        assert!(counts.at(1, 1) < 5);
    }

    #[test]
    fn test_identical_requests_give_identical_grids() {
        let engine = demo_engine(200, 1e-5);
        let extent = ViewExtent::new(-5.0, 5.0, -5.0, 5.0).unwrap();
        let resolution = Resolution::new(7, 7).unwrap();
        let first = engine.compute_image(&extent, &resolution);
        let second = engine.compute_image(&extent, &resolution);
        assert_eq!(first.counts(), second.counts());
    }

    #[test]
    fn test_zoom_leaves_polynomial_untouched() {
        let engine = demo_engine(500, 1e-5);
        let coefficients : Vec<f64> = engine.polynomial().coefficients().to_vec();
        let wide = ViewExtent::new(1.0, 3.0, -1.0, 1.0).unwrap();
        engine.compute_image(&wide, &Resolution::new(5, 5).unwrap());
        // Halve the extent around the root at 2 and double the resolution
        let zoomed = ViewExtent::new(1.5, 2.5, -0.5, 0.5).unwrap();
        let resolution = Resolution::new(10, 10).unwrap();
        let (counts, history) = engine.iterate(build_grid(&zoomed, &resolution));
        assert_eq!(engine.polynomial().coefficients(), &coefficients[..]);
        assert_eq!(counts.counts().len(), 100);
        assert!(counts.counts().iter().all(|&n| n <= 500));
        for pair in history.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_singular_derivative_deactivates_cell() {
        // z^2 + 1 has derivative 2z, which vanishes at the origin
        let poly = Polynomial::new(vec!(1.0, 0.0, 1.0));
        let engine = NewtonIterationEngine::new(poly, IterationConfig::new(50, 1e-5).unwrap());
        let extent = ViewExtent::new(-1.0, 1.0, -1.0, 1.0).unwrap();
        let resolution = Resolution::new(3, 3).unwrap();
        let grid = build_grid(&extent, &resolution);
        assert_eq!(grid.at(1, 1), Complex64::new(0.0, 0.0));
        let counts = engine.compute_image(&extent, &resolution);
        // The singular cell drops out on the first step, it never hangs
        // around as perpetually active
        assert_eq!(counts.at(1, 1), 0);
    }

    #[test]
    fn test_zero_iteration_bound_rejected() {
        let result = IterationConfig::new(0, 1e-5);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_bad_tolerance_rejected() {
        assert!(IterationConfig::new(500, 0.0).is_err());
        assert!(IterationConfig::new(500, -1.0).is_err());
        assert!(IterationConfig::new(500, f64::NAN).is_err());
    }

    #[test]
    fn test_early_exit_on_tame_region() {
        // Around a single root everything converges long before the bound
        let engine = demo_engine(10_000, 1e-5);
        let extent = ViewExtent::new(1.9, 2.1, -0.1, 0.1).unwrap();
        let resolution = Resolution::new(4, 4).unwrap();
        let (counts, history) = engine.iterate(build_grid(&extent, &resolution));
        assert!(history.len() < 10_000);
        assert_eq!(*history.last().unwrap(), 0);
        assert!(counts.max_count() < 100);
    }
}
