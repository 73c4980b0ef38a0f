// Offline stand-ins for the interactive plot window: a surface that owns
// the zoomed view and an overview panel that mirrors its bounds as a
// hollow rectangle, wired together by an application context with an
// explicit init/run/teardown lifecycle.
//
// The context parses a json job description, renders the full extent once
// to back the overview, then replays any requested zoom steps through the
// same notification path an interactive canvas would use.

use std::io::{Error, ErrorKind};

use image::{GrayImage, Luma};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use json::JsonValue;
use rand::SeedableRng;

use crate::engine::{IterationConfig, IterationGrid, NewtonIterationEngine};
use crate::grid::{Resolution, ViewExtent};
use crate::polynomial::Polynomial;
use crate::view::{DisplaySurface, OverlaySync, ViewRecomputeController};

// Scale counts against the brightest cell; rows are flipped so ystart
// ends up at the bottom of the png
pub fn render_grayscale(grid : &IterationGrid) -> GrayImage {
    let mut img = GrayImage::new(grid.width(), grid.height());
    let max_count = grid.max_count().max(1);
    for row in 0..grid.height() {
        for column in 0..grid.width() {
            let val = ((grid.at(row, column) as u64) * 255) / (max_count as u64);
            img.put_pixel(column, grid.height() - 1 - row, Luma([val as u8]));
        }
    }
    img
}

pub struct PlotSurface {
    resolution : Resolution,
    extent : ViewExtent,
    autoscale : bool,
    image : Option<(IterationGrid, ViewExtent)>
}

impl PlotSurface {
    pub fn new(resolution : Resolution, extent : ViewExtent) -> PlotSurface {
        PlotSurface {
            resolution : resolution,
            extent : extent,
            autoscale : true,
            image : None
        }
    }

    // What an interactive zoom does to the axes before notifying
    pub fn set_view_extent(&mut self, extent : ViewExtent) {
        self.extent = extent;
    }

    pub fn image(&self) -> Option<&(IterationGrid, ViewExtent)> {
        self.image.as_ref()
    }
}

impl DisplaySurface for PlotSurface {
    fn pixel_resolution(&self) -> (u32, u32) {
        (self.resolution.width, self.resolution.height)
    }

    fn view_extent(&self) -> (f64, f64, f64, f64) {
        self.extent.as_tuple()
    }

    fn set_autoscale(&mut self, enabled : bool) {
        self.autoscale = enabled;
    }

    fn set_image(&mut self, grid : IterationGrid, extent : ViewExtent) {
        self.image = Some((grid, extent));
    }
}

pub struct OverviewPanel {
    image : GrayImage,
    extent : ViewExtent,
    overlay : ViewExtent
}

impl OverviewPanel {
    pub fn new(full_view : &IterationGrid, extent : ViewExtent) -> OverviewPanel {
        OverviewPanel {
            image : render_grayscale(full_view),
            extent : extent,
            overlay : extent
        }
    }

    pub fn overlay_bounds(&self) -> &ViewExtent {
        &self.overlay
    }

    // Overview with the current zoom bounds drawn on top
    pub fn render(&self) -> GrayImage {
        let mut img = self.image.clone();
        let x_scale = (img.width() as f64) / (self.extent.xend - self.extent.xstart);
        let y_scale = (img.height() as f64) / (self.extent.yend - self.extent.ystart);
        let x0 = (self.overlay.xstart - self.extent.xstart) * x_scale;
        // Row 0 of the png holds yend, so measure down from the top
        let y0 = (self.extent.yend - self.overlay.yend) * y_scale;
        let rect_width = ((self.overlay.xend - self.overlay.xstart) * x_scale).round().max(1.0);
        let rect_height = ((self.overlay.yend - self.overlay.ystart) * y_scale).round().max(1.0);
        draw_hollow_rect_mut(
            &mut img,
            Rect::at(x0.round() as i32, y0.round() as i32)
                .of_size(rect_width as u32, rect_height as u32),
            Luma([255u8])
        );
        img
    }
}

impl OverlaySync for OverviewPanel {
    fn set_overlay_bounds(&mut self, extent : ViewExtent) {
        self.overlay = extent;
    }
}

fn polynomial_from_json(input : &JsonValue) -> std::io::Result<Polynomial> {
    if let Some(degree) = input["random_degree"].as_usize() {
        let seed = input["seed"].as_u64().unwrap_or(0);
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        return Ok(Polynomial::random(degree, &mut rng))
    }
    if input["polynomial"].is_array() {
        Polynomial::from_json(&input["polynomial"])
    } else {
        // The classic (z-1)(z-2)(z-3) demo polynomial
        Ok(Polynomial::new(vec!(-6.0, 11.0, -6.0, 1.0)))
    }
}

pub struct AppContext {
    controller : ViewRecomputeController,
    surface : PlotSurface,
    overview : OverviewPanel,
    zoom : Vec<ViewExtent>
}

impl AppContext {
    pub fn init(input : &JsonValue) -> std::io::Result<AppContext> {
        let polynomial = polynomial_from_json(input)?;
        println!("{}", polynomial);
        let res_x = input["resolution_x"].as_u32().unwrap_or(500);
        let res_y = input["resolution_y"].as_u32().unwrap_or(500);
        let resolution = Resolution::new(res_x, res_y)?;
        let extent = if input["extent"].is_array() {
            ViewExtent::from_json(&input["extent"])?
        } else {
            ViewExtent::new(-20.0, 20.0, -20.0, 20.0)?
        };
        let niter = input["max_iterations"].as_u32().unwrap_or(500);
        let eps = input["convergence_size"].as_f64().unwrap_or(1e-5);
        let config = IterationConfig::new(niter, eps)?;
        let engine = NewtonIterationEngine::new(polynomial, config);
        let controller = ViewRecomputeController::new(engine);

        let mut zoom = Vec::new();
        for step in input["zoom"].members() {
            zoom.push(ViewExtent::from_json(step)?);
        }

        // The full extent render backs the overview panel and seeds the
        // surface with its first image
        let full_view = controller.engine().compute_image(&extent, &resolution);
        let overview = OverviewPanel::new(&full_view, extent);
        let mut surface = PlotSurface::new(resolution, extent);
        surface.set_image(full_view, extent);

        Ok(AppContext {
            controller : controller,
            surface : surface,
            overview : overview,
            zoom : zoom
        })
    }

    pub fn notify_x_extent_changed(&mut self) -> std::io::Result<()> {
        self.controller.on_view_changed(&mut self.surface, &mut self.overview)
    }

    pub fn notify_y_extent_changed(&mut self) -> std::io::Result<()> {
        self.controller.on_view_changed(&mut self.surface, &mut self.overview)
    }

    pub fn surface(&self) -> &PlotSurface {
        &self.surface
    }

    pub fn overview(&self) -> &OverviewPanel {
        &self.overview
    }

    // Replay the zoom sequence, one rendered frame per step
    pub fn run(&mut self) -> std::io::Result<Vec<GrayImage>> {
        let steps = self.zoom.clone();
        let mut frames = Vec::with_capacity(steps.len());
        for step in steps {
            self.surface.set_view_extent(step);
            // A zoom moves both axis limits; the canvas would deliver
            // both notification classes
            self.notify_x_extent_changed()?;
            self.notify_y_extent_changed()?;
            let (grid, _) = self.surface.image().ok_or_else(
                || Error::new(ErrorKind::InvalidData, "No image after recompute")
            )?;
            frames.push(render_grayscale(grid));
        }
        Ok(frames)
    }

    // Final zoomed frame plus the overview with its zoom rectangle
    pub fn teardown(self) -> std::io::Result<(GrayImage, GrayImage)> {
        let (grid, _) = self.surface.image.ok_or_else(
            || Error::new(ErrorKind::InvalidData, "No image was ever computed")
        )?;
        Ok((render_grayscale(&grid), self.overview.render()))
    }
}
