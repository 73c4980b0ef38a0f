// Bridge between a display surface's view-change notifications and the
// iteration engine.
//
// The surface and the overview overlay sit behind traits so the engine
// never touches a concrete canvas; tests stand in with recording fakes.
// Extent notifications carry no payload, the handler re-reads the current
// resolution and extent from the surface itself.

use log::debug;

use crate::engine::{IterationGrid, NewtonIterationEngine};
use crate::grid::{Resolution, ViewExtent};

// What the controller needs from whatever is displaying the fractal
pub trait DisplaySurface {
    fn pixel_resolution(&self) -> (u32, u32);
    fn view_extent(&self) -> (f64, f64, f64, f64);
    // Autoscale on a redraw would fire another extent notification and
    // loop forever, so the controller switches it off before computing
    fn set_autoscale(&mut self, enabled : bool);
    fn set_image(&mut self, grid : IterationGrid, extent : ViewExtent);
}

// Companion panel mirroring the zoomed bounds as a rectangle
pub trait OverlaySync {
    fn set_overlay_bounds(&mut self, extent : ViewExtent);
}

pub struct ViewRecomputeController {
    engine : NewtonIterationEngine
}

impl ViewRecomputeController {
    pub fn new(engine : NewtonIterationEngine) -> ViewRecomputeController {
        ViewRecomputeController { engine : engine }
    }

    pub fn engine(&self) -> &NewtonIterationEngine {
        &self.engine
    }

    // Both the x-extent and y-extent notification classes route here
    pub fn on_view_changed(
        &self,
        surface : &mut dyn DisplaySurface,
        overlay : &mut dyn OverlaySync
    ) -> std::io::Result<()> {
        surface.set_autoscale(false);
        let (width, height) = surface.pixel_resolution();
        if width == 0 || height == 0 {
            // Collapsed window, nothing to compute against
            debug!("skipping recompute for {}x{} surface", width, height);
            return Ok(())
        }
        let resolution = Resolution::new(width, height)?;
        let (xstart, xend, ystart, yend) = surface.view_extent();
        let extent = ViewExtent::new(xstart, xend, ystart, yend)?;
        let grid = self.engine.compute_image(&extent, &resolution);
        overlay.set_overlay_bounds(extent);
        surface.set_image(grid, extent);
        Ok(())
    }
}
