// Build the dense grid of complex samples covering a rectangular view of
// the complex plane at a requested pixel resolution.
//
// Extents and resolutions are validated by their constructors, so by the
// time a grid is built (and memory allocated) the inputs are known good.

use std::io::{Error, ErrorKind};

use json::JsonValue;
use num::complex::Complex64;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ViewExtent {
    pub xstart : f64,
    pub xend : f64,
    pub ystart : f64,
    pub yend : f64
}

impl ViewExtent {
    pub fn new(xstart : f64, xend : f64, ystart : f64, yend : f64) -> std::io::Result<ViewExtent> {
        let bounds = [xstart, xend, ystart, yend];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(Error::new(ErrorKind::InvalidData, "Non-finite extent bound"))
        }
        if xstart >= xend || ystart >= yend {
            return Err(Error::new(ErrorKind::InvalidData, "Degenerate extent"))
        }
        Ok(ViewExtent { xstart : xstart, xend : xend, ystart : ystart, yend : yend })
    }

    // Json lists the extent as [xstart, xend, ystart, yend]
    pub fn from_json(input : &JsonValue) -> std::io::Result<ViewExtent> {
        if !input.is_array() {
            return Err(Error::new(ErrorKind::InvalidData, "Missing extent"))
        }
        let bounds : Vec<f64> = input.members().filter_map(|b| b.as_f64()).collect();
        if bounds.len() != 4 {
            return Err(Error::new(ErrorKind::InvalidData, "Extent needs 4 bounds"))
        }
        ViewExtent::new(bounds[0], bounds[1], bounds[2], bounds[3])
    }

    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.xstart, self.xend, self.ystart, self.yend)
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Resolution {
    pub width : u32,
    pub height : u32
}

impl Resolution {
    pub fn new(width : u32, height : u32) -> std::io::Result<Resolution> {
        if width == 0 || height == 0 {
            return Err(Error::new(ErrorKind::InvalidData, "Zero resolution"))
        }
        Ok(Resolution { width : width, height : height })
    }

    pub fn pixels(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

// Row major with row 0 holding the samples at ystart
pub struct SampleGrid {
    pub width : u32,
    pub height : u32,
    pub samples : Vec<Complex64>
}

impl SampleGrid {
    pub fn at(&self, row : u32, column : u32) -> Complex64 {
        self.samples[(row as usize) * (self.width as usize) + (column as usize)]
    }
}

fn linspace(start : f64, end : f64, count : u32) -> Vec<f64> {
    if count == 1 {
        return vec!(start)
    }
    let step = (end - start) / ((count - 1) as f64);
    (0..count).map(|i| start + (i as f64) * step).collect()
}

pub fn build_grid(extent : &ViewExtent, resolution : &Resolution) -> SampleGrid {
    let x = linspace(extent.xstart, extent.xend, resolution.width);
    let y = linspace(extent.ystart, extent.yend, resolution.height);
    let mut samples = Vec::with_capacity(resolution.pixels());
    for im in y.iter() {
        for re in x.iter() {
            samples.push(Complex64::new(*re, *im));
        }
    }
    SampleGrid {
        width : resolution.width,
        height : resolution.height,
        samples : samples
    }
}
