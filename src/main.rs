// Render a newton fractal described by a json input file.
//
// The zoomed view is written to the output path and the overview panel,
// with its zoom rectangle, goes alongside it. A "zoom" list in the input
// replays a sequence of view extents and writes one numbered frame per
// step.

use std::env;
use std::fs::{create_dir_all, File};
use std::io::{Error, ErrorKind, Read};
use std::path::Path;

use image::GrayImage;

mod app;
mod engine;
mod grid;
mod polynomial;
mod view;

use app::AppContext;

fn make_directory_for_image(path_str : &str) -> std::io::Result<()> {
    let path = Path::new(path_str);
    if let Some(dir) = path.parent() {
        create_dir_all(dir)
    } else {
        Ok(())
    }
}

fn save_png(image : &GrayImage, path : &str) -> std::io::Result<()> {
    make_directory_for_image(path)?;
    image.save(path).map_err(
        |_| Error::new(ErrorKind::InvalidData, "Couldn't write image")
    )
}

fn main() -> std::io::Result<()> {
    env_logger::init();
    // Get file to use else default
    let in_filename = env::args().nth(1).unwrap_or("input.json".to_string());
    let out_filename = env::args().nth(2).unwrap_or("output.png".to_string());
    println!("Loading input file: {}", in_filename);
    let mut file = File::open(in_filename)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    let input = json::parse(&contents).map_err(
        |_| Error::new(ErrorKind::InvalidData, "Couldn't parse input")
    )?;
    let mut context = AppContext::init(&input)?;
    let out_filename_base = out_filename.strip_suffix(".png").unwrap_or(&out_filename);
    let frames = context.run()?;
    for (i, frame) in frames.iter().enumerate() {
        println!("Frame {} of {}", i + 1, frames.len());
        save_png(frame, &format!("{}/{}.png", out_filename_base, i))?;
    }
    let (zoomed, overview) = context.teardown()?;
    println!("Writing output to {}", out_filename);
    save_png(&zoomed, &out_filename)?;
    save_png(&overview, &format!("{}_overview.png", out_filename_base))?;
    Ok(())
}
