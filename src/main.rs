// Copyright 2020 TwoCookingMice

use panodepth::core::scene_loader::load_scene_with_settings;
use panodepth::io::image_utils;
use panodepth::mapping::depth_mapper::{DepthMapper, RenderReport};
use panodepth::mapping::localised_image::LocalisedImage;

use console::style;
use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};

const USAGE: &str = "<scene.xml> [--width N] [--height N] [--max-range F] [--mask LIST] [--threads N] \
                     [--output NAME] [--image ID] [--all] [--target-out PATH] [--draw-rays] [--no-progress]";

#[derive(Default)]
struct Options {
    width: Option<usize>,
    height: Option<usize>,
    max_range: Option<f32>,
    mask: Option<String>,
    threads: Option<usize>,
    output: Option<String>,
    image: Option<String>,
    all: bool,
    target_out: Option<PathBuf>,
    draw_rays: bool,
    no_progress: bool,
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
        args.get(i).map(|s| s.as_str()).ok_or_else(|| format!("{} expects a value", flag))
    }
    fn number<T: std::str::FromStr>(args: &[String], i: usize, flag: &str) -> Result<T, String> {
        let raw = value(args, i, flag)?;
        raw.parse::<T>().map_err(|_| format!("invalid value for {}: {}", flag, raw))
    }

    let mut options = Options::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--width" => { i += 1; options.width = Some(number(args, i, flag)?); }
            "--height" => { i += 1; options.height = Some(number(args, i, flag)?); }
            "--max-range" => { i += 1; options.max_range = Some(number(args, i, flag)?); }
            "--threads" => { i += 1; options.threads = Some(number(args, i, flag)?); }
            "--mask" => { i += 1; options.mask = Some(value(args, i, flag)?.to_string()); }
            "--output" => { i += 1; options.output = Some(value(args, i, flag)?.to_string()); }
            "--image" => { i += 1; options.image = Some(value(args, i, flag)?.to_string()); }
            "--target-out" => { i += 1; options.target_out = Some(PathBuf::from(value(args, i, flag)?)); }
            "--all" => options.all = true,
            "--draw-rays" => options.draw_rays = true,
            "--no-progress" => options.no_progress = true,
            other => return Err(format!("unknown argument: {}", other)),
        }
        i += 1;
    }
    Ok(options)
}

fn load_pixels(image: &mut LocalisedImage) {
    if image.is_loaded() {
        return;
    }
    let path = match image.source_path.clone() {
        Some(path) => path,
        None => {
            log::warn!("Image '{}' has no file name, nothing to composite into.", image.id);
            return;
        }
    };
    match image_utils::load_target_image(&path) {
        Ok(pixels) => image.image = Some(pixels),
        Err(err) => log::warn!("Failed to load panorama '{}': {}.", path.display(), err),
    }
}

fn write_panorama(image: &LocalisedImage, path: &Path) {
    let pixels = match image.image.as_ref() {
        Some(pixels) => pixels,
        None => return,
    };
    match image_utils::save_target_image(pixels, path) {
        Ok(()) => println!("{} {}", style("Panorama").green().bold(), path.display()),
        Err(err) => eprintln!("{} {}: {}", style("Failed").red().bold(), path.display(), err),
    }
}

fn print_report(report: &RenderReport) {
    let label = report.id.as_deref().unwrap_or("viewpoint");
    println!("{} {} ({}x{})", style("Depth map").cyan().bold(), label,
             report.image.width(), report.image.height());
    if let Some(path) = &report.saved_path {
        println!("  {} {}", style("saved").green(), path.display());
    }
    if let Some(err) = &report.save_error {
        println!("  {} {}", style("not saved:").red(), err);
    }
    if report.composited {
        println!("  {}", style("composited into alpha").green());
    }
}

fn run(scene_path: &str, options: Options) -> Result<(), Box<dyn Error>> {
    let mut loaded = load_scene_with_settings(scene_path)?;
    let mut settings = loaded.settings.clone();

    if let Some(width) = options.width { settings.render.width = width; }
    if let Some(height) = options.height { settings.render.height = height; }
    if let Some(max_range) = options.max_range { settings.render.max_range = max_range; }
    if let Some(threads) = options.threads { settings.render.threads = threads; }
    if let Some(mask) = options.mask.as_deref() {
        settings.render.mask = loaded.scene.layers().parse_mask(mask)?;
    }
    if let Some(output) = options.output {
        settings.texture_name = output;
    }
    if options.target_out.is_some() {
        settings.save_to_target = true;
    }
    settings.save_to_file = true;
    settings.draw_rays |= options.draw_rays;
    settings.render.show_progress &= !options.no_progress;

    let mut mapper = DepthMapper::new(settings, loaded.viewpoint);

    if options.all {
        if mapper.settings().save_to_target {
            loaded.images.iter_mut().for_each(load_pixels);
        }
        let reports = mapper.render_all(&loaded.scene, &mut loaded.images)?;
        reports.iter().for_each(print_report);
        if let Some(dir) = options.target_out.as_deref() {
            for image in loaded.images.iter() {
                write_panorama(image, &dir.join(format!("{}.png", image.id)));
            }
        }
    } else if let Some(id) = options.image.as_deref() {
        let image = loaded.images.get_mut(id).ok_or_else(|| format!("no image with id '{}'", id))?;
        if mapper.settings().save_to_target {
            load_pixels(image);
        }
        let report = mapper.render_depth(&loaded.scene, Some(&mut *image))?;
        print_report(&report);
        if let Some(path) = options.target_out.as_deref() {
            write_panorama(image, path);
        }
    } else {
        let report = mapper.render_depth(&loaded.scene, None)?;
        print_report(&report);
    }
    Ok(())
}

fn main() {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} {}", args[0], USAGE);
        std::process::exit(1);
    }

    let options = match parse_options(&args[2..]) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{} {}", style("error:").red().bold(), err);
            eprintln!("Usage: {} {}", args[0], USAGE);
            std::process::exit(1);
        }
    };

    if let Err(err) = run(&args[1], options) {
        eprintln!("{} {}", style("error:").red().bold(), err);
        std::process::exit(1);
    }
}
