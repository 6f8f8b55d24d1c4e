// Copyright @yucwang 2026

use panodepth::io::image_utils::load_target_image;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <image> <x> <y>", args[0]);
        eprintln!("Coordinates are bottom-up: y = 0 is the bottom row.");
        std::process::exit(1);
    }

    let (x, y) = match (args[2].parse::<usize>(), args[3].parse::<usize>()) {
        (Ok(x), Ok(y)) => (x, y),
        _ => {
            eprintln!("Pixel coordinates must be non-negative integers.");
            std::process::exit(1);
        }
    };

    let image = match load_target_image(&args[1]) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Failed to read {}: {}", args[1], e);
            std::process::exit(2);
        }
    };

    if x >= image.width() || y >= image.height() {
        eprintln!("Out of bounds: ({}, {}) for size {}x{}", x, y, image.width(), image.height());
        std::process::exit(3);
    }

    let p = image[(x, y)];
    println!("Pixel ({}, {}) of {}x{}", x, y, image.width(), image.height());
    println!("R {:.6}, G {:.6}, B {:.6}, A {:.6}", p.x, p.y, p.z, p.w);
}
