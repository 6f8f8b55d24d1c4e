// Copyright @yucwang 2023

use std::fs;
use std::path::Path;

use wavefront_obj::{obj, ParseError};
use std::fmt;

use crate::math::constants::Vector3f;
use crate::shapes::triangle::Triangle;

#[derive(Debug)]
pub enum ObjLoadError {
    Io(std::io::Error),
    Parse(ParseError),
}

impl From<std::io::Error> for ObjLoadError {
    fn from(err: std::io::Error) -> Self {
        ObjLoadError::Io(err)
    }
}

impl From<ParseError> for ObjLoadError {
    fn from(err: ParseError) -> Self {
        ObjLoadError::Parse(err)
    }
}

impl fmt::Display for ObjLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjLoadError::Io(err) => write!(f, "io error: {}", err),
            ObjLoadError::Parse(err) => write!(f, "parse error: {:?}", err),
        }
    }
}

impl std::error::Error for ObjLoadError {}

pub fn load_obj_from_str<S: AsRef<str>>(input: S) -> Result<obj::ObjSet, ParseError> {
    let triangulated = triangulate_faces(input.as_ref());
    obj::parse(triangulated)
}

pub fn load_obj_from_file<P: AsRef<Path>>(path: P) -> Result<obj::ObjSet, ObjLoadError> {
    let data = fs::read_to_string(path)?;
    let obj_set = load_obj_from_str(data)?;
    Ok(obj_set)
}

/// Flattens every triangle of every object. Vertex indices are local to
/// their object. Points and lines are skipped.
pub fn triangles_from_obj(obj_set: &obj::ObjSet) -> Vec<Triangle> {
    let mut triangles = Vec::new();
    for object in &obj_set.objects {
        let vertex = |i: usize| -> Option<Vector3f> {
            object.vertices.get(i).map(|v| Vector3f::new(v.x as f32, v.y as f32, v.z as f32))
        };
        for geom in &object.geometry {
            for shape in &geom.shapes {
                if let obj::Primitive::Triangle(a, b, c) = &shape.primitive {
                    match (vertex(a.0), vertex(b.0), vertex(c.0)) {
                        (Some(p0), Some(p1), Some(p2)) => triangles.push(Triangle::new(p0, p1, p2)),
                        _ => log::warn!("obj object {} references a missing vertex, face skipped", object.name),
                    }
                }
            }
        }
    }
    triangles
}

// Fans polygons with more than three corners into triangles.
fn triangulate_faces(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 4);
    for line in input.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("f ") || trimmed.starts_with("f\t") {
            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            if parts.len() > 4 {
                let base = parts[1];
                for i in 2..(parts.len() - 1) {
                    out.push_str("f ");
                    out.push_str(base);
                    out.push(' ');
                    out.push_str(parts[i]);
                    out.push(' ');
                    out.push_str(parts[i + 1]);
                    out.push('\n');
                }
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}
