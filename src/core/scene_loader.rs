// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::layer::RayMask;
use crate::core::scene::{Scene, SceneObject};
use crate::core::shape::Shape;
use crate::mapping::depth_mapper::DepthMapperSettings;
use crate::mapping::localised_image::{LocalisedImage, LocalisedImageList};
use crate::math::constants::{Float, Vector3f};
use crate::math::transform::Transform;
use crate::sensors::viewpoint::{Viewpoint, MAX_FOV};
use crate::shapes::cube::Cube;
use crate::shapes::rectangle::Rectangle;
use crate::shapes::triangle_mesh::TriangleMesh;

#[derive(Debug)]
pub enum SceneLoadError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
}

impl From<std::io::Error> for SceneLoadError {
    fn from(err: std::io::Error) -> Self {
        SceneLoadError::Io(err)
    }
}

impl fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneLoadError::Io(err) => write!(f, "failed to read scene: {}", err),
            SceneLoadError::Parse(msg) => write!(f, "failed to parse scene: {}", msg),
            SceneLoadError::MissingField(field) => write!(f, "scene is missing {}", field),
        }
    }
}

impl std::error::Error for SceneLoadError {}

pub struct SceneLoadResult {
    pub scene: Scene,
    pub viewpoint: Viewpoint,
    pub settings: DepthMapperSettings,
    pub images: LocalisedImageList,
}

pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene, SceneLoadError> {
    let result = load_scene_with_settings(path)?;
    Ok(result.scene)
}

pub fn load_scene_with_settings<P: AsRef<Path>>(path: P) -> Result<SceneLoadResult, SceneLoadError> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    log::info!("Loading scene from: {}.", path.display());
    parse_scene(&xml, base_dir)
}

struct PendingShape {
    shape_type: String,
    id: Option<String>,
    layer: Option<String>,
    filename: Option<String>,
    to_world: Transform,
}

struct PendingImage {
    id: String,
    filename: Option<String>,
    fov: Option<Float>,
    viewpoint: Option<Viewpoint>,
}

/// Streaming state while walking the XML events.
struct SceneParser<'a> {
    base_dir: &'a Path,
    defaults: HashMap<String, String>,
    scene: Scene,
    viewpoint: Viewpoint,
    settings: DepthMapperSettings,
    mask: Option<String>,
    images: LocalisedImageList,
    in_mapper: bool,
    in_transform: bool,
    shape: Option<PendingShape>,
    image: Option<PendingImage>,
}

/// Parses a scene document. Relative file names resolve against `base_dir`.
pub fn parse_scene(xml: &str, base_dir: &Path) -> Result<SceneLoadResult, SceneLoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut parser = SceneParser::new(base_dir);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => parser.start(&e)?,
            Ok(Event::Empty(e)) => {
                parser.start(&e)?;
                parser.end(e.name().as_ref())?;
            }
            Ok(Event::End(e)) => parser.end(e.name().as_ref())?,
            Err(e) => {
                return Err(SceneLoadError::Parse(e.to_string()));
            }
            _ => {}
        }

        buf.clear();
    }

    parser.finish()
}

impl<'a> SceneParser<'a> {
    fn new(base_dir: &'a Path) -> Self {
        let mut scene = Scene::new();
        scene.set_base_dir(base_dir.to_path_buf());
        Self {
            base_dir,
            defaults: HashMap::new(),
            scene,
            viewpoint: Viewpoint::default(),
            settings: DepthMapperSettings::default(),
            mask: None,
            images: LocalisedImageList::new(),
            in_mapper: false,
            in_transform: false,
            shape: None,
            image: None,
        }
    }

    fn attributes(&self, e: &BytesStart) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        for attr in e.attributes().flatten() {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
            let value = resolve_value(&attr.unescape_value().unwrap_or_default(), &self.defaults);
            attrs.insert(key, value);
        }
        attrs
    }

    fn start(&mut self, e: &BytesStart) -> Result<(), SceneLoadError> {
        let attrs = self.attributes(e);
        match e.name().as_ref() {
            b"default" => {
                if let (Some(k), Some(v)) = (attrs.get("name"), attrs.get("value")) {
                    self.defaults.insert(k.clone(), v.clone());
                }
            }
            b"layer" => {
                let name = attrs.get("name").ok_or(SceneLoadError::MissingField("layer.name"))?;
                self.register_layer(name)?;
            }
            b"viewpoint" => {
                let viewpoint = parse_viewpoint(&attrs)?;
                match self.image.as_mut() {
                    Some(image) => image.viewpoint = Some(viewpoint),
                    None => self.viewpoint = viewpoint,
                }
            }
            b"depthmapper" => self.in_mapper = true,
            b"image" => {
                let id = attrs.get("id").ok_or(SceneLoadError::MissingField("image.id"))?;
                self.image = Some(PendingImage {
                    id: id.clone(),
                    filename: attrs.get("filename").cloned(),
                    fov: attrs.get("fov").map(|v| parse_float(v)).transpose()?,
                    viewpoint: None,
                });
            }
            b"shape" => {
                let shape_type = attrs.get("type").ok_or(SceneLoadError::MissingField("shape.type"))?;
                self.shape = Some(PendingShape {
                    shape_type: shape_type.clone(),
                    id: attrs.get("id").cloned(),
                    layer: attrs.get("layer").cloned(),
                    filename: None,
                    to_world: Transform::default(),
                });
            }
            b"transform" => {
                self.in_transform = self.shape.is_some()
                    && attrs.get("name").map(|n| n == "to_world").unwrap_or(false);
            }
            b"translate" | b"scale" | b"rotate" => {
                if self.in_transform {
                    let op = parse_transform_op(e.name().as_ref(), &attrs)?;
                    if let Some(shape) = self.shape.as_mut() {
                        shape.to_world = op * shape.to_world;
                    }
                }
            }
            b"string" | b"integer" | b"float" | b"boolean" => {
                if let (Some(name), Some(value)) = (attrs.get("name"), attrs.get("value")) {
                    self.property(name, value)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) -> Result<(), SceneLoadError> {
        match name {
            b"depthmapper" => self.in_mapper = false,
            b"transform" => self.in_transform = false,
            b"image" => {
                if let Some(pending) = self.image.take() {
                    self.finish_image(pending);
                }
            }
            b"shape" => {
                if let Some(pending) = self.shape.take() {
                    self.finish_shape(pending)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn property(&mut self, name: &str, value: &str) -> Result<(), SceneLoadError> {
        if let Some(shape) = self.shape.as_mut() {
            if name == "filename" {
                shape.filename = Some(value.to_string());
            }
            return Ok(());
        }
        if !self.in_mapper {
            return Ok(());
        }

        let settings = &mut self.settings;
        match name {
            "width" => settings.render.width = parse_usize(value)?,
            "height" => settings.render.height = parse_usize(value)?,
            "max_range" => settings.render.max_range = parse_float(value)?,
            "threads" => settings.render.threads = parse_usize(value)?,
            "show_progress" => settings.render.show_progress = parse_bool(value)?,
            "mask" => self.mask = Some(value.to_string()),
            "save_to_file" => settings.save_to_file = parse_bool(value)?,
            "texture_name" => settings.texture_name = value.to_string(),
            "save_to_target" => settings.save_to_target = parse_bool(value)?,
            "draw_rays" => settings.draw_rays = parse_bool(value)?,
            other => log::warn!("Ignoring unknown depthmapper property: {}.", other),
        }
        Ok(())
    }

    fn register_layer(&mut self, name: &str) -> Result<u8, SceneLoadError> {
        self.scene.layers_mut().register(name)
            .ok_or_else(|| SceneLoadError::Parse(format!("too many layers, cannot add {}", name)))
    }

    fn resolve_path(&self, filename: &str) -> PathBuf {
        if Path::new(filename).is_absolute() {
            PathBuf::from(filename)
        } else {
            self.base_dir.join(filename)
        }
    }

    fn finish_shape(&mut self, pending: PendingShape) -> Result<(), SceneLoadError> {
        let shape: Arc<dyn Shape> = match pending.shape_type.as_str() {
            "obj" => {
                let filename = pending.filename.as_deref().ok_or(SceneLoadError::MissingField("shape.filename"))?;
                let mut mesh = TriangleMesh::from_obj(self.resolve_path(filename))
                    .map_err(|e| SceneLoadError::Parse(format!("obj load failed: {}", e)))?;
                mesh.apply_transform(&pending.to_world);
                Arc::new(mesh)
            }
            "cube" => Arc::new(Cube::new(pending.to_world)),
            "rectangle" => Arc::new(Rectangle::new(pending.to_world)),
            other => return Err(SceneLoadError::Parse(format!("unsupported shape: {}", other))),
        };

        let layer = match pending.layer.as_deref() {
            Some(name) => self.register_layer(name)?,
            None => 0,
        };
        let mut object = SceneObject::new(shape).with_layer(layer);
        if let Some(id) = pending.id {
            object = object.with_name(id);
        }
        self.scene.add_object(object);
        Ok(())
    }

    fn finish_image(&mut self, pending: PendingImage) {
        let mut viewpoint = pending.viewpoint.unwrap_or(self.viewpoint);
        if let Some(fov) = pending.fov {
            viewpoint.set_fov(fov);
        }
        let mut image = LocalisedImage::new(&pending.id, viewpoint);
        if let Some(filename) = pending.filename {
            image = image.with_source_path(self.resolve_path(&filename));
        }
        self.images.push(image);
    }

    fn finish(mut self) -> Result<SceneLoadResult, SceneLoadError> {
        if let Some(mask) = self.mask.as_deref() {
            self.settings.render.mask = self.scene.layers().parse_mask(mask).map_err(SceneLoadError::Parse)?;
        }
        if self.settings.render.mask == RayMask::NONE {
            log::warn!("Ray mask selects no layers; every ray will miss.");
        }

        self.scene.build_bvh();
        log::info!("Scene loaded: {} objects, {} layers, {} images.",
                   self.scene.len(), self.scene.layers().len(), self.images.len());

        Ok(SceneLoadResult {
            scene: self.scene,
            viewpoint: self.viewpoint,
            settings: self.settings,
            images: self.images,
        })
    }
}

fn parse_viewpoint(attrs: &HashMap<String, String>) -> Result<Viewpoint, SceneLoadError> {
    let position = match attrs.get("position") {
        Some(v) => parse_vec3(v)?,
        None => Vector3f::zeros(),
    };
    let rotation = match attrs.get("rotation") {
        Some(v) => parse_vec4(v)?,
        None => [0.0, 0.0, 0.0, 1.0],
    };
    let fov = match attrs.get("fov") {
        Some(v) => parse_float(v)?,
        None => MAX_FOV,
    };
    Ok(Viewpoint::from_components([position.x, position.y, position.z], rotation, fov))
}

fn parse_transform_op(name: &[u8], attrs: &HashMap<String, String>) -> Result<Transform, SceneLoadError> {
    let component = |key: &str, fallback: Float| -> Result<Float, SceneLoadError> {
        attrs.get(key).map(|v| parse_float(v)).transpose().map(|v| v.unwrap_or(fallback))
    };

    match name {
        b"translate" => Ok(Transform::translate(&Vector3f::new(component("x", 0.0)?,
                                                               component("y", 0.0)?,
                                                               component("z", 0.0)?))),
        b"scale" => {
            let s = match attrs.get("value") {
                Some(v) => {
                    let u = parse_float(v)?;
                    Vector3f::new(u, u, u)
                }
                None => Vector3f::new(component("x", 1.0)?, component("y", 1.0)?, component("z", 1.0)?),
            };
            Ok(Transform::scale(&s))
        }
        _ => {
            let axis = Vector3f::new(component("x", 0.0)?, component("y", 0.0)?, component("z", 0.0)?);
            let angle = attrs.get("angle").ok_or(SceneLoadError::MissingField("rotate.angle"))?;
            Ok(Transform::rotate(&axis, parse_float(angle)?))
        }
    }
}

/// Replaces each `$name` token with its default. A name runs over ASCII
/// alphanumerics and `_`; unknown names are left untouched.
fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..name_len];
        match defaults.get(name) {
            Some(value) => out.push_str(value),
            None => {
                out.push('$');
                out.push_str(name);
            }
        }
        rest = &after[name_len..];
    }
    out.push_str(rest);
    out
}

fn parse_float(value: &str) -> Result<Float, SceneLoadError> {
    value.trim().parse::<Float>().map_err(|_| SceneLoadError::Parse(format!("invalid float: {}", value)))
}

fn parse_usize(value: &str) -> Result<usize, SceneLoadError> {
    value.trim().parse::<usize>().map_err(|_| SceneLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_bool(value: &str) -> Result<bool, SceneLoadError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(SceneLoadError::Parse(format!("invalid boolean: {}", value))),
    }
}

fn parse_floats<const N: usize>(value: &str, what: &str) -> Result<[Float; N], SceneLoadError> {
    let parts: Vec<&str> = value.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
    if parts.len() != N {
        return Err(SceneLoadError::Parse(format!("invalid {}: {}", what, value)));
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = parse_float(part)?;
    }
    Ok(out)
}

fn parse_vec3(value: &str) -> Result<Vector3f, SceneLoadError> {
    let [x, y, z] = parse_floats::<3>(value, "vec3")?;
    Ok(Vector3f::new(x, y, z))
}

fn parse_vec4(value: &str) -> Result<[Float; 4], SceneLoadError> {
    parse_floats::<4>(value, "vec4")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::intersector::RayIntersector;

    const SCENE: &str = r#"
        <scene>
            <default name="range" value="10"/>
            <layer name="walls"/>
            <viewpoint position="0, 1, 0" rotation="0, 0, 0, 1" fov="180"/>
            <depthmapper>
                <integer name="width" value="64"/>
                <integer name="height" value="32"/>
                <float name="max_range" value="$range"/>
                <string name="mask" value="walls"/>
                <boolean name="save_to_target" value="true"/>
                <string name="texture_name" value="hallDepth"/>
            </depthmapper>
            <shape type="cube" id="room" layer="walls">
                <transform name="to_world">
                    <scale value="3"/>
                    <translate y="1"/>
                </transform>
            </shape>
            <shape type="rectangle" id="crate" layer="props">
                <transform name="to_world">
                    <rotate x="1" angle="90"/>
                    <translate y="0.5"/>
                </transform>
            </shape>
            <image id="east" filename="east.png">
                <viewpoint position="1, 1, 0" rotation="0, 0.7071068, 0, 0.7071068"/>
            </image>
            <image id="default_pose" fov="90"/>
        </scene>
    "#;

    #[test]
    fn test_parse_scene_settings_and_viewpoint() {
        let result = parse_scene(SCENE, Path::new("/data/scenes")).unwrap();
        assert_eq!(result.settings.render.width, 64);
        assert_eq!(result.settings.render.height, 32);
        assert_eq!(result.settings.render.max_range, 10.0);
        assert!(result.settings.save_to_target);
        assert!(!result.settings.save_to_file);
        assert_eq!(result.settings.texture_name, "hallDepth");
        assert_eq!(result.viewpoint.position, Vector3f::new(0.0, 1.0, 0.0));
        assert_eq!(result.viewpoint.fov(), 180.0);

        let walls = result.scene.layers().index_of("walls").unwrap();
        assert_eq!(result.settings.render.mask, RayMask::from_layer(walls));
        assert_eq!(result.scene.len(), 2);
        assert_eq!(result.scene.objects()[1].name.as_deref(), Some("crate"));
    }

    #[test]
    fn test_parse_scene_images() {
        let result = parse_scene(SCENE, Path::new("/data/scenes")).unwrap();
        assert_eq!(result.images.ids(), vec!["east", "default_pose"]);

        let east = result.images.get("east").unwrap();
        assert_eq!(east.source_path.as_deref(), Some(Path::new("/data/scenes/east.png")));
        assert_eq!(east.viewpoint.position.x, 1.0);
        let forward = east.viewpoint.transform_direction(&Vector3f::new(0.0, 0.0, 1.0));
        assert!((forward - Vector3f::new(1.0, 0.0, 0.0)).norm() < 1e-5);

        // Images without their own pose inherit the scene viewpoint.
        let fallback = result.images.get("default_pose").unwrap();
        assert_eq!(fallback.viewpoint.position, result.viewpoint.position);
        assert_eq!(fallback.viewpoint.fov(), 90.0);
        assert!(fallback.source_path.is_none());
    }

    #[test]
    fn test_loaded_scene_respects_mask() {
        let result = parse_scene(SCENE, Path::new(".")).unwrap();
        let origin = result.viewpoint.position;
        let down = Vector3f::new(0.0, -1.0, 0.0);

        // The crate floor at y = 0.5 is on a masked-out layer.
        let walls_only = result.scene.cast(&origin, &down, 10.0, result.settings.render.mask).unwrap();
        assert!((walls_only - 3.0).abs() < 1e-4);
        let everything = result.scene.cast(&origin, &down, 10.0, RayMask::ALL).unwrap();
        assert!((everything - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_parse_errors() {
        let missing_type = "<scene><shape id=\"x\"></shape></scene>";
        assert!(matches!(parse_scene(missing_type, Path::new(".")),
                         Err(SceneLoadError::MissingField("shape.type"))));

        let bad_float = "<scene><depthmapper><float name=\"max_range\" value=\"far\"/></depthmapper></scene>";
        assert!(matches!(parse_scene(bad_float, Path::new(".")), Err(SceneLoadError::Parse(_))));

        let unknown_layer = "<scene><depthmapper><string name=\"mask\" value=\"ghosts\"/></depthmapper></scene>";
        assert!(matches!(parse_scene(unknown_layer, Path::new(".")), Err(SceneLoadError::Parse(_))));

        let missing_obj = "<scene><shape type=\"obj\"></shape></scene>";
        assert!(matches!(parse_scene(missing_obj, Path::new(".")),
                         Err(SceneLoadError::MissingField("shape.filename"))));
    }

    #[test]
    fn test_resolve_value_and_vectors() {
        let mut defaults = HashMap::new();
        defaults.insert("h".to_string(), "1.5".to_string());
        assert_eq!(resolve_value("0,$h,0", &defaults), "0,1.5,0");
        assert_eq!(parse_vec3("1, 2,3").unwrap(), Vector3f::new(1.0, 2.0, 3.0));
        assert!(parse_vec3("1,2").is_err());
        assert_eq!(parse_vec4("0,0,0,1").unwrap(), [0.0, 0.0, 0.0, 1.0]);
        assert!(parse_bool("yes").is_err());
    }

    #[test]
    fn test_resolve_value_matches_whole_names() {
        let mut defaults = HashMap::new();
        defaults.insert("h".to_string(), "1.5".to_string());
        defaults.insert("height".to_string(), "32".to_string());
        for _ in 0..8 {
            assert_eq!(resolve_value("$height", &defaults), "32");
            assert_eq!(resolve_value("$h,$height,$hx", &defaults), "1.5,32,$hx");
        }
        assert_eq!(resolve_value("$", &defaults), "$");
    }
}
