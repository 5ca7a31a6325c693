use crate::error::ConfigError;
use crate::pipeline::assembler::ShapeKind;
use crate::pipeline::clip::{DEFAULT_NEAR_CLIP, QuadClip};
use crate::scene::camera::DEFAULT_FOV_DEG;
use crate::scene::light::MAX_LIGHTS;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A scene description: output surface, camera, lights and shapes.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub lighting: LightingConfig,
    #[serde(default)]
    pub lights: Vec<LightConfig>,
    #[serde(default)]
    pub shapes: Vec<ShapeConfig>,
}

#[derive(Debug, Deserialize)]
pub struct RenderConfig {
    // --- Output ---
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_background")]
    pub background: [f32; 3],

    // --- Pipeline ---
    #[serde(default)]
    pub depth_sort: bool,
    #[serde(default)]
    pub accurate_textures: bool,
    #[serde(default)]
    pub quad_clip: QuadClip,
    #[serde(default = "default_near_clip")]
    pub near_clip: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            output: default_output(),
            background: default_background(),
            depth_sort: false,
            accurate_textures: false,
            quad_clip: QuadClip::default(),
            near_clip: default_near_clip(),
        }
    }
}

fn default_width() -> usize {
    640
}
fn default_height() -> usize {
    480
}
fn default_output() -> String {
    "output.png".to_string()
}
fn default_background() -> [f32; 3] {
    [0.2, 0.2, 0.2]
}
fn default_near_clip() -> f32 {
    DEFAULT_NEAR_CLIP
}

/// Absent `eye`/`center`/`up` fall back to the default camera of the surface.
#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    pub eye: Option<[f32; 3]>,
    pub center: Option<[f32; 3]>,
    pub up: Option<[f32; 3]>,
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_projection")]
    pub projection: String, // "perspective", "orthographic"
    pub near: Option<f32>,
    pub far: Option<f32>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: None,
            center: None,
            up: None,
            fov: default_fov(),
            projection: default_projection(),
            near: None,
            far: None,
        }
    }
}

fn default_fov() -> f32 {
    DEFAULT_FOV_DEG
}
fn default_projection() -> String {
    "perspective".to_string()
}

/// Settings applied before the `[[lights]]` list is declared.
#[derive(Debug, Deserialize)]
pub struct LightingConfig {
    /// Start with the stock ambient + directional pair.
    #[serde(default)]
    pub defaults: bool,
    #[serde(default = "default_falloff")]
    pub falloff: [f32; 3],
    #[serde(default)]
    pub specular: [f32; 3],
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            defaults: false,
            falloff: default_falloff(),
            specular: [0.0; 3],
        }
    }
}

fn default_falloff() -> [f32; 3] {
    [1.0, 0.0, 0.0]
}

#[derive(Debug, Deserialize)]
pub struct LightConfig {
    pub r#type: String, // "ambient", "directional", "point", "spot"
    pub color: [f32; 3],
    pub position: Option<[f32; 3]>,
    pub direction: Option<[f32; 3]>,
    /// Spot cone half-angle in degrees.
    pub angle: Option<f32>,
    #[serde(default = "default_concentration")]
    pub concentration: f32,
}

fn default_concentration() -> f32 {
    1.0
}

#[derive(Debug, Deserialize)]
pub struct ShapeConfig {
    #[serde(default)]
    pub kind: ShapeKind,
    #[serde(default)]
    pub close: bool,
    /// `[x, y, z]` or `[x, y, z, u, v]` with u, v in [0, 1].
    pub vertices: Vec<Vec<f32>>,

    // --- Normals ---
    pub normals: Option<Vec<[f32; 3]>>,
    pub normal: Option<[f32; 3]>,

    // --- Style ---
    pub fill: Option<[f32; 4]>,
    pub stroke: Option<[f32; 4]>,
    #[serde(default = "default_stroke_weight")]
    pub stroke_weight: f32,

    // --- Material ---
    pub ambient: Option<[f32; 3]>,
    pub specular: Option<[f32; 3]>,
    pub emissive: Option<[f32; 3]>,
    pub shininess: Option<f32>,

    // --- Transform ---
    #[serde(default)]
    pub translate: [f32; 3],
    /// Degrees, applied X then Y then Z.
    #[serde(default)]
    pub rotate: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],

    pub texture: Option<String>,
}

fn default_stroke_weight() -> f32 {
    1.0
}
fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parses and validates a TOML scene.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects scenes that deserialize but cannot be drawn.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 1. Surface and camera
        if self.render.width == 0 || self.render.height == 0 {
            return Err(invalid(format!(
                "surface must not be empty, got {}x{}",
                self.render.width, self.render.height
            )));
        }
        if !self.render.near_clip.is_finite() {
            return Err(invalid("near_clip must be finite"));
        }
        match self.camera.projection.as_str() {
            "perspective" | "orthographic" => {}
            other => return Err(invalid(format!("unknown projection '{}'", other))),
        }
        if !(self.camera.fov > 0.0 && self.camera.fov < 180.0) {
            return Err(invalid(format!("fov must be in (0, 180) degrees, got {}", self.camera.fov)));
        }

        // 2. Lights
        let stock = if self.lighting.defaults { 2 } else { 0 };
        if self.lights.len() + stock > MAX_LIGHTS {
            return Err(invalid(format!(
                "{} lights declared, at most {} are supported",
                self.lights.len() + stock,
                MAX_LIGHTS
            )));
        }
        for (i, light) in self.lights.iter().enumerate() {
            let missing = |field: &str| invalid(format!("light {} ({}) needs a {}", i, light.r#type, field));
            match light.r#type.as_str() {
                "ambient" => {}
                "directional" => {
                    light.direction.ok_or_else(|| missing("direction"))?;
                }
                "point" => {
                    light.position.ok_or_else(|| missing("position"))?;
                }
                "spot" => {
                    light.position.ok_or_else(|| missing("position"))?;
                    light.direction.ok_or_else(|| missing("direction"))?;
                    light.angle.ok_or_else(|| missing("angle"))?;
                }
                other => return Err(invalid(format!("light {} has unknown type '{}'", i, other))),
            }
        }

        // 3. Shapes
        for (i, shape) in self.shapes.iter().enumerate() {
            if let Some(v) = shape.vertices.iter().find(|v| v.len() != 3 && v.len() != 5) {
                return Err(invalid(format!(
                    "shape {}: vertices need 3 or 5 components, got {}",
                    i,
                    v.len()
                )));
            }
            if let Some(normals) = &shape.normals {
                if normals.len() != shape.vertices.len() {
                    return Err(invalid(format!(
                        "shape {}: {} normals for {} vertices",
                        i,
                        normals.len(),
                        shape.vertices.len()
                    )));
                }
            }
            if shape.stroke_weight < 0.0 {
                return Err(invalid(format!("shape {}: negative stroke_weight", i)));
            }
        }

        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}
