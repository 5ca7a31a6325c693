use crate::core::color::{Rgb, Rgba};
use crate::core::rasterizer::Rasterizer;
use crate::error::{AppError, PipelineError};
use crate::io::config::{CameraConfig, Config, ShapeConfig};
use crate::io::image::save_framebuffer;
use crate::pipeline::assembler::CloseMode;
use crate::pipeline::clip::NearClipper;
use crate::pipeline::renderer::Renderer;
use crate::pipeline::sink::{RasterSink, RecordingSink};
use crate::scene::camera::{Camera, ProjectionType};
use crate::scene::context::{Hint, TextureMode};
use crate::scene::material::Style;
use crate::scene::texture::Texture;
use log::{debug, info};
use nalgebra::{Point3, Vector3};
use std::sync::Arc;
use std::time::Instant;

/// Primitive counts of one rendered scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStats {
    pub triangles: usize,
    pub lines: usize,
    pub points: usize,
}

/// Renders the scene headless and writes the image to `config.render.output`.
pub fn run_cli(config: &Config) -> Result<(), AppError> {
    let width = config.render.width;
    let height = config.render.height;
    info!("Starting CLI render ({}x{})...", width, height);
    let start_time = Instant::now();

    let textures = load_textures(config)?;

    let mut rasterizer = Rasterizer::new(width, height);
    rasterizer.clear(Vector3::from(config.render.background));
    let mut renderer = Renderer::new(width, height, rasterizer);
    draw_scene(&mut renderer, config, &textures)?;

    let rasterizer = renderer.into_sink();
    let stats = rasterizer.stats();
    info!(
        "Rendered {} triangles, {} lines, {} points ({} pixels) in {:.2?}",
        stats.triangles,
        stats.lines,
        stats.points,
        stats.pixels,
        start_time.elapsed()
    );

    info!("Saving output to '{}'...", config.render.output);
    save_framebuffer(&rasterizer.framebuffer, &config.render.output)?;
    info!("Done.");
    Ok(())
}

/// Runs the scene through a `RecordingSink` and counts what comes out.
pub fn scene_stats(config: &Config) -> Result<SceneStats, AppError> {
    let textures = load_textures(config)?;
    let mut renderer = Renderer::new(config.render.width, config.render.height, RecordingSink::new());
    draw_scene(&mut renderer, config, &textures)?;

    let sink = renderer.sink();
    Ok(SceneStats {
        triangles: sink.triangles.len(),
        lines: sink.lines.len(),
        points: sink.points.len(),
    })
}

/// One entry per configured shape.
fn load_textures(config: &Config) -> Result<Vec<Option<Arc<Texture>>>, AppError> {
    config
        .shapes
        .iter()
        .map(|shape| match &shape.texture {
            Some(path) => Ok(Some(Arc::new(Texture::load(path)?))),
            None => Ok(None),
        })
        .collect()
}

/// Builds the configured camera, starting from the surface default.
pub fn camera_from_config(cfg: &CameraConfig, width: usize, height: usize) -> Camera {
    let mut camera = Camera::default_for(width, height);

    if let Some(eye) = cfg.eye {
        camera.eye = Point3::from(eye);
    }
    if let Some(center) = cfg.center {
        camera.center = Point3::from(center);
    }
    if let Some(up) = cfg.up {
        camera.up = Vector3::from(up);
    }
    if let Some(near) = cfg.near {
        camera.near = near;
    }
    if let Some(far) = cfg.far {
        camera.far = far;
    }

    camera.projection_type = match cfg.projection.as_str() {
        "orthographic" => Camera::centered_ortho(width, height),
        _ => ProjectionType::Perspective {
            fov_y_rad: cfg.fov.to_radians(),
            aspect_ratio: width as f32 / height.max(1) as f32,
        },
    };
    camera
}

/// Feeds a whole configured scene through a renderer, from `begin_draw`
/// to `end_draw`.
pub fn draw_scene<S: RasterSink>(
    renderer: &mut Renderer<S>,
    config: &Config,
    textures: &[Option<Arc<Texture>>],
) -> Result<(), PipelineError> {
    // 1. Pipeline switches and camera
    renderer.clipper = NearClipper::new(config.render.near_clip, config.render.quad_clip);
    if config.render.depth_sort {
        renderer.hint(Hint::DepthSort);
    }
    if config.render.accurate_textures {
        renderer.hint(Hint::AccurateTextures);
    }
    camera_from_config(&config.camera, renderer.width(), renderer.height()).apply(&mut renderer.matrices);

    renderer.begin_draw();

    // 2. Lights
    let lighting = &config.lighting;
    if lighting.defaults {
        renderer.lights()?;
    }
    let [c, l, q] = lighting.falloff;
    renderer.light_falloff(c, l, q);
    renderer.light_specular(Vector3::from(lighting.specular));

    for light in &config.lights {
        let color = Vector3::from(light.color);
        let position = light.position.map(Point3::from);
        let direction = light.direction.map(Vector3::from).unwrap_or_else(|| Vector3::new(0.0, 0.0, -1.0));
        match (light.r#type.as_str(), position) {
            ("directional", _) => renderer.directional_light(color, direction)?,
            ("point", Some(p)) => renderer.point_light(color, p)?,
            ("spot", Some(p)) => {
                let angle = light.angle.unwrap_or(90.0).to_radians();
                renderer.spot_light(color, p, direction, angle, light.concentration)?
            }
            _ => renderer.ambient_light(color, position)?,
        }
    }
    debug!("Declared {} lights", renderer.context.lights.len());

    // 3. Shapes
    for (shape, texture) in config.shapes.iter().zip(textures) {
        renderer.push_matrix()?;
        draw_shape(renderer, shape, texture.clone())?;
        renderer.pop_matrix()?;
    }

    renderer.end_draw()
}

fn draw_shape<S: RasterSink>(
    renderer: &mut Renderer<S>,
    shape: &ShapeConfig,
    texture: Option<Arc<Texture>>,
) -> Result<(), PipelineError> {
    // Transform
    let [tx, ty, tz] = shape.translate;
    renderer.translate(tx, ty, tz);
    let [rx, ry, rz] = shape.rotate;
    renderer.rotate_x(rx.to_radians());
    renderer.rotate_y(ry.to_radians());
    renderer.rotate_z(rz.to_radians());
    let [sx, sy, sz] = shape.scale;
    renderer.scale(sx, sy, sz);

    // Style, starting from the defaults for every shape
    renderer.context.style = Style::default();
    match shape.fill {
        Some(c) => renderer.fill(Rgba::from(c)),
        None => renderer.no_fill(),
    }
    match shape.stroke {
        Some(c) => renderer.stroke(Rgba::from(c)),
        None => renderer.no_stroke(),
    }
    renderer.stroke_weight(shape.stroke_weight);
    if let Some(c) = shape.ambient {
        renderer.ambient(Rgb::from(c));
    }
    if let Some(c) = shape.specular {
        renderer.specular(Rgb::from(c));
    }
    if let Some(c) = shape.emissive {
        renderer.emissive(Rgb::from(c));
    }
    if let Some(s) = shape.shininess {
        renderer.shininess(s);
    }

    // Geometry
    renderer.begin_shape(shape.kind);
    let textured = texture.is_some();
    renderer.texture(texture);
    renderer.texture_mode(TextureMode::Normal);
    if let Some([nx, ny, nz]) = shape.normal {
        renderer.normal(nx, ny, nz);
    }

    for (i, v) in shape.vertices.iter().enumerate() {
        if let Some([nx, ny, nz]) = shape.normals.as_ref().and_then(|n| n.get(i)).copied() {
            renderer.normal(nx, ny, nz);
        }
        match v.as_slice() {
            &[x, y, z, u, w] if textured => renderer.vertex_uv(x, y, z, u, w),
            &[x, y, z, ..] => renderer.vertex(x, y, z),
            _ => {}
        }
    }

    let close = if shape.close { CloseMode::Close } else { CloseMode::Open };
    renderer.end_shape(close)
}
