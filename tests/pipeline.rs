use soft3d::core::color::{gray, rgba};
use soft3d::pipeline::clip::{NearClipper, QuadClip};
use soft3d::pipeline::sink::ScreenTriangle;
use soft3d::{CloseMode, Hint, PipelineError, RecordingSink, Renderer, ShapeKind};

const EPS: f32 = 1e-5;

/// A 100x100 renderer whose model-view is the identity, so vertices are
/// given directly in view space.
fn renderer() -> Renderer<RecordingSink> {
    let mut r = Renderer::new(100, 100, RecordingSink::new());
    r.begin_draw();
    r.reset_matrix();
    r
}

fn triangle(r: &mut Renderer<RecordingSink>, z: [f32; 3]) -> Result<(), PipelineError> {
    r.begin_shape(ShapeKind::Triangles);
    r.vertex(0.0, 0.0, z[0]);
    r.vertex(10.0, 0.0, z[1]);
    r.vertex(0.0, 10.0, z[2]);
    r.end_shape(CloseMode::Open)
}

fn screen_area(t: &ScreenTriangle) -> f32 {
    let [a, b, c] = t.corners.map(|c| c.position);
    (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)
}

#[test]
fn test_unlit_white_triangle_passes_through() {
    let mut r = renderer();
    r.fill(rgba(1.0, 1.0, 1.0, 1.0));
    r.no_stroke();
    triangle(&mut r, [-10.0; 3]).unwrap();
    r.end_draw().unwrap();

    let sink = r.sink();
    assert_eq!(sink.triangles.len(), 1);
    assert!(sink.lines.is_empty());
    for corner in &sink.triangles[0].corners {
        assert!((corner.color - rgba(1.0, 1.0, 1.0, 1.0)).norm() < EPS);
        assert!(corner.position.z > 0.0 && corner.position.z < 1.0);
    }
}

#[test]
fn test_ambient_light_scales_fill() {
    let mut r = renderer();
    r.ambient_light(gray(0.25), None).unwrap();
    r.fill(rgba(1.0, 1.0, 1.0, 1.0));
    r.no_stroke();
    triangle(&mut r, [-10.0; 3]).unwrap();

    for corner in &r.sink().triangles[0].corners {
        assert!((corner.color - rgba(0.25, 0.25, 0.25, 1.0)).norm() < EPS);
    }
}

#[test]
fn test_depth_sort_delivers_back_to_front() {
    let mut r = renderer();
    r.hint(Hint::DepthSort);
    r.no_stroke();
    triangle(&mut r, [-20.0; 3]).unwrap(); // shape 1, nearest
    triangle(&mut r, [-100.0; 3]).unwrap(); // shape 2, farthest
    triangle(&mut r, [-50.0; 3]).unwrap(); // shape 3
    assert!(r.sink().triangles.is_empty());

    r.end_draw().unwrap();
    let order: Vec<usize> = r.sink().triangles.iter().map(|t| t.shape_index).collect();
    assert_eq!(order, vec![2, 3, 1]);
}

#[test]
fn test_nan_depth_aborts_and_reset_recovers() {
    let mut r = renderer();
    r.hint(Hint::DepthSort);
    r.no_stroke();
    triangle(&mut r, [-20.0; 3]).unwrap();
    triangle(&mut r, [-20.0, f32::NAN, -20.0]).unwrap();

    assert_eq!(r.end_draw(), Err(PipelineError::NanDepth { index: 1 }));
    assert!(r.sink().triangles.is_empty());

    r.begin_draw();
    r.reset_matrix();
    triangle(&mut r, [-20.0; 3]).unwrap();
    r.end_draw().unwrap();
    assert_eq!(r.sink().triangles.len(), 1);
}

#[test]
fn test_strip_winding_is_independent_of_buffer_offset() {
    let mut r = renderer();
    r.hint(Hint::DepthSort);
    r.no_stroke();
    // three vertices first, so the strip starts at an odd buffer index
    triangle(&mut r, [-30.0; 3]).unwrap();

    r.begin_shape(ShapeKind::TriangleStrip);
    r.vertex(0.0, 0.0, -10.0);
    r.vertex(0.0, 10.0, -10.0);
    r.vertex(10.0, 0.0, -10.0);
    r.vertex(10.0, 10.0, -10.0);
    r.end_shape(CloseMode::Open).unwrap();
    r.end_draw().unwrap();

    let strip: Vec<f32> = r
        .sink()
        .triangles
        .iter()
        .filter(|t| t.shape_index == 2)
        .map(screen_area)
        .collect();
    assert_eq!(strip.len(), 2);
    assert!(strip[0] * strip[1] > 0.0);
}

#[test]
fn test_near_plane_clip_counts() {
    let cases = [
        (QuadClip::Split, [-20.0, -20.0, -20.0], 1),
        (QuadClip::Split, [-20.0, -20.0, -5.0], 2),
        (QuadClip::Single, [-20.0, -20.0, -5.0], 1),
        (QuadClip::Split, [-20.0, -5.0, -5.0], 1),
        (QuadClip::Split, [-5.0, -5.0, -5.0], 0),
    ];
    for (quad_clip, z, expected) in cases {
        let mut r = Renderer::new(100, 100, RecordingSink::new()).with_clipper(NearClipper::new(-8.0, quad_clip));
        r.begin_draw();
        r.reset_matrix();
        r.no_stroke();
        triangle(&mut r, z).unwrap();
        assert_eq!(r.sink().triangles.len(), expected, "{quad_clip:?} {z:?}");
    }
}

#[test]
fn test_closed_outline_paths() {
    let mut r = renderer();
    r.no_fill();
    r.stroke(rgba(0.0, 0.0, 0.0, 1.0));
    r.begin_shape(ShapeKind::Polygon);
    r.vertex(0.0, 0.0, -10.0);
    r.vertex(10.0, 0.0, -10.0);
    r.vertex(10.0, 10.0, -10.0);
    r.vertex(0.0, 10.0, -10.0);
    r.end_shape(CloseMode::Close).unwrap();

    let lines = &r.sink().lines;
    assert_eq!(lines.len(), 4);
    assert!(lines[0].path_start);
    assert!(lines[1..].iter().all(|l| !l.path_start));
    assert!(r.sink().triangles.is_empty());
}

#[test]
fn test_concave_polygon_covers_its_area() {
    let mut r = renderer();
    r.no_stroke();
    r.begin_shape(ShapeKind::Polygon);
    for (x, y) in [(0.0, 0.0), (4.0, 0.0), (4.0, 1.0), (1.0, 1.0), (1.0, 4.0), (0.0, 4.0)] {
        r.vertex(x, y, -10.0);
    }
    r.end_shape(CloseMode::Close).unwrap();

    let triangles = &r.sink().triangles;
    assert_eq!(triangles.len(), 4);
    let first = screen_area(&triangles[0]);
    assert!(triangles.iter().all(|t| screen_area(t) * first > 0.0));
}

#[test]
fn test_matrix_stack_errors_surface() {
    let mut r = renderer();
    assert_eq!(r.pop_matrix(), Err(PipelineError::MatrixStackUnderflow));

    let x0 = r.screen_x(0.0, 0.0, -10.0);
    r.push_matrix().unwrap();
    r.translate(1.0, 0.0, 0.0);
    assert!(r.screen_x(0.0, 0.0, -10.0) > x0);
    assert!((r.model_x(0.0, 0.0, 0.0) - r.model_x(1.0, 0.0, 0.0) + 1.0).abs() < 1e-3);
    r.pop_matrix().unwrap();
    assert!((r.screen_x(0.0, 0.0, -10.0) - x0).abs() < EPS);
}

#[test]
fn test_point_light_shades_every_corner() {
    let mut r = renderer();
    r.no_stroke();
    r.point_light(gray(1.0), nalgebra::Point3::origin()).unwrap();
    r.begin_shape(ShapeKind::Triangles);
    r.vertex(0.0, 0.0, -10.0);
    r.vertex(40.0, 0.0, -10.0);
    r.vertex(0.0, 40.0, -10.0);
    r.end_shape(CloseMode::Open).unwrap();

    let corners = &r.sink().triangles[0].corners;
    let glancing = 10.0 / 1700f32.sqrt();
    assert!((corners[0].color.x - 1.0).abs() < EPS);
    assert!((corners[1].color.x - glancing).abs() < EPS);
    assert!((corners[2].color.x - glancing).abs() < EPS);
}
