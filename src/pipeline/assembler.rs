use serde::Deserialize;

/// Primitive kind passed to `begin_shape`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Points,
    Lines,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
    QuadStrip,
    #[default]
    Polygon,
}

/// Whether `end_shape` closes the outline back to the first vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloseMode {
    #[default]
    Open,
    Close,
}

/// One stroke segment between two vertex indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    /// Starts a new stroke path.
    pub path_start: bool,
}

#[derive(Default)]
struct EdgeList {
    edges: Vec<Edge>,
    next_starts_path: bool,
}

impl EdgeList {
    fn new_path(&mut self) {
        self.next_starts_path = true;
    }

    fn push(&mut self, a: usize, b: usize) {
        self.edges.push(Edge {
            a,
            b,
            path_start: std::mem::take(&mut self.next_starts_path),
        });
    }
}

/// Stroke topology of the shape occupying vertex indices `first..last`.
///
/// POINTS yields nothing here; points are emitted separately.
pub fn stroke_edges(kind: ShapeKind, first: usize, last: usize, close: CloseMode) -> Vec<Edge> {
    let mut out = EdgeList::default();
    let count = last.saturating_sub(first);

    match kind {
        ShapeKind::Points => {}

        ShapeKind::Lines => {
            for i in (first..last.saturating_sub(1)).step_by(2) {
                out.new_path();
                out.push(i, i + 1);
            }
            if close == CloseMode::Close && count > 2 {
                out.push(last - 1, first);
            }
        }

        ShapeKind::Triangles => {
            for i in (first..last.saturating_sub(2)).step_by(3) {
                out.new_path();
                out.push(i, i + 1);
                out.push(i + 1, i + 2);
                out.push(i + 2, i);
            }
        }

        ShapeKind::TriangleStrip => {
            // the zig-zag as one path, then every i -> i+2 rung on its own
            out.new_path();
            for i in first..last.saturating_sub(1) {
                out.push(i, i + 1);
            }
            for i in first..last.saturating_sub(2) {
                out.new_path();
                out.push(i, i + 2);
            }
        }

        ShapeKind::TriangleFan => {
            for i in (first + 1)..last {
                out.new_path();
                out.push(first, i);
            }
            if count >= 3 {
                out.new_path();
                for i in (first + 1)..(last - 1) {
                    out.push(i, i + 1);
                }
                out.push(last - 1, first + 1);
            }
        }

        ShapeKind::Quads => {
            for i in (first..last.saturating_sub(3)).step_by(4) {
                out.new_path();
                out.push(i, i + 1);
                out.push(i + 1, i + 2);
                out.push(i + 2, i + 3);
                out.push(i + 3, i);
            }
        }

        ShapeKind::QuadStrip => {
            for i in (first..last.saturating_sub(3)).step_by(2) {
                out.new_path();
                out.push(i, i + 2);
                out.push(i + 2, i + 3);
                out.push(i + 3, i + 1);
                out.push(i + 1, i);
            }
        }

        ShapeKind::Polygon => {
            out.new_path();
            for i in first..last.saturating_sub(1) {
                out.push(i, i + 1);
            }
            if close == CloseMode::Close && count > 2 {
                out.push(last - 1, first);
            }
        }
    }

    out.edges
}

/// Fill topology of the shape occupying `first..last`.
///
/// POLYGON yields nothing here; it goes through the triangulator.
/// Strip parity is counted from `first`, so a shape's winding does not
/// depend on where it sits in an accumulated buffer.
pub fn fill_triangles(kind: ShapeKind, first: usize, last: usize) -> Vec<[usize; 3]> {
    let mut out = Vec::new();

    match kind {
        ShapeKind::Points | ShapeKind::Lines | ShapeKind::Polygon => {}

        ShapeKind::Triangles => {
            for i in (first..last.saturating_sub(2)).step_by(3) {
                out.push([i, i + 1, i + 2]);
            }
        }

        ShapeKind::TriangleStrip => {
            for i in first..last.saturating_sub(2) {
                if (i - first) % 2 == 0 {
                    out.push([i, i + 2, i + 1]);
                } else {
                    out.push([i, i + 1, i + 2]);
                }
            }
        }

        ShapeKind::TriangleFan => {
            for i in (first + 1)..last.saturating_sub(1) {
                out.push([first, i, i + 1]);
            }
        }

        ShapeKind::Quads => {
            for i in (first..last.saturating_sub(3)).step_by(4) {
                out.push([i, i + 1, i + 2]);
                out.push([i, i + 2, i + 3]);
            }
        }

        ShapeKind::QuadStrip => {
            for i in (first..last.saturating_sub(3)).step_by(2) {
                out.push([i, i + 2, i + 1]);
                out.push([i + 2, i + 3, i + 1]);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(edges: &[Edge]) -> Vec<(usize, usize)> {
        edges.iter().map(|e| (e.a, e.b)).collect()
    }

    fn signed_area(p: [(f32, f32); 3]) -> f32 {
        (p[1].0 - p[0].0) * (p[2].1 - p[0].1) - (p[2].0 - p[0].0) * (p[1].1 - p[0].1)
    }

    #[test]
    fn test_strip_winding_is_consistent() {
        // zig-zag strip: even vertices on y = 0, odd on y = 1
        let pos: Vec<(f32, f32)> = (0..6).map(|i| (i as f32, (i % 2) as f32)).collect();
        let tris = fill_triangles(ShapeKind::TriangleStrip, 0, 6);
        assert_eq!(tris[0], [0, 2, 1]);
        assert_eq!(tris[1], [1, 2, 3]);
        assert_eq!(tris.len(), 4);

        let signs: Vec<bool> = tris
            .iter()
            .map(|t| signed_area([pos[t[0]], pos[t[1]], pos[t[2]]]) > 0.0)
            .collect();
        assert!(signs.iter().all(|s| *s == signs[0]));
    }

    #[test]
    fn test_strip_parity_relative_to_first() {
        let tris = fill_triangles(ShapeKind::TriangleStrip, 7, 11);
        assert_eq!(tris, vec![[7, 9, 8], [8, 9, 10]]);
    }

    #[test]
    fn test_fan_and_quads() {
        assert_eq!(
            fill_triangles(ShapeKind::TriangleFan, 0, 5),
            vec![[0, 1, 2], [0, 2, 3], [0, 3, 4]]
        );
        assert_eq!(
            fill_triangles(ShapeKind::Quads, 0, 8),
            vec![[0, 1, 2], [0, 2, 3], [4, 5, 6], [4, 6, 7]]
        );
        assert_eq!(
            fill_triangles(ShapeKind::QuadStrip, 0, 6),
            vec![[0, 2, 1], [2, 3, 1], [2, 4, 3], [4, 5, 3]]
        );
    }

    #[test]
    fn test_incomplete_primitives_are_dropped() {
        assert!(fill_triangles(ShapeKind::Triangles, 0, 2).is_empty());
        assert_eq!(fill_triangles(ShapeKind::Triangles, 0, 5).len(), 1);
        assert!(fill_triangles(ShapeKind::Quads, 0, 3).is_empty());
        assert!(stroke_edges(ShapeKind::Quads, 0, 3, CloseMode::Open).is_empty());
        assert!(stroke_edges(ShapeKind::Lines, 0, 1, CloseMode::Close).is_empty());
    }

    #[test]
    fn test_lines_and_close() {
        let edges = stroke_edges(ShapeKind::Lines, 0, 4, CloseMode::Open);
        assert_eq!(pairs(&edges), vec![(0, 1), (2, 3)]);
        assert!(edges.iter().all(|e| e.path_start));

        let closed = stroke_edges(ShapeKind::Polygon, 2, 6, CloseMode::Close);
        assert_eq!(pairs(&closed), vec![(2, 3), (3, 4), (4, 5), (5, 2)]);
        assert!(closed[0].path_start);
        assert!(!closed[1].path_start);
    }

    #[test]
    fn test_fan_outline() {
        let edges = stroke_edges(ShapeKind::TriangleFan, 0, 4, CloseMode::Open);
        assert_eq!(
            pairs(&edges),
            vec![(0, 1), (0, 2), (0, 3), (1, 2), (2, 3), (3, 1)]
        );
    }

    #[test]
    fn test_triangle_outline() {
        let edges = stroke_edges(ShapeKind::Triangles, 0, 6, CloseMode::Open);
        assert_eq!(edges.len(), 6);
        assert_eq!(edges.iter().filter(|e| e.path_start).count(), 2);
    }
}
