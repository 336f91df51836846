use bevy::prelude::*;

use crate::config::TOP_EDGE_TOLERANCE;
use crate::systems::building::Polygon;

/// Vertex and edge soup of a foundation, the shape each floor is laid out on.
/// World space is Y-up, so elevation is `y` and the ground plane is `(x, z)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FootprintMesh {
    pub vertices: Vec<Vec3>,
    pub edges: Vec<[usize; 2]>,
}

/// One straight top edge of a footprint, in ground-plane coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
}

impl Segment {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    pub fn direction(&self) -> Vec2 {
        (self.end - self.start).normalize_or_zero()
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Angle of the direction in the ground plane
    pub fn heading(&self) -> f32 {
        let dir = self.direction();
        dir.y.atan2(dir.x)
    }
}

impl FootprintMesh {
    /// Builds a slab prism from a ground polygon: bottom ring at 0, top ring at
    /// `thickness`, one vertical edge per corner. Ring edges follow polygon order.
    pub fn from_polygon(polygon: &Polygon, thickness: f32) -> Self {
        let n = polygon.len();
        if n < 2 {
            return Self::default();
        }

        let mut vertices = Vec::with_capacity(n * 2);
        vertices.extend(polygon.iter().map(|p| Vec3::new(p.x, 0.0, p.y)));
        vertices.extend(polygon.iter().map(|p| Vec3::new(p.x, thickness, p.y)));

        let mut edges = Vec::with_capacity(n * 3);
        for i in 0..n {
            let next = (i + 1) % n;
            edges.push([i, next]);              // bottom ring
            edges.push([n + i, n + next]);      // top ring
            edges.push([i, n + i]);             // vertical
        }

        Self { vertices, edges }
    }

    /// Copy of the mesh with its floor transform applied: horizontal scale about
    /// the local origin, then lifted by `elevation`.
    pub fn duplicated(&self, elevation: f32, scale: f32) -> Self {
        let vertices = self.vertices
            .iter()
            .map(|v| Vec3::new(v.x * scale, v.y + elevation, v.z * scale))
            .collect();

        Self {
            vertices,
            edges: self.edges.clone(),
        }
    }

    pub fn max_elevation(&self) -> Option<f32> {
        self.vertices
            .iter()
            .map(|v| v.y)
            .fold(None, |acc, y| Some(acc.map_or(y, |m: f32| m.max(y))))
    }

    /// Collects the horizontal edges lying on the topmost plane, in discovery
    /// order. Nothing here orders them into a loop.
    pub fn extract_top_segments(&self) -> Vec<Segment> {
        let Some(max_y) = self.max_elevation() else {
            return Vec::new();
        };

        let mut segments = Vec::new();
        for &[a, b] in &self.edges {
            let (Some(v1), Some(v2)) = (self.vertices.get(a), self.vertices.get(b)) else {
                continue; // dangling index
            };

            let on_top = (v1.y - max_y).abs() < TOP_EDGE_TOLERANCE
                && (v2.y - max_y).abs() < TOP_EDGE_TOLERANCE
                && (v1.y - v2.y).abs() < TOP_EDGE_TOLERANCE;
            if !on_top {
                continue;
            }

            let segment = Segment::new(Vec2::new(v1.x, v1.z), Vec2::new(v2.x, v2.z));
            if segment.length() <= f32::EPSILON {
                continue;
            }
            segments.push(segment);
        }

        segments
    }
}
