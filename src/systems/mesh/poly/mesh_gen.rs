use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use spade::{ConstrainedDelaunayTriangulation, Point2, Triangulation};

use crate::config::{ENGAWA_DEPTH, INTERFLOOR_HEIGHT, WALL_DEPTH};
use crate::systems::building::assets::Opening;
use crate::systems::mesh::Polygon;
use super::utils::{point_in_polygon, polygon_area, polygon_centroid};

// Local frame of every facade piece: +X runs along the wall, +Y is up and
// -Z faces the street (footprints are counter-clockwise, so +Z is inside).

/// Flat-shaded triangle soup, turned into a bevy mesh at the end.
#[derive(Default)]
pub struct MeshData {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl MeshData {
    /// Adds a triangle wound so that its face normal points along `facing`.
    pub fn add_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, facing: Vec3) {
        let normal = (b - a).cross(c - a);
        let (b, c, normal) = if normal.dot(facing) < 0.0 { (c, b, -normal) } else { (b, c, normal) };
        let Some(normal) = normal.try_normalize() else {
            return; // degenerate
        };

        let base = self.positions.len() as u32;
        for p in [a, b, c] {
            self.positions.push(p.to_array());
            self.normals.push(normal.to_array());
            self.uvs.push([p.x + p.z, p.y]);
        }
        self.indices.extend([base, base + 1, base + 2]);
    }

    /// `a b c d` in ring order
    pub fn add_quad(&mut self, a: Vec3, b: Vec3, c: Vec3, d: Vec3, facing: Vec3) {
        self.add_triangle(a, b, c, facing);
        self.add_triangle(a, c, d, facing);
    }

    pub fn add_cuboid(&mut self, min: Vec3, max: Vec3) {
        if (max - min).min_element() <= 0.0 {
            return;
        }
        let p = |x: bool, y: bool, z: bool| Vec3::new(
            if x { max.x } else { min.x },
            if y { max.y } else { min.y },
            if z { max.z } else { min.z },
        );

        self.add_quad(p(false, false, false), p(false, true, false), p(false, true, true), p(false, false, true), Vec3::NEG_X);
        self.add_quad(p(true, false, false), p(true, true, false), p(true, true, true), p(true, false, true), Vec3::X);
        self.add_quad(p(false, false, false), p(true, false, false), p(true, false, true), p(false, false, true), Vec3::NEG_Y);
        self.add_quad(p(false, true, false), p(true, true, false), p(true, true, true), p(false, true, true), Vec3::Y);
        self.add_quad(p(false, false, false), p(true, false, false), p(true, true, false), p(false, true, false), Vec3::NEG_Z);
        self.add_quad(p(false, false, true), p(true, false, true), p(true, true, true), p(false, true, true), Vec3::Z);
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn into_mesh(self) -> Mesh {
        let mut mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
        );

        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        mesh.insert_indices(Indices::U32(self.indices));

        mesh
    }
}

/// Triangulates a simple polygon, concave ones included.
/// # Returns the triangles lying inside the outline, empty for degenerate input
pub fn triangulate(polygon: &Polygon) -> Vec<[Vec2; 3]> {
    if polygon.len() < 3 {
        return Vec::new();
    }

    let mut cdt = ConstrainedDelaunayTriangulation::<Point2<f64>>::new();
    let mut handles = Vec::with_capacity(polygon.len());
    for p in polygon {
        match cdt.insert(Point2::new(p.x as f64, p.y as f64)) {
            Ok(handle) => handles.push(handle),
            Err(_) => return Vec::new(), // NaN or out of range
        }
    }

    // constrain the outline so concave corners survive
    for i in 0..handles.len() {
        let (a, b) = (handles[i], handles[(i + 1) % handles.len()]);
        if a != b && cdt.can_add_constraint(a, b) {
            cdt.add_constraint(a, b);
        }
    }

    cdt.inner_faces()
        .filter_map(|face| {
            let [a, b, c] = face.vertices().map(|v| {
                let p = v.position();
                Vec2::new(p.x as f32, p.y as f32)
            });
            let center = (a + b + c) / 3.0;
            point_in_polygon(&center, polygon).then_some([a, b, c])
        })
        .collect()
}

// outward normal of edge i in the ground plane
fn edge_normal(polygon: &Polygon, i: usize, winding: f32) -> Option<Vec2> {
    let v1 = polygon[i];
    let v2 = polygon[(i + 1) % polygon.len()];
    let edge = v2 - v1;
    Vec2::new(edge.y, -edge.x).try_normalize().map(|n| n * winding.signum())
}

fn ground(p: Vec2, y: f32) -> Vec3 {
    Vec3::new(p.x, y, p.y)
}

/// Foundation slab: extruded footprint with triangulated caps.
pub fn polygon_to_slab(polygon: &Polygon, thickness: f32) -> Mesh {
    let mut data = MeshData::default();
    if polygon.len() < 3 {
        return data.into_mesh();
    }

    let winding = polygon_area(polygon);
    for i in 0..polygon.len() {
        let Some(normal) = edge_normal(polygon, i, winding) else {
            continue;
        };
        let v1 = polygon[i];
        let v2 = polygon[(i + 1) % polygon.len()];
        data.add_quad(
            ground(v1, 0.0),
            ground(v2, 0.0),
            ground(v2, thickness),
            ground(v1, thickness),
            Vec3::new(normal.x, 0.0, normal.y),
        );
    }

    for [a, b, c] in triangulate(polygon) {
        data.add_triangle(ground(a, 0.0), ground(b, 0.0), ground(c, 0.0), Vec3::NEG_Y);
        data.add_triangle(ground(a, thickness), ground(b, thickness), ground(c, thickness), Vec3::Y);
    }

    data.into_mesh()
}

// TODO: the centroid fan folds over itself on deeply concave footprints, a straight-skeleton hip roof would fix it
/// Pyramid roof over the footprint, apex above the centroid.
pub fn polygon_to_roof(polygon: &Polygon, rise: f32) -> Mesh {
    let mut data = MeshData::default();
    if polygon.len() < 3 {
        return data.into_mesh();
    }

    let winding = polygon_area(polygon);
    let apex = ground(polygon_centroid(polygon, winding), rise);

    for i in 0..polygon.len() {
        let Some(normal) = edge_normal(polygon, i, winding) else {
            continue;
        };
        let v1 = polygon[i];
        let v2 = polygon[(i + 1) % polygon.len()];
        data.add_triangle(ground(v1, 0.0), ground(v2, 0.0), apex, Vec3::new(normal.x, 1.0, normal.y));
    }

    for [a, b, c] in triangulate(polygon) {
        data.add_triangle(ground(a, 0.0), ground(b, 0.0), ground(c, 0.0), Vec3::NEG_Y);
    }

    data.into_mesh()
}

fn wall_data(length: f32, height: f32, opening: Opening) -> MeshData {
    let mut data = MeshData::default();
    let d = WALL_DEPTH * 0.5;
    let mut panel = |x0: f32, x1: f32, y0: f32, y1: f32| {
        data.add_cuboid(Vec3::new(x0, y0, -d), Vec3::new(x1, y1, d));
    };

    let gap = |width: f32| {
        let w = width.min(length * 0.6);
        let x0 = (length - w) * 0.5;
        (x0, x0 + w)
    };
    let lintel = (height * 0.8).min(2.1);

    match opening {
        Opening::Solid => panel(0.0, length, 0.0, height),
        Opening::Door { width } | Opening::Balcony { width } => {
            let (x0, x1) = gap(width);
            panel(0.0, x0, 0.0, height);
            panel(x1, length, 0.0, height);
            panel(x0, x1, lintel, height);
        }
        Opening::Window { width } => {
            let (x0, x1) = gap(width);
            let sill = (height * 0.33).min(0.9);
            panel(0.0, x0, 0.0, height);
            panel(x1, length, 0.0, height);
            panel(x0, x1, 0.0, sill);
            panel(x0, x1, lintel, height);
        }
    }

    if let Opening::Balcony { width } = opening {
        let (x0, x1) = gap(width);
        let outer = -d - 1.0;
        data.add_cuboid(Vec3::new(x0 - 0.3, 0.0, outer), Vec3::new(x1 + 0.3, 0.12, -d));
        data.add_cuboid(Vec3::new(x0 - 0.3, 0.12, outer), Vec3::new(x1 + 0.3, 1.0, outer + 0.05));
    }

    data
}

/// One facade module of nominal `length`, opening cut as panels around it.
pub fn wall_module(length: f32, height: f32, opening: Opening) -> Mesh {
    wall_data(length, height, opening).into_mesh()
}

/// Veranda deck in front of a module, posts reaching below its origin.
pub fn engawa_deck(length: f32) -> Mesh {
    let mut data = MeshData::default();
    let inner = -WALL_DEPTH * 0.5;
    let outer = inner - ENGAWA_DEPTH;

    data.add_cuboid(Vec3::new(0.0, 0.08, outer), Vec3::new(length, 0.16, inner));
    for x in [0.05, length - 0.15] {
        data.add_cuboid(Vec3::new(x, -0.3, outer), Vec3::new(x + 0.1, 0.08, outer + 0.1));
    }

    data.into_mesh()
}

/// Belt course marking a storey line, protruding slightly from the wall.
pub fn interfloor_band(length: f32) -> Mesh {
    let mut data = MeshData::default();
    let d = WALL_DEPTH * 0.5;
    data.add_cuboid(Vec3::new(0.0, 0.0, -d - 0.08), Vec3::new(length, INTERFLOOR_HEIGHT, d));
    data.into_mesh()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangles(mesh: &Mesh) -> usize {
        mesh.indices().map_or(0, |i| i.len() / 3)
    }

    fn tri_area([a, b, c]: [Vec2; 3]) -> f32 {
        ((b - a).perp_dot(c - a) * 0.5).abs()
    }

    #[test]
    fn wall_panels_follow_opening() {
        assert_eq!(wall_data(2.4, 2.8, Opening::Solid).triangle_count(), 12);
        assert_eq!(wall_data(2.4, 2.8, Opening::Door { width: 1.0 }).triangle_count(), 36);
        assert_eq!(wall_data(2.4, 2.8, Opening::Window { width: 1.0 }).triangle_count(), 48);
        assert_eq!(wall_data(2.4, 2.8, Opening::Balcony { width: 1.0 }).triangle_count(), 60);
    }

    #[test]
    fn concave_footprint_triangulates_inside_only() {
        let l_shape = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 2.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(2.0, 4.0),
            Vec2::new(0.0, 4.0),
        ];
        let tris = triangulate(&l_shape);
        assert_eq!(tris.len(), 4);
        let area: f32 = tris.into_iter().map(tri_area).sum();
        assert_relative_eq!(area, 12.0, epsilon = 1e-4);
    }

    #[test]
    fn slab_has_sides_and_caps() {
        let square = vec![
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
        ];
        assert_eq!(triangles(&polygon_to_slab(&square, 0.2)), 4 * 2 + 2 * 2);
        assert_eq!(triangles(&polygon_to_roof(&square, 1.0)), 4 + 2);
        assert_eq!(triangles(&polygon_to_slab(&vec![Vec2::ZERO, Vec2::X], 0.2)), 0);
    }

    #[test]
    fn triangles_face_their_side() {
        let mut data = MeshData::default();
        data.add_triangle(Vec3::ZERO, Vec3::Z, Vec3::X, Vec3::Y);
        let [a, b, c] = [data.positions[0], data.positions[1], data.positions[2]].map(Vec3::from_array);
        assert!((b - a).cross(c - a).y > 0.0);
        assert_eq!(data.normals[0], [0.0, 1.0, 0.0]);
    }
}
