// UTILS

use bevy::prelude::*;
use crate::systems::mesh::Polygon;

/// Computes the signed area of a polygon in the ground plane
/// # Returns the polygon's area as an `f32`, positive for counter-clockwise rings.
/// Returns 0.0 for polygons with fewer than 3 vertices.
pub fn polygon_area(polygon: &Polygon) -> f32 {
    if polygon.len() < 3 {
        return 0.0;
    }

    let n = polygon.len();
    let mut area = 0.0;

    for i in 0..n {
        let j = (i + 1) % n;
        area += polygon[i].x * polygon[j].y - polygon[j].x * polygon[i].y;
    }

    area / 2.0
}

/// Calculates the centroid of a polygon
/// Returns a `Vec2` representing the centroid position. Returns `Vec2::ZERO` for degenerate polygons.
pub fn polygon_centroid(polygon: &Polygon, area: f32) -> Vec2 {
    if polygon.len() < 3 || area == 0.0 {
        return Vec2::ZERO;
    }

    let n = polygon.len();
    let (mut cx, mut cy) = (0.0f64, 0.0f64);

    for i in 0..n {
        let j = (i + 1) % n;
        let p = polygon[i].x as f64 * polygon[j].y as f64 - polygon[j].x as f64 * polygon[i].y as f64;
        cx += (polygon[i].x + polygon[j].x) as f64 * p;
        cy += (polygon[i].y + polygon[j].y) as f64 * p;
    }

    let area_6 = 6.0 * area as f64;
    Vec2::new((cx / area_6) as f32, (cy / area_6) as f32)
}

/// Determines whether a point is inside a polygon using the ray-casting algorithm.
/// # Returns `true` if the point is inside the polygon, otherwise `false`.
pub fn point_in_polygon(point: &Vec2, polygon: &[Vec2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;

    for i in 0..polygon.len() {
        let yi = polygon[i].y;
        let yj = polygon[j].y;
        let xi = polygon[i].x;
        let xj = polygon[j].x;

        if ((yi > point.y) != (yj > point.y)) &&
           (point.x < (xj - xi) * (point.y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }

    inside
}
