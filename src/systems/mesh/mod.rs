// procedural meshes standing in for a modelled asset pack
use bevy::prelude::*;

pub mod poly;

// my 2d polygon datatype, (x, z) ground-plane coordinates
// abstraction of meshes allows for easier geometric manipulation
pub type Polygon = Vec<Vec2>;
