// handles placeholder geometry for facade pieces

pub mod mesh_gen;
pub mod utils;
