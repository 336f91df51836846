pub mod building;
pub mod mesh;
pub mod ui;
