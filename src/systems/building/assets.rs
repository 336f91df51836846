// asset library: named facade pieces per (style, detail tier)
// the planner only ever asks "what matches this keyword", the spawner asks for meshes

use std::collections::HashMap;

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use thiserror::Error;

use crate::config::*;
use crate::systems::building::Polygon;
use crate::systems::mesh::poly::{mesh_gen, utils::polygon_area};
use super::style::{floor_height, DetailTier, Style};

/// Reference to one concrete asset in a library.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AssetHandle {
    pub style: Style,
    pub details: DetailTier,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssetError {
    #[error("no asset matching '{keyword}' for {style} / {details}")]
    NotFound {
        style: Style,
        details: DetailTier,
        keyword: String,
    },
    #[error("unknown asset '{0}'")]
    UnknownHandle(String),
    #[error("asset '{0}' carries no footprint")]
    NoFootprint(String),
    #[error("footprint of '{0}' has fewer than three corners")]
    DegenerateFootprint(String),
}

pub trait AssetLibrary {
    /// Every asset whose name contains `keyword`, case-insensitive.
    fn matching(&self, style: Style, details: DetailTier, keyword: &str) -> Vec<AssetHandle>;

    /// Ground polygon of a foundation asset.
    fn footprint(&self, handle: &AssetHandle) -> Result<Polygon, AssetError>;

    fn instantiate(&self, handle: &AssetHandle) -> Result<Mesh, AssetError>;
}

/// Random variant among the assets matching `keyword`.
pub fn pick(
    library: &dyn AssetLibrary,
    style: Style,
    details: DetailTier,
    keyword: &str,
    rng: &mut StdRng,
) -> Result<AssetHandle, AssetError> {
    library
        .matching(style, details, keyword)
        .choose(rng)
        .cloned()
        .ok_or_else(|| AssetError::NotFound {
            style,
            details,
            keyword: keyword.to_string(),
        })
}

/// Walks a fallback chain and returns the first hit with the keyword that found it.
/// An exhausted chain reports the most specific keyword.
pub fn resolve(
    library: &dyn AssetLibrary,
    style: Style,
    details: DetailTier,
    candidates: &[String],
    rng: &mut StdRng,
) -> Result<(AssetHandle, String), AssetError> {
    for keyword in candidates {
        if let Ok(handle) = pick(library, style, details, keyword, rng) {
            return Ok((handle, keyword.clone()));
        }
    }

    Err(AssetError::NotFound {
        style,
        details,
        keyword: candidates.first().cloned().unwrap_or_default(),
    })
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Opening {
    Solid,
    Door { width: f32 },
    Window { width: f32 },
    Balcony { width: f32 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum AssetKind {
    Wall { length: f32, height: f32, opening: Opening },
    Engawa { length: f32 },
    Interfloor { length: f32 },
    Foundation { polygon: Polygon },
    Roof { polygon: Polygon },
}

#[derive(Clone, Debug)]
pub struct AssetEntry {
    pub name: String,
    pub kind: AssetKind,
}

/// Procedural stand-in for a hand-modelled asset pack.
///
/// What each style carries decides which fallbacks fire: Brezhnev has no
/// balconies, Stalinist no doors on short modules, and the test style nothing
/// but bare walls.
#[derive(Resource, Clone, Debug, Default)]
pub struct BuiltinLibrary {
    sets: HashMap<(Style, DetailTier), Vec<AssetEntry>>,
}

impl BuiltinLibrary {
    pub fn new() -> Self {
        let mut library = Self::default();
        for style in Style::ALL {
            for details in DetailTier::ALL {
                library.sets.insert((style, details), asset_set(style, details));
            }
        }
        library
    }

    pub fn entries(&self, style: Style, details: DetailTier) -> &[AssetEntry] {
        self.sets.get(&(style, details)).map(Vec::as_slice).unwrap_or(&[])
    }

    fn entry(&self, handle: &AssetHandle) -> Result<&AssetEntry, AssetError> {
        self.entries(handle.style, handle.details)
            .iter()
            .find(|entry| entry.name == handle.name)
            .ok_or_else(|| AssetError::UnknownHandle(handle.name.clone()))
    }
}

impl AssetLibrary for BuiltinLibrary {
    fn matching(&self, style: Style, details: DetailTier, keyword: &str) -> Vec<AssetHandle> {
        let keyword = keyword.to_lowercase();
        self.entries(style, details)
            .iter()
            .filter(|entry| entry.name.to_lowercase().contains(&keyword))
            .map(|entry| AssetHandle {
                style,
                details,
                name: entry.name.clone(),
            })
            .collect()
    }

    fn footprint(&self, handle: &AssetHandle) -> Result<Polygon, AssetError> {
        match &self.entry(handle)?.kind {
            AssetKind::Foundation { polygon } if polygon.len() >= 3 => Ok(polygon.clone()),
            AssetKind::Foundation { .. } => Err(AssetError::DegenerateFootprint(handle.name.clone())),
            _ => Err(AssetError::NoFootprint(handle.name.clone())),
        }
    }

    fn instantiate(&self, handle: &AssetHandle) -> Result<Mesh, AssetError> {
        let mesh = match &self.entry(handle)?.kind {
            AssetKind::Wall { length, height, opening } => mesh_gen::wall_module(*length, *height, *opening),
            AssetKind::Engawa { length } => mesh_gen::engawa_deck(*length),
            AssetKind::Interfloor { length } => mesh_gen::interfloor_band(*length),
            AssetKind::Foundation { polygon } => {
                if polygon.len() < 3 {
                    return Err(AssetError::DegenerateFootprint(handle.name.clone()));
                }
                mesh_gen::polygon_to_slab(polygon, FOUNDATION_THICKNESS)
            }
            AssetKind::Roof { polygon } => {
                if polygon.len() < 3 {
                    return Err(AssetError::DegenerateFootprint(handle.name.clone()));
                }
                mesh_gen::polygon_to_roof(polygon, ROOF_RISE)
            }
        };
        Ok(mesh)
    }
}

// footprints are centred on the origin so floor tapering shrinks towards the middle
fn rectangle(width: f32, depth: f32) -> Polygon {
    let (hw, hd) = (width * 0.5, depth * 0.5);
    vec![
        Vec2::new(-hw, -hd),
        Vec2::new(hw, -hd),
        Vec2::new(hw, hd),
        Vec2::new(-hw, hd),
    ]
}

fn foundations(style: Style) -> Vec<(u32, Polygon)> {
    match style {
        Style::Japanese => vec![
            (1, rectangle(9.6, 7.2)),
            (2, vec![
                Vec2::new(-4.8, -3.6),
                Vec2::new(4.8, -3.6),
                Vec2::new(4.8, 0.6),
                Vec2::new(0.0, 0.6),
                Vec2::new(0.0, 3.6),
                Vec2::new(-4.8, 3.6),
            ]),
        ],
        Style::Khrushchev => vec![(1, rectangle(36.0, 12.0)), (2, rectangle(48.0, 12.0))],
        Style::Brezhnev => vec![(1, rectangle(42.0, 12.0)), (2, rectangle(18.0, 18.0))],
        Style::Stalinist => vec![
            (1, rectangle(30.0, 14.4)),
            (2, vec![
                Vec2::new(-15.0, -12.0),
                Vec2::new(15.0, -12.0),
                Vec2::new(15.0, 0.0),
                Vec2::new(3.0, 0.0),
                Vec2::new(3.0, 12.0),
                Vec2::new(-15.0, 12.0),
            ]),
        ],
        Style::Test => vec![(1, rectangle(7.3, 4.8))],
    }
}

// counter-clockwise in the ground plane, so the left side of every edge is inside
fn counter_clockwise(mut polygon: Polygon) -> Polygon {
    if polygon_area(&polygon) < 0.0 {
        polygon.reverse();
    }
    polygon
}

fn asset_set(style: Style, details: DetailTier) -> Vec<AssetEntry> {
    let mut entries = Vec::new();
    let mut add = |name: String, kind: AssetKind| entries.push(AssetEntry { name, kind });

    let height = floor_height(style, details) - FOUNDATION_THICKNESS;
    let window_width = match details {
        DetailTier::Low => 1.0,
        DetailTier::Medium => 1.2,
        DetailTier::High => 1.4,
    };

    for (id, polygon) in foundations(style) {
        let polygon = counter_clockwise(polygon);
        let tier = details.keyword();
        add(format!("base_{}_{tier}_{id}", style.keyword()), AssetKind::Foundation { polygon: polygon.clone() });
        add(format!("roof_{}_{tier}_{id}", style.roof_prefix()), AssetKind::Roof { polygon });
    }

    for length in WALL_LENGTHS {
        let code = (length * MODULE_KEYWORD_FACTOR).round() as i32;
        let wall = |opening| AssetKind::Wall { length, height, opening };

        add(format!("wall{code}"), wall(Opening::Solid));
        if style == Style::Test {
            continue;
        }

        add(format!("wall{code}_{}", style.keyword()), wall(Opening::Solid));
        add(format!("wall{code}_window"), wall(Opening::Window { width: window_width }));
        if details == DetailTier::High {
            add(format!("wall{code}_window_b"), wall(Opening::Window { width: window_width * 0.6 }));
        }

        let has_door = style != Style::Stalinist || length >= 3.0;
        if has_door {
            add(format!("wall{code}_door"), wall(Opening::Door { width: 1.0 }));
        }

        if style == Style::Khrushchev {
            add(format!("wall{code}_balcony"), wall(Opening::Balcony { width: 1.0 }));
        }

        if style == Style::Japanese {
            add(format!("engawa{code}"), AssetKind::Engawa { length });
            add(format!("interfloor{code}"), AssetKind::Interfloor { length });
        }
    }

    entries
}
