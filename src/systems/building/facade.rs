// facade role assignment
// decides which module of a segment becomes a door, window, balcony or plain wall,
// and how those choices carry from one floor to the next

use std::collections::BTreeMap;

use rand::Rng;
use rand::rngs::StdRng;

use crate::config::*;
use super::style::Style;

/// Semantic purpose of a placed piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Plain,
    Door,
    Window,
    Balcony,
    Engawa,
    Interfloor,
    Roof,
    Foundation,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Plain => "plain",
            Role::Door => "door",
            Role::Window => "window",
            Role::Balcony => "balcony",
            Role::Engawa => "engawa",
            Role::Interfloor => "interfloor",
            Role::Roof => "roof",
            Role::Foundation => "foundation",
        }
    }
}

/// Role of one module position along a segment.
#[derive(Clone, Debug, PartialEq)]
pub struct FacadeSlot {
    pub keyword: String,
    pub role: Role,
    pub engawa: bool,
}

impl FacadeSlot {
    pub fn new(length: f32, role: Role) -> Self {
        Self {
            keyword: module_keyword(length),
            role,
            engawa: false,
        }
    }
}

/// Roles remembered per segment index while one building is generated.
/// `ground` holds floor 0, `upper` the floor 1 pattern that higher floors repeat.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FacadeState {
    pub ground: BTreeMap<usize, Vec<FacadeSlot>>,
    pub upper: BTreeMap<usize, Vec<FacadeSlot>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloorContext {
    pub index: usize,
    /// elevation at which this floor's walls stand
    pub wall_elevation: f32,
}

/// Per-style floor policy. Implementations own the role rules and any
/// floor-to-floor memory; geometry stays with the planner.
pub trait LayoutStrategy: Sync {
    fn name(&self) -> &'static str;

    /// Horizontal footprint scale of a floor.
    fn floor_scale(&self, _floor: usize) -> f32 {
        1.0
    }

    /// Whether interfloor bands are laid along the walls.
    fn has_interfloor(&self, _floors: usize) -> bool {
        false
    }

    fn assign_roles(
        &self,
        floor: &FloorContext,
        segment: usize,
        combination: &[f32],
        state: FacadeState,
        rng: &mut StdRng,
    ) -> (Vec<FacadeSlot>, FacadeState);
}

pub fn module_keyword(length: f32) -> String {
    format!("wall{}", length_code(length))
}

pub fn engawa_keyword(length: f32) -> String {
    format!("engawa{}", length_code(length))
}

pub fn interfloor_keyword(length: f32) -> String {
    format!("interfloor{}", length_code(length))
}

fn length_code(length: f32) -> i32 {
    (length * MODULE_KEYWORD_FACTOR).round() as i32
}

/// Street-level role from one uniform draw.
pub fn ground_floor_role(r: f32) -> Role {
    if r > DOOR_THRESHOLD {
        Role::Door
    } else if r > WINDOW_THRESHOLD {
        Role::Window
    } else {
        Role::Plain
    }
}

/// One independent draw per module.
pub fn assign_ground_floor(combination: &[f32], rng: &mut StdRng) -> Vec<FacadeSlot> {
    combination
        .iter()
        .map(|&length| FacadeSlot::new(length, ground_floor_role(rng.random())))
        .collect()
}

/// Second floor from the ground floor: doors turn into windows, everything else
/// may become a balcony. Modules without a ground slot stay plain and draw nothing.
pub fn derive_upper_pattern(combination: &[f32], ground: &[FacadeSlot], rng: &mut StdRng) -> Vec<FacadeSlot> {
    combination
        .iter()
        .enumerate()
        .map(|(idx, &length)| {
            let Some(below) = ground.get(idx) else {
                return FacadeSlot::new(length, Role::Plain);
            };

            let role = if below.role == Role::Door {
                Role::Window
            } else if rng.random::<f32>() < BALCONY_CHANCE {
                Role::Balcony
            } else {
                below.role
            };

            FacadeSlot {
                keyword: below.keyword.clone(),
                role,
                engawa: false,
            }
        })
        .collect()
}

/// Running veranda deck along a segment. Once attached it keeps going with
/// [`ENGAWA_CONTINUE_CHANCE`], once absent it starts with [`ENGAWA_START_CHANCE`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EngawaRun {
    pub attached: bool,
}

impl EngawaRun {
    /// Doors always get a deck in front of them.
    pub fn attach(&mut self) -> bool {
        self.attached = true;
        true
    }

    pub fn step(&mut self, e: f32) -> bool {
        self.attached = if self.attached {
            e < ENGAWA_CONTINUE_CHANCE
        } else {
            e < ENGAWA_START_CHANCE
        };
        self.attached
    }
}

/// Candidate asset keywords for a slot, most specific first.
pub fn fallback_chain(role: Role, keyword: &str, style: Style) -> Vec<String> {
    let styled = format!("{keyword}_{}", style.keyword());
    let mut chain = match role {
        Role::Door => vec![format!("{keyword}_door"), styled],
        Role::Window => vec![format!("{keyword}_window"), styled],
        Role::Balcony => vec![format!("{keyword}_balcony"), format!("{keyword}_window"), styled],
        _ => vec![styled],
    };
    chain.push(keyword.to_string());
    chain
}

/// Panel-block houses: street level is drawn once, the second floor is derived
/// from it, and every floor above repeats the second.
pub struct SovietBlock;

impl LayoutStrategy for SovietBlock {
    fn name(&self) -> &'static str {
        "soviet-block"
    }

    fn assign_roles(
        &self,
        floor: &FloorContext,
        segment: usize,
        combination: &[f32],
        mut state: FacadeState,
        rng: &mut StdRng,
    ) -> (Vec<FacadeSlot>, FacadeState) {
        match floor.index {
            0 => {
                let slots = assign_ground_floor(combination, rng);
                state.ground.insert(segment, slots.clone());
                (slots, state)
            }
            1 => {
                let slots = {
                    let ground = state.ground.get(&segment).map(Vec::as_slice).unwrap_or(&[]);
                    derive_upper_pattern(combination, ground, rng)
                };
                state.upper.insert(segment, slots.clone());
                (slots, state)
            }
            _ => {
                let slots = state.upper.get(&segment).cloned().unwrap_or_else(|| {
                    combination.iter().map(|&length| FacadeSlot::new(length, Role::Plain)).collect()
                });
                (slots, state)
            }
        }
    }
}

/// Japanese houses: no memory between floors, each floor shrinks a little,
/// and the street level grows engawa decks in contiguous runs.
pub struct Veranda;

impl LayoutStrategy for Veranda {
    fn name(&self) -> &'static str {
        "veranda"
    }

    fn floor_scale(&self, floor: usize) -> f32 {
        TAPER_FACTOR.powi(floor as i32)
    }

    fn has_interfloor(&self, floors: usize) -> bool {
        floors >= 2
    }

    fn assign_roles(
        &self,
        floor: &FloorContext,
        _segment: usize,
        combination: &[f32],
        state: FacadeState,
        rng: &mut StdRng,
    ) -> (Vec<FacadeSlot>, FacadeState) {
        let street_level = floor.wall_elevation <= LOWEST_TIER_ELEVATION;
        let mut run = EngawaRun::default();
        let mut slots = Vec::with_capacity(combination.len());

        for &length in combination {
            let mut slot = FacadeSlot::new(length, Role::Plain);

            if street_level {
                let r: f32 = rng.random();
                if r > DOOR_THRESHOLD {
                    slot.role = Role::Door;
                    slot.engawa = run.attach();
                } else {
                    slot.role = if r > WINDOW_THRESHOLD { Role::Window } else { Role::Plain };
                    slot.engawa = run.step(rng.random());
                }
            } else if rng.random::<f32>() > UPPER_WINDOW_THRESHOLD {
                slot.role = Role::Window;
            }

            slots.push(slot);
        }

        (slots, state)
    }
}
