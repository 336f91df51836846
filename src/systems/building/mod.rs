// this is the entry point for the facade generation plugin
use bevy::prelude::*;

use crate::config::*;

pub mod assets;
pub mod combination;
pub mod facade;
pub mod footprint;
pub mod house;
pub mod planner;
pub mod style;

pub use crate::systems::mesh::Polygon;

use assets::BuiltinLibrary;
use facade::Role;
use planner::{BuildRequest, BuildingPlan};
use style::{DetailTier, Style};

// user-editable build parameters, mirrored by the control panel
#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct BuildParams {
    pub style: Style,
    pub details: DetailTier,
    pub floors: usize,
    pub seed: u64,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            style: Style::default(),
            details: DetailTier::default(),
            floors: INITIAL_FLOORS,
            seed: INITIAL_SEED,
        }
    }
}

impl BuildParams {
    pub fn request(&self) -> BuildRequest {
        BuildRequest {
            style: self.style,
            details: self.details,
            floors: self.floors,
            seed: self.seed,
        }
    }
}

// outcome of the most recent build, read by the panel and the gizmos
#[derive(Resource, Default)]
pub struct LastPlan {
    pub plan: Option<BuildingPlan>,
    pub error: Option<String>,
}

// Event for building a house from a request
#[derive(Event)]
pub struct BuildEvent {
    pub request: BuildRequest,
}

// Event for clearing the scene
#[derive(Event)]
pub struct ClearEvent;

// main plugin for generation
pub struct BuildingGenerationPlugin;

impl Plugin for BuildingGenerationPlugin {
    fn build(&self, app: &mut App) {
        app
            .insert_resource(BuildParams::default())
            .insert_resource(BuiltinLibrary::new())
            .init_resource::<LastPlan>()

            .add_event::<BuildEvent>()
            .add_event::<ClearEvent>()

            // build the initial house on start
            .add_systems(Startup, |params: Res<BuildParams>, mut events: EventWriter<BuildEvent>| {
                events.write(BuildEvent { request: params.request() });
            })
            .add_systems(Update, ((house::handle_clear, house::handle_build).chain(), debug_gizmos));
    }
}

pub fn role_color(role: Role) -> Color {
    match role {
        Role::Plain => Color::srgb(0.78, 0.76, 0.72),
        Role::Door => Color::srgb(0.45, 0.28, 0.18),
        Role::Window => Color::srgb(0.55, 0.68, 0.80),
        Role::Balcony => Color::srgb(0.70, 0.52, 0.40),
        Role::Engawa => Color::srgb(0.62, 0.47, 0.30),
        Role::Interfloor => Color::srgb(0.35, 0.35, 0.38),
        Role::Roof => Color::srgb(0.38, 0.20, 0.18),
        Role::Foundation => Color::srgb(0.50, 0.50, 0.50),
    }
}

fn debug_gizmos(
    mut gizmos: Gizmos,
    last: Res<LastPlan>,
    gizmos_visible: Res<crate::systems::ui::GizmosVisible>,
) {
    if !gizmos_visible.0 {
        return;
    }
    let Some(plan) = &last.plan else {
        return;
    };

    // extracted segments, red when nothing fitted
    for report in &plan.segments {
        let y = report.floor as f32 * plan.floor_height + WALL_BASE_OFFSET + 0.02;
        let start = Vec3::new(report.segment.start.x, y, report.segment.start.y);
        let end = Vec3::new(report.segment.end.x, y, report.segment.end.y);

        let color = if report.fit.is_some() {
            Color::srgba(0.24, 0.55, 0.31, 0.9) // green
        } else {
            Color::srgba(0.71, 0.24, 0.24, 0.9) // red
        };
        gizmos.line(start, end, color);
        gizmos.sphere(start, 0.12, color);
    }

    // module origins along the cursor
    for command in plan.commands.iter().filter(|c| c.module.is_some()) {
        gizmos.sphere(command.position, 0.06, role_color(command.role));
    }
}
