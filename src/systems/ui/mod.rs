use bevy::prelude::*;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin}; // fps
use bevy_egui::{egui, EguiContexts, EguiPlugin, EguiPrimaryContextPass};

use crate::config::SEED_MAX;
use crate::systems::building::{BuildEvent, BuildParams, ClearEvent, LastPlan};
use crate::systems::building::facade::Role;
use crate::systems::building::style::{DetailTier, Style};

#[derive(Resource)]
pub struct GizmosVisible(pub bool);

pub struct UIPlugin;

impl Plugin for UIPlugin {
    fn build(&self, app: &mut App) {
        assert!(app.is_plugin_added::<EguiPlugin>());
        app
            .insert_resource(GizmosVisible(false))
            .add_systems(Update, key_input)
            .add_systems(EguiPrimaryContextPass, (ui_main, fps)); // UI rendering here
    }
}

fn key_input(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    mut gizmos_visible: ResMut<GizmosVisible>,
    mut params: ResMut<BuildParams>,
    mut build_events: EventWriter<BuildEvent>,
) {
    if keyboard_input.just_pressed(KeyCode::Tab) {
        gizmos_visible.0 = !gizmos_visible.0;
    }

    // quick reroll without the panel
    if keyboard_input.just_pressed(KeyCode::KeyR) {
        params.seed = rand::random_range(1..=SEED_MAX);
        build_events.write(BuildEvent { request: params.request() });
    }
}

fn ui_main(
    mut contexts: EguiContexts,
    mut params: ResMut<BuildParams>,
    last: Res<LastPlan>,
    mut gizmos_visible: ResMut<GizmosVisible>,
    mut build_events: EventWriter<BuildEvent>,
    mut clear_events: EventWriter<ClearEvent>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        egui::SidePanel::left("config_panel")
            .default_width(200.0)
            .min_width(250.0)
            .max_width(400.0)
            .resizable(true)
            .show(ctx, |ui| {
                let mut rebuild = false;

                // camera
                ui.label("Camera: ");
                ui.label("WASD - Move");
                ui.label("Scroll - Zoom");
                ui.label("MMB - Rotate");

                ui.separator();

                egui::CollapsingHeader::new("Building")
                    .default_open(true)
                    .show(ui, |ui| {
                    egui::ComboBox::from_label("Style")
                        .selected_text(params.style.label())
                        .show_ui(ui, |ui| {
                            for style in Style::ALL {
                                rebuild |= ui.selectable_value(&mut params.style, style, style.label()).changed();
                            }
                        });

                    egui::ComboBox::from_label("Details")
                        .selected_text(params.details.label())
                        .show_ui(ui, |ui| {
                            for details in DetailTier::ALL {
                                rebuild |= ui.selectable_value(&mut params.details, details, details.label()).changed();
                            }
                        });

                    // the floor range follows the selected style
                    let max_floors = params.style.max_floors();
                    params.floors = params.floors.clamp(1, max_floors);
                    rebuild |= ui.add(egui::Slider::new(&mut params.floors, 1..=max_floors)
                        .text("Floors"))
                        .on_hover_text("Number of storeys, the roof sits on top of the last one.")
                        .changed();
                });

                egui::CollapsingHeader::new("Seed")
                    .default_open(true)
                    .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label("Seed:");
                        rebuild |= ui.add(egui::DragValue::new(&mut params.seed).range(1..=SEED_MAX))
                            .on_hover_text("Same seed and settings always give the same house.")
                            .changed();
                    });

                    if ui.button("Random seed").clicked() {
                        params.seed = rand::random_range(1..=SEED_MAX);
                        rebuild = true;
                    }
                });

                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("Build").clicked() {
                        rebuild = true;
                    }
                    let clear_button = egui::Button::new("Clear").fill(egui::Color32::from_rgb(130, 22, 22));
                    if ui.add(clear_button).clicked() {
                        clear_events.write(ClearEvent);
                    }
                });
                ui.checkbox(&mut gizmos_visible.0, "Segment gizmos (TAB)");

                ui.separator();

                // status of the last build
                if let Some(error) = &last.error {
                    ui.label(egui::RichText::new(error).color(egui::Color32::from_rgb(178, 34, 34)));
                } else if let Some(plan) = &last.plan {
                    ui.label(format!("Foundation: {}", plan.foundation.name));
                    ui.label(format!("Pieces: {}", plan.commands.len()));
                    for role in [Role::Door, Role::Window, Role::Balcony, Role::Engawa] {
                        let count = plan.count(role);
                        if count > 0 {
                            ui.label(format!("  {}: {}", role.label(), count));
                        }
                    }
                    if !plan.skipped.is_empty() {
                        ui.label(egui::RichText::new(format!("Skipped: {}", plan.skipped.len()))
                            .color(egui::Color32::from_rgb(200, 140, 40)));
                    }
                } else {
                    ui.label("Nothing built");
                }

                ui.separator();
                ui.label("R - Random seed");
                ui.label("ESC - Exit");

                if rebuild {
                    build_events.write(BuildEvent { request: params.request() });
                }
            });
    }
}

fn fps(
    mut contexts: EguiContexts,
    diagnostics: Res<DiagnosticsStore>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        egui::Area::new(egui::Id::new("fps_counter"))
            .anchor(egui::Align2::RIGHT_TOP, egui::Vec2::new(-10.0, 10.0))
            .show(ctx, |ui| {
                ui.with_layout(egui::Layout::top_down(egui::Align::RIGHT), |ui| {
                    if let Some(fps) = diagnostics
                        .get(&FrameTimeDiagnosticsPlugin::FPS)
                        .and_then(|d| d.smoothed())
                    {
                        ui.label(egui::RichText::new(format!("{:.0}", fps))
                            .size(26.0)
                            .color(egui::Color32::WHITE));
                    }
                });
            });
    }
}
