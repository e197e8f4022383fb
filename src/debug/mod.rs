use crate::config::GameConfig;
use crate::gameplay::course::CourseTelemetry;
use crate::states::GameState;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use bevy_rapier2d::render::DebugRenderContext;

pub struct DebugOverlayPlugin;

impl Plugin for DebugOverlayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DebugPanelState>()
            .add_systems(Update, (toggle_debug_panel, toggle_physics_debug_render))
            .add_systems(
                EguiPrimaryContextPass,
                debug_panel_ui
                    .run_if(in_state(GameState::InRun).or(in_state(GameState::Pause)))
                    .run_if(resource_exists::<GameConfig>),
            );
    }
}

/// Runtime-only knobs; applying them writes into the live config, never to disk.
#[derive(Debug, Clone, PartialEq)]
struct CourseTuningParams {
    lift_impulse: f32,
    max_wheel_speed: f32,
}

impl CourseTuningParams {
    fn from_config(config: &GameConfig) -> Self {
        Self {
            lift_impulse: config.cart.feedback.lift_impulse,
            max_wheel_speed: config.game.slider.max_wheel_speed,
        }
    }

    fn apply_to(&self, config: &mut GameConfig) -> Result<(), String> {
        if !self.lift_impulse.is_finite() || self.lift_impulse < 0.0 {
            return Err(format!(
                "lift_impulse must be a non-negative number, got {}",
                self.lift_impulse
            ));
        }
        if !self.max_wheel_speed.is_finite() || self.max_wheel_speed < 0.0 {
            return Err(format!(
                "max_wheel_speed must be a non-negative number, got {}",
                self.max_wheel_speed
            ));
        }

        config.cart.feedback.lift_impulse = self.lift_impulse;
        config.game.slider.max_wheel_speed = self.max_wheel_speed;
        Ok(())
    }
}

#[derive(Resource, Debug, Default)]
struct DebugPanelState {
    visible: bool,
    params: Option<CourseTuningParams>,
    status: String,
}

fn toggle_debug_panel(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut panel_state: ResMut<DebugPanelState>,
    config: Option<Res<GameConfig>>,
) {
    if !keyboard.just_pressed(KeyCode::F1) {
        return;
    }
    let Some(config) = config else {
        return;
    };
    if !config.game.app.debug_overlay {
        return;
    }

    panel_state.visible = !panel_state.visible;
    if panel_state.visible {
        panel_state.params = Some(CourseTuningParams::from_config(&config));
        panel_state.status.clear();
        info!("Debug panel shown.");
    } else {
        info!("Debug panel hidden.");
    }
}

fn toggle_physics_debug_render(
    keyboard: Res<ButtonInput<KeyCode>>,
    debug_render: Option<ResMut<DebugRenderContext>>,
) {
    if !keyboard.just_pressed(KeyCode::F2) {
        return;
    }
    let Some(mut debug_render) = debug_render else {
        return;
    };

    debug_render.enabled = !debug_render.enabled;
    info!(
        "Physics debug render {}.",
        if debug_render.enabled { "on" } else { "off" }
    );
}

fn debug_panel_ui(
    mut egui_contexts: EguiContexts,
    diagnostics: Res<DiagnosticsStore>,
    telemetry: Res<CourseTelemetry>,
    mut panel_state: ResMut<DebugPanelState>,
    mut config: ResMut<GameConfig>,
) {
    if !panel_state.visible {
        return;
    }

    let mut params = panel_state
        .params
        .clone()
        .unwrap_or_else(|| CourseTuningParams::from_config(&config));
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|value| value.smoothed())
        .unwrap_or(0.0);

    let mut window_open = panel_state.visible;
    let mut apply_clicked = false;
    let mut reload_clicked = false;
    let status = panel_state.status.clone();

    let Ok(ctx) = egui_contexts.ctx_mut() else {
        return;
    };
    egui::Window::new("Hill Cart Debug")
        .open(&mut window_open)
        .resizable(true)
        .default_width(360.0)
        .show(ctx, |ui| {
            ui.label(format!("FPS: {fps:>5.1}"));
            ui.separator();

            ui.label(format!(
                "Chassis: ({:.0}, {:.0}) at {:.1} deg",
                telemetry.chassis_position.x,
                telemetry.chassis_position.y,
                telemetry.chassis_rotation_deg
            ));
            ui.label(format!(
                "Motor speed: {:.2} rad/s | Slider: {:.2}",
                telemetry.motor_speed, telemetry.slider_value
            ));
            ui.label(format!(
                "Terrain watermark: {:.0} | Next slot: {}",
                telemetry.watermark, telemetry.next_slot
            ));
            match telemetry.hazard_position {
                Some(position) => {
                    ui.label(format!("Hazard: ({:.0}, {:.0})", position.x, position.y));
                }
                None => {
                    ui.label("Hazard: n/a");
                }
            }
            ui.label(format!(
                "Tip-overs: {} | Hazard drops: {} | Pending reverts: {}",
                telemetry.tip_overs, telemetry.hazard_respawns, telemetry.pending_reverts
            ));
            ui.separator();

            ui.collapsing("Tuning", |ui| {
                tuning_slider_row(ui, "lift_impulse", &mut params.lift_impulse, 0.0..=2000.0, 1.0);
                tuning_slider_row(
                    ui,
                    "max_wheel_speed",
                    &mut params.max_wheel_speed,
                    0.0..=60.0,
                    0.1,
                );
                ui.horizontal(|ui| {
                    apply_clicked |= ui.button("Apply").clicked();
                    reload_clicked |= ui.button("Reset from config").clicked();
                });
            });

            if !status.is_empty() {
                ui.separator();
                ui.label(status);
            }
            ui.label("Hotkeys: F1 panel | F2 physics debug | F5 reload config | Esc pause | R restart");
        });

    if reload_clicked {
        params = CourseTuningParams::from_config(&config);
        panel_state.status = "Tuning reset from config.".to_string();
    }
    if apply_clicked {
        match params.apply_to(&mut config) {
            Ok(()) => {
                panel_state.status = "Applied tuning to runtime config.".to_string();
                info!(
                    "Runtime tuning applied: lift_impulse={:.1} max_wheel_speed={:.2}.",
                    params.lift_impulse, params.max_wheel_speed
                );
            }
            Err(error) => {
                warn!("Debug tuning rejected: {error}");
                panel_state.status = error;
            }
        }
    }

    panel_state.params = Some(params);
    panel_state.visible = window_open;
}

fn tuning_slider_row(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut f32,
    slider_range: std::ops::RangeInclusive<f32>,
    drag_speed: f32,
) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(egui::Slider::new(value, slider_range).show_value(false));
        ui.add(egui::DragValue::new(value).speed(drag_speed as f64));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::shipped_config;

    #[test]
    fn applying_tuning_updates_runtime_config_only_for_tuned_fields() {
        let mut config = shipped_config();
        let torque = config.cart.motor.max_torque;
        let params = CourseTuningParams {
            lift_impulse: 650.0,
            max_wheel_speed: 32.0,
        };

        params.apply_to(&mut config).unwrap();

        assert_eq!(config.cart.feedback.lift_impulse, 650.0);
        assert_eq!(config.game.slider.max_wheel_speed, 32.0);
        assert_eq!(config.cart.motor.max_torque, torque);
    }

    #[test]
    fn negative_tuning_is_rejected_and_leaves_config_alone() {
        let mut config = shipped_config();
        let before = CourseTuningParams::from_config(&config);
        let params = CourseTuningParams {
            lift_impulse: -1.0,
            max_wheel_speed: 10.0,
        };

        let error = params.apply_to(&mut config).unwrap_err();

        assert!(error.contains("lift_impulse"));
        assert_eq!(CourseTuningParams::from_config(&config), before);
    }
}
