mod config;
mod debug;
mod gameplay;
mod states;
mod ui;

use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_rapier2d::prelude::*;
use config::ConfigPlugin;
use debug::DebugOverlayPlugin;
use gameplay::GameplayPlugin;
use states::{GameState, GameStatePlugin};
use ui::SpeedSliderPlugin;

const PIXELS_PER_METER: f32 = 30.0;

fn main() {
    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Hill Cart".to_string(),
            resolution: (800, 600).into(),
            resizable: false,
            ..default()
        }),
        ..default()
    }))
    .insert_resource(ClearColor(Color::srgb(0.05, 0.07, 0.1)))
    .add_plugins(EguiPlugin::default())
    .add_plugins(RapierPhysicsPlugin::<NoUserData>::pixels_per_meter(
        PIXELS_PER_METER,
    ))
    .add_plugins(RapierDebugRenderPlugin {
        enabled: false,
        ..default()
    })
    .add_plugins(FrameTimeDiagnosticsPlugin::default())
    .add_plugins(ConfigPlugin)
    .add_plugins(DebugOverlayPlugin)
    .add_plugins(GameplayPlugin)
    .add_plugins(SpeedSliderPlugin)
    .init_state::<GameState>()
    .add_plugins(GameStatePlugin);

    app.run();
}
