use crate::config::GameConfig;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

#[derive(States, Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum GameState {
    #[default]
    Boot,
    InRun,
    Pause,
}

pub struct GameStatePlugin;

impl Plugin for GameStatePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_camera)
            .add_systems(OnEnter(GameState::Boot), enter_boot)
            .add_systems(
                Update,
                boot_to_in_run
                    .run_if(in_state(GameState::Boot))
                    .run_if(resource_exists::<GameConfig>),
            )
            .add_systems(OnEnter(GameState::InRun), (enter_in_run, resume_physics))
            .add_systems(Update, in_run_controls.run_if(in_state(GameState::InRun)))
            .add_systems(OnEnter(GameState::Pause), (enter_pause, suspend_physics))
            .add_systems(Update, pause_controls.run_if(in_state(GameState::Pause)));
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn((Name::new("CourseCamera"), Camera2d));
}

fn enter_boot() {
    info!("Entered state: Boot");
}

fn boot_to_in_run(mut next_state: ResMut<NextState<GameState>>) {
    next_state.set(GameState::InRun);
}

fn enter_in_run() {
    info!("Entered state: InRun");
}

fn enter_pause() {
    info!("Entered state: Pause");
}

type RapierConfigQuery<'w, 's> =
    Query<'w, 's, &'static mut RapierConfiguration, With<DefaultRapierContext>>;

fn resume_physics(mut rapier_config_query: RapierConfigQuery) {
    set_physics_active(&mut rapier_config_query, true);
}

fn suspend_physics(mut rapier_config_query: RapierConfigQuery) {
    set_physics_active(&mut rapier_config_query, false);
}

fn set_physics_active(rapier_config_query: &mut RapierConfigQuery, active: bool) {
    if let Ok(mut rapier_config) = rapier_config_query.single_mut() {
        if rapier_config.physics_pipeline_active != active {
            rapier_config.physics_pipeline_active = active;
            info!(
                "Physics pipeline {}.",
                if active { "resumed" } else { "suspended" }
            );
        }
    }
}

fn in_run_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if keyboard.just_pressed(KeyCode::Escape) {
        next_state.set(GameState::Pause);
    }

    if keyboard.just_pressed(KeyCode::KeyR) {
        info!("Restarting course.");
        next_state.set(GameState::Boot);
    }
}

fn pause_controls(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<GameState>>,
) {
    if keyboard.just_pressed(KeyCode::Escape) {
        next_state.set(GameState::InRun);
    }

    if keyboard.just_pressed(KeyCode::KeyR) {
        info!("Restarting course.");
        next_state.set(GameState::Boot);
    }
}
