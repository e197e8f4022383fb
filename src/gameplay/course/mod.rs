use crate::config::GameConfig;
use crate::gameplay::cart::{spawn_cart, CartCommand, CartPart, CartRig, ChassisPaint, WheelMotor};
use crate::gameplay::hazard::{hazard_respawn_position, spawn_hazard, Hazard};
use crate::gameplay::terrain::{spawn_terrain_ring, TerrainRing, TerrainSegment};
use crate::gameplay::GameplaySet;
use crate::states::GameState;
use crate::ui::{LiftRequested, SpeedSlider, SpeedSliderChanged};
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

const TIP_OVER_LIMIT_DEG: f32 = 135.0;

pub struct CourseGameplayPlugin;

impl Plugin for CourseGameplayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CourseTelemetry>()
            .add_systems(OnEnter(GameState::InRun), spawn_course)
            .add_systems(OnEnter(GameState::Boot), cleanup_course)
            .add_systems(
                Update,
                (
                    apply_slider_speed,
                    apply_lift_requests,
                    camera_follow_cart,
                    recycle_terrain,
                    recover_from_tip_over,
                    recycle_hazard,
                    update_course_telemetry,
                )
                    .chain()
                    .in_set(GameplaySet::Control)
                    .run_if(in_state(GameState::InRun))
                    .run_if(resource_exists::<GameConfig>)
                    .run_if(resource_exists::<CourseState>),
            );
    }
}

/// Terrain, hazard, and other scenery owned by the running course.
#[derive(Component)]
pub struct CourseEntity;

/// Bookkeeping the per-frame course rules carry between ticks.
#[derive(Resource, Debug, Clone)]
pub struct CourseState {
    pub ring: TerrainRing,
    pub tip_overs: u32,
    pub hazard_respawns: u32,
}

impl CourseState {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            ring: TerrainRing::new(
                config.terrain.terrain.peak_heights.len(),
                config.game.world.screen_width,
            ),
            tip_overs: 0,
            hazard_respawns: 0,
        }
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct CourseTelemetry {
    pub chassis_position: Vec2,
    pub chassis_rotation_deg: f32,
    pub motor_speed: f32,
    pub slider_value: f32,
    pub watermark: f32,
    pub next_slot: usize,
    pub hazard_position: Option<Vec2>,
    pub tip_overs: u32,
    pub hazard_respawns: u32,
    pub pending_reverts: usize,
}

pub fn camera_translation(chassis_position: Vec2, camera_offset: Vec2) -> Vec2 {
    chassis_position + camera_offset
}

/// Signed rotation about the view axis, in `(-180, 180]` degrees.
pub fn chassis_rotation_deg(rotation: Quat) -> f32 {
    let (_, _, z) = rotation.to_euler(EulerRot::XYZ);
    z.to_degrees()
}

pub fn is_tipped_over(rotation_deg: f32) -> bool {
    rotation_deg.abs() > TIP_OVER_LIMIT_DEG
}

/// Slider fraction to wheel angular velocity; negative spin rolls the cart toward +x.
pub fn motor_speed_for_slider(value: f32, max_wheel_speed: f32) -> f32 {
    -value * max_wheel_speed
}

fn spawn_course(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    config: Option<Res<GameConfig>>,
    existing_cart: Query<Entity, With<CartRig>>,
) {
    if !existing_cart.is_empty() {
        return;
    }
    let Some(config) = config else {
        warn!("Course spawn skipped: config is not loaded.");
        return;
    };

    let world = &config.game.world;
    let start = Vec2::from(world.cart_start);
    let state = CourseState::from_config(&config);

    spawn_cart(&mut commands, &mut meshes, &mut materials, &config, start);

    let hazard = spawn_hazard(
        &mut commands,
        &mut meshes,
        &mut materials,
        &config.game.hazard,
        Vec2::new(
            start.x - 2.0 * world.screen_width,
            config.game.hazard.drop_height,
        ),
    );
    commands.entity(hazard).insert(CourseEntity);

    spawn_terrain_ring(&mut commands, &mut meshes, &mut materials, &config, &state.ring);

    info!(
        "Course ready: {} terrain slots of width {:.0}.",
        state.ring.slot_count(),
        world.screen_width
    );
    commands.insert_resource(state);
}

fn cleanup_course(
    mut commands: Commands,
    mut telemetry: ResMut<CourseTelemetry>,
    course_query: Query<Entity, Or<(With<CourseEntity>, With<TerrainSegment>, With<CartPart>)>>,
) {
    let mut despawned = 0usize;
    for entity in &course_query {
        commands.entity(entity).try_despawn();
        despawned += 1;
    }
    commands.remove_resource::<CourseState>();
    *telemetry = CourseTelemetry::default();

    if despawned > 0 {
        info!("Course cleared ({despawned} entities).");
    }
}

fn apply_slider_speed(
    mut slider_events: MessageReader<SpeedSliderChanged>,
    config: Res<GameConfig>,
    mut cart_commands: MessageWriter<CartCommand>,
) {
    for event in slider_events.read() {
        cart_commands.write(CartCommand::SetSpeed(motor_speed_for_slider(
            event.value,
            config.game.slider.max_wheel_speed,
        )));
    }
}

fn apply_lift_requests(
    mut lift_requests: MessageReader<LiftRequested>,
    mut cart_commands: MessageWriter<CartCommand>,
) {
    for _ in lift_requests.read() {
        cart_commands.write(CartCommand::Lift);
    }
}

fn camera_follow_cart(
    config: Res<GameConfig>,
    chassis_query: Query<&Transform, With<CartRig>>,
    mut camera_query: Query<&mut Transform, (With<Camera2d>, Without<CartRig>)>,
) {
    let Ok(chassis_transform) = chassis_query.single() else {
        return;
    };
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    let target = camera_translation(
        chassis_transform.translation.truncate(),
        Vec2::from(config.game.world.camera_offset),
    );
    camera_transform.translation.x = target.x;
    camera_transform.translation.y = target.y;
}

fn recycle_terrain(
    mut state: ResMut<CourseState>,
    chassis_query: Query<&Transform, With<CartRig>>,
    mut segment_query: Query<(&TerrainSegment, &mut Transform), Without<CartRig>>,
) {
    let Ok(chassis_transform) = chassis_query.single() else {
        return;
    };
    let Some(placement) = state.ring.advance(chassis_transform.translation.x) else {
        return;
    };

    for (segment, mut transform) in &mut segment_query {
        if segment.slot == placement.slot {
            transform.translation.x = placement.x;
        }
    }
    debug!(
        "Terrain slot {} moved to x = {:.0}; watermark {:.0}.",
        placement.slot,
        placement.x,
        state.ring.watermark()
    );
}

fn recover_from_tip_over(
    mut state: ResMut<CourseState>,
    slider: Option<ResMut<SpeedSlider>>,
    chassis_query: Query<&Transform, With<CartRig>>,
    mut cart_commands: MessageWriter<CartCommand>,
) {
    let Ok(chassis_transform) = chassis_query.single() else {
        return;
    };
    let rotation_deg = chassis_rotation_deg(chassis_transform.rotation);
    if !is_tipped_over(rotation_deg) {
        return;
    }

    cart_commands.write(CartCommand::Reset);
    if let Some(mut slider) = slider {
        slider.set(0.0);
    }
    state.tip_overs += 1;
    info!(
        "Cart tipped over at {rotation_deg:.0} deg (x = {:.0}); resetting.",
        chassis_transform.translation.x
    );
}

fn recycle_hazard(
    config: Res<GameConfig>,
    mut state: ResMut<CourseState>,
    chassis_query: Query<&Transform, With<CartRig>>,
    mut hazard_query: Query<(&mut Transform, &mut Velocity), (With<Hazard>, Without<CartRig>)>,
) {
    let Ok(chassis_transform) = chassis_query.single() else {
        return;
    };
    let chassis_x = chassis_transform.translation.x;

    for (mut transform, mut velocity) in &mut hazard_query {
        let Some(position) = hazard_respawn_position(
            transform.translation.x,
            chassis_x,
            config.game.world.screen_width,
            config.game.hazard.drop_height,
        ) else {
            continue;
        };

        transform.translation.x = position.x;
        transform.translation.y = position.y;
        *velocity = Velocity::zero();
        state.hazard_respawns += 1;
        info!("Hazard dropped ahead at x = {:.0}.", position.x);
    }
}

fn update_course_telemetry(
    state: Res<CourseState>,
    slider: Option<Res<SpeedSlider>>,
    mut telemetry: ResMut<CourseTelemetry>,
    chassis_query: Query<(&Transform, &CartRig, &ChassisPaint)>,
    motor_query: Query<&WheelMotor>,
    hazard_query: Query<&Transform, With<Hazard>>,
) {
    if let Ok((transform, rig, paint)) = chassis_query.single() {
        telemetry.chassis_position = transform.translation.truncate();
        telemetry.chassis_rotation_deg = chassis_rotation_deg(transform.rotation);
        telemetry.pending_reverts = paint.pending_reverts();
        telemetry.motor_speed = motor_query
            .iter_many(&rig.motors)
            .next()
            .map(|motor| motor.target_speed)
            .unwrap_or(0.0);
    }

    telemetry.slider_value = slider.map(|slider| slider.value()).unwrap_or(0.0);
    telemetry.watermark = state.ring.watermark();
    telemetry.next_slot = state.ring.next_slot();
    telemetry.hazard_position = hazard_query
        .iter()
        .next()
        .map(|transform| transform.translation.truncate());
    telemetry.tip_overs = state.tip_overs;
    telemetry.hazard_respawns = state.hazard_respawns;
}
