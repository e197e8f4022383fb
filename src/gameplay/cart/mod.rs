mod paint;
mod rig;
mod wheel;

pub use paint::ChassisPaint;
pub use rig::{
    reset_height, reset_position, CartBlueprint, JointKind, MemberShape, PivotMotor, RigFootprint,
    RigMember,
};
pub use wheel::{spawn_wheel_face, MAX_FACE_SIDES};

use crate::config::{color_from_rgb, GameConfig};
use crate::gameplay::hazard::Hazard;
use crate::gameplay::terrain::{ground_height_under, TerrainSurface};
use crate::gameplay::GameplaySet;
use crate::states::GameState;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

const CART_BODY_Z: f32 = 10.0;
const WHEEL_Z_OFFSET: f32 = 0.3;
const RESET_GROUND_CLEARANCE: f32 = 4.0;

pub struct CartGameplayPlugin;

impl Plugin for CartGameplayPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<CartCommand>().add_systems(
            Update,
            (
                apply_cart_commands,
                sync_wheel_motors,
                detect_hazard_hits,
                update_chassis_paint,
            )
                .chain()
                .in_set(GameplaySet::Rig)
                .run_if(in_state(GameState::InRun))
                .run_if(resource_exists::<GameConfig>),
        );
    }
}

/// Operations other systems may request of the cart; applied in order within one frame.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum CartCommand {
    /// Target angular velocity shared by both wheel motors.
    SetSpeed(f32),
    /// Fixed upward impulse on both wheels.
    Lift,
    /// Upright the cart where it stands and stop the motors.
    Reset,
}

/// Aggregate handle stored on the chassis body.
#[derive(Component, Debug, Clone)]
pub struct CartRig {
    pub origin: Vec2,
    pub footprint: RigFootprint,
    pub parts: Vec<(RigMember, Entity)>,
    pub motors: Vec<Entity>,
}

impl CartRig {
    pub fn part(&self, member: RigMember) -> Option<Entity> {
        self.parts
            .iter()
            .find(|(candidate, _)| *candidate == member)
            .map(|(_, entity)| *entity)
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct CartPart {
    pub rig: Entity,
    pub member: RigMember,
    pub rest_offset: Vec2,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct CartWheel;

#[derive(Component, Debug, Clone, Copy)]
pub struct ChassisVisual;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct RigJoint {
    pub kind: JointKind,
}

/// Commanded state of one motorized axle. `max_torque` is fixed at construction.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct WheelMotor {
    pub target_speed: f32,
    pub max_torque: f32,
    pub factor: f32,
}

impl From<PivotMotor> for WheelMotor {
    fn from(motor: PivotMotor) -> Self {
        Self {
            target_speed: motor.target_speed,
            max_torque: motor.max_torque,
            factor: motor.factor,
        }
    }
}

/// Builds the whole rig around `origin` (the chassis center) and returns the chassis entity.
pub fn spawn_cart(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    config: &GameConfig,
    origin: Vec2,
) -> Entity {
    let cart = &config.cart;
    let blueprint = CartBlueprint::from_config(cart);
    let chassis_color = color_from_rgb(cart.chassis.color);
    let suspension_color = color_from_rgb(cart.suspension.color);
    let rig_groups = CollisionGroups::new(Group::GROUP_2, Group::ALL.difference(Group::GROUP_2));

    let chassis = commands.spawn_empty().id();
    let mut rig = CartRig {
        origin,
        footprint: blueprint.footprint(),
        parts: Vec::with_capacity(blueprint.members.len()),
        motors: Vec::with_capacity(2),
    };

    for member in &blueprint.members {
        let entity = match member.member {
            RigMember::Chassis => chassis,
            _ => commands.spawn_empty().id(),
        };
        let position = origin + member.offset;
        let z = match member.member {
            RigMember::Wheel(_) => CART_BODY_Z + WHEEL_Z_OFFSET,
            _ => CART_BODY_Z,
        };
        commands.entity(entity).insert((
            Name::new(member.member.name()),
            CartPart {
                rig: chassis,
                member: member.member,
                rest_offset: member.offset,
            },
            RigidBody::Dynamic,
            member.shape.collider(),
            ColliderMassProperties::Density(member.density),
            Friction::coefficient(member.friction),
            Restitution::coefficient(member.restitution),
            Damping {
                linear_damping: member.linear_damping,
                angular_damping: member.angular_damping,
            },
            Velocity::zero(),
            ExternalImpulse::default(),
            rig_groups,
            Sleeping::disabled(),
            Transform::from_xyz(position.x, position.y, z),
            Visibility::Inherited,
        ));
        rig.parts.push((member.member, entity));

        match (member.member, member.shape) {
            (RigMember::Chassis, MemberShape::Cuboid { half_extents }) => {
                commands.spawn((
                    Name::new("ChassisVisual"),
                    ChassisVisual,
                    Sprite::from_color(chassis_color, half_extents * 2.0),
                    Transform::default(),
                    ChildOf(entity),
                ));
            }
            (RigMember::Wheel(_), MemberShape::Ball { radius }) => {
                commands
                    .entity(entity)
                    .insert((CartWheel, ActiveEvents::COLLISION_EVENTS));
                spawn_wheel_face(
                    commands,
                    meshes,
                    materials,
                    entity,
                    radius,
                    cart.wheel.sides,
                    color_from_rgb(cart.wheel.color),
                    color_from_rgb(cart.wheel.face_color),
                );
            }
            (_, MemberShape::Cuboid { half_extents }) => {
                commands.spawn((
                    Name::new("ShockVisual"),
                    Sprite::from_color(suspension_color, half_extents * 2.0),
                    Transform::from_xyz(0.0, 0.0, -0.05),
                    ChildOf(entity),
                ));
            }
            (_, MemberShape::Ball { .. }) => {}
        }
    }

    for joint in &blueprint.joints {
        let (Some(body_a), Some(body_b)) = (rig.part(joint.body_a), rig.part(joint.body_b)) else {
            continue;
        };

        // The joint lives on a child of body B; Rapier attaches it to the nearest body ancestor.
        let mut joint_entity = commands.spawn((
            Name::new(format!("CartJoint/{}", joint.kind.label())),
            RigJoint { kind: joint.kind },
            ImpulseJoint::new(body_a, joint.to_typed_joint()),
            ChildOf(body_b),
        ));
        if let Some(motor) = joint.motor() {
            joint_entity.insert(WheelMotor::from(motor));
            rig.motors.push(joint_entity.id());
        }
    }

    commands.entity(chassis).insert((
        rig,
        ChassisPaint::new(chassis_color, color_from_rgb(cart.chassis.hit_color)),
    ));

    info!(
        "Spawned cart at ({:.0}, {:.0}) with {} bodies and {} joints.",
        origin.x,
        origin.y,
        blueprint.members.len(),
        blueprint.joints.len()
    );

    chassis
}

/// Writes `value` into every wheel motor of the rig; both axles always share one target.
fn set_motor_speeds(motor_query: &mut Query<&mut WheelMotor>, motors: &[Entity], value: f32) {
    for &entity in motors {
        if let Ok(mut motor) = motor_query.get_mut(entity) {
            motor.target_speed = value;
        }
    }
}

pub(crate) fn apply_cart_commands(
    mut cart_commands: MessageReader<CartCommand>,
    config: Res<GameConfig>,
    rig_query: Query<(Entity, &CartRig)>,
    mut motor_query: Query<&mut WheelMotor>,
    mut part_query: Query<(
        &CartPart,
        &mut Transform,
        &mut Velocity,
        &mut ExternalImpulse,
        Has<CartWheel>,
    )>,
    terrain_query: Query<(&TerrainSurface, &Transform), Without<CartPart>>,
) {
    let Ok((rig_entity, rig)) = rig_query.single() else {
        cart_commands.clear();
        return;
    };

    for command in cart_commands.read() {
        match *command {
            CartCommand::SetSpeed(value) => {
                set_motor_speeds(&mut motor_query, &rig.motors, value);
            }
            CartCommand::Lift => {
                let lift = Vec2::Y * config.cart.feedback.lift_impulse;
                for (_, _, _, mut impulse, is_wheel) in &mut part_query {
                    if is_wheel {
                        impulse.impulse += lift;
                    }
                }
            }
            CartCommand::Reset => {
                let Ok((_, chassis_transform, _, _, _)) = part_query.get(rig_entity) else {
                    continue;
                };
                let chassis_x = chassis_transform.translation.x;
                let ground = ground_height_under(
                    &terrain_query,
                    chassis_x - rig.footprint.half_width,
                    chassis_x + rig.footprint.half_width,
                );
                let height = reset_height(
                    rig.origin.y,
                    rig.footprint,
                    ground,
                    RESET_GROUND_CLEARANCE,
                );

                for (part, mut transform, mut velocity, _, _) in &mut part_query {
                    if part.rig != rig_entity {
                        continue;
                    }
                    let position = reset_position(chassis_x, height, part.rest_offset);
                    transform.translation.x = position.x;
                    transform.translation.y = position.y;
                    transform.rotation = Quat::IDENTITY;
                    *velocity = Velocity::zero();
                }
                set_motor_speeds(&mut motor_query, &rig.motors, 0.0);
                info!("Cart reset upright at ({chassis_x:.0}, {height:.0}).");
            }
        }
    }
}

fn sync_wheel_motors(mut motor_query: Query<(&WheelMotor, &mut ImpulseJoint), Changed<WheelMotor>>) {
    for (motor, mut joint) in &mut motor_query {
        if let TypedJoint::RevoluteJoint(revolute) = &mut joint.data {
            revolute
                .set_motor_velocity(motor.target_speed, motor.factor)
                .set_motor_max_force(motor.max_torque);
        }
    }
}

fn detect_hazard_hits(
    mut collision_events: MessageReader<CollisionEvent>,
    config: Res<GameConfig>,
    wheel_query: Query<&CartPart, With<CartWheel>>,
    hazard_query: Query<(), With<Hazard>>,
    mut paint_query: Query<&mut ChassisPaint>,
) {
    for event in collision_events.read() {
        // Contact start is ignored; only separation from a hazard counts as a hit.
        let CollisionEvent::Stopped(first, second, _) = *event else {
            continue;
        };

        let wheel = if hazard_query.contains(second) {
            wheel_query.get(first)
        } else if hazard_query.contains(first) {
            wheel_query.get(second)
        } else {
            continue;
        };
        let Ok(part) = wheel else {
            continue;
        };

        if let Ok(mut paint) = paint_query.get_mut(part.rig) {
            paint.register_hit(config.cart.feedback.hit_revert_seconds);
        }
    }
}

fn update_chassis_paint(
    time: Res<Time>,
    mut rig_query: Query<(&mut ChassisPaint, &Children), With<CartRig>>,
    mut visual_query: Query<&mut Sprite, With<ChassisVisual>>,
) {
    for (mut paint, children) in &mut rig_query {
        paint.tick(time.delta_secs());

        let color = paint.current();
        let mut visuals = visual_query.iter_many_mut(children);
        while let Some(mut sprite) = visuals.fetch_next() {
            if sprite.color != color {
                sprite.color = color;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::shipped_config;
    use crate::gameplay::hazard::HazardKind;
    use crate::gameplay::terrain::{hill_profile, terrain_outline};
    use bevy::ecs::system::RunSystemOnce;
    use bevy_rapier2d::rapier::geometry::CollisionEventFlags;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<ColorMaterial>>()
            .add_message::<CartCommand>()
            .add_message::<CollisionEvent>()
            .insert_resource(shipped_config())
            .add_systems(
                Update,
                (apply_cart_commands, sync_wheel_motors, detect_hazard_hits).chain(),
            );
        app
    }

    fn spawn_rig(app: &mut App, origin: Vec2) -> Entity {
        app.world_mut()
            .run_system_once(
                move |mut commands: Commands,
                      mut meshes: ResMut<Assets<Mesh>>,
                      mut materials: ResMut<Assets<ColorMaterial>>,
                      config: Res<GameConfig>| {
                    spawn_cart(&mut commands, &mut meshes, &mut materials, &config, origin)
                },
            )
            .expect("cart spawn runs")
    }

    fn wheels(world: &mut World) -> Vec<Entity> {
        let mut query = world.query_filtered::<Entity, With<CartWheel>>();
        query.iter(world).collect()
    }

    fn motor_speeds(world: &mut World) -> Vec<f32> {
        let mut query = world.query::<&WheelMotor>();
        query.iter(world).map(|motor| motor.target_speed).collect()
    }

    #[test]
    fn spawned_rig_wires_nine_joints_and_two_wheel_motors() {
        let mut app = test_app();
        let chassis = spawn_rig(&mut app, Vec2::new(200.0, 180.0));
        let world = app.world_mut();

        let joint_count = world.query::<&RigJoint>().iter(world).count();
        assert_eq!(joint_count, 9);

        let mut motor_query = world.query::<(Entity, &WheelMotor, &ChildOf)>();
        let motors: Vec<(Entity, WheelMotor, Entity)> = motor_query
            .iter(world)
            .map(|(entity, motor, parent)| (entity, *motor, parent.parent()))
            .collect();
        assert_eq!(motors.len(), 2);

        let rig = world.get::<CartRig>(chassis).unwrap().clone();
        let torque = world.resource::<GameConfig>().cart.motor.max_torque;
        for (entity, motor, parent) in &motors {
            assert!(rig.motors.contains(entity));
            assert!(world.get::<CartWheel>(*parent).is_some());
            assert_eq!(motor.target_speed, 0.0);
            assert_eq!(motor.max_torque, torque);
        }

        let mut part_query = world.query::<(&CartPart, &CollisionGroups)>();
        let mut parts = 0;
        for (part, groups) in part_query.iter(world) {
            parts += 1;
            assert_eq!(part.rig, chassis);
            assert_eq!(groups.memberships, Group::GROUP_2);
            assert!(!groups.filters.contains(Group::GROUP_2));
        }
        assert_eq!(parts, 7);
        assert_eq!(rig.parts.len(), 7);
    }

    #[test]
    fn set_speed_reaches_both_joint_motors_with_fixed_torque() {
        let mut app = test_app();
        spawn_rig(&mut app, Vec2::new(200.0, 180.0));
        let torque = app.world().resource::<GameConfig>().cart.motor.max_torque;

        app.world_mut().write_message(CartCommand::SetSpeed(-12.5));
        app.update();

        assert_eq!(motor_speeds(app.world_mut()), vec![-12.5, -12.5]);

        let world = app.world_mut();
        let mut joint_query = world.query::<(&WheelMotor, &ImpulseJoint)>();
        let mut synced = 0;
        for (motor, joint) in joint_query.iter(world) {
            let TypedJoint::RevoluteJoint(revolute) = &joint.data else {
                panic!("wheel motor sits on a non-pivot joint");
            };
            let axle = revolute.motor().expect("pivot carries a motor");
            assert_eq!(axle.target_vel, motor.target_speed);
            assert_eq!(axle.max_force, torque);
            assert_eq!(motor.max_torque, torque);
            synced += 1;
        }
        assert_eq!(synced, 2);
    }

    #[test]
    fn lift_pushes_only_the_wheels_upward() {
        let mut app = test_app();
        spawn_rig(&mut app, Vec2::new(200.0, 180.0));
        let lift = app.world().resource::<GameConfig>().cart.feedback.lift_impulse;

        app.world_mut().write_message(CartCommand::Lift);
        app.update();

        let mut query = app
            .world_mut()
            .query::<(&ExternalImpulse, Has<CartWheel>)>();
        let mut wheels = 0;
        for (impulse, is_wheel) in query.iter(app.world()) {
            if is_wheel {
                wheels += 1;
                assert_eq!(impulse.impulse, Vec2::new(0.0, lift));
            } else {
                assert_eq!(impulse.impulse, Vec2::ZERO);
            }
        }
        assert_eq!(wheels, 2);
    }

    fn knock_over(app: &mut App, chassis: Entity, position: Vec2) {
        let mut entity = app.world_mut().entity_mut(chassis);
        let mut transform = entity.get_mut::<Transform>().unwrap();
        transform.translation = position.extend(transform.translation.z);
        transform.rotation = Quat::from_rotation_z(2.5);
    }

    fn assert_rig_at(app: &mut App, chassis_x: f32, height: f32) {
        let mut query = app.world_mut().query::<(&CartPart, &Transform, &Velocity)>();
        for (part, transform, velocity) in query.iter(app.world()) {
            let expected = reset_position(chassis_x, height, part.rest_offset);
            assert_eq!(transform.translation.truncate(), expected);
            assert_eq!(transform.rotation, Quat::IDENTITY);
            assert_eq!(velocity.linvel, Vec2::ZERO);
        }
    }

    #[test]
    fn reset_uprights_in_place_and_stops_motors() {
        let origin = Vec2::new(200.0, 180.0);
        let mut app = test_app();
        let chassis = spawn_rig(&mut app, origin);

        app.world_mut().write_message(CartCommand::SetSpeed(-8.0));
        app.update();
        knock_over(&mut app, chassis, Vec2::new(2500.0, 90.0));

        app.world_mut().write_message(CartCommand::Reset);
        app.update();

        assert_rig_at(&mut app, 2500.0, origin.y);
        assert_eq!(motor_speeds(app.world_mut()), vec![0.0, 0.0]);
    }

    #[test]
    fn reset_over_a_hill_peak_lands_the_rig_above_the_ground() {
        let origin = Vec2::new(200.0, 180.0);
        let mut app = test_app();
        let chassis = spawn_rig(&mut app, origin);
        let coords = hill_profile(140.0, 800.0, 600.0, 100.0, 0.25);
        app.world_mut().spawn((
            TerrainSurface::new(terrain_outline(&coords, 600.0).collision),
            Transform::from_xyz(2000.0, 0.0, 0.0),
        ));
        knock_over(&mut app, chassis, Vec2::new(2400.0, 150.0));

        app.world_mut().write_message(CartCommand::Reset);
        app.update();

        let rig = app.world().get::<CartRig>(chassis).unwrap().clone();
        let expected_height = 240.0 + RESET_GROUND_CLEARANCE - rig.footprint.bottom;
        assert!(expected_height > origin.y);
        assert_rig_at(&mut app, 2400.0, expected_height);

        let radius = app.world().resource::<GameConfig>().cart.wheel.radius;
        for wheel in wheels(app.world_mut()) {
            let center = app.world().get::<Transform>(wheel).unwrap().translation;
            assert!(center.y - radius > 240.0);
        }
    }

    fn paint(app: &App, chassis: Entity) -> &ChassisPaint {
        app.world().get::<ChassisPaint>(chassis).unwrap()
    }

    #[test]
    fn only_wheel_separating_from_hazard_recolors_chassis() {
        let mut app = test_app();
        let chassis = spawn_rig(&mut app, Vec2::new(200.0, 180.0));
        let wheel = wheels(app.world_mut())[0];
        let hazard = app
            .world_mut()
            .spawn(Hazard {
                kind: HazardKind::Boulder,
            })
            .id();
        let flags = CollisionEventFlags::empty();

        app.world_mut()
            .write_message(CollisionEvent::Started(wheel, hazard, flags));
        app.update();
        assert!(!paint(&app, chassis).is_hit());
        assert_eq!(paint(&app, chassis).pending_reverts(), 0);

        app.world_mut()
            .write_message(CollisionEvent::Stopped(wheel, chassis, flags));
        app.update();
        assert!(!paint(&app, chassis).is_hit());
        assert_eq!(paint(&app, chassis).pending_reverts(), 0);

        app.world_mut()
            .write_message(CollisionEvent::Stopped(wheel, hazard, flags));
        app.update();
        let hit_color = color_from_rgb(app.world().resource::<GameConfig>().cart.chassis.hit_color);
        assert!(paint(&app, chassis).is_hit());
        assert_eq!(paint(&app, chassis).current(), hit_color);
        assert_eq!(paint(&app, chassis).pending_reverts(), 1);

        app.world_mut()
            .write_message(CollisionEvent::Stopped(hazard, wheel, flags));
        app.update();
        assert_eq!(paint(&app, chassis).pending_reverts(), 2);
    }
}
