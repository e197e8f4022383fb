use crate::config::{color_from_rgb, HazardConfig};
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

const HAZARD_Z: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardKind {
    Boulder,
}

/// Recyclable obstacle that the cart reacts to when a wheel leaves contact with it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hazard {
    pub kind: HazardKind,
}

pub fn spawn_hazard(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    config: &HazardConfig,
    position: Vec2,
) -> Entity {
    let entity = commands
        .spawn((
            Name::new("Hazard/Boulder"),
            Hazard {
                kind: HazardKind::Boulder,
            },
            RigidBody::Dynamic,
            Collider::ball(config.radius),
            ColliderMassProperties::Density(config.density),
            Friction::coefficient(config.friction),
            Restitution::coefficient(config.restitution),
            Velocity::zero(),
            Mesh2d(meshes.add(Circle::new(config.radius))),
            MeshMaterial2d(materials.add(ColorMaterial::from(color_from_rgb(config.color)))),
            Transform::from_xyz(position.x, position.y, HAZARD_Z),
        ))
        .id();

    debug!("Spawned hazard at ({:.0}, {:.0}).", position.x, position.y);
    entity
}

/// Drop point for a hazard that has fallen more than one screen behind the chassis, if any.
pub fn hazard_respawn_position(
    hazard_x: f32,
    chassis_x: f32,
    screen_width: f32,
    drop_height: f32,
) -> Option<Vec2> {
    if hazard_x < chassis_x - screen_width {
        Some(Vec2::new(chassis_x + screen_width, drop_height))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hazard_within_a_screen_stays_put() {
        assert_eq!(hazard_respawn_position(-100.0, 600.0, 800.0, 520.0), None);
        assert_eq!(hazard_respawn_position(-200.0, 600.0, 800.0, 520.0), None);
    }

    #[test]
    fn hazard_left_behind_drops_a_screen_ahead() {
        assert_eq!(
            hazard_respawn_position(-600.0, 1000.0, 800.0, 520.0),
            Some(Vec2::new(1800.0, 520.0))
        );
    }

    #[test]
    fn repeated_travel_keeps_recycling_ahead() {
        let mut hazard_x = -1400.0;
        let mut respawns = 0;

        for chassis_x in (0..20).map(|step| step as f32 * 400.0) {
            if let Some(position) = hazard_respawn_position(hazard_x, chassis_x, 800.0, 520.0) {
                assert!(position.x > chassis_x);
                hazard_x = position.x;
                respawns += 1;
            }
        }

        assert_eq!(respawns, 4);
        assert_eq!(hazard_x, 6800.0);
    }
}
