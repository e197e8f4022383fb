use crate::gameplay::terrain::build_outline_mesh;
use bevy::prelude::*;
use std::f32::consts::{FRAC_PI_2, TAU};

/// Closed vector line primitives are capped at eight segments.
pub const MAX_FACE_SIDES: u32 = 8;

const FACE_OUTLINE_Z: f32 = 0.01;

/// Grouping entity for a wheel's decorative face.
#[derive(Component, Debug, Clone, Copy)]
pub struct WheelFace {
    pub radius: f32,
    pub sides: u32,
}

/// Closed regular-polygon outline with its first vertex straight up.
///
/// Panics unless `2 <= sides <= 8`.
pub fn regular_polygon_outline(radius: f32, sides: u32) -> Vec<Vec2> {
    assert!(
        (2..=MAX_FACE_SIDES).contains(&sides),
        "wheel face needs between 2 and {MAX_FACE_SIDES} sides, got {sides}"
    );

    let mut points: Vec<Vec2> = (0..sides)
        .map(|index| {
            let angle = FRAC_PI_2 + TAU * index as f32 / sides as f32;
            Vec2::from_angle(angle) * radius
        })
        .collect();
    points.push(points[0]);
    points
}

/// Spawns the enclosing circle and polygon outline under one group entity parented to `parent`.
/// The group carries no physics; the caller's body owns the collider.
#[allow(clippy::too_many_arguments)]
pub fn spawn_wheel_face(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    parent: Entity,
    radius: f32,
    sides: u32,
    rim_color: Color,
    face_color: Color,
) -> Entity {
    let outline = regular_polygon_outline(radius, sides);
    let rim_mesh = meshes.add(Circle::new(radius));
    let face_mesh = meshes.add(build_outline_mesh(&outline));

    let group = commands
        .spawn((
            Name::new("WheelFace"),
            WheelFace { radius, sides },
            Transform::default(),
            Visibility::Inherited,
            ChildOf(parent),
        ))
        .id();

    commands.spawn((
        Name::new("WheelRim"),
        Mesh2d(rim_mesh),
        MeshMaterial2d(materials.add(ColorMaterial::from(rim_color))),
        Transform::default(),
        ChildOf(group),
    ));
    commands.spawn((
        Name::new("WheelFaceOutline"),
        Mesh2d(face_mesh),
        MeshMaterial2d(materials.add(ColorMaterial::from(face_color))),
        Transform::from_xyz(0.0, 0.0, FACE_OUTLINE_Z),
        ChildOf(group),
    ));

    group
}
