mod ring;

pub use ring::{RingPlacement, TerrainRing};

use crate::config::{color_from_rgb, GameConfig};
use bevy::asset::RenderAssetUsages;
use bevy::mesh::PrimitiveTopology;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

const TERRAIN_OUTLINE_Z: f32 = 0.2;
const TERRAIN_FRICTION: f32 = 1.0;
const TERRAIN_RESTITUTION: f32 = 0.0;

/// One recyclable ground contour, tagged with its slot in the terrain ring.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainSegment {
    pub slot: usize,
}

/// Visual and physical outlines of a ground contour, both local to the segment origin.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainOutline {
    /// Closed line strip; the first point is repeated at the end.
    pub visual: Vec<Vec2>,
    /// Collision loop; closure is expressed through `collider_indices`, never by a repeated vertex.
    pub collision: Vec<Vec2>,
}

impl TerrainOutline {
    pub fn collider_indices(&self) -> Vec<[u32; 2]> {
        let count = self.collision.len() as u32;
        (0..count).map(|index| [index, (index + 1) % count]).collect()
    }

    /// Solid ground: the closed loop is split into convex parts so overlapping bodies are pushed
    /// out instead of sliding between edges.
    pub fn collider(&self) -> Collider {
        Collider::convex_decomposition(&self.collision, &self.collider_indices())
    }
}

/// Local collision loop of a segment, kept for ground-height lookups.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct TerrainSurface {
    points: Vec<Vec2>,
}

impl TerrainSurface {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    /// Highest point of the loop over the local span `[min_x, max_x]`, or `None` when the
    /// segment does not reach into the span.
    pub fn highest_between(&self, min_x: f32, max_x: f32) -> Option<f32> {
        let count = self.points.len();
        let mut highest: Option<f32> = None;

        for index in 0..count {
            let a = self.points[index];
            let b = self.points[(index + 1) % count];
            let (left, right) = if a.x <= b.x { (a, b) } else { (b, a) };
            let from = left.x.max(min_x);
            let to = right.x.min(max_x);
            if from > to {
                continue;
            }

            let edge_high = if right.x - left.x <= f32::EPSILON {
                left.y.max(right.y)
            } else {
                let height_at = |x: f32| left.lerp(right, (x - left.x) / (right.x - left.x)).y;
                height_at(from).max(height_at(to))
            };
            highest = Some(highest.map_or(edge_high, |current| current.max(edge_high)));
        }

        highest
    }
}

/// Highest ground under the world span `[min_x, max_x]` across every placed segment.
pub fn ground_height_under<'a>(
    segments: impl IntoIterator<Item = (&'a TerrainSurface, &'a Transform)>,
    min_x: f32,
    max_x: f32,
) -> Option<f32> {
    segments
        .into_iter()
        .filter_map(|(surface, transform)| {
            let origin = transform.translation.truncate();
            surface
                .highest_between(min_x - origin.x, max_x - origin.x)
                .map(|height| height + origin.y)
        })
        .reduce(f32::max)
}

/// Converts a display-space point (y grows downward from the top of the screen) into the
/// y-up physics frame whose origin sits on the world floor.
pub fn display_to_physics(point: Vec2, world_height: f32) -> Vec2 {
    Vec2::new(point.x, world_height - point.y)
}

/// Builds both outlines from a flat `[x0, y0, x1, y1, ...]` display-space coordinate list.
///
/// Panics when fewer than two coordinate pairs are given or the list has an odd length.
pub fn terrain_outline(coords: &[f32], world_height: f32) -> TerrainOutline {
    assert!(
        coords.len() >= 4 && coords.len() % 2 == 0,
        "terrain profile needs at least two (x, y) pairs, got {} numbers",
        coords.len()
    );

    let collision: Vec<Vec2> = coords
        .chunks_exact(2)
        .map(|pair| display_to_physics(Vec2::new(pair[0], pair[1]), world_height))
        .collect();

    let mut visual = collision.clone();
    visual.push(collision[0]);

    TerrainOutline { visual, collision }
}

/// Display-space silhouette of one hill segment: floor corners, a flat approach, a single peak
/// `peak_height` above ground level at mid-width, and a flat run-out.
pub fn hill_profile(
    peak_height: f32,
    segment_width: f32,
    world_height: f32,
    floor_height: f32,
    shoulder_fraction: f32,
) -> Vec<f32> {
    let ground_y = world_height - floor_height;
    let shoulder = segment_width * shoulder_fraction;

    vec![
        0.0,
        world_height,
        0.0,
        ground_y,
        shoulder,
        ground_y,
        segment_width * 0.5,
        ground_y - peak_height,
        segment_width - shoulder,
        ground_y,
        segment_width,
        ground_y,
        segment_width,
        world_height,
    ]
}

pub fn build_outline_mesh(points: &[Vec2]) -> Mesh {
    let positions: Vec<[f32; 3]> = points.iter().map(|p| [p.x, p.y, 0.0]).collect();
    let normals = vec![[0.0, 0.0, 1.0]; positions.len()];
    let uvs = vec![[0.0, 0.0]; positions.len()];

    let mut mesh = Mesh::new(PrimitiveTopology::LineStrip, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh
}

/// Spawns one static ground contour at `origin_x` and returns its entity.
#[allow(clippy::too_many_arguments)]
pub fn spawn_terrain_segment(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    slot: usize,
    coords: &[f32],
    world_height: f32,
    origin_x: f32,
    color: Color,
) -> Entity {
    let outline = terrain_outline(coords, world_height);
    let mesh = meshes.add(build_outline_mesh(&outline.visual));
    let material = materials.add(ColorMaterial::from(color));

    commands
        .spawn((
            Name::new(format!("TerrainSegment/{slot}")),
            TerrainSegment { slot },
            RigidBody::Fixed,
            outline.collider(),
            TerrainSurface::new(outline.collision.clone()),
            Friction::coefficient(TERRAIN_FRICTION),
            Restitution::coefficient(TERRAIN_RESTITUTION),
            Mesh2d(mesh),
            MeshMaterial2d(material),
            Transform::from_xyz(origin_x, 0.0, TERRAIN_OUTLINE_Z),
        ))
        .id()
}

/// Spawns every ring slot, each with its own peak height, at the ring's initial layout.
pub fn spawn_terrain_ring(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    config: &GameConfig,
    ring: &TerrainRing,
) {
    let world = &config.game.world;
    let terrain = &config.terrain.terrain;
    let color = color_from_rgb(terrain.color);

    for (slot, peak_height) in terrain.peak_heights.iter().copied().enumerate() {
        let coords = hill_profile(
            peak_height,
            world.screen_width,
            world.screen_height,
            world.floor_height,
            terrain.shoulder_fraction,
        );
        spawn_terrain_segment(
            commands,
            meshes,
            materials,
            slot,
            &coords,
            world.screen_height,
            ring.initial_slot_x(slot),
            color,
        );
    }
}
