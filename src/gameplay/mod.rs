pub mod cart;
pub mod course;
pub mod hazard;
pub mod terrain;

use bevy::prelude::*;
use cart::CartGameplayPlugin;
use course::CourseGameplayPlugin;

/// Per-frame ordering: pointer input, then course rules, then the rig applies what was requested.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameplaySet {
    Input,
    Control,
    Rig,
}

pub struct GameplayPlugin;

impl Plugin for GameplayPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (GameplaySet::Input, GameplaySet::Control, GameplaySet::Rig).chain(),
        )
        .add_plugins(CartGameplayPlugin)
        .add_plugins(CourseGameplayPlugin);
    }
}
