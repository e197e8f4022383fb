mod pointer;
mod slider;

pub use pointer::PointerInput;
pub use slider::SpeedSlider;

use crate::config::GameConfig;
use crate::gameplay::GameplaySet;
use crate::states::GameState;
use bevy::prelude::*;

const SLIDER_Z_INDEX: i32 = 180;
const SLIDER_TRACK_COLOR: Color = Color::srgba(0.78, 0.84, 0.9, 0.8);
const SLIDER_BUTTON_COLOR: Color = Color::srgb(0.94, 0.97, 1.0);
const SLIDER_BUTTON_BORDER: Color = Color::srgba(0.2, 0.26, 0.32, 0.95);

pub struct SpeedSliderPlugin;

impl Plugin for SpeedSliderPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<PointerInput>()
            .add_message::<SpeedSliderChanged>()
            .add_message::<LiftRequested>()
            .add_systems(OnEnter(GameState::InRun), spawn_speed_slider)
            .add_systems(OnEnter(GameState::Boot), cleanup_speed_slider)
            .add_systems(
                Update,
                (
                    pointer::read_pointer_input,
                    route_pointer_input,
                    sync_slider_button,
                )
                    .chain()
                    .in_set(GameplaySet::Input)
                    .run_if(in_state(GameState::InRun))
                    .run_if(resource_exists::<SpeedSlider>),
            );
    }
}

/// New slider fraction produced by a drag.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct SpeedSliderChanged {
    pub value: f32,
}

/// A press the slider did not capture.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct LiftRequested;

#[derive(Component)]
struct SpeedSliderRoot;

#[derive(Component)]
struct SpeedSliderButton;

fn spawn_speed_slider(
    mut commands: Commands,
    config: Option<Res<GameConfig>>,
    existing_slider: Query<Entity, With<SpeedSliderRoot>>,
) {
    if !existing_slider.is_empty() {
        return;
    }
    let Some(config) = config else {
        warn!("Speed slider skipped: config is not loaded.");
        return;
    };

    let slider_config = &config.game.slider;
    let slider = SpeedSlider::from_config(slider_config);
    let button_size = slider.button_size();
    let track_width = slider.track_width();
    let track_thickness = slider_config.track_thickness;

    commands
        .spawn((
            Name::new("SpeedSliderRoot"),
            SpeedSliderRoot,
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(slider.left_limit() - button_size.x * 0.5),
                top: Val::Px(slider.y() - button_size.y * 0.5),
                width: Val::Px(track_width + button_size.x),
                height: Val::Px(button_size.y),
                ..default()
            },
            ZIndex(SLIDER_Z_INDEX),
        ))
        .with_children(|root| {
            root.spawn((
                Name::new("SpeedSliderTrack"),
                Node {
                    position_type: PositionType::Absolute,
                    left: Val::Px(button_size.x * 0.5),
                    top: Val::Px((button_size.y - track_thickness) * 0.5),
                    width: Val::Px(track_width),
                    height: Val::Px(track_thickness),
                    ..default()
                },
                BackgroundColor(SLIDER_TRACK_COLOR),
            ));
            root.spawn((
                Name::new("SpeedSliderButton"),
                SpeedSliderButton,
                Node {
                    position_type: PositionType::Absolute,
                    left: Val::Px(0.0),
                    top: Val::Px(0.0),
                    width: Val::Px(button_size.x),
                    height: Val::Px(button_size.y),
                    border: UiRect::all(Val::Px(2.0)),
                    ..default()
                },
                BackgroundColor(SLIDER_BUTTON_COLOR),
                BorderColor::all(SLIDER_BUTTON_BORDER),
            ));
        });

    commands.insert_resource(slider);
    info!(
        "Speed slider ready over x = {:.0} .. {:.0}.",
        slider_config.left_limit, slider_config.right_limit
    );
}

fn cleanup_speed_slider(mut commands: Commands, root_query: Query<Entity, With<SpeedSliderRoot>>) {
    for entity in &root_query {
        commands.entity(entity).try_despawn();
    }
    commands.remove_resource::<SpeedSlider>();
}

/// Presses on the button start a drag; any other press asks for a lift.
fn route_pointer_input(
    mut pointer: MessageReader<PointerInput>,
    mut slider: ResMut<SpeedSlider>,
    mut changed: MessageWriter<SpeedSliderChanged>,
    mut lift: MessageWriter<LiftRequested>,
) {
    for input in pointer.read() {
        match *input {
            PointerInput::Pressed(position) => {
                if !slider.press(position) {
                    lift.write(LiftRequested);
                }
            }
            PointerInput::Moved(position) => {
                if let Some(value) = slider.drag(position.x) {
                    changed.write(SpeedSliderChanged { value });
                }
            }
            PointerInput::Released(_) => slider.release(),
        }
    }
}

fn sync_slider_button(
    slider: Res<SpeedSlider>,
    mut button_query: Query<&mut Node, With<SpeedSliderButton>>,
) {
    if !slider.is_changed() {
        return;
    }

    let left = slider.button_center().x - slider.left_limit();
    for mut node in &mut button_query {
        node.left = Val::Px(left);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::message::Messages;

    fn routing_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_message::<PointerInput>()
            .add_message::<SpeedSliderChanged>()
            .add_message::<LiftRequested>()
            .insert_resource(SpeedSlider::new(40.0, 240.0, 560.0, Vec2::splat(24.0)))
            .add_systems(Update, route_pointer_input);
        app
    }

    fn drain<M: Message + Clone>(app: &mut App) -> Vec<M> {
        app.world_mut()
            .resource_mut::<Messages<M>>()
            .drain()
            .collect()
    }

    #[test]
    fn press_on_button_starts_drag_without_lift() {
        let mut app = routing_app();

        app.world_mut()
            .write_message(PointerInput::Pressed(Vec2::new(40.0, 560.0)));
        app.world_mut()
            .write_message(PointerInput::Moved(Vec2::new(90.0, 560.0)));
        app.update();

        assert!(drain::<LiftRequested>(&mut app).is_empty());
        assert_eq!(
            drain::<SpeedSliderChanged>(&mut app),
            vec![SpeedSliderChanged { value: 0.25 }]
        );
    }

    #[test]
    fn press_elsewhere_requests_lift() {
        let mut app = routing_app();

        app.world_mut()
            .write_message(PointerInput::Pressed(Vec2::new(400.0, 200.0)));
        app.world_mut()
            .write_message(PointerInput::Moved(Vec2::new(420.0, 200.0)));
        app.update();

        assert_eq!(drain::<LiftRequested>(&mut app).len(), 1);
        assert!(drain::<SpeedSliderChanged>(&mut app).is_empty());
        assert!(!app.world().resource::<SpeedSlider>().is_dragging());
    }

    #[test]
    fn release_ends_the_drag() {
        let mut app = routing_app();

        app.world_mut()
            .write_message(PointerInput::Pressed(Vec2::new(40.0, 560.0)));
        app.world_mut()
            .write_message(PointerInput::Released(Vec2::new(40.0, 560.0)));
        app.world_mut()
            .write_message(PointerInput::Moved(Vec2::new(140.0, 560.0)));
        app.update();

        assert!(drain::<SpeedSliderChanged>(&mut app).is_empty());
        assert_eq!(app.world().resource::<SpeedSlider>().value(), 0.0);
    }
}
