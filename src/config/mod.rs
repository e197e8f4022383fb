use crate::gameplay::cart::MAX_FACE_SIDES;
use crate::states::GameState;
use bevy::prelude::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "config";

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, load_game_config)
            .add_systems(Update, reload_game_config_hotkey);
    }
}

fn load_game_config(mut commands: Commands) {
    let config = GameConfig::load_from_dir(Path::new(CONFIG_DIR)).unwrap_or_else(|error| {
        panic!("failed to load configuration from `{CONFIG_DIR}`: {error}");
    });

    log_config_summary("Loaded", &config);
    info!("Press F5 to hot-reload config files from `{CONFIG_DIR}`.");

    commands.insert_resource(config);
}

fn reload_game_config_hotkey(
    keyboard: Res<ButtonInput<KeyCode>>,
    game_config: Option<ResMut<GameConfig>>,
    state: Option<Res<State<GameState>>>,
    next_state: Option<ResMut<NextState<GameState>>>,
) {
    if !keyboard.just_pressed(KeyCode::F5) {
        return;
    }

    let Some(mut current_config) = game_config else {
        warn!("Config hot-reload requested, but `GameConfig` resource is not initialized yet.");
        return;
    };

    match GameConfig::load_from_dir(Path::new(CONFIG_DIR)) {
        Ok(new_config) => {
            let rebuild = current_config.needs_course_rebuild(&new_config);
            *current_config = new_config;
            log_config_summary("Hot-reloaded", &current_config);

            let course_live = state.is_some_and(|state| *state.get() != GameState::Boot);
            if rebuild && course_live {
                if let Some(mut next_state) = next_state {
                    info!("Course layout changed on reload; rebuilding the course.");
                    next_state.set(GameState::Boot);
                }
            }
        }
        Err(error) => {
            error!("Config hot-reload failed; keeping previous config: {error}");
        }
    }
}

fn log_config_summary(prefix: &str, config: &GameConfig) {
    info!(
        "{prefix} config: {} terrain segments of {} units, {}-sided wheels, lift impulse {}.",
        config.terrain.terrain.peak_heights.len(),
        config.game.world.screen_width,
        config.cart.wheel.sides,
        config.cart.feedback.lift_impulse
    );
}

#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    pub game: GameFile,
    pub cart: CartFile,
    pub terrain: TerrainFile,
}

impl GameConfig {
    pub fn load_from_dir(config_dir: &Path) -> Result<Self, ConfigError> {
        let config = Self {
            game: read_toml(&config_dir.join("game.toml"))?,
            cart: read_toml(&config_dir.join("cart.toml"))?,
            terrain: read_toml(&config_dir.join("terrain.toml"))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Builds a config from in-memory TOML text, running the same validation as the loader.
    pub fn from_toml_strs(game: &str, cart: &str, terrain: &str) -> Result<Self, ConfigError> {
        let config = Self {
            game: parse_toml(Path::new("game.toml"), game)?,
            cart: parse_toml(Path::new("cart.toml"), cart)?,
            terrain: parse_toml(Path::new("terrain.toml"), terrain)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Whether `other` changes anything baked into the spawned course: world size, cart start,
    /// terrain profiles, or hazard and cart bodies. Lift, wheel speed mapping and camera offset
    /// are read live and never force a rebuild.
    pub fn needs_course_rebuild(&self, other: &GameConfig) -> bool {
        let (old, new) = (&self.game.world, &other.game.world);
        old.screen_width != new.screen_width
            || old.screen_height != new.screen_height
            || old.floor_height != new.floor_height
            || old.cart_start != new.cart_start
            || self.game.hazard != other.game.hazard
            || self.terrain.terrain != other.terrain.terrain
            || self.cart.chassis != other.cart.chassis
            || self.cart.suspension != other.cart.suspension
            || self.cart.wheel != other.cart.wheel
            || self.cart.damping != other.cart.damping
            || self.cart.motor != other.cart.motor
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.game.world;
        if world.screen_width <= 0.0 || world.screen_height <= 0.0 {
            return Err(ConfigError::Validation(
                "game.toml::world screen dimensions must be > 0".to_string(),
            ));
        }
        if !(0.0 <= world.floor_height && world.floor_height < world.screen_height) {
            return Err(ConfigError::Validation(
                "game.toml::world.floor_height must be in [0, screen_height)".to_string(),
            ));
        }

        let hazard = &self.game.hazard;
        if hazard.radius <= 0.0 {
            return Err(ConfigError::Validation(
                "game.toml::hazard.radius must be > 0".to_string(),
            ));
        }
        if hazard.density <= 0.0 {
            return Err(ConfigError::Validation(
                "game.toml::hazard.density must be > 0".to_string(),
            ));
        }

        let slider = &self.game.slider;
        if slider.right_limit <= slider.left_limit {
            return Err(ConfigError::Validation(
                "game.toml::slider.right_limit must be > left_limit".to_string(),
            ));
        }
        if slider.button_size[0] <= 0.0 || slider.button_size[1] <= 0.0 {
            return Err(ConfigError::Validation(
                "game.toml::slider.button_size must be > 0 on both axes".to_string(),
            ));
        }

        let cart = &self.cart;
        if cart.chassis.size[0] <= 0.0 || cart.chassis.size[1] <= 0.0 {
            return Err(ConfigError::Validation(
                "cart.toml::chassis.size must be > 0 on both axes".to_string(),
            ));
        }
        if cart.suspension.travel < 0.0 {
            return Err(ConfigError::Validation(
                "cart.toml::suspension.travel must be >= 0".to_string(),
            ));
        }
        if cart.suspension.mount_x <= 0.0 {
            return Err(ConfigError::Validation(
                "cart.toml::suspension.mount_x must be > 0".to_string(),
            ));
        }
        if cart.wheel.radius <= 0.0 {
            return Err(ConfigError::Validation(
                "cart.toml::wheel.radius must be > 0".to_string(),
            ));
        }
        if !(2..=MAX_FACE_SIDES).contains(&cart.wheel.sides) {
            return Err(ConfigError::Validation(format!(
                "cart.toml::wheel.sides must be in [2, {MAX_FACE_SIDES}] (got {})",
                cart.wheel.sides
            )));
        }
        if cart.motor.max_torque <= 0.0 {
            return Err(ConfigError::Validation(
                "cart.toml::motor.max_torque must be > 0".to_string(),
            ));
        }
        if cart.feedback.hit_revert_seconds < 0.0 {
            return Err(ConfigError::Validation(
                "cart.toml::feedback.hit_revert_seconds must be >= 0".to_string(),
            ));
        }

        let terrain = &self.terrain.terrain;
        if terrain.peak_heights.is_empty() {
            return Err(ConfigError::Validation(
                "terrain.toml::terrain.peak_heights must contain at least one height".to_string(),
            ));
        }
        let ground_clearance = world.screen_height - world.floor_height;
        for (index, peak) in terrain.peak_heights.iter().enumerate() {
            if *peak < 0.0 || *peak >= ground_clearance {
                return Err(ConfigError::Validation(format!(
                    "terrain.toml::terrain.peak_heights[{index}] must be in [0, {ground_clearance})"
                )));
            }
        }
        if !(0.0 < terrain.shoulder_fraction && terrain.shoulder_fraction < 0.5) {
            return Err(ConfigError::Validation(
                "terrain.toml::terrain.shoulder_fraction must be in (0, 0.5)".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: Box<toml::de::Error>,
    },
    Validation(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse `{}`: {source}", path.display())
            }
            Self::Validation(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_toml(path, &raw)
}

fn parse_toml<T: DeserializeOwned>(path: &Path, raw: &str) -> Result<T, ConfigError> {
    toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

pub fn color_from_rgb(rgb: [f32; 3]) -> Color {
    Color::srgb(rgb[0], rgb[1], rgb[2])
}

#[derive(Debug, Clone, Deserialize)]
pub struct GameFile {
    pub app: AppConfig,
    pub world: WorldConfig,
    pub hazard: HazardConfig,
    pub slider: SliderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub debug_overlay: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorldConfig {
    pub screen_width: f32,
    pub screen_height: f32,
    pub floor_height: f32,
    pub camera_offset: [f32; 2],
    pub cart_start: [f32; 2],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HazardConfig {
    pub radius: f32,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub drop_height: f32,
    pub color: [f32; 3],
}

#[derive(Debug, Clone, Deserialize)]
pub struct SliderConfig {
    pub left_limit: f32,
    pub right_limit: f32,
    pub y: f32,
    pub button_size: [f32; 2],
    #[serde(default = "default_track_thickness")]
    pub track_thickness: f32,
    pub max_wheel_speed: f32,
}

fn default_track_thickness() -> f32 {
    6.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartFile {
    pub chassis: ChassisConfig,
    pub suspension: SuspensionConfig,
    pub wheel: WheelConfig,
    pub damping: DampingConfig,
    pub motor: MotorConfig,
    pub feedback: FeedbackConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChassisConfig {
    pub size: [f32; 2],
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub color: [f32; 3],
    pub hit_color: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SuspensionConfig {
    pub mount_x: f32,
    pub base_offset_y: f32,
    pub base_size: [f32; 2],
    pub rod_offset_y: f32,
    pub rod_size: [f32; 2],
    pub density: f32,
    pub travel: f32,
    pub spring_stiffness: f32,
    pub spring_damping: f32,
    pub color: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WheelConfig {
    pub radius: f32,
    pub sides: u32,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub color: [f32; 3],
    pub face_color: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DampingConfig {
    pub chassis_angular: f32,
    pub rod_linear: f32,
    pub rod_angular: f32,
    pub base_linear: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MotorConfig {
    pub max_torque: f32,
    #[serde(default = "default_motor_factor")]
    pub motor_factor: f32,
}

fn default_motor_factor() -> f32 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackConfig {
    pub lift_impulse: f32,
    #[serde(default = "default_hit_revert_seconds")]
    pub hit_revert_seconds: f32,
}

fn default_hit_revert_seconds() -> f32 {
    2.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct TerrainFile {
    pub terrain: TerrainConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TerrainConfig {
    pub peak_heights: Vec<f32>,
    pub shoulder_fraction: f32,
    pub color: [f32; 3],
}
