use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use tern_kinematics::DifferentialDrive;
use tern_navigation::{ArcParams, ExplorationParams, FigureEightParams, PerceptionParams, ShapeParams};
use tern_sim::{Scenario, SimConfig, World};
use tracing::{debug, error, info};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Which behavior the robot runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Mission {
    /// Walk around and measure a course of obstacles.
    #[default]
    Explore,
    /// Draw polygons and a rectangle.
    Shapes,
    /// Drive a figure eight out of half circles.
    Circles,
    /// Drive full circles, avoiding obstacles on the way.
    FigureEight,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RobotSettings {
    pub wheel_radius: f64,
    pub track_width: f64,
}

impl Default for RobotSettings {
    fn default() -> Self {
        RobotSettings {
            wheel_radius: 0.021,
            track_width: 0.1054,
        }
    }
}

impl RobotSettings {
    pub fn drive(&self) -> Result<DifferentialDrive> {
        DifferentialDrive::new(self.wheel_radius, self.track_width).context("invalid robot geometry")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PrimitiveSettings {
    pub shapes: ShapeParams,
    pub circles: ArcParams,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    #[serde(flatten)]
    pub host: SimConfig,
    pub scenario: Scenario,
    /// Hard cap on driver ticks, independent of the host's time limit.
    pub max_ticks: Option<u64>,
}

impl SimulationSettings {
    /// The generated course only makes sense for exploration; other
    /// missions see just the hand-placed obstacles.
    pub fn world(&self, mission: Mission, course_boxes: u32) -> World {
        match mission {
            Mission::Explore => self.scenario.build(course_boxes),
            _ => World::new(self.scenario.obstacles.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mission: Mission,
    pub robot: RobotSettings,
    pub perception: PerceptionParams,
    pub exploration: ExplorationParams,
    pub primitives: PrimitiveSettings,
    pub figure_eight: FigureEightParams,
    pub simulation: SimulationSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.robot.drive()?;
        self.perception.validate().context("invalid [perception] settings")?;
        self.exploration.validate().context("invalid [exploration] settings")?;
        self.primitives.shapes.validate().context("invalid [primitives.shapes] settings")?;
        self.primitives.circles.validate().context("invalid [primitives.circles] settings")?;
        self.figure_eight.validate().context("invalid [figure_eight] settings")?;
        self.simulation.host.validate().context("invalid [simulation] settings")?;
        Ok(())
    }
}

/// Loads settings from a TOML file, then `TERN__*` environment overrides.
///
/// An explicit `path` must exist; the default path is optional, so the
/// binary still runs with built-in defaults from any directory.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let file = match path {
        Some(path) => File::from(path).format(FileFormat::Toml).required(true),
        None => File::new(DEFAULT_CONFIG_PATH, FileFormat::Toml).required(false),
    };
    info!(path = %path.map_or(DEFAULT_CONFIG_PATH.into(), |p| p.display().to_string()), "Loading configuration");

    let builder = Config::builder().add_source(file).add_source(
        Environment::with_prefix("TERN")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );
    build(builder)
}

fn build(builder: ConfigBuilder<DefaultState>) -> Result<Settings> {
    let loaded = builder
        .build()
        .context("failed to read configuration")
        .and_then(|config| config.try_deserialize::<Settings>().context("failed to parse configuration"))
        .and_then(|settings| settings.validate().map(|()| settings));

    match loaded {
        Ok(settings) => {
            info!(mission = ?settings.mission, "Successfully loaded configuration");
            debug!(?settings);
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {e:#}");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tern_navigation::{FinalApproachReference, Rotation};

    fn from_toml(text: &str) -> Result<Settings> {
        build(Config::builder().add_source(File::from_str(text, FileFormat::Toml)))
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings = from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let settings = from_toml(
            r#"
            mission = "figure-eight"

            [exploration]
            obstacle_count = 2
            final_approach_reference = "segment"

            [primitives.shapes]
            direction = "clockwise"

            [simulation]
            time_step = 0.016
            max_ticks = 1000
            "#,
        )
        .unwrap();

        assert_eq!(settings.mission, Mission::FigureEight);
        assert_eq!(settings.exploration.obstacle_count, 2);
        assert_eq!(settings.exploration.final_approach_reference, FinalApproachReference::Segment);
        assert_eq!(settings.exploration.cruise_speed, ExplorationParams::default().cruise_speed);
        assert_eq!(settings.primitives.shapes.direction, Rotation::Clockwise);
        assert_eq!(settings.simulation.host.time_step, 0.016);
        assert_eq!(settings.simulation.max_ticks, Some(1000));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = from_toml("[exploration]\nobstacle_count = 0\n").unwrap_err();
        assert!(format!("{err:#}").contains("exploration"));

        let err = from_toml("[robot]\nwheel_radius = -1.0\n").unwrap_err();
        assert!(format!("{err:#}").contains("robot geometry"));
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let settings = load(Some(&path)).unwrap();
        assert_eq!(settings.mission, Mission::Explore);
        assert_eq!(settings.exploration.final_approach_reference, FinalApproachReference::Segment);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        assert!(load(Some(Path::new("does/not/exist.toml"))).is_err());
    }

    #[test]
    fn test_course_only_for_exploration() {
        let simulation = SimulationSettings::default();
        assert_eq!(simulation.world(Mission::Explore, 3).obstacles().len(), 3);
        assert!(simulation.world(Mission::Shapes, 3).obstacles().is_empty());
    }
}
