use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::containment::ContainmentParams;
use crate::geom::{Body, Mesh, Pose};
use crate::vector::Vec3;

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn default_config_loads() {
        let settings = load_default_config().unwrap();
        assert_eq!(settings.grid.size, 10);
        assert_eq!(settings.grid.delta, 1.0);
        assert_eq!(settings.containment.ray_direction, Vec3::FORWARD);
        assert!(settings.containment.merge_coincident_crossings);
        assert!(!settings.bodies.is_empty());
    }

    #[test]
    fn cli_overrides_file_values() {
        let mut settings = load_default_config().unwrap();
        let args = CliArgs::parse_from([
            "meshvox",
            "--size",
            "16",
            "--delta",
            "0.5",
            "--half-extent",
            "2",
            "--ticks",
            "3",
            "--no-merge",
            "--output",
            "elsewhere",
        ]);
        apply_overrides(&mut settings, &args);
        assert_eq!(settings.grid.size, 16);
        assert_eq!(settings.grid.delta, 0.5);
        assert_eq!(settings.containment.half_extent, 2);
        assert_eq!(settings.sweep.ticks, 3);
        assert!(!settings.containment.merge_coincident_crossings);
        assert_eq!(settings.output_dir, "elsewhere");
        assert!(validate_config(&settings).is_ok());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let base = load_default_config().unwrap();

        let mut settings = base.clone();
        settings.grid.size = 0;
        assert!(validate_config(&settings).is_err());

        let mut settings = base.clone();
        settings.grid.delta = -1.0;
        assert!(validate_config(&settings).is_err());

        let mut settings = base.clone();
        settings.containment.ray_direction = Vec3::ZERO;
        assert!(validate_config(&settings).is_err());

        let mut settings = base;
        settings.containment.ray_length = 0.0;
        assert!(validate_config(&settings).is_err());
    }

    #[test]
    fn body_settings_parse_from_toml() {
        let text = r#"
            name = "marker"
            velocity = { x = 0.5, y = 0.0, z = 0.0 }

            [shape]
            type = "cube"
            half_extent = 0.5

            [pose]
            position = { x = 1.0, y = 2.0, z = 3.0 }
            rotation = [0.0, 0.0, 45.0]
        "#;
        let body: BodySettings = toml::from_str(text).unwrap();
        assert_eq!(body.shape, ShapeSource::Cube { half_extent: 0.5 });
        assert_eq!(body.pose.scale, Vec3::ONE);
        assert_eq!(body.velocity, Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(body.build().unwrap().mesh.num_triangles(), 12);
    }

    #[test]
    fn settings_dump_round_trips_through_toml() {
        let settings = load_default_config().unwrap();
        let text = settings.to_toml().unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }
}

/// Runtime configuration for the application.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    pub grid: GridSettings,
    pub containment: ContainmentParams,
    pub sweep: SweepSettings,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub bodies: Vec<BodySettings>,
}

fn default_output_dir() -> String {
    "output".to_string()
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct GridSettings {
    pub size: usize, // samples per axis
    pub delta: f32,  // spacing between samples
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct SweepSettings {
    pub ticks: usize,
}

/// Where a body's mesh comes from.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeSource {
    Cube { half_extent: f32 },
    Obj { path: String },
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BodySettings {
    pub name: String,
    pub shape: ShapeSource,
    #[serde(default)]
    pub pose: Pose,
    #[serde(default)]
    pub velocity: Vec3, // displacement per tick
}

impl BodySettings {
    /// Builds the body, loading its mesh from disk when needed.
    pub fn build(&self) -> Result<Body> {
        let mesh = match &self.shape {
            ShapeSource::Cube { half_extent } => Mesh::cube(*half_extent),
            ShapeSource::Obj { path } => Mesh::from_file(path)
                .with_context(|| format!("could not build body '{}'", self.name))?,
        };
        Ok(Body::new(&self.name, mesh, self.pose))
    }
}

impl Settings {
    /// The effective settings as TOML, for `--dump-config`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("could not serialise settings")
    }
}

/// Loads `config/default.toml` only, ignoring the environment and command line.
pub fn load_default_config() -> Result<Settings> {
    let root = retrieve_project_root()?;
    let default_config_file = root.join("config/default.toml");

    let config: Settings = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .context("error loading configuration")?
        .try_deserialize()
        .context("error deserializing configuration")?;

    validate_config(&config)?;

    Ok(config)
}

/// Loads the layered configuration, taking overrides from the process arguments.
pub fn load_config() -> Result<Settings> {
    load_config_with(&CliArgs::parse())
}

/// Loads the layered configuration: config file, then `MESHVOX_*` environment
/// variables, then command-line overrides.
pub fn load_config_with(args: &CliArgs) -> Result<Settings> {
    let root = retrieve_project_root()?;

    let default_config_file = root.join("config/default.toml");
    let local_config = root.join("config/local.toml");

    let config_file = if local_config.exists() {
        log::info!("using local configuration: {:?}", local_config);
        local_config
    } else {
        log::info!("using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let mut config: Settings = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(
            Environment::with_prefix("meshvox")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("error loading configuration")?
        .try_deserialize()
        .context("error deserializing configuration")?;

    apply_overrides(&mut config, args);
    validate_config(&config)?;

    log::debug!("{:#?}", config);

    Ok(config)
}

fn apply_overrides(config: &mut Settings, args: &CliArgs) {
    if let Some(size) = args.size {
        config.grid.size = size;
    }
    if let Some(delta) = args.delta {
        config.grid.delta = delta;
    }
    if let Some(half_extent) = args.half_extent {
        config.containment.half_extent = half_extent;
    }
    if let Some(ray_length) = args.ray_length {
        config.containment.ray_length = ray_length;
    }
    if args.no_merge {
        config.containment.merge_coincident_crossings = false;
    }
    if let Some(ticks) = args.ticks {
        config.sweep.ticks = ticks;
    }
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the MESHVOX_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its
///    parents, use it.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("MESHVOX_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }

    let exe_path = env::current_exe().context("failed to get current executable path")?;
    exe_path
        .ancestors()
        .skip(1)
        .find(|dir| dir.join("config").is_dir())
        .map(Path::to_path_buf)
        .context("could not find project root directory")
}

fn validate_config(config: &Settings) -> Result<()> {
    if config.grid.size == 0 {
        bail!("grid size must be at least 1");
    }
    if !(config.grid.delta.is_finite() && config.grid.delta > 0.0) {
        bail!("grid delta must be greater than 0, got {}", config.grid.delta);
    }
    let containment = &config.containment;
    if containment.half_extent == 0 {
        bail!("containment half extent must be at least 1");
    }
    let direction = containment.ray_direction;
    if !direction.is_finite() || direction.try_normalize().is_none() {
        bail!("ray direction must be a non-zero vector");
    }
    if !(containment.ray_length.is_finite() && containment.ray_length > 0.0) {
        bail!("ray length must be greater than 0, got {}", containment.ray_length);
    }
    for body in &config.bodies {
        if !body.pose.scale.is_finite() || !body.velocity.is_finite() {
            bail!("body '{}' has a non-finite scale or velocity", body.name);
        }
    }
    Ok(())
}

#[derive(Parser, Debug, Default)]
#[command(version, about = "meshvox - voxel-sampled mesh containment and collision")]
pub struct CliArgs {
    /// Number of grid samples along each axis.
    #[arg(long)]
    pub size: Option<usize>,

    /// Spacing between neighbouring grid samples, in world units.
    #[arg(long)]
    pub delta: Option<f32>,

    /// Half-width of the candidate window at unit scale, in voxels.
    #[arg(long)]
    pub half_extent: Option<u32>,

    /// Length of the parity ray. Must exceed the largest mesh extent.
    #[arg(long)]
    pub ray_length: Option<f32>,

    /// Count every bounded plane hit, even when several land on a shared edge.
    #[arg(long)]
    pub no_merge: bool,

    /// Number of ticks to simulate.
    #[arg(short, long)]
    pub ticks: Option<usize>,

    /// Directory for the inside-point files and the tick report.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    pub dump_config: bool,
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Grid: {} samples per axis, delta {:.6}
  - Window Half Extent: {}
  - Ray: {} (length {:.3})
  - Merge Coincident Crossings: {}
  - Ticks: {}
  - Bodies: {}
  ",
            self.grid.size,
            self.grid.delta,
            self.containment.half_extent,
            self.containment.ray_direction,
            self.containment.ray_length,
            self.containment.merge_coincident_crossings,
            self.sweep.ticks,
            self.bodies.len(),
        )
    }
}
