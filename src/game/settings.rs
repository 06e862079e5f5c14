use std::{ops::RangeInclusive, path::PathBuf};

use instant::Duration;

use crate::resources::asset_root;

/// Random ranges a freshly spawned molecule draws from.
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeSettings {
    /// Upward speed in world units per update.
    pub velocity: RangeInclusive<f32>,
    /// Degrees per update.
    pub spin_speed: RangeInclusive<f32>,
    /// Range of each spin axis component. The axis is not normalized.
    pub spin_axis: RangeInclusive<f32>,
    /// Range of each component of a random position offset.
    pub position: RangeInclusive<f32>,
    /// Molecules bounce once their centroid is further away from `bounds_origin`.
    pub bounds_distance: f32,
    pub bounds_origin: [f32; 3],
}

impl Default for MoleculeSettings {
    fn default() -> Self {
        Self {
            velocity: 0.05..=0.5,
            spin_speed: 0.5..=8.0,
            spin_axis: 0.0..=1.0,
            position: -50.0..=50.0,
            bounds_distance: 5.0,
            bounds_origin: [0.0; 3],
        }
    }
}

/// Everything the factory scene can be tuned with.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    pub factory_model: PathBuf,
    pub co2_model: PathBuf,
    pub o2_model: PathBuf,
    /// Molecules (and CO2 counter value) at start and after a restart.
    pub initial_molecules: u32,
    /// The counter may grow up to this value before the game is lost.
    pub max_molecules: i32,
    pub emit_interval: Duration,
    /// Molecules released all at once when the game is lost.
    pub molecules_on_lose: u32,
    /// Extra scale applied to the molecule templates once, when they are loaded.
    pub template_scale: f32,
    pub molecule: MoleculeSettings,
    pub won_clear_colour: wgpu::Color,
    pub default_clear_colour: wgpu::Color,
}

impl GameSettings {
    /// Default settings with asset paths under `root`.
    pub fn with_asset_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            factory_model: root.join("factory").join("factory.obj"),
            co2_model: root.join("co2").join("co2.obj"),
            o2_model: root.join("o2").join("o2.obj"),
            initial_molecules: 5,
            max_molecules: 10,
            emit_interval: Duration::from_secs(1),
            molecules_on_lose: 50,
            template_scale: 0.5,
            molecule: MoleculeSettings::default(),
            won_clear_colour: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 1.0,
                a: 1.0,
            },
            default_clear_colour: wgpu::Color::BLACK,
        }
    }

    /// Default settings with the asset root taken from the environment.
    pub fn from_env() -> Self {
        Self::with_asset_root(asset_root())
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::from_env()
    }
}
