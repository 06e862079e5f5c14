//! The CO2 factory scene.
//!
//! - [`settings::GameSettings`] carries every tunable of the game
//! - [`templates::MoleculeTemplates`] holds the molecule geometry loaded once per scene
//! - [`molecule::Molecule`] is one spinning, drifting molecule
//! - [`factory::Factory`] is the scene controller with the win/lose rules
//! - [`flow::FactoryFlow`] plugs the factory into the engine's event loop

pub mod factory;
pub mod flow;
pub mod molecule;
pub mod settings;
pub mod templates;

pub use factory::{Factory, GameState, UpdateOutcome};
pub use flow::FactoryFlow;
pub use molecule::Molecule;
pub use settings::{GameSettings, MoleculeSettings};
pub use templates::{MoleculeTemplates, TemplateSlot};
