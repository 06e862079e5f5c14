use std::sync::Arc;

use instant::Duration;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    data_structures::model::Model,
    error::SceneError,
    game::{
        molecule::Molecule,
        settings::GameSettings,
        templates::{MoleculeTemplates, TemplateSlot},
    },
    render::{Draw, Frame},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    InProgress,
    Won,
    Lost,
}

/// What a single [`Factory::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No rule applied.
    Idle,
    /// The molecules moved, no new one was emitted.
    Advanced,
    /// A molecule was emitted and all molecules moved.
    Spawned,
    /// The CO2 counter dropped to zero.
    Won,
    /// The counter went past the maximum and the sky filled with molecules.
    Lost,
}

/// The scene controller: the factory building and the molecules it emits.
///
/// Time is fed in through [`Factory::update`], so the rules can be driven
/// with simulated time.
#[derive(Debug)]
pub struct Factory<R = StdRng> {
    settings: GameSettings,
    building: Model,
    templates: Arc<MoleculeTemplates>,
    molecules: Vec<Molecule>,
    co2_count: i32,
    since_last_emit: Duration,
    state: GameState,
    rng: R,
}

impl Factory<StdRng> {
    /// Load the building and molecule templates from the asset paths in `settings`.
    ///
    /// A missing building only logs an error and leaves the factory invisible.
    /// Failing to load the molecule templates is an error. Templates already
    /// held by `slot` are reused.
    pub async fn load(settings: GameSettings, slot: &mut TemplateSlot) -> Result<Self, SceneError> {
        let building = Model::load_or_empty(&settings.factory_model).await;
        let templates = match slot.get() {
            Some(templates) => templates,
            None => {
                let co2 = Model::load(&settings.co2_model).await?;
                let o2 = Model::load(&settings.o2_model).await?;
                slot.init(MoleculeTemplates::new(co2, o2, settings.template_scale))?
            }
        };
        Ok(Self::new(settings, building, templates, StdRng::from_entropy()))
    }
}

impl<R: Rng> Factory<R> {
    pub fn new(
        settings: GameSettings,
        building: Model,
        templates: Arc<MoleculeTemplates>,
        rng: R,
    ) -> Self {
        let mut factory = Self {
            co2_count: settings.initial_molecules as i32,
            settings,
            building,
            templates,
            molecules: Vec::new(),
            since_last_emit: Duration::ZERO,
            state: GameState::InProgress,
            rng,
        };
        factory.spawn_initial();
        log::info!("Factory ready with {} molecules", factory.molecules.len());
        factory
    }

    fn spawn_initial(&mut self) {
        for _ in 0..self.settings.initial_molecules {
            self.spawn();
        }
    }

    fn spawn(&mut self) {
        let molecule = Molecule::spawn(&self.templates, &self.settings.molecule, &mut self.rng);
        self.molecules.push(molecule);
    }

    /// Advance the game by `dt`.
    ///
    /// The rules are checked in order and the first one that applies wins:
    /// 1. not won and the counter is at or below zero: the game is won
    /// 2. not won and the counter is at most the maximum: emit a molecule once
    ///    per interval, then move every molecule
    /// 3. neither won nor lost: the game is lost and a burst of molecules is
    ///    released at random positions
    pub fn update(&mut self, dt: Duration) -> UpdateOutcome {
        self.since_last_emit += dt;
        let won = self.state == GameState::Won;

        if !won && self.co2_count <= 0 {
            self.state = GameState::Won;
            log::info!("*************** YOU WIN!!!! *****************");
            return UpdateOutcome::Won;
        }

        if !won && self.co2_count <= self.settings.max_molecules {
            let mut outcome = UpdateOutcome::Advanced;
            if self.since_last_emit >= self.settings.emit_interval {
                self.spawn();
                self.co2_count += 1;
                self.since_last_emit = Duration::ZERO;
                outcome = UpdateOutcome::Spawned;
            }
            for molecule in &mut self.molecules {
                molecule.update();
            }
            return outcome;
        }

        if self.state == GameState::InProgress {
            let range = self.settings.molecule.position.clone();
            for _ in 0..self.settings.molecules_on_lose {
                let mut molecule =
                    Molecule::spawn(&self.templates, &self.settings.molecule, &mut self.rng);
                molecule.randomize_position(range.clone(), &mut self.rng);
                self.molecules.push(molecule);
            }
            self.state = GameState::Lost;
            log::info!("*************** YOU LOSE!!!! *****************");
            return UpdateOutcome::Lost;
        }

        UpdateOutcome::Idle
    }

    /// Start over with the initial molecules.
    pub fn restart(&mut self) {
        log::info!("Restarting game...");
        self.molecules.clear();
        self.co2_count = self.settings.initial_molecules as i32;
        self.state = GameState::InProgress;
        self.since_last_emit = Duration::ZERO;
        self.spawn_initial();
    }

    /// Turn the molecule at `index` into O2. Returns `false` if there is none.
    pub fn make_o2(&mut self, index: usize) -> bool {
        match self.molecules.get_mut(index) {
            Some(molecule) => {
                molecule.make_o2(&self.templates);
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn co2_count(&self) -> i32 {
        self.co2_count
    }

    /// Override the CO2 counter. The update rules never lower it by themselves.
    pub fn set_co2_count(&mut self, count: i32) {
        self.co2_count = count;
    }

    pub fn molecules(&self) -> &[Molecule] {
        &self.molecules
    }

    pub fn building(&self) -> &Model {
        &self.building
    }

    pub fn templates(&self) -> &Arc<MoleculeTemplates> {
        &self.templates
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }
}

impl<R> Draw for Factory<R> {
    fn draw<'a>(&'a self, frame: &mut Frame<'a>) {
        self.building.draw(frame);
        for molecule in &self.molecules {
            molecule.draw(frame);
        }
    }
}
