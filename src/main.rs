use co2_factory::{
    flow,
    game::{FactoryFlow, GameSettings},
};

fn main() -> anyhow::Result<()> {
    let settings = GameSettings::from_env();
    flow::run::<()>(vec![FactoryFlow::constructor(settings)])
}
