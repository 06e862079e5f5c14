use std::sync::Arc;

use co2_factory::{
    Matrix4,
    data_structures::model::{Geometry, Material, Model, ModelVertex, Primitive},
    game::{Factory, GameSettings, MoleculeTemplates},
};
use instant::Duration;
use rand::{SeedableRng, rngs::StdRng};

pub const TICK: Duration = Duration::from_secs(1);

pub fn asset_root() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/assets")
}

pub fn geometry(name: &str) -> Arc<Geometry> {
    let vertex = ModelVertex {
        position: [0.0; 3],
        tex_coords: [0.0; 2],
        normal: [0.0, 1.0, 0.0],
    };
    Arc::new(Geometry::new(
        name,
        vec![vertex; 3],
        vec![0, 1, 2],
        Material::default(),
    ))
}

/// A model of `count` primitives sitting exactly at the world origin.
pub fn model_at_origin(name: &str, count: usize) -> Model {
    let geometry = geometry(name);
    Model::new(
        (0..count)
            .map(|_| Primitive {
                geometry: geometry.clone(),
                to_world: Matrix4::from_scale(1.0),
            })
            .collect(),
    )
}

/// Templates without the default transform and without extra scaling, so
/// molecule positions are plain world coordinates.
pub fn templates() -> Arc<MoleculeTemplates> {
    Arc::new(MoleculeTemplates::new(
        model_at_origin("co2", 3),
        model_at_origin("o2", 2),
        1.0,
    ))
}

pub fn factory(seed: u64) -> Factory<StdRng> {
    Factory::new(
        GameSettings::with_asset_root(asset_root()),
        model_at_origin("factory", 1),
        templates(),
        StdRng::seed_from_u64(seed),
    )
}
