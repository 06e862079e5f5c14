use std::ops::RangeInclusive;

use cgmath::{Deg, InnerSpace, Matrix4, Vector3};
use rand::Rng;

use crate::{
    data_structures::model::Model,
    game::{settings::MoleculeSettings, templates::MoleculeTemplates},
    render::{Draw, Frame},
};

/// One molecule drifting up and down in front of the factory while it spins.
#[derive(Debug, Clone)]
pub struct Molecule {
    model: Model,
    velocity: f32,
    /// Not normalized; normalized where the rotation is built.
    spin_axis: Vector3<f32>,
    /// Degrees per update.
    spin_speed: f32,
    bounds_origin: Vector3<f32>,
    bounds_distance: f32,
    is_o2: bool,
}

impl Molecule {
    /// A new CO2 molecule with random velocity and spin.
    pub fn spawn<R: Rng>(
        templates: &MoleculeTemplates,
        settings: &MoleculeSettings,
        rng: &mut R,
    ) -> Self {
        let spin_speed = rng.gen_range(settings.spin_speed.clone());
        let spin_axis = Vector3::new(
            rng.gen_range(settings.spin_axis.clone()),
            rng.gen_range(settings.spin_axis.clone()),
            rng.gen_range(settings.spin_axis.clone()),
        );
        let velocity = rng.gen_range(settings.velocity.clone());
        log::debug!(
            "Spawned CO2: spin speed {spin_speed}, velocity {velocity}, axis ({}, {}, {})",
            spin_axis.x,
            spin_axis.y,
            spin_axis.z
        );
        Self {
            model: Model::new(templates.co2().to_vec()),
            velocity,
            spin_axis,
            spin_speed,
            bounds_origin: settings.bounds_origin.into(),
            bounds_distance: settings.bounds_distance,
            is_o2: false,
        }
    }

    /// Move every primitive by `velocity` along its local y axis, then spin it.
    ///
    /// Returns whether the molecule bounced, i.e. its centroid is out of bounds
    /// and the velocity was negated. This repeats on every update until the
    /// molecule is back inside.
    pub fn update(&mut self) -> bool {
        let translation = Matrix4::from_translation(Vector3::new(0.0, self.velocity, 0.0));
        let rotation = self.rotation();
        for primitive in &mut self.model.primitives {
            primitive.to_world = primitive.to_world * translation;
            if let Some(rotation) = rotation {
                primitive.to_world = primitive.to_world * rotation;
            }
        }

        let out_of_bounds = self
            .centroid()
            .is_some_and(|center| (center - self.bounds_origin).magnitude() > self.bounds_distance);
        if out_of_bounds {
            self.velocity = -self.velocity;
        }
        out_of_bounds
    }

    fn rotation(&self) -> Option<Matrix4<f32>> {
        if self.spin_axis.magnitude2() == 0.0 {
            return None;
        }
        Some(Matrix4::from_axis_angle(
            self.spin_axis.normalize(),
            Deg(self.spin_speed),
        ))
    }

    /// Shift the molecule by a random offset drawn per component from `range`.
    ///
    /// The offset is applied in local space on top of the current transform.
    pub fn randomize_position<R: Rng>(
        &mut self,
        range: RangeInclusive<f32>,
        rng: &mut R,
    ) -> Vector3<f32> {
        let offset = Vector3::new(
            rng.gen_range(range.clone()),
            rng.gen_range(range.clone()),
            rng.gen_range(range),
        );
        let translation = Matrix4::from_translation(offset);
        for primitive in &mut self.model.primitives {
            primitive.to_world = primitive.to_world * translation;
        }
        offset
    }

    /// Swap the CO2 geometry for O2 while keeping the current transforms.
    ///
    /// Transforms are kept index by index; O2 primitives without a CO2
    /// counterpart keep the template transform.
    pub fn make_o2(&mut self, templates: &MoleculeTemplates) {
        let old = std::mem::take(&mut self.model.primitives);
        self.model.primitives = templates
            .o2()
            .primitives
            .iter()
            .enumerate()
            .map(|(i, template)| {
                let mut primitive = template.clone();
                if let Some(previous) = old.get(i) {
                    primitive.to_world = previous.to_world;
                }
                primitive
            })
            .collect();
        self.is_o2 = true;
    }

    /// Mean world-space origin of all primitives.
    pub fn centroid(&self) -> Option<Vector3<f32>> {
        let primitives = &self.model.primitives;
        if primitives.is_empty() {
            return None;
        }
        let sum = primitives
            .iter()
            .fold(Vector3::new(0.0, 0.0, 0.0), |sum, p| sum + p.origin());
        Some(sum / primitives.len() as f32)
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn spin_axis(&self) -> Vector3<f32> {
        self.spin_axis
    }

    pub fn spin_speed(&self) -> f32 {
        self.spin_speed
    }

    pub fn is_o2(&self) -> bool {
        self.is_o2
    }
}

impl Draw for Molecule {
    fn draw<'a>(&'a self, frame: &mut Frame<'a>) {
        self.model.draw(frame);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::data_structures::model::{Geometry, Material, ModelVertex, Primitive};

    fn geometry(name: &str) -> Arc<Geometry> {
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

    /// CO2 with three primitives at the origin, O2 with two.
    fn templates() -> MoleculeTemplates {
        let at_origin = |g: &Arc<Geometry>| {
            let mut p = Primitive::new(g.clone());
            p.to_world = Matrix4::from_scale(1.0);
            p
        };
        let (o, c) = (geometry("oxygen"), geometry("carbon"));
        let co2 = Model::new(vec![at_origin(&o), at_origin(&c), at_origin(&o)]);
        let o2_geometry = geometry("o2");
        let o2 = Model::new(vec![
            Primitive::new(o2_geometry.clone()),
            Primitive::new(o2_geometry),
        ]);
        MoleculeTemplates::new(co2, o2, 1.0)
    }

    fn molecule(velocity: f32, spin_axis: Vector3<f32>) -> Molecule {
        let settings = MoleculeSettings {
            velocity: velocity..=velocity,
            spin_axis: 0.0..=0.0,
            ..Default::default()
        };
        let mut molecule = Molecule::spawn(&templates(), &settings, &mut StdRng::seed_from_u64(1));
        molecule.spin_axis = spin_axis;
        molecule
    }

    #[test]
    fn spawn_draws_values_from_the_configured_ranges() {
        let settings = MoleculeSettings::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let molecule = Molecule::spawn(&templates(), &settings, &mut rng);
            assert!(settings.velocity.contains(&molecule.velocity()));
            assert!(settings.spin_speed.contains(&molecule.spin_speed()));
            let axis = molecule.spin_axis();
            for component in [axis.x, axis.y, axis.z] {
                assert!(settings.spin_axis.contains(&component));
            }
            assert_eq!(molecule.model().primitives.len(), 3);
        }
    }

    #[test]
    fn update_moves_along_local_y() {
        let mut molecule = molecule(0.5, Vector3::new(0.0, 0.0, 0.0));
        assert!(!molecule.update());
        assert_eq!(molecule.centroid(), Some(Vector3::new(0.0, 0.5, 0.0)));
    }

    #[test]
    fn bounce_flips_velocity_every_update_while_outside() {
        let mut molecule = molecule(0.5, Vector3::new(0.0, 0.0, 0.0));
        for _ in 0..10 {
            assert!(!molecule.update());
        }
        // centroid at y = 5.0 is still inside, the next step leaves the bounds
        assert!(molecule.update());
        assert_eq!(molecule.velocity(), -0.5);
        // back to 5.0, inside again
        assert!(!molecule.update());

        // force the molecule far outside: it now flips on every update
        molecule.randomize_position(20.0..=20.0, &mut StdRng::seed_from_u64(3));
        let first = molecule.velocity();
        assert!(molecule.update());
        assert_eq!(molecule.velocity(), -first);
        assert!(molecule.update());
        assert_eq!(molecule.velocity(), first);
    }

    #[test]
    fn unnormalized_spin_axis_rotates_by_spin_speed() {
        let mut molecule = molecule(0.0, Vector3::new(0.0, 0.0, 2.0));
        molecule.spin_speed = 90.0;
        molecule.update();
        let x_axis = molecule.model().primitives[0].to_world.x.truncate();
        assert!((x_axis - Vector3::new(0.0, 1.0, 0.0)).magnitude() < 1e-5);
        // the stored axis is left as is
        assert_eq!(molecule.spin_axis(), Vector3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn randomize_position_is_additive() {
        let mut molecule = molecule(0.0, Vector3::new(0.0, 0.0, 0.0));
        let mut rng = StdRng::seed_from_u64(11);
        let first = molecule.randomize_position(-50.0..=50.0, &mut rng);
        let second = molecule.randomize_position(-50.0..=50.0, &mut rng);
        let centroid = molecule.centroid().unwrap();
        assert!((centroid - (first + second)).magnitude() < 1e-4);
    }

    #[test]
    fn randomize_position_is_roughly_uniform() {
        let mut molecule = molecule(0.0, Vector3::new(0.0, 0.0, 0.0));
        let mut rng = StdRng::seed_from_u64(42);
        let mut buckets = [0usize; 10];
        let samples = 10_000;
        for _ in 0..samples {
            let offset = molecule.randomize_position(-50.0..=50.0, &mut rng);
            for component in [offset.x, offset.y, offset.z] {
                assert!((-50.0..=50.0).contains(&component));
                let bucket = (((component + 50.0) / 10.0) as usize).min(9);
                buckets[bucket] += 1;
            }
        }
        let expected = samples * 3 / buckets.len();
        for count in buckets {
            assert!(count.abs_diff(expected) < expected / 10, "{buckets:?}");
        }
    }

    #[test]
    fn make_o2_keeps_transforms_by_index() {
        let templates = templates();
        let mut molecule = molecule(1.0, Vector3::new(0.0, 0.0, 0.0));
        molecule.update();
        let before: Vec<_> = molecule
            .model()
            .primitives
            .iter()
            .map(|p| p.to_world)
            .collect();

        molecule.make_o2(&templates);
        let after = &molecule.model().primitives;
        assert!(molecule.is_o2());
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].to_world, before[0]);
        assert_eq!(after[1].to_world, before[1]);
        assert_eq!(after[0].geometry.name, "o2");
    }

    #[test]
    fn empty_molecule_has_no_centroid_and_never_bounces() {
        let empty = MoleculeTemplates::new(Model::default(), Model::default(), 1.0);
        let mut molecule = Molecule::spawn(
            &empty,
            &MoleculeSettings::default(),
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(molecule.centroid(), None);
        assert!(!molecule.update());
    }
}
