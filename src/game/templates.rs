use std::sync::Arc;

use cgmath::Matrix4;

use crate::{
    data_structures::model::{Model, Primitive},
    error::SceneError,
};

/// The molecule geometry every molecule of a scene is built from.
///
/// Loaded once per scene. Molecules clone the primitives, which shares the
/// geometry and only copies the transforms.
#[derive(Debug)]
pub struct MoleculeTemplates {
    co2: Vec<Primitive>,
    o2: Model,
}

impl MoleculeTemplates {
    /// Build the templates, scaling the CO2 primitives down by `co2_scale` once.
    pub fn new(co2: Model, o2: Model, co2_scale: f32) -> Self {
        let co2 = co2
            .primitives
            .into_iter()
            .map(|mut primitive| {
                primitive.to_world = primitive.to_world * Matrix4::from_scale(co2_scale);
                primitive
            })
            .collect();
        Self { co2, o2 }
    }

    pub fn co2(&self) -> &[Primitive] {
        &self.co2
    }

    pub fn o2(&self) -> &Model {
        &self.o2
    }

    /// Upload all template geometry ahead of the first draw.
    pub fn upload(&self, device: &wgpu::Device, material_layout: &wgpu::BindGroupLayout) {
        self.co2
            .iter()
            .chain(self.o2.primitives.iter())
            .filter(|primitive| !primitive.geometry.indices.is_empty())
            .for_each(|primitive| {
                primitive.geometry.upload(device, material_layout);
            });
    }
}

/// Holds the templates of one scene and refuses to load them twice.
#[derive(Debug, Default)]
pub struct TemplateSlot {
    templates: Option<Arc<MoleculeTemplates>>,
}

impl TemplateSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store freshly loaded templates.
    ///
    /// Fails with [`SceneError::TemplatesAlreadyLoaded`] if the slot is
    /// already filled; the stored templates stay untouched.
    pub fn init(
        &mut self,
        templates: MoleculeTemplates,
    ) -> Result<Arc<MoleculeTemplates>, SceneError> {
        if self.templates.is_some() {
            log::warn!("Attempted to load the molecule templates a second time");
            return Err(SceneError::TemplatesAlreadyLoaded);
        }
        let templates = Arc::new(templates);
        self.templates = Some(templates.clone());
        Ok(templates)
    }

    pub fn get(&self) -> Option<Arc<MoleculeTemplates>> {
        self.templates.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.templates.is_some()
    }

    /// Empty the slot. The geometry is freed once the last molecule using it is gone.
    pub fn release(&mut self) -> Option<Arc<MoleculeTemplates>> {
        self.templates.take()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;
    use crate::data_structures::model::{Geometry, Material, ModelVertex};

    fn model(name: &str) -> Model {
        let vertex = ModelVertex {
            position: [0.0; 3],
            tex_coords: [0.0; 2],
            normal: [0.0, 1.0, 0.0],
        };
        Model::from_geometries(
            vec![Geometry::new(
                name,
                vec![vertex; 3],
                vec![0, 1, 2],
                Material::default(),
            )],
            None,
        )
    }

    #[test]
    fn second_init_is_an_error() {
        let mut slot = TemplateSlot::new();
        let first = slot
            .init(MoleculeTemplates::new(model("co2"), model("o2"), 0.5))
            .unwrap();
        let second = slot.init(MoleculeTemplates::new(model("co2"), model("o2"), 0.5));
        assert!(matches!(second, Err(SceneError::TemplatesAlreadyLoaded)));
        assert!(Arc::ptr_eq(&first, &slot.get().unwrap()));
    }

    #[test]
    fn release_allows_loading_again() {
        let mut slot = TemplateSlot::new();
        slot.init(MoleculeTemplates::new(model("co2"), model("o2"), 0.5))
            .unwrap();
        assert!(slot.release().is_some());
        assert!(!slot.is_loaded());
        assert!(
            slot.init(MoleculeTemplates::new(model("co2"), model("o2"), 0.5))
                .is_ok()
        );
    }

    #[test]
    fn only_co2_is_scaled() {
        let templates = MoleculeTemplates::new(model("co2"), model("o2"), 0.5);
        // default transform is scale(0.5) * translate(0, -5, 0); the extra scale keeps the origin
        assert_eq!(templates.co2()[0].origin(), Vector3::new(0.0, -2.5, 0.0));
        assert_eq!(templates.co2()[0].to_world.x.x, 0.25);
        assert_eq!(templates.o2().primitives[0].to_world.x.x, 0.5);
    }
}
