//! Draw lists, instanced batches and render composition.
//!
//! Drawing happens in two steps. During the update, scene objects push their
//! primitives onto a [`Frame`] through the [`Draw`] capability. The frame is
//! grouped by shared geometry and written into [`InstanceBatches`], one
//! instance buffer per geometry. During rendering the batches hand a
//! [`Render`] to the engine, which sorts it into the render pass.
//!
//! # Key types
//!
//! - [`Draw`] is implemented by everything that can be drawn
//! - [`Frame`] collects the primitives drawn this frame
//! - [`InstanceBatches`] owns the per-geometry instance buffers
//! - [`Render<'a, 'pass>`] is the primary enum describing render operations
//! - [`Instanced<'a>`] contains data for one instanced draw call
//!

use std::{collections::HashMap, sync::Arc};

use wgpu::RenderPass;

use crate::{
    context::Context,
    data_structures::{
        instance::InstanceRaw,
        model::{Geometry, GpuMesh, Primitive},
    },
};

/// Capability of a scene object to draw itself.
pub trait Draw {
    /// Push every primitive of `self` onto `frame`.
    fn draw<'a>(&'a self, frame: &mut Frame<'a>);
}

/// The primitives drawn during one frame, in draw order.
#[derive(Debug, Default)]
pub struct Frame<'a> {
    primitives: Vec<&'a Primitive>,
}

impl<'a> Frame<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, primitive: &'a Primitive) {
        self.primitives.push(primitive);
    }

    pub fn extend(&mut self, primitives: impl IntoIterator<Item = &'a Primitive>) {
        self.primitives.extend(primitives);
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    pub fn primitives(&self) -> &[&'a Primitive] {
        &self.primitives
    }

    /// Group the primitives by shared geometry, in order of first appearance.
    pub fn group(&self) -> Vec<(Arc<Geometry>, Vec<InstanceRaw>)> {
        let mut slots: HashMap<*const Geometry, usize> = HashMap::new();
        let mut groups: Vec<(Arc<Geometry>, Vec<InstanceRaw>)> = Vec::new();
        for primitive in &self.primitives {
            let key = Arc::as_ptr(&primitive.geometry);
            let slot = *slots.entry(key).or_insert_with(|| {
                groups.push((primitive.geometry.clone(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(InstanceRaw::from(&primitive.to_world));
        }
        groups
    }
}

/// Data for one instanced draw: the uploaded geometry and its instance buffer.
#[derive(Clone)]
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub mesh: &'a GpuMesh,
    pub amount: usize,
}

/// Specifies how a scene object should be rendered.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Default(Instanced)` renders a single opaque instanced object
/// - `Defaults(Vec<Instanced>)` renders a batch of opaque instanced objects
/// - `Composed(Vec<Render>)` recursively renders composition of multiple renders
/// - `Custom(...)` invokes a user-defined closure for custom rendering
///
pub enum Render<'a, 'pass>
where
    'pass: 'a,
{
    None,
    Default(Instanced<'a>),
    Defaults(Vec<Instanced<'a>>),
    Composed(Vec<Render<'a, 'pass>>),
    Custom(Box<dyn 'a + FnOnce(&Context, &mut wgpu::RenderPass<'pass>)>),
}

impl<'a, 'pass> Render<'a, 'pass> {
    pub(crate) fn set_pipelines(
        self,
        ctx: &Context,
        render_pass: &mut RenderPass<'pass>,
        basics: &mut Vec<Instanced<'a>>,
    ) {
        match self {
            Render::Default(instanced) => basics.push(instanced),
            Render::Defaults(mut vec) => basics.append(&mut vec),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(ctx, render_pass, basics)),
            Render::Custom(f) => f(ctx, render_pass),
            Render::None => (),
        }
    }
}

#[derive(Debug)]
struct Batch {
    geometry: Arc<Geometry>,
    buffer: wgpu::Buffer,
    capacity: usize,
    amount: usize,
}

impl Batch {
    fn new(device: &wgpu::Device, geometry: Arc<Geometry>, capacity: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{:?} Instance Buffer", geometry.name)),
            size: (capacity * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            geometry,
            buffer,
            capacity,
            amount: 0,
        }
    }
}

/// Per-geometry instance buffers, rewritten every frame.
///
/// Instance buffers grow to the largest count seen so far and are reused
/// afterwards, so a steady scene allocates nothing per frame.
#[derive(Debug, Default)]
pub struct InstanceBatches {
    batches: Vec<Batch>,
}

impl InstanceBatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload missing geometry and write this frame's instances.
    pub fn write(&mut self, ctx: &Context, frame: &Frame<'_>) {
        let mut previous: HashMap<*const Geometry, Batch> = self
            .batches
            .drain(..)
            .map(|batch| (Arc::as_ptr(&batch.geometry), batch))
            .collect();

        for (geometry, instances) in frame.group() {
            if geometry.indices.is_empty() {
                log::warn!("Skipping {} as it has no triangles", geometry.name);
                continue;
            }
            geometry.upload(&ctx.device, &ctx.material_layout);
            let mut batch = match previous.remove(&Arc::as_ptr(&geometry)) {
                Some(batch) if batch.capacity >= instances.len() => batch,
                _ => Batch::new(&ctx.device, geometry, instances.len().next_power_of_two()),
            };
            ctx.queue
                .write_buffer(&batch.buffer, 0, bytemuck::cast_slice(&instances));
            batch.amount = instances.len();
            self.batches.push(batch);
        }
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn render<'a, 'pass>(&'a self) -> Render<'a, 'pass> {
        Render::Defaults(
            self.batches
                .iter()
                .filter_map(|batch| {
                    Some(Instanced {
                        instance: &batch.buffer,
                        mesh: batch.geometry.gpu()?,
                        amount: batch.amount,
                    })
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Matrix4, Vector3};

    use super::*;
    use crate::data_structures::model::{Material, ModelVertex};

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

    #[test]
    fn frame_groups_primitives_by_shared_geometry() {
        let a = geometry("a");
        let b = geometry("b");
        let primitives = vec![
            Primitive::new(a.clone()),
            Primitive::new(b.clone()),
            Primitive::new(a.clone()),
        ];
        let mut frame = Frame::new();
        frame.extend(primitives.iter());

        let groups = frame.group();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.name, "a");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0.name, "b");
        assert_eq!(groups[1].1.len(), 1);
    }

    #[test]
    fn grouped_instances_carry_each_transform() {
        let a = geometry("a");
        let mut moved = Primitive::new(a.clone());
        moved.to_world = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        let primitives = vec![Primitive::new(a), moved];
        let mut frame = Frame::new();
        frame.extend(primitives.iter());

        let groups = frame.group();
        assert_eq!(groups[0].1[0].model[3], [0.0, -2.5, 0.0, 1.0]);
        assert_eq!(groups[0].1[1].model[3], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn empty_frame_has_no_groups() {
        let frame = Frame::new();
        assert!(frame.is_empty());
        assert!(frame.group().is_empty());
        assert!(InstanceBatches::new().is_empty());
    }
}
