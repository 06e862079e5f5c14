//! Geometry, flat materials, primitives and models.
//!
//! A [`Geometry`] is the immutable part of a mesh: vertices, triangle indices
//! and a flat material. It is loaded once and shared behind an [`Arc`]. A
//! [`Primitive`] pairs a shared geometry with its own local-to-world transform,
//! so many molecules can reuse one loaded template while moving independently.
//! A [`Model`] is the ordered list of primitives produced from one asset file.
//!
//! GPU resources for a geometry are created lazily on the first draw and then
//! reused for every later frame (see [`Geometry::upload`]).

use std::{
    ops::Range,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use cgmath::{InnerSpace, Matrix4, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    error::LoadError,
    render::{Draw, Frame},
    resources,
};

/// Describes how a vertex type is laid out in a vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Flat Phong material: one colour per lighting term and a specular exponent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: Vector3<f32>,
    pub diffuse: Vector3<f32>,
    pub specular: Vector3<f32>,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vector3::new(0.1, 0.1, 0.1),
            diffuse: Vector3::new(0.6, 0.6, 0.6),
            specular: Vector3::new(0.0, 0.0, 0.0),
            shininess: 1.0,
        }
    }
}

/**
 * The material as it is laid out in the `material` uniform of the shader.
 *
 * WGSL aligns every `vec3<f32>` to 16 bytes, so `shininess` fits into the
 * padding after `specular`.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    ambient: [f32; 3],
    _padding: f32,
    diffuse: [f32; 3],
    _padding2: f32,
    specular: [f32; 3],
    shininess: f32,
}

impl From<&Material> for MaterialUniform {
    fn from(material: &Material) -> Self {
        Self {
            ambient: material.ambient.into(),
            _padding: 0.0,
            diffuse: material.diffuse.into(),
            _padding2: 0.0,
            specular: material.specular.into(),
            shininess: material.shininess,
        }
    }
}

/// GPU side of a [`Geometry`]: vertex/index buffers and the material bind group.
#[derive(Debug)]
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    #[allow(unused)]
    pub material_buffer: wgpu::Buffer,
    pub material_bind_group: wgpu::BindGroup,
}

/// Immutable triangle mesh data with a flat material.
#[derive(Debug)]
pub struct Geometry {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: Material,
    gpu: OnceLock<GpuMesh>,
}

impl Geometry {
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<ModelVertex>,
        indices: Vec<u32>,
        material: Material,
    ) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            material,
            gpu: OnceLock::new(),
        }
    }

    /// Upload the geometry to the GPU, or return the buffers of an earlier upload.
    ///
    /// Buffers are created exactly once per geometry no matter how many
    /// primitives share it or how often it is drawn.
    pub fn upload(&self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> &GpuMesh {
        self.gpu.get_or_init(|| {
            log::debug!(
                "Uploading {} ({} vertices, {} indices)",
                self.name,
                self.vertices.len(),
                self.indices.len()
            );
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Vertex Buffer", self.name)),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", self.name)),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Material Buffer", self.name)),
                contents: bytemuck::cast_slice(&[MaterialUniform::from(&self.material)]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: material_buffer.as_entire_binding(),
                }],
                label: Some(&format!("{:?} Material Bind Group", self.name)),
            });
            GpuMesh {
                vertex_buffer,
                index_buffer,
                num_elements: self.indices.len() as u32,
                material_buffer,
                material_bind_group,
            }
        })
    }

    /// The GPU buffers, if [`Geometry::upload`] already ran.
    pub fn gpu(&self) -> Option<&GpuMesh> {
        self.gpu.get()
    }

    pub fn is_uploaded(&self) -> bool {
        self.gpu.get().is_some()
    }

    /// Replace missing normals by the area-weighted average of the adjacent face normals.
    pub fn generate_normals(vertices: &mut [ModelVertex], indices: &[u32]) {
        let mut normals = vec![Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];
        for c in indices.chunks_exact(3) {
            let (i0, i1, i2) = (c[0] as usize, c[1] as usize, c[2] as usize);
            if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
                continue;
            }
            let pos0: Vector3<f32> = vertices[i0].position.into();
            let pos1: Vector3<f32> = vertices[i1].position.into();
            let pos2: Vector3<f32> = vertices[i2].position.into();
            // Not normalized: larger faces weigh more.
            let face = (pos1 - pos0).cross(pos2 - pos0);
            normals[i0] += face;
            normals[i1] += face;
            normals[i2] += face;
        }
        for (vertex, normal) in vertices.iter_mut().zip(normals) {
            if normal.magnitude2() > 0.0 {
                vertex.normal = normal.normalize().into();
            }
        }
    }
}

/// One drawable mesh: a shared geometry plus its own local-to-world transform.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub geometry: Arc<Geometry>,
    pub to_world: Matrix4<f32>,
}

impl Primitive {
    /// Every freshly imported mesh starts half-sized and five units below its origin.
    pub fn default_transform() -> Matrix4<f32> {
        Matrix4::from_scale(0.5) * Matrix4::from_translation(Vector3::new(0.0, -5.0, 0.0))
    }

    pub fn new(geometry: Arc<Geometry>) -> Self {
        Self {
            geometry,
            to_world: Self::default_transform(),
        }
    }

    /// The primitive's origin in world space.
    pub fn origin(&self) -> Vector3<f32> {
        self.to_world.w.truncate()
    }
}

/// An ordered list of primitives loaded from one asset file.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub primitives: Vec<Primitive>,
    /// Directory of the asset file; material libraries are resolved against it.
    pub directory: Option<PathBuf>,
}

impl Model {
    pub fn new(primitives: Vec<Primitive>) -> Self {
        Self {
            primitives,
            directory: None,
        }
    }

    pub fn from_geometries(geometries: Vec<Geometry>, directory: Option<PathBuf>) -> Self {
        let primitives = geometries
            .into_iter()
            .map(|geometry| Primitive::new(Arc::new(geometry)))
            .collect();
        Self {
            primitives,
            directory,
        }
    }

    /// Import a model file. The format is picked by extension (`obj`, `gltf`, `glb`).
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        resources::load_model(path).await
    }

    /// Import a model file, falling back to a model without primitives on failure.
    ///
    /// The error is logged; the returned model simply renders nothing.
    pub async fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path).await {
            Ok(model) => model,
            Err(e) => {
                log::error!("Could not load model {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Scale every primitive around its own local origin.
    pub fn scale(&mut self, factor: f32) {
        for primitive in &mut self.primitives {
            primitive.to_world = primitive.to_world * Matrix4::from_scale(factor);
        }
    }
}

impl Draw for Model {
    fn draw<'a>(&'a self, frame: &mut Frame<'a>) {
        frame.extend(self.primitives.iter());
    }
}

pub trait DrawModel<'a> {
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'a GpuMesh,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh_instanced(
        &mut self,
        mesh: &'b GpuMesh,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &mesh.material_bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Geometry {
        let vertex = |x: f32, y: f32| ModelVertex {
            position: [x, y, 0.0],
            tex_coords: [0.0, 0.0],
            normal: [0.0, 0.0, 0.0],
        };
        Geometry::new(
            "triangle",
            vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(0.0, 1.0)],
            vec![0, 1, 2],
            Material::default(),
        )
    }

    #[test]
    fn new_primitive_sits_below_origin_at_half_scale() {
        let primitive = Primitive::new(Arc::new(triangle()));
        assert_eq!(primitive.origin(), Vector3::new(0.0, -2.5, 0.0));
        assert_eq!(primitive.to_world.x.x, 0.5);
    }

    #[test]
    fn scaling_a_model_keeps_primitive_origins() {
        let mut model = Model::from_geometries(vec![triangle(), triangle()], None);
        model.scale(0.5);
        for primitive in &model.primitives {
            assert_eq!(primitive.origin(), Vector3::new(0.0, -2.5, 0.0));
            assert_eq!(primitive.to_world.y.y, 0.25);
        }
    }

    #[test]
    fn generated_normals_face_away_from_ccw_triangles() {
        let mut geometry = triangle();
        Geometry::generate_normals(&mut geometry.vertices, &geometry.indices);
        for vertex in &geometry.vertices {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn geometry_is_not_uploaded_before_first_draw() {
        assert!(!triangle().is_uploaded());
        assert!(triangle().gpu().is_none());
    }

    #[test]
    fn material_uniform_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 48);
        let uniform = MaterialUniform::from(&Material {
            shininess: 32.0,
            ..Default::default()
        });
        assert_eq!(uniform.shininess, 32.0);
    }
}
