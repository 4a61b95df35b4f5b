use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use wgpu::util::DeviceExt;

use crate::obj::{load_mtl_from_str, load_obj_from_str, ObjMaterial, ObjMesh, ObjModel};
use crate::render::texture::{color_texel, Texture};

/// A model uploaded to the GPU: one vertex/index buffer pair per material group.
pub struct Model {
    meshes: Vec<MeshBuffers>,
    materials: Vec<Material>,
}

impl Model {
    /// Loads an OBJ file and everything it references.
    ///
    /// A missing or malformed OBJ is an error. Missing material libraries and
    /// textures only degrade the look of the model.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        path: &Path,
    ) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read model {}", path.display()))?;
        let obj = load_obj_from_str(&contents)
            .with_context(|| format!("failed to parse OBJ model {}", path.display()))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let descriptions = load_materials(&obj, base_dir);

        let mut materials: Vec<Material> = descriptions
            .iter()
            .map(|(desc, dir)| Material::upload(device, queue, material_layout, sampler, desc, dir))
            .collect();

        let mut meshes = Vec::with_capacity(obj.meshes.len());
        let mut fallback = None;
        for mesh in &obj.meshes {
            let known = mesh.material.as_deref().and_then(|name| {
                descriptions
                    .iter()
                    .position(|(desc, _)| desc.name == name)
            });
            let material = match known {
                Some(index) => index,
                None => {
                    if let Some(name) = &mesh.material {
                        warn!("material {name} is not defined; using default");
                    }
                    *fallback.get_or_insert_with(|| {
                        materials.push(Material::upload(
                            device,
                            queue,
                            material_layout,
                            sampler,
                            &ObjMaterial::named("default"),
                            base_dir,
                        ));
                        materials.len() - 1
                    })
                }
            };
            meshes.push(MeshBuffers::from_mesh(device, mesh, material, &path.display().to_string()));
        }

        info!(
            "loaded {} ({} meshes, {} materials)",
            path.display(),
            meshes.len(),
            materials.len()
        );
        Ok(Self { meshes, materials })
    }

    /// Records one indexed draw per mesh. The frame bind group must already be
    /// set at group 0.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        for mesh in &self.meshes {
            let material = &self.materials[mesh.material];
            pass.set_bind_group(1, &material.bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertex.slice(..));
            pass.set_index_buffer(mesh.index.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

/// Reads every referenced MTL library, pairing each material with the
/// directory its texture paths are relative to.
fn load_materials(obj: &ObjModel, base_dir: &Path) -> Vec<(ObjMaterial, PathBuf)> {
    let mut materials = Vec::new();
    for library in &obj.material_libraries {
        let path = base_dir.join(library);
        let parsed = std::fs::read_to_string(&path)
            .with_context(|| format!("unable to read material library {}", path.display()))
            .and_then(|text| load_mtl_from_str(&text));
        match parsed {
            Ok(found) => {
                let dir = path.parent().unwrap_or(base_dir).to_path_buf();
                materials.extend(found.into_iter().map(|material| (material, dir.clone())));
            }
            Err(err) => warn!("skipping material library: {err:#}"),
        }
    }
    materials
}

struct Material {
    bind_group: wgpu::BindGroup,
}

impl Material {
    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        desc: &ObjMaterial,
        dir: &Path,
    ) -> Self {
        let diffuse = match &desc.diffuse_map {
            Some(file) => Texture::load_or_missing(device, queue, &dir.join(file), true),
            None => Texture::solid(device, queue, color_texel(desc.diffuse_color, true), true, &desc.name),
        };
        let specular = match &desc.specular_map {
            Some(file) => Texture::load_or_missing(device, queue, &dir.join(file), false),
            None => Texture::solid(device, queue, color_texel(desc.specular_color, false), false, &desc.name),
        };
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{}-material", desc.name)),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&specular.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });
        Self { bind_group }
    }
}

struct MeshBuffers {
    vertex: wgpu::Buffer,
    index: wgpu::Buffer,
    index_count: u32,
    material: usize,
}

impl MeshBuffers {
    fn from_mesh(device: &wgpu::Device, mesh: &ObjMesh, material: usize, label: &str) -> Self {
        let vertex = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-vertices")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-indices")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex,
            index,
            index_count: mesh.indices.len() as u32,
            material,
        }
    }
}
