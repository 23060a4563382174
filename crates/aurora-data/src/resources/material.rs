// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Materials and their instances.
//!
//! A [`Material`] owns a shader program and describes a block of uniform
//! parameters. Each [`MaterialInstance`] owns a copy of that block and the
//! uniform buffer it is uploaded to. Every material also carries an
//! unregistered default instance, used by renderables that name the material
//! without an instance. The resource lists keep an index of the instances of
//! every material, and a material refuses to be destroyed while the index
//! still lists instances for it or, for the skybox material, while skyboxes
//! still reference it.

use super::{
    BuildContext, Handle, Managed, Resource, ResourceBuilder, ResourceError, ResourceLists,
    ResourceType,
};
use aurora_core::command::DriverApi;
use aurora_core::driver::{BufferHandle, BufferUsage, ProgramHandle};

/// One uniform parameter declared by a material package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialParameter {
    /// Name used to set the parameter on an instance.
    pub name: String,
    /// Size in bytes.
    pub size: u32,
}

/// The already compiled description of a material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialPackage {
    /// Name of the material, used in diagnostics.
    pub name: String,
    /// Uniform parameters, in declaration order.
    pub parameters: Vec<MaterialParameter>,
}

impl MaterialPackage {
    /// Creates a package without parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    /// Declares a uniform parameter.
    pub fn parameter(mut self, name: impl Into<String>, size: u32) -> Self {
        self.parameters.push(MaterialParameter {
            name: name.into(),
            size,
        });
        self
    }

    /// The material used when a renderable has none.
    pub fn default_material() -> Self {
        Self::new("DefaultMaterial").parameter("baseColor", 16)
    }

    /// The material shared by every skybox.
    pub fn skybox() -> Self {
        Self::new("Skybox")
            .parameter("color", 16)
            .parameter("intensity", 4)
            .parameter("showSun", 4)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParameterSlot {
    name: String,
    offset: u32,
    size: u32,
}

/// Builds a [`Material`].
#[derive(Debug, Clone)]
pub struct MaterialBuilder {
    package: MaterialPackage,
}

impl ResourceBuilder for MaterialBuilder {
    type Output = Material;

    fn build(self, ctx: &mut BuildContext<'_>) -> Result<Material, ResourceError> {
        let package = self.package;
        if package.name.is_empty() {
            return Err(ResourceError::invalid(
                ResourceType::Material,
                "material name is empty",
            ));
        }

        let mut parameters: Vec<ParameterSlot> = Vec::with_capacity(package.parameters.len());
        let mut offset = 0;
        for parameter in package.parameters {
            if parameter.size == 0 || parameter.size % 4 != 0 {
                return Err(ResourceError::invalid(
                    ResourceType::Material,
                    format!("parameter \"{}\" has size {}", parameter.name, parameter.size),
                ));
            }
            if parameters.iter().any(|slot| slot.name == parameter.name) {
                return Err(ResourceError::invalid(
                    ResourceType::Material,
                    format!("parameter \"{}\" declared twice", parameter.name),
                ));
            }
            parameters.push(ParameterSlot {
                name: parameter.name,
                offset,
                size: parameter.size,
            });
            offset += parameter.size;
        }

        let default_instance = MaterialInstance {
            material: Handle::new(u32::MAX, 0),
            name: package.name.clone(),
            parameters: parameters.clone(),
            uniforms: vec![0; offset as usize],
            uniform_buffer: ctx.driver.create_buffer(BufferUsage::Uniform, offset),
            dirty: true,
        };
        Ok(Material {
            program: ctx.driver.create_program(&package.name),
            name: package.name,
            parameters,
            uniform_size: offset,
            default_instance,
        })
    }
}

/// A shader program and the layout of its parameters.
#[derive(Debug)]
pub struct Material {
    name: String,
    parameters: Vec<ParameterSlot>,
    uniform_size: u32,
    program: ProgramHandle,
    default_instance: MaterialInstance,
}

impl Material {
    /// Starts building a material from a compiled package.
    pub fn builder(package: MaterialPackage) -> MaterialBuilder {
        MaterialBuilder { package }
    }

    /// Name of the material.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the uniform block of each instance.
    pub fn uniform_size(&self) -> u32 {
        self.uniform_size
    }

    /// Returns `true` if the material declares `name`.
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.iter().any(|slot| slot.name == name)
    }

    /// The driver-side program.
    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    /// The instance used when no other is given.
    pub fn default_instance(&self) -> &MaterialInstance {
        &self.default_instance
    }

    /// The instance used when no other is given.
    pub fn default_instance_mut(&mut self) -> &mut MaterialInstance {
        &mut self.default_instance
    }
}

impl Resource for Material {
    const TYPE: ResourceType = ResourceType::Material;

    fn terminate(&mut self, driver: &mut DriverApi) {
        self.default_instance.terminate(driver);
        driver.destroy_program(self.program);
    }
}

impl Managed for Material {
    fn list(lists: &ResourceLists) -> &super::ResourceList<Self> {
        &lists.materials
    }

    fn list_mut(lists: &mut ResourceLists) -> &mut super::ResourceList<Self> {
        &mut lists.materials
    }

    fn check_destroy(lists: &ResourceLists, handle: Handle<Self>) -> Result<(), ResourceError> {
        let Some(material) = lists.materials.get(handle) else {
            return Ok(());
        };
        let instances = lists.instances_of(handle).len();
        if instances > 0 {
            log::warn!(
                "destroying material \"{}\" but {} instances still alive",
                material.name,
                instances
            );
            return Err(ResourceError::MaterialInUse {
                name: material.name.clone(),
                instances,
            });
        }
        let skyboxes = lists
            .skyboxes
            .iter()
            .filter(|(_, skybox)| skybox.material() == handle)
            .count();
        if skyboxes > 0 {
            log::warn!(
                "destroying material \"{}\" but {} skyboxes still use it",
                material.name,
                skyboxes
            );
            return Err(ResourceError::SkyboxMaterialInUse {
                name: material.name.clone(),
                skyboxes,
            });
        }
        Ok(())
    }

    fn on_registered(lists: &mut ResourceLists, handle: Handle<Self>) {
        if let Some(material) = lists.materials.get_mut(handle) {
            material.default_instance.material = handle;
        }
    }

    fn on_unregistered(lists: &mut ResourceLists, handle: Handle<Self>, _material: &Self) {
        lists.instances_by_material.remove(&handle);
        if lists.skybox_material == Some(handle) {
            lists.skybox_material = None;
        }
    }
}

/// Builds a [`MaterialInstance`].
#[derive(Debug, Clone)]
pub struct MaterialInstanceBuilder {
    material: Handle<Material>,
    name: Option<String>,
}

impl MaterialInstanceBuilder {
    /// Names the instance. Defaults to the material name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl ResourceBuilder for MaterialInstanceBuilder {
    type Output = MaterialInstance;

    fn build(self, ctx: &mut BuildContext<'_>) -> Result<MaterialInstance, ResourceError> {
        let material = ctx.lists.require(self.material)?;
        let name = self.name.unwrap_or_else(|| material.name.clone());
        let parameters = material.parameters.clone();
        let uniform_size = material.uniform_size;
        Ok(MaterialInstance {
            material: self.material,
            name,
            parameters,
            uniforms: vec![0; uniform_size as usize],
            uniform_buffer: ctx.driver.create_buffer(BufferUsage::Uniform, uniform_size),
            dirty: true,
        })
    }
}

/// A set of parameter values for a material.
#[derive(Debug)]
pub struct MaterialInstance {
    material: Handle<Material>,
    name: String,
    parameters: Vec<ParameterSlot>,
    uniforms: Vec<u8>,
    uniform_buffer: BufferHandle,
    dirty: bool,
}

impl MaterialInstance {
    /// Starts building an instance of `material`.
    pub fn builder(material: Handle<Material>) -> MaterialInstanceBuilder {
        MaterialInstanceBuilder {
            material,
            name: None,
        }
    }

    /// The material this is an instance of.
    pub fn material(&self) -> Handle<Material> {
        self.material
    }

    /// Name of the instance.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if parameters changed since the last commit.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Current bytes of parameter `name`.
    pub fn parameter(&self, name: &str) -> Option<&[u8]> {
        self.parameters
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| &self.uniforms[slot.offset as usize..(slot.offset + slot.size) as usize])
    }

    /// Sets the raw bytes of parameter `name`.
    pub fn set_parameter(&mut self, name: &str, value: &[u8]) -> Result<(), ResourceError> {
        let slot = self
            .parameters
            .iter()
            .find(|slot| slot.name == name)
            .ok_or_else(|| {
                ResourceError::invalid(
                    ResourceType::MaterialInstance,
                    format!("material \"{}\" has no parameter \"{}\"", self.name, name),
                )
            })?;
        if value.len() != slot.size as usize {
            return Err(ResourceError::invalid(
                ResourceType::MaterialInstance,
                format!(
                    "parameter \"{}\" is {} bytes, got {}",
                    name,
                    slot.size,
                    value.len()
                ),
            ));
        }
        let start = slot.offset as usize;
        self.uniforms[start..start + value.len()].copy_from_slice(value);
        self.dirty = true;
        Ok(())
    }

    /// Sets parameter `name` from floats.
    pub fn set_float(&mut self, name: &str, values: &[f32]) -> Result<(), ResourceError> {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.set_parameter(name, &bytes)
    }

    /// Uploads the parameters if they changed. Returns `true` if it did.
    pub fn commit(&mut self, driver: &mut DriverApi) -> bool {
        if !self.dirty {
            return false;
        }
        if !self.uniforms.is_empty() {
            driver.update_buffer(self.uniform_buffer, 0, &self.uniforms);
        }
        self.dirty = false;
        true
    }
}

impl Resource for MaterialInstance {
    const TYPE: ResourceType = ResourceType::MaterialInstance;

    fn terminate(&mut self, driver: &mut DriverApi) {
        driver.destroy_buffer(self.uniform_buffer);
    }
}

impl Managed for MaterialInstance {
    fn list(lists: &ResourceLists) -> &super::ResourceList<Self> {
        &lists.material_instances
    }

    fn list_mut(lists: &mut ResourceLists) -> &mut super::ResourceList<Self> {
        &mut lists.material_instances
    }

    fn on_registered(lists: &mut ResourceLists, handle: Handle<Self>) {
        if let Some(material) = lists.material_instances.get(handle).map(|mi| mi.material) {
            lists
                .instances_by_material
                .entry(material)
                .or_default()
                .push(handle);
        }
    }

    fn on_unregistered(lists: &mut ResourceLists, handle: Handle<Self>, instance: &Self) {
        if let Some(instances) = lists.instances_by_material.get_mut(&instance.material) {
            instances.retain(|&h| h != handle);
            if instances.is_empty() {
                lists.instances_by_material.remove(&instance.material);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocators::HeapAllocator;
    use aurora_core::command::{CallbackTable, CommandBufferQueue, CommandStream};
    use std::sync::Arc;

    fn stream() -> CommandStream {
        let queue = Arc::new(CommandBufferQueue::single_threaded(1024, 64 * 1024));
        CommandStream::new(queue, Arc::new(CallbackTable::new()))
    }

    #[test]
    fn test_parameters_are_packed_in_declaration_order() {
        let mut driver = stream();
        let mut lists = ResourceLists::new();
        let heap = HeapAllocator::new();
        let mut ctx = BuildContext::new(&mut driver, &mut lists, &heap);

        let package = MaterialPackage::new("lit")
            .parameter("color", 16)
            .parameter("roughness", 4);
        let material = ctx.create(Material::builder(package)).unwrap();
        let instance = ctx.create(MaterialInstance::builder(material)).unwrap();

        let mi = lists.get_mut(instance).unwrap();
        mi.set_float("roughness", &[0.5]).unwrap();
        assert_eq!(mi.parameter("roughness"), Some(&0.5f32.to_le_bytes()[..]));
        assert_eq!(mi.parameter("color"), Some(&[0u8; 16][..]));
        assert!(mi.set_float("roughness", &[0.5, 1.0]).is_err());
        assert!(mi.set_float("metallic", &[0.0]).is_err());
    }

    #[test]
    fn test_instances_are_indexed_by_material() {
        let mut driver = stream();
        let mut lists = ResourceLists::new();
        let heap = HeapAllocator::new();
        let mut ctx = BuildContext::new(&mut driver, &mut lists, &heap);

        let material = ctx
            .create(Material::builder(MaterialPackage::default_material()))
            .unwrap();
        let a = ctx.create(MaterialInstance::builder(material)).unwrap();
        let b = ctx
            .create(MaterialInstance::builder(material).name("b"))
            .unwrap();

        assert_eq!(lists.instances_of(material), &[a, b]);
        assert!(matches!(
            lists.check_destroy(material),
            Err(ResourceError::MaterialInUse { instances: 2, .. })
        ));

        lists.remove(a).unwrap();
        lists.remove(b).unwrap();
        assert!(lists.instances_of(material).is_empty());
        assert!(lists.check_destroy(material).is_ok());
    }

    #[test]
    fn test_instance_of_unknown_material_fails() {
        let mut driver = stream();
        let mut lists = ResourceLists::new();
        let heap = HeapAllocator::new();
        let mut ctx = BuildContext::new(&mut driver, &mut lists, &heap);

        let material = ctx
            .create(Material::builder(MaterialPackage::new("gone")))
            .unwrap();
        let removed = lists.remove(material).unwrap();
        heap.destroy(removed);

        let mut ctx = BuildContext::new(&mut driver, &mut lists, &heap);
        assert_eq!(
            ctx.create(MaterialInstance::builder(material)).unwrap_err(),
            ResourceError::UnknownResource {
                kind: ResourceType::Material
            }
        );
    }

    #[test]
    fn test_invalid_packages_are_rejected() {
        let mut driver = stream();
        let mut lists = ResourceLists::new();
        let heap = HeapAllocator::new();
        let mut ctx = BuildContext::new(&mut driver, &mut lists, &heap);

        let odd = MaterialPackage::new("odd").parameter("x", 3);
        let twice = MaterialPackage::new("twice")
            .parameter("x", 4)
            .parameter("x", 4);
        assert!(ctx.create(Material::builder(odd)).is_err());
        assert!(ctx.create(Material::builder(twice)).is_err());
        assert!(ctx.create(Material::builder(MaterialPackage::new(""))).is_err());
        assert_eq!(lists.len::<Material>(), 0);
    }

    #[test]
    fn test_default_instance_points_at_its_material() {
        // ARRANGE
        let mut driver = stream();
        let mut lists = ResourceLists::new();
        let heap = HeapAllocator::new();
        let mut ctx = BuildContext::new(&mut driver, &mut lists, &heap);

        // ACT
        let material = ctx
            .create(Material::builder(MaterialPackage::default_material()))
            .unwrap();

        // ASSERT
        let instance = lists.get_mut(material).unwrap().default_instance_mut();
        assert_eq!(instance.material(), material);
        assert!(instance.is_dirty());
        assert!(instance.commit(&mut driver));
        assert!(!instance.commit(&mut driver));
        assert!(lists.instances_of(material).is_empty());
    }

    #[test]
    fn test_forgetting_the_skybox_material_on_removal() {
        // ARRANGE
        let mut driver = stream();
        let mut lists = ResourceLists::new();
        let heap = HeapAllocator::new();
        let mut ctx = BuildContext::new(&mut driver, &mut lists, &heap);
        let material = ctx.skybox_material().unwrap();

        // ACT
        let removed = lists.remove(material).unwrap();
        heap.destroy(removed);

        // ASSERT
        assert!(lists.skybox_material().is_none());
    }
}
