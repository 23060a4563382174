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

//! Textures and image based lights.

use super::{BuildContext, Handle, Resource, ResourceBuilder, ResourceError, ResourceType};
use aurora_core::command::DriverApi;
use aurora_core::driver::{SamplerType, TextureFormat, TextureHandle, TextureInfo};

/// Builds a [`Texture`].
#[derive(Debug, Clone)]
pub struct TextureBuilder {
    info: TextureInfo,
}

impl Default for TextureBuilder {
    fn default() -> Self {
        Self {
            info: TextureInfo {
                sampler: SamplerType::Sampler2D,
                format: TextureFormat::Rgba8,
                width: 1,
                height: 1,
                levels: 1,
            },
        }
    }
}

impl TextureBuilder {
    /// Width in texels.
    pub fn width(mut self, width: u32) -> Self {
        self.info.width = width;
        self
    }

    /// Height in texels.
    pub fn height(mut self, height: u32) -> Self {
        self.info.height = height;
        self
    }

    /// Number of mip levels.
    pub fn levels(mut self, levels: u8) -> Self {
        self.info.levels = levels;
        self
    }

    /// 2D texture or cubemap.
    pub fn sampler(mut self, sampler: SamplerType) -> Self {
        self.info.sampler = sampler;
        self
    }

    /// Texel format.
    pub fn format(mut self, format: TextureFormat) -> Self {
        self.info.format = format;
        self
    }
}

fn max_levels(width: u32, height: u32) -> u8 {
    (32 - width.max(height).leading_zeros()) as u8
}

impl ResourceBuilder for TextureBuilder {
    type Output = Texture;

    fn build(self, ctx: &mut BuildContext<'_>) -> Result<Texture, ResourceError> {
        let info = self.info;
        if info.width == 0 || info.height == 0 {
            return Err(ResourceError::invalid(
                ResourceType::Texture,
                format!("empty extent {}x{}", info.width, info.height),
            ));
        }
        if info.sampler == SamplerType::Cubemap && info.width != info.height {
            return Err(ResourceError::invalid(
                ResourceType::Texture,
                "cubemap faces must be square",
            ));
        }
        let max = max_levels(info.width, info.height);
        if info.levels == 0 || info.levels > max {
            return Err(ResourceError::invalid(
                ResourceType::Texture,
                format!("{} levels requested, 1..={} allowed", info.levels, max),
            ));
        }
        Ok(Texture {
            info,
            hw: ctx.driver.create_texture(info),
        })
    }
}

/// A GPU texture.
#[derive(Debug)]
pub struct Texture {
    info: TextureInfo,
    hw: TextureHandle,
}

impl Texture {
    /// Starts building a texture.
    pub fn builder() -> TextureBuilder {
        TextureBuilder::default()
    }

    /// Width of level 0.
    pub fn width(&self) -> u32 {
        self.info.width
    }

    /// Height of level 0.
    pub fn height(&self) -> u32 {
        self.info.height
    }

    /// Number of mip levels.
    pub fn levels(&self) -> u8 {
        self.info.levels
    }

    /// Texel format.
    pub fn format(&self) -> TextureFormat {
        self.info.format
    }

    /// 2D texture or cubemap.
    pub fn sampler(&self) -> SamplerType {
        self.info.sampler
    }

    /// The driver-side texture.
    pub fn hw(&self) -> TextureHandle {
        self.hw
    }

    /// Number of bytes [`set_image`](Self::set_image) expects for `level`.
    pub fn level_size(&self, level: u8) -> usize {
        let width = (self.info.width >> level).max(1) as usize;
        let height = (self.info.height >> level).max(1) as usize;
        let faces = match self.info.sampler {
            SamplerType::Sampler2D => 1,
            SamplerType::Cubemap => 6,
        };
        width * height * faces * self.info.format.texel_size() as usize
    }

    /// Uploads a whole mip level. Cubemap faces are laid out one after another.
    pub fn set_image(
        &self,
        driver: &mut DriverApi,
        level: u8,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        if level >= self.info.levels {
            return Err(ResourceError::invalid(
                ResourceType::Texture,
                format!("level {} out of {}", level, self.info.levels),
            ));
        }
        let expected = self.level_size(level);
        if data.len() != expected {
            return Err(ResourceError::invalid(
                ResourceType::Texture,
                format!("level {} needs {} bytes, got {}", level, expected, data.len()),
            ));
        }
        driver.update_texture(self.hw, level, data);
        Ok(())
    }
}

impl Resource for Texture {
    const TYPE: ResourceType = ResourceType::Texture;

    fn terminate(&mut self, driver: &mut DriverApi) {
        driver.destroy_texture(self.hw);
    }
}

impl_managed!(Texture, textures);

/// Default illuminance of an indirect light, in lux.
const DEFAULT_INTENSITY: f32 = 30_000.0;

/// Builds an [`IndirectLight`].
#[derive(Debug, Clone)]
pub struct IndirectLightBuilder {
    reflections: Option<Handle<Texture>>,
    irradiance: [[f32; 3]; 9],
    intensity: f32,
}

impl Default for IndirectLightBuilder {
    fn default() -> Self {
        let mut irradiance = [[0.0; 3]; 9];
        irradiance[0] = [0.65, 0.65, 0.65];
        Self {
            reflections: None,
            irradiance,
            intensity: DEFAULT_INTENSITY,
        }
    }
}

impl IndirectLightBuilder {
    /// Cubemap used for specular reflections.
    pub fn reflections(mut self, cubemap: Handle<Texture>) -> Self {
        self.reflections = Some(cubemap);
        self
    }

    /// Third order spherical harmonics of the diffuse irradiance.
    pub fn irradiance(mut self, sh: [[f32; 3]; 9]) -> Self {
        self.irradiance = sh;
        self
    }

    /// Scale applied to the environment, in lux.
    pub fn intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }
}

impl ResourceBuilder for IndirectLightBuilder {
    type Output = IndirectLight;

    fn build(self, ctx: &mut BuildContext<'_>) -> Result<IndirectLight, ResourceError> {
        if let Some(reflections) = self.reflections {
            let texture = ctx.lists.require(reflections)?;
            if texture.sampler() != SamplerType::Cubemap {
                return Err(ResourceError::invalid(
                    ResourceType::IndirectLight,
                    "reflections must be a cubemap",
                ));
            }
        }
        if !(self.intensity.is_finite() && self.intensity >= 0.0) {
            return Err(ResourceError::invalid(
                ResourceType::IndirectLight,
                format!("intensity {} is not a positive number", self.intensity),
            ));
        }
        Ok(IndirectLight {
            reflections: self.reflections,
            irradiance: self.irradiance,
            intensity: self.intensity,
        })
    }
}

/// Image based lighting of a scene.
///
/// The reflection cubemap is borrowed, not owned: destroying the light leaves
/// the texture alive.
#[derive(Debug)]
pub struct IndirectLight {
    reflections: Option<Handle<Texture>>,
    irradiance: [[f32; 3]; 9],
    intensity: f32,
}

impl IndirectLight {
    /// Starts building an indirect light.
    pub fn builder() -> IndirectLightBuilder {
        IndirectLightBuilder::default()
    }

    /// The reflection cubemap.
    pub fn reflections(&self) -> Option<Handle<Texture>> {
        self.reflections
    }

    /// Spherical harmonics of the diffuse irradiance.
    pub fn irradiance(&self) -> &[[f32; 3]; 9] {
        &self.irradiance
    }

    /// Intensity in lux.
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Changes the intensity.
    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity;
    }
}

impl Resource for IndirectLight {
    const TYPE: ResourceType = ResourceType::IndirectLight;

    fn terminate(&mut self, _driver: &mut DriverApi) {}
}

impl_managed!(IndirectLight, indirect_lights);
