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

//! Engine-internal subsystems other resources may depend on.

use aurora_core::command::DriverApi;
use aurora_core::driver::{ProgramHandle, SamplerType, TextureFormat, TextureHandle, TextureInfo};

const POST_PROCESS_PASSES: [&str; 4] = ["tonemapping", "fxaa", "bloom", "blit"];

/// Owns the programs of the post-processing passes.
#[derive(Debug, Default)]
pub struct PostProcessManager {
    programs: Vec<(&'static str, ProgramHandle)>,
}

impl PostProcessManager {
    pub(crate) fn init(&mut self, driver: &mut DriverApi) {
        self.programs = POST_PROCESS_PASSES
            .iter()
            .map(|name| (*name, driver.create_program(name)))
            .collect();
    }

    pub(crate) fn terminate(&mut self, driver: &mut DriverApi) {
        for (_, program) in self.programs.drain(..) {
            driver.destroy_program(program);
        }
    }

    /// The program of a pass, if the manager is initialized.
    pub fn program(&self, pass: &str) -> Option<ProgramHandle> {
        self.programs
            .iter()
            .find(|(name, _)| *name == pass)
            .map(|(_, program)| *program)
    }

    /// Number of programs owned.
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }
}

/// The pre-integrated DFG term of image based lighting, as a lookup texture.
///
/// Texel `(x, y)` holds the split-sum scale and bias for `NoV = x` and
/// `roughness = y`, both in `0..1`.
#[derive(Debug, Default)]
pub struct Dfg {
    lut: Option<TextureHandle>,
}

impl Dfg {
    /// Width and height of the lookup table.
    pub const LUT_SIZE: u32 = 32;

    pub(crate) fn init(&mut self, driver: &mut DriverApi) {
        let info = TextureInfo {
            sampler: SamplerType::Sampler2D,
            format: TextureFormat::Rgba8,
            width: Self::LUT_SIZE,
            height: Self::LUT_SIZE,
            levels: 1,
        };
        let lut = driver.create_texture(info);
        driver.update_texture(lut, 0, &Self::compute_lut());
        self.lut = Some(lut);
    }

    pub(crate) fn terminate(&mut self, driver: &mut DriverApi) {
        if let Some(lut) = self.lut.take() {
            driver.destroy_texture(lut);
        }
    }

    /// The lookup texture, if initialized.
    pub fn lut(&self) -> Option<TextureHandle> {
        self.lut
    }

    // Analytic fit of the split-sum integral, stored as unorm8 in red and green.
    fn compute_lut() -> Vec<u8> {
        let size = Self::LUT_SIZE as usize;
        let mut texels = Vec::with_capacity(size * size * 4);
        for y in 0..size {
            let roughness = (y as f32 + 0.5) / size as f32;
            for x in 0..size {
                let nov = (x as f32 + 0.5) / size as f32;
                let (scale, bias) = dfg(nov, roughness);
                texels.extend_from_slice(&[unorm8(scale), unorm8(bias), 0, 255]);
            }
        }
        texels
    }
}

fn dfg(nov: f32, roughness: f32) -> (f32, f32) {
    let c0 = [-1.0, -0.0275, -0.572, 0.022];
    let c1 = [1.0, 0.0425, 1.04, -0.04];
    let r: Vec<f32> = (0..4).map(|i| roughness * c0[i] + c1[i]).collect();
    let a004 = (r[0] * r[0]).min((-9.28 * nov).exp2()) * r[0] + r[1];
    (a004 * -1.04 + r[2], a004 * 1.04 + r[3])
}

fn unorm8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
