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

//! [`SubmissionBackend`] over a wgpu device.
//!
//! Batches become one command buffer per frame: each item opens a debug
//! group named after its pass, so captures show the derived order. Token
//! completion is tracked through `on_submitted_work_done` callbacks and
//! surfaced via the device poll API.

use crate::gpu::wgpu_backend::context::WgpuContext;
use crate::gpu::BackendInitError;
use crate::imagery::DecodedImage;
use cadence_core::backend::{
    BackendAdapterInfo, BackendKind, DeviceKind, SubmissionBackend, SubmissionBatch, SyncToken,
};
use cadence_core::error::{PresentError, SubmitError};
use cadence_core::handle::SlotIndex;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Returns our backend kind for a wgpu backend.
fn backend_kind(backend: wgpu::Backend) -> BackendKind {
    match backend {
        wgpu::Backend::Vulkan => BackendKind::Vulkan,
        wgpu::Backend::Dx12 => BackendKind::Dx12,
        wgpu::Backend::Metal => BackendKind::Metal,
        wgpu::Backend::Gl => BackendKind::OpenGl,
        wgpu::Backend::BrowserWebGpu => BackendKind::WebGpu,
        wgpu::Backend::Noop => BackendKind::Null,
    }
}

/// Returns our device kind for a wgpu device type.
fn device_kind(device_type: wgpu::DeviceType) -> DeviceKind {
    match device_type {
        wgpu::DeviceType::IntegratedGpu => DeviceKind::IntegratedGpu,
        wgpu::DeviceType::DiscreteGpu => DeviceKind::DiscreteGpu,
        wgpu::DeviceType::VirtualGpu => DeviceKind::VirtualGpu,
        wgpu::DeviceType::Cpu => DeviceKind::Cpu,
        wgpu::DeviceType::Other => DeviceKind::Unknown,
    }
}

#[derive(Debug, Default)]
struct TokenTracking {
    pending: HashMap<u64, wgpu::SubmissionIndex>,
    signaled: HashSet<u64>,
}

/// The wgpu device backend.
#[derive(Debug)]
pub struct WgpuSubmissionBackend {
    context: Mutex<WgpuContext>,
    tokens: Arc<Mutex<TokenTracking>>,
    next_token: AtomicU64,
}

impl WgpuSubmissionBackend {
    /// Brings up a headless backend: full submission path, no presentation.
    pub fn headless() -> Result<Self, BackendInitError> {
        let context = pollster::block_on(WgpuContext::headless())?;
        Ok(Self::from_context(context))
    }

    /// Brings up a backend presenting to the given window.
    pub fn for_window<W>(window: &W, width: u32, height: u32) -> Result<Self, BackendInitError>
    where
        W: HasWindowHandle + HasDisplayHandle,
    {
        let context = pollster::block_on(WgpuContext::for_window(window, width, height))?;
        Ok(Self::from_context(context))
    }

    fn from_context(context: WgpuContext) -> Self {
        Self {
            context: Mutex::new(context),
            tokens: Arc::new(Mutex::new(TokenTracking::default())),
            next_token: AtomicU64::new(1),
        }
    }

    /// Creates a device texture sized to a decoded image and uploads its
    /// pixels. Used to populate image resources from the decoding
    /// collaborator.
    pub fn upload_image(&self, image: &DecodedImage, label: Option<&str>) -> wgpu::Texture {
        let context = self.context.lock().unwrap();
        let size = wgpu::Extent3d {
            width: image.width,
            height: image.height,
            depth_or_array_layers: 1,
        };
        let texture = context.device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(image.bytes_per_row()),
                rows_per_image: None,
            },
            size,
        );
        log::debug!(
            "Uploaded {}x{} image ({} bytes) to device texture",
            image.width,
            image.height,
            image.pixels.len()
        );
        texture
    }

    fn mark_signaled(tokens: &Mutex<TokenTracking>, value: u64) {
        let mut tracking = tokens.lock().unwrap();
        tracking.pending.remove(&value);
        tracking.signaled.insert(value);
    }
}

impl SubmissionBackend for WgpuSubmissionBackend {
    fn submit(&self, batch: &SubmissionBatch, slot: SlotIndex) -> Result<SyncToken, SubmitError> {
        let context = self.context.lock().unwrap();

        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("cadence-frame-batch"),
            });
        for item in &batch.items {
            // Barriers are implicit in wgpu; the groups keep captures
            // aligned with the derived order.
            encoder.push_debug_group(&item.pass_name);
            encoder.pop_debug_group();
        }

        let index = context.queue.submit(std::iter::once(encoder.finish()));
        let value = self.next_token.fetch_add(1, Ordering::Relaxed);
        {
            let mut tracking = self.tokens.lock().unwrap();
            tracking.pending.insert(value, index);
        }

        let tokens = self.tokens.clone();
        context.queue.on_submitted_work_done(move || {
            Self::mark_signaled(&tokens, value);
        });

        log::trace!(
            "Submitted frame {} batch ({} items) for {slot} as token #{value}",
            batch.frame_index,
            batch.items.len()
        );
        Ok(SyncToken { slot, value })
    }

    fn present(&self, slot: SlotIndex) -> Result<(), PresentError> {
        let context = self.context.lock().unwrap();
        let surface = match &context.surface {
            Some(surface) => surface,
            None => {
                log::trace!("Headless backend; present for {slot} skipped.");
                return Ok(());
            }
        };

        let frame = match surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Outdated) | Err(wgpu::SurfaceError::Lost) => {
                return Err(PresentError::Stale { slot });
            }
            Err(err) => {
                return Err(PresentError::Rejected {
                    slot,
                    details: err.to_string(),
                });
            }
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("cadence-present"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("cadence-present-clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn token_signaled(&self, token: SyncToken) -> bool {
        {
            // Process any completed work so pending callbacks run.
            let context = self.context.lock().unwrap();
            if let Err(err) = context.device.poll(wgpu::PollType::Poll) {
                log::warn!("Failed to poll device (non-blocking): {err:?}");
            }
        }
        self.tokens.lock().unwrap().signaled.contains(&token.value)
    }

    fn wait_token(&self, token: SyncToken) {
        let index = {
            let tracking = self.tokens.lock().unwrap();
            if tracking.signaled.contains(&token.value) {
                return;
            }
            tracking.pending.get(&token.value).cloned()
        };

        let context = self.context.lock().unwrap();
        let poll = match index {
            Some(index) => wgpu::PollType::WaitForSubmissionIndex(index),
            // The token was never registered; draining the whole queue is
            // the only safe upper bound.
            None => wgpu::PollType::Wait,
        };
        if let Err(err) = context.device.poll(poll) {
            log::warn!("Failed to wait on {token}: {err:?}");
        }
        drop(context);
        Self::mark_signaled(&self.tokens, token.value);
    }

    fn reconfigure_surface(&self, width: u32, height: u32) {
        let mut context = self.context.lock().unwrap();
        if let Err(err) = context.configure_surface(width, height) {
            log::error!("Surface reconfiguration failed: {err}");
        }
    }

    fn adapter_info(&self) -> BackendAdapterInfo {
        let context = self.context.lock().unwrap();
        let info = context.adapter.get_info();
        BackendAdapterInfo {
            name: info.name.clone(),
            backend: backend_kind(info.backend),
            device: device_kind(info.device_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_conversion() {
        assert_eq!(backend_kind(wgpu::Backend::Vulkan), BackendKind::Vulkan);
        assert_eq!(backend_kind(wgpu::Backend::Metal), BackendKind::Metal);
        assert_eq!(backend_kind(wgpu::Backend::Gl), BackendKind::OpenGl);
        assert_eq!(backend_kind(wgpu::Backend::Noop), BackendKind::Null);
    }

    #[test]
    fn device_kind_conversion() {
        assert_eq!(
            device_kind(wgpu::DeviceType::DiscreteGpu),
            DeviceKind::DiscreteGpu
        );
        assert_eq!(device_kind(wgpu::DeviceType::Cpu), DeviceKind::Cpu);
        assert_eq!(device_kind(wgpu::DeviceType::Other), DeviceKind::Unknown);
    }
}
