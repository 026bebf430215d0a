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

//! Holds the core WGPU state objects the backend runs on.

use crate::gpu::BackendInitError;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use wgpu::SurfaceTargetUnsafe;

/// The wgpu instance/adapter/device/queue bundle, with an optional
/// presentation surface. Headless contexts drive the same submission path
/// minus presentation.
#[derive(Debug)]
pub struct WgpuContext {
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) adapter: wgpu::Adapter,
    pub(crate) surface: Option<wgpu::Surface<'static>>,
    pub(crate) surface_config: Option<wgpu::SurfaceConfiguration>,
}

impl WgpuContext {
    /// Asynchronously initializes a headless context: adapter and device
    /// only, no surface.
    pub async fn headless() -> Result<Self, BackendInitError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        Self::from_instance(instance, None).await
    }

    /// Asynchronously initializes a context presenting to the given window.
    pub async fn for_window<W>(
        window: &W,
        width: u32,
        height: u32,
    ) -> Result<Self, BackendInitError>
    where
        W: HasWindowHandle + HasDisplayHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let surface_target = unsafe { SurfaceTargetUnsafe::from_window(window) }.map_err(
            |err| BackendInitError::SurfaceUnavailable {
                details: err.to_string(),
            },
        )?;
        let surface = unsafe { instance.create_surface_unsafe(surface_target) }.map_err(
            |err| BackendInitError::SurfaceUnavailable {
                details: err.to_string(),
            },
        )?;
        log::debug!("WGPU surface created for the window.");

        let mut context = Self::from_instance(instance, Some(surface)).await?;
        context.configure_surface(width, height)?;
        Ok(context)
    }

    async fn from_instance(
        instance: wgpu::Instance,
        surface: Option<wgpu::Surface<'static>>,
    ) -> Result<Self, BackendInitError> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface.as_ref(),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| BackendInitError::AdapterUnavailable {
                details: err.to_string(),
            })?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Cadence Logical Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
            })
            .await
            .map_err(|err| BackendInitError::DeviceUnavailable {
                details: err.to_string(),
            })?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(Box::new(|err| {
            log::error!("WGPU Uncaptured Error: {err:?}");
        }));

        Ok(Self {
            device,
            queue,
            adapter,
            surface,
            surface_config: None,
        })
    }

    /// (Re)configures the surface's swapchain behavior for the given size.
    pub(crate) fn configure_surface(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<(), BackendInitError> {
        let surface = match &self.surface {
            Some(surface) => surface,
            None => {
                log::debug!("Headless context; surface configuration skipped.");
                return Ok(());
            }
        };

        let capabilities = surface.get_capabilities(&self.adapter);
        if capabilities.formats.is_empty() {
            return Err(BackendInitError::SurfaceUnavailable {
                details: "surface reports no supported formats".to_string(),
            });
        }
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .unwrap_or(capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: capabilities.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&self.device, &config);
        log::debug!("Surface configured at {width}x{height} ({format:?})");
        self.surface_config = Some(config);
        Ok(())
    }
}
