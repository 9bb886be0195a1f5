//! Coordinates the render pass of a frame.
//!
//! # Architecture
//!
//! - `PipelineManager`: owns the pass-wide resources and records the frame
//! - `TerrainRenderer`: owns the terrain pipeline and records the chunk draws
//!
//! The pass clears to the sky color, which is also the fog color, so distant terrain
//! fades into the background instead of ending at a hard edge.

use wgpu::{
    util::DrawIndirectArgs, Buffer, Device, Queue, SurfaceConfiguration, SurfaceTexture,
    TextureFormat,
};

use super::{bind_group_state::BindGroupState, meshing::TerrainRenderer, texture};
use crate::{engine_state::camera_state::camera::SKY_COLOR, error::EngineError};

/// Owns the render-pass resources and records each frame.
pub struct PipelineManager {
    /// Manages all bind groups used in the pipeline
    pub bind_group_state: BindGroupState,
    /// Depth texture used for depth testing
    pub depth_texture: texture::Texture,
    /// Renderer for chunk faces
    pub terrain_renderer: TerrainRenderer,
}

impl PipelineManager {
    /// Creates a new `PipelineManager` instance.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `config` - Surface configuration containing size and format
    /// * `texture_format` - The texture format to use for rendering
    /// * `camera_buffer` - Uniform buffer holding the camera data
    /// * `face_buffer` - Storage buffer holding every resident face
    /// * `shader_string` - The WGSL terrain shader source
    pub fn new(
        device: &Device,
        config: &SurfaceConfiguration,
        texture_format: TextureFormat,
        camera_buffer: &Buffer,
        face_buffer: &Buffer,
        shader_string: &str,
    ) -> Result<Self, EngineError> {
        let bind_group_state = BindGroupState::new(device, camera_buffer, face_buffer);

        let depth_texture = texture::Texture::create_depth_texture(device, config, "DEPTH TEXTURE");

        let terrain_renderer = TerrainRenderer::new(
            device,
            shader_string,
            texture_format,
            &bind_group_state,
            Some(texture::Texture::depth_stencil_state()),
        )?;

        Ok(Self {
            bind_group_state,
            depth_texture,
            terrain_renderer,
        })
    }

    /// Records and submits one frame, then presents it.
    ///
    /// # Arguments
    /// * `frame` - The acquired surface texture
    /// * `device` - The WebGPU device
    /// * `queue` - The WebGPU queue for command submission
    /// * `draws` - Chunk draws for this frame
    pub fn render(
        &self,
        frame: SurfaceTexture,
        device: &Device,
        queue: &Queue,
        draws: &[DrawIndirectArgs],
    ) -> Result<(), EngineError> {
        let view = frame.texture.create_view(&Default::default());
        let mut encoder = device.create_command_encoder(&Default::default());
        {
            let depth_stencil_attachment = Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            });
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: SKY_COLOR[0] as f64,
                            g: SKY_COLOR[1] as f64,
                            b: SKY_COLOR[2] as f64,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment,
                ..Default::default()
            });

            self.terrain_renderer
                .render(&mut rpass, &self.bind_group_state, draws)?;
        }

        queue.submit([encoder.finish()]);
        frame.present();
        Ok(())
    }

    /// Points the face bind group at a regrown face buffer.
    pub fn rebind_faces(&mut self, device: &Device, face_buffer: &Buffer) {
        self.bind_group_state.rebuild_face_bind_group(device, face_buffer);
    }

    /// Handles window resize events by recreating the depth texture.
    pub fn resize(&mut self, device: &Device, config: &SurfaceConfiguration) {
        self.depth_texture = texture::Texture::create_depth_texture(device, config, "DEPTH TEXTURE");
    }
}
