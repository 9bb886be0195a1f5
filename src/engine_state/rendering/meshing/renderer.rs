//! Terrain renderer.
//!
//! Draws every visible chunk straight out of the shared face buffer. There are no vertex
//! or index buffers: each face is one instance of a four-vertex triangle strip, and the
//! vertex shader builds the quad from the face record and the vertex index.

use wgpu::{util::DrawIndirectArgs, Device, RenderPass, RenderPipeline, TextureFormat};

use crate::{
    engine_state::rendering::bind_group_state::{
        BindGroupState, CAMERA_BIND_GROUP, CAMERA_BIND_GROUP_LAYOUT, FACE_BIND_GROUP,
        FACE_BIND_GROUP_LAYOUT,
    },
    error::EngineError,
};

/// Owns the terrain render pipeline.
pub struct TerrainRenderer {
    /// The WebGPU render pipeline for face rendering
    render_pipeline: RenderPipeline,
}

impl TerrainRenderer {
    /// Creates the terrain pipeline.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `shader_string` - The WGSL shader source code
    /// * `texture_format` - Format of the surface being rendered to
    /// * `bind_group_state` - Provides the camera and face layouts
    /// * `depth_stencil` - Depth state of the pass
    ///
    /// # Errors
    /// [`EngineError::MissingResource`] if a bind group layout is missing
    pub fn new(
        device: &Device,
        shader_string: &str,
        texture_format: TextureFormat,
        bind_group_state: &BindGroupState,
        depth_stencil: Option<wgpu::DepthStencilState>,
    ) -> Result<Self, EngineError> {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Terrain Render Pipeline Layout"),
            bind_group_layouts: &[
                bind_group_state.get_bind_group_layout(CAMERA_BIND_GROUP_LAYOUT)?,
                bind_group_state.get_bind_group_layout(FACE_BIND_GROUP_LAYOUT)?,
            ],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Terrain Shader"),
            source: wgpu::ShaderSource::Wgsl(shader_string.into()),
        });

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Terrain Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: texture_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        Ok(Self { render_pipeline })
    }

    /// Records one instanced draw per visible chunk.
    ///
    /// # Arguments
    /// * `render_pass` - The render pass to record into
    /// * `bind_group_state` - Provides the camera and face bind groups
    /// * `draws` - This frame's draws, see `RenderFeeder::visible_draws`
    pub fn render(
        &self,
        render_pass: &mut RenderPass<'_>,
        bind_group_state: &BindGroupState,
        draws: &[DrawIndirectArgs],
    ) -> Result<(), EngineError> {
        render_pass.set_pipeline(&self.render_pipeline);
        render_pass.set_bind_group(0, bind_group_state.get_bind_group(CAMERA_BIND_GROUP)?, &[]);
        render_pass.set_bind_group(1, bind_group_state.get_bind_group(FACE_BIND_GROUP)?, &[]);

        for draw in draws {
            render_pass.draw(
                draw.first_vertex..draw.first_vertex + draw.vertex_count,
                draw.first_instance..draw.first_instance + draw.instance_count,
            );
        }

        Ok(())
    }
}
