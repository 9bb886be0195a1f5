//! Manages WebGPU bind groups and their layouts.
//!
//! Two groups feed the terrain shader:
//! - group 0: the camera uniform
//! - group 1: the face storage buffer, read-only
//!
//! The face buffer is replaced whenever it grows, so its bind group is rebuilt through
//! [`BindGroupState::rebuild_face_bind_group`]. Layouts never change.

use std::collections::HashMap;

use wgpu::{BindGroup, BindGroupLayout, Buffer, Device};

use crate::error::EngineError;

/// Name of the camera bind group
pub const CAMERA_BIND_GROUP: &str = "camera_bind_group";
/// Name of the camera bind group layout
pub const CAMERA_BIND_GROUP_LAYOUT: &str = "camera_bind_group_layout";
/// Name of the face buffer bind group
pub const FACE_BIND_GROUP: &str = "face_bind_group";
/// Name of the face buffer bind group layout
pub const FACE_BIND_GROUP_LAYOUT: &str = "face_bind_group_layout";

/// Registry of named bind groups and layouts.
pub struct BindGroupState {
    /// Map of bind group names to their WebGPU bind group objects
    bind_groups: HashMap<&'static str, BindGroup>,
    /// Map of bind group layout names to their WebGPU bind group layout objects
    bind_group_layouts: HashMap<&'static str, BindGroupLayout>,
}

impl BindGroupState {
    /// Creates the camera and face bind groups.
    ///
    /// # Arguments
    /// * `device` - The WebGPU device
    /// * `camera_buffer` - Uniform buffer holding the camera data
    /// * `face_buffer` - Storage buffer holding every resident face
    pub fn new(device: &Device, camera_buffer: &Buffer, face_buffer: &Buffer) -> Self {
        let mut bind_group_layouts = HashMap::new();
        bind_group_layouts.insert(
            CAMERA_BIND_GROUP_LAYOUT,
            Self::single_binding_layout(
                device,
                CAMERA_BIND_GROUP_LAYOUT,
                wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                wgpu::BufferBindingType::Uniform,
            ),
        );
        bind_group_layouts.insert(
            FACE_BIND_GROUP_LAYOUT,
            Self::single_binding_layout(
                device,
                FACE_BIND_GROUP_LAYOUT,
                wgpu::ShaderStages::VERTEX,
                wgpu::BufferBindingType::Storage { read_only: true },
            ),
        );

        let mut bind_group_state = Self {
            bind_groups: HashMap::new(),
            bind_group_layouts,
        };
        bind_group_state.bind_buffer(device, CAMERA_BIND_GROUP, CAMERA_BIND_GROUP_LAYOUT, camera_buffer);
        bind_group_state.bind_buffer(device, FACE_BIND_GROUP, FACE_BIND_GROUP_LAYOUT, face_buffer);
        bind_group_state
    }

    fn single_binding_layout(
        device: &Device,
        label: &'static str,
        visibility: wgpu::ShaderStages,
        ty: wgpu::BufferBindingType,
    ) -> BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some(label),
        })
    }

    fn bind_buffer(
        &mut self,
        device: &Device,
        name: &'static str,
        layout_name: &'static str,
        buffer: &Buffer,
    ) {
        let Some(layout) = self.bind_group_layouts.get(layout_name) else {
            return;
        };
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(name),
        });
        self.bind_groups.insert(name, bind_group);
    }

    /// Points the face bind group at a (new) face buffer.
    pub fn rebuild_face_bind_group(&mut self, device: &Device, face_buffer: &Buffer) {
        self.bind_buffer(device, FACE_BIND_GROUP, FACE_BIND_GROUP_LAYOUT, face_buffer);
    }

    /// Retrieves a bind group by name.
    pub fn get_bind_group(&self, name: &'static str) -> Result<&BindGroup, EngineError> {
        self.bind_groups
            .get(name)
            .ok_or(EngineError::MissingResource(name))
    }

    /// Retrieves a bind group layout by name.
    pub fn get_bind_group_layout(&self, name: &'static str) -> Result<&BindGroupLayout, EngineError> {
        self.bind_group_layouts
            .get(name)
            .ok_or(EngineError::MissingResource(name))
    }
}
