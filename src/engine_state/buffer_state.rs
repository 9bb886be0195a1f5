//! # Buffer State Module
//!
//! A registry of named GPU buffers with allocation tracking.
//!
//! ## Key Features
//!
//! * Buffers are referenced by a static name and created, written and grown through the registry
//! * Writes are bounds-checked against the tracked allocation
//! * Growable buffers double in size and keep their contents via a GPU-side copy
//!
//! ## Growth
//!
//! Growing replaces the `wgpu::Buffer` behind a name. Anything that captured the old buffer,
//! bind groups in particular, has to be rebuilt by the caller; `ensure_capacity` reports when
//! that is necessary.

use std::collections::{hash_map::Entry, HashMap};

use log::{debug, info};
use wgpu::{util::DeviceExt, Buffer, Device, Queue};

use crate::{core::StResource, error::EngineError};

/// Allocation data for a GPU buffer
#[derive(Debug)]
struct BufferAnalytics {
    /// Total memory allocated for the buffer in bytes
    pub allocated_memory: u64,
    /// Highest byte written so far
    pub used_memory: u64,
    /// Number of times the buffer has been written to
    pub times_written: u64,
}

/// Central registry of GPU buffers.
///
/// # Examples
///
/// ```rust,ignore
/// let mut buffer_state = BufferState::new(device, queue);
///
/// buffer_state.create_buffer_init(
///     CAMERA_BUFFER_NAME,
///     wgpu::util::BufferInitDescriptor {
///         label: Some(CAMERA_BUFFER_NAME),
///         contents: bytemuck::cast_slice(&[camera_uniform]),
///         usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
///     },
/// );
///
/// buffer_state.write_buffer(CAMERA_BUFFER_NAME, 0, bytemuck::cast_slice(&[camera_uniform]))?;
/// ```
pub struct BufferState {
    /// Reference to the GPU device
    pub device: StResource<Device>,
    /// Reference to the GPU command queue
    pub queue: StResource<Queue>,
    /// Map of buffer names to buffer objects
    buffers: HashMap<&'static str, Buffer>,
    /// Allocation data for each buffer
    buffer_analytics: StResource<HashMap<&'static str, BufferAnalytics>>,
}

impl BufferState {
    /// Creates an empty registry.
    ///
    /// # Arguments
    /// * `device` - Reference to the GPU device
    /// * `queue` - Reference to the GPU command queue
    pub fn new(device: StResource<Device>, queue: StResource<Queue>) -> Self {
        Self {
            device,
            queue,
            buffers: HashMap::new(),
            buffer_analytics: StResource::new(HashMap::new()),
        }
    }

    fn register(&mut self, buffer_name: &'static str, buffer: Buffer, analytics: BufferAnalytics) -> &Buffer {
        self.buffer_analytics.get_mut().insert(buffer_name, analytics);

        match self.buffers.entry(buffer_name) {
            Entry::Occupied(mut entry) => {
                entry.insert(buffer);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(buffer),
        }
    }

    /// Creates an uninitialised buffer, replacing any buffer of the same name.
    ///
    /// # Arguments
    /// * `buffer_name` - Unique name for the buffer
    /// * `buffer_descriptor` - Buffer configuration descriptor
    pub fn create_buffer(
        &mut self,
        buffer_name: &'static str,
        buffer_descriptor: wgpu::BufferDescriptor,
    ) -> &Buffer {
        let analytics = BufferAnalytics {
            allocated_memory: buffer_descriptor.size,
            used_memory: 0,
            times_written: 0,
        };
        let buffer = self.device.get().create_buffer(&buffer_descriptor);

        self.register(buffer_name, buffer, analytics)
    }

    /// Creates a buffer holding `init_descriptor.contents`, replacing any buffer of the same
    /// name.
    pub fn create_buffer_init(
        &mut self,
        buffer_name: &'static str,
        init_descriptor: wgpu::util::BufferInitDescriptor,
    ) -> &Buffer {
        let analytics = BufferAnalytics {
            allocated_memory: init_descriptor.contents.len() as u64,
            used_memory: init_descriptor.contents.len() as u64,
            times_written: 1,
        };
        let buffer = self.device.get().create_buffer_init(&init_descriptor);

        self.register(buffer_name, buffer, analytics)
    }

    /// Writes raw bytes into a buffer through the queue.
    ///
    /// # Arguments
    /// * `buffer_name` - Name of the buffer to write to
    /// * `offset` - Byte offset in the buffer to start writing
    /// * `data` - Raw byte data to write
    ///
    /// # Errors
    /// [`EngineError::MissingResource`] for an unknown name and [`EngineError::BufferOverflow`]
    /// if the write does not fit the allocation
    pub fn write_buffer(
        &self,
        buffer_name: &'static str,
        offset: wgpu::BufferAddress,
        data: &[u8],
    ) -> Result<(), EngineError> {
        let buffer = self.get_buffer(buffer_name)?;
        let mut buffer_dictionary = self.buffer_analytics.get_mut();
        let buffer_analytics = buffer_dictionary
            .get_mut(buffer_name)
            .ok_or(EngineError::MissingResource(buffer_name))?;

        let buffer_size = buffer_analytics.allocated_memory;
        let data_size = data.len() as u64;

        if offset + data_size > buffer_size {
            return Err(EngineError::BufferOverflow {
                name: buffer_name,
                offset,
                len: data_size,
                size: buffer_size,
            });
        }

        self.queue.get().write_buffer(buffer, offset, data);
        buffer_analytics.used_memory = buffer_analytics.used_memory.max(offset + data_size);
        buffer_analytics.times_written += 1;
        Ok(())
    }

    /// Grows a buffer so it holds at least `required_bytes`.
    ///
    /// The new allocation is double the old one, capped at `max_bytes` but never below
    /// `required_bytes`. Bytes written so far are copied over on the GPU, after any writes
    /// already queued for the old buffer.
    ///
    /// # Returns
    /// `true` if the buffer was replaced, in which case bind groups over it are stale
    ///
    /// # Errors
    /// [`EngineError::MissingResource`] for an unknown name
    pub fn ensure_capacity(
        &mut self,
        buffer_name: &'static str,
        required_bytes: u64,
        max_bytes: u64,
    ) -> Result<bool, EngineError> {
        let (allocated, used) = {
            let analytics = self.buffer_analytics.get();
            let entry = analytics
                .get(buffer_name)
                .ok_or(EngineError::MissingResource(buffer_name))?;
            (entry.allocated_memory, entry.used_memory)
        };

        if required_bytes <= allocated {
            return Ok(false);
        }

        let new_size = (allocated.max(wgpu::COPY_BUFFER_ALIGNMENT) * 2)
            .min(max_bytes)
            .max(required_bytes)
            .next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);

        let old_buffer = self.get_buffer(buffer_name)?;
        let usage = old_buffer.usage();
        let new_buffer = self.device.get().create_buffer(&wgpu::BufferDescriptor {
            label: Some(buffer_name),
            size: new_size,
            usage,
            mapped_at_creation: false,
        });

        let copy_size = used.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT).min(allocated);
        if copy_size > 0 {
            let mut encoder = self
                .device
                .get()
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Buffer Growth Encoder"),
                });
            encoder.copy_buffer_to_buffer(old_buffer, 0, &new_buffer, 0, copy_size);
            self.queue.get().submit([encoder.finish()]);
        }

        info!(
            "Grew buffer '{}' from {} to {} bytes",
            buffer_name, allocated, new_size
        );

        let analytics = BufferAnalytics {
            allocated_memory: new_size,
            used_memory: used,
            times_written: 0,
        };
        self.register(buffer_name, new_buffer, analytics);
        debug!("Buffer '{}' holds {} bytes after growth", buffer_name, used);

        Ok(true)
    }

    /// Gets a reference to a buffer by name.
    pub fn get_buffer(&self, buffer_name: &'static str) -> Result<&Buffer, EngineError> {
        self.buffers
            .get(buffer_name)
            .ok_or(EngineError::MissingResource(buffer_name))
    }

    /// Gets the total allocated memory across all buffers in bytes.
    pub fn get_total_allocated_memory(&self) -> u64 {
        self.buffer_analytics
            .get()
            .values()
            .map(|analytics| analytics.allocated_memory)
            .sum()
    }

    /// Gets the total written memory across all buffers in bytes.
    pub fn get_total_used_memory(&self) -> u64 {
        self.buffer_analytics
            .get()
            .values()
            .map(|analytics| analytics.used_memory)
            .sum()
    }

    /// Total number of writes across all buffers since creation or last growth.
    pub fn get_total_writes(&self) -> u64 {
        self.buffer_analytics
            .get()
            .values()
            .map(|analytics| analytics.times_written)
            .sum()
    }
}
