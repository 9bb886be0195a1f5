//! # Core Module
//!
//! Shared-ownership containers used across the engine.
//!
//! ## Key Components
//! - `MtResource`: thread-safe reference-counted resource with read-write locking, shared
//!   between the render thread and the generation workers
//! - `StResource`: single-threaded variant for GPU handles that live on the render thread
//!
//! Both recover from lock poisoning instead of panicking: the data they guard (camera
//! snapshots, an append-only chunk registry, GPU handles) stays valid even if a holder
//! panicked mid-read.
//!
//! ## Usage
//! ```rust,ignore
//! let counter = MtResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//! ```

pub mod mt_resource;
pub mod st_resource;

pub use mt_resource::MtResource;
pub use st_resource::StResource;
