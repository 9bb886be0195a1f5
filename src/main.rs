//! # Voxel Terrain Entry Point
//!
//! Runs the viewer and turns a startup or render failure into a non-zero exit status.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release
//! VOXEL_TERRAIN_CONFIG=terrain.json RUST_LOG=debug cargo run --release
//! ```

use std::process::ExitCode;

fn main() -> ExitCode {
    match voxel_terrain::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{}", error);
            ExitCode::FAILURE
        }
    }
}
