//! # Application State Management
//!
//! This module handles the application's lifecycle, including:
//! - Window and graphics initialization
//! - Input handling
//! - Frame pacing and rendering
//! - Shutdown of the generation workers
//!
//! A startup or render failure is kept in [`ApplicationState`] and stops the event loop;
//! [`ApplicationState::into_result`] hands it back to [`crate::run`].

pub mod graphics_resources_builder;
pub mod input_manager;
pub mod input_state;

use std::sync::Arc;

use graphics_resources_builder::{GraphicsBuilder, GraphicsEvent};
use input_manager::InputManager;
use log::info;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{config::EngineConfig, engine_state::EngineState, error::EngineError};

/// The main application state container that manages the application's lifecycle.
pub struct ApplicationState {
    /// Creates the graphics resources on the first resume
    pub graphics_builder: GraphicsBuilder,

    /// The initialized application state, if the application has started
    pub state: Option<InitializedApplicationState>,

    /// Configuration the engine is started with
    pub config: EngineConfig,

    /// The failure that stopped the event loop, if any
    pub error: Option<EngineError>,
}

/// Represents the fully initialized and running state of the application.
pub struct InitializedApplicationState {
    /// The core engine state
    pub engine_state: EngineState,

    /// Handle to the application window
    pub window: Arc<Window>,

    /// Manages input state and event processing
    pub input_manager: InputManager,

    /// Timestamp of the last frame for delta time calculations
    pub last_wait_time: web_time::Instant,
}

impl ApplicationState {
    /// Creates the application in its pre-graphics state.
    pub fn new(graphics_builder: GraphicsBuilder, config: EngineConfig) -> Self {
        Self {
            graphics_builder,
            state: None,
            config,
            error: None,
        }
    }

    /// Records a fatal error and stops the event loop.
    fn fail(&mut self, event_loop: &ActiveEventLoop, engine_error: EngineError) {
        if self.error.is_none() {
            self.error = Some(engine_error);
        }
        event_loop.exit();
    }

    /// Stops and joins the generation workers, if they were started.
    pub fn shutdown(&mut self) {
        if let Some(state) = &mut self.state {
            state.engine_state.shutdown();
        }
    }

    /// Shuts down and returns the error that stopped the event loop, if any.
    pub fn into_result(mut self) -> Result<(), EngineError> {
        self.shutdown();
        match self.error.take() {
            Some(engine_error) => Err(engine_error),
            None => Ok(()),
        }
    }
}

fn is_exit_request(event: &WindowEvent) -> bool {
    matches!(
        event,
        WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event: KeyEvent {
                    state: ElementState::Pressed,
                    physical_key: PhysicalKey::Code(KeyCode::Escape),
                    ..
                },
                ..
            }
    )
}

impl ApplicationHandler<GraphicsEvent> for ApplicationState {
    /// Handles window-related events such as resize, focus changes, and input events.
    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if is_exit_request(&event) {
            event_loop.exit();
            return;
        }

        let Some(state) = &mut self.state else {
            return;
        };

        state.input_manager.intake_input(&event);

        let result = match event {
            WindowEvent::Resized(size) => {
                state.engine_state.resize_surface(size);
                Ok(())
            }
            WindowEvent::Focused(false) => {
                state.input_manager.release_all();
                Ok(())
            }
            WindowEvent::RedrawRequested => state.engine_state.render(),
            _ => Ok(()),
        };

        if let Err(engine_error) = result {
            self.fail(event_loop, engine_error);
        }
    }

    /// Handles raw mouse motion, which drives the camera while the cursor is grabbed.
    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(state) = &mut self.state {
            if let DeviceEvent::MouseMotion { delta } = event {
                state.input_manager.intake_mouse_motion(delta);
            }
        }
    }

    /// Creates the window and GPU context on the first resume.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.graphics_builder.build_and_send(event_loop);
    }

    /// Starts the engine with the created graphics, or stops on a startup failure.
    fn user_event(&mut self, event_loop: &ActiveEventLoop, graphics: GraphicsEvent) {
        let started = graphics.and_then(|graphics| {
            let engine_state = EngineState::new(
                graphics.surface,
                graphics.surface_config,
                graphics.device,
                graphics.queue,
                &graphics.shader_source,
                &self.config,
            )?;
            Ok(InitializedApplicationState {
                engine_state,
                window: graphics.window,
                input_manager: InputManager::new(),
                last_wait_time: web_time::Instant::now(),
            })
        });

        match started {
            Ok(state) => {
                info!("Viewer started with {} generation workers", self.config.worker_count);
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(engine_error) => self.fail(event_loop, engine_error),
        }
    }

    /// Advances the camera by the frame delta and requests the next frame.
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = &mut self.state else {
            return;
        };

        let now = web_time::Instant::now();
        let wait_dt = now - state.last_wait_time;
        state.last_wait_time = now;

        let processed_input = state.input_manager.get_and_reset_processed_input();
        state.engine_state.set_input_commands(processed_input);

        match state.engine_state.process_input(wait_dt) {
            Ok(()) => state.window.request_redraw(),
            Err(engine_error) => self.fail(event_loop, engine_error),
        }
    }

    /// Joins the generation workers before the event loop returns.
    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
