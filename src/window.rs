//! Windowed sandbox: a winit event loop driving a [`Fabric`] and the wgpu
//! renderer.

use std::path::Path;
use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::config::FabricConfig;
use crate::error::RunError;
use crate::gpu::GpuState;
use crate::impression::Impression;
use crate::input::Input;
use crate::simulation::Fabric;
use crate::time::Time;
use crate::visuals;

const TITLE: &str = "weave";

/// Open a window and run the sandbox until it is closed.
pub fn run(config: FabricConfig) -> Result<(), RunError> {
    run_app(App::new(config, None))
}

/// Like [`run`], with `image` pressed into the fabric from the first frame.
pub fn run_with_image<P: AsRef<Path>>(config: FabricConfig, image: P) -> Result<(), RunError> {
    let impression = Impression::open(image.as_ref())?;
    run_app(App::new(config, Some(impression)))
}

fn run_app(mut app: App) -> Result<(), RunError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct App {
    config: FabricConfig,
    input: Input,
    time: Time,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    fabric: Option<Fabric>,
    /// Impression waiting for the first mesh.
    pending: Option<Impression>,
    /// Fatal error raised inside the event loop.
    error: Option<RunError>,
}

impl App {
    fn new(config: FabricConfig, pending: Option<Impression>) -> Self {
        let config = config.validated();
        Self {
            input: Input::new(config.bindings),
            config,
            time: Time::new(),
            window: None,
            gpu_state: None,
            fabric: None,
            pending,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), RunError> {
        let window_attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu_state = pollster::block_on(GpuState::new(window.clone()))?;

        let scale_factor = window.scale_factor();
        self.input.set_scale_factor(scale_factor);
        let size = window.inner_size().to_logical::<f32>(scale_factor);
        let mut fabric = Fabric::new(self.config.clone(), size.width, size.height);
        if let Some(impression) = self.pending.take() {
            fabric.set_impression(impression)?;
        }
        log::info!(
            "{} particles, {} springs",
            fabric.mesh().particles().len(),
            fabric.mesh().springs().len()
        );
        log::info!("press ',' for shortcuts");

        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        self.fabric = Some(fabric);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: RunError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn load_impression(&mut self, path: &Path) {
        let Some(fabric) = &mut self.fabric else {
            return;
        };
        match Impression::open(path).and_then(|impression| fabric.set_impression(impression)) {
            Ok(()) => log::info!("pressed in {}", path.display()),
            Err(e) => log::warn!("could not use {}: {}", path.display(), e),
        }
    }

    fn set_file_hovered(&mut self, hovered: bool) {
        if let Some(gpu_state) = &mut self.gpu_state {
            gpu_state.set_background(visuals::background_color(hovered));
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(fabric), Some(gpu_state)) = (&mut self.fabric, &mut self.gpu_state) else {
            return;
        };

        fabric.step();

        match gpu_state.render(&fabric.frame_data()) {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu_state.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("render error: {:?}", e),
        }

        if let Some(fps) = self.time.update() {
            if let Some(window) = &self.window {
                let mode = fabric.controller().mode().name();
                window.set_title(&format!("{} | {:.0} fps | {}", TITLE, fps, mode));
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                return;
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                log::info!("scale factor {}", scale_factor);
                self.input.set_scale_factor(*scale_factor);
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.set_scale_factor(*scale_factor);
                }
                return;
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(*physical_size);
                }
                if physical_size.width > 0 && physical_size.height > 0 {
                    if let (Some(fabric), Some(window)) = (&mut self.fabric, &self.window) {
                        let size = physical_size.to_logical::<f32>(window.scale_factor());
                        fabric.resize(size.width, size.height);
                    }
                }
                return;
            }
            WindowEvent::HoveredFile(path) => {
                log::info!("drop {} to press it in", path.display());
                self.set_file_hovered(true);
                return;
            }
            WindowEvent::HoveredFileCancelled => {
                self.set_file_hovered(false);
                return;
            }
            WindowEvent::DroppedFile(path) => {
                self.set_file_hovered(false);
                self.load_impression(path);
                return;
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
                return;
            }
            _ => {}
        }

        let Some(input_event) = self.input.handle_event(&event) else {
            return;
        };
        if let Some(fabric) = &mut self.fabric {
            if input_event.apply(fabric) {
                log::info!("shortcuts:\n{}", self.input.bindings().help());
            }
        }
    }
}
