use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use glam::DVec2;
use log::{error, info, warn};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{DeviceEvent, DeviceId, ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Window, WindowId};

use crate::config::DemoConfig;
use crate::frame::{FrameClock, FrameContext};
use crate::input::{KeyCode, NamedKey, WindowInput, WindowState};
use crate::lighting::RenderParams;
use crate::render::{Model, Renderer};
use crate::shader::ShaderSource;

/// Opens the window and runs the frame loop until the window closes.
pub fn run(config: DemoConfig) -> Result<()> {
    config.validate().context("invalid configuration")?;
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DemoApp::new(config);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    match app.last_error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// winit application driving one [`Viewer`].
pub struct DemoApp {
    config: DemoConfig,
    viewer: Option<Viewer>,
    last_error: Option<anyhow::Error>,
}

impl DemoApp {
    pub fn new(config: DemoConfig) -> Self {
        Self {
            config,
            viewer: None,
            last_error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.last_error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        match Viewer::new(event_loop, &self.config) {
            Ok(viewer) => {
                viewer.renderer.window().request_redraw();
                self.viewer = Some(viewer);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        if window_id != viewer.renderer.window_id() {
            return;
        }
        match event {
            WindowEvent::CloseRequested => viewer.input.request_close(),
            WindowEvent::Resized(size) => viewer.renderer.resize(size),
            WindowEvent::KeyboardInput { event, .. } => viewer.handle_keyboard(&event),
            WindowEvent::Focused(false) => viewer.input.release_all(),
            WindowEvent::Focused(true) => grab_cursor(viewer.renderer.window()),
            WindowEvent::RedrawRequested => {
                if let Err(err) = viewer.redraw() {
                    self.fail(event_loop, err);
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(viewer) = self.viewer.as_mut() else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            viewer.input.add_mouse_motion(DVec2::new(dx, dy));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(viewer) = self.viewer.as_ref() else {
            return;
        };
        if viewer.input.close_requested() {
            event_loop.exit();
        } else {
            viewer.renderer.window().request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if self.viewer.take().is_some() {
            info!("window closed; releasing GPU resources");
        }
    }
}

/// Everything that lives as long as the window.
struct Viewer {
    renderer: Renderer,
    model: Model,
    frame: FrameContext,
    input: WindowState,
    clock: FrameClock,
    started: Instant,
}

impl Viewer {
    fn new(event_loop: &ActiveEventLoop, config: &DemoConfig) -> Result<Self> {
        let shader = ShaderSource::load(&config.assets.shader_path)?;

        let attributes = Window::default_attributes()
            .with_title(config.window.title.clone())
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height))
            .with_resizable(config.window.resizable);
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create window")?,
        );
        grab_cursor(&window);

        let size = window.inner_size();
        let mut renderer = block_on(Renderer::new(Arc::clone(&window), &shader, config.window.vsync))?;
        let model = renderer
            .load_model(&config.assets.model_path)
            .context("failed to load model")?;

        let frame = FrameContext::new(config, RenderParams::default());
        frame.configure(renderer.uniforms_mut());

        Ok(Self {
            renderer,
            model,
            frame,
            input: WindowState::with_cursor(DVec2::new(
                f64::from(size.width) / 2.0,
                f64::from(size.height) / 2.0,
            )),
            clock: FrameClock::new(),
            started: Instant::now(),
        })
    }

    fn handle_keyboard(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(key) = map_keycode(code) else {
            return;
        };
        match event.state {
            ElementState::Pressed => self.input.set_key_down(key),
            ElementState::Released => self.input.set_key_up(key),
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let elapsed = self.clock.advance(self.started.elapsed().as_secs_f32());
        let viewport = self.renderer.size();
        let staged = self.frame.step(
            &mut self.input,
            elapsed,
            viewport,
            self.renderer.uniforms_mut(),
        );
        if staged.is_none() {
            return Ok(());
        }

        match self.renderer.render(&self.model) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.renderer.reconfigure();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                info!("Surface timeout; retrying next frame");
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(anyhow!("GPU is out of memory"));
            }
            Err(err) => warn!("skipping frame: {err}"),
        }
        Ok(())
    }
}

/// Hides the pointer and keeps it inside the window. Not every platform can
/// lock the pointer, so confining it is the fallback.
fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(err) = grabbed {
        warn!("unable to grab cursor: {err}");
    }
    window.set_cursor_visible(false);
}

fn map_keycode(code: winit::keyboard::KeyCode) -> Option<KeyCode> {
    use winit::keyboard::KeyCode as Key;
    Some(match code {
        Key::Space => KeyCode::Named(NamedKey::Space),
        Key::Enter => KeyCode::Named(NamedKey::Enter),
        Key::Tab => KeyCode::Named(NamedKey::Tab),
        Key::ArrowLeft => KeyCode::Named(NamedKey::Left),
        Key::ArrowRight => KeyCode::Named(NamedKey::Right),
        Key::ArrowUp => KeyCode::Named(NamedKey::Up),
        Key::ArrowDown => KeyCode::Named(NamedKey::Down),
        Key::Escape => KeyCode::Named(NamedKey::Escape),
        Key::Backspace => KeyCode::Named(NamedKey::Backspace),
        Key::ShiftLeft => KeyCode::Named(NamedKey::LeftShift),
        Key::ShiftRight => KeyCode::Named(NamedKey::RightShift),
        Key::ControlLeft => KeyCode::Named(NamedKey::LeftCtrl),
        Key::ControlRight => KeyCode::Named(NamedKey::RightCtrl),
        Key::AltLeft => KeyCode::Named(NamedKey::LeftAlt),
        Key::AltRight => KeyCode::Named(NamedKey::RightAlt),
        Key::Digit0 => KeyCode::Digit(0),
        Key::Digit1 => KeyCode::Digit(1),
        Key::Digit2 => KeyCode::Digit(2),
        Key::Digit3 => KeyCode::Digit(3),
        Key::Digit4 => KeyCode::Digit(4),
        Key::Digit5 => KeyCode::Digit(5),
        Key::Digit6 => KeyCode::Digit(6),
        Key::Digit7 => KeyCode::Digit(7),
        Key::Digit8 => KeyCode::Digit(8),
        Key::Digit9 => KeyCode::Digit(9),
        Key::KeyA => KeyCode::Character('A'),
        Key::KeyB => KeyCode::Character('B'),
        Key::KeyC => KeyCode::Character('C'),
        Key::KeyD => KeyCode::Character('D'),
        Key::KeyE => KeyCode::Character('E'),
        Key::KeyF => KeyCode::Character('F'),
        Key::KeyG => KeyCode::Character('G'),
        Key::KeyH => KeyCode::Character('H'),
        Key::KeyI => KeyCode::Character('I'),
        Key::KeyJ => KeyCode::Character('J'),
        Key::KeyK => KeyCode::Character('K'),
        Key::KeyL => KeyCode::Character('L'),
        Key::KeyM => KeyCode::Character('M'),
        Key::KeyN => KeyCode::Character('N'),
        Key::KeyO => KeyCode::Character('O'),
        Key::KeyP => KeyCode::Character('P'),
        Key::KeyQ => KeyCode::Character('Q'),
        Key::KeyR => KeyCode::Character('R'),
        Key::KeyS => KeyCode::Character('S'),
        Key::KeyT => KeyCode::Character('T'),
        Key::KeyU => KeyCode::Character('U'),
        Key::KeyV => KeyCode::Character('V'),
        Key::KeyW => KeyCode::Character('W'),
        Key::KeyX => KeyCode::Character('X'),
        Key::KeyY => KeyCode::Character('Y'),
        Key::KeyZ => KeyCode::Character('Z'),
        Key::F1 => KeyCode::Function(1),
        Key::F2 => KeyCode::Function(2),
        Key::F3 => KeyCode::Function(3),
        Key::F4 => KeyCode::Function(4),
        Key::F5 => KeyCode::Function(5),
        Key::F6 => KeyCode::Function(6),
        Key::F7 => KeyCode::Function(7),
        Key::F8 => KeyCode::Function(8),
        Key::F9 => KeyCode::Function(9),
        Key::F10 => KeyCode::Function(10),
        Key::F11 => KeyCode::Function(11),
        Key::F12 => KeyCode::Function(12),
        _ => return None,
    })
}
