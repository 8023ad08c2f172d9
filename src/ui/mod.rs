use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use softbuffer::Surface;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{Key as LogicalKey, KeyCode, NamedKey, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowId};

use crate::app::Viewer;
use crate::input::{Button, InputState, Key};

pub mod render;

const ANIMATION_TICK: Duration = Duration::from_millis(16);

// ---------------------------------------------------------------------------
// Event translation
// ---------------------------------------------------------------------------

fn map_named(named: NamedKey) -> Option<Key> {
    Some(match named {
        NamedKey::ArrowLeft => Key::Left,
        NamedKey::ArrowRight => Key::Right,
        NamedKey::ArrowUp => Key::Up,
        NamedKey::ArrowDown => Key::Down,
        NamedKey::Home => Key::Home,
        NamedKey::End => Key::End,
        NamedKey::Escape => Key::Escape,
        NamedKey::Tab => Key::Tab,
        NamedKey::F5 => Key::F5,
        NamedKey::F11 => Key::F11,
        _ => return None,
    })
}

/// With Ctrl held some platforms report a control character instead of the
/// letter, so shortcut letters fall back to the physical key.
fn map_physical(code: KeyCode) -> Option<Key> {
    Some(Key::Char(match code {
        KeyCode::KeyO => 'o',
        KeyCode::KeyP => 'p',
        KeyCode::KeyL => 'l',
        KeyCode::KeyS => 's',
        _ => return None,
    }))
}

fn map_key(logical: &LogicalKey, physical: PhysicalKey) -> Option<Key> {
    match logical {
        LogicalKey::Named(named) => map_named(*named),
        LogicalKey::Character(s) => match s.chars().next() {
            Some(c) if !c.is_control() => Some(Key::Char(c.to_ascii_lowercase())),
            _ => match physical {
                PhysicalKey::Code(code) => map_physical(code),
                PhysicalKey::Unidentified(_) => None,
            },
        },
        _ => None,
    }
}

fn map_button(button: MouseButton) -> Option<Button> {
    match button {
        MouseButton::Left => Some(Button::Primary),
        MouseButton::Right => Some(Button::Secondary),
        MouseButton::Middle => Some(Button::Middle),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Application handler (winit 0.30 style)
// ---------------------------------------------------------------------------

pub struct App {
    pub viewer: Viewer,
    pub input: InputState,
    pub window: Option<Arc<Window>>,
    pub context: Option<softbuffer::Context<Arc<Window>>>,
    pub surface: Option<Surface<Arc<Window>, Arc<Window>>>,
    start: Instant,
}

impl App {
    pub fn new(viewer: Viewer) -> Self {
        Self {
            viewer,
            input: InputState::default(),
            window: None,
            context: None,
            surface: None,
            start: Instant::now(),
        }
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        let (Some(w), Some(h)) = (NonZeroU32::new(width.max(1)), NonZeroU32::new(height.max(1)))
        else {
            return;
        };
        if let Some(ref mut surface) = self.surface {
            if let Err(e) = surface.resize(w, h) {
                log::warn!("Failed to resize surface: {}", e);
            }
        }
        self.viewer.set_window_size((w.get() as i32, h.get() as i32));
    }

    /// Push viewer-driven window state (fullscreen, title, cursor) out to
    /// the OS window.
    fn sync_window(&self, window: &Window) {
        let is_fullscreen = window.fullscreen().is_some();
        if is_fullscreen != self.viewer.fullscreen {
            window.set_fullscreen(if self.viewer.fullscreen {
                Some(Fullscreen::Borderless(None))
            } else {
                None
            });
        }
        if window.title() != self.viewer.title {
            window.set_title(&self.viewer.title);
        }
        window.set_cursor_visible(!self.viewer.idle_hidden());
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = self.window.clone() else { return };

        self.viewer.frame(&self.input, self.start.elapsed().as_secs_f64());
        self.input.end_frame();
        if self.viewer.quit {
            event_loop.exit();
            return;
        }
        self.sync_window(&window);

        let Some(ref mut surface) = self.surface else { return };
        let size = window.inner_size();
        match surface.buffer_mut() {
            Ok(mut buffer) => {
                let mut canvas = render::Canvas {
                    pixels: &mut buffer,
                    width: size.width.max(1) as i32,
                    height: size.height.max(1) as i32,
                };
                render::draw_frame(&mut canvas, &self.viewer);
                if let Err(e) = buffer.present() {
                    log::warn!("Failed to present frame: {}", e);
                }
            }
            Err(e) => log::warn!("Failed to get frame buffer: {}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title(self.viewer.title.clone())
            .with_inner_size(LogicalSize::new(1280u32, 720u32));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        let context = match softbuffer::Context::new(Arc::clone(&window)) {
            Ok(c) => c,
            Err(e) => {
                log::error!("Failed to create drawing context: {}", e);
                event_loop.exit();
                return;
            }
        };
        let surface = match Surface::new(&context, Arc::clone(&window)) {
            Ok(s) => s,
            Err(e) => {
                log::error!("Failed to create drawing surface: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        window.request_redraw();
        self.window = Some(window);
        self.context = Some(context);
        self.surface = Some(surface);
        self.resize_surface(size.width, size.height);
        self.input.resized = true;
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                return;
            }

            WindowEvent::CloseRequested => self.input.close_requested = true,

            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.resize_surface(width, height);
                self.input.resized = true;
            }

            WindowEvent::Focused(false) => self.input.release_all(),

            WindowEvent::ModifiersChanged(modifiers) => {
                let state = modifiers.state();
                self.input.modifiers.ctrl = state.control_key();
                self.input.modifiers.shift = state.shift_key();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(key) = map_key(&event.logical_key, event.physical_key) {
                    let pressed = event.state == ElementState::Pressed;
                    self.input.key_event(key, pressed, event.repeat);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(button) = map_button(button) {
                    self.input
                        .button_event(button, state == ElementState::Pressed);
                }
            }

            WindowEvent::CursorMoved {
                position: PhysicalPosition { x, y },
                ..
            } => self.input.cursor_moved((x as i32, y as i32)),

            WindowEvent::MouseWheel { delta, .. } => {
                let (x, y) = match delta {
                    MouseScrollDelta::LineDelta(x, y) => (x, y),
                    MouseScrollDelta::PixelDelta(PhysicalPosition { x, y }) => {
                        (x as f32 / 40.0, y as f32 / 40.0)
                    }
                };
                self.input.scrolled(x, y);
            }

            WindowEvent::DroppedFile(path) => self.input.dropped.push(path),

            _ => return,
        }

        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.wants_continuous_redraw() {
            event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + ANIMATION_TICK));
            if let Some(ref window) = self.window {
                window.request_redraw();
            }
        } else {
            event_loop.set_control_flow(ControlFlow::Wait);
        }
    }
}
