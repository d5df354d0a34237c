use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::window::{Window, WindowId};

use crate::config::Config;
use crate::controls::{Command, HostAction};
use crate::renderers::window::WindowState;
use crate::renderers::WindowRenderer;
use crate::workspace::Workspace;

const TITLE: &str = "shaderlab";
/// Pointer step for arrow keys, in pixels
const POINTER_STEP: i32 = 10;

/// Keys while the AI prompt is closed
pub fn command_for_key(key: &Key, modifiers: ModifiersState) -> Option<Command> {
    let command = match key {
        Key::Named(NamedKey::Escape) => Command::Dismiss,
        Key::Named(NamedKey::Space) => Command::TogglePause,
        Key::Named(NamedKey::ArrowUp) => Command::MovePointer { dx: 0, dy: -POINTER_STEP },
        Key::Named(NamedKey::ArrowDown) => Command::MovePointer { dx: 0, dy: POINTER_STEP },
        Key::Named(NamedKey::ArrowLeft) => Command::MovePointer { dx: -POINTER_STEP, dy: 0 },
        Key::Named(NamedKey::ArrowRight) => Command::MovePointer { dx: POINTER_STEP, dy: 0 },
        Key::Named(NamedKey::Tab) if modifiers.shift_key() => Command::PrevParam,
        Key::Named(NamedKey::Tab) => Command::NextParam,
        Key::Character(text) => match text.as_str() {
            "q" | "Q" => Command::Quit,
            "r" => Command::RestartTime,
            "c" => Command::NextComponent,
            "+" | "=" => Command::Increase,
            "-" | "_" => Command::Decrease,
            "0" => Command::ResetParam,
            "u" => Command::Undo,
            "U" => Command::Redo,
            "g" => Command::OpenPrompt,
            "e" => Command::ExplainError,
            _ => return None,
        },
        _ => return None,
    };
    Some(command)
}

fn centered_position(event_loop: &ActiveEventLoop, width: u32, height: u32) -> PhysicalPosition<i32> {
    match event_loop.primary_monitor() {
        Some(monitor) => {
            let size = monitor.size();
            let x = (size.width as i32 - width as i32) / 2;
            let y = (size.height as i32 - height as i32) / 2;
            PhysicalPosition::new(x.max(0), y.max(0))
        }
        None => PhysicalPosition::new(100, 100),
    }
}

// AIDEV-NOTE: WindowedApp drives everything from the winit loop on one thread:
// workspace polling, input, and presentation.
struct WindowedApp {
    window: Option<Arc<Window>>,
    renderer: Option<WindowRenderer>,
    workspace: Workspace,
    state: WindowState,
    modifiers: ModifiersState,
    params_seen: u64,
    title: String,
    perf: bool,
    fatal: Option<anyhow::Error>,
}

impl WindowedApp {
    fn new(workspace: Workspace, config: &Config, perf: bool) -> Self {
        Self {
            window: None,
            renderer: None,
            workspace,
            state: WindowState::new(config.display.window_width, config.display.window_height),
            modifiers: ModifiersState::empty(),
            params_seen: 0,
            title: String::new(),
            perf,
            fatal: None,
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(PhysicalSize::new(self.state.width, self.state.height))
            .with_position(centered_position(event_loop, self.state.width, self.state.height))
            .with_resizable(true);
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("Failed to create window")?,
        );

        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("Failed to create window surface")?;
        let size = window.inner_size();
        self.state.width = size.width;
        self.state.height = size.height;

        self.renderer = Some(WindowRenderer::new(
            &instance,
            surface,
            (size.width, size.height),
            self.perf,
        )?);
        self.window = Some(window);
        Ok(())
    }

    /// Hand the newest program and values from the session to the renderer
    fn sync_renderer(&mut self) {
        let Some(renderer) = &mut self.renderer else {
            return;
        };
        let session = &mut self.workspace.session;

        if session.params_revision() != self.params_seen {
            self.params_seen = session.params_revision();
            renderer.set_params(session.params());
        }
        if let Some(program) = session.take_program() {
            if let Err(e) = renderer.load_program(program) {
                log::error!("{e:#}");
                session.report(format!("{e:#}"));
            }
        }
    }

    fn handle_key(&mut self, event: &KeyEvent) -> Option<HostAction> {
        if self.workspace.prompt.is_open() {
            match &event.logical_key {
                Key::Named(NamedKey::Enter) => {
                    let command = self.workspace.prompt.submit();
                    return self.workspace.command(command);
                }
                Key::Named(NamedKey::Escape) => self.workspace.prompt.cancel(),
                Key::Named(NamedKey::Backspace) => self.workspace.prompt.backspace(),
                _ => {
                    if let Some(text) = &event.text {
                        text.chars().for_each(|c| self.workspace.prompt.push(c));
                    }
                }
            }
            return None;
        }
        command_for_key(&event.logical_key, self.modifiers)
            .and_then(|command| self.workspace.command(command))
    }

    fn apply_host_action(&mut self, action: HostAction, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        match action {
            HostAction::Quit => event_loop.exit(),
            HostAction::TogglePause => self.state.clock.toggle_pause(now),
            HostAction::RestartTime => self.state.clock.restart(now),
            HostAction::MovePointer { dx, dy } => {
                let (width, height) = (self.state.width, self.state.height);
                self.state.pointer.move_by(dx, dy, width, height);
            }
            HostAction::OpenPrompt => {}
        }
    }

    fn update_window_title(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let mut parts = vec![TITLE.to_string()];
        if let Some(fps) = self.renderer.as_ref().and_then(WindowRenderer::fps) {
            parts.push(format!("{fps:.1} fps"));
        }
        let panel = self.workspace.controls.panel(&self.workspace.session);
        if let Some(selected) = panel.get(self.workspace.controls.cursor.index) {
            parts.push(selected.trim_start_matches("> ").to_string());
        }
        parts.push(self.workspace.status().text().to_string());

        let title = parts.join(" | ");
        if title != self.title {
            window.set_title(&title);
            self.title = title;
        }
    }
}

impl ApplicationHandler for WindowedApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_window(event_loop) {
            self.fatal = Some(e);
            event_loop.exit();
            return;
        }
        self.sync_renderer();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                if let Some(action) = self.handle_key(&event) {
                    self.apply_host_action(action, event_loop);
                }
                self.sync_renderer();
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state
                    .update_cursor_position(position.x as f32, position.y as f32);
            }
            WindowEvent::Resized(size) => {
                self.state.width = size.width.max(1);
                self.state.height = size.height.max(1);
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(self.state.width, self.state.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(renderer) = &mut self.renderer {
                    if let Err(e) = renderer.render(&self.state) {
                        log::error!("Render error: {e:#}");
                        self.workspace.session.report(format!("Render error: {e:#}"));
                    }
                }
                self.update_window_title();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.workspace.poll(Instant::now());
        self.sync_renderer();

        if let Some(window) = &self.window {
            window.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::Poll);
    }
}

pub fn run_windowed_event_loop(
    shader_file: &Path,
    document: String,
    config: &Config,
    perf: bool,
) -> Result<()> {
    log::info!("Starting windowed preview of {}", shader_file.display());

    let workspace = Workspace::open(shader_file, document, config)?;
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = WindowedApp::new(workspace, config, perf);

    event_loop.run_app(&mut app).map_err(|e| anyhow!("Event loop error: {e}"))?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        let none = ModifiersState::empty();
        assert_eq!(
            command_for_key(&Key::Character("q".into()), none),
            Some(Command::Quit)
        );
        assert_eq!(
            command_for_key(&Key::Named(NamedKey::Tab), ModifiersState::SHIFT),
            Some(Command::PrevParam)
        );
        assert_eq!(
            command_for_key(&Key::Named(NamedKey::ArrowLeft), none),
            Some(Command::MovePointer { dx: -POINTER_STEP, dy: 0 })
        );
        assert_eq!(command_for_key(&Key::Character("x".into()), none), None);
    }
}
