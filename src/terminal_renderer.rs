use std::io::{stdout, Stdout, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    terminal::{self as crossterm_terminal, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::controls::{Command, HostAction};
use crate::terminal::{draw_text_row, update_buffer_from_frame, DoubleBuffer, Rgb};
use crate::threading::{
    lock, EventReceiver, EventSender, PerformanceTrackerHandle, SharedFrameBufferHandle,
    SharedRenderStateHandle, ThreadEvent,
};
use crate::workspace::{Status, Workspace};

/// Rows below the image: parameter strip and status line
pub const OVERLAY_ROWS: u16 = 2;

const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Pixel size of the offscreen image for a terminal of `cols` x `rows` cells
pub fn viewport_for(cols: u16, rows: u16) -> (u32, u32) {
    let image_rows = rows.saturating_sub(OVERLAY_ROWS).max(1);
    (cols.max(1) as u32, image_rows as u32 * 2)
}

/// Keys while the AI prompt line is closed
pub fn command_for_key(key: KeyEvent) -> Option<Command> {
    let command = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Command::Quit,
        KeyCode::Char('q') | KeyCode::Char('Q') => Command::Quit,
        KeyCode::Char(' ') => Command::TogglePause,
        KeyCode::Char('r') => Command::RestartTime,
        KeyCode::Up => Command::MovePointer { dx: 0, dy: -1 },
        KeyCode::Down => Command::MovePointer { dx: 0, dy: 1 },
        KeyCode::Left => Command::MovePointer { dx: -1, dy: 0 },
        KeyCode::Right => Command::MovePointer { dx: 1, dy: 0 },
        KeyCode::Tab => Command::NextParam,
        KeyCode::BackTab => Command::PrevParam,
        KeyCode::Char('c') => Command::NextComponent,
        KeyCode::Char('+') | KeyCode::Char('=') => Command::Increase,
        KeyCode::Char('-') | KeyCode::Char('_') => Command::Decrease,
        KeyCode::Char('0') => Command::ResetParam,
        KeyCode::Char('u') => Command::Undo,
        KeyCode::Char('U') => Command::Redo,
        KeyCode::Char('g') => Command::OpenPrompt,
        KeyCode::Char('e') => Command::ExplainError,
        KeyCode::Esc => Command::Dismiss,
        _ => return None,
    };
    Some(command)
}

fn status_colors(status: &Status) -> (Rgb, Rgb) {
    match status {
        Status::Help => ([150, 150, 150], [20, 20, 20]),
        Status::Prompt(_) => ([255, 255, 255], [30, 30, 60]),
        Status::Info(_) => ([255, 255, 255], [20, 60, 120]),
        Status::Alert(_) => ([0, 0, 0], [230, 180, 40]),
        Status::Error(_) => ([255, 255, 255], [150, 20, 20]),
    }
}

// AIDEV-NOTE: Terminal renderer runs in a dedicated thread; it owns the workspace
// (document, history, AI) and is the only writer of the shared render state.
pub struct TerminalRenderer {
    terminal_buffer: DoubleBuffer,
    workspace: Workspace,
    cols: u16,
    rows: u16,
    gpu_error: Option<String>,
    frame_interval: Duration,
    performance_tracker: Option<PerformanceTrackerHandle>,
}

impl TerminalRenderer {
    pub fn new(
        cols: u16,
        rows: u16,
        workspace: Workspace,
        max_fps: Option<u32>,
        performance_tracker: Option<PerformanceTrackerHandle>,
    ) -> Self {
        let frame_interval = max_fps
            .filter(|fps| *fps > 0)
            .map_or(DEFAULT_FRAME_INTERVAL, |fps| Duration::from_secs_f64(1.0 / fps as f64));

        Self {
            terminal_buffer: DoubleBuffer::new(cols as usize, rows as usize),
            workspace,
            cols,
            rows,
            gpu_error: None,
            frame_interval,
            performance_tracker,
        }
    }

    fn image_rows(&self) -> usize {
        self.rows.saturating_sub(OVERLAY_ROWS) as usize
    }

    fn push_session_state(&mut self, render_state: &SharedRenderStateHandle) {
        let session = &mut self.workspace.session;
        let program = session.take_program();
        let mut state = lock(render_state);
        if let Some(program) = program {
            state.submit_program(program);
        }
        state.set_params(session.params(), session.params_revision());
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<HostAction> {
        if self.workspace.prompt.is_open() {
            match key.code {
                KeyCode::Enter => {
                    let command = self.workspace.prompt.submit();
                    return self.workspace.command(command);
                }
                KeyCode::Esc => self.workspace.prompt.cancel(),
                KeyCode::Backspace => self.workspace.prompt.backspace(),
                KeyCode::Char(c) => self.workspace.prompt.push(c),
                _ => {}
            }
            return None;
        }
        command_for_key(key).and_then(|command| self.workspace.command(command))
    }

    fn apply_host_action(&mut self, action: HostAction, render_state: &SharedRenderStateHandle) -> bool {
        let now = Instant::now();
        let mut state = lock(render_state);
        match action {
            HostAction::Quit => return false,
            HostAction::TogglePause => state.clock.toggle_pause(now),
            HostAction::RestartTime => state.clock.restart(now),
            HostAction::MovePointer { dx, dy } => {
                let (width, height) = state.viewport;
                // One cell is one pixel wide and two pixels tall
                state.pointer.move_by(dx, dy * 2, width, height);
            }
            // Handled by the workspace
            HostAction::OpenPrompt => {}
        }
        true
    }

    fn resize(&mut self, cols: u16, rows: u16, render_state: &SharedRenderStateHandle) {
        self.cols = cols;
        self.rows = rows;
        self.terminal_buffer.resize(cols as usize, rows as usize);
        lock(render_state).viewport = viewport_for(cols, rows);
    }

    fn draw_overlay(&mut self) {
        let params_row = self.image_rows();
        let status_row = params_row + 1;

        let mut panel = self.workspace.controls.panel(&self.workspace.session);
        let selected = self.workspace.controls.cursor.index.min(panel.len().saturating_sub(1));
        panel.rotate_left(selected);
        let params_line = if panel.is_empty() {
            "(no parameters)".to_string()
        } else {
            panel.join("   ")
        };
        draw_text_row(&mut self.terminal_buffer, params_row, &params_line, [220, 220, 220], [10, 10, 10]);

        let mut status = self.workspace.status();
        if status == Status::Help {
            if let Some(error) = &self.gpu_error {
                status = Status::Error(format!("GPU: {error}"));
            }
        }
        let (fg, bg) = status_colors(&status);
        let text = match &self.performance_tracker {
            Some(tracker) => format!("{:5.1} fps  {}", lock(tracker).fps(), status.text()),
            None => status.text().to_string(),
        };
        draw_text_row(&mut self.terminal_buffer, status_row, &text, fg, bg);
    }

    fn present(&mut self, stdout: &mut Stdout) -> Result<()> {
        for (x, y, cell) in self.terminal_buffer.swap_and_get_changes() {
            queue!(stdout, MoveTo(x as u16, y as u16))?;
            stdout.write_all(cell.to_ansi().as_bytes())?;
        }
        stdout.flush()?;
        Ok(())
    }

    fn event_loop(
        &mut self,
        stdout: &mut Stdout,
        frame_buffer: &SharedFrameBufferHandle,
        render_state: &SharedRenderStateHandle,
        gpu_events: &EventReceiver,
    ) -> Result<()> {
        loop {
            let frame_start = Instant::now();

            self.workspace.poll(frame_start);
            self.push_session_state(render_state);

            while let Ok(event) = gpu_events.try_recv() {
                match event {
                    ThreadEvent::PipelineReady => self.gpu_error = None,
                    ThreadEvent::PipelineError(msg) | ThreadEvent::GpuError(msg) => {
                        self.gpu_error = Some(msg)
                    }
                    ThreadEvent::Shutdown => return Ok(()),
                    ThreadEvent::TerminalError(_) => {}
                }
            }

            while event::poll(Duration::ZERO)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = self.handle_key(key) {
                            if !self.apply_host_action(action, render_state) {
                                return Ok(());
                            }
                        }
                    }
                    Event::Resize(cols, rows) => self.resize(cols, rows, render_state),
                    _ => {}
                }
            }

            if let Some(frame) = lock(frame_buffer).take_frame() {
                let rows = self.image_rows();
                update_buffer_from_frame(&mut self.terminal_buffer, &frame, rows);
            }
            self.draw_overlay();
            self.present(stdout)?;

            let elapsed = frame_start.elapsed();
            if elapsed < self.frame_interval {
                std::thread::sleep(self.frame_interval - elapsed);
            }
        }
    }

    // AIDEV-NOTE: Main terminal thread function; restores the terminal on every exit path
    pub fn run_terminal_thread(
        mut self,
        frame_buffer: SharedFrameBufferHandle,
        render_state: SharedRenderStateHandle,
        main_sender: EventSender,
        gpu_events: EventReceiver,
    ) -> Result<()> {
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;
        crossterm_terminal::enable_raw_mode()?;

        let result = self.event_loop(&mut stdout, &frame_buffer, &render_state, &gpu_events);

        lock(&render_state).shutdown = true;
        let _ = crossterm_terminal::disable_raw_mode();
        let _ = execute!(stdout, Show, LeaveAlternateScreen);

        let event = match &result {
            Ok(()) => ThreadEvent::Shutdown,
            Err(e) => ThreadEvent::TerminalError(format!("{e:#}")),
        };
        let _ = main_sender.send(event);
        result
    }
}
