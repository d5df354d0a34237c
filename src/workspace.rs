use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::controls::{Command, Controls, HostAction, Outcome, PromptLine};
use crate::file_watcher::FileWatcher;
use crate::generate::{AiWorker, GeminiClient};
use crate::session::Session;

pub const HELP: &str =
    "tab param  c comp  +/- adjust  0 reset  u/U undo/redo  g ai  e explain  space pause  r restart  q quit";

// AIDEV-NOTE: IO shell around Session shared by both renderers: watches the shader file,
// commits edits, talks to the AI worker, and writes session-originated changes back.
pub struct Workspace {
    pub session: Session,
    pub controls: Controls,
    pub prompt: PromptLine,
    path: PathBuf,
    watcher: Option<FileWatcher>,
    ai: Option<AiWorker>,
    write_back: bool,
}

impl Workspace {
    pub fn open(path: &Path, document: String, config: &Config) -> Result<Self> {
        let watcher = match FileWatcher::new(path) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                log::warn!("Live reload disabled: {e:#}");
                None
            }
        };

        let ai = match GeminiClient::from_config(&config.generation) {
            Ok(client) => Some(AiWorker::spawn(Box::new(client))?),
            Err(e) => {
                log::warn!("AI generation unavailable: {e}");
                None
            }
        };

        Ok(Self {
            session: Session::new(document, &config.editor),
            controls: Controls::default(),
            prompt: PromptLine::default(),
            path: path.to_path_buf(),
            watcher,
            ai,
            write_back: config.editor.write_back,
        })
    }

    /// Pull in file edits, pending commits and AI results. True if state changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        let mut changed = false;

        if self.watcher.as_mut().is_some_and(|w| w.check_for_changes(now)) {
            match fs::read_to_string(&self.path) {
                Ok(document) => {
                    if self.session.edit(document, now) {
                        log::info!("Reloaded {}", self.path.display());
                        changed = true;
                    }
                }
                Err(e) => self.session.report(format!("File read error: {e}")),
            }
        }

        self.session.tick(now);

        while let Some(response) = self.ai.as_ref().and_then(AiWorker::try_recv) {
            if self.session.finish(response) {
                self.save();
            }
            changed = true;
        }

        changed
    }

    /// Route a command through the controls. Returns what the renderer must do itself.
    pub fn command(&mut self, command: Command) -> Option<HostAction> {
        match self.controls.apply(&mut self.session, command) {
            Outcome::Nothing | Outcome::ParamsChanged => None,
            Outcome::DocumentChanged => {
                self.save();
                None
            }
            Outcome::Request(request) => {
                let sent = self.ai.as_ref().is_some_and(|ai| ai.submit(request));
                if !sent {
                    self.session
                        .abandon_request("AI generation is unavailable (no API key?)");
                }
                None
            }
            Outcome::Host(HostAction::OpenPrompt) => {
                self.prompt.open();
                None
            }
            Outcome::Host(action) => Some(action),
        }
    }

    fn save(&mut self) {
        if !self.write_back {
            return;
        }
        if let Err(e) = fs::write(&self.path, self.session.document())
            .with_context(|| format!("Failed to write {}", self.path.display()))
        {
            log::error!("{e:#}");
            self.session.report(format!("{e:#}"));
        }
    }

    /// Most important message to show: prompt, activity, alert, explanation, error
    pub fn status(&self) -> Status {
        if self.prompt.is_open() {
            return Status::Prompt(format!("ai> {}", self.prompt.text()));
        }
        if self.session.is_generating() {
            return Status::Info("Generating...".to_string());
        }
        if self.session.is_busy() {
            return Status::Info("Asking for an explanation...".to_string());
        }
        if let Some(alert) = self.session.alert() {
            return Status::Alert(alert.to_string());
        }
        if let Some(explanation) = self.session.explanation() {
            return Status::Info(explanation.replace('\n', " "));
        }
        if let Some(error) = self.session.compile_error() {
            return Status::Error(error.to_string().replace('\n', " | "));
        }
        Status::Help
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Help,
    Prompt(String),
    Info(String),
    Alert(String),
    Error(String),
}

impl Status {
    pub fn text(&self) -> &str {
        match self {
            Status::Help => HELP,
            Status::Prompt(s) | Status::Info(s) | Status::Alert(s) | Status::Error(s) => s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::DEFAULT_DOCUMENT;

    fn temp_shader(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("shaderlab-ws-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("shader.hlsl");
        fs::write(&path, DEFAULT_DOCUMENT).unwrap();
        path
    }

    #[test]
    fn test_undo_writes_back() {
        let path = temp_shader("undo");
        let mut workspace =
            Workspace::open(&path, DEFAULT_DOCUMENT.to_string(), &Config::default()).unwrap();

        let edited = format!("uniform float gain;\n{DEFAULT_DOCUMENT}");
        workspace.session.replace(edited);
        assert_eq!(workspace.command(Command::Undo), None);
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_DOCUMENT);

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_host_actions_and_prompt() {
        let path = temp_shader("prompt");
        let mut workspace =
            Workspace::open(&path, DEFAULT_DOCUMENT.to_string(), &Config::default()).unwrap();

        assert_eq!(workspace.status(), Status::Help);
        assert_eq!(workspace.command(Command::Quit), Some(HostAction::Quit));
        assert_eq!(workspace.command(Command::OpenPrompt), None);
        assert!(workspace.prompt.is_open());
        workspace.prompt.push('x');
        assert_eq!(workspace.status(), Status::Prompt("ai> x".to_string()));

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
