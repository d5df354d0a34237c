pub mod history;

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::EditorConfig;
use crate::generate::{AiRequest, AiResponse};
use crate::gpu::{compile_program, CompileError, CompiledProgram};
use crate::shader::params::set_value;
use crate::shader::{
    assemble, extract, reconcile, ExtractOptions, ParamError, ParamValue, ParameterDescriptor,
};

pub use history::History;

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("prompt is empty")]
    EmptyPrompt,
    #[error("an AI request is already in progress")]
    AlreadyGenerating,
    #[error("there is no compile error to explain")]
    NothingToExplain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Generate,
    Explain,
}

// AIDEV-NOTE: Session is the single writer of the document. Every document change runs
// extract+reconcile and assemble+compile synchronously; renderers pick up the newest
// program via take_program and the newest values via params_revision.
pub struct Session {
    document: String,
    history: History,
    dirty_since: Option<Instant>,
    commit_debounce: Duration,
    extract_options: ExtractOptions,
    params: Vec<ParameterDescriptor>,
    params_revision: u64,
    pending_program: Option<CompiledProgram>,
    compile_error: Option<CompileError>,
    alert: Option<String>,
    explanation: Option<String>,
    in_flight: Option<RequestKind>,
}

impl Session {
    pub fn new(document: String, config: &EditorConfig) -> Self {
        let mut session = Self {
            history: History::new(document.clone(), config.history_depth),
            document,
            dirty_since: None,
            commit_debounce: Duration::from_millis(config.commit_debounce_ms),
            extract_options: ExtractOptions {
                seed_from_initializer: config.seed_from_initializer,
            },
            params: Vec::new(),
            params_revision: 0,
            pending_program: None,
            compile_error: None,
            alert: None,
            explanation: None,
            in_flight: None,
        };
        session.refresh();
        session
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn params(&self) -> &[ParameterDescriptor] {
        &self.params
    }

    /// Bumped whenever any parameter value or the parameter list changes
    pub fn params_revision(&self) -> u64 {
        self.params_revision
    }

    pub fn compile_error(&self) -> Option<&CompileError> {
        self.compile_error.as_ref()
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight == Some(RequestKind::Generate)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty_since.is_some()
    }

    /// Newest successfully compiled program not yet handed to a renderer
    pub fn take_program(&mut self) -> Option<CompiledProgram> {
        self.pending_program.take()
    }

    pub fn dismiss(&mut self) {
        self.alert = None;
        self.explanation = None;
    }

    /// Direct edit of the document. Committed to history once edits go quiet.
    pub fn edit(&mut self, document: String, now: Instant) -> bool {
        if document == self.document {
            return false;
        }
        self.document = document;
        self.dirty_since = Some(now);
        self.refresh();
        true
    }

    /// Commit a pending edit once the debounce interval has passed
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.dirty_since {
            Some(since) if now.duration_since(since) >= self.commit_debounce => {
                self.commit_now();
                true
            }
            _ => false,
        }
    }

    pub fn commit_now(&mut self) {
        self.history.commit(&self.document);
        self.dirty_since = None;
    }

    /// Wholesale replacement, committed immediately
    pub fn replace(&mut self, document: String) {
        if self.is_dirty() {
            self.commit_now();
        }
        self.document = document;
        self.commit_now();
        self.refresh();
    }

    /// Uncommitted edits are reverted first; otherwise steps back one entry
    pub fn undo(&mut self) -> bool {
        let target = if self.is_dirty() {
            self.dirty_since = None;
            Some(self.history.current().to_string())
        } else {
            self.history.undo().map(str::to_string)
        };
        self.load(target)
    }

    pub fn redo(&mut self) -> bool {
        if self.is_dirty() {
            return false;
        }
        let target = self.history.redo().map(str::to_string);
        self.load(target)
    }

    fn load(&mut self, target: Option<String>) -> bool {
        match target {
            Some(document) if document != self.document => {
                self.document = document;
                self.refresh();
                true
            }
            _ => false,
        }
    }

    pub fn set_param(&mut self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        set_value(&mut self.params, name, value)?;
        self.params_revision += 1;
        Ok(())
    }

    /// Mutable access for controls; counts as a parameter change
    pub fn params_mut(&mut self) -> &mut [ParameterDescriptor] {
        self.params_revision += 1;
        &mut self.params
    }

    pub fn begin_generation(&mut self, prompt: &str) -> Result<AiRequest, SessionError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(SessionError::EmptyPrompt);
        }
        if self.is_busy() {
            return Err(SessionError::AlreadyGenerating);
        }
        self.in_flight = Some(RequestKind::Generate);
        self.alert = None;
        Ok(AiRequest::Generate {
            prompt: prompt.to_string(),
            current_code: self.document.clone(),
        })
    }

    pub fn begin_explain(&mut self) -> Result<AiRequest, SessionError> {
        let error = self
            .compile_error
            .as_ref()
            .ok_or(SessionError::NothingToExplain)?
            .to_string();
        if self.is_busy() {
            return Err(SessionError::AlreadyGenerating);
        }
        self.in_flight = Some(RequestKind::Explain);
        Ok(AiRequest::Explain {
            code: self.document.clone(),
            error,
        })
    }

    /// Request could not be sent; reopen the gate
    pub fn abandon_request(&mut self, reason: &str) {
        self.in_flight = None;
        self.alert = Some(reason.to_string());
    }

    /// Apply a worker response. Returns true if the document changed.
    pub fn finish(&mut self, response: AiResponse) -> bool {
        self.in_flight = None;
        match response {
            AiResponse::Generated(Ok(code)) => {
                let changed = code != self.document;
                self.replace(code);
                changed
            }
            AiResponse::Generated(Err(e)) => {
                self.alert = Some(format!("Generation failed: {e}"));
                false
            }
            AiResponse::Explained(text) => {
                self.explanation = Some(text);
                false
            }
        }
    }

    pub fn report(&mut self, alert: impl Into<String>) {
        self.alert = Some(alert.into());
    }

    fn refresh(&mut self) {
        let extracted = extract(&self.document, &self.extract_options);
        self.params = reconcile(&self.params, extracted);
        self.params_revision += 1;

        match compile_program(&assemble(&self.document)) {
            Ok(program) => {
                self.pending_program = Some(program);
                self.compile_error = None;
                self.explanation = None;
            }
            Err(e) => {
                log::debug!("Compile failed: {e}");
                self.compile_error = Some(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::GenerateError;
    use crate::shader::{SemanticType, DEFAULT_DOCUMENT};

    const BROKEN: &str = "float4 mainImage(float2 uv) { return float4(missingThing); }\n";

    fn config() -> EditorConfig {
        EditorConfig {
            history_depth: 10,
            commit_debounce_ms: 750,
            seed_from_initializer: false,
            write_back: false,
        }
    }

    fn session() -> Session {
        Session::new(DEFAULT_DOCUMENT.to_string(), &config())
    }

    fn prepend(document: &str, extra: &str) -> String {
        format!("{extra}\n{document}")
    }

    #[test]
    fn test_new_session_compiles() {
        let mut session = session();
        assert!(session.compile_error().is_none());
        assert!(session.take_program().is_some());
        assert!(session.take_program().is_none());
        assert_eq!(session.params().len(), 2);
    }

    #[test]
    fn test_values_survive_edits() {
        let mut session = session();
        session.set_param("intensity", ParamValue::Scalar(3.2)).unwrap();

        let edited = prepend(DEFAULT_DOCUMENT, "uniform float speed;");
        assert!(session.edit(edited, Instant::now()));

        let intensity = session.params().iter().find(|p| p.name == "intensity").unwrap();
        assert_eq!(intensity.value, ParamValue::Scalar(3.2));
        assert!(session.params().iter().any(|p| p.name == "speed"));
    }

    #[test]
    fn test_compile_error_keeps_last_program_pending_state() {
        let mut session = session();
        session.take_program();

        session.edit(BROKEN.to_string(), Instant::now());
        assert!(session.compile_error().is_some());
        assert!(session.take_program().is_none());

        session.edit(DEFAULT_DOCUMENT.to_string(), Instant::now());
        assert!(session.compile_error().is_none());
        assert!(session.take_program().is_some());
    }

    #[test]
    fn test_debounced_commit() {
        let mut session = session();
        let t0 = Instant::now();
        session.edit(prepend(DEFAULT_DOCUMENT, "// one"), t0);

        assert!(!session.tick(t0 + Duration::from_millis(100)));
        assert!(session.is_dirty());
        assert!(session.tick(t0 + Duration::from_millis(800)));
        assert!(!session.is_dirty());
        assert!(session.undo());
        assert_eq!(session.document(), DEFAULT_DOCUMENT);
    }

    #[test]
    fn test_undo_dirty_reverts_to_last_commit() {
        let mut session = session();
        let t0 = Instant::now();
        session.edit(prepend(DEFAULT_DOCUMENT, "// one"), t0);
        session.tick(t0 + Duration::from_secs(1));

        session.edit(prepend(DEFAULT_DOCUMENT, "// two"), t0 + Duration::from_secs(2));
        assert!(session.undo());
        assert!(session.document().starts_with("// one"));

        assert!(session.undo());
        assert_eq!(session.document(), DEFAULT_DOCUMENT);
        assert!(!session.undo());

        assert!(session.redo());
        assert!(session.document().starts_with("// one"));
    }

    #[test]
    fn test_identical_edit_is_ignored() {
        let mut session = session();
        assert!(!session.edit(DEFAULT_DOCUMENT.to_string(), Instant::now()));
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_generation_gate() {
        let mut session = session();
        assert_eq!(session.begin_generation("   "), Err(SessionError::EmptyPrompt));

        let request = session.begin_generation("make it blue").unwrap();
        assert!(matches!(request, AiRequest::Generate { ref prompt, .. } if prompt == "make it blue"));
        assert!(session.is_generating());
        assert_eq!(
            session.begin_generation("again"),
            Err(SessionError::AlreadyGenerating)
        );
    }

    #[test]
    fn test_generation_failure_leaves_document() {
        let mut session = session();
        session.begin_generation("anything").unwrap();

        assert!(!session.finish(AiResponse::Generated(Err(GenerateError::EmptyResponse))));
        assert_eq!(session.document(), DEFAULT_DOCUMENT);
        assert!(session.alert().is_some());
        assert!(!session.is_generating());
    }

    #[test]
    fn test_generation_success_is_undoable() {
        let mut session = session();
        session.begin_generation("gain").unwrap();

        let generated = "uniform float3 glowColor;\nfloat4 mainImage(float2 uv) { return float4(glowColor, 1.0); }\n";
        assert!(session.finish(AiResponse::Generated(Ok(generated.to_string()))));
        assert_eq!(session.document(), generated);
        assert_eq!(session.params()[0].semantic_type, SemanticType::Color);

        assert!(session.undo());
        assert_eq!(session.document(), DEFAULT_DOCUMENT);
    }

    #[test]
    fn test_explain_requires_error() {
        let mut session = session();
        assert_eq!(session.begin_explain(), Err(SessionError::NothingToExplain));

        session.edit(BROKEN.to_string(), Instant::now());
        let request = session.begin_explain().unwrap();
        assert!(matches!(request, AiRequest::Explain { ref code, .. } if code == BROKEN));

        session.finish(AiResponse::Explained("Declare missingThing.".into()));
        assert_eq!(session.explanation(), Some("Declare missingThing."));
        session.dismiss();
        assert_eq!(session.explanation(), None);
    }
}
