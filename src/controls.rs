use crate::generate::AiRequest;
use crate::session::Session;
use crate::shader::{ParamValue, ParameterDescriptor, SemanticType};

/// Share of a scalar's range moved per step
const SCALAR_STEP_FRACTION: f32 = 0.01;
const VECTOR_STEP: f32 = 0.05;

/// Input-device independent user actions
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Quit,
    TogglePause,
    RestartTime,
    MovePointer { dx: i32, dy: i32 },
    NextParam,
    PrevParam,
    NextComponent,
    Increase,
    Decrease,
    ResetParam,
    Undo,
    Redo,
    OpenPrompt,
    SubmitPrompt(String),
    ExplainError,
    Dismiss,
}

/// Actions only the rendering host can carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    Quit,
    TogglePause,
    RestartTime,
    MovePointer { dx: i32, dy: i32 },
    OpenPrompt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Nothing,
    ParamsChanged,
    DocumentChanged,
    Request(AiRequest),
    Host(HostAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Selected parameter and vector component
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParamCursor {
    pub index: usize,
    pub component: usize,
}

impl ParamCursor {
    pub fn selected<'a>(&self, params: &'a [ParameterDescriptor]) -> Option<&'a ParameterDescriptor> {
        params.get(self.index)
    }

    /// Keep the cursor valid after the parameter list changed
    pub fn clamp(&mut self, params: &[ParameterDescriptor]) {
        if self.index >= params.len() {
            self.index = params.len().saturating_sub(1);
            self.component = 0;
        }
        let components = params.get(self.index).map_or(1, component_count);
        if self.component >= components {
            self.component = 0;
        }
    }

    pub fn next(&mut self, params: &[ParameterDescriptor]) {
        if !params.is_empty() {
            self.index = (self.index + 1) % params.len();
            self.component = 0;
        }
    }

    pub fn prev(&mut self, params: &[ParameterDescriptor]) {
        if !params.is_empty() {
            self.index = (self.index + params.len() - 1) % params.len();
            self.component = 0;
        }
    }

    pub fn next_component(&mut self, params: &[ParameterDescriptor]) {
        if let Some(param) = self.selected(params) {
            self.component = (self.component + 1) % component_count(param);
        }
    }
}

fn component_count(param: &ParameterDescriptor) -> usize {
    match param.semantic_type {
        SemanticType::Scalar | SemanticType::Boolean => 1,
        SemanticType::Vector2 => 2,
        SemanticType::Vector3 | SemanticType::Color => 3,
    }
}

fn step_vector<const N: usize>(mut v: [f32; N], component: usize, delta: f32, clamp: bool) -> [f32; N] {
    if let Some(c) = v.get_mut(component) {
        *c += delta;
        if clamp {
            *c = c.clamp(0.0, 1.0);
        }
    }
    v
}

/// Nudge one component of a parameter. Returns true if the value changed.
pub fn adjust(param: &mut ParameterDescriptor, component: usize, direction: Direction) -> bool {
    let sign = match direction {
        Direction::Up => 1.0,
        Direction::Down => -1.0,
    };

    let next = match (param.semantic_type, param.value) {
        (SemanticType::Scalar, ParamValue::Scalar(v)) => {
            let (min, max) = param.range.unwrap_or((0.0, 1.0));
            let step = (max - min) * SCALAR_STEP_FRACTION;
            ParamValue::Scalar((v + sign * step).clamp(min, max))
        }
        (SemanticType::Vector2, ParamValue::Vector2(v)) => {
            ParamValue::Vector2(step_vector(v, component, sign * VECTOR_STEP, false))
        }
        (SemanticType::Vector3, ParamValue::Vector3(v)) => {
            ParamValue::Vector3(step_vector(v, component, sign * VECTOR_STEP, false))
        }
        (SemanticType::Color, ParamValue::Vector3(v)) => {
            ParamValue::Vector3(step_vector(v, component, sign * VECTOR_STEP, true))
        }
        (SemanticType::Boolean, ParamValue::Boolean(b)) => ParamValue::Boolean(!b),
        _ => return false,
    };

    if next == param.value {
        return false;
    }
    param.set_value(next).is_ok()
}

fn fmt_components(values: &[f32], selected: Option<usize>) -> String {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            if Some(i) == selected {
                format!("[{v:.2}]")
            } else {
                format!("{v:.2}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// One-line label such as `intensity 0.50 (0..5)` or `tint rgb(1.00, [0.50], 0.20)`
pub fn describe(param: &ParameterDescriptor, selected_component: Option<usize>) -> String {
    let name = &param.name;
    match (param.semantic_type, param.value) {
        (SemanticType::Scalar, ParamValue::Scalar(v)) => match param.range {
            Some((min, max)) => format!("{name} {v:.2} ({min}..{max})"),
            None => format!("{name} {v:.2}"),
        },
        (SemanticType::Color, value) => {
            format!("{name} rgb({})", fmt_components(&value.components(), selected_component))
        }
        (SemanticType::Vector2 | SemanticType::Vector3, value) => {
            format!("{name} ({})", fmt_components(&value.components(), selected_component))
        }
        (SemanticType::Boolean, ParamValue::Boolean(b)) => {
            format!("{name} {}", if b { "on" } else { "off" })
        }
        (_, value) => format!("{name} {value:?}"),
    }
}

#[derive(Debug, Default)]
pub struct Controls {
    pub cursor: ParamCursor,
}

impl Controls {
    pub fn apply(&mut self, session: &mut Session, command: Command) -> Outcome {
        self.cursor.clamp(session.params());

        match command {
            Command::Quit => Outcome::Host(HostAction::Quit),
            Command::TogglePause => Outcome::Host(HostAction::TogglePause),
            Command::RestartTime => Outcome::Host(HostAction::RestartTime),
            Command::MovePointer { dx, dy } => Outcome::Host(HostAction::MovePointer { dx, dy }),
            Command::OpenPrompt => Outcome::Host(HostAction::OpenPrompt),
            Command::NextParam => {
                self.cursor.next(session.params());
                Outcome::Nothing
            }
            Command::PrevParam => {
                self.cursor.prev(session.params());
                Outcome::Nothing
            }
            Command::NextComponent => {
                self.cursor.next_component(session.params());
                Outcome::Nothing
            }
            Command::Increase | Command::Decrease => {
                let direction = if command == Command::Increase {
                    Direction::Up
                } else {
                    Direction::Down
                };
                let cursor = self.cursor;
                if session.params().is_empty() {
                    return Outcome::Nothing;
                }
                match session.params_mut().get_mut(cursor.index) {
                    Some(param) => {
                        if adjust(param, cursor.component, direction) {
                            Outcome::ParamsChanged
                        } else {
                            Outcome::Nothing
                        }
                    }
                    None => Outcome::Nothing,
                }
            }
            Command::ResetParam => {
                let index = self.cursor.index;
                if session.params().get(index).is_none() {
                    return Outcome::Nothing;
                }
                if let Some(param) = session.params_mut().get_mut(index) {
                    param.reset();
                }
                Outcome::ParamsChanged
            }
            Command::Undo => self.document_outcome(session.undo(), session),
            Command::Redo => self.document_outcome(session.redo(), session),
            Command::SubmitPrompt(prompt) => match session.begin_generation(&prompt) {
                Ok(request) => Outcome::Request(request),
                Err(e) => {
                    session.report(e.to_string());
                    Outcome::Nothing
                }
            },
            Command::ExplainError => match session.begin_explain() {
                Ok(request) => Outcome::Request(request),
                Err(e) => {
                    session.report(e.to_string());
                    Outcome::Nothing
                }
            },
            Command::Dismiss => {
                session.dismiss();
                Outcome::Nothing
            }
        }
    }

    fn document_outcome(&mut self, changed: bool, session: &Session) -> Outcome {
        if changed {
            self.cursor.clamp(session.params());
            Outcome::DocumentChanged
        } else {
            Outcome::Nothing
        }
    }

    /// Parameter panel lines, selected entry marked
    pub fn panel(&self, session: &Session) -> Vec<String> {
        session
            .params()
            .iter()
            .enumerate()
            .map(|(i, param)| {
                if i == self.cursor.index {
                    format!("> {}", describe(param, Some(self.cursor.component)))
                } else {
                    format!("  {}", describe(param, None))
                }
            })
            .collect()
    }
}

/// Single-line text input for AI prompts
#[derive(Debug, Default)]
pub struct PromptLine {
    text: String,
    open: bool,
}

impl PromptLine {
    pub fn open(&mut self) {
        self.open = true;
        self.text.clear();
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn push(&mut self, c: char) {
        if !c.is_control() {
            self.text.push(c);
        }
    }

    pub fn backspace(&mut self) {
        self.text.pop();
    }

    pub fn cancel(&mut self) {
        self.open = false;
        self.text.clear();
    }

    /// Close the line and hand back what was typed
    pub fn submit(&mut self) -> Command {
        self.open = false;
        Command::SubmitPrompt(std::mem::take(&mut self.text))
    }
}
