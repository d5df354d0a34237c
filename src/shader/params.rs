use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SemanticType {
    Scalar,
    Vector2,
    Vector3,
    /// A three-component vector presented as RGB
    Color,
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(f32),
    Vector2([f32; 2]),
    Vector3([f32; 3]),
    Boolean(bool),
}

impl ParamValue {
    /// Components as floats, booleans become 0.0 or 1.0
    pub fn components(&self) -> Vec<f32> {
        match *self {
            ParamValue::Scalar(v) => vec![v],
            ParamValue::Vector2(v) => v.to_vec(),
            ParamValue::Vector3(v) => v.to_vec(),
            ParamValue::Boolean(b) => vec![if b { 1.0 } else { 0.0 }],
        }
    }

    fn fits(&self, semantic_type: SemanticType) -> bool {
        matches!(
            (self, semantic_type),
            (ParamValue::Scalar(_), SemanticType::Scalar)
                | (ParamValue::Vector2(_), SemanticType::Vector2)
                | (ParamValue::Vector3(_), SemanticType::Vector3 | SemanticType::Color)
                | (ParamValue::Boolean(_), SemanticType::Boolean)
        )
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("no parameter named '{0}'")]
    UnknownParameter(String),
    #[error("value {value:?} does not fit parameter '{name}' of type {semantic_type:?}")]
    TypeMismatch {
        name: String,
        semantic_type: SemanticType,
        value: ParamValue,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub semantic_type: SemanticType,
    pub value: ParamValue,
    pub default: ParamValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<(f32, f32)>,
}

impl ParameterDescriptor {
    /// Descriptor holding the fixed default for its type
    pub fn with_default(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        let (default, range) = match semantic_type {
            SemanticType::Scalar => (ParamValue::Scalar(0.5), Some((0.0, 5.0))),
            SemanticType::Vector2 => (ParamValue::Vector2([0.5, 0.5]), None),
            SemanticType::Vector3 => (ParamValue::Vector3([0.5, 0.5, 0.5]), None),
            SemanticType::Color => (ParamValue::Vector3([1.0, 0.5, 0.2]), None),
            SemanticType::Boolean => (ParamValue::Boolean(false), None),
        };
        Self {
            name: name.into(),
            semantic_type,
            value: default,
            default,
            range,
        }
    }

    /// Replace the default (and current value) with a seeded one.
    /// Scalar ranges widen to include the seed.
    pub(crate) fn seed(&mut self, value: ParamValue) {
        if !value.fits(self.semantic_type) {
            return;
        }
        if let (ParamValue::Scalar(v), Some((min, max))) = (value, self.range) {
            self.range = Some((min.min(v), max.max(v)));
        }
        self.default = value;
        self.value = value;
    }

    pub fn set_value(&mut self, value: ParamValue) -> Result<(), ParamError> {
        if !value.fits(self.semantic_type) {
            return Err(ParamError::TypeMismatch {
                name: self.name.clone(),
                semantic_type: self.semantic_type,
                value,
            });
        }
        self.value = value;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.value = self.default;
    }
}

// AIDEV-NOTE: Carry live values forward by (name, semantic type) identity. Entries that
// vanished or changed type lose their value; new entries keep the extracted default.
pub fn reconcile(
    previous: &[ParameterDescriptor],
    extracted: Vec<ParameterDescriptor>,
) -> Vec<ParameterDescriptor> {
    extracted
        .into_iter()
        .map(|mut descriptor| {
            if let Some(prior) = previous.iter().find(|p| {
                p.name == descriptor.name && p.semantic_type == descriptor.semantic_type
            }) {
                descriptor.value = prior.value;
            }
            descriptor
        })
        .collect()
}

pub fn set_value(
    params: &mut [ParameterDescriptor],
    name: &str,
    value: ParamValue,
) -> Result<(), ParamError> {
    params
        .iter_mut()
        .find(|p| p.name == name)
        .ok_or_else(|| ParamError::UnknownParameter(name.to_string()))?
        .set_value(value)
}
