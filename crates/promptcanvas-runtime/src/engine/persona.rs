//! Assistant persona selection.

use serde::{Deserialize, Serialize};

/// Model used when a persona does not name one.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// The assistant persona a run speaks as.
///
/// Its instructions become the system message of every prompt task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Display name.
    pub name: String,
    /// System instructions.
    #[serde(default)]
    pub instructions: String,
    /// Completion model identifier.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Persona {
    /// Creates a persona using [`DEFAULT_MODEL`].
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            model: default_model(),
        }
    }

    /// Sets the completion model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_defaults_when_omitted() {
        let persona: Persona =
            serde_json::from_str(r#"{ "name": "Analyst", "instructions": "Be brief." }"#).unwrap();
        assert_eq!(persona.model, DEFAULT_MODEL);
        assert_eq!(persona.instructions, "Be brief.");
    }
}
