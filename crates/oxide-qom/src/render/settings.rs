//! Render settings.

use serde::{Deserialize, Serialize};

/// How values are emitted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// Values become placeholders and are collected as binds.
    #[default]
    Indexed,
    /// Values are escaped and inlined into the SQL text.
    Inlined,
}

/// When identifiers are quoted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderQuotedNames {
    /// Quote every identifier.
    Always,
    /// Quote identifiers that are not plain words or that are reserved.
    #[default]
    AsNeeded,
    /// Never quote identifiers.
    Never,
}

/// Settings that influence rendering.
///
/// Missing fields take their default values when deserializing:
///
/// ```
/// use oxide_qom::render::{ParamType, Settings};
///
/// let settings = Settings::from_json(r#"{ "param_type": "inlined" }"#).unwrap();
/// assert_eq!(settings.param_type, ParamType::Inlined);
/// assert!(!settings.render_formatted);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How values are emitted.
    pub param_type: ParamType,
    /// When identifiers are quoted.
    pub render_quoted_names: RenderQuotedNames,
    /// Put clauses on their own lines and indent subqueries.
    pub render_formatted: bool,
    /// One level of indentation when formatting.
    pub indentation: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            param_type: ParamType::Indexed,
            render_quoted_names: RenderQuotedNames::AsNeeded,
            render_formatted: false,
            indentation: String::from("  "),
        }
    }
}

impl Settings {
    /// Parses settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets the parameter type.
    #[must_use]
    pub const fn with_param_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }

    /// Sets the quoting policy.
    #[must_use]
    pub const fn with_quoted_names(mut self, quoted: RenderQuotedNames) -> Self {
        self.render_quoted_names = quoted;
        self
    }

    /// Enables or disables formatted output.
    #[must_use]
    pub const fn with_formatting(mut self, formatted: bool) -> Self {
        self.render_formatted = formatted;
        self
    }
}
