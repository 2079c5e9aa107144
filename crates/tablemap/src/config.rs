//! Statement rendering configuration.

use serde::{Deserialize, Serialize};

use crate::hint::TableHint;
use crate::value::EnumMode;

/// Configuration shared by every builder of a statement.
///
/// Deserializable so it can live in an application's config file:
///
/// ```
/// use tablemap::{EnumMode, SqlConfig};
///
/// let config: SqlConfig = serde_json::from_str(r#"{"enum_mode": "as_string"}"#).unwrap();
/// assert_eq!(config.enum_mode, EnumMode::AsString);
/// assert_eq!(config.default_schema, "dbo");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqlConfig {
    /// Schema for tables whose metadata declares none.
    pub default_schema: String,
    /// Rendering of enum constants that have no column context.
    pub enum_mode: EnumMode,
    /// Hint attached to typed JOINs (`None` drops the `WITH` clause).
    pub join_hint: Option<TableHint>,
    /// Emit built statements as tracing events.
    pub log_statements: bool,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_logged_sql_length: Option<usize>,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            default_schema: "dbo".to_string(),
            enum_mode: EnumMode::AsInt,
            join_hint: Some(TableHint::NoLock),
            log_statements: true,
            max_logged_sql_length: Some(500),
        }
    }
}

impl SqlConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default schema.
    pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = schema.into();
        self
    }

    /// Set the enum rendering mode for constants without column context.
    pub fn enum_mode(mut self, mode: EnumMode) -> Self {
        self.enum_mode = mode;
        self
    }

    /// Set the hint used on typed JOINs.
    pub fn join_hint(mut self, hint: Option<TableHint>) -> Self {
        self.join_hint = hint;
        self
    }

    /// Disable statement logging.
    pub fn no_logging(mut self) -> Self {
        self.log_statements = false;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_logged_sql_length(mut self, len: usize) -> Self {
        self.max_logged_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_logged_sql_length = None;
        self
    }
}
