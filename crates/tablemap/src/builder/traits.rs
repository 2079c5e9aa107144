use crate::config::SqlConfig;
use crate::error::{MapError, MapResult};
use crate::log::{self, StatementKind};

/// Common surface of every statement builder.
pub trait SqlStatement {
    /// Statement kind, used for logging.
    fn kind(&self) -> StatementKind;

    fn config(&self) -> &SqlConfig;

    /// First error recorded by a fluent call, if any.
    fn build_error(&self) -> Option<&MapError>;

    /// Render the statement text. Does not log.
    fn render(&self) -> MapResult<String>;

    /// Validate builder state.
    fn validate(&self) -> MapResult<()> {
        match self.build_error() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Build the final SQL, terminated with `;`.
    ///
    /// Repeatable: the builder is not modified, so every call returns the
    /// same text.
    fn build(&self) -> MapResult<String> {
        self.validate()?;
        let sql = self.render()?;
        log::statement_built(self.kind(), &sql, self.config());
        Ok(sql)
    }
}
