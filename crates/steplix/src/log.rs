//! SQL logging through `tracing`.
//!
//! Events are emitted under the `steplix.sql` target, so they can be enabled
//! independently, e.g. `RUST_LOG=steplix.sql=debug`.

use tracing::Level;

/// Tracing target of every SQL event.
pub const SQL_TARGET: &str = "steplix.sql";

/// Emits the SQL that is about to be executed.
#[derive(Debug, Clone)]
pub struct SqlLogger {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes, on a char boundary). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for SqlLogger {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl SqlLogger {
    /// Create a new logger with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    /// Log `sql`, tagged with the entity (table) or operation it belongs to.
    pub fn log(&self, tag: &str, sql: &str) {
        /// Dispatch a tracing event at a runtime-determined level.
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let sql = self.truncate_sql(sql);
        emit_at_level!(self.level, target: "steplix.sql", tag, sql = %sql, "SQL Query");
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
