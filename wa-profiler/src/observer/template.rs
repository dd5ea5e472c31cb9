//! Observer command line templating
//!
//! The profiler is told which process to watch by writing a placeholder token
//! (`PID` by default) somewhere in its arguments, e.g. `perf stat -p PID`.

use crate::domain::{HostId, TemplateError};

/// Placeholder substituted with the host process id
pub const DEFAULT_PLACEHOLDER: &str = "PID";

/// The profiler's command line as the user typed it
///
/// Immutable once built. The first token is the profiler executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverCommand {
    tokens: Vec<String>,
    placeholder: String,
}

impl ObserverCommand {
    /// Build a command from raw tokens
    ///
    /// # Errors
    /// Returns [`TemplateError::Empty`] when `tokens` is empty and
    /// [`TemplateError::EmptyPlaceholder`] when `placeholder` is empty.
    pub fn new(
        tokens: impl IntoIterator<Item = impl Into<String>>,
        placeholder: impl Into<String>,
    ) -> Result<Self, TemplateError> {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let placeholder = placeholder.into();
        if tokens.is_empty() {
            return Err(TemplateError::Empty);
        }
        if placeholder.is_empty() {
            return Err(TemplateError::EmptyPlaceholder);
        }
        Ok(Self { tokens, placeholder })
    }

    /// Profiler executable (first token)
    #[must_use]
    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    #[must_use]
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Substitute the host id into the command
    ///
    /// Only tokens exactly equal to the placeholder are replaced, so `PIDFILE`
    /// or `--pid=PID` pass through untouched. Length and order are preserved.
    #[must_use]
    pub fn render(&self, host: HostId) -> Vec<String> {
        let host = host.to_string();
        self.tokens
            .iter()
            .map(|token| if *token == self.placeholder { host.clone() } else { token.clone() })
            .collect()
    }
}
