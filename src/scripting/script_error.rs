//! Error type shared by the handler scripting backend.
//!
//! Rhai reports failures as `Box<EvalAltResult>`. They are folded into
//! [`ScriptError`] so the loader can record a readable load diagnostic and the
//! dispatcher can surface the raised message in a failure envelope.

use rhai::EvalAltResult;
use std::fmt;

/// Errors that can occur while compiling or running a handler script
#[derive(Debug, Clone)]
pub enum ScriptError {
    /// Compilation or parsing error
    CompilationError {
        /// Parser message
        message: String,
        /// 1-based line, if known
        line: Option<usize>,
        /// 1-based column, if known
        column: Option<usize>,
    },

    /// Runtime execution error, including `throw` from a script
    RuntimeError {
        /// Raised value rendered as text
        message: String,
    },

    /// Type conversion error between JSON and script values
    TypeConversionError {
        /// Type the conversion wanted
        expected: String,
        /// Type that was actually present
        found: String,
    },

    /// Handler source could not be read
    SourceUnavailable {
        /// Path that was read
        path: String,
        /// Underlying I/O message
        message: String,
    },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::CompilationError {
                message,
                line,
                column,
            } => {
                write!(f, "Compilation error: {}", message)?;
                if let Some(line) = line {
                    write!(f, " at line {}", line)?;
                }
                if let Some(col) = column {
                    write!(f, ", column {}", col)?;
                }
                Ok(())
            }
            ScriptError::RuntimeError { message } => write!(f, "Runtime error: {}", message),
            ScriptError::TypeConversionError { expected, found } => {
                write!(
                    f,
                    "Type conversion error: expected {}, found {}",
                    expected, found
                )
            }
            ScriptError::SourceUnavailable { path, message } => {
                write!(f, "Cannot read handler source {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for ScriptError {}

impl From<Box<EvalAltResult>> for ScriptError {
    fn from(error: Box<EvalAltResult>) -> Self {
        convert_rhai_error(error)
    }
}

/// Convert Rhai's EvalAltResult to our ScriptError type
pub(crate) fn convert_rhai_error(error: Box<EvalAltResult>) -> ScriptError {
    match *error {
        EvalAltResult::ErrorParsing(parse_error, pos) => ScriptError::CompilationError {
            message: format!("{}", parse_error),
            line: pos.line(),
            column: pos.position(),
        },
        // call_fn wraps failures raised inside the called function
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => convert_rhai_error(inner),
        EvalAltResult::ErrorRuntime(value, _) => ScriptError::RuntimeError {
            message: value.to_string(),
        },
        EvalAltResult::ErrorTerminated(token, _) => ScriptError::RuntimeError {
            message: token.to_string(),
        },
        EvalAltResult::ErrorMismatchDataType(expected, actual, _) => {
            ScriptError::TypeConversionError {
                expected,
                found: actual,
            }
        }
        other => ScriptError::RuntimeError {
            message: format!("{}", other),
        },
    }
}
