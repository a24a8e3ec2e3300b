//! Error types for hardware selection.

use thiserror::Error;

/// Errors that can occur while interpreting hardware settings.
///
/// Detection itself never fails; these only arise from user input such as
/// a forced accelerator name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SystemError {
    /// Accelerator name did not match any known kind.
    #[error("Unknown accelerator '{0}'. Expected one of: none, apple, nvidia, amd")]
    UnknownAccelerator(String),
}
