//! Application error type.
//!
//! Exit-code conventions:
//! - 2: configuration / file-system problems (bad flags, unreadable ledger)
//! - 3: unusable input data (malformed spectrum file, spectrum too short)
//! - 4: numeric failure inside the fitting machinery
//!
//! Per-sample problems are logged and skipped rather than aborting the batch;
//! the process still exits 0 after the last file (partial failures carry no
//! distinct exit code).

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
