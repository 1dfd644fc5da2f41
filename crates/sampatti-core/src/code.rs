//! Emergency access code generation

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

/// Length of an emergency access code
pub const ACCESS_CODE_LEN: usize = 8;

/// Source of fresh cleartext access codes
pub trait CodeSource: Send + Sync + std::fmt::Debug {
    fn generate(&self) -> String;
}

/// Alphanumeric codes drawn from the OS CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsCodeSource;

impl CodeSource for OsCodeSource {
    fn generate(&self) -> String {
        OsRng
            .sample_iter(&Alphanumeric)
            .take(ACCESS_CODE_LEN)
            .map(char::from)
            .collect()
    }
}

/// Always yields the same code
#[derive(Debug, Clone)]
pub struct FixedCodeSource(pub String);

impl FixedCodeSource {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

impl CodeSource for FixedCodeSource {
    fn generate(&self) -> String {
        self.0.clone()
    }
}
