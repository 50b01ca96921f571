use constraints::Encoding;
use serde::{Deserialize, Serialize};

/// Compiler limits and output options. Every field has a default, so an
/// empty TOML document is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Function whose parameters become the circuit inputs.
    pub entry: String,
    pub max_unroll_iterations: usize,
    pub max_call_depth: usize,
    /// Append a blinding row to the lowered system.
    pub randomize: bool,
    /// Run the lexer on its own thread behind a channel of this capacity.
    pub token_buffer: Option<usize>,
    pub encoding: Encoding,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            entry: "main".to_string(),
            max_unroll_iterations: 10_000,
            max_call_depth: 128,
            randomize: false,
            token_buffer: None,
            encoding: Encoding::Sparse,
        }
    }
}

impl CompilerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}
