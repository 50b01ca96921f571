pub mod compile;
pub mod witness;

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use compiler::CompilerConfig;
use field::{parse_field, FieldElement};

/// Read a TOML config, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<CompilerConfig> {
    let Some(path) = path else {
        return Ok(CompilerConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read config file: {}", path.display()))?;
    CompilerConfig::from_toml_str(&text)
        .with_context(|| format!("invalid config file: {}", path.display()))
}

/// Parse an `--inputs` string like `"x=3,z=0x04"` into a map.
pub fn parse_inputs(raw: &str) -> Result<HashMap<String, FieldElement>> {
    let mut map = HashMap::new();
    for pair in raw.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }
        let (name, value) = pair
            .split_once('=')
            .with_context(|| format!("invalid input pair: {pair:?} (expected name=value)"))?;
        let value = parse_field(value)
            .with_context(|| format!("invalid value for {name:?}: {value:?}"))?;
        map.insert(name.trim().to_string(), value);
    }
    Ok(map)
}

/// Buffered writer to `path`, or stdout.
pub(crate) fn output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("cannot write {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

pub(crate) fn read_source(path: &Path) -> Result<String> {
    tracing::debug!(path = %path.display(), "reading source");
    fs::read_to_string(path).with_context(|| format!("cannot read source file: {}", path.display()))
}
