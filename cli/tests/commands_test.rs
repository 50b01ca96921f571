use std::io::Write;
use std::path::Path;

use compiler::CompilerConfig;
use constraints::Encoding;
use tempfile::NamedTempFile;

fn write_temp(content: &str, suffix: &str) -> NamedTempFile {
    let mut f = NamedTempFile::with_suffix(suffix).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

const PRODUCT: &str = "def main(x, z) {\n  return x * z\n}\n";

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// ======================================================================
// compile_file
// ======================================================================

#[test]
fn compile_writes_sparse_system() {
    let src = write_temp(PRODUCT, ".ercs");
    let out = NamedTempFile::with_suffix(".json").unwrap();
    cli::commands::compile::compile_file(src.path(), Some(out.path()), &CompilerConfig::default())
        .unwrap();

    let doc = read_json(out.path());
    assert_eq!(doc["encoding"], "sparse");
    assert_eq!(doc["wires"], serde_json::json!(["$one", "x", "z", "$w0"]));
    assert_eq!(doc["outputs"], serde_json::json!(["$w0"]));
    assert_eq!(doc["constraints"].as_array().unwrap().len(), 1);
    assert_eq!(doc["constraints"][0]["shape"]["kind"], "forward");
}

#[test]
fn compile_honours_dense_encoding() {
    let src = write_temp(PRODUCT, ".ercs");
    let out = NamedTempFile::with_suffix(".json").unwrap();
    let config = CompilerConfig {
        encoding: Encoding::Dense,
        ..CompilerConfig::default()
    };
    cli::commands::compile::compile_file(src.path(), Some(out.path()), &config).unwrap();

    let doc = read_json(out.path());
    assert_eq!(doc["constraints"][0]["o"], serde_json::json!(["0", "0", "0", "1"]));
}

#[test]
fn compile_error_is_reported_with_context() {
    let src = write_temp("def main(x) {\n  return y\n}\n", ".ercs");
    let err = cli::commands::compile::compile_file(src.path(), None, &CompilerConfig::default())
        .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("compile error"), "got: {message}");
    assert!(message.contains("undeclared identifier `y`"), "got: {message}");
}

#[test]
fn compile_nonexistent_file_returns_error() {
    let result = cli::commands::compile::compile_file(
        Path::new("/tmp/nonexistent_ercs_test.ercs"),
        None,
        &CompilerConfig::default(),
    );
    assert!(result.is_err());
}

// ======================================================================
// witness_file
// ======================================================================

#[test]
fn witness_is_written_with_outputs() {
    let src = write_temp(PRODUCT, ".ercs");
    let out = NamedTempFile::with_suffix(".json").unwrap();
    cli::commands::witness::witness_file(
        src.path(),
        "x=3,z=4",
        Some(out.path()),
        &CompilerConfig::default(),
    )
    .unwrap();

    let doc = read_json(out.path());
    assert_eq!(doc["values"], serde_json::json!(["1", "3", "4", "12"]));
    assert_eq!(doc["outputs"]["$w0"], "12");
}

#[test]
fn witness_with_missing_input_fails() {
    let src = write_temp(PRODUCT, ".ercs");
    let result = cli::commands::witness::witness_file(
        src.path(),
        "x=3",
        None,
        &CompilerConfig::default(),
    );
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("witness evaluation failed"), "got: {message}");
}

// ======================================================================
// config loading
// ======================================================================

#[test]
fn config_file_is_loaded() {
    let config = write_temp("entry = \"circuit\"\nencoding = \"dense\"\n", ".toml");
    let loaded = cli::commands::load_config(Some(config.path())).unwrap();
    assert_eq!(loaded.entry, "circuit");
    assert_eq!(loaded.encoding, Encoding::Dense);
}

#[test]
fn invalid_config_is_rejected() {
    let config = write_temp("unroll = 3\n", ".toml");
    assert!(cli::commands::load_config(Some(config.path())).is_err());
}

#[test]
fn missing_config_means_defaults() {
    assert_eq!(cli::commands::load_config(None).unwrap(), CompilerConfig::default());
}
