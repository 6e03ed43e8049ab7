// Common test utilities shared across test files

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use uritemplate::Value;

/// A template and the expansion it must produce
#[derive(Debug, Deserialize)]
pub struct Case(pub String, pub String);

#[derive(Debug, Deserialize)]
pub struct Section {
    pub name: String,
    pub cases: Vec<Case>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    variables: serde_yaml::Value,
    sections: Vec<Section>,
}

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load an expansion fixture: the shared variables and the example sections
#[allow(dead_code)]
pub fn load_examples(name: &str) -> Result<(Value, Vec<Section>)> {
    let path = fixture_path(name);
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read fixture {}", path.display()))?;
    let fixture: Fixture = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse fixture {}", path.display()))?;

    Ok((fixture.variables.into(), fixture.sections))
}

/// Build a context from `(name, value)` pairs
#[allow(dead_code)]
pub fn context<'a, I, V>(pairs: I) -> Value
where
    I: IntoIterator<Item = (&'a str, V)>,
    V: Into<Value>,
{
    pairs.into_iter().collect()
}
