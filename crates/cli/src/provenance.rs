//! Provenance sidecars: `<artifact>.provenance.json` beside each analysis output.

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};

/// What produced a set of artifacts: subcommand, its parameters and input files.
pub struct Payload {
    command: &'static str,
    params: Value,
    inputs: Vec<String>,
}

impl Payload {
    pub fn new(command: &'static str, params: Value) -> Self {
        Payload {
            command,
            params,
            inputs: vec![],
        }
    }

    pub fn input(mut self, path: &Path) -> Self {
        self.inputs.push(path.display().to_string());
        self
    }

    fn into_doc(self, callsite: &Location<'_>, outputs: Vec<String>) -> Value {
        let mut doc = base_block();
        if let Value::Object(map) = &mut doc {
            let extra: Map<String, Value> = [
                ("callsite", json!(format!("{}:{}", callsite.file(), callsite.line()))),
                ("command", json!(self.command)),
                ("params", self.params),
                ("inputs", json!(self.inputs)),
                ("outputs", json!(outputs)),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
            map.extend(extra);
        }
        doc
    }
}

/// The block printed by `report` and embedded in every sidecar.
pub fn base_block() -> Value {
    json!({
        "tool": "stepparity",
        "version": stepparity::VERSION,
        "code_rev": code_rev(),
    })
}

/// Writes the sidecar for `primary`; `extra_outputs` are listed after it.
#[track_caller]
pub fn write_sidecar(primary: &Path, extra_outputs: &[&Path], payload: Payload) -> Result<PathBuf> {
    let callsite = Location::caller();
    let target = sidecar_for(primary);
    let outputs = [primary]
        .iter()
        .chain(extra_outputs)
        .map(|p| p.display().to_string())
        .collect();
    let doc = payload.into_doc(callsite, outputs);

    if let Some(dir) = target.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let text = serde_json::to_string_pretty(&doc)?;
    fs::write(&target, text).with_context(|| format!("writing sidecar {}", target.display()))?;
    Ok(target)
}

fn sidecar_for(artifact: &Path) -> PathBuf {
    let stem = artifact
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "parity".into());
    artifact.with_file_name(format!("{stem}.provenance.json"))
}

/// Commit of the running build: `GIT_COMMIT` at compile time or runtime, else `git rev-parse`.
pub fn code_rev() -> String {
    let baked = option_env!("GIT_COMMIT").map(str::to_string);
    let runtime = std::env::var("GIT_COMMIT").ok();
    baked
        .into_iter()
        .chain(runtime)
        .find(|rev| !rev.is_empty())
        .or_else(git_head)
        .unwrap_or_else(|| "unknown".into())
}

fn git_head() -> Option<String> {
    let out = std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8(out.stdout).ok().map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_sits_next_to_the_parity_file() {
        let derived = sidecar_for(Path::new("/tmp/out/song.parity.json"));
        assert_eq!(derived, Path::new("/tmp/out/song.parity.provenance.json"));
    }

    #[test]
    fn sidecar_lists_inputs_and_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let parity = dir.path().join("nested").join("p.json");
        let graph = dir.path().join("g.json");
        let payload = Payload::new("analyze", json!({"layout": "dance-single"}))
            .input(Path::new("chart.json"));
        let written = write_sidecar(&parity, &[graph.as_path()], payload).unwrap();
        assert!(written.ends_with("nested/p.provenance.json"));

        let doc: Value = serde_json::from_str(&fs::read_to_string(written).unwrap()).unwrap();
        assert_eq!(doc["tool"], "stepparity");
        assert_eq!(doc["command"], "analyze");
        assert_eq!(doc["inputs"], json!(["chart.json"]));
        assert_eq!(doc["outputs"][0], parity.display().to_string());
        assert_eq!(doc["outputs"][1], graph.display().to_string());
        assert_eq!(doc["params"]["layout"], "dance-single");
        assert!(doc["callsite"].as_str().unwrap().contains("provenance.rs"));
    }
}
