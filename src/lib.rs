pub mod namegen;
pub mod obfuscate;
pub mod options;
pub mod recode;
pub mod rename;
pub mod sb3;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

#[cfg(all(target_arch = "wasm32", feature = "wasm-bindings"))]
pub mod wasm;

use anyhow::Result;
use obfuscate::ObfuscateReport;
use options::ObfuscateOptions;
use serde_json::Value;
use std::path::{Path, PathBuf};

#[cfg(not(target_arch = "wasm32"))]
pub fn run_cli(args: &cli::Args) -> Result<()> {
    let progress = CliProgress::new("Obfuscate", 4);

    progress.emit(1, "Resolving input path");
    let input = canonicalize_file(&args.input)?;
    let options = match &args.options {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|_| {
                anyhow::anyhow!("Options file not found: '{}'.", path.display())
            })?;
            let record: Value = serde_json::from_str(&text).map_err(|e| {
                anyhow::anyhow!("Invalid JSON in options file '{}': {}", path.display(), e)
            })?;
            ObfuscateOptions::from_value(&record)?
        }
        None => ObfuscateOptions::default_full(),
    };

    progress.emit(2, "Reading project");
    let mut archive = sb3::read_sb3(&input)?;

    progress.emit(3, "Applying rename passes");
    let report = obfuscate::obfuscate_project(&mut archive.project, &options)?;
    for warning in &report.warnings {
        eprintln!("warning: {}", warning.message);
    }

    progress.emit(4, "Writing project");
    let output = match &args.output {
        Some(path) => path.clone(),
        None => default_output_path(&input),
    };
    sb3::write_sb3(&archive, &output)?;
    Ok(())
}

/// File-to-file entry point. The output is written only after every
/// requested pass has completed; any error leaves the output untouched.
pub fn obfuscate_file(input: &Path, output: &Path, options: &Value) -> Result<ObfuscateReport> {
    let parsed = ObfuscateOptions::from_value(options)?;
    let mut archive = sb3::read_sb3(input)?;
    let report = obfuscate::obfuscate_project(&mut archive.project, &parsed)?;
    sb3::write_sb3(&archive, output)?;
    Ok(report)
}

/// In-memory variant for embedders (and the wasm boundary): takes the raw
/// .sb3 bytes and the external options record, returns the obfuscated bytes.
pub fn obfuscate_sb3_bytes(bytes: &[u8], options: &Value) -> Result<Vec<u8>> {
    let parsed = ObfuscateOptions::from_value(options)?;
    let mut archive = sb3::read_sb3_bytes(bytes)?;
    obfuscate::obfuscate_project(&mut archive.project, &parsed)?;
    sb3::build_sb3_bytes(&archive)
}

pub fn canonicalize_file(path: &Path) -> Result<PathBuf> {
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!(
            "Input file not found: '{}'.",
            path.display()
        ));
    }
    Ok(path.canonicalize()?)
}

#[cfg(not(target_arch = "wasm32"))]
fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("obfuscated.sb3")
}

#[cfg(not(target_arch = "wasm32"))]
struct CliProgress {
    prefix: &'static str,
    total: usize,
}

#[cfg(not(target_arch = "wasm32"))]
impl CliProgress {
    fn new(prefix: &'static str, total: usize) -> Self {
        Self {
            prefix,
            total: total.max(1),
        }
    }

    fn emit(&self, step: usize, label: &str) {
        let step = step.clamp(1, self.total);
        let bar = render_progress_bar(step, self.total, 14);
        eprintln!(
            "[{}] {}... ({}/{}) {}",
            self.prefix, label, step, self.total, bar
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn render_progress_bar(step: usize, total: usize, width: usize) -> String {
    let width = width.max(1);
    let filled = ((step * width) + (total / 2)) / total;
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    for i in 0..width {
        s.push(if i < filled { '=' } else { '-' });
    }
    s.push(']');
    s
}
