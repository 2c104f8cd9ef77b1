//! `build` and `check`.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use golf_compiler::{Compilation, Compiler};
use golf_core::{ComponentCategory, Diagnostics, ServerConfig};
use golf_mcp::Emitter;

/// Output directory used when `--output` is not given, relative to the
/// project.
pub const DEFAULT_OUTPUT_DIR: &str = "dist";

/// What a command prints when it succeeds.
#[derive(Debug)]
pub struct Report {
    server: String,
    counts: [(ComponentCategory, usize); 3],
    diagnostics: Diagnostics,
    written: Option<PathBuf>,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{diagnostic}")?;
        }
        let counts = self
            .counts
            .iter()
            .map(|(category, n)| format!("{n} {category}(s)"))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(f, "{}: {counts}", self.server)?;
        if !self.diagnostics.is_empty() {
            writeln!(f, "{} warning(s)", self.diagnostics.len())?;
        }
        if let Some(path) = &self.written {
            writeln!(f, "wrote {}", path.display())?;
        }
        Ok(())
    }
}

fn compile(project: &Path, jobs: Option<usize>) -> Result<(ServerConfig, Compilation)> {
    let config = ServerConfig::load(project)
        .with_context(|| format!("loading configuration from {}", project.display()))?;
    tracing::info!("Building '{}' from {}", config.name, project.display());

    let mut compiler = Compiler::new(project);
    if let Some(jobs) = jobs {
        compiler = compiler.with_parallelism(jobs);
    }
    let compilation = compiler.compile().context("compilation failed")?;
    Ok((config, compilation))
}

fn counts(compilation: &Compilation) -> [(ComponentCategory, usize); 3] {
    ComponentCategory::ALL.map(|c| (c, compilation.registry.count(c)))
}

/// Compile, emit and write the manifest into `output`.
pub fn build(project: &Path, output: &Path, jobs: Option<usize>) -> Result<Report> {
    let (config, compilation) = compile(project, jobs)?;
    let emitter = Emitter::new(config).with_process_env();
    let artifact = emitter
        .emit(&compilation.registry)
        .context("emitting server failed")?;
    let written = artifact
        .write_to(output)
        .with_context(|| format!("writing manifest to {}", output.display()))?;

    let mut diagnostics = compilation.diagnostics.clone();
    diagnostics.extend(artifact.diagnostics);
    Ok(Report {
        server: emitter.config().name.clone(),
        counts: counts(&compilation),
        diagnostics,
        written: Some(written),
    })
}

/// Compile and validate the emitted server without writing it.
pub fn check(project: &Path) -> Result<Report> {
    let (config, compilation) = compile(project, None)?;
    let emitter = Emitter::new(config).with_process_env();
    let artifact = emitter
        .emit(&compilation.registry)
        .context("emitting server failed")?;

    let mut diagnostics = compilation.diagnostics.clone();
    diagnostics.extend(artifact.diagnostics);
    Ok(Report {
        server: emitter.config().name.clone(),
        counts: counts(&compilation),
        diagnostics,
        written: None,
    })
}
