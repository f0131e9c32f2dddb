//! Startup validation (§4.10): everything that must hold before the
//! main loop is allowed to run a single tracer, checked up front so a
//! misconfiguration fails fast with a human-readable message instead of
//! mid-run.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use concolic_core::{Arch, EngineConfig, TracerKind};

use crate::error::{ConfigurationError, Result};

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.permissions().mode() & 0o111 != 0).unwrap_or(false)
}

fn tracer_binary_path(dir: &Path, kind: TracerKind, arch: Arch) -> PathBuf {
    dir.join(format!("{}-{}", kind.binary_stem(), arch.as_str()))
}

/// Validate everything [`EngineConfig`] implies about the filesystem:
/// the target exists and is executable, `out_dir` can be created and
/// written to, the three sibling tracer binaries for the selected
/// architecture exist next to the running executable, and `--inputdir`
/// (if given) exists.
pub fn validate(config: &EngineConfig) -> Result<()> {
    if !config.program.is_file() {
        return Err(ConfigurationError::ProgramMissing(config.program.clone()));
    }
    if !is_executable(&config.program) {
        return Err(ConfigurationError::ProgramNotExecutable(config.program.clone()));
    }

    std::fs::create_dir_all(&config.output_dir)
        .map_err(|source| ConfigurationError::OutputDirNotWritable { path: config.output_dir.clone(), source })?;
    let probe = config.output_dir.join(".concolic-write-probe");
    std::fs::write(&probe, b"")
        .map_err(|source| ConfigurationError::OutputDirNotWritable { path: config.output_dir.clone(), source })?;
    let _ = std::fs::remove_file(&probe);

    let tracer_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    for kind in [TracerKind::Coverage, TracerKind::Branch, TracerKind::BBCount] {
        let path = tracer_binary_path(&tracer_dir, kind, config.architecture);
        if !path.is_file() {
            return Err(ConfigurationError::MissingTracerBinary(path));
        }
    }

    if let Some(input_dir) = &config.input_dir {
        if !input_dir.is_dir() {
            return Err(ConfigurationError::InputDirMissing(input_dir.clone()));
        }
    }

    Ok(())
}
