//! Adapters for the external programs the pipeline drives.
//!
//! # Available Engines
//!
//! - [`EspeakEngine`] - speech synthesis through `espeak` / `espeak-ng`
//! - [`SoxProcessor`] - effect chains through `sox`
//! - [`FileProbe`] - duration and format inspection (hound for WAV,
//!   symphonia for compressed formats)

pub mod espeak;
pub mod probe;
pub mod sox;

pub use espeak::{EspeakConfig, EspeakEngine};
pub use probe::FileProbe;
pub use sox::{SoxConfig, SoxProcessor};

use std::path::Path;
use std::process::{Command, Output};

use crate::error::{Result, TtsError};

/// Run `cmd` to completion, mapping a missing binary and a non-zero exit to
/// their dedicated errors.
pub(crate) fn run_command(mut cmd: Command) -> Result<Output> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    log::debug!(
        "Running {program} {:?}",
        cmd.get_args().collect::<Vec<_>>()
    );

    let output = cmd.output().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TtsError::EngineNotFound {
                program: program.clone(),
            }
        } else {
            TtsError::Io(e)
        }
    })?;

    if !output.status.success() {
        return Err(TtsError::EngineFailed {
            program,
            status: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

/// True when `program` starts and answers its version query.
pub(crate) fn program_available(program: &Path, version_flag: &str) -> bool {
    Command::new(program)
        .arg(version_flag)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// An engine call only counts as successful once a non-empty file exists.
pub(crate) fn ensure_written(path: &Path) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(TtsError::EmptyOutput(path.to_path_buf())),
    }
}
