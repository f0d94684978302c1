use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::Result;
use crate::{ProsodyConfig, SpeechEngine};

use super::{program_available, run_command};

/// Location of the espeak binary and its voice data.
#[derive(Debug, Clone, Default)]
pub struct EspeakConfig {
    /// Binary to run. `None` uses `espeak` from PATH.
    pub bin_path: Option<PathBuf>,
    /// Data directory passed as `--path`. `None` uses the engine default.
    pub data_path: Option<PathBuf>,
}

/// Speech synthesis through the `espeak` command line.
///
/// Phonetic text is passed as a single argument; `-w` makes espeak write a WAV
/// file instead of playing audio.
///
/// ```rust,no_run
/// use std::path::{Path, PathBuf};
/// use yiddish_tts::{engines::EspeakEngine, ProsodyConfig, SpeechEngine};
///
/// // Bundled espeak-ng instead of the one on PATH
/// let engine = EspeakEngine::with_binary(PathBuf::from("/opt/espeak-ng/bin/espeak-ng"));
/// engine.synthesize_to_file("shalum elikm", Path::new("hello.wav"), &ProsodyConfig::default())?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct EspeakEngine {
    config: EspeakConfig,
}

impl EspeakEngine {
    /// Use `espeak` from PATH.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EspeakConfig) -> Self {
        Self { config }
    }

    pub fn with_binary(bin_path: PathBuf) -> Self {
        Self::with_config(EspeakConfig {
            bin_path: Some(bin_path),
            data_path: None,
        })
    }

    pub fn binary(&self) -> &Path {
        self.config
            .bin_path
            .as_deref()
            .unwrap_or_else(|| Path::new("espeak"))
    }

    pub fn is_available(&self) -> bool {
        program_available(self.binary(), "--version")
    }

    fn command(&self, phonetic: &str, output: &Path, prosody: &ProsodyConfig) -> Command {
        let mut cmd = Command::new(self.binary());
        if let Some(data) = &self.config.data_path {
            cmd.arg(format!("--path={}", data.display()));
        }
        cmd.arg("-v")
            .arg(&prosody.voice)
            .arg("-s")
            .arg(prosody.speed.to_string())
            .arg("-p")
            .arg(prosody.pitch.to_string())
            .arg("-w")
            .arg(output)
            .arg("--")
            .arg(phonetic);
        cmd
    }
}

impl SpeechEngine for EspeakEngine {
    fn synthesize_to_file(
        &self,
        phonetic: &str,
        output: &Path,
        prosody: &ProsodyConfig,
    ) -> Result<()> {
        run_command(self.command(phonetic, output, prosody))?;
        Ok(())
    }
}
