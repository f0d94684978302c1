use std::path::PathBuf;

/// Errors produced by the transliteration, synthesis and voice-variant stages.
#[derive(thiserror::Error, Debug)]
pub enum TtsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(
        "`{program}` not found. Install it (e.g. `sudo apt-get install {program}`) \
         or pass its path explicitly"
    )]
    EngineNotFound { program: String },
    #[error("`{program}` exited with code {status:?}: {stderr}")]
    EngineFailed {
        program: String,
        status: Option<i32>,
        stderr: String,
    },
    #[error("Speech synthesis failed for {input:?}: {source}")]
    Synthesis {
        input: String,
        #[source]
        source: Box<TtsError>,
    },
    #[error("Engine produced no audio at {}", .0.display())]
    EmptyOutput(PathBuf),
    #[error("Effect chain for preset '{preset}' failed: {source}")]
    Effect {
        preset: String,
        #[source]
        source: Box<TtsError>,
    },
    #[error("Invalid effect parameters: {0}")]
    InvalidEffect(String),
    #[error("Invalid preset name {0}")]
    InvalidPreset(String),
    #[error("Invalid accent blend: {0}")]
    InvalidBlend(String),
    #[error("Accent blend '{blend}' failed: {source}")]
    Blend {
        blend: String,
        #[source]
        source: Box<TtsError>,
    },
    #[error("Cannot probe {}: {reason}", path.display())]
    Probe { path: PathBuf, reason: String },
    #[error("Source audio not found: {}", .0.display())]
    SourceNotFound(PathBuf),
    #[error("Invalid transliteration mapping: {0}")]
    Mapping(String),
}

pub type Result<T> = std::result::Result<T, TtsError>;
