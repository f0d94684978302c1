//! # yiddish-tts
//!
//! Text-to-speech for Yiddish written in Hebrew script.
//!
//! ## Pipeline
//!
//! 1. [`transliteration::Transliterator`] turns Hebrew-script text into a Latin
//!    phonetic spelling that a generic synthesizer can pronounce.
//! 2. [`synthesizer::Synthesizer`] hands the phonetic text and a
//!    [`ProsodyConfig`] to a [`SpeechEngine`] (espeak by default) and checks
//!    that a waveform was written.
//! 3. Optionally, [`reference::ReferenceSelector`] ranks a directory of
//!    reference recordings and [`variants::VoiceCloner`] renders the base
//!    waveform through a catalog of effect-chain presets ([`EffectsProcessor`],
//!    sox by default).
//!
//! [`synthesizer::Synthesizer::blend_accents`] renders the same text with
//! several [`accent::Accent`]s and mixes the takes through the
//! [`EffectsProcessor`].
//!
//! The variant stage is rule-based pitch, tempo and equalization only. It does
//! not analyse the selected reference recording; the selection is reported but
//! never changes how variants are rendered.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::{Path, PathBuf};
//! use yiddish_tts::{engines::EspeakEngine, synthesizer::Synthesizer, ProsodyConfig};
//!
//! let synthesizer = Synthesizer::new(EspeakEngine::new());
//! let wav = synthesizer.synthesize_text(
//!     "שלום עליכם",
//!     Path::new("output/hello.wav"),
//!     &ProsodyConfig::default(),
//! )?;
//! println!("wrote {}", wav.display());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod accent;
pub mod engines;
pub mod error;
pub mod reference;
pub mod synthesizer;
pub mod transliteration;
pub mod variants;

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

pub use error::{Result, TtsError};
use variants::Effect;

/// Prosody parameters for one synthesis request.
///
/// ```
/// use yiddish_tts::ProsodyConfigBuilder;
///
/// let prosody = ProsodyConfigBuilder::default()
///     .speed(120u32)
///     .voice("de")
///     .build()
///     .unwrap();
/// assert_eq!(prosody.pitch, 50);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[builder(default, setter(into))]
pub struct ProsodyConfig {
    /// Speaking rate in words per minute.
    pub speed: u32,
    /// Pitch, 0-99 for espeak.
    pub pitch: u32,
    /// Engine-specific voice identifier (e.g. `"en"`, `"de"`).
    pub voice: String,
}

impl Default for ProsodyConfig {
    fn default() -> Self {
        Self {
            speed: 150,
            pitch: 50,
            voice: "en".to_string(),
        }
    }
}

/// Stream properties reported by an [`AudioProbe`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeInfo {
    pub duration_secs: f64,
    pub sample_rate: u32,
    /// Bits per sample, when the container declares it.
    pub bits_per_sample: Option<u16>,
    pub channels: u16,
    /// File size over duration, in bits per second.
    pub approx_bitrate: f64,
}

/// External speech synthesizer: phonetic text in, waveform file out.
pub trait SpeechEngine: Send + Sync {
    /// Write a waveform for `phonetic` to `output`.
    fn synthesize_to_file(&self, phonetic: &str, output: &Path, prosody: &ProsodyConfig)
        -> Result<()>;
}

/// External audio-effects processor applying an ordered effect chain.
pub trait EffectsProcessor: Send + Sync {
    fn apply(&self, input: &Path, output: &Path, chain: &[Effect]) -> Result<()>;

    /// Sum `inputs` into `output`, each scaled by its volume factor.
    fn mix(&self, inputs: &[(PathBuf, f32)], output: &Path) -> Result<()>;
}

/// External audio inspection.
pub trait AudioProbe: Send + Sync {
    /// Inspect `path`; unreadable or malformed files return [`TtsError::Probe`].
    fn probe(&self, path: &Path) -> Result<ProbeInfo>;
}

/// Any text-to-phonetic converter. The rule-based
/// [`transliteration::Transliterator`] never fails; external services may.
pub trait ToPhonetic: Send + Sync {
    fn to_phonetic(&self, text: &str) -> Result<String>;
}
