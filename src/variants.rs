//! Voice variant generation.
//!
//! A [`VariantPreset`] is a named, ordered chain of [`Effect`]s. The
//! [`VoiceCloner`] renders one source waveform through every registered
//! preset and writes `<basename>_<preset>.<ext>` files. Presets are fixed,
//! content-independent transforms; no property of any reference recording
//! feeds into them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engines::ensure_written;
use crate::error::{Result, TtsError};
use crate::EffectsProcessor;

/// One signal-processing step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Pitch shift in cents (100 cents = 1 semitone), tempo preserved.
    Pitch { cents: i32 },
    /// Tempo scale factor, pitch preserved.
    Tempo { factor: f32 },
    /// Low-shelf gain.
    Bass { gain_db: f32 },
    /// High-shelf gain.
    Treble { gain_db: f32 },
    /// Peaking filter.
    Equalizer {
        frequency_hz: f32,
        width_q: f32,
        gain_db: f32,
    },
    /// Dynamic-range compression with a piecewise transfer function of
    /// `(input_db, output_db)` points.
    Compand {
        attack_secs: f32,
        decay_secs: f32,
        transfer: Vec<(f32, f32)>,
        gain_db: f32,
        initial_volume_db: f32,
        delay_secs: f32,
    },
    /// Soft-clipping distortion.
    Overdrive { gain_db: f32, colour: f32 },
    /// Room reverberation, 0-100.
    Reverb { reverberance: f32 },
    /// Processor-specific effect passed through verbatim.
    Custom { name: String, args: Vec<String> },
}

impl Effect {
    pub fn name(&self) -> &str {
        match self {
            Effect::Pitch { .. } => "pitch",
            Effect::Tempo { .. } => "tempo",
            Effect::Bass { .. } => "bass",
            Effect::Treble { .. } => "treble",
            Effect::Equalizer { .. } => "equalizer",
            Effect::Compand { .. } => "compand",
            Effect::Overdrive { .. } => "overdrive",
            Effect::Reverb { .. } => "reverb",
            Effect::Custom { name, .. } => name,
        }
    }

    /// Reject parameters no processor can honour.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(TtsError::InvalidEffect(msg)) };
        match self {
            Effect::Tempo { factor } if !(factor.is_finite() && *factor > 0.0) => {
                invalid(format!("tempo factor must be positive, got {factor}"))
            }
            Effect::Equalizer {
                frequency_hz,
                width_q,
                gain_db,
            } if !(*frequency_hz > 0.0 && *width_q > 0.0 && gain_db.is_finite()) => invalid(
                format!("equalizer {frequency_hz} Hz / q {width_q} / {gain_db} dB is out of range"),
            ),
            Effect::Compand {
                attack_secs,
                decay_secs,
                transfer,
                ..
            } if *attack_secs < 0.0 || *decay_secs < 0.0 || transfer.is_empty() => invalid(
                "compand needs non-negative attack/decay and at least one transfer point"
                    .to_string(),
            ),
            Effect::Reverb { reverberance } if !(0.0..=100.0).contains(reverberance) => {
                invalid(format!("reverberance must be within 0-100, got {reverberance}"))
            }
            Effect::Custom { name, .. } if name.trim().is_empty() => {
                invalid("custom effect has no name".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// A named effect chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantPreset {
    pub name: String,
    pub effects: Vec<Effect>,
}

impl VariantPreset {
    pub fn new(name: impl Into<String>, effects: Vec<Effect>) -> Self {
        Self {
            name: name.into(),
            effects,
        }
    }

    /// Check the name is usable as a file-name component and every effect
    /// is in range.
    pub fn validate(&self) -> Result<()> {
        let name_ok = !self.name.is_empty()
            && self
                .name
                .chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-');
        if !name_ok {
            return Err(TtsError::InvalidPreset(format!(
                "{:?} must be non-empty and use only letters, digits, '_' or '-'",
                self.name
            )));
        }
        self.effects.iter().try_for_each(Effect::validate)
    }
}

/// The built-in catalog: `natural`, `deeper`, `smooth` and `character`.
pub fn default_presets() -> Vec<VariantPreset> {
    use Effect::*;

    vec![
        VariantPreset::new(
            "natural",
            vec![
                Pitch { cents: -150 },
                Tempo { factor: 0.97 },
                Bass { gain_db: 2.0 },
                Treble { gain_db: -2.0 },
                Reverb { reverberance: 15.0 },
            ],
        ),
        VariantPreset::new(
            "deeper",
            vec![
                Pitch { cents: -250 },
                Tempo { factor: 0.95 },
                Equalizer {
                    frequency_hz: 300.0,
                    width_q: 2.0,
                    gain_db: 4.0,
                },
                Equalizer {
                    frequency_hz: 1200.0,
                    width_q: 1.0,
                    gain_db: 2.0,
                },
                Equalizer {
                    frequency_hz: 3000.0,
                    width_q: 1.0,
                    gain_db: -3.0,
                },
                Reverb { reverberance: 20.0 },
            ],
        ),
        VariantPreset::new(
            "smooth",
            vec![
                Pitch { cents: -100 },
                Tempo { factor: 0.98 },
                Equalizer {
                    frequency_hz: 800.0,
                    width_q: 1.0,
                    gain_db: 1.0,
                },
                Equalizer {
                    frequency_hz: 2500.0,
                    width_q: 1.0,
                    gain_db: -1.0,
                },
                Compand {
                    attack_secs: 0.02,
                    decay_secs: 0.2,
                    transfer: vec![
                        (-60.0, -60.0),
                        (-30.0, -10.0),
                        (-20.0, -8.0),
                        (-5.0, -8.0),
                        (-2.0, -8.0),
                    ],
                    gain_db: -8.0,
                    initial_volume_db: -7.0,
                    delay_secs: 0.05,
                },
                Reverb { reverberance: 10.0 },
            ],
        ),
        VariantPreset::new(
            "character",
            vec![
                Pitch { cents: -200 },
                Tempo { factor: 0.93 },
                Equalizer {
                    frequency_hz: 400.0,
                    width_q: 2.0,
                    gain_db: 3.0,
                },
                Equalizer {
                    frequency_hz: 1800.0,
                    width_q: 1.0,
                    gain_db: -2.0,
                },
                Equalizer {
                    frequency_hz: 4000.0,
                    width_q: 1.0,
                    gain_db: -4.0,
                },
                Overdrive {
                    gain_db: 4.0,
                    colour: 10.0,
                },
                Reverb { reverberance: 25.0 },
            ],
        ),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedVariant {
    pub name: String,
    pub path: PathBuf,
}

/// A preset that could not be rendered. `error` is always
/// [`TtsError::Effect`].
#[derive(Debug)]
pub struct VariantFailure {
    pub preset: String,
    pub error: TtsError,
}

/// Outcome of [`VoiceCloner::clone_voice`]: successes and failures, each in
/// catalog order.
#[derive(Debug, Default)]
pub struct CloneReport {
    pub variants: Vec<RenderedVariant>,
    pub failures: Vec<VariantFailure>,
}

impl CloneReport {
    pub fn path(&self, name: &str) -> Option<&Path> {
        self.variants
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.path.as_path())
    }

    /// Variant name to output path, successes only.
    pub fn paths(&self) -> HashMap<&str, &Path> {
        self.variants
            .iter()
            .map(|v| (v.name.as_str(), v.path.as_path()))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Renders a waveform through every registered [`VariantPreset`].
pub struct VoiceCloner<P> {
    processor: P,
    presets: Vec<VariantPreset>,
    parallel: bool,
}

impl<P: EffectsProcessor> VoiceCloner<P> {
    /// Create a cloner with the built-in preset catalog.
    pub fn new(processor: P) -> Self {
        Self {
            processor,
            presets: default_presets(),
            parallel: true,
        }
    }

    pub fn with_presets(mut self, presets: Vec<VariantPreset>) -> Self {
        self.presets = Vec::new();
        for preset in presets {
            self.add_preset(preset);
        }
        self
    }

    /// Render presets one at a time instead of on the rayon pool.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Register a preset, replacing any existing preset with the same name.
    pub fn add_preset(&mut self, preset: VariantPreset) {
        match self.presets.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    pub fn presets(&self) -> &[VariantPreset] {
        &self.presets
    }

    /// Render every preset next to each other in `output_dir`, named after the
    /// source file's stem.
    pub fn clone_voice(&self, source: &Path, output_dir: &Path) -> Result<CloneReport> {
        let base_name = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("voice_cloned");
        self.clone_voice_as(source, output_dir, base_name)
    }

    /// Like [`clone_voice`](Self::clone_voice) with an explicit output base name.
    ///
    /// Fails as a whole only when the source is missing or the output
    /// directory cannot be created. Individual preset failures are collected
    /// in the report.
    pub fn clone_voice_as(
        &self,
        source: &Path,
        output_dir: &Path,
        base_name: &str,
    ) -> Result<CloneReport> {
        if !source.is_file() {
            return Err(TtsError::SourceNotFound(source.to_path_buf()));
        }
        std::fs::create_dir_all(output_dir)?;

        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("wav");

        let render = |preset: &VariantPreset| {
            let output = output_dir.join(format!("{base_name}_{}.{ext}", preset.name));
            (preset.name.clone(), self.render(preset, source, output))
        };

        let outcomes: Vec<(String, Result<PathBuf>)> = if self.parallel {
            self.presets.par_iter().map(render).collect()
        } else {
            self.presets.iter().map(render).collect()
        };

        let mut report = CloneReport::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(path) => {
                    log::info!("Variant '{name}' written to {}", path.display());
                    report.variants.push(RenderedVariant { name, path });
                }
                Err(source) => {
                    let error = TtsError::Effect {
                        preset: name.clone(),
                        source: Box::new(source),
                    };
                    log::warn!("{error}");
                    report.failures.push(VariantFailure {
                        preset: name,
                        error,
                    });
                }
            }
        }

        Ok(report)
    }

    fn render(&self, preset: &VariantPreset, source: &Path, output: PathBuf) -> Result<PathBuf> {
        preset.validate()?;
        log::debug!(
            "Rendering '{}' ({} effects) to {}",
            preset.name,
            preset.effects.len(),
            output.display()
        );
        self.processor.apply(source, &output, &preset.effects)?;
        ensure_written(&output)?;
        Ok(output)
    }
}
