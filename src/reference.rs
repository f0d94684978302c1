//! Reference recording selection.
//!
//! Scores the audio files at the top level of a directory and picks the most
//! useful one. The choice is informational: nothing downstream reads the
//! selected recording's audio.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::{AudioProbe, ProbeInfo};

/// Extensions considered for reference selection (matched case-insensitively).
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "m4a"];

/// Clips shorter than this carry too little voice to be useful.
pub const MIN_DURATION_SECS: f64 = 1.0;

/// Relative weights and saturation points for candidate scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionWeights {
    pub duration: f64,
    pub sample_rate: f64,
    pub bitrate: f64,
    /// Duration beyond which a longer file scores no higher.
    pub duration_cap_secs: f64,
    pub sample_rate_cap: u32,
    /// Bits per second; CD-quality stereo PCM.
    pub bitrate_cap: f64,
}

impl Default for SelectionWeights {
    fn default() -> Self {
        Self {
            duration: 0.5,
            sample_rate: 0.25,
            bitrate: 0.25,
            duration_cap_secs: 30.0,
            sample_rate_cap: 48_000,
            bitrate_cap: 1_411_200.0,
        }
    }
}

impl SelectionWeights {
    pub fn score(&self, info: &ProbeInfo) -> f64 {
        let saturate = |value: f64, cap: f64| {
            if cap > 0.0 {
                (value / cap).clamp(0.0, 1.0)
            } else {
                0.0
            }
        };

        let sample_rate = saturate(
            f64::from(info.sample_rate),
            f64::from(self.sample_rate_cap),
        );
        self.duration * saturate(info.duration_secs, self.duration_cap_secs)
            + self.sample_rate * sample_rate
            + self.bitrate * saturate(info.approx_bitrate, self.bitrate_cap)
    }
}

/// An eligible reference file with its probe results and score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceCandidate {
    pub path: PathBuf,
    pub info: ProbeInfo,
    pub score: f64,
}

impl ReferenceCandidate {
    fn file_name(&self) -> &std::ffi::OsStr {
        self.path.file_name().unwrap_or_default()
    }
}

/// Scans a directory and ranks its audio files.
pub struct ReferenceSelector<A> {
    probe: A,
    weights: SelectionWeights,
}

impl<A: AudioProbe> ReferenceSelector<A> {
    pub fn new(probe: A) -> Self {
        Self::with_weights(probe, SelectionWeights::default())
    }

    pub fn with_weights(probe: A, weights: SelectionWeights) -> Self {
        Self { probe, weights }
    }

    /// The highest-scoring eligible file, or `None` when nothing qualifies.
    pub fn select_best(&self, directory: &Path) -> Option<ReferenceCandidate> {
        let best = self.rank(directory).into_iter().next();
        match &best {
            Some(c) => log::info!(
                "Selected reference {} (score {:.3}, {:.1}s)",
                c.path.display(),
                c.score,
                c.info.duration_secs
            ),
            None => log::warn!("No eligible reference audio in {}", directory.display()),
        }
        best
    }

    /// Every eligible file, best first. Equal scores fall back to file name
    /// order.
    pub fn rank(&self, directory: &Path) -> Vec<ReferenceCandidate> {
        let mut candidates: Vec<ReferenceCandidate> = audio_files(directory)
            .into_iter()
            .filter_map(|path| self.evaluate(path))
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.file_name().cmp(b.file_name()))
        });
        candidates
    }

    fn evaluate(&self, path: PathBuf) -> Option<ReferenceCandidate> {
        let info = match self.probe.probe(&path) {
            Ok(info) => info,
            Err(e) => {
                log::warn!("Skipping reference {}: {e}", path.display());
                return None;
            }
        };

        if !(info.duration_secs >= MIN_DURATION_SECS) {
            log::debug!(
                "Skipping reference {}: {:.2}s is shorter than {MIN_DURATION_SECS}s",
                path.display(),
                info.duration_secs
            );
            return None;
        }

        let score = self.weights.score(&info);
        log::debug!("Reference {} scored {score:.3}", path.display());
        Some(ReferenceCandidate { path, info, score })
    }
}

/// Files directly inside `directory` with a recognised audio extension.
/// Symlinks are resolved, so a linked recording counts as a file.
fn audio_files(directory: &Path) -> Vec<PathBuf> {
    WalkDir::new(directory)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| {
            entry
                .map_err(|e| log::warn!("Error reading reference directory entry: {e}"))
                .ok()
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase)
                .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
        })
        .collect()
}
