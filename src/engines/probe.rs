use std::fs::File;
use std::path::Path;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{Result, TtsError};
use crate::{AudioProbe, ProbeInfo};

/// Reads stream properties from file headers without decoding audio.
///
/// WAV files are read with hound, which reports bit depth exactly; every
/// other container goes through symphonia's format probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileProbe;

impl FileProbe {
    pub fn new() -> Self {
        Self
    }
}

impl AudioProbe for FileProbe {
    fn probe(&self, path: &Path) -> Result<ProbeInfo> {
        let file_size = std::fs::metadata(path)?.len();
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("wav"));

        let mut info = if is_wav {
            probe_wav(path)?
        } else {
            probe_container(path)?
        };

        if info.duration_secs > 0.0 {
            info.approx_bitrate = file_size as f64 * 8.0 / info.duration_secs;
        }
        Ok(info)
    }
}

fn probe_error(path: &Path, reason: impl ToString) -> TtsError {
    TtsError::Probe {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn probe_wav(path: &Path) -> Result<ProbeInfo> {
    let reader = hound::WavReader::open(path).map_err(|e| probe_error(path, e))?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return Err(probe_error(path, "zero sample rate"));
    }

    Ok(ProbeInfo {
        duration_secs: f64::from(reader.duration()) / f64::from(spec.sample_rate),
        sample_rate: spec.sample_rate,
        bits_per_sample: Some(spec.bits_per_sample),
        channels: spec.channels,
        approx_bitrate: 0.0,
    })
}

fn probe_container(path: &Path) -> Result<ProbeInfo> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), MediaSourceStreamOptions::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| probe_error(path, e))?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| probe_error(path, "no audio track"))?;
    let params = &track.codec_params;

    let sample_rate = params.sample_rate.unwrap_or(0);
    let duration_secs = match (params.time_base, params.n_frames) {
        (Some(tb), Some(frames)) => {
            frames as f64 * f64::from(tb.numer) / f64::from(tb.denom)
        }
        (None, Some(frames)) if sample_rate > 0 => frames as f64 / f64::from(sample_rate),
        _ => return Err(probe_error(path, "unknown duration")),
    };

    Ok(ProbeInfo {
        duration_secs,
        sample_rate,
        bits_per_sample: params.bits_per_sample.and_then(|b| u16::try_from(b).ok()),
        channels: params.channels.map_or(0, |c| c.count() as u16),
        approx_bitrate: 0.0,
    })
}
