use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, TtsError};
use crate::variants::Effect;
use crate::EffectsProcessor;

use super::{program_available, run_command};

#[derive(Debug, Clone, Default)]
pub struct SoxConfig {
    /// Binary to run. `None` uses `sox` from PATH.
    pub bin_path: Option<PathBuf>,
}

/// Effect chains through the `sox` command line:
/// `sox <input> <output> <effect> <args>... <effect> <args>...`.
///
/// Mixing uses `sox -m -v <factor> <input>... <output>`.
#[derive(Debug, Clone, Default)]
pub struct SoxProcessor {
    config: SoxConfig,
}

impl SoxProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(bin_path: PathBuf) -> Self {
        Self {
            config: SoxConfig {
                bin_path: Some(bin_path),
            },
        }
    }

    pub fn binary(&self) -> &Path {
        self.config
            .bin_path
            .as_deref()
            .unwrap_or_else(|| Path::new("sox"))
    }

    pub fn is_available(&self) -> bool {
        program_available(self.binary(), "--version")
    }

    fn command(&self, input: &Path, output: &Path, chain: &[Effect]) -> Command {
        let mut cmd = Command::new(self.binary());
        cmd.arg(input).arg(output);
        for effect in chain {
            cmd.args(effect_args(effect));
        }
        cmd
    }

    fn mix_command(&self, inputs: &[(PathBuf, f32)], output: &Path) -> Command {
        let mut cmd = Command::new(self.binary());
        // sox refuses -m with a single input; -v alone still applies the volume.
        if inputs.len() > 1 {
            cmd.arg("-m");
        }
        for (input, volume) in inputs {
            cmd.arg("-v").arg(volume.to_string()).arg(input);
        }
        cmd.arg(output);
        cmd
    }
}

impl EffectsProcessor for SoxProcessor {
    fn apply(&self, input: &Path, output: &Path, chain: &[Effect]) -> Result<()> {
        run_command(self.command(input, output, chain))?;
        Ok(())
    }

    fn mix(&self, inputs: &[(PathBuf, f32)], output: &Path) -> Result<()> {
        if inputs.is_empty() {
            return Err(TtsError::InvalidBlend("nothing to mix".to_string()));
        }
        run_command(self.mix_command(inputs, output))?;
        Ok(())
    }
}

/// Sox spelling of one effect: the effect name followed by its arguments.
fn effect_args(effect: &Effect) -> Vec<String> {
    let mut args = vec![effect.name().to_string()];
    match effect {
        Effect::Pitch { cents } => args.push(cents.to_string()),
        Effect::Tempo { factor } => args.push(factor.to_string()),
        Effect::Bass { gain_db } | Effect::Treble { gain_db } => args.push(signed(*gain_db)),
        Effect::Equalizer {
            frequency_hz,
            width_q,
            gain_db,
        } => {
            args.push(frequency_hz.to_string());
            args.push(format!("{width_q}q"));
            args.push(signed(*gain_db));
        }
        Effect::Compand {
            attack_secs,
            decay_secs,
            transfer,
            gain_db,
            initial_volume_db,
            delay_secs,
        } => {
            args.push(format!("{attack_secs},{decay_secs}"));
            args.push(
                transfer
                    .iter()
                    .map(|(input, output)| format!("{input},{output}"))
                    .collect::<Vec<_>>()
                    .join(","),
            );
            args.push(gain_db.to_string());
            args.push(initial_volume_db.to_string());
            args.push(delay_secs.to_string());
        }
        Effect::Overdrive { gain_db, colour } => {
            args.push(gain_db.to_string());
            args.push(colour.to_string());
        }
        Effect::Reverb { reverberance } => args.push(reverberance.to_string()),
        Effect::Custom { args: extra, .. } => args.extend(extra.iter().cloned()),
    }
    args
}

/// Sox gain arguments read more clearly with an explicit sign.
fn signed(value: f32) -> String {
    if value >= 0.0 {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variants::default_presets;

    fn args_of(effect: Effect) -> Vec<String> {
        effect_args(&effect)
    }

    #[test]
    fn renders_simple_effects() {
        assert_eq!(args_of(Effect::Pitch { cents: -150 }), ["pitch", "-150"]);
        assert_eq!(args_of(Effect::Tempo { factor: 0.97 }), ["tempo", "0.97"]);
        assert_eq!(args_of(Effect::Bass { gain_db: 2.0 }), ["bass", "+2"]);
        assert_eq!(args_of(Effect::Treble { gain_db: -2.0 }), ["treble", "-2"]);
        assert_eq!(args_of(Effect::Reverb { reverberance: 15.0 }), ["reverb", "15"]);
    }

    #[test]
    fn renders_equalizer_and_compand() {
        assert_eq!(
            args_of(Effect::Equalizer {
                frequency_hz: 300.0,
                width_q: 2.0,
                gain_db: 4.0
            }),
            ["equalizer", "300", "2q", "+4"]
        );

        let smooth = &default_presets()[2];
        let compand = smooth
            .effects
            .iter()
            .find(|e| e.name() == "compand")
            .unwrap();
        assert_eq!(
            effect_args(compand),
            [
                "compand",
                "0.02,0.2",
                "-60,-60,-30,-10,-20,-8,-5,-8,-2,-8",
                "-8",
                "-7",
                "0.05"
            ]
        );
    }

    #[test]
    fn custom_effect_passes_arguments_through() {
        let effect = Effect::Custom {
            name: "highpass".to_string(),
            args: vec!["-1".to_string(), "80".to_string()],
        };
        assert_eq!(args_of(effect), ["highpass", "-1", "80"]);
    }

    #[test]
    fn command_orders_input_output_then_chain() {
        let sox = SoxProcessor::new();
        let chain = [Effect::Pitch { cents: -100 }, Effect::Tempo { factor: 0.98 }];
        let cmd = sox.command(Path::new("in.wav"), Path::new("out.wav"), &chain);
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            ["in.wav", "out.wav", "pitch", "-100", "tempo", "0.98"]
        );
    }

    #[test]
    fn mix_command_weights_each_input() {
        let sox = SoxProcessor::new();
        let inputs = [
            (PathBuf::from("de.wav"), 0.75),
            (PathBuf::from("hu.wav"), 0.25),
        ];
        let cmd = sox.mix_command(&inputs, Path::new("mix.wav"));
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            ["-m", "-v", "0.75", "de.wav", "-v", "0.25", "hu.wav", "mix.wav"]
        );

        let single = sox.mix_command(&inputs[..1], Path::new("mix.wav"));
        assert_eq!(single.get_args().count(), 4);
    }

    #[test]
    fn mixing_nothing_is_rejected() {
        let err = SoxProcessor::new().mix(&[], Path::new("mix.wav")).unwrap_err();
        assert!(matches!(err, TtsError::InvalidBlend(_)));
    }

    fn write_tone(path: &Path, hz: f32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..16000 {
            let t = i as f32 / 16000.0;
            writer
                .write_sample(((t * hz * std::f32::consts::TAU).sin() * 8000.0) as i16)
                .unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn real_sox_mixes_two_takes() {
        let sox = SoxProcessor::new();
        if !sox.is_available() {
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let low = dir.path().join("low.wav");
        let high = dir.path().join("high.wav");
        write_tone(&low, 220.0);
        write_tone(&high, 440.0);

        let output = dir.path().join("mix.wav");
        sox.mix(&[(low, 0.7), (high, 0.3)], &output)
            .expect("sox should mix");
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }

    #[test]
    fn real_sox_renders_a_variant() {
        let sox = SoxProcessor::new();
        if !sox.is_available() {
            return;
        }

        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        write_tone(&input, 220.0);

        let output = dir.path().join("out.wav");
        sox.apply(&input, &output, &default_presets()[0].effects)
            .expect("sox should succeed");
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }
}
