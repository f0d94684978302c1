//! Text to waveform: transliteration followed by one engine call per text.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::accent::{Accent, AccentBlend, BlendComponent};
use crate::engines::ensure_written;
use crate::error::{Result, TtsError};
use crate::transliteration::{is_hebrew_script, Transliterator};
use crate::{EffectsProcessor, ProsodyConfig, SpeechEngine, ToPhonetic};

/// Drives a [`SpeechEngine`] with phonetic text produced by a [`ToPhonetic`]
/// converter (the rule-based [`Transliterator`] unless replaced).
///
/// Every call either returns the path of a non-empty waveform file or a
/// [`TtsError::Synthesis`] naming the input that failed. Failed engine calls
/// are not retried.
pub struct Synthesizer<E, T = Transliterator> {
    engine: E,
    transliterator: T,
    prosody: ProsodyConfig,
    batch_prefix: String,
    parallel: bool,
}

impl<E: SpeechEngine> Synthesizer<E> {
    pub fn new(engine: E) -> Self {
        Self::with_transliterator(engine, Transliterator::new())
    }
}

impl<E: SpeechEngine, T: ToPhonetic> Synthesizer<E, T> {
    pub fn with_transliterator(engine: E, transliterator: T) -> Self {
        Self {
            engine,
            transliterator,
            prosody: ProsodyConfig::default(),
            batch_prefix: "yiddish_".to_string(),
            parallel: true,
        }
    }

    /// Prosody used by [`batch_synthesize`](Self::batch_synthesize).
    pub fn with_prosody(mut self, prosody: ProsodyConfig) -> Self {
        self.prosody = prosody;
        self
    }

    /// File name prefix for batch outputs (`<prefix>001.wav`, ...).
    pub fn with_batch_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.batch_prefix = prefix.into();
        self
    }

    /// Run batch items one at a time instead of on the rayon pool.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn prosody(&self) -> &ProsodyConfig {
        &self.prosody
    }

    pub fn transliterator(&self) -> &T {
        &self.transliterator
    }

    pub fn transliterator_mut(&mut self) -> &mut T {
        &mut self.transliterator
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Convert Hebrew-script text to its phonetic spelling.
    pub fn phonetic(&self, text: &str) -> Result<String> {
        let phonetic = self.transliterator.to_phonetic(text)?;
        let gaps: String = phonetic.chars().filter(|&c| is_hebrew_script(c)).collect();
        if !gaps.is_empty() {
            log::warn!("No transliteration for {gaps:?}; passing them to the engine as-is");
        }
        Ok(phonetic)
    }

    /// Synthesize already-phonetic text.
    pub fn synthesize(
        &self,
        phonetic: &str,
        output: &Path,
        prosody: &ProsodyConfig,
    ) -> Result<PathBuf> {
        self.render(phonetic, phonetic, output, prosody)
    }

    /// Alias of [`synthesize`](Self::synthesize).
    pub fn synthesize_phonetic(
        &self,
        phonetic: &str,
        output: &Path,
        prosody: &ProsodyConfig,
    ) -> Result<PathBuf> {
        self.synthesize(phonetic, output, prosody)
    }

    /// Transliterate `text`, then synthesize it.
    pub fn synthesize_text(
        &self,
        text: &str,
        output: &Path,
        prosody: &ProsodyConfig,
    ) -> Result<PathBuf> {
        log::info!("Converting: {text}");
        let phonetic = self.phonetic(text).map_err(|e| synthesis_error(text, e))?;
        log::info!("Phonetic: {phonetic}");
        self.render(text, &phonetic, output, prosody)
    }

    /// Synthesize each text to `<output_dir>/<prefix><NNN>.wav`, numbered from
    /// 1 in input order.
    ///
    /// The outer error covers only creating `output_dir`. Each slot of the
    /// returned vector holds the outcome for the text at the same index, so
    /// one failed text never hides the others.
    pub fn batch_synthesize<S>(
        &self,
        texts: &[S],
        output_dir: &Path,
    ) -> Result<Vec<Result<PathBuf>>>
    where
        S: AsRef<str> + Sync,
    {
        std::fs::create_dir_all(output_dir)?;

        let job = |(idx, text): (usize, &S)| {
            let output = output_dir.join(format!("{}{:03}.wav", self.batch_prefix, idx + 1));
            self.synthesize_text(text.as_ref(), &output, &self.prosody)
        };

        let results: Vec<Result<PathBuf>> = if self.parallel {
            texts.par_iter().enumerate().map(job).collect()
        } else {
            texts.iter().enumerate().map(job).collect()
        };

        let failed = results.iter().filter(|r| r.is_err()).count();
        log::info!(
            "Batch finished: {} of {} texts synthesized",
            results.len() - failed,
            results.len()
        );
        Ok(results)
    }

    /// Render `text` once per [`Accent`] as
    /// `<output_dir>/accent_comparison_<accent>.wav`.
    pub fn compare_accents(
        &self,
        text: &str,
        output_dir: &Path,
    ) -> Result<Vec<(Accent, Result<PathBuf>)>> {
        let phonetic = self.phonetic(text).map_err(|e| synthesis_error(text, e))?;
        self.compare_accents_phonetic(&phonetic, output_dir)
    }

    /// [`compare_accents`](Self::compare_accents) for already-phonetic text.
    pub fn compare_accents_phonetic(
        &self,
        phonetic: &str,
        output_dir: &Path,
    ) -> Result<Vec<(Accent, Result<PathBuf>)>> {
        std::fs::create_dir_all(output_dir)?;

        let job = |accent: &Accent| {
            let output = output_dir.join(format!("accent_comparison_{accent}.wav"));
            let result = self.render(phonetic, phonetic, &output, &accent.prosody());
            (*accent, result)
        };

        Ok(if self.parallel {
            Accent::ALL.par_iter().map(job).collect()
        } else {
            Accent::ALL.iter().map(job).collect()
        })
    }

    /// Transliterate `text`, then render it as `blend`.
    pub fn blend_accents<P: EffectsProcessor>(
        &self,
        text: &str,
        blend: &AccentBlend,
        processor: &P,
        output: &Path,
    ) -> Result<PathBuf> {
        let phonetic = self.phonetic(text).map_err(|e| synthesis_error(text, e))?;
        self.blend_phonetic(&phonetic, blend, processor, output)
    }

    /// Render `phonetic` once per blend component into a scratch directory,
    /// mix the takes with normalized weights, then apply the blend's tempo
    /// and pitch chain to produce `output`.
    ///
    /// A take that fails to render fails the whole blend with
    /// [`TtsError::Blend`]; no partial mix is written.
    pub fn blend_phonetic<P: EffectsProcessor>(
        &self,
        phonetic: &str,
        blend: &AccentBlend,
        processor: &P,
        output: &Path,
    ) -> Result<PathBuf> {
        self.try_blend(phonetic, blend, processor, output)
            .map_err(|source| {
                let error = TtsError::Blend {
                    blend: blend.name.clone(),
                    source: Box::new(source),
                };
                log::error!("{error}");
                error
            })
    }

    fn try_blend<P: EffectsProcessor>(
        &self,
        phonetic: &str,
        blend: &AccentBlend,
        processor: &P,
        output: &Path,
    ) -> Result<PathBuf> {
        let weights = blend.normalized_weights()?;
        let chain = blend.effects();
        for effect in &chain {
            effect.validate()?;
        }

        let scratch = tempfile::tempdir()?;
        let job = |(idx, component): (usize, &BlendComponent)| {
            let take = scratch
                .path()
                .join(format!("take_{}_{}.wav", idx + 1, component.accent));
            self.render(phonetic, phonetic, &take, &component.accent.prosody())
                .map_err(|e| {
                    log::warn!("{} take for blend '{}' failed", component.accent, blend.name);
                    e
                })
        };
        let takes: Vec<Result<PathBuf>> = if self.parallel {
            blend.components.par_iter().enumerate().map(job).collect()
        } else {
            blend.components.iter().enumerate().map(job).collect()
        };
        let takes = takes.into_iter().collect::<Result<Vec<_>>>()?;
        let inputs: Vec<(PathBuf, f32)> = takes.into_iter().zip(weights).collect();

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        log::debug!("Mixing {} takes for blend '{}'", inputs.len(), blend.name);
        if chain.is_empty() {
            processor.mix(&inputs, output)?;
        } else {
            let mixed = scratch.path().join("mixed.wav");
            processor.mix(&inputs, &mixed)?;
            processor.apply(&mixed, output, &chain)?;
        }
        ensure_written(output)?;

        log::info!("Blend '{}' written to {}", blend.name, output.display());
        Ok(output.to_path_buf())
    }

    fn render(
        &self,
        input: &str,
        phonetic: &str,
        output: &Path,
        prosody: &ProsodyConfig,
    ) -> Result<PathBuf> {
        self.try_render(phonetic, output, prosody)
            .map(|()| {
                log::info!("Generated: {}", output.display());
                output.to_path_buf()
            })
            .map_err(|e| synthesis_error(input, e))
    }

    fn try_render(&self, phonetic: &str, output: &Path, prosody: &ProsodyConfig) -> Result<()> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.engine.synthesize_to_file(phonetic, output, prosody)?;
        ensure_written(output)
    }
}

fn synthesis_error(input: &str, source: TtsError) -> TtsError {
    let error = TtsError::Synthesis {
        input: input.to_string(),
        source: Box::new(source),
    };
    log::error!("{error}");
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accent::BlendPreset;
    use crate::variants::Effect;
    use std::fs;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Writes the phonetic text as the "waveform" and records each request.
    #[derive(Default)]
    struct FakeEngine {
        calls: Mutex<Vec<(String, ProsodyConfig)>>,
        write_nothing: bool,
        fail_voice: Option<&'static str>,
    }

    impl SpeechEngine for FakeEngine {
        fn synthesize_to_file(
            &self,
            phonetic: &str,
            output: &Path,
            prosody: &ProsodyConfig,
        ) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((phonetic.to_string(), prosody.clone()));
            if phonetic.contains("boom") || self.fail_voice == Some(prosody.voice.as_str()) {
                return Err(TtsError::EngineFailed {
                    program: "fake".to_string(),
                    status: Some(1),
                    stderr: "cannot pronounce".to_string(),
                });
            }
            // Later inputs finish first.
            std::thread::sleep(Duration::from_millis(30 / (phonetic.len() as u64 + 1)));
            if !self.write_nothing {
                fs::write(output, phonetic)?;
            }
            Ok(())
        }
    }

    /// Concatenates mixed takes and records every request.
    #[derive(Default)]
    struct FakeMixer {
        mixes: Mutex<Vec<Vec<(PathBuf, f32)>>>,
        chains: Mutex<Vec<Vec<Effect>>>,
    }

    impl EffectsProcessor for FakeMixer {
        fn apply(&self, input: &Path, output: &Path, chain: &[Effect]) -> Result<()> {
            self.chains.lock().unwrap().push(chain.to_vec());
            fs::copy(input, output)?;
            Ok(())
        }

        fn mix(&self, inputs: &[(PathBuf, f32)], output: &Path) -> Result<()> {
            self.mixes.lock().unwrap().push(inputs.to_vec());
            let mut mixed = Vec::new();
            for (input, _) in inputs {
                mixed.extend(fs::read(input)?);
            }
            fs::write(output, mixed)?;
            Ok(())
        }
    }

    struct FailingTransliterator;

    impl ToPhonetic for FailingTransliterator {
        fn to_phonetic(&self, _text: &str) -> Result<String> {
            Err(TtsError::Mapping("service unavailable".to_string()))
        }
    }

    #[test]
    fn synthesize_text_transliterates_and_passes_prosody() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/hello.wav");
        let synth = Synthesizer::new(FakeEngine::default());
        let prosody = Accent::German.prosody();

        let path = synth.synthesize_text("שלום עליכם", &out, &prosody).unwrap();

        assert_eq!(path, out);
        assert_eq!(fs::read_to_string(&out).unwrap(), "shalum elikm");
        let calls = synth.engine().calls.lock().unwrap();
        assert_eq!(calls[0].1, prosody);
    }

    #[test]
    fn batch_keeps_input_order_and_numbering() {
        let dir = tempfile::tempdir().unwrap();
        let synth = Synthesizer::new(FakeEngine::default());

        let results = synth.batch_synthesize(&["A", "BB", "CCC"], dir.path()).unwrap();

        let paths: Vec<PathBuf> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(
            paths,
            [
                dir.path().join("yiddish_001.wav"),
                dir.path().join("yiddish_002.wav"),
                dir.path().join("yiddish_003.wav"),
            ]
        );
        for (path, text) in paths.iter().zip(["A", "BB", "CCC"]) {
            assert_eq!(fs::read_to_string(path).unwrap(), text);
        }
    }

    #[test]
    fn batch_failure_is_confined_to_its_slot() {
        let dir = tempfile::tempdir().unwrap();
        let synth = Synthesizer::new(FakeEngine::default())
            .with_batch_prefix("batch_")
            .with_parallelism(false);

        let texts = vec!["גוט".to_string(), "boom".to_string(), "טאג".to_string()];
        let results = synth.batch_synthesize(&texts, dir.path()).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), &dir.path().join("batch_001.wav"));
        match &results[1] {
            Err(TtsError::Synthesis { input, source }) => {
                assert_eq!(input, "boom");
                assert!(source.to_string().contains("cannot pronounce"));
            }
            other => panic!("expected synthesis error, got {other:?}"),
        }
        assert_eq!(fs::read_to_string(dir.path().join("batch_003.wav")).unwrap(), "tog");
    }

    #[test]
    fn empty_engine_output_is_a_synthesis_error() {
        let dir = tempfile::tempdir().unwrap();
        let synth = Synthesizer::new(FakeEngine {
            write_nothing: true,
            ..Default::default()
        });

        let err = synth
            .synthesize("shalum", &dir.path().join("x.wav"), &ProsodyConfig::default())
            .unwrap_err();
        match err {
            TtsError::Synthesis { input, source } => {
                assert_eq!(input, "shalum");
                assert!(matches!(*source, TtsError::EmptyOutput(_)));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn transliterator_failure_names_the_input() {
        let dir = tempfile::tempdir().unwrap();
        let synth = Synthesizer::with_transliterator(FakeEngine::default(), FailingTransliterator);

        let err = synth
            .synthesize_text("שלום", &dir.path().join("x.wav"), &ProsodyConfig::default())
            .unwrap_err();
        assert!(matches!(err, TtsError::Synthesis { ref input, .. } if input == "שלום"));
        assert!(synth.engine().calls.lock().unwrap().is_empty());
    }

    #[test]
    fn compare_accents_renders_each_accent_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let synth = Synthesizer::new(FakeEngine::default());

        let results = synth.compare_accents("גוטן מארגן", dir.path()).unwrap();

        let accents: Vec<Accent> = results.iter().map(|(a, _)| *a).collect();
        assert_eq!(accents, Accent::ALL);
        let german = results[0].1.as_ref().unwrap();
        assert_eq!(german, &dir.path().join("accent_comparison_german.wav"));
        assert_eq!(fs::read_to_string(german).unwrap(), "gutn morgn");

        let voices: Vec<String> = synth
            .engine()
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p.voice.clone())
            .collect();
        assert_eq!(voices.len(), 6);
        assert!(voices.contains(&"hu".to_string()));
    }

    #[test]
    fn batch_uses_configured_prosody() {
        let dir = tempfile::tempdir().unwrap();
        let prosody = Accent::Polish.prosody();
        let synth = Synthesizer::new(FakeEngine::default()).with_prosody(prosody.clone());

        synth.batch_synthesize(&["איך"], dir.path()).unwrap();

        assert_eq!(synth.engine().calls.lock().unwrap()[0], ("ikh".to_string(), prosody));
    }

    #[test]
    fn blend_mixes_normalized_takes_then_shifts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("blend/hello.wav");
        let synth = Synthesizer::new(FakeEngine::default());
        let mixer = FakeMixer::default();
        let blend = AccentBlend::custom([(Accent::German, 3.0), (Accent::Hungarian, 1.0)], -5, -3);

        let path = synth.blend_accents("גוטן מארגן", &blend, &mixer, &out).unwrap();

        assert_eq!(path, out);
        assert_eq!(fs::read_to_string(&out).unwrap(), "gutn morgngutn morgn");

        let mixes = mixer.mixes.lock().unwrap();
        let weights: Vec<f32> = mixes[0].iter().map(|(_, w)| *w).collect();
        assert_eq!(weights, [0.75, 0.25]);
        // Takes live in a scratch directory that is gone once the blend is done.
        assert!(!mixes[0][0].0.exists());

        assert_eq!(
            *mixer.chains.lock().unwrap(),
            [vec![Effect::Tempo { factor: 0.95 }, Effect::Pitch { cents: -60 }]]
        );

        let mut voices: Vec<String> = synth
            .engine()
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, p)| p.voice.clone())
            .collect();
        voices.sort();
        assert_eq!(voices, ["de", "hu"]);
    }

    #[test]
    fn blend_without_adjustments_skips_the_effect_chain() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("plain.wav");
        let synth = Synthesizer::new(FakeEngine::default()).with_parallelism(false);
        let mixer = FakeMixer::default();
        let blend = AccentBlend::custom([(Accent::Dutch, 1.0)], 0, 0);

        synth.blend_phonetic("shalum", &blend, &mixer, &out).unwrap();

        assert!(mixer.chains.lock().unwrap().is_empty());
        assert_eq!(mixer.mixes.lock().unwrap()[0][0].1, 1.0);
        assert_eq!(fs::read_to_string(&out).unwrap(), "shalum");
    }

    #[test]
    fn one_failed_accent_take_fails_the_blend() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("blend.wav");
        let synth = Synthesizer::new(FakeEngine {
            fail_voice: Some("hu"),
            ..Default::default()
        });
        let mixer = FakeMixer::default();
        let blend = BlendPreset::YiddishAuthentic.blend();

        let err = synth.blend_phonetic("shalum", &blend, &mixer, &out).unwrap_err();

        match err {
            TtsError::Blend { blend, source } => {
                assert_eq!(blend, "yiddish_authentic");
                assert!(matches!(*source, TtsError::Synthesis { .. }));
            }
            other => panic!("expected blend error, got {other}"),
        }
        assert!(mixer.mixes.lock().unwrap().is_empty());
        assert!(!out.exists());
    }

    #[test]
    fn invalid_blend_never_reaches_the_engine() {
        let dir = tempfile::tempdir().unwrap();
        let synth = Synthesizer::new(FakeEngine::default());
        let blend = AccentBlend::custom([(Accent::German, 0.0)], 0, 0);

        let err = synth
            .blend_phonetic("shalum", &blend, &FakeMixer::default(), &dir.path().join("x.wav"))
            .unwrap_err();

        assert!(matches!(
            err,
            TtsError::Blend { ref source, .. } if matches!(**source, TtsError::InvalidBlend(_))
        ));
        assert!(synth.engine().calls.lock().unwrap().is_empty());
    }

    #[test]
    fn phonetic_entry_points_skip_transliteration() {
        let dir = tempfile::tempdir().unwrap();
        let synth = Synthesizer::with_transliterator(FakeEngine::default(), FailingTransliterator)
            .with_parallelism(false);

        let results = synth.compare_accents_phonetic("shalum", dir.path()).unwrap();
        assert!(results.iter().all(|(_, r)| r.is_ok()));

        let blend = AccentBlend::custom([(Accent::Russian, 1.0)], 0, 0);
        let out = dir.path().join("blend.wav");
        synth
            .blend_phonetic("shalum", &blend, &FakeMixer::default(), &out)
            .unwrap();

        let calls = synth.engine().calls.lock().unwrap();
        assert_eq!(calls.len(), 7);
        assert!(calls.iter().all(|(phonetic, _)| phonetic == "shalum"));
    }
}
