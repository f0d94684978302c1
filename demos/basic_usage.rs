use std::path::{Path, PathBuf};
use std::time::Instant;

use yiddish_tts::{
    accent::BlendPreset,
    engines::{EspeakEngine, FileProbe, SoxProcessor},
    reference::ReferenceSelector,
    synthesizer::Synthesizer,
    variants::VoiceCloner,
    ProsodyConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let synthesizer = Synthesizer::new(EspeakEngine::new()).with_batch_prefix("batch_");
    let output_dir = PathBuf::from("output");

    // Single text
    let synth_start = Instant::now();
    let base = synthesizer.synthesize_text(
        "די בריוו איז אינטערגעשריבן דורך די אויסערן מיניסטארן",
        &output_dir.join("base_speech.wav"),
        &ProsodyConfig::default(),
    )?;
    println!("Synthesized {} in {:.2?}", base.display(), synth_start.elapsed());

    // Batch
    let texts = [
        "גוטן מארגן",
        "וואס מאכסטו?",
        "איך בין זייער פרייליך",
        "א גוטן טאג צו אלע",
        "מיר זענען דא צו העלפן",
    ];
    for (text, result) in texts.iter().zip(synthesizer.batch_synthesize(&texts, &output_dir)?) {
        match result {
            Ok(path) => println!("{text} -> {}", path.display()),
            Err(e) => println!("{text} -> failed: {e}"),
        }
    }

    // Accent blend
    let sox = SoxProcessor::new();
    let blend = BlendPreset::YiddishAuthentic.blend();
    match synthesizer.blend_accents("שלום עליכם", &blend, &sox, &output_dir.join("blend.wav")) {
        Ok(path) => println!("{} -> {}", blend.mix_summary(), path.display()),
        Err(e) => println!("Blend failed: {e}"),
    }

    // Variants
    let selector = ReferenceSelector::new(FileProbe);
    if let Some(reference) = selector.select_best(Path::new("yiddish24_audio")) {
        println!("Best reference: {}", reference.path.display());
    }
    let report = VoiceCloner::new(sox).clone_voice(&base, &output_dir)?;
    for (name, path) in report.paths() {
        println!("{name}: {}", path.display());
    }
    for failure in &report.failures {
        println!("{}: {}", failure.preset, failure.error);
    }

    Ok(())
}
