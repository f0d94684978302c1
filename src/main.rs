use std::path::{Path, PathBuf};

use clap::Parser;

use yiddish_tts::accent::{Accent, BlendPreset};
use yiddish_tts::engines::{EspeakEngine, FileProbe, SoxProcessor};
use yiddish_tts::reference::ReferenceSelector;
use yiddish_tts::synthesizer::Synthesizer;
use yiddish_tts::transliteration::{MappingOverrides, Transliterator};
use yiddish_tts::variants::VoiceCloner;
use yiddish_tts::ProsodyConfig;

/// Convert Yiddish text (Hebrew script) to speech
#[derive(Parser, Debug)]
#[command(name = "yiddish-tts", version)]
#[command(after_help = "Examples:\n  \
    yiddish-tts \"שלום עליכם\" --output hello.wav\n  \
    yiddish-tts \"שלום עליכם\" --output hello.wav --voice-clone\n  \
    yiddish-tts \"שלום עליכם\" --output hello.wav --speed 120 --pitch 40\n  \
    yiddish-tts \"שלום עליכם\" --output hello.wav --blend yiddish_authentic")]
struct Cli {
    /// Yiddish text in Hebrew script
    text: String,

    /// Output audio file
    #[arg(short, long, default_value = "output/yiddish_speech.wav")]
    output: PathBuf,

    /// Speech speed in words per minute [default: 150, or the accent's]
    #[arg(short, long)]
    speed: Option<u32>,

    /// Voice pitch 0-99 [default: 50, or the accent's]
    #[arg(short, long)]
    pitch: Option<u32>,

    /// Synthesis voice [default: en, or the accent's]
    #[arg(short, long)]
    voice: Option<String>,

    /// Read the phonetic text with a related language's voice
    #[arg(short, long, value_enum)]
    accent: Option<Accent>,

    /// Render the output as a mix of several accents instead of one voice
    #[arg(short, long, value_enum, conflicts_with_all = ["accent", "voice"])]
    blend: Option<BlendPreset>,

    /// Also render pitch/tempo/EQ voice variants next to the output
    #[arg(long)]
    voice_clone: bool,

    /// Directory of reference recordings considered with --voice-clone
    #[arg(short, long, default_value = "yiddish24_audio")]
    reference_dir: PathBuf,

    /// JSON file with extra {"words": {..}, "chars": {..}} mappings
    #[arg(long)]
    mappings: Option<PathBuf>,

    /// Print the phonetic text and exit
    #[arg(long)]
    phonetic_only: bool,

    /// Also render the text once per accent
    #[arg(long)]
    compare_accents: bool,

    /// espeak binary
    #[arg(long)]
    espeak: Option<PathBuf>,

    /// sox binary
    #[arg(long)]
    sox: Option<PathBuf>,
}

impl Cli {
    fn prosody(&self) -> ProsodyConfig {
        let mut prosody = self.accent.map(Accent::prosody).unwrap_or_default();
        if let Some(speed) = self.speed {
            prosody.speed = speed;
        }
        if let Some(pitch) = self.pitch {
            prosody.pitch = pitch;
        }
        if let Some(voice) = &self.voice {
            prosody.voice = voice.clone();
        }
        prosody
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut transliterator = Transliterator::new();
    if let Some(path) = &cli.mappings {
        transliterator.apply_overrides(&MappingOverrides::load(path)?);
    }

    if cli.phonetic_only {
        println!("{}", transliterator.transliterate(&cli.text));
        return Ok(());
    }

    let engine = cli
        .espeak
        .clone()
        .map(EspeakEngine::with_binary)
        .unwrap_or_default();
    let synthesizer = Synthesizer::with_transliterator(engine, transliterator);

    let processor = cli
        .sox
        .clone()
        .map(SoxProcessor::with_binary)
        .unwrap_or_default();

    println!("Yiddish Text-to-Speech");
    println!("Converting: {}", cli.text);
    let phonetic = synthesizer.phonetic(&cli.text)?;
    println!("Phonetic:   {phonetic}");

    let output = match cli.blend {
        Some(preset) => {
            let blend = preset.blend();
            println!("Blend:      {} ({})", blend.name, blend.mix_summary());
            synthesizer.blend_phonetic(&phonetic, &blend, &processor, &cli.output)?
        }
        None => synthesizer.synthesize(&phonetic, &cli.output, &cli.prosody())?,
    };
    println!("Generated:  {}", output.display());

    let output_dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if cli.compare_accents {
        for (accent, result) in synthesizer.compare_accents_phonetic(&phonetic, &output_dir)? {
            match result {
                Ok(path) => println!("  {accent:<10} {}", path.display()),
                Err(e) => eprintln!("  {accent:<10} failed: {e}"),
            }
        }
    }

    if cli.voice_clone {
        run_voice_variants(&cli, processor, &output, &output_dir);
    }

    println!("Complete! Generated: {}", output.display());
    Ok(())
}

/// Variant generation never changes the exit status; problems are printed.
fn run_voice_variants(cli: &Cli, processor: SoxProcessor, source: &Path, output_dir: &Path) {
    println!("\nApplying voice variants...");

    match ReferenceSelector::new(FileProbe).select_best(&cli.reference_dir) {
        Some(reference) => println!(
            "Reference:  {} ({:.1}s, {} Hz)",
            reference.path.display(),
            reference.info.duration_secs,
            reference.info.sample_rate
        ),
        None => println!(
            "Reference:  none eligible in {}",
            cli.reference_dir.display()
        ),
    }

    let report = match VoiceCloner::new(processor).clone_voice(source, output_dir) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Voice variants failed: {e}");
            return;
        }
    };

    println!("Original:   {}", source.display());
    for variant in &report.variants {
        println!("  {:<10} {}", variant.name, variant.path.display());
    }
    for failure in &report.failures {
        eprintln!("  {:<10} failed: {}", failure.preset, failure.error);
    }
}
