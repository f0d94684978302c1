//! Synthesis accents.
//!
//! Yiddish has no dedicated espeak voice, so the phonetic text is read by the
//! voice of a related language. Each accent pairs such a voice with the speed
//! and pitch that suit it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TtsError};
use crate::variants::Effect;
use crate::ProsodyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    /// Closest to historical Yiddish.
    German,
    Polish,
    Russian,
    Hungarian,
    Dutch,
    English,
}

impl Accent {
    pub const ALL: [Accent; 6] = [
        Accent::German,
        Accent::Polish,
        Accent::Russian,
        Accent::Hungarian,
        Accent::Dutch,
        Accent::English,
    ];

    /// Espeak voice identifier.
    pub fn voice(self) -> &'static str {
        match self {
            Accent::German => "de",
            Accent::Polish => "pl",
            Accent::Russian => "ru",
            Accent::Hungarian => "hu",
            Accent::Dutch => "nl",
            Accent::English => "en",
        }
    }

    pub fn prosody(self) -> ProsodyConfig {
        let (speed, pitch) = match self {
            Accent::German => (140, 45),
            Accent::Polish => (125, 48),
            Accent::Russian => (130, 42),
            Accent::Hungarian => (145, 50),
            Accent::Dutch => (150, 47),
            Accent::English => (150, 50),
        };
        ProsodyConfig {
            speed,
            pitch,
            voice: self.voice().to_string(),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Accent::German => "german",
            Accent::Polish => "polish",
            Accent::Russian => "russian",
            Accent::Hungarian => "hungarian",
            Accent::Dutch => "dutch",
            Accent::English => "english",
        }
    }
}

impl fmt::Display for Accent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}

/// One accent's share of an [`AccentBlend`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendComponent {
    pub accent: Accent,
    /// Relative weight; weights are normalized to sum to 1 before mixing.
    pub weight: f32,
}

/// Several accents rendered separately, mixed into one waveform and then
/// shifted in tempo and pitch.
///
/// ```
/// use yiddish_tts::accent::{Accent, AccentBlend};
///
/// let blend = AccentBlend::custom([(Accent::German, 3.0), (Accent::Dutch, 1.0)], -5, 0);
/// assert_eq!(blend.normalized_weights().unwrap(), vec![0.75, 0.25]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccentBlend {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub components: Vec<BlendComponent>,
    /// Tempo change in percent of the mixed take.
    #[serde(default)]
    pub speed_adjust: i32,
    /// Pitch change in steps of 20 cents.
    #[serde(default)]
    pub pitch_adjust: i32,
}

impl AccentBlend {
    /// A blend named `custom` over arbitrary accents and weights.
    pub fn custom(
        components: impl IntoIterator<Item = (Accent, f32)>,
        speed_adjust: i32,
        pitch_adjust: i32,
    ) -> Self {
        let components: Vec<BlendComponent> = components
            .into_iter()
            .map(|(accent, weight)| BlendComponent { accent, weight })
            .collect();
        let description = components
            .iter()
            .map(|c| c.accent.key())
            .collect::<Vec<_>>()
            .join(" + ");
        Self {
            name: "custom".to_string(),
            description,
            components,
            speed_adjust,
            pitch_adjust,
        }
    }

    /// Component weights scaled to sum to 1, in component order.
    pub fn normalized_weights(&self) -> Result<Vec<f32>> {
        if self.components.is_empty() {
            return Err(TtsError::InvalidBlend(format!("'{}' has no accents", self.name)));
        }
        if let Some(bad) = self
            .components
            .iter()
            .find(|c| !(c.weight.is_finite() && c.weight >= 0.0))
        {
            return Err(TtsError::InvalidBlend(format!(
                "weight {} for {} must be a non-negative number",
                bad.weight, bad.accent
            )));
        }
        let total: f32 = self.components.iter().map(|c| c.weight).sum();
        if total <= 0.0 {
            return Err(TtsError::InvalidBlend(format!(
                "'{}' weights sum to zero",
                self.name
            )));
        }
        Ok(self.components.iter().map(|c| c.weight / total).collect())
    }

    /// Post-mix chain: tempo first, then pitch. Zero adjustments are omitted.
    pub fn effects(&self) -> Vec<Effect> {
        let mut chain = Vec::new();
        if self.speed_adjust != 0 {
            chain.push(Effect::Tempo {
                factor: 1.0 + self.speed_adjust as f32 / 100.0,
            });
        }
        if self.pitch_adjust != 0 {
            chain.push(Effect::Pitch {
                cents: self.pitch_adjust * 20,
            });
        }
        chain
    }

    /// `german (70%) + hungarian (30%)`, from the raw weights.
    pub fn mix_summary(&self) -> String {
        let total: f32 = self.components.iter().map(|c| c.weight).sum();
        self.components
            .iter()
            .map(|c| {
                let share = if total > 0.0 { c.weight / total } else { 0.0 };
                format!("{} ({:.0}%)", c.accent, share * 100.0)
            })
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

/// Built-in accent blends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "cli", value(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BlendPreset {
    /// German-led, with Hungarian.
    YiddishAuthentic,
    EasternEuropean,
    GermanicYiddish,
    AustroHungarian,
}

impl BlendPreset {
    pub const ALL: [BlendPreset; 4] = [
        BlendPreset::YiddishAuthentic,
        BlendPreset::EasternEuropean,
        BlendPreset::GermanicYiddish,
        BlendPreset::AustroHungarian,
    ];

    pub fn key(self) -> &'static str {
        match self {
            BlendPreset::YiddishAuthentic => "yiddish_authentic",
            BlendPreset::EasternEuropean => "eastern_european",
            BlendPreset::GermanicYiddish => "germanic_yiddish",
            BlendPreset::AustroHungarian => "austro_hungarian",
        }
    }

    pub fn blend(self) -> AccentBlend {
        use Accent::*;

        let (description, components, speed_adjust, pitch_adjust): (_, &[(Accent, f32)], _, _) =
            match self {
                BlendPreset::YiddishAuthentic => (
                    "German + Hungarian (historical Yiddish regions)",
                    &[(German, 0.7), (Hungarian, 0.3)],
                    -5,
                    -3,
                ),
                BlendPreset::EasternEuropean => (
                    "Polish + Russian + Hungarian",
                    &[(Polish, 0.4), (Russian, 0.4), (Hungarian, 0.2)],
                    -8,
                    -2,
                ),
                BlendPreset::GermanicYiddish => (
                    "German + Dutch (Germanic languages)",
                    &[(German, 0.8), (Dutch, 0.2)],
                    -3,
                    -5,
                ),
                BlendPreset::AustroHungarian => (
                    "German + Hungarian (Habsburg Empire)",
                    &[(German, 0.6), (Hungarian, 0.4)],
                    -10,
                    0,
                ),
            };

        AccentBlend {
            name: self.key().to_string(),
            description: description.to_string(),
            components: components
                .iter()
                .map(|&(accent, weight)| BlendComponent { accent, weight })
                .collect(),
            speed_adjust,
            pitch_adjust,
        }
    }
}

impl fmt::Display for BlendPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.key())
    }
}
