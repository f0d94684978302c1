use std::collections::BTreeSet;

use crate::error::Result;
use crate::ToPhonetic;

use super::table::{
    default_character_map, default_word_map, CharacterMap, MappingOverrides, WordMap,
};

/// Rule-based Hebrew-script Yiddish to Latin phonetic converter.
///
/// The input is scanned left to right. At the start of each
/// whitespace-delimited token the whole token is looked up in the
/// [`WordMap`]; everywhere else the [`CharacterMap`] key that matches the
/// most glyphs at the current position wins, even when it spans whitespace.
/// Glyphs present in neither table are copied to the output unchanged.
///
/// ```
/// use yiddish_tts::transliteration::Transliterator;
///
/// let transliterator = Transliterator::new();
/// assert_eq!(transliterator.transliterate("שלום עליכם"), "shalum elikm");
/// ```
#[derive(Debug, Clone)]
pub struct Transliterator {
    chars: CharacterMap,
    words: WordMap,
}

impl Default for Transliterator {
    fn default() -> Self {
        Self::new()
    }
}

impl Transliterator {
    /// Create a transliterator over the built-in tables.
    pub fn new() -> Self {
        Self::with_tables(default_character_map(), default_word_map())
    }

    /// Create a transliterator over caller-supplied tables.
    pub fn with_tables(chars: CharacterMap, words: WordMap) -> Self {
        Self { chars, words }
    }

    pub fn character_map(&self) -> &CharacterMap {
        &self.chars
    }

    pub fn word_map(&self) -> &WordMap {
        &self.words
    }

    pub fn transliterate(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() * 2);
        let mut rest = text;
        let mut at_token_start = true;

        while let Some(ch) = rest.chars().next() {
            if at_token_start && !ch.is_whitespace() {
                let token = &rest[..token_end(rest)];
                if let Some(phonetic) = self.words.get(token) {
                    out.push_str(phonetic);
                    rest = &rest[token.len()..];
                    at_token_start = false;
                    continue;
                }
            }

            // Character keys may span whitespace, so match against the whole remainder.
            let consumed = match self.chars.longest_match(rest) {
                Some((len, phonetic)) => {
                    out.push_str(phonetic);
                    len
                }
                None => {
                    out.push(ch);
                    ch.len_utf8()
                }
            };
            at_token_start = rest[..consumed].ends_with(char::is_whitespace);
            rest = &rest[consumed..];
        }

        out
    }

    /// Source-script code points that survive transliteration of `text`.
    pub fn gaps(&self, text: &str) -> Vec<char> {
        self.transliterate(text)
            .chars()
            .filter(|&c| is_hebrew_script(c))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Register or replace a whole-word spelling.
    pub fn add_word_mapping(&mut self, word: impl Into<String>, phonetic: impl Into<String>) {
        self.words.insert(word, phonetic);
    }

    /// Register or replace a glyph-sequence spelling.
    pub fn add_char_mapping(&mut self, glyphs: impl Into<String>, phonetic: impl Into<String>) {
        self.chars.insert(glyphs, phonetic);
    }

    pub fn remove_word_mapping(&mut self, word: &str) -> Option<String> {
        self.words.remove(word)
    }

    pub fn remove_char_mapping(&mut self, glyphs: &str) -> Option<String> {
        self.chars.remove(glyphs)
    }

    pub fn with_word_mapping(
        mut self,
        word: impl Into<String>,
        phonetic: impl Into<String>,
    ) -> Self {
        self.add_word_mapping(word, phonetic);
        self
    }

    pub fn with_char_mapping(
        mut self,
        glyphs: impl Into<String>,
        phonetic: impl Into<String>,
    ) -> Self {
        self.add_char_mapping(glyphs, phonetic);
        self
    }

    /// Insert every entry of `overrides` through the regular add operations.
    pub fn apply_overrides(&mut self, overrides: &MappingOverrides) {
        for (word, phonetic) in &overrides.words {
            self.add_word_mapping(word.as_str(), phonetic.as_str());
        }
        for (glyphs, phonetic) in &overrides.chars {
            self.add_char_mapping(glyphs.as_str(), phonetic.as_str());
        }
        log::debug!(
            "Applied {} word and {} character overrides",
            overrides.words.len(),
            overrides.chars.len()
        );
    }
}

impl ToPhonetic for Transliterator {
    fn to_phonetic(&self, text: &str) -> Result<String> {
        Ok(self.transliterate(text))
    }
}

/// Byte length of the leading non-whitespace run of `text`.
fn token_end(text: &str) -> usize {
    text.find(char::is_whitespace).unwrap_or(text.len())
}

/// Hebrew block plus the presentation forms used for pointed Yiddish letters.
pub fn is_hebrew_script(c: char) -> bool {
    matches!(c, '\u{0590}'..='\u{05FF}' | '\u{FB1D}'..='\u{FB4F}')
}
