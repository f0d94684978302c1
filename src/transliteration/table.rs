use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, TtsError};

/// Glyph-sequence to phonetic-token table with longest-match-first lookup.
///
/// Keys may span several code points (digraphs, letters with points, ligature
/// sequences). Lookups try the longest registered key length first and walk
/// down to single glyphs, so a multi-glyph key always wins over its prefix.
#[derive(Debug, Clone, Default)]
pub struct CharacterMap {
    entries: HashMap<String, String>,
    /// Length in chars of the longest key ever inserted.
    longest_key: usize,
}

impl CharacterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a mapping. Empty keys are ignored.
    pub fn insert(&mut self, glyphs: impl Into<String>, phonetic: impl Into<String>) {
        let glyphs = glyphs.into();
        let len = glyphs.chars().count();
        if len == 0 {
            log::warn!("Ignoring empty character-map key");
            return;
        }
        self.longest_key = self.longest_key.max(len);
        self.entries.insert(glyphs, phonetic.into());
    }

    pub fn remove(&mut self, glyphs: &str) -> Option<String> {
        self.entries.remove(glyphs)
    }

    pub fn get(&self, glyphs: &str) -> Option<&str> {
        self.entries.get(glyphs).map(String::as_str)
    }

    /// Find the longest key that is a prefix of `input`.
    ///
    /// Returns the matched key's byte length and its phonetic value.
    pub fn longest_match<'a>(&'a self, input: &str) -> Option<(usize, &'a str)> {
        // Byte offsets of the first `longest_key` char boundaries after position 0.
        let ends: Vec<usize> = input
            .char_indices()
            .skip(1)
            .map(|(idx, _)| idx)
            .chain(std::iter::once(input.len()))
            .take(self.longest_key)
            .collect();

        ends.iter().rev().find_map(|&end| {
            self.entries
                .get(&input[..end])
                .map(|phonetic| (end, phonetic.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Whole-word table consulted before character decomposition.
#[derive(Debug, Clone, Default)]
pub struct WordMap {
    entries: HashMap<String, String>,
}

impl WordMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: impl Into<String>, phonetic: impl Into<String>) {
        self.entries.insert(word.into(), phonetic.into());
    }

    pub fn remove(&mut self, word: &str) -> Option<String> {
        self.entries.remove(word)
    }

    /// Exact match only; no trimming or partial overlap.
    pub fn get(&self, word: &str) -> Option<&str> {
        self.entries.get(word).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// User-supplied additions to the built-in tables, read from JSON:
///
/// ```json
/// { "words": { "שלום": "sholem" }, "chars": { "ך": "kh" } }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingOverrides {
    #[serde(default)]
    pub words: HashMap<String, String>,
    #[serde(default)]
    pub chars: HashMap<String, String>,
}

impl MappingOverrides {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let overrides: Self = serde_json::from_str(content)?;
        if let Some(key) = overrides
            .words
            .keys()
            .chain(overrides.chars.keys())
            .find(|k| k.trim().is_empty())
        {
            return Err(TtsError::Mapping(format!("empty key {key:?}")));
        }
        Ok(overrides)
    }
}

/// Built-in character table: letters, final forms, points, ligatures and
/// the multi-glyph sequences that must not be split.
pub fn default_character_map() -> CharacterMap {
    let entries: &[(&str, &str)] = &[
        // Letters
        ("א", "a"),
        ("ב", "b"),
        ("ג", "g"),
        ("ד", "d"),
        ("ה", "h"),
        ("ו", "u"),
        ("ז", "z"),
        ("ח", "kh"),
        ("ט", "t"),
        ("י", "i"),
        ("כ", "k"),
        ("ל", "l"),
        ("מ", "m"),
        ("נ", "n"),
        ("ס", "s"),
        ("ע", "e"),
        ("פ", "p"),
        ("צ", "ts"),
        ("ק", "k"),
        ("ר", "r"),
        ("ש", "sh"),
        ("ת", "t"),
        // Final forms
        ("ך", "kh"),
        ("ם", "m"),
        ("ן", "n"),
        ("ף", "f"),
        ("ץ", "ts"),
        // Vowel points
        ("\u{05B7}", "a"),
        ("\u{05B8}", "o"),
        ("\u{05B6}", "e"),
        ("\u{05B5}", "e"),
        ("\u{05B4}", "i"),
        ("\u{05B9}", "o"),
        ("\u{05BB}", "u"),
        ("\u{05B0}", ""),
        ("\u{05BC}", ""),
        ("\u{05BF}", ""),
        // Pointed letters
        ("אַ", "a"),
        ("אָ", "o"),
        ("בֿ", "v"),
        ("כּ", "k"),
        ("פּ", "p"),
        ("פֿ", "f"),
        ("שׂ", "s"),
        ("שׁ", "sh"),
        ("תּ", "t"),
        ("יִ", "i"),
        ("וּ", "u"),
        // Ligatures
        ("װ", "v"),
        ("ױ", "oy"),
        ("ײ", "ey"),
        ("ײַ", "ay"),
        // Digraphs and trigraphs
        ("וו", "v"),
        ("וי", "oy"),
        ("יי", "ey"),
        ("ייַ", "ay"),
        ("טש", "tsh"),
        ("זש", "zh"),
        ("דזש", "dzh"),
        // Punctuation
        ("׳", ""),
        ("״", ""),
        ("־", "-"),
        ("\n", " "),
        ("\t", " "),
    ];

    let mut map = CharacterMap::new();
    for &(glyphs, phonetic) in entries {
        map.insert(glyphs, phonetic);
    }
    map
}

/// Built-in whole-word table with hand-picked spellings for common words.
pub fn default_word_map() -> WordMap {
    let entries: &[(&str, &str)] = &[
        ("שלום", "shalum"),
        // Function words
        ("און", "un"),
        ("אין", "in"),
        ("איז", "iz"),
        ("דאס", "das"),
        ("דער", "der"),
        ("די", "di"),
        ("פון", "fun"),
        ("מיט", "mit"),
        ("אויף", "oyf"),
        ("צו", "tsu"),
        ("פאר", "far"),
        ("נאך", "nokh"),
        ("אלע", "ale"),
        ("אבער", "ober"),
        ("נאר", "nor"),
        ("שוין", "shoyn"),
        ("דאך", "dokh"),
        // Questions
        ("וואס", "vas"),
        ("ווער", "ver"),
        ("ווען", "ven"),
        ("וואו", "vu"),
        ("ווו", "vu"),
        ("ווי", "vi"),
        ("פארוואס", "farvos"),
        // Pronouns
        ("איך", "ikh"),
        ("דו", "du"),
        ("ער", "er"),
        ("זי", "zi"),
        ("מיר", "mir"),
        ("איר", "ir"),
        // Verbs
        ("וועט", "vet"),
        ("וועל", "vel"),
        ("וועלן", "veln"),
        ("האט", "hot"),
        ("האבן", "hobn"),
        ("זיין", "zayn"),
        ("קענען", "kenen"),
        ("גיין", "geyn"),
        ("קומען", "kumen"),
        ("זאגן", "zogn"),
        ("טון", "tun"),
        ("געבן", "gebn"),
        ("נעמען", "nemen"),
        ("זען", "zen"),
        ("הערן", "hern"),
        ("געווען", "geven"),
        ("געהאט", "gehat"),
        ("געמאכט", "gemakht"),
        ("געזאגט", "gezogt"),
        ("באטראפן", "betrofn"),
        ("געווארן", "gevorn"),
        ("געגאנגען", "gegangen"),
        ("געקומען", "gekumen"),
        ("געגעבן", "gegeben"),
        ("גענומען", "genumen"),
        ("געזען", "gezen"),
        ("געהערט", "gehert"),
        // Greetings and time
        ("גוטן", "gutn"),
        ("מארגן", "morgn"),
        ("טאג", "tog"),
        ("נאכט", "nakht"),
        ("אווענט", "ovnt"),
        ("דאנק", "dank"),
        // People
        ("מאמע", "mame"),
        ("טאטע", "tate"),
        ("קינד", "kind"),
        ("מענטש", "mentsh"),
        ("פריינד", "freynd"),
        ("ברודער", "bruder"),
        ("שוועסטער", "shvester"),
        ("חבר", "khaver"),
        ("זיידע", "zeyde"),
        ("באבע", "bobe"),
        // Numbers
        ("איינס", "eyns"),
        ("צוויי", "tsvey"),
        ("דריי", "dray"),
        ("פיר", "fir"),
        ("פינף", "finf"),
        ("זעקס", "zeks"),
        ("זיבן", "zibn"),
        ("אכט", "akht"),
        ("נייַן", "nayn"),
        ("צען", "tsen"),
        // Everyday words
        ("גוט", "gut"),
        ("גרויס", "groys"),
        ("שלעכט", "shlekht"),
        ("נייַ", "nay"),
        ("אלט", "alt"),
        ("יונג", "yung"),
        ("הייס", "heys"),
        ("קאלט", "kalt"),
        ("קליין", "kleyn"),
        ("שיין", "sheyn"),
        ("הויז", "hoyz"),
        ("שטוב", "shtub"),
        ("טיש", "tish"),
        ("שטול", "shtul"),
        ("בעט", "bet"),
        ("פענצטער", "fentster"),
        ("טיר", "tir"),
        ("וואסער", "vaser"),
        ("ברויט", "broyt"),
        ("מילך", "milkh"),
        ("טשאלנט", "tshalnt"),
    ];

    let mut map = WordMap::new();
    for &(word, phonetic) in entries {
        map.insert(word, phonetic);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_match_prefers_multi_glyph_keys() {
        let map = default_character_map();
        assert_eq!(map.longest_match("דזשאַז"), Some(("דזש".len(), "dzh")));
        assert_eq!(map.longest_match("וויל"), Some(("וו".len(), "v")));
        assert_eq!(map.longest_match("ול"), Some(("ו".len(), "u")));
    }

    #[test]
    fn longest_match_returns_none_for_unknown_glyph() {
        let map = default_character_map();
        assert_eq!(map.longest_match("\u{2603}abc"), None);
        assert_eq!(map.longest_match(""), None);
    }

    #[test]
    fn insert_overwrites_and_tracks_key_length() {
        let mut map = CharacterMap::new();
        map.insert("ש", "sh");
        map.insert("ש", "s");
        assert_eq!(map.get("ש"), Some("s"));

        map.insert("שלו", "shlo");
        assert_eq!(map.longest_match("שלום"), Some(("שלו".len(), "shlo")));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn empty_character_key_is_ignored() {
        let mut map = CharacterMap::new();
        map.insert("", "x");
        assert!(map.is_empty());
    }

    #[test]
    fn word_map_is_exact_match_only() {
        let words = default_word_map();
        assert_eq!(words.get("שלום"), Some("shalum"));
        assert_eq!(words.get("שלום,"), None);
        assert_eq!(words.get("עליכם"), None);
    }

    #[test]
    fn word_map_carries_everyday_spellings() {
        let words = default_word_map();
        for (word, phonetic) in [
            ("אווענט", "ovnt"),
            ("געגאנגען", "gegangen"),
            ("ברודער", "bruder"),
            ("שוועסטער", "shvester"),
            ("שלעכט", "shlekht"),
            ("פענצטער", "fentster"),
            ("מילך", "milkh"),
            ("נייַן", "nayn"),
        ] {
            assert_eq!(words.get(word), Some(phonetic), "{word}");
        }
    }

    #[test]
    fn overrides_parse_partial_documents() {
        let overrides = MappingOverrides::from_json(r#"{"words": {"שלום": "sholem"}}"#)
            .expect("valid overrides");
        assert_eq!(overrides.words.get("שלום").map(String::as_str), Some("sholem"));
        assert!(overrides.chars.is_empty());
    }

    #[test]
    fn overrides_reject_empty_keys() {
        let err = MappingOverrides::from_json(r#"{"chars": {"": "x"}}"#).unwrap_err();
        assert!(matches!(err, TtsError::Mapping(_)));
    }

    #[test]
    fn overrides_reject_malformed_json() {
        let err = MappingOverrides::from_json("{not json").unwrap_err();
        assert!(matches!(err, TtsError::Json(_)));
    }
}
