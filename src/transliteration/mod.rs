//! Hebrew-script Yiddish to Latin phonetic transliteration.
//!
//! The built-in tables live in [`table`]; [`Transliterator`] owns one copy of
//! them and applies word-level lookups before longest-match-first character
//! decomposition.

pub mod table;
pub mod transliterator;

pub use table::{CharacterMap, MappingOverrides, WordMap};
pub use transliterator::{is_hebrew_script, Transliterator};
