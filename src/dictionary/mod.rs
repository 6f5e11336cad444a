//! The compressed word dictionary used to tokenize player input.
//!
//! Grounded in `gruesome::dictionary`'s header-parsing logic (separator
//! count, entry length, entry count, then fixed-size entries) but reworked
//! from "binary search over the live story-file buffer on every lookup"
//! into a one-time load into an owned, immutable `IndexMap` keyed by the
//! encoded word — `IndexMap` is already part of the teacher's dependency
//! stack (`grue_compiler::object_system` uses it for the same
//! insertion-ordered, O(1)-lookup role).

use crate::error::{CoreError, CoreResult};
use crate::text;
use crate::util::read_be16;
use crate::version::ZVersion;
use indexmap::IndexMap;

/// One immutable dictionary entry: its encoded word, its absolute
/// story-file address (what the tokenizer writes into the parse buffer),
/// and whatever trailing metadata bytes follow the word in its slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub encoded_word: Vec<u8>,
    pub address: u32,
    pub metadata: Vec<u8>,
}

#[derive(Debug)]
pub struct Dictionary {
    version: ZVersion,
    entries: IndexMap<Vec<u8>, DictionaryEntry>,
    separators: Vec<u8>,
    entry_length: u8,
    base_address: u32,
}

impl Dictionary {
    /// Load the dictionary region starting at the absolute story-file
    /// address `base_address`.
    pub fn load(bytes: &[u8], version: ZVersion, base_address: u32) -> CoreResult<Self> {
        let base = base_address as usize;

        let sep_count = *bytes
            .get(base)
            .ok_or_else(|| CoreError::CorruptStory("truncated dictionary header".into()))?
            as usize;

        let sep_start = base + 1;
        let separators = bytes
            .get(sep_start..sep_start + sep_count)
            .ok_or_else(|| CoreError::CorruptStory("truncated separator list".into()))?
            .to_vec();

        let entry_length_off = sep_start + sep_count;
        let entry_length = *bytes
            .get(entry_length_off)
            .ok_or_else(|| CoreError::CorruptStory("truncated dictionary header".into()))?;

        let entry_count = read_be16(bytes, entry_length_off + 1)?;

        let word_bytes = version.dictionary_word_bytes();
        if (entry_length as usize) < word_bytes {
            return Err(CoreError::CorruptStory(format!(
                "dictionary entry length {entry_length} too small for {word_bytes}-byte words"
            )));
        }

        let header_size = 1 + sep_count + 1 + 2;
        let entries_start = entry_length_off + 3;

        let mut entries = IndexMap::with_capacity(entry_count as usize);
        for i in 0..entry_count as usize {
            let entry_off = entries_start + i * entry_length as usize;
            let encoded = bytes
                .get(entry_off..entry_off + word_bytes)
                .ok_or_else(|| CoreError::CorruptStory(format!("truncated dictionary entry {i}")))?
                .to_vec();
            let metadata = bytes
                .get(entry_off + word_bytes..entry_off + entry_length as usize)
                .ok_or_else(|| CoreError::CorruptStory(format!("truncated dictionary entry {i}")))?
                .to_vec();
            let address = base_address + header_size as u32 + (i as u32) * entry_length as u32;

            entries.insert(
                encoded.clone(),
                DictionaryEntry {
                    encoded_word: encoded,
                    address,
                    metadata,
                },
            );
        }

        log::info!(
            "loaded dictionary: {} entries, {} separators, entry_length={}",
            entries.len(),
            separators.len(),
            entry_length
        );

        Ok(Dictionary {
            version,
            entries,
            separators,
            entry_length,
            base_address,
        })
    }

    /// Encode `word` and look it up. Case-insensitive by construction,
    /// since encoding always lowercases first.
    pub fn lookup(&self, word: &str) -> Option<&DictionaryEntry> {
        let encoded = text::encode_word(word, self.version);
        self.entries.get(&encoded)
    }

    pub fn is_separator(&self, byte: u8) -> bool {
        self.separators.contains(&byte)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entry_length(&self) -> u8 {
        self.entry_length
    }

    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    pub fn separators(&self) -> &[u8] {
        &self.separators
    }

    /// Read-only iteration over all entries, in load (story-file) order.
    pub fn iter(&self) -> impl Iterator<Item = &DictionaryEntry> {
        self.entries.values()
    }
}
