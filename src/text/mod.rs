//! Z-character alphabet encoding used to build dictionary lookup keys.
//!
//! The story file's text compression scheme packs three 5-bit Z-characters
//! per 16-bit word across three alphabets (A0 lowercase, A1 uppercase, A2
//! punctuation/digits). Decoding property short names and printed strings
//! is the text-rendering subsystem's job and out of scope here (spec
//! Non-goals); what this module owns is the one direction the dictionary
//! needs — encoding a query word into the same packed form the story file
//! uses for its dictionary entries — grounded in the alphabet tables and
//! bit-packing `gruesome::text::decode_string` and
//! `gruesome::dictionary::encode_word_v3`/`encode_word_v4_plus` already use,
//! generalized to the full three-alphabet, ZSCII-escape form the spec
//! describes.

use crate::error::CoreResult;
use crate::version::ZVersion;
use bitreader::BitReader;
use std::collections::HashMap;

pub const ALPHABET_A0: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

/// A1 (uppercase), reachable only via the shift-4 escape. Text is
/// lowercased before encoding (see `zchars_for`), so the encode direction
/// built here never emits that shift — kept as a `pub` table (rather than a
/// dead shift constant) since it is still part of the on-disk alphabet a
/// decoder would need.
pub const ALPHABET_A1: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A2, in z-char order starting at z-char 7 (z-char 6 is the ZSCII-escape
/// trigger, not a table entry).
pub const ALPHABET_A2: &[u8; 25] = b"\n0123456789.,!?_#'\"/\\-:()";

lazy_static::lazy_static! {
    /// A2 byte -> its z-char value (7..31), built once. Mirrors
    /// `gruesome::util::ALPHABETMAP`'s role as a precomputed alphabet
    /// lookup, specialized here to the direction the encoder needs.
    static ref A2_ZCHAR: HashMap<u8, u8> = ALPHABET_A2
        .iter()
        .enumerate()
        .map(|(i, &b)| (b, i as u8 + 7))
        .collect();
}

const SHIFT_A2: u8 = 5;
const ZSCII_ESCAPE: u8 = 6;
const PAD_ZCHAR: u8 = 5;

/// Encode `word` into its packed dictionary form for the given story
/// version: 4 bytes (v1-3, 6 z-chars) or 6 bytes (v4+, 9 z-chars).
pub fn encode_word(word: &str, version: ZVersion) -> Vec<u8> {
    let want = version.dictionary_zchar_count();
    let mut zchars = zchars_for(word);
    zchars.truncate(want);
    while zchars.len() < want {
        zchars.push(PAD_ZCHAR);
    }
    pack_zchars(&zchars)
}

/// Lower the input and map each character to its z-char sequence: a single
/// z-char for A0, a shift + z-char for A2, or a 4-z-char ZSCII escape for
/// anything else.
fn zchars_for(word: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(word.len());
    for raw in word.chars() {
        let ch = raw.to_ascii_lowercase();
        if ch == ' ' {
            out.push(0);
        } else if ch.is_ascii_lowercase() {
            out.push((ch as u8 - b'a') + 6);
        } else if ch.is_ascii() && A2_ZCHAR.contains_key(&(ch as u8)) {
            out.push(SHIFT_A2);
            out.push(A2_ZCHAR[&(ch as u8)]);
        } else {
            let zscii = zscii_of(ch);
            out.push(SHIFT_A2);
            out.push(ZSCII_ESCAPE);
            out.push(((zscii >> 5) & 0x1F) as u8);
            out.push((zscii & 0x1F) as u8);
        }
    }
    out
}

/// ZSCII is roughly a superset of ASCII; non-ASCII input is clamped to '?'
/// rather than silently truncated, since the escape only carries 10 bits.
fn zscii_of(ch: char) -> u16 {
    if (ch as u32) <= 0x3FF {
        ch as u16
    } else {
        b'?' as u16
    }
}

/// Pack a z-char stream (length a multiple of 3) into big-endian 16-bit
/// words, three z-chars per word, with bit 15 set on the final word only.
fn pack_zchars(zchars: &[u8]) -> Vec<u8> {
    debug_assert_eq!(zchars.len() % 3, 0, "z-char stream must pad to a multiple of 3");
    let n_words = zchars.len() / 3;
    let mut out = Vec::with_capacity(n_words * 2);
    for (i, chunk) in zchars.chunks(3).enumerate() {
        let mut word = ((chunk[0] as u16) << 10) | ((chunk[1] as u16) << 5) | (chunk[2] as u16);
        if i == n_words - 1 {
            word |= 0x8000;
        }
        out.extend_from_slice(&word.to_be_bytes());
    }
    out
}

/// Unpack one big-endian 16-bit word into its stop bit and three z-chars,
/// mirroring `gruesome::util::read_zchars_from_word`'s bit layout and its
/// `?`-propagated `Result`, rather than unwrapping. Exposed for tests and
/// for callers that want to sanity-check a packed entry.
pub fn unpack_word(word: &[u8; 2]) -> CoreResult<(bool, [u8; 3])> {
    let mut br = BitReader::new(word);
    let is_last = br.read_u8(1)? == 1;
    let chars = [br.read_u8(5)?, br.read_u8(5)?, br.read_u8(5)?];
    Ok((is_last, chars))
}
