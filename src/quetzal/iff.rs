//! IFF `FORM` container encode/decode.
//!
//! Grounded in `gruesome::quetzal::iff::IffFile`, but narrowed from a
//! file-reading/writing type into a pure in-memory codec over `&[u8]`/
//! `Vec<u8>` — this crate has no file I/O (see SPEC_FULL.md §6): the
//! caller owns the save bytes and hands them to us whole.

use crate::error::{CoreError, CoreResult};

pub const FORM_TAG: [u8; 4] = *b"FORM";
pub const FORM_TYPE: [u8; 4] = *b"IFZS";

/// One IFF chunk: a 4-character tag and its raw data (unpadded; padding to
/// even length is an encode/decode-time concern, not stored here).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub tag: [u8; 4],
    pub data: Vec<u8>,
}

/// Build a complete `FORM/IFZS` byte stream from an ordered list of chunks.
pub fn encode_form(chunks: &[Chunk]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(&FORM_TYPE);
    for chunk in chunks {
        body.extend_from_slice(&chunk.tag);
        body.extend_from_slice(&(chunk.data.len() as u32).to_be_bytes());
        body.extend_from_slice(&chunk.data);
        if chunk.data.len() % 2 == 1 {
            body.push(0);
        }
    }

    let mut out = Vec::with_capacity(8 + body.len());
    out.extend_from_slice(&FORM_TAG);
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

/// Parse a `FORM/IFZS` byte stream into its chunks, in file order. Unknown
/// chunk tags are returned like any other — it is the caller's job (see
/// `QuetzalSaveState::decode`) to skip tags it doesn't recognize.
pub fn decode_form(bytes: &[u8]) -> CoreResult<Vec<Chunk>> {
    if bytes.len() < 12 {
        return Err(CoreError::QuetzalInvalidFormat(
            "too short to contain a FORM header".into(),
        ));
    }
    if bytes[0..4] != FORM_TAG {
        return Err(CoreError::QuetzalInvalidFormat(format!(
            "missing FORM tag (found {:?})",
            &bytes[0..4]
        )));
    }
    if bytes[8..12] != FORM_TYPE {
        return Err(CoreError::QuetzalInvalidFormat(format!(
            "wrong FORM type (found {:?}, expected IFZS)",
            &bytes[8..12]
        )));
    }

    let mut chunks = Vec::new();
    let mut pos = 12usize;
    while pos + 8 <= bytes.len() {
        let tag = [bytes[pos], bytes[pos + 1], bytes[pos + 2], bytes[pos + 3]];
        let len = u32::from_be_bytes([
            bytes[pos + 4],
            bytes[pos + 5],
            bytes[pos + 6],
            bytes[pos + 7],
        ]) as usize;
        pos += 8;

        let data = bytes
            .get(pos..pos + len)
            .ok_or_else(|| {
                CoreError::QuetzalInvalidFormat(format!(
                    "chunk {:?} claims {len} bytes but only {} remain",
                    tag,
                    bytes.len().saturating_sub(pos)
                ))
            })?
            .to_vec();
        pos += len;
        if len % 2 == 1 {
            pos += 1;
        }

        chunks.push(Chunk { tag, data });
    }

    Ok(chunks)
}
