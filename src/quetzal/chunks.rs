//! Encode/decode for the individual Quetzal chunk payloads: `IFhd` and
//! `Stks`. `CMem`/`UMem` are handled by `compressed_memory` and `IntD` is
//! opaque pass-through data, so neither needs a dedicated codec here.
//!
//! Grounded in `gruesome::quetzal::chunks::{IFhdChunk, StksChunk}`, with
//! `Frame::store_variable` modeled as `Option<u8>` the way the teacher's
//! own `CallFrame::return_store` already does (`None` = discard result),
//! rather than a sentinel byte.

use crate::error::{CoreError, CoreResult};
use crate::util::{read_be16, read_be24, write_be24};

use super::state::{Frame, Identification, StackSnapshot};

pub const IFHD_LEN: usize = 13;

pub fn encode_ifhd(id: &Identification) -> Vec<u8> {
    let mut out = Vec::with_capacity(IFHD_LEN);
    out.extend_from_slice(&id.release.to_be_bytes());
    out.extend_from_slice(&id.serial);
    out.extend_from_slice(&id.checksum.to_be_bytes());
    out.extend_from_slice(&write_be24(id.initial_pc));
    out
}

pub fn decode_ifhd(data: &[u8]) -> CoreResult<Identification> {
    if data.len() < IFHD_LEN {
        return Err(CoreError::QuetzalCorrupted(format!(
            "IFhd chunk is {} bytes, expected {IFHD_LEN}",
            data.len()
        )));
    }
    let release = read_be16(data, 0)?;
    let mut serial = [0u8; 6];
    serial.copy_from_slice(&data[2..8]);
    let checksum = read_be16(data, 8)?;
    let initial_pc = read_be24(data, 10)?;
    Ok(Identification {
        release,
        serial,
        checksum,
        initial_pc,
    })
}

/// Number of evaluation-stack entries belonging to `frames[i]`: the gap
/// between its `eval_base` and the next frame's (or the end of the flat
/// `eval_stack` for the topmost frame).
fn eval_count_for_frame(stack: &StackSnapshot, i: usize) -> usize {
    let base = stack.frames[i].eval_base as usize;
    let end = stack
        .frames
        .get(i + 1)
        .map(|f| f.eval_base as usize)
        .unwrap_or(stack.eval_stack.len());
    end.saturating_sub(base)
}

/// Encode frames bottom-up as the spec's `Stks` layout: return_pc(u24),
/// flags(u8), store_variable(u8), argument_mask(u8), eval_stack_size(u16),
/// locals(u16 x n), eval entries (i16 x m).
pub fn encode_stks(stack: &StackSnapshot) -> CoreResult<Vec<u8>> {
    let mut out = Vec::new();
    for (i, frame) in stack.frames.iter().enumerate() {
        let local_count = frame.locals.len();
        if local_count > 15 {
            return Err(CoreError::QuetzalCorrupted(format!(
                "frame {i} has {local_count} locals, maximum is 15"
            )));
        }

        out.extend_from_slice(&write_be24(frame.return_pc));

        let mut flags = local_count as u8;
        if frame.store_variable.is_none() {
            flags |= 0x10;
        }
        out.push(flags);
        out.push(frame.store_variable.unwrap_or(0));
        out.push((frame.argument_mask & 0xFF) as u8);

        let eval_count = eval_count_for_frame(stack, i);
        out.extend_from_slice(&(eval_count as u16).to_be_bytes());

        for &local in &frame.locals {
            out.extend_from_slice(&local.to_be_bytes());
        }

        let base = frame.eval_base as usize;
        for &value in &stack.eval_stack[base..base + eval_count] {
            out.extend_from_slice(&(value as u16).to_be_bytes());
        }
    }
    Ok(out)
}

/// Decode the `Stks` chunk into a flat `eval_stack` (frames' entries
/// concatenated in bottom-up order) plus per-frame metadata, with each
/// frame's `eval_base` set to its offset into that flat vector.
pub fn decode_stks(data: &[u8]) -> CoreResult<StackSnapshot> {
    let mut frames = Vec::new();
    let mut eval_stack = Vec::new();
    let mut pos = 0usize;

    while pos < data.len() {
        let return_pc = read_be24(data, pos)?;
        pos += 3;

        let flags = *data
            .get(pos)
            .ok_or_else(|| CoreError::QuetzalCorrupted("truncated Stks frame flags".into()))?;
        pos += 1;
        let local_count = (flags & 0x0F) as usize;
        let discards_result = flags & 0x10 != 0;

        let store_byte = *data
            .get(pos)
            .ok_or_else(|| CoreError::QuetzalCorrupted("truncated Stks store variable".into()))?;
        pos += 1;
        let store_variable = if discards_result {
            None
        } else {
            Some(store_byte)
        };

        let arg_byte = *data
            .get(pos)
            .ok_or_else(|| CoreError::QuetzalCorrupted("truncated Stks argument mask".into()))?;
        pos += 1;
        let argument_mask = arg_byte as u16;

        let eval_count = read_be16(data, pos)? as usize;
        pos += 2;

        let mut locals = Vec::with_capacity(local_count);
        for _ in 0..local_count {
            locals.push(read_be16(data, pos)?);
            pos += 2;
        }

        let eval_base = eval_stack.len() as u16;
        for _ in 0..eval_count {
            let raw = read_be16(data, pos)?;
            eval_stack.push(raw as i16);
            pos += 2;
        }

        frames.push(Frame {
            return_pc,
            locals,
            eval_base,
            store_variable,
            argument_mask,
        });
    }

    Ok(StackSnapshot { eval_stack, frames })
}
