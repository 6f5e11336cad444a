//! The Quetzal save payload as an owned value: `QuetzalSaveState` plus its
//! `Identification`, `Frame`, and `StackSnapshot` components.
//!
//! Grounded in `gruesome::quetzal::{chunks, restore, save}` collectively,
//! but unified into one value type constructed once per save/restore (see
//! SPEC_FULL.md's "Mutation vs. value semantics" design note) rather than
//! the teacher's `SaveGame`/`RestoreGame` pair that each wrap a live
//! `IffFile`.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};

use super::chunks::{decode_ifhd, decode_stks, encode_ifhd, encode_stks};
use super::compressed_memory::{compress_memory, decompress_memory};
use super::iff::{decode_form, encode_form, Chunk};

/// Story identification copied verbatim from the header at load time; used
/// to reject a restore against a different story (or release/printing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identification {
    pub release: u16,
    pub serial: [u8; 6],
    pub checksum: u16,
    pub initial_pc: u32,
}

/// One call-stack frame. `store_variable` is `None` when the frame
/// discards its routine's result (mirrors `gruesome::vm::CallFrame::
/// return_store`), rather than a special sentinel byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub return_pc: u32,
    pub locals: Vec<u16>,
    /// Index into the enclosing `StackSnapshot::eval_stack` where this
    /// frame's own evaluation-stack slots begin.
    pub eval_base: u16,
    pub store_variable: Option<u8>,
    pub argument_mask: u16,
}

/// The full Z-stack at a point in execution: one flat evaluation stack
/// shared across frames, sliced per frame via `Frame::eval_base`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSnapshot {
    pub eval_stack: Vec<i16>,
    pub frames: Vec<Frame>,
}

/// How dynamic memory is represented inside a `QuetzalSaveState`. Capturing
/// a live save always produces `Compressed` (this crate never writes
/// `UMem`); `Uncompressed` exists so a save written by another Quetzal
/// implementation with `UMem` can still be read (see §4.3's "CMem or
/// UMem, required, one").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryPayload {
    Compressed(Vec<u8>),
    Uncompressed(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuetzalSaveState {
    pub identification: Identification,
    pub compressed_memory: MemoryPayload,
    pub stack: StackSnapshot,
    pub program_counter: u32,
    pub interpreter_data: Option<Vec<u8>>,
}

impl QuetzalSaveState {
    /// Capture a save state from the CPU collaborator's current view:
    /// compresses `current` dynamic memory against `baseline` (the
    /// pristine load-time copy) and carries the stack/PC/identification
    /// through unchanged.
    pub fn capture(
        baseline: &[u8],
        current: &[u8],
        stack: StackSnapshot,
        program_counter: u32,
        identification: Identification,
        interpreter_data: Option<Vec<u8>>,
    ) -> CoreResult<Self> {
        let delta = compress_memory(baseline, current)?;
        Ok(QuetzalSaveState {
            identification,
            compressed_memory: MemoryPayload::Compressed(delta),
            stack,
            program_counter,
            interpreter_data,
        })
    }

    /// Reconstruct a dynamic memory buffer against `baseline`, the
    /// pristine copy kept by the caller since load. The CPU collaborator
    /// installs the result atomically alongside `self.stack` and
    /// `self.program_counter`.
    pub fn restore_memory(&self, baseline: &[u8]) -> CoreResult<Vec<u8>> {
        match &self.compressed_memory {
            MemoryPayload::Compressed(delta) => decompress_memory(delta, baseline),
            MemoryPayload::Uncompressed(bytes) => {
                if bytes.len() != baseline.len() {
                    Err(CoreError::QuetzalCorrupted(format!(
                        "UMem chunk is {} bytes, expected {} to match dynamic memory",
                        bytes.len(),
                        baseline.len()
                    )))
                } else {
                    Ok(bytes.clone())
                }
            }
        }
    }

    /// Reject the save as *IncompatibleSave* if its identification
    /// disagrees with the currently loaded story's.
    pub fn check_compatible(&self, current: &Identification) -> CoreResult<()> {
        if self.identification != *current {
            return Err(CoreError::IncompatibleSave(format!(
                "save is for release {} serial {:?} checksum {:#06x}, \
                 current story is release {} serial {:?} checksum {:#06x}",
                self.identification.release,
                self.identification.serial,
                self.identification.checksum,
                current.release,
                current.serial,
                current.checksum,
            )));
        }
        Ok(())
    }

    /// Encode as a complete `FORM/IFZS` byte stream: `IFhd`, `CMem`/`UMem`,
    /// `Stks`, then `IntD` if present and `config.preserve_interpreter_chunk`.
    pub fn encode(&self, config: &Config) -> CoreResult<Vec<u8>> {
        let mut chunks = vec![
            Chunk {
                tag: *b"IFhd",
                data: encode_ifhd(&self.identification),
            },
            match &self.compressed_memory {
                MemoryPayload::Compressed(bytes) => Chunk {
                    tag: *b"CMem",
                    data: bytes.clone(),
                },
                MemoryPayload::Uncompressed(bytes) => Chunk {
                    tag: *b"UMem",
                    data: bytes.clone(),
                },
            },
            Chunk {
                tag: *b"Stks",
                data: encode_stks(&self.stack)?,
            },
        ];

        if config.preserve_interpreter_chunk {
            if let Some(data) = &self.interpreter_data {
                chunks.push(Chunk {
                    tag: *b"IntD",
                    data: data.clone(),
                });
            }
        }

        let bytes = encode_form(&chunks);
        if bytes.len() as u32 > config.max_save_bytes {
            return Err(CoreError::QuetzalCorrupted(format!(
                "encoded save is {} bytes, exceeding max_save_bytes ({})",
                bytes.len(),
                config.max_save_bytes
            )));
        }

        log::info!(
            "encoded Quetzal save: {} bytes, {} frame(s)",
            bytes.len(),
            self.stack.frames.len()
        );
        Ok(bytes)
    }

    /// Parse a complete `FORM/IFZS` byte stream. Required chunks (`IFhd`,
    /// one of `CMem`/`UMem`, `Stks`) may appear in any order; unknown tags
    /// are skipped. The program counter is not carried by any chunk in
    /// the Quetzal standard (v1-3 restores resume at the `restore`
    /// instruction, not a saved PC) — it is threaded through separately
    /// by the caller rather than read back here; see DESIGN.md.
    pub fn decode(bytes: &[u8], program_counter: u32) -> CoreResult<Self> {
        let chunks = decode_form(bytes)?;

        let mut identification = None;
        let mut memory = None;
        let mut stack = None;
        let mut interpreter_data = None;

        for chunk in &chunks {
            match &chunk.tag {
                b"IFhd" if identification.is_none() => {
                    identification = Some(decode_ifhd(&chunk.data)?);
                }
                b"CMem" if memory.is_none() => {
                    memory = Some(MemoryPayload::Compressed(chunk.data.clone()));
                }
                b"UMem" if memory.is_none() => {
                    memory = Some(MemoryPayload::Uncompressed(chunk.data.clone()));
                }
                b"Stks" if stack.is_none() => {
                    stack = Some(decode_stks(&chunk.data)?);
                }
                b"IntD" if interpreter_data.is_none() => {
                    interpreter_data = Some(chunk.data.clone());
                }
                other => {
                    log::debug!("skipping Quetzal chunk {:?}", other);
                }
            }
        }

        let identification =
            identification.ok_or(CoreError::QuetzalMissingChunk("IFhd"))?;
        let compressed_memory = memory.ok_or(CoreError::QuetzalMissingChunk("CMem"))?;
        let stack = stack.ok_or(CoreError::QuetzalMissingChunk("Stks"))?;

        log::info!(
            "decoded Quetzal save: release {} serial {:?}",
            identification.release,
            identification.serial
        );

        Ok(QuetzalSaveState {
            identification,
            compressed_memory,
            stack,
            program_counter,
            interpreter_data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_identification() -> Identification {
        Identification {
            release: 3,
            serial: *b"123456",
            checksum: 0xDEAD,
            initial_pc: 0x4E37,
        }
    }

    fn sample_stack() -> StackSnapshot {
        StackSnapshot {
            eval_stack: vec![-1],
            frames: vec![Frame {
                return_pc: 0x001234,
                locals: vec![0xAABB, 0xCCDD],
                eval_base: 0,
                store_variable: Some(0x10),
                argument_mask: 0x03,
            }],
        }
    }

    /// S6: full Quetzal round-trip for a one-frame save state.
    #[test]
    fn s6_quetzal_round_trip() {
        let baseline = vec![0u8; 16];
        let current = baseline.clone();
        let config = Config::default();

        let state = QuetzalSaveState::capture(
            &baseline,
            &current,
            sample_stack(),
            0x4E37,
            sample_identification(),
            None,
        )
        .unwrap();

        let bytes = state.encode(&config).unwrap();
        let decoded = QuetzalSaveState::decode(&bytes, state.program_counter).unwrap();

        assert_eq!(decoded.identification, state.identification);
        assert_eq!(decoded.stack, state.stack);
        assert_eq!(decoded.compressed_memory, state.compressed_memory);
        assert_eq!(decoded.restore_memory(&baseline).unwrap(), current);
    }

    #[test]
    fn incompatible_identification_is_rejected() {
        let baseline = vec![0u8; 4];
        let state = QuetzalSaveState::capture(
            &baseline,
            &baseline,
            sample_stack(),
            0,
            sample_identification(),
            None,
        )
        .unwrap();

        let mut other = sample_identification();
        other.release = 4;
        assert!(matches!(
            state.check_compatible(&other),
            Err(CoreError::IncompatibleSave(_))
        ));
        assert!(state.check_compatible(&sample_identification()).is_ok());
    }

    /// §8 invariant 9: chunk order tolerance + unknown chunk skipping.
    #[test]
    fn accepts_chunks_in_any_order_and_skips_unknown() {
        let ifhd = Chunk {
            tag: *b"IFhd",
            data: encode_ifhd(&sample_identification()),
        };
        let cmem = Chunk {
            tag: *b"CMem",
            data: compress_memory(&[0u8; 4], &[0u8; 4]).unwrap(),
        };
        let stks = Chunk {
            tag: *b"Stks",
            data: encode_stks(&sample_stack()).unwrap(),
        };
        let unknown = Chunk {
            tag: *b"Zzzz",
            data: vec![1, 2, 3],
        };

        // Deliberately out of the canonical order, with an unknown chunk
        // interleaved.
        let bytes = encode_form(&[stks, unknown, ifhd, cmem]);
        let decoded = QuetzalSaveState::decode(&bytes, 0).unwrap();
        assert_eq!(decoded.identification, sample_identification());
        assert_eq!(decoded.stack, sample_stack());
    }

    #[test]
    fn missing_required_chunk_is_reported() {
        let ifhd = Chunk {
            tag: *b"IFhd",
            data: encode_ifhd(&sample_identification()),
        };
        let stks = Chunk {
            tag: *b"Stks",
            data: encode_stks(&sample_stack()).unwrap(),
        };
        let bytes = encode_form(&[ifhd, stks]); // no CMem/UMem
        assert!(matches!(
            QuetzalSaveState::decode(&bytes, 0),
            Err(CoreError::QuetzalMissingChunk("CMem"))
        ));
    }

    #[test]
    fn umem_chunk_round_trips_without_compression() {
        let baseline = vec![1u8, 2, 3, 4];
        let state = QuetzalSaveState {
            identification: sample_identification(),
            compressed_memory: MemoryPayload::Uncompressed(vec![9, 9, 9, 9]),
            stack: sample_stack(),
            program_counter: 0,
            interpreter_data: None,
        };
        assert_eq!(
            state.restore_memory(&baseline).unwrap(),
            vec![9, 9, 9, 9]
        );
    }

    #[test]
    fn interpreter_chunk_round_trips_when_preserved() {
        let config = Config::default();
        let baseline = vec![0u8; 4];
        let state = QuetzalSaveState::capture(
            &baseline,
            &baseline,
            sample_stack(),
            0,
            sample_identification(),
            Some(vec![b'R', b'U', b'S', b'T']),
        )
        .unwrap();
        let bytes = state.encode(&config).unwrap();
        let decoded = QuetzalSaveState::decode(&bytes, 0).unwrap();
        assert_eq!(decoded.interpreter_data, Some(vec![b'R', b'U', b'S', b'T']));
    }

    #[test]
    fn interpreter_chunk_dropped_when_not_preserved() {
        let mut config = Config::default();
        config.preserve_interpreter_chunk = false;
        let baseline = vec![0u8; 4];
        let state = QuetzalSaveState::capture(
            &baseline,
            &baseline,
            sample_stack(),
            0,
            sample_identification(),
            Some(vec![1, 2, 3]),
        )
        .unwrap();
        let bytes = state.encode(&config).unwrap();
        let decoded = QuetzalSaveState::decode(&bytes, 0).unwrap();
        assert_eq!(decoded.interpreter_data, None);
    }

    #[test]
    fn oversized_save_is_rejected() {
        let mut config = Config::default();
        config.max_save_bytes = 8;
        let baseline = vec![0u8; 4];
        let state = QuetzalSaveState::capture(
            &baseline,
            &baseline,
            sample_stack(),
            0,
            sample_identification(),
            None,
        )
        .unwrap();
        assert!(matches!(
            state.encode(&config),
            Err(CoreError::QuetzalCorrupted(_))
        ));
    }
}
