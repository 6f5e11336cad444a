//! The Quetzal save system: IFF `FORM/IFZS` container, XOR-delta memory
//! compression, and call/evaluation stack serialization.
//!
//! Grounded in `gruesome::quetzal` (`iff`, `chunks`, `compressed_memory`,
//! `save`, `restore`), reshaped around one owned value type,
//! `QuetzalSaveState`, rather than the teacher's `SaveGame`/`RestoreGame`
//! pair that each hold a live `IffFile` and read/write it to disk
//! directly — see SPEC_FULL.md §6's "in-process interfaces only" note.

pub mod chunks;
pub mod compressed_memory;
pub mod iff;
pub mod state;

pub use state::{Frame, Identification, MemoryPayload, QuetzalSaveState, StackSnapshot};

use crate::config::Config;
use crate::error::CoreResult;

/// Alias for `QuetzalSaveState::encode`, named after the contract spec.md
/// §1 names explicitly (`write_save`).
pub fn write_save(state: &QuetzalSaveState, config: &Config) -> CoreResult<Vec<u8>> {
    state.encode(config)
}

/// Alias for `QuetzalSaveState::decode`.
pub fn read_save(bytes: &[u8], program_counter: u32) -> CoreResult<QuetzalSaveState> {
    QuetzalSaveState::decode(bytes, program_counter)
}

/// Alias for `compressed_memory::decompress_memory`, named after the
/// contract spec.md §1 names explicitly (`apply_delta`).
pub fn apply_delta(compressed: &[u8], baseline: &[u8]) -> CoreResult<Vec<u8>> {
    compressed_memory::decompress_memory(compressed, baseline)
}

/// Alias for `compressed_memory::compress_memory` — the inverse of
/// `apply_delta`, used when capturing a save.
pub fn compute_delta(baseline: &[u8], current: &[u8]) -> CoreResult<Vec<u8>> {
    compressed_memory::compress_memory(baseline, current)
}
