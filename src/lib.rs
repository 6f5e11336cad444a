//! Static-data and persistence core of a Z-Machine interpreter.
//!
//! Three independent, composable components:
//!
//!   - [`objects::ObjectTable`] — the object tree: attribute bitfields,
//!     parent/child/sibling links, variable-length property lists.
//!   - [`dictionary::Dictionary`] — the compressed word table used to
//!     tokenize player input.
//!   - [`quetzal`] — the IFF `FORM/IFZS` save format: XOR-delta memory
//!     compression and call/evaluation stack serialization.
//!
//! Instruction execution, text rendering, the screen model, and
//! networked/user-facing save-file management are out of scope; this
//! crate specifies only the contracts those collaborators consume
//! (`get_attribute`, `lookup`, `write_save`, `apply_delta`) and produce
//! (dynamic memory, stack snapshots, property numbers).
//!
//! Grounded in `gruesome` (see TEACHER.txt), reshaped from a VM-coupled
//! interpreter into three standalone loaders with pure query/mutation
//! surfaces over caller-supplied byte buffers — no file I/O, no
//! execution, no rendering.

pub mod config;
pub mod dictionary;
pub mod error;
pub mod objects;
pub mod quetzal;
pub mod text;
pub mod util;
pub mod version;

pub use config::Config;
pub use dictionary::{Dictionary, DictionaryEntry};
pub use error::{CoreError, CoreResult};
pub use objects::{ObjectEntry, ObjectNumber, ObjectTable, PropertyValue};
pub use quetzal::{
    apply_delta, compute_delta, read_save, write_save, Frame, Identification, MemoryPayload,
    QuetzalSaveState, StackSnapshot,
};
pub use version::ZVersion;
