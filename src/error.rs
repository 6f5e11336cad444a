//! Error types for the object tree, dictionary, and Quetzal subsystems.
//!
//! One enum for all three components, in the style of
//! `grue_compiler::error::CompilerError`: plain data-carrying variants, a
//! hand-written `Display`, and a blanket `std::error::Error` impl. No
//! `thiserror` — callers match on variants directly.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Structural violation while loading a story-file region: truncation,
    /// an invalid property number, an out-of-range property-table address,
    /// or a cycle discovered while walking the object tree.
    CorruptStory(String),

    /// A mutator referenced a non-existent, non-zero object number.
    InvalidObject(u16),

    /// A mutator referenced a property number the object does not carry
    /// (`set_property`) or that is out of range for the story's version.
    InvalidProperty(u16, u16), // (object, property)

    /// A mutator referenced an attribute number out of range for the
    /// story's version.
    AttrOutOfRange(u16),

    /// The Quetzal container is not a well-formed IFF `FORM`/`IFZS`
    /// structure (bad tag, bad length, wrong form type).
    QuetzalInvalidFormat(String),

    /// A required Quetzal chunk (`IFhd`, `CMem`/`UMem`, `Stks`) is absent.
    QuetzalMissingChunk(&'static str),

    /// A present Quetzal chunk failed to parse internally (bad frame
    /// count, an XOR-delta run that overruns the memory buffer, etc.).
    QuetzalCorrupted(String),

    /// The save's `IFhd` identification does not match the currently
    /// loaded story.
    IncompatibleSave(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::CorruptStory(msg) => write!(f, "corrupt story file: {msg}"),
            CoreError::InvalidObject(obj) => write!(f, "invalid object number: {obj}"),
            CoreError::InvalidProperty(obj, prop) => {
                write!(f, "object {obj} has no property {prop}")
            }
            CoreError::AttrOutOfRange(attr) => write!(f, "attribute {attr} out of range"),
            CoreError::QuetzalInvalidFormat(msg) => write!(f, "invalid Quetzal container: {msg}"),
            CoreError::QuetzalMissingChunk(tag) => write!(f, "missing required chunk '{tag}'"),
            CoreError::QuetzalCorrupted(msg) => write!(f, "corrupted Quetzal chunk: {msg}"),
            CoreError::IncompatibleSave(msg) => write!(f, "save is incompatible: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

/// Lets bit-level readers (e.g. `text::unpack_word`) propagate a
/// `BitReaderError` with `?` instead of unwrapping, the way
/// `gruesome::util::read_zchars_from_word` propagates the same error type
/// through its own `Result`.
impl From<bitreader::BitReaderError> for CoreError {
    fn from(err: bitreader::BitReaderError) -> Self {
        CoreError::CorruptStory(format!("bit-level read failed: {err}"))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
