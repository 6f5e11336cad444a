//! Story-file version dispatch.
//!
//! Rather than per-version subtypes, every component carries a `ZVersion`
//! and branches at the handful of points where the on-disk layout differs
//! (attribute byte count, object-record width, property-header encoding,
//! dictionary word length). This keeps the query surface monomorphic; see
//! `gruesome::zobject_v3`/`zobject_v4` for the two concrete layouts this
//! enum generalizes over.

/// A Z-Machine story-file version, 1..8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZVersion(u8);

impl ZVersion {
    /// Build a `ZVersion` from the raw header byte. Values outside 1..8 are
    /// clamped to the nearest bound; callers performing strict story
    /// validation should reject out-of-range bytes before calling this.
    pub fn new(raw: u8) -> Self {
        ZVersion(raw.clamp(1, 8))
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    /// The only distinction the object/dictionary/Quetzal contracts care
    /// about: pre-v4 vs v4-and-later layouts.
    pub fn is_pre_v4(self) -> bool {
        self.0 < 4
    }

    /// Attribute count per object: 32 (v1-3) or 48 (v4+).
    pub fn max_attribute(self) -> u16 {
        if self.is_pre_v4() {
            31
        } else {
            47
        }
    }

    /// Highest legal property number: 31 (v1-3) or 63 (v4+).
    pub fn max_property(self) -> u16 {
        if self.is_pre_v4() {
            31
        } else {
            63
        }
    }

    /// Bytes of attribute bitfield per object record: 4 (v1-3) or 6 (v4+).
    pub fn attribute_bytes(self) -> usize {
        if self.is_pre_v4() {
            4
        } else {
            6
        }
    }

    /// Bytes used to store an object number (parent/sibling/child/
    /// property-table address) within an object record: 1 (v1-3) or 2
    /// (v4+).
    pub fn object_number_bytes(self) -> usize {
        if self.is_pre_v4() {
            1
        } else {
            2
        }
    }

    /// Total size in bytes of one object record: attribute bytes, three
    /// links (parent/sibling/child) sized by `object_number_bytes`, and a
    /// property-table address that is always 2 bytes regardless of
    /// version.
    pub fn object_entry_size(self) -> usize {
        self.attribute_bytes() + 3 * self.object_number_bytes() + 2
    }

    /// Maximum legal object number: 255 (v1-3) or 65535 (v4+).
    pub fn max_object_number(self) -> u16 {
        if self.is_pre_v4() {
            255
        } else {
            u16::MAX
        }
    }

    /// Z-characters per dictionary-encoded word before packing: 6 (v1-3)
    /// or 9 (v4+).
    pub fn dictionary_zchar_count(self) -> usize {
        if self.is_pre_v4() {
            6
        } else {
            9
        }
    }

    /// Bytes of an encoded dictionary word: 4 (v1-3) or 6 (v4+).
    pub fn dictionary_word_bytes(self) -> usize {
        self.dictionary_zchar_count() / 3 * 2
    }
}

impl From<u8> for ZVersion {
    fn from(raw: u8) -> Self {
        ZVersion::new(raw)
    }
}
