//! The object tree: a packed byte table of attribute bitfields,
//! parent/child/sibling links, and variable-length property lists.
//!
//! Grounded in `gruesome::zobject_v3::ObjectSystemV3` for the per-version
//! record layout and bit arithmetic, but reshaped from "mutate the live VM
//! memory buffer in place on every call" into "parse once into an owned
//! `Vec<ObjectEntry>`, then answer queries against that" — the component
//! boundary this spec draws (`ObjectTable` as a standalone loader with a
//! pure query surface) rather than the teacher's VM-coupled trait.

use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::util::read_be16;
use crate::version::ZVersion;
use indexmap::IndexMap;

pub type ObjectNumber = u16;

/// A property's raw byte value together with the absolute story-file
/// address of its data, so `get_property_address` can answer without a
/// second pass over the property table (mirrors
/// `gruesome::zobject_v3::get_object_property_addr_v3`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyValue {
    pub data: Vec<u8>,
    pub address: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Raw attribute bitfield: 4 bytes (v1-3) or 6 bytes (v4+). Bit *k*
    /// (numbered from the MSB of byte 0) is attribute *k*.
    pub attributes: Vec<u8>,
    pub parent: ObjectNumber,
    pub sibling: ObjectNumber,
    pub child: ObjectNumber,
    /// Offset of the property block, normalized relative to the static
    /// memory base passed to `load` (0 = no property table). See
    /// `ObjectTable::load` for why this is relative rather than absolute.
    pub property_table_addr: u32,
    /// Property number -> value, stored and iterated in strictly
    /// descending property-number order (first match wins on lookup).
    pub properties: IndexMap<u16, PropertyValue>,
    /// Opaque encoded short-name text at the head of the property table;
    /// rendering it is the text subsystem's job, out of scope here.
    pub short_name: Vec<u8>,
}

#[derive(Debug)]
pub struct ObjectTable {
    version: ZVersion,
    objects: Vec<ObjectEntry>,
    /// Index 1..=63 used (0 unused); only 1..=31 populated per the load
    /// algorithm, which always reads exactly 31 default words regardless
    /// of version.
    property_defaults: [u16; 64],
}

impl ObjectTable {
    /// Load the property-defaults table and object records starting at
    /// `table_offset` (an absolute offset into `bytes`).
    ///
    /// `static_base` is the absolute address where static memory begins.
    /// Each record's property-table address is an absolute story-file
    /// address; it is normalized here by subtracting `static_base` before
    /// being stored on `ObjectEntry`, and `static_base` is added back when
    /// this loader itself needs to re-locate the property bytes within
    /// `bytes`. An absolute address below `static_base` is treated as "no
    /// properties" (stored as 0), per spec.
    pub fn load(
        bytes: &[u8],
        version: ZVersion,
        table_offset: u32,
        static_base: u32,
    ) -> CoreResult<Self> {
        Self::load_with_config(bytes, version, table_offset, static_base, &Config::default())
    }

    /// Like `load`, but honors `config.strict_story_validation`: when
    /// `false`, a final object record truncated by the end of `bytes` is
    /// zero-padded and treated as the table terminator instead of raising
    /// `CorruptStory`.
    pub fn load_with_config(
        bytes: &[u8],
        version: ZVersion,
        table_offset: u32,
        static_base: u32,
        config: &Config,
    ) -> CoreResult<Self> {
        let base = table_offset as usize;

        let mut property_defaults = [0u16; 64];
        for i in 0..31usize {
            property_defaults[i + 1] = read_be16(bytes, base + i * 2)?;
        }

        let records_base = base + 31 * 2;
        let entry_size = version.object_entry_size();

        let mut objects = Vec::new();
        let mut offset = records_base;
        loop {
            let record = match bytes.get(offset..offset + entry_size) {
                Some(record) => record.to_vec(),
                None if !config.strict_story_validation => {
                    log::warn!(
                        "object record at offset {offset:#x} truncated by end of story; \
                         zero-padding and stopping (strict_story_validation = false)"
                    );
                    break;
                }
                None => {
                    return Err(CoreError::CorruptStory(format!(
                        "truncated object record at offset {offset:#x}"
                    )))
                }
            };

            if record.iter().all(|&b| b == 0) {
                break;
            }

            let entry = parse_object_record(&record, version, bytes, static_base)?;
            objects.push(entry);
            offset += entry_size;
        }

        log::info!(
            "loaded object table: {} objects ({:?})",
            objects.len(),
            version
        );

        Ok(ObjectTable {
            version,
            objects,
            property_defaults,
        })
    }

    fn entry(&self, obj: ObjectNumber) -> Option<&ObjectEntry> {
        if obj == 0 {
            None
        } else {
            self.objects.get(obj as usize - 1)
        }
    }

    fn entry_mut(&mut self, obj: ObjectNumber) -> Option<&mut ObjectEntry> {
        if obj == 0 {
            None
        } else {
            self.objects.get_mut(obj as usize - 1)
        }
    }

    fn require_exists(&self, obj: ObjectNumber) -> CoreResult<()> {
        if obj != 0 && self.entry(obj).is_none() {
            Err(CoreError::InvalidObject(obj))
        } else {
            Ok(())
        }
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn get_entry(&self, obj: ObjectNumber) -> Option<&ObjectEntry> {
        self.entry(obj)
    }

    pub fn get_attribute(&self, obj: ObjectNumber, attr: u16) -> bool {
        if attr > self.version.max_attribute() {
            return false;
        }
        let Some(entry) = self.entry(obj) else {
            return false;
        };
        let byte_idx = (attr / 8) as usize;
        let bit_mask = 0x80u8 >> (attr % 8);
        entry
            .attributes
            .get(byte_idx)
            .map(|b| b & bit_mask != 0)
            .unwrap_or(false)
    }

    pub fn set_attribute(&mut self, obj: ObjectNumber, attr: u16, value: bool) -> CoreResult<()> {
        if attr > self.version.max_attribute() {
            return Err(CoreError::AttrOutOfRange(attr));
        }
        let entry = self
            .entry_mut(obj)
            .ok_or(CoreError::InvalidObject(obj))?;
        let byte_idx = (attr / 8) as usize;
        let bit_mask = 0x80u8 >> (attr % 8);
        let byte = entry
            .attributes
            .get_mut(byte_idx)
            .ok_or(CoreError::AttrOutOfRange(attr))?;
        if value {
            *byte |= bit_mask;
        } else {
            *byte &= !bit_mask;
        }
        Ok(())
    }

    pub fn get_property(&self, obj: ObjectNumber, prop: u16) -> u16 {
        if let Some(entry) = self.entry(obj) {
            if let Some(value) = entry.properties.get(&prop) {
                return decode_property_value(&value.data);
            }
        }
        self.property_defaults.get(prop as usize).copied().unwrap_or(0)
    }

    pub fn set_property(&mut self, obj: ObjectNumber, prop: u16, value: u16) -> CoreResult<()> {
        let entry = self
            .entry_mut(obj)
            .ok_or(CoreError::InvalidObject(obj))?;
        let stored = entry
            .properties
            .get_mut(&prop)
            .ok_or(CoreError::InvalidProperty(obj, prop))?;
        match stored.data.len() {
            1 => stored.data[0] = value as u8,
            _ => {
                let be = value.to_be_bytes();
                stored.data[0] = be[0];
                if stored.data.len() > 1 {
                    stored.data[1] = be[1];
                }
            }
        }
        Ok(())
    }

    /// Byte address of `prop`'s data on `obj`, or 0 if absent (standard
    /// companion to `get_property`/`set_property` for a `get_prop_addr`
    /// opcode; see SPEC_FULL.md's supplemented-features note).
    pub fn get_property_address(&self, obj: ObjectNumber, prop: u16) -> u16 {
        self.entry(obj)
            .and_then(|e| e.properties.get(&prop))
            .map(|v| v.address as u16)
            .unwrap_or(0)
    }

    /// The property number immediately after `prop` in descending order,
    /// or the first (highest) property number if `prop == 0`, or 0 if
    /// there is none.
    pub fn get_next_property(&self, obj: ObjectNumber, prop: u16) -> u16 {
        let Some(entry) = self.entry(obj) else {
            return 0;
        };
        if prop == 0 {
            return entry.properties.keys().next().copied().unwrap_or(0);
        }
        let mut iter = entry.properties.keys();
        for key in iter.by_ref() {
            if *key == prop {
                return iter.next().copied().unwrap_or(0);
            }
        }
        0
    }

    pub fn get_parent(&self, obj: ObjectNumber) -> ObjectNumber {
        self.entry(obj).map(|e| e.parent).unwrap_or(0)
    }

    pub fn get_sibling(&self, obj: ObjectNumber) -> ObjectNumber {
        self.entry(obj).map(|e| e.sibling).unwrap_or(0)
    }

    pub fn get_child(&self, obj: ObjectNumber) -> ObjectNumber {
        self.entry(obj).map(|e| e.child).unwrap_or(0)
    }

    /// Detach `obj` from its current parent's child chain and prepend it
    /// to `new_parent`'s (or leave it orphaned if `new_parent == 0`).
    pub fn move_object(&mut self, obj: ObjectNumber, new_parent: ObjectNumber) -> CoreResult<()> {
        self.require_exists(obj)?;
        if obj == 0 {
            return Err(CoreError::InvalidObject(0));
        }
        self.require_exists(new_parent)?;

        let old_parent = self.get_parent(obj);
        if old_parent != 0 {
            self.unlink_from_sibling_chain(old_parent, obj)?;
        }

        if let Some(e) = self.entry_mut(obj) {
            e.parent = new_parent;
            e.sibling = 0;
        }

        if new_parent != 0 {
            let previous_child = self.get_child(new_parent);
            if let Some(e) = self.entry_mut(obj) {
                e.sibling = previous_child;
            }
            if let Some(p) = self.entry_mut(new_parent) {
                p.child = obj;
            }
        }

        Ok(())
    }

    /// Remove `obj` from `parent`'s child/sibling chain by updating
    /// whichever link currently points at it. Raises `CorruptStory` if the
    /// chain revisits a node, which would otherwise spin forever.
    fn unlink_from_sibling_chain(
        &mut self,
        parent: ObjectNumber,
        obj: ObjectNumber,
    ) -> CoreResult<()> {
        if self.get_child(parent) == obj {
            let next = self.get_sibling(obj);
            if let Some(p) = self.entry_mut(parent) {
                p.child = next;
            }
            return Ok(());
        }

        let mut cursor = self.get_child(parent);
        let mut visited = std::collections::HashSet::new();
        while cursor != 0 {
            if !visited.insert(cursor) {
                return Err(CoreError::CorruptStory(format!(
                    "cycle detected while unlinking object {obj} from parent {parent}"
                )));
            }
            let next = self.get_sibling(cursor);
            if next == obj {
                let after = self.get_sibling(obj);
                if let Some(c) = self.entry_mut(cursor) {
                    c.sibling = after;
                }
                return Ok(());
            }
            cursor = next;
        }

        // obj wasn't actually reachable from parent's chain; nothing to
        // unlink. This shouldn't happen if parent/child invariants hold,
        // but isn't itself a cycle, so we don't raise CorruptStory.
        Ok(())
    }
}

fn decode_property_value(data: &[u8]) -> u16 {
    match data.len() {
        0 => 0,
        1 => data[0] as u16,
        _ => u16::from_be_bytes([data[0], data[1]]),
    }
}

fn read_link(bytes: &[u8], width: usize) -> u16 {
    if width == 1 {
        bytes[0] as u16
    } else {
        u16::from_be_bytes([bytes[0], bytes[1]])
    }
}

fn parse_object_record(
    record: &[u8],
    version: ZVersion,
    bytes: &[u8],
    static_base: u32,
) -> CoreResult<ObjectEntry> {
    let attr_len = version.attribute_bytes();
    let link_len = version.object_number_bytes();

    let attributes = record[0..attr_len].to_vec();
    let mut pos = attr_len;

    let parent = read_link(&record[pos..pos + link_len], link_len);
    pos += link_len;
    let sibling = read_link(&record[pos..pos + link_len], link_len);
    pos += link_len;
    let child = read_link(&record[pos..pos + link_len], link_len);
    pos += link_len;

    let prop_addr_raw = u16::from_be_bytes([record[pos], record[pos + 1]]) as u32;

    let property_table_addr = if prop_addr_raw < static_base {
        0
    } else {
        prop_addr_raw - static_base
    };

    let (short_name, properties) = if property_table_addr == 0 {
        (Vec::new(), IndexMap::new())
    } else {
        parse_property_table(
            bytes,
            (property_table_addr + static_base) as usize,
            version,
        )?
    };

    Ok(ObjectEntry {
        attributes,
        parent,
        sibling,
        child,
        property_table_addr,
        properties,
        short_name,
    })
}

fn parse_property_table(
    bytes: &[u8],
    table_addr: usize,
    version: ZVersion,
) -> CoreResult<(Vec<u8>, IndexMap<u16, PropertyValue>)> {
    let text_len = *bytes
        .get(table_addr)
        .ok_or_else(|| CoreError::CorruptStory("property table address out of range".into()))?
        as usize;

    let name_start = table_addr + 1;
    let name_end = name_start + 2 * text_len;
    let short_name = bytes
        .get(name_start..name_end)
        .ok_or_else(|| CoreError::CorruptStory("truncated object short name".into()))?
        .to_vec();

    let mut properties = IndexMap::new();
    let mut addr = name_end;

    loop {
        let header = *bytes
            .get(addr)
            .ok_or_else(|| CoreError::CorruptStory("truncated property list".into()))?;
        if header == 0 {
            break;
        }

        let (prop_num, size, data_start): (u16, usize, usize) = if version.is_pre_v4() {
            let prop_num = (header & 0x1F) as u16;
            let size = ((header >> 5) & 0x07) as usize + 1;
            (prop_num, size, addr + 1)
        } else if header & 0x80 != 0 {
            let size_byte = *bytes.get(addr + 1).ok_or_else(|| {
                CoreError::CorruptStory("truncated long-form property size byte".into())
            })?;
            // The Z-Machine standard masks the property number to 6 bits
            // here (0x3F); the spec's §4.1 prose states 7 bits, but its
            // own Design Notes flag that as the known original-code bug
            // and direct implementers to the 6-bit form. See DESIGN.md.
            let prop_num = (header & 0x3F) as u16;
            let size = if size_byte == 0 { 64 } else { size_byte as usize };
            (prop_num, size, addr + 2)
        } else {
            let prop_num = (header & 0x1F) as u16;
            let size = (((header >> 5) & 0x03) as usize) + 1;
            (prop_num, size, addr + 1)
        };

        if prop_num == 0 || prop_num > version.max_property() {
            return Err(CoreError::CorruptStory(format!(
                "invalid property number {prop_num} in object property list"
            )));
        }

        let data = bytes
            .get(data_start..data_start + size)
            .ok_or_else(|| CoreError::CorruptStory("property data out of range".into()))?
            .to_vec();

        properties.entry(prop_num).or_insert(PropertyValue {
            data,
            address: data_start as u32,
        });

        addr = data_start + size;
    }

    Ok((short_name, properties))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v3() -> ZVersion {
        ZVersion::new(3)
    }

    /// S1: object #1 at record offset 0, bytes `80 00 00 00 00 00 00 00 00`.
    #[test]
    fn s1_v3_object_attribute_zero_is_msb_of_byte_zero() {
        let mut bytes = vec![0u8; 64];
        // 31 property defaults (62 bytes) then one object record at offset 62.
        let record_base = 62;
        bytes[record_base] = 0x80; // attribute 0 set
        let table = ObjectTable::load(&bytes, v3(), 0, 0).unwrap();

        assert!(table.get_attribute(1, 0));
        assert!(!table.get_attribute(1, 1));
        assert_eq!(table.get_parent(1), 0);
        assert_eq!(table.get_sibling(1), 0);
        assert_eq!(table.get_child(1), 0);
        assert_eq!(table.get_entry(1).unwrap().property_table_addr, 0);
    }

    #[test]
    fn attribute_round_trip() {
        let mut bytes = vec![0u8; 64];
        bytes[62 + 3] = 0x01; // nonzero parent byte so the record isn't read as the terminator
        let mut table = ObjectTable::load(&bytes, v3(), 0, 0).unwrap();

        table.set_attribute(1, 5, true).unwrap();
        assert!(table.get_attribute(1, 5));
        table.set_attribute(1, 5, false).unwrap();
        assert!(!table.get_attribute(1, 5));
    }

    /// S2 (property parse v3), using a `25 00 42` header: prop 5, size 2,
    /// value 0x0042.
    #[test]
    fn s2_property_lookup_and_default_fallback() {
        let mut bytes = vec![0u8; 256];
        // property defaults: default[6] = 0x0007
        bytes[6 * 2] = 0x00;
        bytes[6 * 2 + 1] = 0x07;

        let record_base = 62;
        // non-zero object record pointing property table at offset 200
        bytes[record_base + 3] = 0x01; // parent = 1 (nonzero so record isn't all-zero)
        let prop_table_addr: u16 = 200;
        bytes[record_base + 7] = (prop_table_addr >> 8) as u8;
        bytes[record_base + 8] = (prop_table_addr & 0xFF) as u8;

        // property table at 200: zero-length name, then prop 5 (size 2, value 0x0042)
        bytes[200] = 0x00;
        bytes[201] = 0x25; // size=2 (S=1), prop=5
        bytes[202] = 0x00;
        bytes[203] = 0x42;
        bytes[204] = 0x00; // end of properties

        let table = ObjectTable::load(&bytes, v3(), 0, 0).unwrap();
        assert_eq!(table.get_property(1, 5), 0x0042);
        assert_eq!(table.get_property(1, 6), 0x0007);
    }

    #[test]
    fn property_default_used_for_object_zero() {
        let mut bytes = vec![0u8; 128];
        bytes[2] = 0x00;
        bytes[3] = 0x09; // default[1] = 9
        bytes[62 + 3] = 0x01; // a minimal non-zero record, no properties
        let table = ObjectTable::load(&bytes, v3(), 0, 0).unwrap();
        assert_eq!(table.get_property(0, 1), 9);
    }

    fn build_three_object_table() -> ObjectTable {
        // 1(parent=0), 2(parent=1, sibling=0), 3(parent=1, sibling=2), child_of_1=3.
        let mut bytes = vec![0u8; 512];
        let record_base = 62;
        let sz = ZVersion::new(3).object_entry_size();

        // object 1: parent 0, sibling 0, child 3
        let o1 = record_base;
        bytes[o1 + 6] = 3; // child

        // object 2: parent 1, sibling 0, child 0
        let o2 = record_base + sz;
        bytes[o2 + 4] = 1; // parent

        // object 3: parent 1, sibling 2, child 0
        let o3 = record_base + sz * 2;
        bytes[o3 + 4] = 1; // parent
        bytes[o3 + 5] = 2; // sibling

        ObjectTable::load(&bytes, ZVersion::new(3), 0, 0).unwrap()
    }

    /// S3: move_object(3, 0) detaches 3 from object 1's child chain.
    #[test]
    fn s3_move_object_detaches_from_parent_chain() {
        let mut table = build_three_object_table();
        assert_eq!(table.get_child(1), 3);

        table.move_object(3, 0).unwrap();

        assert_eq!(table.get_child(1), 2);
        assert_eq!(table.get_sibling(2), 0);
        assert_eq!(table.get_parent(3), 0);
        assert_eq!(table.get_sibling(3), 0);
    }

    #[test]
    fn move_object_prepends_to_new_parent_child_list() {
        let mut table = build_three_object_table();

        table.move_object(2, 3).unwrap();

        assert_eq!(table.get_child(3), 2);
        assert_eq!(table.get_sibling(2), 0);
        assert_eq!(table.get_parent(2), 3);
    }

    #[test]
    fn move_object_rejects_unknown_object() {
        let mut table = build_three_object_table();
        assert!(matches!(
            table.move_object(99, 0),
            Err(CoreError::InvalidObject(99))
        ));
    }

    #[test]
    fn move_object_rejects_unknown_parent() {
        let mut table = build_three_object_table();
        assert!(matches!(
            table.move_object(2, 99),
            Err(CoreError::InvalidObject(99))
        ));
    }

    #[test]
    fn set_property_on_absent_property_is_invalid_property() {
        let mut bytes = vec![0u8; 128];
        bytes[62 + 3] = 0x01;
        let mut table = ObjectTable::load(&bytes, v3(), 0, 0).unwrap();
        assert!(matches!(
            table.set_property(1, 9, 1),
            Err(CoreError::InvalidProperty(1, 9))
        ));
    }

    #[test]
    fn get_attribute_on_missing_object_is_false() {
        let bytes = vec![0u8; 64];
        let table = ObjectTable::load(&bytes, v3(), 0, 0).unwrap();
        assert!(!table.get_attribute(0, 0));
        assert!(!table.get_attribute(5, 0));
    }

    #[test]
    fn truncated_object_table_is_corrupt_story() {
        let bytes = vec![0u8; 10]; // not even room for the 31 property defaults
        let err = ObjectTable::load(&bytes, v3(), 0, 0).unwrap_err();
        assert!(matches!(err, CoreError::CorruptStory(_)));
    }

    #[test]
    fn lenient_config_tolerates_a_truncated_final_record() {
        let mut bytes = vec![0u8; 62 + 9 + 4]; // one full record, then 4 leftover bytes
        bytes[62 + 3] = 0x01; // nonzero parent so the first record isn't all-zero
        bytes.truncate(62 + 9 + 4); // leaves a partial second record at the tail

        let lenient = Config {
            strict_story_validation: false,
            ..Config::default()
        };
        let table = ObjectTable::load_with_config(&bytes, v3(), 0, 0, &lenient).unwrap();
        assert_eq!(table.object_count(), 1);

        let err = ObjectTable::load(&bytes, v3(), 0, 0).unwrap_err();
        assert!(matches!(err, CoreError::CorruptStory(_)));
    }
}
