//! `TTree` / `TBranch` / `TLeaf` streamer decoding.
//!
//! Only the metadata needed to list branches, their leaves and their basket
//! locations is extracted; everything else is skipped through byte counts.

use std::collections::HashMap;

use super::error::{Result, RootError};
use super::rbuffer::{RBuffer, BYTE_COUNT_MASK};
use super::tree::{BranchInfo, LeafInfo, LeafType, Tree};

const NEW_CLASS_TAG: u32 = 0xFFFF_FFFF;
const CLASS_MASK: u32 = 0x8000_0000;
const MAP_OFFSET: u32 = 2;

/// Entry of the per-payload reference map.
#[derive(Debug, Clone)]
enum Ref {
    Class(String),
    Leaf(String),
    Other,
}

/// What `ReadObjectAny` found at the cursor.
enum Tagged {
    Null,
    /// Back-reference to an object already streamed.
    Reference(u32),
    Object {
        class: String,
        /// Absolute end of the object, when a byte count was written.
        end: Option<usize>,
        /// Map key under which the object registers itself.
        key: u32,
    },
}

/// ROOT's streaming reference map: classes and objects are keyed by their
/// position in the key buffer, which starts `key_len` bytes before the payload.
struct RefMap {
    refs: HashMap<u32, Ref>,
    displacement: u32,
}

impl RefMap {
    fn new(key_len: u16) -> Self {
        Self {
            refs: HashMap::new(),
            displacement: key_len as u32,
        }
    }

    fn key_at(&self, pos: usize) -> u32 {
        pos as u32 + self.displacement + MAP_OFFSET
    }

    fn read(&mut self, r: &mut RBuffer) -> Result<Tagged> {
        let beg = r.pos();
        let first = r.read_u32()?;

        let (end, class_pos, tag) = if first & BYTE_COUNT_MASK != 0 && first != NEW_CLASS_TAG {
            let end = beg + 4 + (first & !BYTE_COUNT_MASK) as usize;
            let pos = r.pos();
            (Some(end), pos, r.read_u32()?)
        } else {
            (None, beg, first)
        };

        if tag & CLASS_MASK == 0 {
            if let Some(end) = end {
                r.set_pos(end);
            }
            return Ok(if tag == 0 { Tagged::Null } else { Tagged::Reference(tag) });
        }

        let class = if tag == NEW_CLASS_TAG {
            let name = r.read_cstring()?;
            let key = self.key_at(class_pos);
            self.refs.insert(key, Ref::Class(name.clone()));
            name
        } else {
            match self.refs.get(&(tag & !CLASS_MASK)) {
                Some(Ref::Class(name)) => name.clone(),
                _ => {
                    return Err(RootError::Deserialization(format!(
                        "unresolved class reference {:#010x} at {}",
                        tag, class_pos
                    )))
                }
            }
        };

        Ok(Tagged::Object {
            class,
            end,
            key: self.key_at(beg),
        })
    }

    fn register(&mut self, key: u32, entry: Ref) {
        self.refs.insert(key, entry);
    }

    fn leaf_name(&self, key: u32) -> Option<&str> {
        match self.refs.get(&key) {
            Some(Ref::Leaf(name)) => Some(name),
            _ => None,
        }
    }
}

/// Decode a `TTree` from its key payload.
pub fn read_tree(payload: &[u8], key_len: u16) -> Result<Tree> {
    let mut r = RBuffer::new(payload);
    let mut refs = RefMap::new(key_len);

    let (version, _) = r.read_version()?;
    let (name, _title) = r.read_tnamed()?;
    // TAttLine, TAttFill, TAttMarker
    for _ in 0..3 {
        r.skip_versioned()?;
    }

    let entries = r.read_i64()? as u64;
    let _tot_bytes = r.read_i64()?;
    let _zip_bytes = r.read_i64()?;
    let _saved_bytes = r.read_i64()?;
    if version >= 18 {
        let _flushed_bytes = r.read_i64()?;
    }
    let _weight = r.read_f64()?;
    let _timer_interval = r.read_i32()?;
    let _scan_field = r.read_i32()?;
    let _update = r.read_i32()?;
    if version >= 18 {
        let _default_entry_offset_len = r.read_i32()?;
    }
    let n_cluster_range = if version >= 19 { r.read_i32()?.max(0) as usize } else { 0 };
    let _max_entries = r.read_i64()?;
    let _max_entry_loop = r.read_i64()?;
    let _max_virtual_size = r.read_i64()?;
    let _auto_save = r.read_i64()?;
    if version >= 18 {
        let _auto_flush = r.read_i64()?;
    }
    let _estimate = r.read_i64()?;
    if version >= 19 {
        // fClusterRangeEnd, fClusterSize: one marker byte then the values
        for _ in 0..2 {
            r.skip(1)?;
            r.skip(8 * n_cluster_range)?;
        }
    }
    if version >= 20 {
        r.skip_versioned()?; // fIOFeatures
    }

    let branches = read_branch_array(&mut r, &mut refs)?;
    tracing::debug!(tree = %name, entries, branches = branches.len(), "decoded TTree");
    Ok(Tree { name, branches })
}

/// Read a `TObjArray` header and return its element count and end position.
fn read_array_header(r: &mut RBuffer) -> Result<(usize, Option<usize>)> {
    let (version, end) = r.read_version()?;
    if version > 2 {
        r.read_tobject()?;
    }
    if version > 1 {
        let _name = r.read_string()?;
    }
    let count = r.read_i32()?.max(0) as usize;
    let _lower_bound = r.read_i32()?;
    // every element takes at least a 4-byte tag
    if count > r.remaining() / 4 {
        return Err(RootError::Deserialization(format!(
            "array of {} elements in {} bytes",
            count,
            r.remaining()
        )));
    }
    Ok((count, end))
}

fn read_branch_array(r: &mut RBuffer, refs: &mut RefMap) -> Result<Vec<BranchInfo>> {
    let (count, end) = read_array_header(r)?;
    let mut branches = Vec::with_capacity(count);

    for _ in 0..count {
        match refs.read(r)? {
            Tagged::Object { class, end, key } => {
                refs.register(key, Ref::Other);
                let parsed = if class == "TBranch" {
                    read_branch(r, refs, &class)
                } else {
                    // derived branch classes stream their TBranch base first
                    r.read_version()
                        .and_then(|_| read_branch(r, refs, &class))
                };
                match (parsed, end) {
                    (Ok(branch), Some(end)) => {
                        r.set_pos(end);
                        branches.push(branch);
                    }
                    (Ok(branch), None) => branches.push(branch),
                    (Err(e), Some(end)) => {
                        tracing::warn!(class = %class, error = %e, "skipping undecodable branch");
                        r.set_pos(end);
                    }
                    (Err(e), None) => return Err(e),
                }
            }
            Tagged::Null | Tagged::Reference(_) => {}
        }
    }

    if let Some(end) = end {
        r.set_pos(end);
    }
    Ok(branches)
}

fn read_branch(r: &mut RBuffer, refs: &mut RefMap, class: &str) -> Result<BranchInfo> {
    let (version, end) = r.read_version()?;
    let (name, title) = r.read_tnamed()?;
    r.skip_versioned()?; // TAttFill

    let _compress = r.read_i32()?;
    let _basket_size = r.read_i32()?;
    let _entry_offset_len = r.read_i32()?;
    let write_basket = r.read_i32()?.max(0) as usize;
    let _entry_number = r.read_i64()?;
    if version >= 13 {
        r.skip_versioned()?; // fIOFeatures
    }
    let _offset = r.read_i32()?;
    let max_baskets = r.read_i32()?.max(0) as usize;
    let _split_level = r.read_i32()?;
    let entries = r.read_i64()?.max(0) as u64;
    if version >= 11 {
        let _first_entry = r.read_i64()?;
    }
    let _tot_bytes = r.read_i64()?;
    let _zip_bytes = r.read_i64()?;

    let sub_branches = read_branch_array(r, refs)?;
    if !sub_branches.is_empty() {
        tracing::debug!(branch = %name, n = sub_branches.len(), "ignoring sub-branches");
    }
    let leaves = read_leaf_array(r, refs)?;
    skip_array(r)?; // fBaskets

    // fBasketBytes, fBasketEntry, fBasketSeek: a marker byte and 4 + 8 + 8 bytes per basket
    if max_baskets > r.remaining() / 20 {
        return Err(RootError::Deserialization(format!(
            "branch '{}' claims {} baskets in {} bytes",
            name,
            max_baskets,
            r.remaining()
        )));
    }
    r.skip(1)?;
    let basket_bytes: Vec<i32> = (0..max_baskets).map(|_| r.read_i32()).collect::<Result<_>>()?;
    r.skip(1)?;
    let mut basket_entry: Vec<u64> = (0..max_baskets)
        .map(|_| r.read_i64().map(|v| v.max(0) as u64))
        .collect::<Result<_>>()?;
    r.skip(1)?;
    let mut basket_seek: Vec<u64> = (0..max_baskets)
        .map(|_| r.read_i64().map(|v| v.max(0) as u64))
        .collect::<Result<_>>()?;

    let n = write_basket.min(max_baskets);
    basket_seek.truncate(n);
    basket_entry.truncate((n + 1).min(max_baskets));
    if basket_entry.len() == n {
        basket_entry.push(entries);
    }
    let live = basket_bytes.iter().take(n).filter(|&&b| b > 0).count();
    if live < n {
        tracing::debug!(branch = %name, live, n, "baskets with zero size");
    }

    if let Some(end) = end {
        r.set_pos(end);
    }

    Ok(BranchInfo {
        name,
        title,
        class_name: class.to_string(),
        leaves,
        entries,
        basket_seek,
        basket_entry,
    })
}

fn read_leaf_array(r: &mut RBuffer, refs: &mut RefMap) -> Result<Vec<LeafInfo>> {
    let (count, end) = read_array_header(r)?;
    let mut leaves = Vec::with_capacity(count);
    for _ in 0..count {
        match refs.read(r)? {
            Tagged::Object { class, end, key } => leaves.push(read_leaf(r, refs, class, end, key)?),
            Tagged::Reference(key) => {
                if let Some(name) = refs.leaf_name(key) {
                    tracing::debug!(leaf = name, "leaf shared with another branch");
                }
            }
            Tagged::Null => {}
        }
    }
    if let Some(end) = end {
        r.set_pos(end);
    }
    Ok(leaves)
}

/// Decode one `TLeaf*` object whose tag has already been consumed.
fn read_leaf(
    r: &mut RBuffer,
    refs: &mut RefMap,
    class: String,
    end: Option<usize>,
    key: u32,
) -> Result<LeafInfo> {
    r.read_version()?; // concrete leaf class
    r.read_version()?; // TLeaf base
    let (name, title) = r.read_tnamed()?;
    let _len = r.read_i32()?;
    let _len_type = r.read_i32()?;
    let _offset = r.read_i32()?;
    let _is_range = r.read_u8()?;
    let unsigned = r.read_u8()? != 0;
    // register before descending so a self-referencing count resolves
    refs.register(key, Ref::Leaf(name.clone()));

    let leaf_count = match refs.read(r)? {
        Tagged::Null => None,
        Tagged::Reference(key) => refs.leaf_name(key).map(String::from),
        Tagged::Object { class, end, key } => Some(read_leaf(r, refs, class, end, key)?.name),
    };

    if let Some(end) = end {
        r.set_pos(end);
    }

    Ok(LeafInfo {
        leaf_type: LeafType::from_class(&class, unsigned),
        name,
        title,
        class_name: class,
        leaf_count,
    })
}

fn skip_array(r: &mut RBuffer) -> Result<()> {
    r.skip_versioned()
}
