//! Builders for synthetic ROOT files used by the reader's tests.

use std::collections::HashMap;
use std::io::Write;

use super::rbuffer::BYTE_COUNT_MASK;

const NEW_CLASS_TAG: u32 = 0xFFFF_FFFF;
const CLASS_MASK: u32 = 0x8000_0000;
const MAP_OFFSET: u32 = 2;

/// Wrap `compressed` in a ROOT compression block header.
pub fn block(tag: &[u8; 2], compressed: &[u8], u_len: usize) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.push(0);
    out.extend_from_slice(&(compressed.len() as u32).to_le_bytes()[..3]);
    out.extend_from_slice(&(u_len as u32).to_le_bytes()[..3]);
    out.extend_from_slice(compressed);
    out
}

pub fn zlib_block(original: &[u8]) -> Vec<u8> {
    let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(original).unwrap();
    block(b"ZL", &enc.finish().unwrap(), original.len())
}

/// Small-file `TKey` header for `class`/`name` located at `seek`.
pub fn key_bytes(class: &str, name: &str, obj_len: u32, n_obj: u32, seek: u32) -> Vec<u8> {
    let key_len = (26 + 3 + class.len() + name.len()) as u16;
    let mut out = Vec::new();
    out.extend_from_slice(&(key_len as u32 + n_obj).to_be_bytes());
    out.extend_from_slice(&4u16.to_be_bytes());
    out.extend_from_slice(&obj_len.to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&key_len.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&seek.to_be_bytes());
    out.extend_from_slice(&100u32.to_be_bytes());
    for s in [class, name, ""] {
        out.push(s.len() as u8);
        out.extend_from_slice(s.as_bytes());
    }
    out
}

/// Uncompressed basket at `seek`: key, basket header, values, then `trailer`
/// standing in for the entry-offset table.
pub fn basket_record(name: &str, seek: u32, values: &[u8], trailer: &[u8]) -> Vec<u8> {
    let n_obj = (values.len() + trailer.len()) as u32;
    let mut out = key_bytes("TBasket", name, n_obj, n_obj, seek);
    let key_len = out.len() as u16 + 2 + 4 * 4 + 1;
    out[14..16].copy_from_slice(&key_len.to_be_bytes());
    out[0..4].copy_from_slice(&(key_len as u32 + n_obj).to_be_bytes());
    out.extend_from_slice(&3u16.to_be_bytes());
    out.extend_from_slice(&32000i32.to_be_bytes());
    out.extend_from_slice(&0i32.to_be_bytes());
    out.extend_from_slice(&0i32.to_be_bytes());
    out.extend_from_slice(&(key_len as i32 + values.len() as i32).to_be_bytes());
    out.push(0);
    out.extend_from_slice(values);
    out.extend_from_slice(trailer);
    out
}

/// Streams objects the way `TBufferFile` does, tracking class tags.
pub struct Writer {
    pub buf: Vec<u8>,
    key_len: u32,
    classes: HashMap<String, u32>,
}

impl Writer {
    pub fn new(key_len: u16) -> Self {
        Self {
            buf: Vec::new(),
            key_len: key_len as u32,
            classes: HashMap::new(),
        }
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }
    pub fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
    pub fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
    pub fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }
    pub fn string(&mut self, s: &str) {
        self.u8(s.len() as u8);
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Open a byte-counted versioned block; pass the result to `close`.
    pub fn open(&mut self, version: u16) -> usize {
        let start = self.buf.len();
        self.u32(0);
        self.u16(version);
        start
    }

    pub fn close(&mut self, start: usize) {
        let count = (self.buf.len() - start - 4) as u32 | BYTE_COUNT_MASK;
        self.buf[start..start + 4].copy_from_slice(&count.to_be_bytes());
    }

    pub fn tnamed(&mut self, name: &str, title: &str) {
        let s = self.open(1);
        self.u16(1);
        self.u32(0);
        self.u32(0x0300_0000);
        self.string(name);
        self.string(title);
        self.close(s);
    }

    pub fn empty_versioned(&mut self) {
        let s = self.open(1);
        self.close(s);
    }

    /// Object header: byte count + class tag. Pass the result to `close`.
    pub fn object(&mut self, class: &str) -> usize {
        let start = self.buf.len();
        self.u32(0);
        let tag_pos = self.buf.len() as u32;
        match self.classes.get(class) {
            Some(&k) => self.u32(k | CLASS_MASK),
            None => {
                self.u32(NEW_CLASS_TAG);
                self.buf.extend_from_slice(class.as_bytes());
                self.u8(0);
                self.classes
                    .insert(class.to_string(), tag_pos + self.key_len + MAP_OFFSET);
            }
        }
        start
    }

    fn object_key(&self, start: usize) -> u32 {
        start as u32 + self.key_len + MAP_OFFSET
    }

    pub fn array_header(&mut self, count: i32) -> usize {
        let s = self.open(3);
        self.u16(1);
        self.u32(0);
        self.u32(0);
        self.string("");
        self.i32(count);
        self.i32(0);
        s
    }

    /// Write a leaf whose count is a back-reference key (or none).
    /// Returns the key other leaves use to refer to it.
    pub fn leaf(&mut self, class: &str, name: &str, title: &str, count: Option<u32>) -> u32 {
        let obj = self.object(class);
        let key = self.object_key(obj);
        let outer = self.open(1);
        let base = self.open(2);
        self.tnamed(name, title);
        self.i32(1);
        self.i32(4);
        self.i32(0);
        self.u8(0);
        self.u8(0);
        self.u32(count.unwrap_or(0));
        self.close(base);
        self.buf.extend_from_slice(&[0u8; 8]);
        self.close(outer);
        self.close(obj);
        key
    }

    /// Write a `TBranch` with one basket at `seek` holding `entries` entries.
    pub fn branch(
        &mut self,
        name: &str,
        title: &str,
        seek: u64,
        entries: i64,
        leaf: impl FnOnce(&mut Self) -> u32,
    ) -> u32 {
        let obj = self.object("TBranch");
        let b = self.open(13);
        self.tnamed(name, title);
        self.empty_versioned();
        self.i32(0);
        self.i32(32000);
        self.i32(0);
        self.i32(1); // fWriteBasket
        self.i64(entries);
        self.empty_versioned();
        self.i32(0);
        self.i32(2); // fMaxBaskets
        self.i32(0);
        self.i64(entries);
        self.i64(0);
        self.i64(0);
        self.i64(0);
        let sub = self.array_header(0);
        self.close(sub);
        let leaves = self.array_header(1);
        let key = leaf(self);
        self.close(leaves);
        let baskets = self.array_header(0);
        self.close(baskets);
        self.u8(1);
        self.i32(100);
        self.i32(0);
        self.u8(1);
        self.i64(0);
        self.i64(entries);
        self.u8(1);
        self.i64(seek as i64);
        self.i64(0);
        self.close(b);
        self.close(obj);
        key
    }

    /// `TTree` preamble up to (not including) the branch array.
    pub fn tree_header(&mut self, name: &str, entries: i64) -> usize {
        let t = self.open(20);
        self.tnamed(name, name);
        for _ in 0..3 {
            self.empty_versioned();
        }
        self.i64(entries);
        for _ in 0..4 {
            self.i64(0);
        }
        self.buf.extend_from_slice(&1.0f64.to_be_bytes());
        self.i32(0);
        self.i32(25);
        self.i32(0);
        self.i32(0);
        self.i32(0); // fNClusterRange
        for _ in 0..6 {
            self.i64(0);
        }
        self.u8(0);
        self.u8(0);
        self.empty_versioned();
        t
    }
}

/// One branch of a synthetic file.
pub struct FakeBranch {
    pub name: &'static str,
    pub title: &'static str,
    pub leaf_class: &'static str,
    /// Name of an earlier branch acting as this branch's counter.
    pub counter: Option<&'static str>,
    pub values: Vec<u8>,
    pub entries: i64,
}

impl FakeBranch {
    pub fn f32(name: &'static str, values: &[f32], counter: Option<&'static str>) -> Self {
        Self {
            name,
            title: name,
            leaf_class: "TLeafF",
            counter,
            values: values.iter().flat_map(|v| v.to_be_bytes()).collect(),
            entries: 3,
        }
    }

    pub fn i32(name: &'static str, values: &[i32]) -> Self {
        Self {
            name,
            title: name,
            leaf_class: "TLeafI",
            counter: None,
            values: values.iter().flat_map(|v| v.to_be_bytes()).collect(),
            entries: 3,
        }
    }
}

/// Assemble a complete small-format ROOT file holding one `TTree`.
pub fn build_file(tree_name: &str, branches: &[FakeBranch]) -> Vec<u8> {
    const BEGIN: usize = 100;
    let mut file = vec![0u8; 200];
    file[..4].copy_from_slice(b"root");
    file[4..8].copy_from_slice(&62206u32.to_be_bytes());
    file[8..12].copy_from_slice(&(BEGIN as u32).to_be_bytes());
    // fNbytesName = 0: the directory streamer sits right at fBEGIN
    file[BEGIN..BEGIN + 2].copy_from_slice(&5u16.to_be_bytes());

    let mut seeks = Vec::new();
    for b in branches {
        let seek = file.len() as u32;
        let trailer: &[u8] = if b.counter.is_some() { &[0, 0, 0, 0] } else { &[] };
        file.extend(basket_record(b.name, seek, &b.values, trailer));
        seeks.push(seek);
    }

    let tree_seek = file.len() as u32;
    let key_len = key_bytes("TTree", tree_name, 0, 0, 0).len() as u16;
    let mut w = Writer::new(key_len);
    let t = w.tree_header(tree_name, 3);
    let arr = w.array_header(branches.len() as i32);
    let mut leaf_keys: HashMap<&str, u32> = HashMap::new();
    for (b, &seek) in branches.iter().zip(&seeks) {
        let count = b.counter.and_then(|c| leaf_keys.get(c).copied());
        let title = match b.counter {
            Some(c) => format!("{}[{}]", b.name, c),
            None => b.name.to_string(),
        };
        let key = w.branch(b.name, b.title, seek as u64, b.entries, |w| {
            w.leaf(b.leaf_class, b.name, &title, count)
        });
        leaf_keys.insert(b.name, key);
    }
    w.close(arr);
    w.close(t);
    let payload = w.buf;
    let n = payload.len() as u32;
    file.extend(key_bytes("TTree", tree_name, n, n, tree_seek));
    file.extend(payload);

    let seek_keys = file.len() as u32;
    file.extend(key_bytes("TFile", "keys.root", 0, 0, seek_keys));
    file.extend_from_slice(&1u32.to_be_bytes());
    file.extend(key_bytes("TTree", tree_name, n, n, tree_seek));

    // fSeekKeys: version, ctime, mtime, nbytes_keys, nbytes_name, seek_dir, seek_parent
    let at = BEGIN + 2 + 4 * 6;
    file[at..at + 4].copy_from_slice(&seek_keys.to_be_bytes());
    file
}

/// Contents of `tests/fixtures/nano_events.root`, used by the binary's
/// end-to-end tests.
pub fn nano_events() -> Vec<u8> {
    build_file(
        "Events",
        &[
            FakeBranch::i32("nJet", &[2, 0, 3]),
            FakeBranch::f32("Jet_pt", &[31.5, 12.0, 250.25, 18.0, 44.0], Some("nJet")),
            FakeBranch::f32("Jet_eta", &[-2.25, 0.5, 1.75, -0.25, 2.5], Some("nJet")),
            FakeBranch::f32("MET_pt", &[0.5, 35.5, 88.0], None),
            FakeBranch::i32("PV_npvs", &[12, 30, 7]),
        ],
    )
}
