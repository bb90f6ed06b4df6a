//! Branch and leaf metadata of a flat `TTree`.

use serde::{Deserialize, Serialize};

/// Value type of a leaf, named after ROOT's type aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafType {
    #[serde(rename = "Bool_t")]
    Bool,
    #[serde(rename = "Char_t")]
    I8,
    #[serde(rename = "UChar_t")]
    U8,
    #[serde(rename = "Short_t")]
    I16,
    #[serde(rename = "UShort_t")]
    U16,
    #[serde(rename = "Int_t")]
    I32,
    #[serde(rename = "UInt_t")]
    U32,
    #[serde(rename = "Long64_t")]
    I64,
    #[serde(rename = "ULong64_t")]
    U64,
    #[serde(rename = "Float_t")]
    F32,
    #[serde(rename = "Double_t")]
    F64,
}

impl LeafType {
    /// Map a `TLeaf` subclass and its unsigned flag to a type.
    pub fn from_class(class_name: &str, unsigned: bool) -> Option<Self> {
        let t = match (class_name, unsigned) {
            ("TLeafO", _) => LeafType::Bool,
            ("TLeafB", false) => LeafType::I8,
            ("TLeafB", true) => LeafType::U8,
            ("TLeafS", false) => LeafType::I16,
            ("TLeafS", true) => LeafType::U16,
            ("TLeafI", false) => LeafType::I32,
            ("TLeafI", true) => LeafType::U32,
            ("TLeafL", false) => LeafType::I64,
            ("TLeafL", true) => LeafType::U64,
            ("TLeafF", _) => LeafType::F32,
            ("TLeafD", _) => LeafType::F64,
            _ => return None,
        };
        Some(t)
    }

    pub fn type_name(self) -> &'static str {
        match self {
            LeafType::Bool => "Bool_t",
            LeafType::I8 => "Char_t",
            LeafType::U8 => "UChar_t",
            LeafType::I16 => "Short_t",
            LeafType::U16 => "UShort_t",
            LeafType::I32 => "Int_t",
            LeafType::U32 => "UInt_t",
            LeafType::I64 => "Long64_t",
            LeafType::U64 => "ULong64_t",
            LeafType::F32 => "Float_t",
            LeafType::F64 => "Double_t",
        }
    }

    pub fn byte_size(self) -> usize {
        match self {
            LeafType::Bool | LeafType::I8 | LeafType::U8 => 1,
            LeafType::I16 | LeafType::U16 => 2,
            LeafType::I32 | LeafType::U32 | LeafType::F32 => 4,
            LeafType::I64 | LeafType::U64 | LeafType::F64 => 8,
        }
    }

    pub fn is_floating(self) -> bool {
        matches!(self, LeafType::F32 | LeafType::F64)
    }

    pub fn is_bool(self) -> bool {
        self == LeafType::Bool
    }

    pub fn is_integer(self) -> bool {
        !self.is_floating() && !self.is_bool()
    }

    /// Decode one big-endian value. `bytes` must be `byte_size()` long.
    pub fn decode(self, bytes: &[u8]) -> f64 {
        let mut raw = [0u8; 8];
        raw[..bytes.len()].copy_from_slice(bytes);
        match self {
            LeafType::Bool => f64::from(bytes[0] != 0),
            LeafType::I8 => f64::from(bytes[0] as i8),
            LeafType::U8 => f64::from(bytes[0]),
            LeafType::I16 => f64::from(i16::from_be_bytes([raw[0], raw[1]])),
            LeafType::U16 => f64::from(u16::from_be_bytes([raw[0], raw[1]])),
            LeafType::I32 => f64::from(i32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]])),
            LeafType::U32 => f64::from(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]])),
            LeafType::I64 => i64::from_be_bytes(raw) as f64,
            LeafType::U64 => u64::from_be_bytes(raw) as f64,
            LeafType::F32 => f64::from(f32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]])),
            LeafType::F64 => f64::from_be_bytes(raw),
        }
    }
}

impl std::fmt::Display for LeafType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// One `TLeaf` of a branch.
#[derive(Debug, Clone)]
pub struct LeafInfo {
    pub name: String,
    /// Leaf title, e.g. `Jet_pt[nJet]` for a variable-length array.
    pub title: String,
    pub class_name: String,
    /// `None` for leaf classes the reader cannot decode.
    pub leaf_type: Option<LeafType>,
    /// Name of the leaf holding this leaf's run-time length.
    pub leaf_count: Option<String>,
}

impl LeafInfo {
    /// Counter leaf name: the resolved `fLeafCount`, or else the bracketed
    /// dimension of the title when it is not a number.
    pub fn counter(&self) -> Option<&str> {
        if let Some(name) = &self.leaf_count {
            return Some(name);
        }
        let open = self.title.find('[')?;
        let close = self.title[open..].find(']')? + open;
        let dim = &self.title[open + 1..close];
        if dim.is_empty() || dim.chars().all(|c| c.is_ascii_digit()) {
            None
        } else {
            Some(dim)
        }
    }
}

#[derive(Debug, Clone)]
pub struct BranchInfo {
    pub name: String,
    /// Branch title; NanoAOD stores the field documentation here.
    pub title: String,
    pub class_name: String,
    pub leaves: Vec<LeafInfo>,
    pub entries: u64,
    /// File offset of each written basket; 0 for baskets never flushed.
    pub basket_seek: Vec<u64>,
    /// First entry of each basket, closed by one past the last entry.
    pub basket_entry: Vec<u64>,
}

impl BranchInfo {
    /// The leaf named like the branch, as `TBranch::FindLeaf` resolves it.
    pub fn own_leaf(&self) -> Option<&LeafInfo> {
        self.leaves.iter().find(|l| l.name == self.name)
    }

    /// Entries held by baskets that were written to disk.
    pub fn stored_entries(&self) -> u64 {
        self.basket_seek
            .iter()
            .enumerate()
            .filter(|&(_, &seek)| seek != 0)
            .map(|(i, _)| {
                let first = self.basket_entry.get(i).copied().unwrap_or(self.entries);
                let next = self.basket_entry.get(i + 1).copied().unwrap_or(self.entries);
                next.saturating_sub(first)
            })
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct Tree {
    pub name: String,
    /// Top-level branches in file order.
    pub branches: Vec<BranchInfo>,
}

impl Tree {
    pub fn find_branch(&self, name: &str) -> Option<&BranchInfo> {
        self.branches.iter().find(|b| b.name == name)
    }
}
