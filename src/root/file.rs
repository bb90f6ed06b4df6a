//! Read-only access to a ROOT file.

use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use super::basket::{read_basket_values, Extent};
use super::directory::Directory;
use super::error::{Result, RootError};
use super::rbuffer::RBuffer;
use super::tree::{BranchInfo, LeafType, Tree};
use super::ttree;

const MAGIC: &[u8; 4] = b"root";

/// File bytes, mapped from disk or owned.
enum Bytes {
    Mapped(memmap2::Mmap),
    Owned(Vec<u8>),
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Bytes::Mapped(m) => &m[..],
            Bytes::Owned(v) => &v[..],
        }
    }
}

pub struct RootFile {
    data: Bytes,
    path: PathBuf,
    top: Directory,
}

impl RootFile {
    /// Map `path` and parse its header and top-level key list.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = fs::File::open(&path)?;
        // SAFETY: the mapping is read-only and lives no longer than `RootFile`;
        // the input is not expected to change while the tool runs.
        let map = unsafe { memmap2::Mmap::map(&file)? };
        Self::parse(Bytes::Mapped(map), path)
    }

    pub fn from_bytes(data: Vec<u8>, path: PathBuf) -> Result<Self> {
        Self::parse(Bytes::Owned(data), path)
    }

    fn parse(data: Bytes, path: PathBuf) -> Result<Self> {
        if data.len() < 64 || &data[..4] != MAGIC {
            return Err(RootError::BadMagic);
        }
        let mut r = RBuffer::at(&data, 4);
        let version = r.read_u32()?;
        let begin = r.read_u32()? as usize;
        // fEND, fSeekFree, fNbytesFree, nfree precede fNbytesName; their
        // width depends on the file version
        let large = version >= 1_000_000;
        r.skip(if large { 8 + 8 } else { 4 + 4 })?;
        r.skip(4 + 4)?;
        let nbytes_name = r.read_u32()? as usize;

        let top = Directory::read(&data, begin + nbytes_name)?;
        tracing::debug!(path = %path.display(), keys = top.keys().len(), "opened ROOT file");
        Ok(Self { data, path, top })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the `TTree` called `name` from the top directory.
    pub fn get_tree(&self, name: &str) -> Result<Tree> {
        let key = self
            .top
            .find(name)
            .ok_or_else(|| RootError::TreeNotFound(name.to_string()))?;
        if key.class_name != "TTree" {
            return Err(RootError::TreeNotFound(format!(
                "'{}' is a {}, not a TTree",
                name, key.class_name
            )));
        }
        let payload = key.payload(&self.data)?;
        ttree::read_tree(&payload, key.key_len)
    }

    /// Minimum and maximum over every value stored in `branch`.
    ///
    /// Array branches contribute all their elements. A branch without
    /// entries reports `(0, 0)`. Baskets that never reached the disk are
    /// skipped with a warning, so the range may then be partial.
    pub fn branch_extent(&self, branch: &BranchInfo) -> Result<(f64, f64)> {
        let leaf_type = leaf_type_of(branch)
            .ok_or_else(|| {
                RootError::BranchNotFound(format!("{} has no readable leaf", branch.name))
            })?;
        let mut extent = Extent::default();
        for &seek in &branch.basket_seek {
            if seek == 0 {
                continue;
            }
            let values = read_basket_values(&self.data, seek)?;
            extent.update(&values, leaf_type)?;
        }
        let stored = branch.stored_entries();
        if stored < branch.entries {
            tracing::warn!(
                branch = %branch.name,
                stored,
                entries = branch.entries,
                "baskets on disk do not hold every entry; range is partial"
            );
        }
        tracing::trace!(branch = %branch.name, n = extent.count, "scanned baskets");
        Ok(extent.bounds())
    }

    /// Same as [`branch_extent`](Self::branch_extent), looked up by name.
    pub fn extent_of(&self, tree: &Tree, name: &str) -> Result<(f64, f64)> {
        let branch = tree
            .find_branch(name)
            .ok_or_else(|| RootError::BranchNotFound(name.to_string()))?;
        self.branch_extent(branch)
    }
}

/// Leaf type of a branch's own leaf, if the reader can decode it.
pub fn leaf_type_of(branch: &BranchInfo) -> Option<LeafType> {
    branch.own_leaf().and_then(|l| l.leaf_type)
}
