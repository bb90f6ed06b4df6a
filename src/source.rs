//! Where field lists and value ranges come from.
//!
//! The generator only needs three things from its input: the table name,
//! the flat list of fields, and the observed range of a field. A ROOT file
//! provides them directly; a JSON snapshot replays them offline.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::root::{LeafType, RootFile, Tree};

/// One value slot of a field.
#[derive(Debug, Clone, PartialEq)]
pub struct RawLeaf {
    pub name: String,
    pub class_name: String,
    pub leaf_type: Option<LeafType>,
    /// Field holding this leaf's run-time length.
    pub counter: Option<String>,
}

/// A field as listed by the source, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    pub name: String,
    pub title: String,
    pub leaves: Vec<RawLeaf>,
}

/// Why a field cannot be plotted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Malformed {
    #[error("{0} leaves, expected exactly one")]
    LeafCount(usize),

    #[error("no leaf named like the branch")]
    NoOwnLeaf,

    #[error("unsupported leaf class {0}")]
    UnsupportedType(String),
}

impl RawField {
    /// A field with a single leaf of its own name and a known type.
    pub fn single(name: &str, title: &str, leaf_type: LeafType, counter: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            leaves: vec![RawLeaf {
                name: name.to_string(),
                class_name: String::new(),
                leaf_type: Some(leaf_type),
                counter: counter.map(String::from),
            }],
        }
    }

    /// The field's value type and counter, if it has exactly one usable leaf.
    pub fn value_leaf(&self) -> std::result::Result<(LeafType, Option<&str>), Malformed> {
        if self.leaves.len() != 1 {
            return Err(Malformed::LeafCount(self.leaves.len()));
        }
        let leaf = &self.leaves[0];
        if leaf.name != self.name {
            return Err(Malformed::NoOwnLeaf);
        }
        let leaf_type = leaf
            .leaf_type
            .ok_or_else(|| Malformed::UnsupportedType(leaf.class_name.clone()))?;
        Ok((leaf_type, leaf.counter.as_deref()))
    }
}

/// Schema and value ranges of one table.
pub trait SchemaSource {
    fn table_name(&self) -> &str;

    /// Every top-level field, in storage order.
    fn fields(&self) -> Vec<RawField>;

    /// Observed `(min, max)` of `field`; `(0, 0)` when it holds no values.
    fn extent(&self, field: &str) -> Result<(f64, f64)>;
}

/// Reads the schema straight from a ROOT file.
pub struct RootSource {
    file: RootFile,
    tree: Tree,
}

impl RootSource {
    pub fn open(path: &Path, tree: &str) -> Result<Self> {
        let file = RootFile::open(path)
            .with_context(|| format!("cannot open ROOT file {}", path.display()))?;
        Self::from_file(file, tree)
    }

    pub fn from_file(file: RootFile, tree: &str) -> Result<Self> {
        let tree = file
            .get_tree(tree)
            .with_context(|| format!("cannot read tree '{}' from {}", tree, file.path().display()))?;
        Ok(Self { file, tree })
    }
}

impl SchemaSource for RootSource {
    fn table_name(&self) -> &str {
        &self.tree.name
    }

    fn fields(&self) -> Vec<RawField> {
        self.tree
            .branches
            .iter()
            .map(|b| RawField {
                name: b.name.clone(),
                title: b.title.clone(),
                leaves: b
                    .leaves
                    .iter()
                    .map(|l| RawLeaf {
                        name: l.name.clone(),
                        class_name: l.class_name.clone(),
                        leaf_type: l.leaf_type,
                        counter: l.counter().map(String::from),
                    })
                    .collect(),
            })
            .collect()
    }

    fn extent(&self, field: &str) -> Result<(f64, f64)> {
        self.file
            .extent_of(&self.tree, field)
            .with_context(|| format!("cannot scan values of '{}'", field))
    }
}

/// One field of a [`SchemaSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotField {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub leaf_type: LeafType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter: Option<String>,
    pub min: f64,
    pub max: f64,
}

/// JSON capture of a table's usable fields and their ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub tree: String,
    pub fields: Vec<SnapshotField>,
}

impl SchemaSnapshot {
    /// Scan every well-formed field of `source`. Malformed fields are left out.
    pub fn capture(source: &dyn SchemaSource) -> Result<Self> {
        let mut fields = Vec::new();
        for raw in source.fields() {
            let Ok((leaf_type, counter)) = raw.value_leaf() else {
                continue;
            };
            let (min, max) = source.extent(&raw.name)?;
            fields.push(SnapshotField {
                counter: counter.map(String::from),
                name: raw.name,
                title: raw.title,
                leaf_type,
                min,
                max,
            });
        }
        Ok(Self {
            tree: source.table_name().to_string(),
            fields,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read schema snapshot {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid schema snapshot {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")
            .with_context(|| format!("cannot write schema snapshot {}", path.display()))
    }
}

/// Replays a [`SchemaSnapshot`].
pub struct SnapshotSource {
    snapshot: SchemaSnapshot,
    index: HashMap<String, usize>,
}

impl SnapshotSource {
    pub fn new(snapshot: SchemaSnapshot) -> Self {
        let index = snapshot
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self { snapshot, index }
    }

    pub fn open(path: &Path, tree: &str) -> Result<Self> {
        let snapshot = SchemaSnapshot::from_file(path)?;
        if snapshot.tree != tree {
            anyhow::bail!(
                "snapshot {} holds tree '{}', not '{}'",
                path.display(),
                snapshot.tree,
                tree
            );
        }
        Ok(Self::new(snapshot))
    }
}

impl SchemaSource for SnapshotSource {
    fn table_name(&self) -> &str {
        &self.snapshot.tree
    }

    fn fields(&self) -> Vec<RawField> {
        self.snapshot
            .fields
            .iter()
            .map(|f| RawField::single(&f.name, &f.title, f.leaf_type, f.counter.as_deref()))
            .collect()
    }

    fn extent(&self, field: &str) -> Result<(f64, f64)> {
        let i = self
            .index
            .get(field)
            .with_context(|| format!("field '{}' is not in the snapshot", field))?;
        let f = &self.snapshot.fields[*i];
        Ok((f.min, f.max))
    }
}

/// Open `path` as a snapshot when it ends in `.json`, else as a ROOT file.
pub fn open_source(path: &Path, tree: &str) -> Result<Box<dyn SchemaSource>> {
    if !path.is_file() {
        anyhow::bail!("input file {} does not exist", path.display());
    }
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(Box::new(SnapshotSource::open(path, tree)?))
    } else {
        Ok(Box::new(RootSource::open(path, tree)?))
    }
}
