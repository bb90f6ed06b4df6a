//! Grouping of a flat field list into monitored objects.
//!
//! NanoAOD names its columns `<Object>_<quantity>`, with variable-length
//! columns sized by a separate counter (`nJet` for `Jet_pt`, `Jet_eta`, ...).
//! Classification recovers the per-object groups and attaches each group's
//! counter as a synthetic [`SIZE_ENTRY`].

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::root::LeafType;
use crate::source::{Malformed, RawField};

pub const SEPARATOR: char = '_';

/// Top-level prefix that is never monitored (trigger bits).
pub const RESERVED_PREFIX: &str = "HLT";

/// Entry name of a group's counter.
pub const SIZE_ENTRY: &str = "@size";

/// A usable field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub title: String,
    pub leaf_type: LeafType,
    pub counter: Option<String>,
}

/// Fields sharing a name prefix, keyed by suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    /// Suffix to field; [`SIZE_ENTRY`] maps to the counter field.
    pub entries: BTreeMap<String, Field>,
}

/// Counter named by an array field but absent from the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct DanglingCounter {
    pub field: String,
    pub counter: String,
}

#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub groups: BTreeMap<String, Group>,
    pub malformed: Vec<(String, Malformed)>,
    pub dangling: Vec<DanglingCounter>,
}

impl Classification {
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }
}

/// Split `name` at the first separator. A name without one is its own group.
pub fn split_name(name: &str) -> (&str, &str) {
    name.split_once(SEPARATOR).unwrap_or((name, ""))
}

/// Classify `raw` into groups.
pub fn classify(raw: &[RawField]) -> Classification {
    let mut out = Classification::default();

    let mut fields = Vec::with_capacity(raw.len());
    for r in raw {
        match r.value_leaf() {
            Ok((leaf_type, counter)) => fields.push(Field {
                name: r.name.clone(),
                title: r.title.clone(),
                leaf_type,
                counter: counter.map(String::from),
            }),
            Err(reason) => {
                tracing::warn!(field = %r.name, %reason, "cannot parse field");
                out.malformed.push((r.name.clone(), reason));
            }
        }
    }

    let by_name: HashMap<&str, &Field> = fields.iter().map(|f| (f.name.as_str(), f)).collect();
    let counters: HashSet<&str> = fields.iter().filter_map(|f| f.counter.as_deref()).collect();

    for field in &fields {
        if counters.contains(field.name.as_str()) {
            continue;
        }
        let (head, tail) = split_name(&field.name);
        if head == RESERVED_PREFIX && field.name.contains(SEPARATOR) {
            continue;
        }

        let group = out.groups.entry(head.to_string()).or_insert_with(|| Group {
            name: head.to_string(),
            entries: BTreeMap::new(),
        });
        group.entries.insert(tail.to_string(), field.clone());

        let Some(counter) = field.counter.as_deref() else {
            continue;
        };
        if group.entries.contains_key(SIZE_ENTRY) {
            continue;
        }
        match by_name.get(counter) {
            Some(&c) => {
                group.entries.insert(SIZE_ENTRY.to_string(), c.clone());
            }
            None => {
                tracing::warn!(field = %field.name, counter, "counter is not in the schema");
                out.dangling.push(DanglingCounter {
                    field: field.name.clone(),
                    counter: counter.to_string(),
                });
            }
        }
    }

    tracing::debug!(
        groups = out.groups.len(),
        malformed = out.malformed.len(),
        "classified schema"
    );
    out
}
