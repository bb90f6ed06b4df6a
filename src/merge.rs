//! Merging generated plots into the existing configuration.

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{Context, Result};

use crate::binning::auto_plot;
use crate::config::{DqmConfig, Selection};
use crate::plot::PlotSpec;
use crate::schema::Classification;
use crate::source::SchemaSource;

/// Plot name of the size entry.
pub const SIZE_PLOT: &str = "_size";

#[derive(Debug, Clone, PartialEq)]
pub struct MergedPlot {
    pub spec: PlotSpec,
    /// Whether the plot still corresponds to a field of the schema.
    pub found: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedGroup {
    pub name: String,
    pub sels: Vec<Selection>,
    /// `_size` first, then by name.
    pub plots: Vec<MergedPlot>,
}

/// What a merge pass did, for the CLI summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Groups emitted, in output order.
    pub merged: Vec<String>,
    /// Schema groups without a configuration entry.
    pub skipped: Vec<String>,
    /// Configuration groups the schema does not contain.
    pub missing: Vec<String>,
    /// Newly generated plots per group.
    pub added: BTreeMap<String, Vec<String>>,
    /// Existing plots whose field is gone, per group.
    pub stale: BTreeMap<String, Vec<String>>,
}

/// Plot name for a group entry: `@size` becomes `_size`.
pub fn plot_name(entry: &str) -> String {
    entry.replace('@', "_")
}

fn sort_key(name: &str) -> (bool, &str) {
    (name != SIZE_PLOT, name)
}

/// Merge `schema` into `config`, generating plots for new fields.
pub fn merge(
    config: &DqmConfig,
    schema: &Classification,
    source: &dyn SchemaSource,
) -> Result<(Vec<MergedGroup>, MergeReport)> {
    let mut report = MergeReport::default();
    let mut groups = Vec::new();

    for existing in &config.groups {
        let Some(group) = schema.group(&existing.name) else {
            report.missing.push(existing.name.clone());
            continue;
        };

        let mut plots = existing.plots.clone();
        let known: HashSet<&str> = existing.plots.iter().map(PlotSpec::name).collect();
        let mut titles: HashMap<String, String> = existing
            .plots
            .iter()
            .filter(|p| !p.is_none() && !p.title().is_empty())
            .map(|p| (p.name().to_string(), p.title().to_string()))
            .collect();
        let mut found = HashSet::new();
        let mut added = Vec::new();

        for (entry, field) in &group.entries {
            let name = plot_name(entry);
            titles
                .entry(name.clone())
                .or_insert_with(|| field.title.clone());
            if !known.contains(name.as_str()) {
                let spec = auto_plot(&name, entry, field, source)
                    .with_context(|| format!("cannot bin {}.{}", group.name, name))?;
                tracing::debug!(group = %group.name, plot = %spec, "generated");
                plots.push(spec);
                added.push(name.clone());
            }
            found.insert(name);
        }

        for p in &mut plots {
            if let Some(title) = titles.get(p.name()).filter(|t| !t.is_empty()) {
                p.set_title(title);
            }
        }
        plots.sort_by(|a, b| sort_key(a.name()).cmp(&sort_key(b.name())));

        let plots: Vec<MergedPlot> = plots
            .into_iter()
            .map(|spec| MergedPlot {
                found: found.contains(spec.name()),
                spec,
            })
            .collect();
        let stale: Vec<String> = plots
            .iter()
            .filter(|p| !p.found)
            .map(|p| p.spec.name().to_string())
            .collect();

        if !added.is_empty() {
            report.added.insert(group.name.clone(), added);
        }
        if !stale.is_empty() {
            report.stale.insert(group.name.clone(), stale);
        }
        report.merged.push(group.name.clone());
        groups.push(MergedGroup {
            name: group.name.clone(),
            sels: existing.sels.clone(),
            plots,
        });
    }

    report.skipped = schema
        .groups
        .keys()
        .filter(|name| config.group(name).is_none())
        .cloned()
        .collect();

    Ok((groups, report))
}
