//! Histogram definitions of the NanoAOD DQM module.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pyfmt::{format_g, py_repr};

/// One histogram (or its suppression) for a field.
///
/// Serialized with a `kind` tag using the DQM module's own kind names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PlotSpec {
    #[serde(rename = "none")]
    NoPlot { name: String },

    /// Distribution of a group's array size.
    #[serde(rename = "count1d")]
    Count1D {
        name: String,
        nbins: u32,
        min: f64,
        max: f64,
        #[serde(default)]
        title: String,
    },

    #[serde(rename = "hist1d")]
    Plot1D {
        name: String,
        column: String,
        nbins: u32,
        min: f64,
        max: f64,
        #[serde(default)]
        title: String,
        #[serde(default)]
        bitset: bool,
    },

    /// Mean of `ycolumn` in bins of `xcolumn`. Only ever carried over.
    #[serde(rename = "prof1d")]
    Profile1D {
        name: String,
        ycolumn: String,
        xcolumn: String,
        nbins: u32,
        min: f64,
        max: f64,
        #[serde(default)]
        title: String,
    },
}

impl PlotSpec {
    pub fn none(name: &str) -> Self {
        PlotSpec::NoPlot {
            name: name.to_string(),
        }
    }

    pub fn count1d(name: &str, nbins: u32, min: f64, max: f64) -> Self {
        PlotSpec::Count1D {
            name: name.to_string(),
            nbins,
            min,
            max,
            title: String::new(),
        }
    }

    pub fn plot1d(name: &str, column: &str, nbins: u32, min: f64, max: f64) -> Self {
        PlotSpec::Plot1D {
            name: name.to_string(),
            column: column.to_string(),
            nbins,
            min,
            max,
            title: String::new(),
            bitset: false,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PlotSpec::NoPlot { name }
            | PlotSpec::Count1D { name, .. }
            | PlotSpec::Plot1D { name, .. }
            | PlotSpec::Profile1D { name, .. } => name,
        }
    }

    /// The DQM `kind` string.
    pub fn kind(&self) -> &'static str {
        match self {
            PlotSpec::NoPlot { .. } => "none",
            PlotSpec::Count1D { .. } => "count1d",
            PlotSpec::Plot1D { .. } => "hist1d",
            PlotSpec::Profile1D { .. } => "prof1d",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, PlotSpec::NoPlot { .. })
    }

    /// Title, or `""` for a suppressed plot.
    pub fn title(&self) -> &str {
        match self {
            PlotSpec::NoPlot { .. } => "",
            PlotSpec::Count1D { title, .. }
            | PlotSpec::Plot1D { title, .. }
            | PlotSpec::Profile1D { title, .. } => title,
        }
    }

    /// Replace the title. No effect on a suppressed plot.
    pub fn set_title(&mut self, new: &str) {
        match self {
            PlotSpec::NoPlot { .. } => {}
            PlotSpec::Count1D { title, .. }
            | PlotSpec::Plot1D { title, .. }
            | PlotSpec::Profile1D { title, .. } => *title = new.to_string(),
        }
    }

    /// Builder-style [`set_title`](Self::set_title).
    pub fn with_title(mut self, title: &str) -> Self {
        self.set_title(title);
        self
    }
}

fn title_arg(title: &str) -> String {
    if title.is_empty() {
        String::new()
    } else {
        format!(", {}", py_repr(title))
    }
}

/// The compact constructor call used in generated configurations,
/// e.g. `Plot1D('pt', 'pt', 20, 0, 200, 'pt')`.
impl fmt::Display for PlotSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotSpec::NoPlot { name } => write!(f, "NoPlot({})", py_repr(name)),
            PlotSpec::Count1D {
                name,
                nbins,
                min,
                max,
                title,
            } => write!(
                f,
                "Count1D({}, {}, {}, {}{})",
                py_repr(name),
                nbins,
                format_g(*min),
                format_g(*max),
                title_arg(title)
            ),
            PlotSpec::Plot1D {
                name,
                column,
                nbins,
                min,
                max,
                title,
                bitset,
            } => write!(
                f,
                "Plot1D({}, {}, {}, {}, {}{}{})",
                py_repr(name),
                py_repr(column),
                nbins,
                format_g(*min),
                format_g(*max),
                title_arg(title),
                if *bitset { ", bitset=True" } else { "" }
            ),
            PlotSpec::Profile1D {
                name,
                ycolumn,
                xcolumn,
                nbins,
                min,
                max,
                title,
            } => write!(
                f,
                "Profile1D({}, {}, {}, {}, {}, {}{})",
                py_repr(name),
                py_repr(ycolumn),
                py_repr(xcolumn),
                nbins,
                format_g(*min),
                format_g(*max),
                title_arg(title)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_dump_forms() {
        assert_eq!(PlotSpec::none("genPartIdx").to_string(), "NoPlot('genPartIdx')");
        assert_eq!(
            PlotSpec::count1d("_size", 8, -0.5, 7.5).to_string(),
            "Count1D('_size', 8, -0.5, 7.5)"
        );
        assert_eq!(
            PlotSpec::plot1d("pt", "pt", 20, 0.0, 200.0)
                .with_title("pt")
                .to_string(),
            "Plot1D('pt', 'pt', 20, 0, 200, 'pt')"
        );
        let prof = PlotSpec::Profile1D {
            name: "pt_vs_eta".into(),
            ycolumn: "pt".into(),
            xcolumn: "eta".into(),
            nbins: 20,
            min: -5.0,
            max: 5.0,
            title: "mean pt".into(),
        };
        assert_eq!(
            prof.to_string(),
            "Profile1D('pt_vs_eta', 'pt', 'eta', 20, -5, 5, 'mean pt')"
        );
    }

    #[test]
    fn test_bitset_flag_follows_title() {
        let mut p = PlotSpec::plot1d("jetId", "jetId", 8, -0.5, 7.5).with_title("ID bits");
        if let PlotSpec::Plot1D { bitset, .. } = &mut p {
            *bitset = true;
        }
        assert_eq!(
            p.to_string(),
            "Plot1D('jetId', 'jetId', 8, -0.5, 7.5, 'ID bits', bitset=True)"
        );
    }

    #[test]
    fn test_titles_are_ignored_on_suppressed_plots() {
        let p = PlotSpec::none("muonIdx").with_title("index");
        assert_eq!(p.title(), "");
        assert!(p.is_none());
        assert_eq!(p.kind(), "none");
    }

    #[test]
    fn test_deserialize_kind_tags() {
        let p: PlotSpec = toml::from_str(
            r#"
            kind = "hist1d"
            name = "eta"
            column = "eta"
            nbins = 20
            min = -5
            max = 5
            "#,
        )
        .unwrap();
        assert_eq!(p, PlotSpec::plot1d("eta", "eta", 20, -5.0, 5.0));

        let c: PlotSpec =
            toml::from_str("kind = \"count1d\"\nname = \"_size\"\nnbins = 4\nmin = -0.5\nmax = 3.5\ntitle = \"n\"\n")
                .unwrap();
        assert_eq!(c.kind(), "count1d");
        assert_eq!(c.title(), "n");
    }
}
