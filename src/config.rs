//! The hand-written DQM configuration that generated plots are merged into.
//!
//! Stored as TOML, one `[[group]]` table per monitored object:
//!
//! ```toml
//! [[group]]
//! name = "Muon"
//! sels = [{ name = "Good", cut = "pt > 15 && tightId" }]
//! plots = [
//!     { kind = "count1d", name = "_size", nbins = 8, min = -0.5, max = 7.5 },
//!     { kind = "hist1d", name = "pt", column = "pt", nbins = 20, min = 0, max = 200, title = "pt" },
//! ]
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::plot::PlotSpec;

/// The configuration shipped with the tool.
const BUILTIN: &str = include_str!("../config/nano_dqm.toml");

/// A named selection applied before filling a group's plots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub name: String,
    pub cut: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    #[serde(default)]
    pub sels: Vec<Selection>,
    #[serde(default)]
    pub plots: Vec<PlotSpec>,
}

/// Groups in output order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DqmConfig {
    #[serde(rename = "group", default)]
    pub groups: Vec<GroupConfig>,
}

impl DqmConfig {
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN).context("built-in DQM configuration is invalid")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read DQM configuration {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("invalid DQM configuration {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: DqmConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Group, selection and plot names must be unique in their scope.
    /// Group and selection names become Python keyword arguments, so they
    /// must also be identifiers.
    pub fn validate(&self) -> Result<()> {
        let mut groups = HashSet::new();
        for g in &self.groups {
            if g.name.is_empty() {
                anyhow::bail!("group with an empty name");
            }
            if !is_identifier(&g.name) {
                anyhow::bail!("group name '{}' is not a Python identifier", g.name);
            }
            if !groups.insert(g.name.as_str()) {
                anyhow::bail!("group '{}' is defined twice", g.name);
            }
            let mut sels = HashSet::new();
            for s in &g.sels {
                if !is_identifier(&s.name) {
                    anyhow::bail!(
                        "selection name '{}' of group '{}' is not a Python identifier",
                        s.name,
                        g.name
                    );
                }
                if !sels.insert(s.name.as_str()) {
                    anyhow::bail!("selection '{}' of group '{}' is defined twice", s.name, g.name);
                }
            }
            let mut plots = HashSet::new();
            for p in &g.plots {
                if !plots.insert(p.name()) {
                    anyhow::bail!("plot '{}' of group '{}' is defined twice", p.name(), g.name);
                }
            }
        }
        Ok(())
    }

    pub fn group(&self, name: &str) -> Option<&GroupConfig> {
        self.groups.iter().find(|g| g.name == name)
    }
}

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// `[A-Za-z_][A-Za-z0-9_]*`, excluding reserved words.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !PYTHON_KEYWORDS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
[[group]]
name = "Muon"
sels = [{ name = "Good", cut = "pt > 15" }]
plots = [
    { kind = "count1d", name = "_size", nbins = 8, min = -0.5, max = 7.5 },
    { kind = "hist1d", name = "pt", column = "pt", nbins = 20, min = 0, max = 200, title = "pt" },
    { kind = "none", name = "jetIdx" },
]

[[group]]
name = "MET"
plots = [{ kind = "hist1d", name = "pt", column = "pt", nbins = 20, min = 0, max = 400 }]
"#;

    #[test]
    fn test_parse_groups_in_order() {
        let config = DqmConfig::from_toml_str(SMALL).unwrap();
        let names: Vec<_> = config.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Muon", "MET"]);

        let muon = config.group("Muon").unwrap();
        assert_eq!(muon.sels, vec![Selection { name: "Good".into(), cut: "pt > 15".into() }]);
        assert_eq!(muon.plots.len(), 3);
        assert!(muon.plots[2].is_none());
        assert!(config.group("MET").unwrap().sels.is_empty());
    }

    #[test]
    fn test_duplicate_plot_rejected() {
        let text = r#"
[[group]]
name = "Jet"
plots = [{ kind = "none", name = "pt" }, { kind = "none", name = "pt" }]
"#;
        let err = DqmConfig::from_toml_str(text).unwrap_err();
        assert!(err.to_string().contains("defined twice"));
    }

    #[test]
    fn test_duplicate_group_rejected() {
        let text = "[[group]]\nname = \"Jet\"\n[[group]]\nname = \"Jet\"\n";
        assert!(DqmConfig::from_toml_str(text).is_err());
    }

    #[test]
    fn test_names_must_be_python_identifiers() {
        let text = r#"
[[group]]
name = "Jet pt"
sels = [{ name = "Good", cut = "pt > 30" }]
"#;
        let err = DqmConfig::from_toml_str(text).unwrap_err();
        assert!(err.to_string().contains("group name 'Jet pt' is not a Python identifier"));

        let text = r#"
[[group]]
name = "Jet"
sels = [{ name = "good jets", cut = "pt > 30" }]
"#;
        let err = DqmConfig::from_toml_str(text).unwrap_err();
        assert!(err.to_string().contains("selection name 'good jets'"));

        assert!(DqmConfig::from_toml_str("[[group]]\nname = \"2Jet\"\n").is_err());
        assert!(DqmConfig::from_toml_str("[[group]]\nname = \"class\"\n").is_err());
        assert!(DqmConfig::from_toml_str("[[group]]\nname = \"_Jet2\"\n").is_ok());
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("FatJet"));
        assert!(is_identifier("_size"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("Jet-pt"));
        assert!(!is_identifier("Jetµ"));
        assert!(!is_identifier("None"));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let text = "[[group]]\nname = \"Jet\"\nplots = [{ kind = \"hist2d\", name = \"x\" }]\n";
        assert!(DqmConfig::from_toml_str(text).is_err());
    }

    #[test]
    fn test_builtin_configuration_loads() {
        let config = DqmConfig::builtin().unwrap();
        for name in ["Electron", "Muon", "Jet", "MET"] {
            assert!(config.group(name).is_some(), "missing {}", name);
        }
        let jet = config.group("Jet").unwrap();
        assert_eq!(jet.plots[0].name(), "_size");
    }

    #[test]
    fn test_missing_file() {
        let err = DqmConfig::from_file(Path::new("/nonexistent/dqm.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("cannot read DQM configuration"));
    }
}
