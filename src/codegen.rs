//! Rendering of merged groups as a CMSSW Python configuration fragment.

use crate::config::Selection;
use crate::merge::MergedGroup;
use crate::pyfmt::py_repr;

const HEADER: &str = "# automatically generated by dqm-autoplot
import FWCore.ParameterSet.Config as cms
from PhysicsTools.NanoAOD.nanoDQM_tools_cff import *

nanoDQM = cms.EDAnalyzer(\"NanoAODDQM\",
    vplots = cms.PSet(
";

const FOOTER: &str = "    )\n)\n";

/// `sels` as `cms.PSet(...)`, indented to sit inside a group block.
fn dump_sels(sels: &[Selection]) -> String {
    if sels.is_empty() {
        return "cms.PSet()".to_string();
    }
    let params: Vec<String> = sels
        .iter()
        .map(|s| format!("    {} = cms.string({})", s.name, py_repr(&s.cut)))
        .collect();
    format!("cms.PSet(\n{}\n)", params.join(",\n")).replace('\n', "\n            ")
}

/// Render the complete configuration file.
pub fn render(groups: &[MergedGroup]) -> String {
    let mut out = String::from(HEADER);
    for g in groups {
        out.push_str(&format!("        {} = cms.PSet(\n", g.name));
        out.push_str(&format!("            sels = {},\n", dump_sels(&g.sels)));
        out.push_str("            plots = cms.VPSet(\n");
        for p in &g.plots {
            let mark = if p.found { ' ' } else { '#' };
            out.push_str(&format!("              {} {},\n", mark, p.spec));
        }
        out.push_str("            )\n");
        out.push_str("        ),\n");
    }
    out.push_str(FOOTER);
    out
}
