//! dqm-autoplot - default NanoAOD DQM plot definitions from a file's schema
//!
//! The library reads the flat branch list of a NanoAOD `Events` tree (or a
//! JSON snapshot of it), groups branches by object, picks default binnings
//! from the observed value ranges, and merges the result into an existing
//! DQM configuration rendered as CMSSW Python.

pub mod binning;
pub mod cli;
pub mod codegen;
pub mod config;
pub mod merge;
pub mod plot;
pub mod pyfmt;
pub mod root;
pub mod schema;
pub mod source;
