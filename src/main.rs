use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use dqm_autoplot::{
    cli::Cli,
    codegen,
    config::DqmConfig,
    merge::{merge, MergeReport},
    schema::classify,
    source::{open_source, SchemaSnapshot},
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing: warnings by default, everything with --debug
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// One line per group, like the DQM maintainers expect when regenerating
fn print_report(report: &MergeReport) {
    for name in &report.merged {
        println!("{}", name);
        if let Some(added) = report.added.get(name) {
            println!("    new:   {}", added.join(", "));
        }
        if let Some(stale) = report.stale.get(name) {
            println!("    stale: {}", stale.join(", "));
        }
    }
    for name in &report.skipped {
        println!("{} <skipped as it's not in the configuration>", name);
    }
    for name in &report.missing {
        println!("{} <in the configuration but not in the file>", name);
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let source = open_source(&args.input, &args.tree)?;

    if let Some(path) = &args.dump_schema {
        let snapshot = SchemaSnapshot::capture(source.as_ref())?;
        snapshot.write(path)?;
        println!(
            "wrote schema snapshot {} ({} fields)",
            path.display(),
            snapshot.fields.len()
        );
    }

    let config = match &args.existing {
        Some(path) => DqmConfig::from_file(path)?,
        None => DqmConfig::builtin()?,
    };

    let schema = classify(&source.fields());
    let (groups, report) = merge(&config, &schema, source.as_ref())?;
    print_report(&report);

    fs::write(&args.output, codegen::render(&groups))
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    println!("wrote {} ({} groups)", args.output.display(), groups.len());
    Ok(())
}
