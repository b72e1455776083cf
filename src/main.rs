// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use the_pipewright::config::RuntimeBuilder;
use the_pipewright::registry::bootstrap;

#[derive(Parser, Debug)]
#[command(
    name = "the-pipewright",
    version,
    about = "Run declarative pipelines of named units against a shared data pool"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a pipeline document
    Run {
        /// Pipeline YAML document
        pipeline: PathBuf,

        /// Shared configuration document (defaults plus per-unit sections)
        #[arg(long)]
        shared: Option<PathBuf>,

        /// Override a setting, e.g. `--set scale.factor=3` (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,

        /// Case root for data paths; defaults to framework.root_dir
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// List registered unit types and units
    Units,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            pipeline,
            shared,
            overrides,
            root,
        } => run(pipeline, shared, overrides, root),
        Commands::Units => list_units(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(
    pipeline: PathBuf,
    shared: Option<PathBuf>,
    overrides: Vec<String>,
    root: Option<PathBuf>,
) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let mut builder = RuntimeBuilder::new().with_overrides(overrides);
    if let Some(shared) = shared {
        builder = builder.with_shared_config(shared);
    }
    if let Some(root) = root {
        builder = builder.with_root_dir(root);
    }
    let mut runtime = builder
        .build(&pipeline)
        .map_err(|e| anyhow!("failed to prepare {}: {e}", pipeline.display()))?;

    println!("📋 Pipeline: {}", pipeline.display());
    println!("📁 Data root: {}", runtime.data_pool.root().display());

    let summary = runtime.run()?;

    println!("\n📊 Step Results:");
    for step in &summary.steps {
        println!(
            "  {}. {} ({}) -> [{}] in {:?}",
            step.index + 1,
            step.unit,
            step.unit_type,
            step.routed.join(", "),
            step.duration
        );
        println!("     {}", serde_json::to_string(&step.output)?);
    }

    println!("\n⏱️  Total Time (including config load): {:?}", start_time.elapsed());
    Ok(())
}

fn list_units() -> anyhow::Result<()> {
    let registry = bootstrap()?;
    for unit_type in registry.unit_types() {
        println!("{unit_type}:");
        for unit in registry.units().filter(|unit| unit.unit_type == unit_type) {
            println!("  {:<14} {}", unit.name, unit.description);
        }
    }
    Ok(())
}
