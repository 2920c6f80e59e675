//! beambook CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod lists;

use lists::{parse_stage_spec, read_path_list};

#[derive(Parser)]
#[command(name = "beambook")]
#[command(about = "beambook - beam-exposure bookkeeping for sample normalization")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a stage's filelist, reconcile against the beam database, and
    /// register it in a manifest (idempotent on the stage name)
    Register {
        /// Stage specification, NAME:FILELIST
        spec: String,

        /// Manifest container to register into (created if absent)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Beam-exposure SQLite database
        #[arg(long)]
        beam_db: PathBuf,

        /// Sample kind (data, overlay, dirt, ext, unknown)
        #[arg(long, default_value = "unknown")]
        kind: String,

        /// Beam mode (bnb, numi, unknown)
        #[arg(long, default_value = "unknown")]
        beam: String,

        /// Scale applied to raw toroid units (protons per stored unit)
        #[arg(long, default_value_t = bb_beamdb::DEFAULT_POT_SCALE)]
        pot_scale: f64,
    },

    /// List the stage names registered in a manifest
    Stages {
        /// Manifest container
        #[arg(short, long)]
        manifest: PathBuf,
    },

    /// Aggregate the stages of one or more manifests into a sample
    Aggregate {
        /// Sample specification, NAME:FILELIST (the filelist names manifests)
        spec: String,

        /// Output path for the persisted sample
        #[arg(short, long)]
        output: PathBuf,

        /// Sample list (TSV) to upsert with the persisted sample
        #[arg(long)]
        sample_list: Option<PathBuf>,
    },

    /// Read a persisted sample back and print it as JSON
    Show {
        /// Persisted sample container
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Register { spec, manifest, beam_db, kind, beam, pot_scale } => {
            cmd_register(&spec, &manifest, &beam_db, &kind, &beam, pot_scale)
        }
        Commands::Stages { manifest } => cmd_stages(&manifest),
        Commands::Aggregate { spec, output, sample_list } => {
            cmd_aggregate(&spec, &output, sample_list.as_ref())
        }
        Commands::Show { input } => cmd_show(&input),
    }
}

fn cmd_register(
    spec: &str,
    manifest: &PathBuf,
    beam_db: &PathBuf,
    kind: &str,
    beam: &str,
    pot_scale: f64,
) -> Result<()> {
    let (stage_name, filelist_path) = parse_stage_spec(spec)?;
    let files = read_path_list(&filelist_path)?;

    let scan = bb_scan::scan_subruns(&files)?;
    let db = bb_beamdb::BeamDb::open(beam_db)?;
    let exposure = db.sum_exposure(&scan.unique_pairs, pot_scale)?;

    let record = bb_core::StageRecord {
        cfg: bb_core::StageConfig {
            stage_name,
            filelist_path: filelist_path.display().to_string(),
        },
        n_input_files: files.len() as u64,
        kind: bb_core::SampleKind::parse(kind),
        beam: bb_core::BeamMode::parse(beam),
        scan,
        exposure,
    };

    let outcome = bb_manifest::register_stage(
        manifest,
        &record,
        &beam_db.display().to_string(),
        pot_scale,
    )?;

    print_json(serde_json::json!({
        "stage": record.cfg.stage_name,
        "manifest": manifest.display().to_string(),
        "outcome": match outcome {
            bb_manifest::RegisterOutcome::Registered => "registered",
            bb_manifest::RegisterOutcome::AlreadyRegistered => "already_registered",
        },
        "kind": record.kind.name(),
        "beam": record.beam.name(),
        "n_input_files": record.n_input_files,
        "n_unique_pairs": record.scan.unique_pairs.len(),
        "n_entries": record.scan.n_entries,
        "pot_sum": record.scan.pot_sum,
        "tortgt_sum": record.exposure.tortgt_sum,
        "tor101_sum": record.exposure.tor101_sum,
    }))
}

fn cmd_stages(manifest: &PathBuf) -> Result<()> {
    let names = bb_manifest::list_stage_names(manifest)?;
    let meta = if manifest.exists() {
        bb_manifest::read_meta(manifest)?
    } else {
        Default::default()
    };

    print_json(serde_json::json!({
        "manifest": manifest.display().to_string(),
        "stages": names.into_iter().collect::<Vec<_>>(),
        "meta": meta,
    }))
}

fn cmd_aggregate(spec: &str, output: &PathBuf, sample_list: Option<&PathBuf>) -> Result<()> {
    let (sample_name, filelist_path) = parse_stage_spec(spec)?;
    let manifests = read_path_list(&filelist_path)?;

    let mut stages = Vec::new();
    for manifest in &manifests {
        let records = bb_manifest::read_stages(manifest)
            .with_context(|| format!("reading manifest {}", manifest.display()))?;
        for record in records {
            stages.push(bb_sample::SourcedStage {
                record,
                source_path: manifest.display().to_string(),
            });
        }
    }

    let sample = bb_sample::aggregate(&sample_name, &stages)?;
    bb_sample::write_sample(&sample, output)?;

    if let Some(list_path) = sample_list {
        bb_sample::upsert_sample_list(list_path, &sample, &output.display().to_string())?;
    }

    print_json(serde_json::json!({
        "sample": sample.sample_name,
        "kind": sample.kind.name(),
        "beam": sample.beam.name(),
        "fragments": sample.fragments.len(),
        "subrun_pot_sum": sample.subrun_pot_sum,
        "db_tortgt_pot_sum": sample.db_tortgt_pot_sum,
        "db_tor101_pot_sum": sample.db_tor101_pot_sum,
        "normalization": sample.normalization,
        "normalized_pot_sum": sample.normalized_pot_sum,
        "output": output.display().to_string(),
    }))
}

fn cmd_show(input: &PathBuf) -> Result<()> {
    let sample = bb_sample::read_sample(input)?;
    print_json(serde_json::to_value(&sample)?)
}

fn print_json(value: serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
