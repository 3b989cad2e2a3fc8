use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, info_span, warn};

use excel_cache::{DatasetLoader, DecoderConfig, LoadReport, StrategyTable};
use excel_ingest::{DUMP_EXTENSION, FingerprintOptions, list_dump_files, read_dump};
use excel_map::AnchorTable;
use excel_master::{GenerateOptions, MasterStore, SaveOutcome, generate_master};

use crate::cli::{DecodeArgs, GenerateArgs};

/// Built-in anchors plus the configured ones and an optional extra file.
pub fn resolve_anchors(config: &DecoderConfig, extra: Option<&Path>) -> Result<AnchorTable> {
    let mut table = config.anchor_table();
    if let Some(path) = extra {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read anchors {}", path.display()))?;
        let extra = AnchorTable::from_toml_str(&contents)
            .with_context(|| format!("parse anchors {}", path.display()))?;
        table.extend(extra);
    }
    Ok(table)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerateStatus {
    Written {
        path: PathBuf,
        fields: usize,
        required: usize,
    },
    Skipped {
        path: PathBuf,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateLine {
    pub dataset: String,
    #[serde(flatten)]
    pub status: GenerateStatus,
}

#[derive(Debug, Default, Serialize)]
pub struct GenerateReport {
    pub lines: Vec<GenerateLine>,
}

impl GenerateReport {
    pub fn has_failures(&self) -> bool {
        self.lines
            .iter()
            .any(|line| matches!(line.status, GenerateStatus::Failed { .. }))
    }
}

/// Regenerates master schemas from plaintext dumps.
///
/// A failing dataset is reported and does not stop the others.
pub fn run_generate(
    config: &DecoderConfig,
    anchors: &AnchorTable,
    args: &GenerateArgs,
) -> Result<GenerateReport> {
    let source = args.source.clone().unwrap_or_else(|| config.dump_dir.clone());
    let store = MasterStore::new(&config.master_dir);

    let targets: Vec<(String, PathBuf)> = if args.targets.is_empty() {
        list_dump_files(&source)
            .with_context(|| format!("list plaintext dumps in {}", source.display()))?
            .into_iter()
            .collect()
    } else {
        args.targets
            .iter()
            .map(|dataset| {
                let path = source.join(format!("{dataset}.{DUMP_EXTENSION}"));
                (dataset.clone(), path)
            })
            .collect()
    };

    let fingerprint = FingerprintOptions {
        uniqueness_sample: config.uniqueness_sample,
    };
    let mut report = GenerateReport::default();
    for (dataset, path) in targets {
        let span = info_span!("generate", dataset = %dataset);
        let _guard = span.enter();
        let options = GenerateOptions {
            fingerprint,
            anchor_hints: anchors.hints_for(&dataset),
        };
        let status = match generate_one(&store, &dataset, &path, &options, args.force) {
            Ok((outcome, fields, required)) => match outcome {
                SaveOutcome::Written(path) => GenerateStatus::Written {
                    path,
                    fields,
                    required,
                },
                SaveOutcome::SkippedExisting(path) => GenerateStatus::Skipped { path },
            },
            Err(error) => {
                warn!("generation failed: {error:#}");
                GenerateStatus::Failed {
                    message: format!("{error:#}"),
                }
            }
        };
        report.lines.push(GenerateLine { dataset, status });
    }
    Ok(report)
}

fn generate_one(
    store: &MasterStore,
    dataset: &str,
    path: &Path,
    options: &GenerateOptions,
    force: bool,
) -> Result<(SaveOutcome, usize, usize)> {
    let dump = read_dump(path).with_context(|| format!("read plaintext dump for {dataset}"))?;
    let schema = generate_master(dataset, &dump.records, options)?;
    let outcome = store
        .save(&schema, force)
        .with_context(|| format!("save master for {dataset}"))?;
    info!(
        sha256 = %dump.sha256,
        generated_at = %Utc::now().to_rfc3339(),
        written = outcome.is_written(),
        "master generation finished"
    );
    Ok((outcome, schema.len(), schema.required_count()))
}

/// Decodes dumps and returns the per-dataset report.
pub fn run_decode(
    config: &DecoderConfig,
    anchors: &AnchorTable,
    args: &DecodeArgs,
) -> Result<LoadReport> {
    let mut options = config.decode_options();
    if args.accept_partial {
        options.accept_partial = true;
    }
    let loader = DatasetLoader::new(
        MasterStore::new(&config.master_dir),
        &config.dump_dir,
        anchors.clone(),
        config.strategy_table(),
        options,
    );
    let (cache, report) = loader
        .load(args.dataset.as_deref())
        .context("decode dumps")?;
    info!(datasets = cache.len(), "decoded cache ready");
    Ok(report)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetListing {
    pub dataset: String,
    /// Field count, or `None` when the master cannot be loaded.
    pub fields: Option<usize>,
    pub required: Option<usize>,
    pub strategy: String,
}

/// Lists master schemas with their indexing strategy.
pub fn run_datasets(config: &DecoderConfig) -> Result<Vec<DatasetListing>> {
    let store = MasterStore::new(&config.master_dir);
    let strategies: StrategyTable = config.strategy_table();
    let datasets = store
        .list()
        .with_context(|| format!("list masters in {}", config.master_dir.display()))?;
    let mut listings = Vec::with_capacity(datasets.len());
    for dataset in datasets {
        let (fields, required) = match store.load(&dataset) {
            Ok(schema) => (Some(schema.len()), Some(schema.required_count())),
            Err(error) => {
                warn!(dataset = %dataset, "master unreadable: {error}");
                (None, None)
            }
        };
        listings.push(DatasetListing {
            strategy: strategies.get(&dataset).name().to_string(),
            dataset,
            fields,
            required,
        });
    }
    Ok(listings)
}
