//! Parallel dataset loading.
//!
//! Each dataset is decoded independently on the rayon pool. A failing dataset
//! is reported and leaves its previous cache entry (if any) in place; the
//! other datasets still load.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use excel_ingest::{DUMP_EXTENSION, IngestError, list_dump_files, parse_dump, sha256_hex};
use excel_map::{AnchorTable, DecodeError, DecodeOptions, Decoder};
use excel_master::MasterStore;

use crate::builder::build_index;
use crate::config::DecoderConfig;
use crate::error::{LoadError, Result};
use crate::registry::{CacheEntry, DecodedCache};
use crate::strategy::StrategyTable;

#[derive(Debug)]
pub enum LoadStatus {
    Loaded {
        records: usize,
        confidence: f64,
        shape: &'static str,
        entries: usize,
        unmatched: Vec<String>,
    },
    /// Dump digest matches the cached entry.
    Unchanged,
    /// No master schema exists for the dump.
    SkippedNoMaster,
    Failed(DecodeError),
}

impl LoadStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loaded { unmatched, .. } if unmatched.is_empty() => "loaded",
            Self::Loaded { .. } => "loaded (partial)",
            Self::Unchanged => "unchanged",
            Self::SkippedNoMaster => "no master",
            Self::Failed(_) => "failed",
        }
    }
}

#[derive(Debug)]
pub struct DatasetOutcome {
    pub dataset: String,
    pub status: LoadStatus,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub outcomes: Vec<DatasetOutcome>,
}

impl LoadReport {
    pub fn loaded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, LoadStatus::Loaded { .. }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &DecodeError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            LoadStatus::Failed(err) => Some((o.dataset.as_str(), err)),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn outcome(&self, dataset: &str) -> Option<&LoadStatus> {
        self.outcomes
            .iter()
            .find(|o| o.dataset == dataset)
            .map(|o| &o.status)
    }
}

/// Per-dataset summary for display.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub dataset: String,
    pub status: String,
    pub records: Option<usize>,
    pub confidence: Option<f64>,
    pub detail: String,
}

impl DatasetOutcome {
    pub fn summary(&self) -> DatasetSummary {
        let (records, confidence, detail) = match &self.status {
            LoadStatus::Loaded {
                records,
                confidence,
                shape,
                entries,
                unmatched,
            } => {
                let detail = if unmatched.is_empty() {
                    format!("{entries} {shape} entries")
                } else {
                    format!("{entries} {shape} entries; unmatched: {}", unmatched.join(", "))
                };
                (Some(*records), Some(*confidence), detail)
            }
            LoadStatus::Unchanged => (None, None, "dump digest unchanged".to_string()),
            LoadStatus::SkippedNoMaster => (None, None, String::new()),
            LoadStatus::Failed(err) => (None, err.achieved_confidence(), err.to_string()),
        };
        DatasetSummary {
            dataset: self.dataset.clone(),
            status: self.status.label().to_string(),
            records,
            confidence,
            detail,
        }
    }
}

/// Decodes dumps and installs them into a [`DecodedCache`].
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    store: MasterStore,
    dump_dir: PathBuf,
    anchors: AnchorTable,
    strategies: StrategyTable,
    options: DecodeOptions,
}

struct Job {
    dataset: String,
    path: PathBuf,
    previous_digest: Option<String>,
}

impl DatasetLoader {
    pub fn new(
        store: MasterStore,
        dump_dir: impl Into<PathBuf>,
        anchors: AnchorTable,
        strategies: StrategyTable,
        options: DecodeOptions,
    ) -> Self {
        Self {
            store,
            dump_dir: dump_dir.into(),
            anchors,
            strategies,
            options,
        }
    }

    pub fn from_config(config: &DecoderConfig) -> Self {
        Self::new(
            MasterStore::new(&config.master_dir),
            &config.dump_dir,
            config.anchor_table(),
            config.strategy_table(),
            config.decode_options(),
        )
    }

    pub fn store(&self) -> &MasterStore {
        &self.store
    }

    pub fn dump_dir(&self) -> &Path {
        &self.dump_dir
    }

    pub fn strategies(&self) -> &StrategyTable {
        &self.strategies
    }

    pub fn anchors(&self) -> &AnchorTable {
        &self.anchors
    }

    /// Decodes every dump with a master (or only `only`) into a fresh cache.
    pub fn load(&self, only: Option<&str>) -> Result<(DecodedCache, LoadReport)> {
        let mut cache = DecodedCache::new();
        let report = self.refresh(&mut cache, only)?;
        Ok((cache, report))
    }

    /// Re-decodes dumps whose digest changed and replaces their entries.
    pub fn refresh(&self, cache: &mut DecodedCache, only: Option<&str>) -> Result<LoadReport> {
        let dumps = list_dump_files(&self.dump_dir)
            .map_err(|source| LoadError::DumpDiscovery { source })?;
        let masters: BTreeSet<String> = self
            .store
            .list()
            .map_err(|source| LoadError::MasterDiscovery { source })?
            .into_iter()
            .collect();

        let mut report = LoadReport::default();
        let mut jobs = Vec::new();

        if let Some(dataset) = only
            && !dumps.contains_key(dataset)
        {
            let path = self.dump_dir.join(format!("{dataset}.{DUMP_EXTENSION}"));
            report.outcomes.push(DatasetOutcome {
                dataset: dataset.to_string(),
                status: LoadStatus::Failed(DecodeError::from_ingest(
                    dataset,
                    IngestError::FileNotFound { path },
                )),
            });
        }

        for (dataset, path) in dumps {
            if only.is_some_and(|wanted| wanted != dataset) {
                continue;
            }
            if !masters.contains(&dataset) {
                if only.is_some() {
                    let path = self.store.path_for(&dataset);
                    report.outcomes.push(DatasetOutcome {
                        status: LoadStatus::Failed(DecodeError::MasterNotFound {
                            dataset: dataset.clone(),
                            path,
                        }),
                        dataset,
                    });
                } else {
                    debug!(dataset = %dataset, "no master schema, skipping");
                    report.outcomes.push(DatasetOutcome {
                        dataset,
                        status: LoadStatus::SkippedNoMaster,
                    });
                }
                continue;
            }
            let previous_digest = cache.entry(&dataset).map(|e| e.sha256.clone());
            jobs.push(Job {
                dataset,
                path,
                previous_digest,
            });
        }

        let span = info_span!("load", datasets = jobs.len());
        let _guard = span.enter();

        let results: Vec<(String, std::result::Result<Option<CacheEntry>, DecodeError>)> = jobs
            .into_par_iter()
            .map(|job| {
                let result =
                    self.decode_file(&job.dataset, &job.path, job.previous_digest.as_deref());
                (job.dataset, result)
            })
            .collect();

        for (dataset, result) in results {
            let status = match result {
                Ok(Some(entry)) => {
                    let status = LoadStatus::Loaded {
                        records: entry.records,
                        confidence: entry.confidence,
                        shape: entry.index.shape(),
                        entries: entry.index.len(),
                        unmatched: entry.unmatched.clone(),
                    };
                    cache.replace(entry);
                    status
                }
                Ok(None) => LoadStatus::Unchanged,
                Err(err) => {
                    warn!(dataset = %dataset, kind = %err.kind(), "dataset failed: {err}");
                    LoadStatus::Failed(err)
                }
            };
            report.outcomes.push(DatasetOutcome { dataset, status });
        }
        report.outcomes.sort_by(|a, b| a.dataset.cmp(&b.dataset));

        info!(
            loaded = report.loaded(),
            failed = report.failures().count(),
            "load complete"
        );
        Ok(report)
    }

    /// Decodes one dump file into a cache entry.
    ///
    /// Returns `Ok(None)` when the file's digest equals `previous_digest`.
    pub fn decode_file(
        &self,
        dataset: &str,
        path: &Path,
        previous_digest: Option<&str>,
    ) -> std::result::Result<Option<CacheEntry>, DecodeError> {
        let bytes = std::fs::read(path).map_err(|source| {
            DecodeError::from_ingest(
                dataset,
                IngestError::FileRead {
                    path: path.to_path_buf(),
                    source,
                },
            )
        })?;
        let sha256 = sha256_hex(&bytes);
        if previous_digest == Some(sha256.as_str()) {
            debug!(dataset, "dump unchanged, keeping cached entry");
            return Ok(None);
        }
        let records = parse_dump(&bytes, path).map_err(|e| DecodeError::from_ingest(dataset, e))?;
        let schema = self
            .store
            .load(dataset)
            .map_err(|e| DecodeError::from_master(dataset, e))?;

        let decoder = Decoder::new(
            schema,
            self.anchors.for_dataset(dataset).to_vec(),
            self.options,
        )
        .with_dump_path(path);
        let result = decoder.decode(&records)?;

        let strategy = self.strategies.get(dataset).clone();
        let index = build_index(&strategy, &result.canonical_records);
        info!(
            dataset,
            records = result.record_count(),
            confidence = result.overall_confidence,
            shape = index.shape(),
            "dataset cached"
        );
        Ok(Some(CacheEntry {
            dataset: dataset.to_string(),
            index,
            strategy,
            sha256,
            confidence: result.overall_confidence,
            records: result.record_count(),
            unmatched: result.unmatched_canonical_fields,
        }))
    }
}
