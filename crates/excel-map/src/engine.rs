//! Decoder: anchors, structural matching, confidence gate, renaming.

use std::path::PathBuf;

use tracing::{debug, info, info_span, warn};

use excel_ingest::{fingerprint_records, nested_records};
use excel_model::{
    DecodeResult, FieldDescriptor, KeyMapping, MasterSchema, MatchMethod, Record,
};

use crate::anchor::{Anchor, AnchorOutcome, resolve_anchors};
use crate::confidence::{ConfidenceOutcome, Evaluation, FieldOutcome, evaluate};
use crate::error::{DecodeError, RejectedKey};
use crate::options::DecodeOptions;
use crate::rename::{MappingTree, rename_records};
use crate::structural::match_structural;

/// Matching result before the confidence gate is applied.
#[derive(Debug, Clone)]
pub struct DecodePlan {
    pub dataset: String,
    pub tree: MappingTree,
    pub anchors: Vec<AnchorOutcome>,
    pub fields: Vec<FieldOutcome>,
    pub evaluation: Evaluation,
    /// Unclaimed top-level keys, sorted by name.
    pub rejected: Vec<RejectedKey>,
}

/// Recovers canonical keys of one dataset's dumps.
///
/// The master schema and its anchors are supplied by the caller. Decoding is
/// deterministic: the same dump always produces the same mapping.
///
/// # Example
///
/// ```ignore
/// use excel_map::{AnchorTable, DecodeOptions, Decoder};
///
/// let anchors = AnchorTable::builtin();
/// let decoder = Decoder::new(
///     schema,
///     anchors.for_dataset("WeaponExcelConfigData").to_vec(),
///     DecodeOptions::default(),
/// );
/// let result = decoder.decode(&records)?;
/// ```
#[derive(Debug, Clone)]
pub struct Decoder {
    schema: MasterSchema,
    anchors: Vec<Anchor>,
    options: DecodeOptions,
    dump_path: Option<PathBuf>,
}

impl Decoder {
    pub fn new(schema: MasterSchema, anchors: Vec<Anchor>, options: DecodeOptions) -> Self {
        Self {
            schema,
            anchors,
            options,
            dump_path: None,
        }
    }

    /// Attaches the dump path to errors raised by this decoder.
    #[must_use]
    pub fn with_dump_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dump_path = Some(path.into());
        self
    }

    pub fn dataset(&self) -> &str {
        &self.schema.dataset
    }

    pub fn schema(&self) -> &MasterSchema {
        &self.schema
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Builds the key mapping and scores it without gating.
    pub fn plan(&self, records: &[Record]) -> DecodePlan {
        let observed = fingerprint_records(records, self.options.fingerprint);

        let mut mapping = KeyMapping::new();
        let anchors = resolve_anchors(records, &self.schema, &self.anchors, &mut mapping);
        let report = match_structural(
            self.schema.fields(),
            &observed,
            &mut mapping,
            self.options.structural_floor,
        );

        let mut tree = MappingTree::new(mapping);
        let mut fields = Vec::new();
        self.decode_level(records, self.schema.fields(), "", &mut tree, &mut fields);

        let evaluation = evaluate(
            &fields,
            &self.options.thresholds,
            self.options.accept_partial,
        );
        DecodePlan {
            dataset: self.schema.dataset.clone(),
            tree,
            anchors,
            fields,
            evaluation,
            rejected: report.rejected,
        }
    }

    /// Decodes a dump into canonical records.
    ///
    /// Rejects the decode when the overall confidence falls short of the
    /// configured thresholds.
    pub fn decode(&self, records: &[Record]) -> Result<DecodeResult, DecodeError> {
        let span = info_span!("decode", dataset = %self.schema.dataset, records = records.len());
        let _guard = span.enter();

        let plan = self.plan(records);
        let evaluation = &plan.evaluation;
        debug!(
            anchored = plan.tree.mapping.count_by_method(MatchMethod::Anchor),
            structural = plan.tree.mapping.count_by_method(MatchMethod::Structural),
            coverage = evaluation.coverage,
            weakest = ?evaluation.weakest,
            "keys matched"
        );

        match evaluation.outcome {
            ConfidenceOutcome::FullMatch | ConfidenceOutcome::PartialMatch => {}
            ConfidenceOutcome::PatternMismatch => {
                warn!(confidence = evaluation.overall, "pattern mismatch");
                return Err(DecodeError::PatternMismatch {
                    dataset: plan.dataset,
                    achieved: evaluation.overall,
                    floor: self.options.thresholds.pattern_floor,
                    dump_path: self.dump_path.clone(),
                });
            }
            ConfidenceOutcome::LowConfidence => {
                warn!(confidence = evaluation.overall, "confidence below threshold");
                if evaluation.unresolved_required.is_empty() {
                    return Err(DecodeError::LowConfidence {
                        dataset: plan.dataset,
                        achieved: evaluation.overall,
                        required: self.options.thresholds.acceptance,
                        dump_path: self.dump_path.clone(),
                    });
                }
                let mut rejected = plan.rejected;
                rejected.truncate(self.options.rejected_sample);
                return Err(DecodeError::KeyMatchingFailed {
                    dataset: plan.dataset,
                    unresolved: evaluation.unresolved_required.clone(),
                    rejected,
                    achieved: evaluation.overall,
                    dump_path: self.dump_path.clone(),
                });
            }
        }

        if !evaluation.unmatched.is_empty() {
            warn!(unmatched = ?evaluation.unmatched, "accepted with unmatched fields");
        }
        let canonical_records = rename_records(records, &plan.tree);
        info!(
            confidence = evaluation.overall,
            outcome = evaluation.outcome.as_str(),
            "dataset decoded"
        );
        Ok(DecodeResult {
            dataset: plan.dataset,
            canonical_records,
            nested_mappings: plan.tree.nested_mappings(),
            mapping: plan.tree.mapping,
            overall_confidence: evaluation.overall,
            unmatched_canonical_fields: evaluation.unmatched.clone(),
        })
    }

    /// Records field outcomes for one level and decodes nested children of
    /// matched fields.
    ///
    /// Every descendant of a nested field gets an outcome, so the required
    /// count is fixed by the schema and not by how much of the dump matched.
    fn decode_level(
        &self,
        records: &[Record],
        fields: &[FieldDescriptor],
        prefix: &str,
        tree: &mut MappingTree,
        outcomes: &mut Vec<FieldOutcome>,
    ) {
        for field in fields {
            let path = join_path(prefix, &field.canonical_name);
            let assignment = tree.mapping.assignment_for(&field.canonical_name).cloned();
            outcomes.push(FieldOutcome::new(
                path.clone(),
                field.required,
                assignment.as_ref().map(|a| a.confidence),
            ));

            if !field.has_nested_fields() {
                continue;
            }
            let Some(assignment) = assignment else {
                push_unmatched(&field.children, &path, outcomes);
                continue;
            };
            let nested = nested_records(records, &assignment.obfuscated_key);
            if nested.is_empty() {
                debug!(field = %path, "no nested records to decode");
                push_unmatched(&field.children, &path, outcomes);
                continue;
            }
            let observed = fingerprint_records(&nested, self.options.fingerprint);
            let mut child_mapping = KeyMapping::new();
            match_structural(
                &field.children,
                &observed,
                &mut child_mapping,
                self.options.structural_floor,
            );
            let mut child = MappingTree::new(child_mapping);
            self.decode_level(&nested, &field.children, &path, &mut child, outcomes);
            tree.children.insert(field.canonical_name.clone(), child);
        }
    }
}

/// Marks a subtree as unresolved.
fn push_unmatched(fields: &[FieldDescriptor], prefix: &str, outcomes: &mut Vec<FieldOutcome>) {
    for field in fields {
        let path = join_path(prefix, &field.canonical_name);
        outcomes.push(FieldOutcome::new(path.clone(), field.required, None));
        if field.has_nested_fields() {
            push_unmatched(&field.children, &path, outcomes);
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}
