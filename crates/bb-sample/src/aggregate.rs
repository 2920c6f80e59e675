//! Multi-stage aggregation and normalization arithmetic.

use bb_core::{Error, Result, StageRecord};

use crate::types::{Sample, SampleFragment};

/// A stage record paired with the manifest path it was read from.
#[derive(Debug, Clone)]
pub struct SourcedStage {
    /// The registered stage.
    pub record: StageRecord,
    /// Manifest path, carried into the fragment for provenance.
    pub source_path: String,
}

/// Normalization factor reconciling an observed POT sum with a target.
///
/// Returns `1.0` ("no rescaling") when either side is non-positive: a
/// missing or empty exposure is treated as already normalized rather than
/// as a division-by-zero failure.
pub fn compute_normalization(observed_pot: f64, target_pot: f64) -> f64 {
    if observed_pot <= 0.0 || target_pot <= 0.0 {
        return 1.0;
    }
    target_pot / observed_pot
}

/// Fold one or more stages into a [`Sample`].
///
/// The first stage's kind and beam are adopted for the sample; any later
/// stage disagreeing on either is a consistency error. Aggregate sums are
/// plain additions over fragments, and the sample-level normalization is
/// computed from the aggregate sums — summing before dividing, never
/// averaging the per-fragment factors.
pub fn aggregate(sample_name: &str, stages: &[SourcedStage]) -> Result<Sample> {
    if stages.is_empty() {
        return Err(Error::Input("sample aggregation requires at least one stage".into()));
    }

    let first = &stages[0].record;
    let mut out = Sample {
        sample_name: sample_name.to_string(),
        kind: first.kind,
        beam: first.beam,
        fragments: Vec::with_capacity(stages.len()),
        subrun_pot_sum: 0.0,
        db_tortgt_pot_sum: 0.0,
        db_tor101_pot_sum: 0.0,
        normalization: 1.0,
        normalized_pot_sum: 0.0,
    };

    for stage in stages {
        let record = &stage.record;
        if record.kind != out.kind {
            return Err(Error::Consistency(format!(
                "sample kind mismatch for stage '{}' from {}: {} != {}",
                record.cfg.stage_name, stage.source_path, record.kind, out.kind
            )));
        }
        if record.beam != out.beam {
            return Err(Error::Consistency(format!(
                "beam mode mismatch for stage '{}' from {}: {} != {}",
                record.cfg.stage_name, stage.source_path, record.beam, out.beam
            )));
        }

        let fragment = make_fragment(stage);
        out.subrun_pot_sum += fragment.subrun_pot_sum;
        out.db_tortgt_pot_sum += fragment.db_tortgt_pot;
        out.db_tor101_pot_sum += fragment.db_tor101_pot;
        out.fragments.push(fragment);
    }

    out.normalization = compute_normalization(out.subrun_pot_sum, out.db_tortgt_pot_sum);
    out.normalized_pot_sum = out.subrun_pot_sum * out.normalization;

    tracing::info!(
        sample = sample_name,
        fragments = out.fragments.len(),
        pot_sum = out.subrun_pot_sum,
        db_tortgt_pot_sum = out.db_tortgt_pot_sum,
        normalization = out.normalization,
        "sample aggregated"
    );
    Ok(out)
}

fn make_fragment(stage: &SourcedStage) -> SampleFragment {
    let record = &stage.record;
    let subrun_pot_sum = record.scan.pot_sum;
    let db_tortgt_pot = record.exposure.tortgt_sum;
    let normalization = compute_normalization(subrun_pot_sum, db_tortgt_pot);
    SampleFragment {
        fragment_name: record.cfg.stage_name.clone(),
        source_path: stage.source_path.clone(),
        subrun_pot_sum,
        db_tortgt_pot,
        db_tor101_pot: record.exposure.tor101_sum,
        normalization,
        normalized_pot_sum: subrun_pot_sum * normalization,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_core::{BeamMode, ExposureSums, SampleKind, ScanResult, StageConfig};

    fn stage(name: &str, kind: SampleKind, beam: BeamMode, pot: f64, tortgt: f64) -> SourcedStage {
        SourcedStage {
            record: StageRecord {
                cfg: StageConfig {
                    stage_name: name.to_string(),
                    filelist_path: String::new(),
                },
                n_input_files: 1,
                kind,
                beam,
                scan: ScanResult { pot_sum: pot, ..Default::default() },
                exposure: ExposureSums { tortgt_sum: tortgt, ..Default::default() },
            },
            source_path: format!("/manifests/{name}.sqlite"),
        }
    }

    #[test]
    fn normalization_degenerate_inputs_give_unity() {
        assert_eq!(compute_normalization(0.0, 5.0), 1.0);
        assert_eq!(compute_normalization(10.0, 0.0), 1.0);
        assert_eq!(compute_normalization(-1.0, 5.0), 1.0);
        assert_eq!(compute_normalization(10.0, -5.0), 1.0);
        assert_eq!(compute_normalization(10.0, 25.0), 2.5);
    }

    #[test]
    fn aggregate_sums_before_dividing() {
        let stages = vec![
            stage("a", SampleKind::Data, BeamMode::Bnb, 10.0, 20.0),
            stage("b", SampleKind::Data, BeamMode::Bnb, 5.0, 5.0),
        ];
        let sample = aggregate("combined", &stages).unwrap();

        assert_eq!(sample.subrun_pot_sum, 15.0);
        assert_eq!(sample.db_tortgt_pot_sum, 25.0);
        // 25/15, not the average of the per-fragment factors 2.0 and 1.0.
        assert!((sample.normalization - 25.0 / 15.0).abs() < 1e-12);
        assert!((sample.normalized_pot_sum - 25.0).abs() < 1e-12);

        assert_eq!(sample.fragments[0].normalization, 2.0);
        assert_eq!(sample.fragments[1].normalization, 1.0);
    }

    #[test]
    fn kind_mismatch_is_fatal() {
        let stages = vec![
            stage("a", SampleKind::Data, BeamMode::Bnb, 10.0, 20.0),
            stage("b", SampleKind::Unknown, BeamMode::Bnb, 5.0, 5.0),
        ];
        let err = aggregate("combined", &stages).unwrap_err();
        assert!(err.to_string().contains("kind mismatch"));
    }

    #[test]
    fn beam_mismatch_is_fatal() {
        let stages = vec![
            stage("a", SampleKind::Data, BeamMode::Bnb, 10.0, 20.0),
            stage("b", SampleKind::Data, BeamMode::Numi, 5.0, 5.0),
        ];
        assert!(aggregate("combined", &stages).is_err());
    }

    #[test]
    fn empty_input_is_fatal() {
        let err = aggregate("combined", &[]).unwrap_err();
        assert!(err.to_string().contains("at least one stage"));
    }
}
