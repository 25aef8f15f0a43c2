//! Alignment of expression and mutation data onto one patient axis
//!
//! Expression columns are renamed from RNA sample IDs to patient IDs and
//! sorted lexicographically; mutation calls are mapped from DNA sample IDs to
//! the same patients. Patients without a qualifying call keep an all-zero row.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use log::{debug, info, warn};
use ndarray::{Array2, Axis};

use crate::config::PrepConfig;
use crate::data::{AlignedCohort, ExpressionMatrix, MutationMatrix};
use crate::error::{Result, SubtypeError};
use crate::filter::{filter_genes, FilterReport, SymbolFilter};
use crate::io::{read_mutation_calls, read_raw_expression, read_sample_mapping, MutationCall, RawExpression, SampleMapping};

/// Output of the preparation step
#[derive(Debug, Clone)]
pub struct PreparedCohort {
    pub cohort: AlignedCohort,
    pub report: FilterReport,
}

/// Read the three raw inputs and align them
pub fn prepare_from_files<P: AsRef<Path>>(
    expression_path: P,
    mutations_path: P,
    mapping_path: P,
    config: &PrepConfig,
) -> Result<PreparedCohort> {
    config.validate()?;

    info!("Loading sample mapping from: {}", mapping_path.as_ref().display());
    let mapping = read_sample_mapping(&mapping_path, config)?;
    info!("  {} patients with RNA and DNA samples", mapping.len());

    info!("Loading expression from: {}", expression_path.as_ref().display());
    let raw = read_raw_expression(&expression_path, config, &mapping.rna_samples())?;
    info!("  {} genes, {} mapped samples", raw.n_genes(), raw.n_samples());

    info!("Loading mutation calls from: {}", mutations_path.as_ref().display());
    let calls = read_mutation_calls(&mutations_path, config)?;
    info!("  {} calls", calls.len());

    align_cohort(&raw, &calls, &mapping, config)
}

/// Align in-memory inputs into an `AlignedCohort`
pub fn align_cohort(
    raw: &RawExpression,
    calls: &[MutationCall],
    mapping: &SampleMapping,
    config: &PrepConfig,
) -> Result<PreparedCohort> {
    let mut report = FilterReport {
        input_genes: raw.n_genes(),
        ..Default::default()
    };

    // Patient axis: expression columns renamed to patients, sorted
    let mut columns: Vec<(String, usize)> = Vec::with_capacity(raw.n_samples());
    for (j, sample) in raw.sample_ids.iter().enumerate() {
        match mapping.patient_for_rna(sample) {
            Some(patient) => columns.push((patient.to_string(), j)),
            None => warn!("Expression sample {} has no patient mapping; dropped", sample),
        }
    }
    columns.sort();

    if columns.is_empty() {
        return Err(SubtypeError::PatientAxisMismatch {
            reason: "No patient shared between expression and mutation data".to_string(),
        });
    }

    let missing = mapping.len() - columns.len();
    if missing > 0 {
        warn!("{} mapped patients have no expression column; dropped", missing);
    }

    let patient_ids: Vec<String> = columns.iter().map(|(p, _)| p.clone()).collect();
    let column_order: Vec<usize> = columns.iter().map(|&(_, j)| j).collect();

    // Symbol and biotype filter
    let symbol_filter = SymbolFilter::new(&config.protein_coding_biotype)?;
    let kept_rows: Vec<usize> = (0..raw.n_genes())
        .filter(|&i| symbol_filter.keep(&raw.symbols[i], &raw.biotypes[i]))
        .collect();
    report.removed_by_symbol = raw.n_genes() - kept_rows.len();
    info!(
        "Symbol filter: {} -> {} protein-coding genes with clean symbols",
        raw.n_genes(),
        kept_rows.len()
    );

    let values = raw
        .values
        .select(Axis(0), &kept_rows)
        .select(Axis(1), &column_order);
    let gene_ids: Vec<String> = kept_rows.iter().map(|&i| raw.symbols[i].clone()).collect();

    // A repeated symbol surfaces here as DuplicateGene
    let expression = ExpressionMatrix::new(values, gene_ids, patient_ids.clone())?;
    let filtered = filter_genes(&expression, config, &mut report)?;
    let scaled = filtered.z_scaled()?;

    let mutations = build_subtype_matrix(&patient_ids, calls, mapping, config)?;

    let cohort = AlignedCohort::new(filtered, scaled, mutations)?;
    info!(
        "Aligned cohort: {} genes x {} patients, {} subtypes",
        cohort.n_genes(),
        cohort.n_patients(),
        cohort.mutations().n_subtypes()
    );

    Ok(PreparedCohort { cohort, report })
}

/// Build the patient x subtype 0/1 matrix for an already ordered patient axis
///
/// A gene becomes a subtype when at least `ceil(min_subtype_fraction * n)`
/// distinct patients carry a qualifying call. Columns are ordered by
/// descending patient count, ties by symbol.
pub fn build_subtype_matrix(
    patient_ids: &[String],
    calls: &[MutationCall],
    mapping: &SampleMapping,
    config: &PrepConfig,
) -> Result<MutationMatrix> {
    let position: HashMap<&str, usize> = patient_ids
        .iter()
        .enumerate()
        .map(|(i, p)| (p.as_str(), i))
        .collect();

    let mut mutated: HashMap<&str, BTreeSet<usize>> = HashMap::new();
    let mut unmapped = 0usize;
    for call in calls.iter().filter(|c| c.qualifies(config.min_vaf)) {
        let row = mapping
            .patient_for_dna(&call.sample_id)
            .and_then(|patient| position.get(patient));
        match row {
            Some(&row) => {
                mutated.entry(call.symbol.as_str()).or_default().insert(row);
            }
            None => unmapped += 1,
        }
    }
    if unmapped > 0 {
        debug!("{} qualifying calls fall outside the patient axis", unmapped);
    }

    let min_patients = config.min_subtype_patients(patient_ids.len());
    let mut panel: Vec<(&str, &BTreeSet<usize>)> = mutated
        .iter()
        .filter(|(_, rows)| rows.len() >= min_patients)
        .map(|(&gene, rows)| (gene, rows))
        .collect();
    panel.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));

    info!(
        "Subtype panel: {} of {} mutated genes reach {} patients ({:.1}% of {})",
        panel.len(),
        mutated.len(),
        min_patients,
        config.min_subtype_fraction * 100.0,
        patient_ids.len()
    );

    if panel.is_empty() {
        return Err(SubtypeError::EmptyData {
            reason: format!("No mutated gene is carried by at least {} patients", min_patients),
        });
    }

    let mut calls_matrix = Array2::<u8>::zeros((patient_ids.len(), panel.len()));
    for (j, (_, rows)) in panel.iter().enumerate() {
        for &row in rows.iter() {
            calls_matrix[[row, j]] = 1;
        }
    }

    let subtypes: Vec<String> = panel.iter().map(|(gene, _)| gene.to_string()).collect();
    let matrix = MutationMatrix::new(calls_matrix, patient_ids.to_vec(), subtypes)?;

    for prev in matrix.prevalence() {
        debug!("  {}: {} patients ({:.1}%)", prev.subtype, prev.n_mutated, prev.fraction * 100.0);
    }

    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::check_patient_axis;
    use crate::io::MappingEntry;
    use ndarray::array;

    fn mapping(n: usize) -> SampleMapping {
        let entries = (1..=n)
            .map(|i| MappingEntry {
                patient_id: format!("P{}", i),
                rna_sample_id: format!("R{}", i),
                dna_sample_id: format!("D{}", i),
            })
            .collect();
        SampleMapping::new(entries).unwrap()
    }

    fn call(sample: &str, symbol: &str) -> MutationCall {
        MutationCall {
            sample_id: sample.to_string(),
            symbol: symbol.to_string(),
            vaf: Some(0.4),
        }
    }

    fn raw() -> RawExpression {
        RawExpression {
            symbols: vec!["FLT3".into(), "C1orf112".into(), "HLA-A".into(), "MEIS1".into(), "FLAT".into()],
            biotypes: vec!["protein_coding".into(); 5],
            // columns deliberately out of patient order
            sample_ids: vec!["R4".into(), "R2".into(), "R1".into(), "R3".into()],
            values: array![
                [2.0, 6.0, 8.0, 3.0],
                [5.0, 5.0, 5.0, 9.0],
                [5.0, 5.0, 5.0, 9.0],
                [9.0, 1.0, 4.0, 7.0],
                [3.0, 3.0, 3.0, 3.0],
            ],
        }
    }

    #[test]
    fn test_align_cohort_orders_patients_and_filters() {
        let calls = vec![call("D1", "NPM1"), call("D2", "NPM1"), call("D3", "TET2")];
        let prepared = align_cohort(&raw(), &calls, &mapping(4), &PrepConfig::default()).unwrap();
        let cohort = &prepared.cohort;

        assert_eq!(cohort.patient_ids(), &["P1", "P2", "P3", "P4"]);
        check_patient_axis(cohort.raw().patient_ids(), cohort.mutations().patient_ids()).unwrap();

        assert_eq!(cohort.raw().gene_ids(), &["FLT3", "MEIS1"]);
        // P1 was column R1 = 8.0
        assert_eq!(cohort.raw().gene("FLT3").unwrap().to_vec(), vec![8.0, 6.0, 3.0, 2.0]);

        assert_eq!(prepared.report.input_genes, 5);
        assert_eq!(prepared.report.removed_by_symbol, 2);
        assert_eq!(prepared.report.removed_low_variance, 1);
        assert_eq!(prepared.report.kept_genes, 2);
    }

    #[test]
    fn test_patient_without_calls_is_all_zero() {
        let calls = vec![call("D1", "NPM1"), call("D2", "NPM1"), call("D2", "FLT3")];
        let matrix = build_subtype_matrix(
            &["P1".to_string(), "P2".to_string(), "P3".to_string()],
            &calls,
            &mapping(3),
            &PrepConfig::default(),
        )
        .unwrap();

        let p3 = matrix.patient_row(2);
        assert!(p3.iter().all(|&v| v == 0));
        assert_eq!(matrix.n_patients(), 3);
    }

    #[test]
    fn test_subtype_prevalence_filter_and_order() {
        let calls = vec![
            call("D1", "TET2"),
            call("D2", "TET2"),
            call("D1", "NPM1"),
            call("D2", "NPM1"),
            call("D2", "NPM1"), // second call on the same patient counts once
            call("D3", "NPM1"),
            call("D4", "RARE"),
        ];
        let config = PrepConfig {
            min_subtype_fraction: 0.5,
            ..Default::default()
        };
        let patients: Vec<String> = (1..=4).map(|i| format!("P{}", i)).collect();
        let matrix = build_subtype_matrix(&patients, &calls, &mapping(4), &config).unwrap();

        assert_eq!(matrix.subtypes(), &["NPM1", "TET2"]);
        assert_eq!(matrix.prevalence()[0].n_mutated, 3);
    }

    #[test]
    fn test_low_vaf_calls_do_not_qualify() {
        let mut weak = call("D1", "NPM1");
        weak.vaf = Some(0.01);
        let config = PrepConfig {
            min_vaf: 0.05,
            min_subtype_fraction: 0.0,
            ..Default::default()
        };
        let result = build_subtype_matrix(&["P1".to_string()], &[weak], &mapping(1), &config);
        assert!(matches!(result, Err(SubtypeError::EmptyData { .. })));
    }

    #[test]
    fn test_duplicate_symbol_is_fatal() {
        let mut raw = raw();
        raw.symbols[3] = "FLT3".to_string();
        let calls = vec![call("D1", "NPM1")];
        let err = align_cohort(&raw, &calls, &mapping(4), &PrepConfig::default()).unwrap_err();
        assert!(matches!(err, SubtypeError::DuplicateGene { .. }));
    }

    #[test]
    fn test_no_shared_patient_is_fatal() {
        let calls = vec![call("D1", "NPM1")];
        let err = align_cohort(&raw(), &calls, &SampleMapping::default(), &PrepConfig::default()).unwrap_err();
        assert!(matches!(err, SubtypeError::PatientAxisMismatch { .. }));
    }
}
