//! Boxplot bundle: raw expression by mutation status for significant subtypes

use serde::{Deserialize, Serialize};

use super::index::ValidatedGene;
use crate::data::AlignedCohort;
use crate::error::{Result, SubtypeError};
use crate::results::{StatCell, StatTable};
use crate::testing::{Direction, Significance};

/// Group membership of a patient for one subtype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationStatus {
    Mutated,
    Unmutated,
}

impl From<u8> for MutationStatus {
    fn from(call: u8) -> Self {
        if call == 1 {
            MutationStatus::Mutated
        } else {
            MutationStatus::Unmutated
        }
    }
}

/// One long-form observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxplotRecord {
    pub patient: String,
    pub subtype: String,
    pub status: MutationStatus,
    pub expression: f64,
}

/// Annotation for one facet of the boxplot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxplotPanel {
    pub subtype: String,
    /// Mann-Whitney U of the mutated group
    pub statistic: f64,
    pub pvalue: f64,
    pub padj: f64,
    pub significance: Significance,
    /// Adjusted p-value with label, e.g. `0.0012**`
    pub display: String,
    pub direction: Direction,
    pub n_mutated: usize,
    pub n_unmutated: usize,
}

/// Boxplot data for a gene with at least one significant subtype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxplotBundle {
    pub gene: String,
    /// Number of significant subtypes; drives the renderer's layout size
    pub n_significant: usize,
    /// One panel per significant subtype, in subtype column order
    pub panels: Vec<BoxplotPanel>,
    /// Raw expression, subtype-major then patient-axis order
    pub records: Vec<BoxplotRecord>,
}

/// Result of a boxplot query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BoxplotResult {
    Significant(BoxplotBundle),
    /// Valid gene with no significant subtype; not an error
    NoSignificantResults { gene: String },
}

impl BoxplotResult {
    /// Number of significant subtypes (0 for the empty result)
    pub fn n_significant(&self) -> usize {
        match self {
            BoxplotResult::Significant(bundle) => bundle.n_significant,
            BoxplotResult::NoSignificantResults { .. } => 0,
        }
    }
}

/// Build the boxplot bundle from the raw (unscaled) expression
pub fn boxplot_bundle(
    cohort: &AlignedCohort,
    table: &StatTable,
    gene: ValidatedGene<'_>,
) -> Result<BoxplotResult> {
    let gene_id = gene.as_str();
    let row = table.row(gene_id).ok_or_else(|| SubtypeError::IncompleteTable {
        reason: format!("no stat row for gene '{}'", gene_id),
    })?;
    let expression = cohort.raw().gene(gene_id).ok_or_else(|| SubtypeError::IncompleteTable {
        reason: format!("no expression row for gene '{}'", gene_id),
    })?;

    let mutations = cohort.mutations();
    let patient_ids = cohort.patient_ids();

    let mut panels = Vec::new();
    let mut records = Vec::new();

    for (j, (subtype, cell)) in mutations.subtypes().iter().zip(row.iter()).enumerate() {
        let StatCell::Computed {
            statistic,
            n_mutated,
            n_unmutated,
            pvalue,
            padj,
            significance,
            direction,
        } = *cell
        else {
            continue;
        };
        if !significance.is_significant() {
            continue;
        }

        panels.push(BoxplotPanel {
            subtype: subtype.clone(),
            statistic,
            pvalue,
            padj,
            significance,
            display: cell.display().unwrap_or_default(),
            direction,
            n_mutated,
            n_unmutated,
        });

        let column = mutations.subtype_column(j);
        records.extend(
            patient_ids
                .iter()
                .zip(expression.iter())
                .zip(column.iter())
                .map(|((patient, &value), &call)| BoxplotRecord {
                    patient: patient.clone(),
                    subtype: subtype.clone(),
                    status: MutationStatus::from(call),
                    expression: value,
                }),
        );
    }

    if panels.is_empty() {
        return Ok(BoxplotResult::NoSignificantResults {
            gene: gene_id.to_string(),
        });
    }

    Ok(BoxplotResult::Significant(BoxplotBundle {
        gene: gene_id.to_string(),
        n_significant: panels.len(),
        panels,
        records,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ExpressionMatrix, MutationMatrix};
    use crate::lookup::AutocompleteIndex;
    use crate::results::build_stat_table;
    use ndarray::array;

    fn cohort() -> AlignedCohort {
        let patients: Vec<String> = (1..=6).map(|i| format!("P{}", i)).collect();
        let raw = ExpressionMatrix::new(
            array![
                [5.0, 6.0, 7.0, 1.0, 2.0, 3.0],
                [2.0, 1.0, 3.0, 2.5, 1.5, 3.5],
            ],
            vec!["G1".into(), "G2".into()],
            patients.clone(),
        )
        .unwrap();
        let scaled = raw.z_scaled().unwrap();
        let mutations = MutationMatrix::new(
            array![[1], [1], [1], [0], [0], [0]],
            patients,
            vec!["NPM1".into()],
        )
        .unwrap();
        AlignedCohort::new(raw, scaled, mutations).unwrap()
    }

    #[test]
    fn test_significant_gene_long_form() {
        let cohort = cohort();
        let table = build_stat_table(&cohort).unwrap();
        let index = AutocompleteIndex::new(cohort.raw().gene_ids().to_vec());

        let result = boxplot_bundle(&cohort, &table, index.validate("G1").unwrap()).unwrap();
        assert_eq!(result.n_significant(), 1);

        let bundle = match result {
            BoxplotResult::Significant(bundle) => bundle,
            other => panic!("expected significant result, got {:?}", other),
        };
        assert_eq!(bundle.panels[0].subtype, "NPM1");
        assert_eq!(bundle.panels[0].statistic, 9.0);
        assert_eq!((bundle.panels[0].n_mutated, bundle.panels[0].n_unmutated), (3, 3));
        assert_eq!(bundle.panels[0].display, "0.05*");
        assert_eq!(bundle.panels[0].direction, Direction::Up);
        assert_eq!(bundle.records.len(), 6);

        // raw values, not z-scores
        let mutated: Vec<f64> = bundle
            .records
            .iter()
            .filter(|r| r.status == MutationStatus::Mutated)
            .map(|r| r.expression)
            .collect();
        assert_eq!(mutated, vec![5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_no_significant_results_is_explicit() {
        let cohort = cohort();
        let table = build_stat_table(&cohort).unwrap();
        let index = AutocompleteIndex::new(cohort.raw().gene_ids().to_vec());

        let result = boxplot_bundle(&cohort, &table, index.validate("G2").unwrap()).unwrap();
        assert_eq!(
            result,
            BoxplotResult::NoSignificantResults {
                gene: "G2".to_string()
            }
        );
        assert_eq!(result.n_significant(), 0);
    }

    #[test]
    fn test_serialized_tag() {
        let result = BoxplotResult::NoSignificantResults { gene: "G2".to_string() };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"status":"no_significant_results","gene":"G2"}"#);
    }
}
