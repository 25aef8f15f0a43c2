//! Heatmap / oncoprint bundle for one gene

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::index::ValidatedGene;
use crate::data::AlignedCohort;
use crate::error::{Result, SubtypeError};
use crate::results::{StatCell, StatTable};
use crate::testing::Significance;

/// One annotation row of the oncoprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtypeTrack {
    pub subtype: String,
    /// Subtype name, suffixed with the adjusted p-value when significant
    pub label: String,
    pub padj: Option<f64>,
    pub significance: Significance,
    /// 0/1 calls in the bundle's patient order
    pub calls: Vec<u8>,
}

/// Everything a renderer needs to draw the heatmap for one gene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapBundle {
    pub gene: String,
    /// Patients sorted ascending by z-scaled expression
    pub patients: Vec<String>,
    /// Z-scaled expression in `patients` order
    pub expression: Vec<f64>,
    /// One track per subtype, in subtype column order
    pub tracks: Vec<SubtypeTrack>,
}

impl HeatmapBundle {
    /// The reordered patient x subtype matrix
    pub fn calls_matrix(&self) -> Array2<u8> {
        let mut matrix = Array2::zeros((self.patients.len(), self.tracks.len()));
        for (j, track) in self.tracks.iter().enumerate() {
            for (i, &call) in track.calls.iter().enumerate() {
                matrix[[i, j]] = call;
            }
        }
        matrix
    }
}

/// Track label: `NPM1` or `NPM1 (padj 0.0012**)`
pub fn track_label(subtype: &str, cell: &StatCell) -> String {
    match cell.display() {
        Some(display) if cell.is_significant() => format!("{} (padj {})", subtype, display),
        _ => subtype.to_string(),
    }
}

/// Build the heatmap bundle
pub fn heatmap_bundle(cohort: &AlignedCohort, table: &StatTable, gene: ValidatedGene<'_>) -> Result<HeatmapBundle> {
    let gene_id = gene.as_str();
    let row = table.row(gene_id).ok_or_else(|| SubtypeError::IncompleteTable {
        reason: format!("no stat row for gene '{}'", gene_id),
    })?;
    let scaled = cohort.scaled().gene(gene_id).ok_or_else(|| SubtypeError::IncompleteTable {
        reason: format!("no expression row for gene '{}'", gene_id),
    })?;

    // Stable sort: ties keep patient-axis order
    let mut order: Vec<usize> = (0..scaled.len()).collect();
    order.sort_by(|&a, &b| scaled[a].total_cmp(&scaled[b]));

    let patient_ids = cohort.patient_ids();
    let mutations = cohort.mutations();

    let tracks = mutations
        .subtypes()
        .iter()
        .zip(row.iter())
        .enumerate()
        .map(|(j, (subtype, cell))| {
            let column = mutations.subtype_column(j);
            SubtypeTrack {
                subtype: subtype.clone(),
                label: track_label(subtype, cell),
                padj: cell.padj(),
                significance: cell.significance(),
                calls: order.iter().map(|&i| column[i]).collect(),
            }
        })
        .collect();

    Ok(HeatmapBundle {
        gene: gene_id.to_string(),
        patients: order.iter().map(|&i| patient_ids[i].clone()).collect(),
        expression: order.iter().map(|&i| scaled[i]).collect(),
        tracks,
    })
}
