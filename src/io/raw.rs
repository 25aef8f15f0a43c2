//! Readers for the raw offline inputs
//!
//! Expression table (genes x sequencing samples with symbol and biotype
//! columns), mutation call list and the clinical sample mapping. Tab and comma
//! delimiters are both accepted, detected from the header line.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, warn};
use ndarray::Array2;

use crate::config::PrepConfig;
use crate::error::{Result, SubtypeError};

/// Detect the delimiter from the first line of a file
pub(crate) fn detect_delimiter<P: AsRef<Path>>(path: P) -> Result<u8> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut header = String::new();
    reader.read_line(&mut header)?;
    if header.trim().is_empty() {
        return Err(SubtypeError::EmptyData {
            reason: "Empty input file".to_string(),
        });
    }
    Ok(if header.contains('\t') { b'\t' } else { b',' })
}

/// Open a delimited file with a header row
pub(crate) fn open_table<P: AsRef<Path>>(path: P) -> Result<csv::Reader<File>> {
    let delimiter = detect_delimiter(&path)?;
    Ok(csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path)?)
}

/// Position of a named column in a header, or an error naming the file role
fn column_index(headers: &csv::StringRecord, name: &str, role: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| SubtypeError::InvalidInput {
            reason: format!("{} file has no '{}' column", role, name),
        })
}

fn is_missing(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("na") || value.eq_ignore_ascii_case("nan")
}

/// Annotated expression table before any filtering
#[derive(Debug, Clone)]
pub struct RawExpression {
    /// Gene symbol per row
    pub symbols: Vec<String>,
    /// Biotype per row
    pub biotypes: Vec<String>,
    /// Sequencing sample ID per column
    pub sample_ids: Vec<String>,
    /// Log2-scale normalized values (genes x samples)
    pub values: Array2<f64>,
}

impl RawExpression {
    pub fn n_genes(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.values.ncols()
    }
}

/// Read the raw expression table
///
/// Only columns named in `samples` are read as values; every other column is
/// annotation and ignored.
pub fn read_raw_expression<P: AsRef<Path>>(
    path: P,
    config: &PrepConfig,
    samples: &HashSet<String>,
) -> Result<RawExpression> {
    let mut reader = open_table(path)?;
    let headers = reader.headers()?.clone();

    let symbol_col = column_index(&headers, &config.symbol_column, "Expression")?;
    let biotype_col = column_index(&headers, &config.biotype_column, "Expression")?;

    let sample_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| samples.contains(*h))
        .map(|(i, h)| (i, h.to_string()))
        .collect();
    debug!(
        "Expression header: {} columns, {} mapped samples",
        headers.len(),
        sample_cols.len()
    );

    if sample_cols.is_empty() {
        return Err(SubtypeError::EmptyData {
            reason: "No expression columns match a mapped RNA sample".to_string(),
        });
    }

    let mut symbols = Vec::new();
    let mut biotypes = Vec::new();
    let mut data: Vec<f64> = Vec::new();

    for record in reader.records() {
        let record = record?;
        symbols.push(record.get(symbol_col).unwrap_or_default().to_string());
        biotypes.push(record.get(biotype_col).unwrap_or_default().to_string());

        for (col, sample) in &sample_cols {
            let field = record.get(*col).unwrap_or_default();
            let value = field.parse::<f64>().map_err(|_| SubtypeError::InvalidMatrix {
                reason: format!(
                    "Invalid expression value '{}' for sample {} (line {})",
                    field,
                    sample,
                    record.position().map_or(0, |p| p.line())
                ),
            })?;
            data.push(value);
        }
    }

    if symbols.is_empty() {
        return Err(SubtypeError::EmptyData {
            reason: "No genes found in expression file".to_string(),
        });
    }

    let values = Array2::from_shape_vec((symbols.len(), sample_cols.len()), data).map_err(|e| {
        SubtypeError::InvalidMatrix {
            reason: e.to_string(),
        }
    })?;

    Ok(RawExpression {
        symbols,
        biotypes,
        sample_ids: sample_cols.into_iter().map(|(_, s)| s).collect(),
        values,
    })
}

/// One row of the mutation call list
#[derive(Debug, Clone, PartialEq)]
pub struct MutationCall {
    pub sample_id: String,
    pub symbol: String,
    pub vaf: Option<f64>,
}

impl MutationCall {
    /// A call qualifies when its VAF reaches `min_vaf`; unknown VAF only passes a zero threshold
    pub fn qualifies(&self, min_vaf: f64) -> bool {
        match self.vaf {
            Some(vaf) => vaf >= min_vaf,
            None => min_vaf <= 0.0,
        }
    }
}

/// Read the mutation call list
pub fn read_mutation_calls<P: AsRef<Path>>(path: P, config: &PrepConfig) -> Result<Vec<MutationCall>> {
    let mut reader = open_table(path)?;
    let headers = reader.headers()?.clone();

    let sample_col = column_index(&headers, &config.sample_column, "Mutation")?;
    let gene_col = column_index(&headers, &config.gene_column, "Mutation")?;
    let vaf_col = column_index(&headers, &config.vaf_column, "Mutation")?;

    let mut calls = Vec::new();
    for record in reader.records() {
        let record = record?;
        let sample_id = record.get(sample_col).unwrap_or_default();
        let symbol = record.get(gene_col).unwrap_or_default();
        if sample_id.is_empty() || symbol.is_empty() {
            warn!(
                "Skipping mutation call without sample or symbol (line {})",
                record.position().map_or(0, |p| p.line())
            );
            continue;
        }

        let vaf_field = record.get(vaf_col).unwrap_or_default();
        let vaf = if is_missing(vaf_field) {
            None
        } else {
            Some(vaf_field.parse::<f64>().map_err(|_| SubtypeError::InvalidInput {
                reason: format!("Invalid VAF '{}' for sample {}", vaf_field, sample_id),
            })?)
        };

        calls.push(MutationCall {
            sample_id: sample_id.to_string(),
            symbol: symbol.to_string(),
            vaf,
        });
    }

    Ok(calls)
}

/// Patient with both an RNA and a DNA sequencing sample
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub patient_id: String,
    pub rna_sample_id: String,
    pub dna_sample_id: String,
}

/// Sample-to-patient mapping restricted to patients sequenced in both modalities
#[derive(Debug, Clone, Default)]
pub struct SampleMapping {
    entries: Vec<MappingEntry>,
    by_rna: HashMap<String, usize>,
    by_dna: HashMap<String, usize>,
}

impl SampleMapping {
    /// Build a mapping; the first entry per patient wins, and a sample may map to one patient only
    pub fn new(entries: Vec<MappingEntry>) -> Result<Self> {
        let mut mapping = SampleMapping::default();
        let mut patients = HashSet::new();

        for entry in entries {
            if !patients.insert(entry.patient_id.clone()) {
                warn!(
                    "Patient {} has more than one sample pair; keeping the first",
                    entry.patient_id
                );
                continue;
            }

            for (sample, index) in [
                (&entry.rna_sample_id, &mapping.by_rna),
                (&entry.dna_sample_id, &mapping.by_dna),
            ] {
                if let Some(&other) = index.get(sample) {
                    return Err(SubtypeError::InvalidInput {
                        reason: format!(
                            "Sample {} maps to both {} and {}",
                            sample, mapping.entries[other].patient_id, entry.patient_id
                        ),
                    });
                }
            }

            let idx = mapping.entries.len();
            mapping.by_rna.insert(entry.rna_sample_id.clone(), idx);
            mapping.by_dna.insert(entry.dna_sample_id.clone(), idx);
            mapping.entries.push(entry);
        }

        Ok(mapping)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All mapped RNA sample IDs
    pub fn rna_samples(&self) -> HashSet<String> {
        self.by_rna.keys().cloned().collect()
    }

    pub fn patient_for_rna(&self, sample_id: &str) -> Option<&str> {
        self.by_rna
            .get(sample_id)
            .map(|&i| self.entries[i].patient_id.as_str())
    }

    pub fn patient_for_dna(&self, sample_id: &str) -> Option<&str> {
        self.by_dna
            .get(sample_id)
            .map(|&i| self.entries[i].patient_id.as_str())
    }
}

/// Read the clinical sample mapping, dropping rows without both samples
pub fn read_sample_mapping<P: AsRef<Path>>(path: P, config: &PrepConfig) -> Result<SampleMapping> {
    let mut reader = open_table(path)?;
    let headers = reader.headers()?.clone();

    let patient_col = column_index(&headers, &config.patient_column, "Mapping")?;
    let rna_col = column_index(&headers, &config.rna_sample_column, "Mapping")?;
    let dna_col = column_index(&headers, &config.dna_sample_column, "Mapping")?;

    let mut entries = Vec::new();
    let mut dropped = 0usize;
    for record in reader.records() {
        let record = record?;
        let patient = record.get(patient_col).unwrap_or_default();
        let rna = record.get(rna_col).unwrap_or_default();
        let dna = record.get(dna_col).unwrap_or_default();

        if is_missing(patient) || is_missing(rna) || is_missing(dna) {
            dropped += 1;
            continue;
        }

        entries.push(MappingEntry {
            patient_id: patient.to_string(),
            rna_sample_id: rna.to_string(),
            dna_sample_id: dna.to_string(),
        });
    }

    if dropped > 0 {
        debug!("Dropped {} mapping rows without both RNA and DNA samples", dropped);
    }

    let mapping = SampleMapping::new(entries)?;
    if mapping.is_empty() {
        return Err(SubtypeError::EmptyData {
            reason: "No patients with both RNA and DNA samples in mapping".to_string(),
        });
    }
    Ok(mapping)
}
