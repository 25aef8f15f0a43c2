//! Data directory: the serialized products of preparation and precomputation
//!
//! All tables are tab-separated with a header row. Floating point values are
//! written with their shortest round-trip representation so a reload is exact.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use log::info;
use ndarray::Array2;
use sha2::{Digest, Sha256};

use crate::data::{AlignedCohort, ExpressionMatrix, MutationMatrix};
use crate::error::{Result, SubtypeError};
use crate::results::{StatCell, StatTable};
use crate::testing::{Direction, Significance};

pub const EXPRESSION_RAW_FILE: &str = "expression_raw.tsv";
pub const EXPRESSION_SCALED_FILE: &str = "expression_scaled.tsv";
pub const MUTATIONS_FILE: &str = "mutations.tsv";
pub const STAT_RESULTS_FILE: &str = "stat_results.tsv";
pub const GENES_FILE: &str = "genes.txt";
/// Digests of the tables `stat_results.tsv` was computed from
pub const STAT_SOURCE_FILE: &str = "stat_results.sha256";

const STAT_SOURCES: [&str; 2] = [EXPRESSION_RAW_FILE, MUTATIONS_FILE];

const STAT_COLUMNS: [&str; 10] = [
    "gene_id",
    "subtype",
    "n_mutated",
    "n_unmutated",
    "statistic",
    "pvalue",
    "padj",
    "label",
    "display",
    "direction",
];

const MISSING: &str = "NA";

fn tsv_writer<P: AsRef<Path>>(path: P) -> Result<csv::Writer<File>> {
    Ok(csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?)
}

fn tsv_reader<P: AsRef<Path>>(path: P) -> Result<csv::Reader<File>> {
    Ok(csv::ReaderBuilder::new().delimiter(b'\t').from_path(path)?)
}

fn parse_f64(field: &str, what: &str) -> Result<f64> {
    field.parse::<f64>().map_err(|_| SubtypeError::InvalidMatrix {
        reason: format!("Invalid {} value '{}'", what, field),
    })
}

fn parse_count(field: &str) -> Result<usize> {
    field.parse::<usize>().map_err(|_| SubtypeError::InvalidMatrix {
        reason: format!("Invalid group size '{}'", field),
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write through `write` to `<path>.tmp`, then rename onto `path`
fn publish<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let tmp = tmp_path(path);
    if let Err(e) = write(&tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Write a gene x patient matrix with a `gene_id` column
pub fn write_expression<P: AsRef<Path>>(path: P, matrix: &ExpressionMatrix) -> Result<()> {
    let mut writer = tsv_writer(path)?;

    let mut header = vec!["gene_id".to_string()];
    header.extend(matrix.patient_ids().iter().cloned());
    writer.write_record(&header)?;

    for (i, gene_id) in matrix.gene_ids().iter().enumerate() {
        let mut record = vec![gene_id.clone()];
        record.extend(matrix.gene_row(i).iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Read a matrix written by [`write_expression`]
pub fn read_expression<P: AsRef<Path>>(path: P) -> Result<ExpressionMatrix> {
    let mut reader = tsv_reader(path)?;
    let headers = reader.headers()?.clone();
    if headers.get(0) != Some("gene_id") {
        return Err(SubtypeError::InvalidMatrix {
            reason: "Expression table must start with a 'gene_id' column".to_string(),
        });
    }
    let patient_ids: Vec<String> = headers.iter().skip(1).map(String::from).collect();

    let mut gene_ids = Vec::new();
    let mut data = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() != patient_ids.len() + 1 {
            return Err(SubtypeError::DimensionMismatch {
                expected: format!("{} columns", patient_ids.len() + 1),
                got: format!("{} columns", record.len()),
            });
        }
        gene_ids.push(record[0].to_string());
        for field in record.iter().skip(1) {
            data.push(parse_f64(field, "expression")?);
        }
    }

    if gene_ids.is_empty() {
        return Err(SubtypeError::EmptyData {
            reason: "No genes found in expression table".to_string(),
        });
    }

    let values = Array2::from_shape_vec((gene_ids.len(), patient_ids.len()), data).map_err(|e| {
        SubtypeError::InvalidMatrix {
            reason: e.to_string(),
        }
    })?;
    ExpressionMatrix::new(values, gene_ids, patient_ids)
}

/// Write the patient x subtype matrix with a `patient_id` column
pub fn write_mutations<P: AsRef<Path>>(path: P, mutations: &MutationMatrix) -> Result<()> {
    let mut writer = tsv_writer(path)?;

    let mut header = vec!["patient_id".to_string()];
    header.extend(mutations.subtypes().iter().cloned());
    writer.write_record(&header)?;

    for (i, patient) in mutations.patient_ids().iter().enumerate() {
        let mut record = vec![patient.clone()];
        record.extend(mutations.patient_row(i).iter().map(|c| c.to_string()));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Read a matrix written by [`write_mutations`]
pub fn read_mutations<P: AsRef<Path>>(path: P) -> Result<MutationMatrix> {
    let mut reader = tsv_reader(path)?;
    let headers = reader.headers()?.clone();
    if headers.get(0) != Some("patient_id") {
        return Err(SubtypeError::InvalidMatrix {
            reason: "Mutation table must start with a 'patient_id' column".to_string(),
        });
    }
    let subtypes: Vec<String> = headers.iter().skip(1).map(String::from).collect();

    let mut patient_ids = Vec::new();
    let mut data = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() != subtypes.len() + 1 {
            return Err(SubtypeError::DimensionMismatch {
                expected: format!("{} columns", subtypes.len() + 1),
                got: format!("{} columns", record.len()),
            });
        }
        patient_ids.push(record[0].to_string());
        for field in record.iter().skip(1) {
            let call = field.parse::<u8>().map_err(|_| SubtypeError::InvalidMatrix {
                reason: format!("Invalid mutation call '{}'", field),
            })?;
            data.push(call);
        }
    }

    let calls = Array2::from_shape_vec((patient_ids.len(), subtypes.len()), data).map_err(|e| {
        SubtypeError::InvalidMatrix {
            reason: e.to_string(),
        }
    })?;
    MutationMatrix::new(calls, patient_ids, subtypes)
}

/// Write the stat table in long form, gene-major
///
/// The table goes to a sibling `.tmp` file first and is renamed into place,
/// so a failed write never replaces the previous table.
pub fn write_stat_table<P: AsRef<Path>>(path: P, table: &StatTable) -> Result<()> {
    publish(path.as_ref(), |tmp| {
        let mut writer = tsv_writer(tmp)?;
        writer.write_record(STAT_COLUMNS)?;

        for (gene_id, row) in table.rows() {
            for (subtype, cell) in table.subtypes().iter().zip(row) {
                let record = match *cell {
                    StatCell::Computed {
                        statistic,
                        n_mutated,
                        n_unmutated,
                        pvalue,
                        padj,
                        significance,
                        direction,
                    } => [
                        gene_id.to_string(),
                        subtype.clone(),
                        n_mutated.to_string(),
                        n_unmutated.to_string(),
                        statistic.to_string(),
                        pvalue.to_string(),
                        padj.to_string(),
                        significance.label().to_string(),
                        cell.display().unwrap_or_default(),
                        direction.to_string(),
                    ],
                    StatCell::NotComputed => [
                        gene_id.to_string(),
                        subtype.clone(),
                        MISSING.to_string(),
                        MISSING.to_string(),
                        MISSING.to_string(),
                        MISSING.to_string(),
                        MISSING.to_string(),
                        String::new(),
                        MISSING.to_string(),
                        MISSING.to_string(),
                    ],
                };
                writer.write_record(&record)?;
            }
        }

        writer.flush()?;
        Ok(())
    })
}

/// Read a table written by [`write_stat_table`]
///
/// Rows must come grouped by gene with the same subtype order in every group;
/// anything else is an incomplete table. The label column must agree with the
/// adjusted p-value.
pub fn read_stat_table<P: AsRef<Path>>(path: P) -> Result<StatTable> {
    let mut reader = tsv_reader(path)?;

    let mut gene_ids: Vec<String> = Vec::new();
    let mut subtypes: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<StatCell>> = Vec::new();

    for record in reader.records() {
        let record = record?;
        if record.len() != STAT_COLUMNS.len() {
            return Err(SubtypeError::DimensionMismatch {
                expected: format!("{} columns", STAT_COLUMNS.len()),
                got: format!("{} columns", record.len()),
            });
        }
        let gene_id = &record[0];
        let subtype = &record[1];

        if gene_ids.last().map(String::as_str) != Some(gene_id) {
            gene_ids.push(gene_id.to_string());
            rows.push(Vec::new());
        }
        let row_idx = rows.len() - 1;
        let position = rows[row_idx].len();

        // the first gene defines the subtype order
        if row_idx == 0 {
            subtypes.push(subtype.to_string());
        } else if subtypes.get(position).map(String::as_str) != Some(subtype) {
            return Err(SubtypeError::IncompleteTable {
                reason: format!("Gene '{}' has subtype '{}' out of order", gene_id, subtype),
            });
        }

        let cell = if &record[5] == MISSING {
            StatCell::NotComputed
        } else {
            let padj = parse_f64(&record[6], "padj")?;
            let significance = Significance::from_padj(Some(padj));
            if record[7].parse::<Significance>()? != significance {
                return Err(SubtypeError::IncompleteTable {
                    reason: format!("Label '{}' disagrees with padj {} for {} / {}", &record[7], padj, gene_id, subtype),
                });
            }
            StatCell::Computed {
                statistic: parse_f64(&record[4], "statistic")?,
                n_mutated: parse_count(&record[2])?,
                n_unmutated: parse_count(&record[3])?,
                pvalue: parse_f64(&record[5], "pvalue")?,
                padj,
                significance,
                direction: record[9].parse::<Direction>()?,
            }
        };
        rows[row_idx].push(cell);
    }

    // StatTable::new rejects short rows and repeated genes
    StatTable::new(gene_ids, subtypes, rows)
}

/// SHA-256 of a file, streamed
fn sha256_file(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 65536];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Digests of the tables the stat table is computed from, as (file, digest)
fn source_digests(dir: &Path) -> Result<Vec<(String, String)>> {
    STAT_SOURCES
        .iter()
        .map(|file| Ok((file.to_string(), sha256_file(&dir.join(file))?)))
        .collect()
}

/// Store the stat table in `dir` together with the digests of its inputs
pub fn write_stat_results<P: AsRef<Path>>(dir: P, table: &StatTable) -> Result<()> {
    let dir = dir.as_ref();
    remove_if_exists(&dir.join(STAT_SOURCE_FILE))?;
    write_stat_table(dir.join(STAT_RESULTS_FILE), table)?;

    let mut text = String::new();
    for (file, digest) in source_digests(dir)? {
        text.push_str(&format!("{}  {}\n", digest, file));
    }
    publish(&dir.join(STAT_SOURCE_FILE), |tmp| Ok(fs::write(tmp, &text)?))?;

    info!("Wrote {} x {} stat table to {}", table.n_genes(), table.n_subtypes(), dir.display());
    Ok(())
}

/// Fail unless the stat table in `dir` was computed from the tables now in `dir`
pub fn check_stat_source<P: AsRef<Path>>(dir: P) -> Result<()> {
    let dir = dir.as_ref();
    let text = fs::read_to_string(dir.join(STAT_SOURCE_FILE)).map_err(|e| SubtypeError::StaleTable {
        reason: format!("cannot read {}: {}", STAT_SOURCE_FILE, e),
    })?;

    let recorded: Vec<(String, String)> = text
        .lines()
        .filter_map(|line| line.split_once("  "))
        .map(|(digest, file)| (file.to_string(), digest.to_string()))
        .collect();

    if recorded != source_digests(dir)? {
        return Err(SubtypeError::StaleTable {
            reason: format!(
                "{} in {} was computed from other tables; rerun precompute",
                STAT_RESULTS_FILE,
                dir.display()
            ),
        });
    }
    Ok(())
}

/// Write the autocomplete list, one gene per line
pub fn write_gene_list<P: AsRef<Path>>(path: P, genes: &[String]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for gene in genes {
        writeln!(writer, "{}", gene)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read the autocomplete list; blank lines are skipped
pub fn read_gene_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut genes = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let gene = line.trim();
        if !gene.is_empty() {
            genes.push(gene.to_string());
        }
    }
    Ok(genes)
}

/// Write the aligned tables and the autocomplete list
///
/// A stat table already in `dir` belongs to the old tables and is removed.
pub fn write_cohort<P: AsRef<Path>>(dir: P, cohort: &AlignedCohort) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    for file in [STAT_SOURCE_FILE, STAT_RESULTS_FILE] {
        if remove_if_exists(&dir.join(file))? {
            info!("Removed stale {} from {}", file, dir.display());
        }
    }
    write_expression(dir.join(EXPRESSION_RAW_FILE), cohort.raw())?;
    write_expression(dir.join(EXPRESSION_SCALED_FILE), cohort.scaled())?;
    write_mutations(dir.join(MUTATIONS_FILE), cohort.mutations())?;
    write_gene_list(dir.join(GENES_FILE), cohort.raw().gene_ids())?;
    info!(
        "Wrote {} genes x {} patients to {}",
        cohort.n_genes(),
        cohort.n_patients(),
        dir.display()
    );
    Ok(())
}

/// Read the aligned tables back, re-checking the patient axis
pub fn read_cohort<P: AsRef<Path>>(dir: P) -> Result<AlignedCohort> {
    let dir = dir.as_ref();
    let raw = read_expression(dir.join(EXPRESSION_RAW_FILE))?;
    let scaled = read_expression(dir.join(EXPRESSION_SCALED_FILE))?;
    let mutations = read_mutations(dir.join(MUTATIONS_FILE))?;
    AlignedCohort::new(raw, scaled, mutations)
}
