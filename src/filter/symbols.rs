//! Gene symbol and biotype filtering
//!
//! Keeps protein-coding genes whose symbols are "clean": no dot, no dash and
//! not an open-reading-frame placeholder such as `C1orf112`.

use regex::Regex;

use crate::error::Result;

/// Decides which annotated expression rows are kept by symbol and biotype
#[derive(Debug, Clone)]
pub struct SymbolFilter {
    orf_pattern: Regex,
    biotype: String,
}

impl SymbolFilter {
    /// Create a filter accepting rows whose biotype equals `protein_coding_biotype`
    pub fn new(protein_coding_biotype: &str) -> Result<Self> {
        Ok(Self {
            orf_pattern: Regex::new(r"^C\d+orf\d+$")?,
            biotype: protein_coding_biotype.to_string(),
        })
    }

    /// True when the symbol is non-empty, has no `.` or `-`, and is not a `C<n>orf<n>` locus
    pub fn is_clean_symbol(&self, symbol: &str) -> bool {
        !symbol.is_empty()
            && !symbol.contains('.')
            && !symbol.contains('-')
            && !self.orf_pattern.is_match(symbol)
    }

    /// True when the row passes both the biotype and the symbol check
    pub fn keep(&self, symbol: &str, biotype: &str) -> bool {
        biotype == self.biotype && self.is_clean_symbol(symbol)
    }
}
