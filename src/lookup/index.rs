//! Queryable gene identifiers

use std::collections::HashSet;

use crate::error::{Result, SubtypeError};

/// A gene identifier known to be in the index
///
/// Only `AutocompleteIndex::validate` creates one, so lookups never see
/// unchecked user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedGene<'a>(&'a str);

impl<'a> ValidatedGene<'a> {
    pub fn as_str(&self) -> &'a str {
        self.0
    }
}

/// The set of genes a user may query: the expression matrix row keys
#[derive(Debug, Clone, Default)]
pub struct AutocompleteIndex {
    genes: Vec<String>,
    members: HashSet<String>,
}

impl AutocompleteIndex {
    pub fn new(genes: Vec<String>) -> Self {
        let members = genes.iter().cloned().collect();
        Self { genes, members }
    }

    /// Genes in expression row order
    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn contains(&self, gene: &str) -> bool {
        self.members.contains(gene)
    }

    /// Check user input; surrounding whitespace is ignored
    pub fn validate(&self, gene: &str) -> Result<ValidatedGene<'_>> {
        let query = gene.trim();
        self.members
            .get(query)
            .map(|g| ValidatedGene(g.as_str()))
            .ok_or_else(|| SubtypeError::UnknownGene {
                gene: query.to_string(),
            })
    }

    /// Up to `limit` genes starting with `prefix`, case-insensitive, sorted
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<&str> {
        let prefix = prefix.trim().to_uppercase();
        let mut hits: Vec<&str> = self
            .genes
            .iter()
            .filter(|g| g.to_uppercase().starts_with(&prefix))
            .map(|g| g.as_str())
            .collect();
        hits.sort_unstable();
        hits.truncate(limit);
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> AutocompleteIndex {
        AutocompleteIndex::new(vec!["MEIS1".into(), "FLT3".into(), "MECOM".into(), "HOXA9".into()])
    }

    #[test]
    fn test_validate() {
        let index = index();
        assert_eq!(index.validate("FLT3").unwrap().as_str(), "FLT3");
        assert_eq!(index.validate("  HOXA9 ").unwrap().as_str(), "HOXA9");
        assert!(matches!(
            index.validate("flt3"),
            Err(SubtypeError::UnknownGene { .. })
        ));
    }

    #[test]
    fn test_suggest() {
        let index = index();
        assert_eq!(index.suggest("me", 10), vec!["MECOM", "MEIS1"]);
        assert_eq!(index.suggest("ME", 1), vec!["MECOM"]);
        assert!(index.suggest("XYZ", 5).is_empty());
    }
}
