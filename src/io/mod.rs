//! Input/Output: raw offline inputs and the serialized data directory

mod raw;
mod tables;

pub use raw::{
    read_mutation_calls, read_raw_expression, read_sample_mapping, MappingEntry, MutationCall, RawExpression,
    SampleMapping,
};
pub use tables::{
    check_stat_source, read_cohort, read_expression, read_gene_list, read_mutations, read_stat_table, write_cohort,
    write_expression, write_gene_list, write_mutations, write_stat_results, write_stat_table, EXPRESSION_RAW_FILE,
    EXPRESSION_SCALED_FILE, GENES_FILE, MUTATIONS_FILE, STAT_RESULTS_FILE, STAT_SOURCE_FILE,
};
