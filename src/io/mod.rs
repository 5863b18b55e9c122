pub mod fasta;
pub mod output;
pub mod substitution;

pub use fasta::{load_first_sequence, NamedSequence};
pub use output::{write_score_matrix, FillReport};
pub use substitution::{load_substitution_matrix, parse_substitution_matrix};
