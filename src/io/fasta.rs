use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use noodles::fasta;

use crate::errors::GpsaError;

/// A FASTA record name with its (upper-cased) sequence
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamedSequence {
    pub name: String,
    pub sequence: Vec<u8>,
}

/// Read all records from a FASTA stream.
pub fn read_fasta(reader_inner: impl BufRead) -> Result<Vec<NamedSequence>, GpsaError> {
    let mut reader = fasta::io::Reader::new(reader_inner);

    let mut sequences = Vec::new();
    for result in reader.records() {
        let record = result?;
        let name = String::from_utf8_lossy(record.name()).into_owned();

        sequences.push(NamedSequence {
            name,
            sequence: record.sequence().as_ref().to_ascii_uppercase(),
        });
    }

    Ok(sequences)
}

fn open_maybe_gzipped(path: &Path) -> Result<Box<dyn BufRead>, GpsaError> {
    let is_gzipped = path.extension().is_some_and(|ext| ext == "gz");

    let file = File::open(path)
        .map_err(|source| GpsaError::FileRead { path: path.to_path_buf(), source })?;

    let reader: Box<dyn BufRead> = if is_gzipped {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    Ok(reader)
}

/// Load the first record of a FASTA file, which may be gzip compressed (`.gz` extension).
pub fn load_first_sequence(path: impl AsRef<Path>) -> Result<NamedSequence, GpsaError> {
    let path = path.as_ref();
    let reader = open_maybe_gzipped(path)?;

    read_fasta(reader)?
        .into_iter()
        .next()
        .ok_or_else(|| GpsaError::NoSequences { path: path.to_path_buf() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_fasta() {
        let input = b">seq1 some description\nGATT\naca\n>seq2\nGCATGCU\n";
        let sequences = read_fasta(&input[..]).unwrap();

        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].name, "seq1");
        assert_eq!(sequences[0].sequence, b"GATTACA");
        assert_eq!(sequences[1].name, "seq2");
        assert_eq!(sequences[1].sequence, b"GCATGCU");
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_first_sequence("/nonexistent/sequences.fa"),
            Err(GpsaError::FileRead { .. })
        ));
    }
}
