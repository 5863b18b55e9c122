use std::io::Write;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::errors::GpsaError;
use crate::matrix::ScoreMatrix;
use crate::wavefront::{FillResult, Strategy};

/// Write the score matrix as TSV. The header row lists the symbols of `y`, and each
/// following row starts with the symbol of `x` it belongs to; row and column 0 are labeled
/// with `-`.
pub fn write_score_matrix<W: Write>(mut writer: W, matrix: &ScoreMatrix, x: &[u8], y: &[u8]) -> Result<(), GpsaError> {
    let labels = |seq: &[u8]| -> Vec<char> {
        std::iter::once('-').chain(seq.iter().map(|&c| c as char)).collect()
    };

    let row_labels = labels(x);
    let col_labels = labels(y);
    let expected = (row_labels.len(), col_labels.len());
    if expected != matrix.dims() {
        return Err(GpsaError::DimensionMismatch { expected, actual: matrix.dims() });
    }

    writeln!(writer, "\t{}", col_labels.iter().join("\t"))?;
    for (label, row) in row_labels.iter().zip(matrix.iter_rows()) {
        writeln!(writer, "{label}\t{}", row.iter().join("\t"))?;
    }

    Ok(())
}

/// Summary of a single fill, as printed by the command line tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FillReport {
    pub strategy: Strategy,
    pub granularity: usize,
    pub threads: usize,
    pub rows: usize,
    pub cols: usize,
    pub visited: u64,
    pub waves: u32,
    pub score: f32,
    pub elapsed_ms: f64,

    /// Whether the matrix equals the sequential fill, if that was checked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches_reference: Option<bool>,
}

impl FillReport {
    pub fn new(result: &FillResult, strategy: Strategy, granularity: usize, threads: usize, elapsed_ms: f64) -> Self {
        Self {
            strategy,
            granularity,
            threads,
            rows: result.matrix.rows(),
            cols: result.matrix.cols(),
            visited: result.summary.visited,
            waves: result.summary.waves,
            score: result.matrix.final_score(),
            elapsed_ms,
            matches_reference: None,
        }
    }

    pub fn to_json(&self) -> Result<String, GpsaError> {
        serde_json::to_string(self)
            .map_err(|e| GpsaError::IOError(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavefront::tests::dna_inputs;
    use crate::wavefront::fill;

    #[test]
    fn test_write_score_matrix() {
        let inputs = dna_inputs("GA", "G");
        let result = fill(&inputs, Strategy::Sequential, 1).unwrap();

        let mut out = Vec::new();
        write_score_matrix(&mut out, &result.matrix, inputs.x(), inputs.y()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "\t-\tG\n-\t0\t-2\nG\t-2\t1\nA\t-4\t-1\n");
    }

    #[test]
    fn test_write_wrong_sequences() {
        let inputs = dna_inputs("GA", "G");
        let result = fill(&inputs, Strategy::Sequential, 1).unwrap();

        let mut out = Vec::new();
        assert!(matches!(
            write_score_matrix(&mut out, &result.matrix, b"GAT", inputs.y()),
            Err(GpsaError::DimensionMismatch { expected: (4, 2), actual: (3, 2) })
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_report_json() {
        let inputs = dna_inputs("GATTACA", "GCATGCU");
        let result = fill(&inputs, Strategy::AntiDiagonal, 4).unwrap();

        let report = FillReport::new(&result, Strategy::AntiDiagonal, 4, 2, 0.5);
        assert_eq!(report.visited, 64);
        assert_eq!(report.score, -1.0);

        let json = report.to_json().unwrap();
        assert!(json.contains("\"strategy\":\"AntiDiagonal\""));
        assert!(!json.contains("matches_reference"));

        let parsed: FillReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
