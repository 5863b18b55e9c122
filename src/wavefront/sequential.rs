use crate::errors::GpsaError;
use crate::inputs::{AlignmentInputs, EncodedInputs};
use crate::matrix::ScoreMatrix;

/// Single threaded, row-major fill. Defines the expected result for all other strategies.
pub struct SequentialFiller;

impl SequentialFiller {
    /// Fill `matrix`, which must have the dimensions implied by `inputs`. Returns the number
    /// of cells written.
    pub fn fill(inputs: &AlignmentInputs, matrix: &mut ScoreMatrix) -> Result<u64, GpsaError> {
        if matrix.dims() != inputs.dims() {
            return Err(GpsaError::DimensionMismatch { expected: inputs.dims(), actual: matrix.dims() });
        }

        let encoded = inputs.encode()?;
        Ok(Self::fill_encoded(&encoded, matrix))
    }

    pub(crate) fn fill_encoded(inputs: &EncodedInputs<'_>, matrix: &mut ScoreMatrix) -> u64 {
        let (rows, cols) = (inputs.rows(), inputs.cols());
        debug_assert_eq!(matrix.dims(), (rows, cols));

        let cells = matrix.as_mut_slice();
        let mut visited = 0;

        for i in 1..rows {
            cells[i * cols] = inputs.boundary(i);
            visited += 1;
        }

        for j in 0..cols {
            cells[j] = inputs.boundary(j);
            visited += 1;
        }

        for i in 1..rows {
            for j in 1..cols {
                let diag = cells[(i - 1) * cols + j - 1];
                let up = cells[(i - 1) * cols + j];
                let left = cells[i * cols + j - 1];

                cells[i * cols + j] = inputs.cell(i, j, diag, up, left);
                visited += 1;
            }
        }

        visited
    }
}
