pub type Result<T> = std::result::Result<T, TrainError>;

#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error("shape mismatch in {what}: got {got}, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },

    #[error("probability {value} at index {index} is outside [0, 1]")]
    Domain { index: usize, value: f64 },

    #[error("{what} has no rows")]
    Empty { what: &'static str },

    #[error("label {value} at index {index} is not 0 or 1")]
    InvalidLabel { index: usize, value: f64 },

    #[error("cannot split {rows} rows with test fraction {test_fraction}")]
    InvalidSplit { test_fraction: f64, rows: usize },

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Distribution(#[from] rand_distr::NormalError),
}

pub(crate) fn ensure_len(what: &'static str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(TrainError::ShapeMismatch {
            what,
            got,
            expected,
        });
    }

    Ok(())
}

pub(crate) fn ensure_rows(what: &'static str, rows: usize) -> Result<()> {
    if rows == 0 {
        return Err(TrainError::Empty { what });
    }

    Ok(())
}
