//! Reader and writer for the text matrix format.
//!
//! ```text
//! # Created by densolve          <- three header lines, ignored
//! # name: A
//! # type: matrix
//! # rows: 2                     <- row count at character offset 7
//! # columns: 3                  <- column count at character offset 10
//!  2 1 3                        <- one line per row
//!  1 3 5
//! ```
//!
//! Values are separated by whitespace. A row with fewer or more values than
//! the column count is rejected.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use tracing::{debug, trace};

use crate::linalg::LinalgError;
use crate::matrix::Matrix;
use crate::traits::FloatScalar;

/// Character offset of the row count on the fourth line.
pub const ROWS_OFFSET: usize = 7;
/// Character offset of the column count on the fifth line.
pub const COLS_OFFSET: usize = 10;

const HEADER_LINES: usize = 3;

/// Errors from reading a matrix file.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("cannot read matrix input: {0}")]
    Io(#[from] io::Error),
    /// Input ended before the dimension lines.
    #[error("missing header line {line}")]
    MissingHeader { line: usize },
    #[error("line {line}: cannot parse dimension")]
    BadDimension { line: usize },
    #[error("line {line}: cannot parse value {token:?}")]
    BadValue { line: usize, token: String },
    /// A data row holds the wrong number of values (or is missing).
    #[error("line {line}: expected {expected} values, found {found}")]
    RowWidth {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

impl ReadError {
    /// Process exit status for command-line front ends.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReadError::Io(_)
            | ReadError::MissingHeader { .. }
            | ReadError::BadDimension { .. }
            | ReadError::BadValue { .. } => 4,
            ReadError::RowWidth { .. } => 9,
            ReadError::Linalg(e) => e.exit_code(),
        }
    }
}

/// Leading unsigned integer of `line` after `offset` characters.
fn dimension_at(line: &str, offset: usize, lineno: usize) -> Result<usize, ReadError> {
    line.chars()
        .skip(offset)
        .collect::<String>()
        .split_whitespace()
        .next()
        .and_then(|tok| tok.parse().ok())
        .ok_or(ReadError::BadDimension { line: lineno })
}

/// Read a matrix from any buffered reader.
///
/// The data buffer is reserved fallibly, so absurd dimensions in the header
/// give [`LinalgError::AllocationFailure`] instead of aborting.
pub fn read_matrix<T, R>(reader: R) -> Result<Matrix<T>, ReadError>
where
    T: FloatScalar + FromStr,
    R: BufRead,
{
    let mut lines = reader.lines();
    let mut next_line = |lineno: usize| -> Result<String, ReadError> {
        lines
            .next()
            .transpose()?
            .ok_or(ReadError::MissingHeader { line: lineno })
    };

    for lineno in 1..=HEADER_LINES {
        next_line(lineno)?;
    }
    let nrows = dimension_at(&next_line(4)?, ROWS_OFFSET, 4)?;
    let ncols = dimension_at(&next_line(5)?, COLS_OFFSET, 5)?;
    debug!(nrows, ncols, "reading matrix");

    let mut m = Matrix::try_zeros(nrows, ncols)?;
    for i in 0..nrows {
        let lineno = HEADER_LINES + 3 + i;
        let line = match next_line(lineno) {
            Ok(line) => line,
            Err(ReadError::MissingHeader { .. }) => {
                return Err(ReadError::RowWidth {
                    line: lineno,
                    expected: ncols,
                    found: 0,
                })
            }
            Err(e) => return Err(e),
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != ncols {
            return Err(ReadError::RowWidth {
                line: lineno,
                expected: ncols,
                found: tokens.len(),
            });
        }
        for (slot, tok) in m.row_mut(i).iter_mut().zip(&tokens) {
            *slot = tok.parse().map_err(|_| ReadError::BadValue {
                line: lineno,
                token: (*tok).to_string(),
            })?;
        }
        trace!(row = i, "{line}");
    }
    Ok(m)
}

/// Parse a matrix from an in-memory string.
///
/// ```
/// use densolve::io::parse_matrix;
///
/// let text = "#\n#\n#\n# rows: 2\n# columns: 3\n2 1 3\n1 3 5\n";
/// let m = parse_matrix::<f64>(text).unwrap();
/// assert_eq!(m.nrows(), 2);
/// assert_eq!(m[(1, 2)], 5.0);
/// ```
pub fn parse_matrix<T: FloatScalar + FromStr>(text: &str) -> Result<Matrix<T>, ReadError> {
    read_matrix(text.as_bytes())
}

/// Write `m` in the format accepted by [`read_matrix`].
pub fn write_matrix<T, W>(mut w: W, name: &str, m: &Matrix<T>) -> io::Result<()>
where
    T: FloatScalar,
    W: Write,
{
    writeln!(w, "# Created by densolve")?;
    writeln!(w, "# name: {name}")?;
    writeln!(w, "# type: matrix")?;
    writeln!(w, "# rows: {}", m.nrows())?;
    writeln!(w, "# columns: {}", m.ncols())?;
    for i in 0..m.nrows() {
        for v in m.row(i) {
            // `{:?}` keeps enough digits to read the value back exactly
            write!(w, " {v:?}")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Created by Octave
# name: A
# type: matrix
# rows: 2
# columns: 3
 2 1 3
 1 3 5
";

    #[test]
    fn parses_sample() {
        let m = parse_matrix::<f64>(SAMPLE).unwrap();
        assert_eq!(m, Matrix::from_rows(2, 3, &[2.0, 1.0, 3.0, 1.0, 3.0, 5.0]));
    }

    #[test]
    fn writer_output_reads_back() {
        let m = Matrix::from_rows(2, 2, &[0.1_f64, -2.5e-7, 1.0 / 3.0, 4.0]);
        let mut buf = Vec::new();
        write_matrix(&mut buf, "B", &m).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.lines().nth(3).unwrap().starts_with("# rows:"));
        assert_eq!(parse_matrix::<f64>(&text).unwrap(), m);
    }

    #[test]
    fn short_row_rejected() {
        let text = SAMPLE.replace(" 1 3 5", " 1 3");
        let err = parse_matrix::<f64>(&text).unwrap_err();
        assert!(matches!(
            err,
            ReadError::RowWidth { line: 7, expected: 3, found: 2 }
        ));
        assert_eq!(err.exit_code(), 9);
    }

    #[test]
    fn wide_row_rejected() {
        let text = SAMPLE.replace(" 2 1 3", " 2 1 3 4");
        let err = parse_matrix::<f64>(&text).unwrap_err();
        assert!(matches!(err, ReadError::RowWidth { line: 6, found: 4, .. }));
    }

    #[test]
    fn missing_row_rejected() {
        let text = SAMPLE.replace(" 1 3 5\n", "");
        assert!(matches!(
            parse_matrix::<f64>(&text).unwrap_err(),
            ReadError::RowWidth { line: 7, found: 0, .. }
        ));
    }

    #[test]
    fn truncated_header() {
        let err = parse_matrix::<f64>("#\n#\n").unwrap_err();
        assert!(matches!(err, ReadError::MissingHeader { line: 3 }));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn bad_tokens() {
        let text = SAMPLE.replace("# rows: 2", "# rows: x");
        assert!(matches!(
            parse_matrix::<f64>(&text).unwrap_err(),
            ReadError::BadDimension { line: 4 }
        ));
        let text = SAMPLE.replace(" 2 1 3", " 2 one 3");
        assert!(matches!(
            parse_matrix::<f64>(&text).unwrap_err(),
            ReadError::BadValue { line: 6, .. }
        ));
    }

    #[test]
    fn huge_dimensions_fail_to_allocate() {
        let text = format!("#\n#\n#\n# rows: {}\n# columns: {}\n", usize::MAX, 2);
        let err = parse_matrix::<f64>(&text).unwrap_err();
        assert!(matches!(
            err,
            ReadError::Linalg(LinalgError::AllocationFailure { .. })
        ));
        assert_eq!(err.exit_code(), 7);
    }
}
