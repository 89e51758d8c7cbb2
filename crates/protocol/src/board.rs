//! Board snapshots and the player codes stored in their cells.
//!
//! A cell code packs a status prefix and a player slot into two characters:
//! `p3` is the head of player 3, `t3` one of its trail segments and `d3` its
//! crash site.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use crate::ProtocolError;

/// Length of every occupied cell token.
pub const CODE_LEN: usize = 2;

/// Explicit empty-cell marker. Blank strings are empty as well.
pub const EMPTY_MARKER: &str = "__";

/// Highest slot a single digit can address.
pub const MAX_SLOT: u8 = 9;

/// Status half of a player code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellStatus {
    Alive,
    Trail,
    Dead,
}

impl CellStatus {
    pub const fn prefix(self) -> char {
        match self {
            CellStatus::Alive => 'p',
            CellStatus::Trail => 't',
            CellStatus::Dead => 'd',
        }
    }

    pub const fn from_prefix(c: char) -> Option<Self> {
        match c {
            'p' => Some(CellStatus::Alive),
            't' => Some(CellStatus::Trail),
            'd' => Some(CellStatus::Dead),
            _ => None,
        }
    }
}

/// Decoded cell occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerCode {
    pub status: CellStatus,
    pub slot: u8,
}

impl PlayerCode {
    pub const fn new(status: CellStatus, slot: u8) -> Self {
        Self { status, slot }
    }
}

impl FromStr for PlayerCode {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ProtocolError::UnknownPlayerCode(s.to_string());
        let mut chars = s.chars();
        let (Some(prefix), Some(digit), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(unknown());
        };
        let status = CellStatus::from_prefix(prefix).ok_or_else(unknown)?;
        let slot = digit.to_digit(10).ok_or_else(unknown)? as u8;
        if slot == 0 {
            return Err(unknown());
        }
        Ok(Self { status, slot })
    }
}

impl fmt::Display for PlayerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.status.prefix(), self.slot)
    }
}

/// Board validation failures. These point at client/server protocol drift.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board payload is not a sequence of rows")]
    NotASequence,

    #[error("row {row} is not a sequence")]
    RowNotSequence { row: usize },

    #[error("row {row} has {found} cells, expected {expected}")]
    NotRectangular { row: usize, expected: usize, found: usize },

    #[error("cell ({row}, {col}) is neither a code nor empty")]
    CellNotString { row: usize, col: usize },

    #[error("cell ({row}, {col}) holds unknown code {code:?}")]
    UnknownCode { row: usize, col: usize, code: String },

    #[error("cell ({row}, {col}) code {code} has no colour for its slot")]
    Unresolvable { row: usize, col: usize, code: PlayerCode },

    #[error("board is {rows}x{cols} but the match is fixed at {expected_rows}x{expected_cols}")]
    DimensionMismatch {
        rows: usize,
        cols: usize,
        expected_rows: usize,
        expected_cols: usize,
    },
}

/// A rectangular snapshot of the grid, cells stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Option<PlayerCode>>,
}

impl Board {
    /// Decode a transport board (a sequence of sequences of cell strings).
    ///
    /// Cells whose string length is not [`CODE_LEN`], the [`EMPTY_MARKER`]
    /// and `null` are empty. Every other cell must decode to a player code.
    pub fn decode(value: &Value) -> Result<Self, BoardError> {
        let rows = value.as_array().ok_or(BoardError::NotASequence)?;

        let mut cols = 0;
        let mut cells = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            let row = row.as_array().ok_or(BoardError::RowNotSequence { row: r })?;
            if r == 0 {
                cols = row.len();
                cells.reserve(rows.len() * cols);
            } else if row.len() != cols {
                return Err(BoardError::NotRectangular {
                    row: r,
                    expected: cols,
                    found: row.len(),
                });
            }

            for (c, cell) in row.iter().enumerate() {
                let code = match cell {
                    Value::Null => None,
                    Value::String(s) if s.chars().count() != CODE_LEN || s == EMPTY_MARKER => None,
                    Value::String(s) => Some(s.parse::<PlayerCode>().map_err(|_| BoardError::UnknownCode {
                        row: r,
                        col: c,
                        code: s.clone(),
                    })?),
                    _ => return Err(BoardError::CellNotString { row: r, col: c }),
                };
                cells.push(code);
            }
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Occupied cells in row-major order (top-to-bottom, left-to-right).
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, PlayerCode)> + '_ {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, cell)| cell.map(|code| (i / cols, i % cols, code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_code_parsing() {
        assert_eq!("p1".parse::<PlayerCode>().unwrap(), PlayerCode::new(CellStatus::Alive, 1));
        assert_eq!("t6".parse::<PlayerCode>().unwrap(), PlayerCode::new(CellStatus::Trail, 6));
        assert_eq!("d2".parse::<PlayerCode>().unwrap(), PlayerCode::new(CellStatus::Dead, 2));
        assert_eq!(PlayerCode::new(CellStatus::Dead, 4).to_string(), "d4");
    }

    #[test]
    fn test_bad_codes() {
        for bad in ["x1", "p0", "pp", "p", "p12", ""] {
            assert!(bad.parse::<PlayerCode>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_decode_skips_empty_cells() {
        let board = Board::decode(&json!([["p1", "__"], ["", null]])).unwrap();
        assert_eq!((board.rows(), board.cols()), (2, 2));
        let occupied: Vec<_> = board.occupied().collect();
        assert_eq!(occupied, vec![(0, 0, PlayerCode::new(CellStatus::Alive, 1))]);
    }

    #[test]
    fn test_wrong_length_tokens_are_empty() {
        let board = Board::decode(&json!([["p", "p12", "   "]])).unwrap();
        assert_eq!(board.occupied().count(), 0);
    }

    #[test]
    fn test_decode_rejects_ragged_rows() {
        let err = Board::decode(&json!([["p1", ""], [""]])).unwrap_err();
        assert_eq!(err, BoardError::NotRectangular { row: 1, expected: 2, found: 1 });
    }

    #[test]
    fn test_decode_rejects_non_sequence_rows() {
        assert_eq!(Board::decode(&json!({ "a": 1 })).unwrap_err(), BoardError::NotASequence);
        assert_eq!(
            Board::decode(&json!([["p1"], "p2"])).unwrap_err(),
            BoardError::RowNotSequence { row: 1 }
        );
    }

    #[test]
    fn test_decode_rejects_unknown_code() {
        let err = Board::decode(&json!([["__", "x9"]])).unwrap_err();
        assert_eq!(
            err,
            BoardError::UnknownCode { row: 0, col: 1, code: "x9".to_string() }
        );
    }

    #[test]
    fn test_occupied_is_row_major() {
        let board = Board::decode(&json!([["", "t1"], ["p2", "d3"]])).unwrap();
        let order: Vec<(usize, usize)> = board.occupied().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(order, vec![(0, 1), (1, 0), (1, 1)]);
    }
}
