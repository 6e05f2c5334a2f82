use hsl_color::Hsl;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use thiserror::Error;

/// Error raised when a color grid cannot be built from its rows
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("Color grid has no rows")]
    Empty,

    #[error("Color grid row {row} has no columns")]
    EmptyRow { row: u32 },

    #[error("Color grid row {row} has {found} columns, expected {expected}")]
    Ragged { row: u32, expected: u32, found: u32 },

    #[error("Color sample at ({row}, {column}) is outside 0..=1")]
    OutOfRange { row: u32, column: u32 },
}

/// One cell of the source image: position plus its HSL color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSample {
    pub row: u32,
    pub column: u32,
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl ColorSample {
    pub fn color(&self) -> Hsl {
        Hsl::new(self.h, self.s, self.l)
    }
}

/// Serialized form of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl From<Hsl> for GridCell {
    fn from(c: Hsl) -> Self {
        Self {
            h: c.h,
            s: c.s,
            l: c.l,
        }
    }
}

/// Row-major per-pixel HSL values of the downsized source image.
///
/// Always rectangular and non-empty; construction rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<GridCell>>", into = "Vec<Vec<GridCell>>")]
pub struct ColorSampleGrid {
    rows: Vec<Vec<GridCell>>,
    width: u32,
}

impl ColorSampleGrid {
    pub fn new(rows: Vec<Vec<Hsl>>) -> Result<Self, GridError> {
        let cells = rows
            .into_iter()
            .map(|row| row.into_iter().map(GridCell::from).collect())
            .collect();
        Self::from_cells(cells)
    }

    fn from_cells(rows: Vec<Vec<GridCell>>) -> Result<Self, GridError> {
        let first = rows.first().ok_or(GridError::Empty)?;
        let width = first.len() as u32;
        if width == 0 {
            return Err(GridError::EmptyRow { row: 0 });
        }

        for (r, row) in rows.iter().enumerate() {
            let r = r as u32;
            if row.is_empty() {
                return Err(GridError::EmptyRow { row: r });
            }
            if row.len() as u32 != width {
                return Err(GridError::Ragged {
                    row: r,
                    expected: width,
                    found: row.len() as u32,
                });
            }
            for (c, cell) in row.iter().enumerate() {
                if !Hsl::new(cell.h, cell.s, cell.l).is_normalized() {
                    return Err(GridError::OutOfRange {
                        row: r,
                        column: c as u32,
                    });
                }
            }
        }

        Ok(Self { rows, width })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn sample(&self, row: u32, column: u32) -> Option<ColorSample> {
        let cell = self.rows.get(row as usize)?.get(column as usize)?;
        Some(ColorSample {
            row,
            column,
            h: cell.h,
            s: cell.s,
            l: cell.l,
        })
    }

    /// All samples of the rows in `rows`, row-major. Rows past the bottom are ignored.
    pub fn samples_in_rows(&self, rows: Range<u32>) -> impl Iterator<Item = ColorSample> + '_ {
        let end = rows.end.min(self.height());
        (rows.start..end).flat_map(move |row| {
            (0..self.width).filter_map(move |column| self.sample(row, column))
        })
    }
}

impl TryFrom<Vec<Vec<GridCell>>> for ColorSampleGrid {
    type Error = GridError;

    fn try_from(rows: Vec<Vec<GridCell>>) -> Result<Self, Self::Error> {
        Self::from_cells(rows)
    }
}

impl From<ColorSampleGrid> for Vec<Vec<GridCell>> {
    fn from(grid: ColorSampleGrid) -> Self {
        grid.rows
    }
}
