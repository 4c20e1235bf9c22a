/// A single spreadsheet cell as read from the workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

static EMPTY: Cell = Cell::Empty;

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value of the cell, or `None` when it holds no number.
    /// Numeric text is accepted; fractional values are rounded.
    pub fn to_integer(&self) -> Option<i64> {
        let number = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<i64>() {
                    return Some(i);
                }
                s.parse::<f64>().ok()?
            }
            Cell::Empty => return None,
        };
        number.is_finite().then(|| number.round() as i64)
    }
}

/// A data row together with its offset below the header row.
/// Offsets count blank rows, so they survive blank-row removal.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow {
    pub offset: usize,
    pub cells: Vec<Cell>,
}

impl SheetRow {
    pub fn cell(&self, col: usize) -> &Cell {
        self.cells.get(col).unwrap_or(&EMPTY)
    }
}

/// Cell grid of one worksheet with the header row consumed and blank rows dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSheet {
    rows: Vec<SheetRow>,
    width: usize,
}

impl ParsedSheet {
    pub fn new(rows: Vec<SheetRow>, width: usize) -> Self {
        Self { rows, width }
    }

    /// The first non-empty row is the header. Width is the widest row of the
    /// whole grid, header included.
    pub fn from_grid(grid: Vec<Vec<Cell>>) -> Self {
        let width = grid.iter().map(Vec::len).max().unwrap_or(0);
        let rows = grid
            .into_iter()
            .skip_while(|cells| is_blank(cells))
            .skip(1)
            .enumerate()
            .filter(|(_, cells)| !is_blank(cells))
            .map(|(offset, cells)| SheetRow { offset, cells })
            .collect();
        Self { rows, width }
    }

    /// (row count, column count)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.width)
    }

    pub fn rows(&self) -> &[SheetRow] {
        &self.rows
    }
}

fn is_blank(cells: &[Cell]) -> bool {
    cells.iter().all(Cell::is_empty)
}
