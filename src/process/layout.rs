/// Known bulletin templates, identified by the exact shape of the parsed sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Historic(HistoricVariant),
    /// 25 rows × 9 columns, one column per group.
    New,
    /// Any shape not listed above.
    Unknown { rows: usize, cols: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoricVariant {
    /// 18×8 and 17×8: label in column 2, figure in column 5.
    Standard,
    /// 17×9: the HDC figure sits in column 3 of the last selected row.
    MisplacedHdc,
}

impl Layout {
    pub fn classify((rows, cols): (usize, usize)) -> Self {
        match (rows, cols) {
            (18, 8) | (17, 8) => Layout::Historic(HistoricVariant::Standard),
            (17, 9) => Layout::Historic(HistoricVariant::MisplacedHdc),
            (25, 9) => Layout::New,
            (rows, cols) => Layout::Unknown { rows, cols },
        }
    }
}
