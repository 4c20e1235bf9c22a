// src/process/ods.rs
//
// Minimal OpenDocument spreadsheet reader: the first table of `content.xml`
// as a grid of cells, anchored at A1.

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::{
    fs::File,
    io::{BufReader, Read, Seek},
    path::Path,
};
use zip::ZipArchive;

use super::sheet::Cell;

/// Upper bound on how far a single repeated cell or row is expanded.
const MAX_REPEAT: usize = 16_384;

/// Open `path` and return the rows of its first worksheet.
/// Trailing empty cells and trailing empty rows are trimmed.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_ods<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<Cell>>> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open spreadsheet: {:?}", path.as_ref()))?;
    read_ods_from(BufReader::new(file))
        .with_context(|| format!("Failed to read spreadsheet: {:?}", path.as_ref()))
}

pub fn read_ods_from<R: Read + Seek>(reader: R) -> Result<Vec<Vec<Cell>>> {
    let mut archive = ZipArchive::new(reader).context("not an OpenDocument archive")?;
    let mut entry = archive
        .by_name("content.xml")
        .context("archive has no content.xml")?;
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut buf)
        .context("Failed to read content.xml into memory")?;
    parse_first_table(&buf)
}

#[derive(Default)]
struct RowBuilder {
    cells: Vec<Cell>,
    pending_empty: usize,
    repeat: usize,
}

impl RowBuilder {
    fn push(&mut self, cell: Cell, repeat: usize) {
        if cell.is_empty() {
            self.pending_empty = self.pending_empty.saturating_add(repeat);
            return;
        }
        let pending = self.pending_empty.min(MAX_REPEAT);
        self.cells.extend(std::iter::repeat(Cell::Empty).take(pending));
        self.pending_empty = 0;
        self.cells
            .extend(std::iter::repeat(cell).take(repeat.min(MAX_REPEAT)));
    }
}

#[derive(Default)]
struct GridBuilder {
    rows: Vec<Vec<Cell>>,
    pending_blank: usize,
}

impl GridBuilder {
    fn push(&mut self, row: RowBuilder) {
        if row.cells.is_empty() {
            self.pending_blank = self.pending_blank.saturating_add(row.repeat);
            return;
        }
        for _ in 0..self.pending_blank.min(MAX_REPEAT) {
            self.rows.push(Vec::new());
        }
        self.pending_blank = 0;
        for _ in 1..row.repeat.min(MAX_REPEAT) {
            self.rows.push(row.cells.clone());
        }
        self.rows.push(row.cells);
    }
}

struct CellBuilder {
    number: Option<f64>,
    text: String,
    paragraphs: usize,
    repeat: usize,
}

impl CellBuilder {
    fn from_start(e: &BytesStart) -> Result<Self> {
        let repeat = repeat_attr(e, b"table:number-columns-repeated")?;
        let value_type = attr(e, b"office:value-type")?;
        let number = match value_type.as_deref() {
            Some("float") | Some("percentage") | Some("currency") => {
                attr(e, b"office:value")?.and_then(|v| v.trim().parse::<f64>().ok())
            }
            _ => None,
        };
        Ok(Self {
            number,
            text: String::new(),
            paragraphs: 0,
            repeat,
        })
    }

    fn finish(self) -> (Cell, usize) {
        let cell = match self.number {
            Some(n) => Cell::Number(n),
            None if self.text.trim().is_empty() => Cell::Empty,
            None => Cell::Text(self.text),
        };
        (cell, self.repeat)
    }
}

fn attr(e: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    Ok(match e.try_get_attribute(name)? {
        Some(a) => Some(a.unescape_value()?.into_owned()),
        None => None,
    })
}

fn repeat_attr(e: &BytesStart, name: &[u8]) -> Result<usize> {
    Ok(attr(e, name)?
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1))
}

fn is_cell(name: &[u8]) -> bool {
    name == b"table:table-cell" || name == b"table:covered-table-cell"
}

fn parse_first_table(xml: &[u8]) -> Result<Vec<Vec<Cell>>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut grid = GridBuilder::default();
    let mut in_table = false;
    let mut row: Option<RowBuilder> = None;
    let mut cell: Option<CellBuilder> = None;
    let mut in_paragraph = false;

    loop {
        match reader
            .read_event_into(&mut buf)
            .context("malformed content.xml")?
        {
            Event::Start(e) => {
                let name = e.name();
                match name.as_ref() {
                    b"table:table" => in_table = true,
                    b"table:table-row" if in_table => {
                        row = Some(RowBuilder {
                            repeat: repeat_attr(&e, b"table:number-rows-repeated")?,
                            ..RowBuilder::default()
                        });
                    }
                    n if is_cell(n) && row.is_some() => cell = Some(CellBuilder::from_start(&e)?),
                    b"text:p" => {
                        if let Some(c) = cell.as_mut() {
                            if c.paragraphs > 0 {
                                c.text.push('\n');
                            }
                            c.paragraphs += 1;
                            in_paragraph = true;
                        }
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                let name = e.name();
                match name.as_ref() {
                    b"table:table-row" if in_table => grid.push(RowBuilder {
                        repeat: repeat_attr(&e, b"table:number-rows-repeated")?,
                        ..RowBuilder::default()
                    }),
                    n if is_cell(n) => {
                        if let Some(r) = row.as_mut() {
                            let (c, repeat) = CellBuilder::from_start(&e)?.finish();
                            r.push(c, repeat);
                        }
                    }
                    b"text:s" if in_paragraph => {
                        if let Some(c) = cell.as_mut() {
                            let spaces = repeat_attr(&e, b"text:c")?.min(MAX_REPEAT);
                            c.text.extend(std::iter::repeat(' ').take(spaces));
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) if in_paragraph => {
                if let Some(c) = cell.as_mut() {
                    c.text.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => {
                let name = e.name();
                match name.as_ref() {
                    b"text:p" => in_paragraph = false,
                    n if is_cell(n) => {
                        if let (Some(c), Some(r)) = (cell.take(), row.as_mut()) {
                            let (c, repeat) = c.finish();
                            r.push(c, repeat);
                        }
                    }
                    b"table:table-row" => {
                        if let Some(r) = row.take() {
                            grid.push(r);
                        }
                    }
                    b"table:table" => break,
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(grid.rows)
}
