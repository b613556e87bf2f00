//! Excel Workbook Module
//! Reads the first worksheet of `.xlsx`/`.xls` files with calamine and
//! writes single-sheet `.xlsx` packages through direct ZIP/XML generation.

use calamine::{open_workbook, Data, Range, Reader, Sheets, Xls, Xlsx};
use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use ::zip::write::FileOptions;
use ::zip::{CompressionMethod, ZipWriter};

use super::format::FileFormat;
use super::loader::LoaderError;
use super::writer::WriterError;

/// Open a workbook of the given flavour and convert its first worksheet.
pub(crate) fn read_workbook(path: &Path, format: FileFormat) -> Result<DataFrame, LoaderError> {
    let mut workbook = match format {
        FileFormat::Xls => {
            let xls: Xls<_> = open_workbook(path).map_err(calamine::Error::from)?;
            Sheets::Xls(xls)
        }
        _ => {
            let xlsx: Xlsx<_> = open_workbook(path).map_err(calamine::Error::from)?;
            Sheets::Xlsx(xlsx)
        }
    };

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(calamine::Error::Msg("workbook has no worksheets"))??;

    Ok(range_to_dataframe(&range)?)
}

static EMPTY_CELL: Data = Data::Empty;

/// Inferred storage type for one worksheet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Empty,
    Bool,
    Int,
    Float,
    DateTime,
    Text,
}

/// Error cells (`#DIV/0!`, `#N/A`, ...) read as missing.
fn cell_kind(cell: &Data) -> CellKind {
    match cell {
        Data::Empty | Data::Error(_) => CellKind::Empty,
        Data::DateTime(dt) if dt.is_datetime() => CellKind::DateTime,
        Data::Bool(_) => CellKind::Bool,
        Data::Int(_) => CellKind::Int,
        Data::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => CellKind::Int,
        Data::Float(_) => CellKind::Float,
        _ => CellKind::Text,
    }
}

/// Widest kind needed to hold both `a` and `b`.
fn widen(a: CellKind, b: CellKind) -> CellKind {
    use CellKind::*;
    match (a, b) {
        (Empty, k) | (k, Empty) => k,
        (x, y) if x == y => x,
        (Int, Float) | (Float, Int) => Float,
        _ => Text,
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::DateTime(dt) if dt.is_datetime() => dt.as_datetime().map(|t| t.to_string()),
        other => Some(other.to_string()),
    }
}

/// Milliseconds since the Unix epoch.
fn cell_timestamp(cell: &Data) -> Option<i64> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|t| t.and_utc().timestamp_millis()),
        _ => None,
    }
}

fn cell_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(v) => Some(*v as f64),
        Data::Float(v) => Some(*v),
        _ => None,
    }
}

/// Convert a worksheet range into a DataFrame. The first row holds the column
/// names; blank names become `Unnamed: {i}` and repeats get a `.{n}` suffix.
fn range_to_dataframe(range: &Range<Data>) -> PolarsResult<DataFrame> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let body: Vec<&[Data]> = rows.collect();

    let mut seen = HashSet::new();
    let columns = header
        .iter()
        .enumerate()
        .map(|(idx, name_cell)| {
            let name = match cell_text(name_cell) {
                Some(name) if !name.is_empty() => name,
                _ => format!("Unnamed: {}", idx),
            };
            let name = unique_name(name, &mut seen);
            let cells = body.iter().map(move |row| row.get(idx).unwrap_or(&EMPTY_CELL));
            build_column(name, cells)
        })
        .collect::<PolarsResult<Vec<_>>>()?;

    DataFrame::new(columns)
}

/// `name`, or the first free `name.1`, `name.2`, ... when it is taken.
fn unique_name(name: String, seen: &mut HashSet<String>) -> String {
    let mut candidate = name.clone();
    let mut n = 0;
    while !seen.insert(candidate.clone()) {
        n += 1;
        candidate = format!("{}.{}", name, n);
    }
    candidate
}

fn build_column<'a>(
    name: String,
    cells: impl Iterator<Item = &'a Data> + Clone,
) -> PolarsResult<Column> {
    let kind = cells
        .clone()
        .fold(CellKind::Empty, |acc, cell| widen(acc, cell_kind(cell)));

    let column = match kind {
        CellKind::Bool => {
            let values: Vec<Option<bool>> = cells
                .map(|cell| match cell {
                    Data::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), values)
        }
        CellKind::Int => {
            let values: Vec<Option<i64>> =
                cells.map(|cell| cell_f64(cell).map(|v| v as i64)).collect();
            Column::new(name.into(), values)
        }
        CellKind::Float | CellKind::Empty => {
            let values: Vec<Option<f64>> = cells.map(cell_f64).collect();
            Column::new(name.into(), values)
        }
        CellKind::DateTime => {
            let values: Vec<Option<i64>> = cells.map(cell_timestamp).collect();
            Column::new(name.into(), values)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        }
        CellKind::Text => {
            let values: Vec<Option<String>> = cells.map(cell_text).collect();
            Column::new(name.into(), values)
        }
    };
    Ok(column)
}

/// Cell payload as it will be written into the sheet XML.
enum SheetCell {
    Number(f64),
    Bool(bool),
    Text(String),
}

/// Single-sheet `.xlsx` writer.
pub(crate) struct XlsxWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
    sheet_name: String,
    include_header: bool,
}

impl XlsxWriter<File> {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write + Seek> XlsxWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            zip: ZipWriter::new(inner),
            sheet_name: "Sheet1".to_string(),
            include_header: true,
        }
    }

    pub fn with_sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = name.to_string();
        self
    }

    pub fn include_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Write `df` as the only worksheet and close the package.
    pub fn finish(mut self, df: &DataFrame) -> Result<(), WriterError> {
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        self.zip.start_file("[Content_Types].xml", options)?;
        self.zip.write_all(content_types_xml().as_bytes())?;

        self.zip.start_file("_rels/.rels", options)?;
        self.zip.write_all(rels_xml().as_bytes())?;

        self.zip.start_file("xl/workbook.xml", options)?;
        self.zip.write_all(workbook_xml(&self.sheet_name).as_bytes())?;

        self.zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        self.zip.write_all(workbook_rels_xml().as_bytes())?;

        self.zip.start_file("xl/styles.xml", options)?;
        self.zip.write_all(styles_xml().as_bytes())?;

        self.zip.start_file("xl/worksheets/sheet1.xml", options)?;
        let sheet = sheet_xml(df, self.include_header)?;
        self.zip.write_all(sheet.as_bytes())?;

        self.zip.finish()?;
        Ok(())
    }
}

/// Extract one column's cells in sheet form. NaN and infinities have no
/// Excel representation and are written as blank cells.
fn sheet_cells(column: &Column) -> PolarsResult<Vec<Option<SheetCell>>> {
    let cells: Vec<Option<SheetCell>> = match column.dtype() {
        DataType::Boolean => column
            .bool()?
            .into_iter()
            .map(|v| v.map(SheetCell::Bool))
            .collect(),
        dtype if super::is_numeric_dtype(dtype) => {
            let values = column.cast(&DataType::Float64)?;
            values
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()).map(SheetCell::Number))
                .collect()
        }
        _ => {
            let values = column.cast(&DataType::String)?;
            values
                .str()?
                .into_iter()
                .map(|v| v.map(|s| SheetCell::Text(s.to_string())))
                .collect()
        }
    };
    Ok(cells)
}

/// Spreadsheet column letters for a zero-based index (0 -> A, 26 -> AA).
fn column_letters(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn cell_xml(reference: &str, cell: &SheetCell) -> String {
    match cell {
        SheetCell::Number(v) => format!(r#"<c r="{}"><v>{}</v></c>"#, reference, v),
        SheetCell::Bool(b) => format!(r#"<c r="{}" t="b"><v>{}</v></c>"#, reference, u8::from(*b)),
        SheetCell::Text(s) => format!(
            r#"<c r="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            reference,
            escape_xml(s)
        ),
    }
}

fn sheet_xml(df: &DataFrame, include_header: bool) -> PolarsResult<String> {
    let columns = df
        .get_columns()
        .iter()
        .map(sheet_cells)
        .collect::<PolarsResult<Vec<_>>>()?;
    let letters: Vec<String> = (0..df.width()).map(column_letters).collect();

    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    let mut row_num = 1usize;
    if include_header {
        xml.push_str(&format!(r#"<row r="{}">"#, row_num));
        for (name, col) in df.get_column_names().iter().zip(&letters) {
            let cell = SheetCell::Text(name.to_string());
            xml.push_str(&cell_xml(&format!("{}{}", col, row_num), &cell));
        }
        xml.push_str("</row>");
        row_num += 1;
    }

    for row_idx in 0..df.height() {
        xml.push_str(&format!(r#"<row r="{}">"#, row_num));
        for (cells, col) in columns.iter().zip(&letters) {
            if let Some(cell) = &cells[row_idx] {
                xml.push_str(&cell_xml(&format!("{}{}", col, row_num), cell));
            }
        }
        xml.push_str("</row>");
        row_num += 1;
    }

    xml.push_str("</sheetData></worksheet>");
    Ok(xml)
}

fn content_types_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
</Types>"#
}

fn rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
}

fn workbook_xml(sheet_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#,
        escape_xml(sheet_name)
    )
}

fn workbook_rels_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#
}

fn styles_xml() -> &'static str {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>
<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>
<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
<cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>
</styleSheet>"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};

    fn header_range(names: &[&str], rows: usize) -> Range<Data> {
        let mut range: Range<Data> = Range::new((0, 0), (rows as u32, names.len() as u32 - 1));
        for (col, name) in names.iter().enumerate() {
            range.set_value((0, col as u32), Data::String(name.to_string()));
        }
        range
    }

    #[test]
    fn repeated_headers_get_suffixes() {
        let mut range = header_range(&["k", "k", "k", "v"], 1);
        for col in 0..4 {
            range.set_value((1, col), Data::Int(col as i64));
        }

        let df = range_to_dataframe(&range).unwrap();
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["k", "k.1", "k.2", "v"]);
    }

    #[test]
    fn error_cells_read_as_missing() {
        let mut range = header_range(&["ratio"], 3);
        range.set_value((1, 0), Data::Float(0.5));
        range.set_value((2, 0), Data::Error(CellErrorType::Div0));
        range.set_value((3, 0), Data::Float(1.5));

        let df = range_to_dataframe(&range).unwrap();
        let ratio: Vec<Option<f64>> =
            df.column("ratio").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(ratio, vec![Some(0.5), None, Some(1.5)]);
    }

    #[test]
    fn date_cells_become_datetimes() {
        let mut range = header_range(&["when"], 2);
        let noon = ExcelDateTime::new(45292.5, ExcelDateTimeType::DateTime, false);
        range.set_value((1, 0), Data::DateTime(noon));

        let df = range_to_dataframe(&range).unwrap();
        let when = df.column("when").unwrap();
        assert_eq!(when.dtype(), &DataType::Datetime(TimeUnit::Milliseconds, None));
        let millis: Vec<Option<i64>> = when
            .cast(&DataType::Int64)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        // 2024-01-01 12:00:00
        assert_eq!(millis, vec![Some(1_704_110_400_000), None]);
    }

    #[test]
    fn column_letters_roll_over() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn widening_prefers_float_then_text() {
        assert_eq!(widen(CellKind::Int, CellKind::Float), CellKind::Float);
        assert_eq!(widen(CellKind::Empty, CellKind::Bool), CellKind::Bool);
        assert_eq!(widen(CellKind::Bool, CellKind::Int), CellKind::Text);
        assert_eq!(widen(CellKind::Float, CellKind::Text), CellKind::Text);
    }

    #[test]
    fn range_header_and_types() {
        let mut range: Range<Data> = Range::new((0, 0), (3, 2));
        range.set_value((0, 0), Data::String("name".into()));
        range.set_value((0, 1), Data::String("age".into()));
        range.set_value((0, 2), Data::Empty);
        range.set_value((1, 0), Data::String("Alice".into()));
        range.set_value((1, 1), Data::Float(25.0));
        range.set_value((1, 2), Data::Float(1.5));
        range.set_value((2, 0), Data::String("Bob".into()));
        range.set_value((2, 1), Data::Int(30));
        range.set_value((3, 0), Data::Empty);
        range.set_value((3, 1), Data::Float(35.0));
        range.set_value((3, 2), Data::Float(2.5));

        let df = range_to_dataframe(&range).unwrap();
        assert_eq!(df.shape(), (3, 3));
        assert_eq!(df.get_column_names()[2].as_str(), "Unnamed: 2");
        assert_eq!(df.column("age").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("Unnamed: 2").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("name").unwrap().null_count(), 1);
    }

    #[test]
    fn sheet_xml_skips_missing_cells() {
        let df = df!(
            "a" => &[Some(1.0), None],
            "b" => &["x<y", "z"]
        )
        .unwrap();
        let xml = sheet_xml(&df, true).unwrap();
        assert!(xml.contains(r#"<c r="A1" t="inlineStr">"#));
        assert!(xml.contains(r#"<c r="A2"><v>1</v></c>"#));
        assert!(!xml.contains(r#"r="A3""#));
        assert!(xml.contains("x&lt;y"));
    }
}
