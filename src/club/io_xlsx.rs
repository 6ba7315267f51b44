use log::{debug, info, warn};

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use chrono::NaiveDate;

use crate::club::docs_adapter::{BOOK_CLUB_SHEET, GLOBAL_INFO_SHEET, HISTORY_SHEET, USERS_SHEET};
use crate::club::io_local::LocalBackend;
use crate::club::*;

// Excel day numbers start on 1899-12-30 and end on 9999-12-31.
const EXCEL_MAX_DAY: f64 = 2958465.0;

/// Copies the tables of an exported club workbook into the local store.
/// Returns the number of sheets read.
///
/// `Users` and `History` must be present. A workbook without `GlobalInfo`
/// leaves the club without a current poll.
pub fn import_workbook(path: &str, backend: &mut LocalBackend) -> ClubResult<usize> {
    debug!("import_workbook: path: {:?}", path);
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    let mut count = 0;
    for (sheet, required) in [
        (USERS_SHEET, true),
        (HISTORY_SHEET, true),
        (GLOBAL_INFO_SHEET, false),
    ] {
        let cells = match workbook.worksheet_range(sheet) {
            Some(wrange) => {
                let wrange = wrange.context(OpeningExcelSnafu { path })?;
                count += 1;
                range_to_rows(&wrange)
            }
            None if required => return MissingSheetSnafu { path, sheet }.fail(),
            None => {
                info!("import_workbook: no {} sheet in {}", sheet, path);
                vec![]
            }
        };
        info!("import_workbook: {} rows in {}", cells.len(), sheet);
        backend.install_sheet(BOOK_CLUB_SHEET, sheet, cells)?;
    }
    Ok(count)
}

// The range starts at its first non-empty cell; the rows are padded so that
// row 1 stays row 1.
fn range_to_rows(wrange: &Range<DataType>) -> Vec<Row> {
    let (row0, col0) = wrange.start().unwrap_or((0, 0));
    let mut rows: Vec<Row> = vec![Row::new(); row0 as usize];
    for r in wrange.rows() {
        let mut row: Row = vec![String::new(); col0 as usize];
        row.extend(r.iter().map(cell_to_string));
        while row.last().map_or(false, |c| c.is_empty()) {
            row.pop();
        }
        rows.push(row);
    }
    rows
}

/// The text of a cell, as the spreadsheet service would display it.
pub fn cell_to_string(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::DateTime(f) if (1.0..=EXCEL_MAX_DAY).contains(f) => NaiveDate::from_ymd_opt(1899, 12, 30)
            .and_then(|d| d.checked_add_signed(chrono::Duration::days(*f as i64)))
            .map(|d| d.format("%Y/%m/%d").to_string())
            .unwrap_or_else(|| f.to_string()),
        DataType::DateTime(f) => f.to_string(),
        DataType::Empty => String::new(),
        x => {
            warn!("cell_to_string: unreadable cell {:?}", x);
            String::new()
        }
    }
}
