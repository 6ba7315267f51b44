// Addressing and paging of rectangular cell ranges.

use log::debug;

use crate::errors::BackendResult;

/// One row of cells, left to right.
pub type Row = Vec<String>;

/// The number of rows read per request when scanning a whole table.
pub const DEFAULT_FETCH_NUMBER: usize = 10;

/// Converts a column number (starting at 1) to the letters used in A1 notation.
///
/// 1 is `A`, 26 is `Z`, 27 is `AA`, 703 is `AAA`. Zero has no letters.
pub fn column_number_to_letter(column_number: usize) -> String {
    let mut letters: Vec<char> = Vec::new();
    let mut unconverted_part = column_number;
    while unconverted_part > 0 {
        let letter_index = (unconverted_part - 1) % 26;
        letters.push((b'A' + letter_index as u8) as char);
        unconverted_part = (unconverted_part - letter_index - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// The A1 notation of a rectangle of cells, e.g. `'Users'!A1:D10`.
pub fn a1_notation(sheet_name: &str, col1: usize, row1: usize, col2: usize, row2: usize) -> String {
    format!(
        "'{}'!{}{}:{}{}",
        sheet_name,
        column_number_to_letter(col1),
        row1,
        column_number_to_letter(col2),
        row2
    )
}

/// A row with no content at all.
pub fn is_empty_row(row: &[String]) -> bool {
    row.iter().all(|c| c.is_empty())
}

/// Reads all the rows of a table whose length is not known in advance.
///
/// Blocks of `fetch_number` rows and `width` columns are requested one at a
/// time, starting at row 1. Empty rows are dropped. The scan stops at the first
/// block without any non-empty row.
pub fn read_all_rows<F>(
    sheet_name: &str,
    width: usize,
    fetch_number: usize,
    mut fetch: F,
) -> BackendResult<Vec<Row>>
where
    F: FnMut(&str) -> BackendResult<Vec<Row>>,
{
    let fetch_number = fetch_number.max(1);
    let mut range_start = 1;
    let mut res: Vec<Row> = Vec::new();
    loop {
        let range_string = a1_notation(
            sheet_name,
            1,
            range_start,
            width,
            range_start + fetch_number - 1,
        );
        let values = fetch(&range_string)?;
        let mut block: Vec<Row> = values.into_iter().filter(|r| !is_empty_row(r)).collect();
        debug!(
            "read_all_rows: {} returned {} non-empty rows",
            range_string,
            block.len()
        );
        if block.is_empty() {
            return Ok(res);
        }
        res.append(&mut block);
        range_start += fetch_number;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<Row> {
        (1..=n).map(|i| vec![format!("user{}", i)]).collect()
    }

    #[test]
    fn column_letters() {
        let tests = [
            (1, "A"),
            (2, "B"),
            (3, "C"),
            (26, "Z"),
            (27, "AA"),
            (28, "AB"),
            (52, "AZ"),
            (53, "BA"),
            (702, "ZZ"),
            (703, "AAA"),
        ];
        for (n, letters) in tests {
            assert_eq!(column_number_to_letter(n), letters);
        }
        assert_eq!(column_number_to_letter(0), "");
    }

    #[test]
    fn a1() {
        assert_eq!(a1_notation("sheet_name", 1, 1, 2, 2), "'sheet_name'!A1:B2");
        assert_eq!(a1_notation("Users", 1, 11, 4, 20), "'Users'!A11:D20");
    }

    #[test]
    fn pagination_stops_at_first_empty_block() {
        let table = rows(23);
        let mut requested: Vec<String> = Vec::new();
        let res = read_all_rows("Users", 4, 10, |range| {
            requested.push(range.to_string());
            let start = (requested.len() - 1) * 10;
            Ok(table.iter().skip(start).take(10).cloned().collect())
        })
        .unwrap();
        assert_eq!(res, table);
        assert_eq!(
            requested,
            vec![
                "'Users'!A1:D10",
                "'Users'!A11:D20",
                "'Users'!A21:D30",
                "'Users'!A31:D40"
            ]
        );
    }

    #[test]
    fn empty_rows_are_dropped_but_do_not_stop_the_scan() {
        let mut calls = 0;
        let res = read_all_rows("History", 4, 3, |_| {
            calls += 1;
            Ok(match calls {
                1 => vec![vec!["a".to_string()], vec![], vec!["".to_string(), "".to_string()]],
                2 => vec![vec![], vec!["b".to_string()]],
                3 => vec![vec![], vec![]],
                _ => panic!("read past the end"),
            })
        })
        .unwrap();
        assert_eq!(res, vec![vec!["a".to_string()], vec!["b".to_string()]]);
        assert_eq!(calls, 3);
    }

    #[test]
    fn empty_table() {
        let res = read_all_rows("Users", 4, 10, |_| Ok(vec![])).unwrap();
        assert!(res.is_empty());
    }
}
