// An emulation of the spreadsheet, form and script service, stored in a
// single JSON file.
//
// The answers follow the shapes documented on the `Backend` trait. Failures
// of the remote script come back as an `error` payload, like the real
// service, and are turned into errors by the request executor.

use log::{debug, info, warn};

use book_club::*;
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JSValue};
use snafu::prelude::*;

use std::fs;
use std::path::{Path, PathBuf};

use crate::club::backend::Backend;
use crate::club::docs_adapter::{BOOK_CLUB_SHEET, GLOBAL_INFO_SHEET, USERS_SHEET};
use crate::club::*;

pub const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LocalSheet {
    pub title: String,
    #[serde(default)]
    pub cells: Vec<Row>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LocalFile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub sheets: Vec<LocalSheet>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum FormKind {
    #[serde(rename = "books")]
    Books,
    #[serde(rename = "poll")]
    Poll,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BookResponse {
    #[serde(rename = "formResponseId")]
    pub id: String,
    pub title: String,
    #[serde(rename = "authorFirstName")]
    pub author_first_name: String,
    #[serde(rename = "authorLastName")]
    pub author_last_name: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocalDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LocalForm {
    pub id: String,
    pub kind: FormKind,
    pub title: String,
    pub url: String,
    pub accepting: bool,
    #[serde(default)]
    pub responses: Vec<BookResponse>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub scores: Vec<u64>,
    #[serde(default)]
    pub created: Option<LocalDate>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalStore {
    #[serde(rename = "adminEmail")]
    pub admin_email: String,
    #[serde(rename = "nextId", default)]
    pub next_id: u64,
    #[serde(default)]
    pub files: Vec<LocalFile>,
    #[serde(default)]
    pub forms: Vec<LocalForm>,
    #[serde(default)]
    pub outbox: Vec<SentEmail>,
}

#[derive(Debug)]
pub struct LocalBackend {
    path: Option<PathBuf>,
    store: LocalStore,
    page_size: usize,
}

impl LocalBackend {
    /// A backend that is never written to disk.
    pub fn in_memory(admin_email: &str) -> LocalBackend {
        LocalBackend {
            path: None,
            store: LocalStore {
                admin_email: admin_email.to_string(),
                ..Default::default()
            },
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Loads the store at `path`, or starts an empty one if the file does not
    /// exist yet. The store is written back after every change.
    pub fn open(path: &str, admin_email: &str) -> ClubResult<LocalBackend> {
        let p = Path::new(path);
        let store: LocalStore = if p.exists() {
            let contents = fs::read_to_string(p).context(OpeningJsonSnafu { path })?;
            serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?
        } else {
            info!("No store found at {}, starting an empty one", path);
            LocalStore {
                admin_email: admin_email.to_string(),
                ..Default::default()
            }
        };
        Ok(LocalBackend {
            path: Some(p.to_path_buf()),
            store,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> LocalBackend {
        self.page_size = page_size.max(1);
        self
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn outbox(&self) -> &[SentEmail] {
        &self.store.outbox
    }

    pub fn form(&self, form_id: &str) -> Option<&LocalForm> {
        self.store.forms.iter().find(|f| f.id == form_id)
    }

    fn save(&self) -> BackendResult<()> {
        if let Some(path) = &self.path {
            let contents = serde_json::to_string_pretty(&self.store).map_err(|e| {
                BackendError::BackendFormat {
                    message: e.to_string(),
                }
            })?;
            fs::write(path, contents).map_err(|e| BackendError::BackendFormat {
                message: format!("cannot write {}: {}", path.display(), e),
            })?;
        }
        Ok(())
    }

    fn new_id(&mut self, prefix: &str) -> String {
        self.store.next_id += 1;
        format!("{}-{:04}", prefix, self.store.next_id)
    }

    /// Replaces the content of a sheet, creating the spreadsheet and the sheet
    /// when needed.
    pub fn install_sheet(&mut self, file_name: &str, sheet: &str, cells: Vec<Row>) -> BackendResult<()> {
        if !self.store.files.iter().any(|f| f.name == file_name) {
            let id = self.new_id("sheet");
            let owner = Some(self.store.admin_email.clone());
            self.store.files.push(LocalFile {
                id,
                name: file_name.to_string(),
                owner,
                sheets: vec![],
            });
        }
        let file = self
            .store
            .files
            .iter_mut()
            .find(|f| f.name == file_name)
            .context(BackendFormatSnafu {
                message: format!("missing spreadsheet {}", file_name),
            })?;
        match file.sheets.iter_mut().find(|s| s.title == sheet) {
            Some(s) => s.cells = cells,
            None => file.sheets.push(LocalSheet {
                title: sheet.to_string(),
                cells,
            }),
        }
        self.save()
    }

    fn club_sheet(&self, sheet: &str) -> ClubResult<&LocalSheet> {
        let file = match self.store.files.iter().find(|f| f.name == BOOK_CLUB_SHEET) {
            Some(f) => f,
            None => whatever!("No book club found. Run `bookclub init` first."),
        };
        match file.sheets.iter().find(|s| s.title == sheet) {
            Some(s) => Ok(s),
            None => whatever!("The book club has no {} sheet", sheet),
        }
    }

    fn user_form_id(&self, username: &str) -> ClubResult<String> {
        let users = self.club_sheet(USERS_SHEET)?;
        let row = match users
            .cells
            .iter()
            .find(|r| r.first().map(|s| s.as_str()) == Some(username))
        {
            Some(r) => r,
            None => whatever!("Unknown user {}", username),
        };
        match row.get(3) {
            Some(id) if !id.is_empty() => Ok(id.clone()),
            _ => whatever!("User {} has no suggestion form", username),
        }
    }

    /// Fills the suggestion form of a member, as the member would.
    /// Returns the id of the new response.
    pub fn submit_book(
        &mut self,
        username: &str,
        title: &str,
        first_name: &str,
        last_name: &str,
    ) -> ClubResult<String> {
        let form_id = self.user_form_id(username)?;
        let response_id = self.new_id("response");
        let form = match self.store.forms.iter_mut().find(|f| f.id == form_id) {
            Some(f) => f,
            None => whatever!("The form {} of {} was deleted", form_id, username),
        };
        if !form.accepting {
            whatever!("The form of {} does not accept suggestions", username)
        }
        form.responses.push(BookResponse {
            id: response_id.clone(),
            title: title.to_string(),
            author_first_name: first_name.to_string(),
            author_last_name: last_name.to_string(),
        });
        self.save()?;
        Ok(response_id)
    }

    /// Votes for an option of the current poll, numbered from 1.
    pub fn cast_vote(&mut self, option: usize) -> ClubResult<()> {
        let global = self.club_sheet(GLOBAL_INFO_SHEET)?;
        let poll_id = global
            .cells
            .first()
            .and_then(|r| r.first())
            .cloned()
            .unwrap_or_default();
        if poll_id.is_empty() {
            whatever!("There is no poll open")
        }
        let form = match self.store.forms.iter_mut().find(|f| f.id == poll_id) {
            Some(f) if f.kind == FormKind::Poll => f,
            _ => whatever!("The poll {} does not exist", poll_id),
        };
        if !form.accepting {
            whatever!("The poll is closed")
        }
        if option == 0 || option > form.scores.len() {
            whatever!(
                "Option {} is not between 1 and {}",
                option,
                form.scores.len()
            )
        }
        form.scores[option - 1] += 1;
        self.save()?;
        Ok(())
    }

    fn new_form(&mut self, kind: FormKind, title: String, options: Vec<String>) -> (String, String) {
        let id = self.new_id("form");
        let url = format!("https://forms.example.com/{}/viewform", id);
        let now = Local::now();
        self.store.forms.push(LocalForm {
            id: id.clone(),
            kind,
            title,
            url: url.clone(),
            accepting: true,
            responses: vec![],
            scores: vec![0; options.len()],
            options,
            created: Some(LocalDate {
                year: now.year(),
                month: now.month(),
                day: now.day(),
            }),
        });
        (id, url)
    }

    fn script_form(&mut self, form_id: &str) -> Result<&mut LocalForm, String> {
        self.store
            .forms
            .iter_mut()
            .find(|f| f.id == form_id)
            .ok_or_else(|| format!("No item with the given ID could be found: {}", form_id))
    }

    // The functions of the remote script. Errors are the messages reported
    // by the script.
    fn run_script(&mut self, function: &str, params: &[JSValue]) -> Result<JSValue, String> {
        match function {
            "getEmail" => Ok(json!(self.store.admin_email)),
            "makeBooksForm" => {
                let username = param_str(params, 1)?;
                let (id, url) = self.new_form(
                    FormKind::Books,
                    format!("{}'s book suggestions", username),
                    vec![],
                );
                Ok(json!({"form_url": url, "form_id": id}))
            }
            "getBookList" => {
                let form = self.script_form(&param_str(params, 0)?)?;
                Ok(json!(form.responses))
            }
            "delResponse" => {
                let response_id = param_str(params, 1)?;
                let form = self.script_form(&param_str(params, 0)?)?;
                let count = form.responses.len();
                form.responses.retain(|r| r.id != response_id);
                if form.responses.len() == count {
                    return Err(format!("No response with ID {}", response_id));
                }
                Ok(JSValue::Null)
            }
            "delAllResponses" => {
                let form = self.script_form(&param_str(params, 0)?)?;
                form.responses.clear();
                Ok(JSValue::Null)
            }
            "makePollForm" => {
                let options: Vec<String> = match params.get(1).and_then(|p| p.as_array()) {
                    Some(l) => l
                        .iter()
                        .map(|o| o.as_str().map(|s| s.to_string()))
                        .collect::<Option<Vec<String>>>()
                        .ok_or_else(|| "Poll options must be strings".to_string())?,
                    None => return Err("Missing parameter 1".to_string()),
                };
                let (id, url) = self.new_form(FormKind::Poll, "Book club poll".to_string(), options);
                Ok(json!({"form_url": url, "form_id": id}))
            }
            "getPollInfo" => {
                let form = self.script_form(&param_str(params, 0)?)?;
                if form.kind != FormKind::Poll {
                    return Err(format!("The form {} is not a poll", form.id));
                }
                let date = form.created.ok_or_else(|| "The poll has no date".to_string())?;
                Ok(json!({
                    "options": form.options,
                    "scores": form.scores,
                    "url": form.url,
                    "date": {"year": date.year, "month": date.month, "day": date.day},
                }))
            }
            "closeForm" => {
                let form = self.script_form(&param_str(params, 0)?)?;
                form.accepting = false;
                Ok(JSValue::Null)
            }
            "deleteForm" => {
                let form_id = param_str(params, 0)?;
                self.script_form(&form_id)?;
                self.store.forms.retain(|f| f.id != form_id);
                Ok(JSValue::Null)
            }
            "sendEmail" => {
                let email = SentEmail {
                    to: param_str(params, 0)?,
                    subject: param_str(params, 1)?,
                    body: param_str(params, 2)?,
                };
                info!("Sending an email to {}: {}", email.to, email.subject);
                self.store.outbox.push(email);
                Ok(JSValue::Null)
            }
            _ => Err(format!("Script function not found: {}", function)),
        }
    }
}

fn param_str(params: &[JSValue], idx: usize) -> Result<String, String> {
    params
        .get(idx)
        .and_then(|p| p.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| format!("Missing parameter {}", idx))
}

// (column, row), both starting at 1.
type Cell = (usize, usize);

fn parse_cell(cell: &str) -> Option<Cell> {
    let split = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    let column = letters
        .chars()
        .fold(0, |acc, c| acc * 26 + (c as usize - 'A' as usize + 1));
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        None
    } else {
        Some((column, row))
    }
}

/// Splits `'Sheet'!A1:D10` into the sheet name and its two corners.
fn parse_range(range: &str) -> Option<(String, Cell, Cell)> {
    let (sheet, cells) = range.rsplit_once('!')?;
    let sheet = sheet
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(sheet);
    let (start, end) = cells.split_once(':').unwrap_or((cells, cells));
    let (start, end) = (parse_cell(start)?, parse_cell(end)?);
    if start.0 > end.0 || start.1 > end.1 {
        return None;
    }
    Some((sheet.to_string(), start, end))
}

fn read_cells(cells: &[Row], start: Cell, end: Cell) -> Vec<Row> {
    let mut rows: Vec<Row> = (start.1..=end.1)
        .map(|r| {
            let mut row: Row = (start.0..=end.0)
                .map(|c| {
                    cells
                        .get(r - 1)
                        .and_then(|x| x.get(c - 1))
                        .cloned()
                        .unwrap_or_default()
                })
                .collect();
            while row.last().map_or(false, |c| c.is_empty()) {
                row.pop();
            }
            row
        })
        .collect();
    while rows.last().map_or(false, |r| r.is_empty()) {
        rows.pop();
    }
    rows
}

fn write_cells(cells: &mut Vec<Row>, start: Cell, values: &[Row]) {
    for (i, row) in values.iter().enumerate() {
        let r = start.1 + i;
        if cells.len() < r {
            cells.resize(r, Row::new());
        }
        let target = &mut cells[r - 1];
        for (j, value) in row.iter().enumerate() {
            let c = start.0 + j;
            if target.len() < c {
                target.resize(c, String::new());
            }
            target[c - 1] = value.clone();
        }
    }
}

fn bad_range(range: &str) -> BackendError {
    BackendError::BackendFormat {
        message: format!("Unable to parse range: {}", range),
    }
}

impl Backend for LocalBackend {
    fn list_files(&mut self, page_token: Option<&str>) -> BackendResult<JSValue> {
        let offset = match page_token {
            None => 0,
            Some(token) => token.parse::<usize>().ok().context(BackendFormatSnafu {
                message: format!("invalid page token {:?}", token),
            })?,
        };
        let files: Vec<JSValue> = self
            .store
            .files
            .iter()
            .skip(offset)
            .take(self.page_size)
            .map(|f| json!({"id": f.id, "name": f.name}))
            .collect();
        let mut res = json!({ "files": files });
        if offset + self.page_size < self.store.files.len() {
            res["nextPageToken"] = json!((offset + self.page_size).to_string());
        }
        Ok(res)
    }

    fn create_spreadsheet(&mut self, body: &JSValue) -> BackendResult<JSValue> {
        let title = body
            .pointer("/properties/title")
            .and_then(|t| t.as_str())
            .context(BackendFormatSnafu {
                message: "the spreadsheet has no title",
            })?;
        let mut sheets: Vec<LocalSheet> = body["sheets"]
            .as_array()
            .map(|l| {
                l.iter()
                    .filter_map(|s| s.pointer("/properties/title").and_then(|t| t.as_str()))
                    .map(|t| LocalSheet {
                        title: t.to_string(),
                        cells: vec![],
                    })
                    .collect()
            })
            .unwrap_or_default();
        if sheets.is_empty() {
            sheets.push(LocalSheet {
                title: "Sheet1".to_string(),
                cells: vec![],
            });
        }
        let id = self.new_id("sheet");
        debug!("create_spreadsheet: {} {}", id, title);
        self.store.files.push(LocalFile {
            id: id.clone(),
            name: title.to_string(),
            owner: None,
            sheets,
        });
        self.save()?;
        Ok(json!({"spreadsheetId": id, "properties": {"title": title}}))
    }

    fn share_file(&mut self, file_id: &str, email: &str) -> BackendResult<JSValue> {
        let permission_id = self.new_id("permission");
        let file = self
            .store
            .files
            .iter_mut()
            .find(|f| f.id == file_id)
            .context(BackendFormatSnafu {
                message: format!("File not found: {}", file_id),
            })?;
        file.owner = Some(email.to_string());
        self.save()?;
        Ok(json!({"id": permission_id, "role": "owner", "emailAddress": email}))
    }

    fn get_values(&mut self, spreadsheet_id: &str, range: &str) -> BackendResult<JSValue> {
        let (sheet_name, start, end) = parse_range(range).ok_or_else(|| bad_range(range))?;
        let file = self
            .store
            .files
            .iter()
            .find(|f| f.id == spreadsheet_id)
            .context(BackendFormatSnafu {
                message: format!("Requested entity was not found: {}", spreadsheet_id),
            })?;
        let sheet = file
            .sheets
            .iter()
            .find(|s| s.title == sheet_name)
            .ok_or_else(|| bad_range(range))?;
        let rows = read_cells(&sheet.cells, start, end);
        let mut res = json!({"range": range, "majorDimension": "ROWS"});
        if !rows.is_empty() {
            res["values"] = json!(rows);
        }
        Ok(res)
    }

    fn update_values(
        &mut self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Row],
    ) -> BackendResult<JSValue> {
        let (sheet_name, start, end) = parse_range(range).ok_or_else(|| bad_range(range))?;
        ensure!(
            values.len() <= end.1 - start.1 + 1
                && values.iter().all(|r| r.len() <= end.0 - start.0 + 1),
            BackendFormatSnafu {
                message: format!("the values do not fit in the range {}", range),
            }
        );
        let file = self
            .store
            .files
            .iter_mut()
            .find(|f| f.id == spreadsheet_id)
            .context(BackendFormatSnafu {
                message: format!("Requested entity was not found: {}", spreadsheet_id),
            })?;
        let sheet = file
            .sheets
            .iter_mut()
            .find(|s| s.title == sheet_name)
            .ok_or_else(|| bad_range(range))?;
        write_cells(&mut sheet.cells, start, values);
        self.save()?;
        Ok(json!({
            "spreadsheetId": spreadsheet_id,
            "updatedRange": range,
            "updatedRows": values.len(),
        }))
    }

    fn run_function(&mut self, function: &str, parameters: &[JSValue]) -> BackendResult<JSValue> {
        debug!("run_function: {} {:?}", function, parameters);
        let res = match self.run_script(function, parameters) {
            Ok(result) => json!({ "response": { "result": result } }),
            Err(message) => {
                warn!("Script function {} failed: {}", function, message);
                json!({
                    "error": {
                        "code": 3,
                        "message": "ScriptError",
                        "details": [{"errorMessage": message, "errorType": "ScriptError"}]
                    }
                })
            }
        };
        self.save()?;
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn backend_with_sheet() -> (LocalBackend, String) {
        let mut b = LocalBackend::in_memory("admin@example.com");
        let res = b
            .create_spreadsheet(&json!({
                "properties": {"title": "Club"},
                "sheets": [{"properties": {"title": "Users"}}]
            }))
            .unwrap();
        let id = res["spreadsheetId"].as_str().unwrap().to_string();
        (b, id)
    }

    #[test]
    fn ranges() {
        assert_eq!(
            parse_range("'Users'!A1:D10"),
            Some(("Users".to_string(), (1, 1), (4, 10)))
        );
        assert_eq!(
            parse_range("History!AA3"),
            Some(("History".to_string(), (27, 3), (27, 3)))
        );
        assert_eq!(parse_range("'Users'!D1:A1"), None);
        assert_eq!(parse_range("'Users'!A0:B1"), None);
        assert_eq!(parse_range("A1:B2"), None);
    }

    #[test]
    fn values_are_trimmed() {
        let (mut b, id) = backend_with_sheet();
        b.update_values(
            &id,
            "'Users'!A1:D3",
            &[row(&["a", "b"]), row(&["", "", "", ""]), row(&["c", "", "", "d"])],
        )
        .unwrap();
        let res = b.get_values(&id, "'Users'!A1:D10").unwrap();
        assert_eq!(
            res["values"],
            json!([["a", "b"], [], ["c", "", "", "d"]])
        );
        let res = b.get_values(&id, "'Users'!A4:D10").unwrap();
        assert!(res.get("values").is_none());
        let res = b.get_values(&id, "'Users'!B3:C3").unwrap();
        assert!(res.get("values").is_none());
    }

    #[test]
    fn writes_outside_the_range_fail() {
        let (mut b, id) = backend_with_sheet();
        let res = b.update_values(&id, "'Users'!A1:B1", &[row(&["a", "b", "c"])]);
        assert!(matches!(res, Err(BackendError::BackendFormat { .. })));
        let res = b.get_values(&id, "'Nope'!A1:B1");
        assert!(matches!(res, Err(BackendError::BackendFormat { .. })));
        let res = b.get_values(&id, "Users");
        assert!(matches!(res, Err(BackendError::BackendFormat { .. })));
    }

    #[test]
    fn store_write_failures_are_not_retried() {
        let mut b =
            LocalBackend::open("/nonexistent/dir/store.json", "admin@example.com").unwrap();
        let res = b.create_spreadsheet(&json!({"properties": {"title": "BookClubInfo"}}));
        assert!(matches!(res, Err(BackendError::BackendFormat { .. })));
        assert!(!res.unwrap_err().is_transient());
    }

    #[test]
    fn files_are_paginated() {
        let mut b = LocalBackend::in_memory("admin@example.com").with_page_size(2);
        for name in ["a", "b", "c"] {
            b.create_spreadsheet(&json!({"properties": {"title": name}}))
                .unwrap();
        }
        let page = b.list_files(None).unwrap();
        assert_eq!(page["files"].as_array().unwrap().len(), 2);
        let token = page["nextPageToken"].as_str().unwrap().to_string();
        let page = b.list_files(Some(&token)).unwrap();
        assert_eq!(page["files"], json!([{"id": "sheet-0003", "name": "c"}]));
        assert!(page.get("nextPageToken").is_none());
    }

    #[test]
    fn script_errors_are_payloads() {
        let mut b = LocalBackend::in_memory("admin@example.com");
        let res = b.run_function("closeForm", &[json!("form-9999")]).unwrap();
        assert!(res["error"]["details"][0]["errorMessage"]
            .as_str()
            .unwrap()
            .contains("form-9999"));
        let res = b.run_function("getEmail", &[]).unwrap();
        assert_eq!(res["response"]["result"], json!("admin@example.com"));
    }

    #[test]
    fn book_forms() {
        let mut b = LocalBackend::in_memory("admin@example.com");
        let res = b
            .run_function("makeBooksForm", &[json!("bot@example.com"), json!("anna")])
            .unwrap();
        let form_id = res["response"]["result"]["form_id"].as_str().unwrap().to_string();
        b.store.forms[0].responses.push(BookResponse {
            id: "r1".to_string(),
            title: "Emma".to_string(),
            author_first_name: "Jane".to_string(),
            author_last_name: "Austen".to_string(),
        });
        let res = b.run_function("getBookList", &[json!(form_id)]).unwrap();
        assert_eq!(
            res["response"]["result"],
            json!([{
                "formResponseId": "r1",
                "title": "Emma",
                "authorFirstName": "Jane",
                "authorLastName": "Austen"
            }])
        );
        b.run_function("delResponse", &[json!(form_id), json!("r1")])
            .unwrap();
        let res = b
            .run_function("delResponse", &[json!(form_id), json!("r1")])
            .unwrap();
        assert!(res.get("error").is_some());
    }

    #[test]
    fn store_file_round_trip() {
        let path = std::env::temp_dir().join(format!("bookclub-store-{}.json", std::process::id()));
        let path_str = path.display().to_string();
        let _ = fs::remove_file(&path);
        let mut b = LocalBackend::open(&path_str, "admin@example.com").unwrap();
        b.install_sheet("Club", "Users", vec![row(&["anna"])]).unwrap();
        let b2 = LocalBackend::open(&path_str, "other@example.com").unwrap();
        assert_eq!(b2.store(), b.store());
        assert_eq!(b2.store().admin_email, "admin@example.com");
        fs::remove_file(&path).unwrap();
    }
}
