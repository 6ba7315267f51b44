// DataAccess over the spreadsheet, form and script service.
//
// The whole state of a club lives in the `BookClubInfo` spreadsheet (see the
// manual of the book_club crate for the layout). Every request goes through
// the retrying executor. The spreadsheet id and the Users and History tables
// are cached; `refresh` drops the cache.

use log::{debug, info, warn};

use book_club::range::{a1_notation, read_all_rows, DEFAULT_FETCH_NUMBER};
use book_club::retry::RetryPolicy;
use book_club::*;
use chrono::{Datelike, Local};
use serde_json::{json, Value as JSValue};
use snafu::prelude::*;

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use crate::club::backend::Backend;

pub const BOOK_CLUB_SHEET: &str = "BookClubInfo";
pub const USERS_SHEET: &str = "Users";
pub const HISTORY_SHEET: &str = "History";
pub const GLOBAL_INFO_SHEET: &str = "GlobalInfo";

const USER_SHEET_WIDTH: usize = 4;
const HISTORY_SHEET_WIDTH: usize = 4;
// identifier, form id, response id, title, first name, last name
const LOCATION_WIDTH: usize = 6;
// (column, row) of the id of the current poll
const POLL_ID_POSITION: (usize, usize) = (1, 1);

// Cache entries
const SHEET_ID: &str = "book_club_sheet_id";
const USER_TABLE: &str = "user_table";
const HISTORY: &str = "history";

/// Where a suggestion lives: one response of a member's form.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FormLocation {
    form_id: String,
    response_id: String,
}

impl FormLocation {
    pub fn new(form_id: &str, response_id: &str) -> FormLocation {
        FormLocation {
            form_id: form_id.to_string(),
            response_id: response_id.to_string(),
        }
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }
}

impl Location for FormLocation {
    fn compare(&self, other: &dyn Location) -> bool {
        other
            .as_any()
            .downcast_ref::<FormLocation>()
            .map_or(false, |o| o == self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AdapterSettings {
    pub retry: RetryPolicy,
    /// Rows requested at a time when reading a table.
    pub fetch_number: usize,
    /// The account that manages the forms.
    pub service_email: String,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        AdapterSettings {
            retry: RetryPolicy::DEFAULT_POLICY,
            fetch_number: DEFAULT_FETCH_NUMBER,
            service_email: String::new(),
        }
    }
}

pub struct DocsDataAccess<B: Backend> {
    backend: B,
    settings: AdapterSettings,
    admin_email: String,
    ids: Cache<String>,
    tables: Cache<Vec<Row>>,
}

/// The `Title: Last, First` label of a book in a poll form.
pub fn option_identifier(book: &Book) -> String {
    format!(
        "{}: {}, {}",
        book.title(),
        book.author_last_name(),
        book.author_first_name()
    )
}

/// Splits a `Title: Last, First` label into (title, first, last).
pub fn parse_option_identifier(identifier: &str) -> BackendResult<(String, String, String)> {
    let (title, author) = identifier.split_once(": ").context(BackendFormatSnafu {
        message: format!("cannot read the poll option {:?}", identifier),
    })?;
    let (last, first) = author.split_once(", ").context(BackendFormatSnafu {
        message: format!("cannot read the author of the poll option {:?}", identifier),
    })?;
    Ok((title.to_string(), first.to_string(), last.to_string()))
}

fn cell_to_string(cell: &JSValue) -> BackendResult<String> {
    match cell {
        JSValue::String(s) => Ok(s.clone()),
        JSValue::Number(n) => Ok(n.to_string()),
        JSValue::Bool(b) => Ok(b.to_string()),
        JSValue::Null => Ok(String::new()),
        x => BackendFormatSnafu {
            message: format!("unexpected cell {}", x),
        }
        .fail(),
    }
}

/// The `values` of a range, as rows of strings.
fn values_to_rows(result: &JSValue) -> BackendResult<Vec<Row>> {
    let values = match result.get("values") {
        None => return Ok(vec![]),
        Some(v) => v.as_array().context(BackendFormatSnafu {
            message: "values is not an array",
        })?,
    };
    values
        .iter()
        .map(|row| -> BackendResult<Row> {
            row.as_array()
                .context(BackendFormatSnafu {
                    message: "a row of values is not an array",
                })?
                .iter()
                .map(cell_to_string)
                .collect()
        })
        .collect()
}

fn read_js_int(x: Option<&JSValue>) -> Option<i64> {
    match x {
        Some(JSValue::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(JSValue::String(s)) => s.parse::<i64>().ok(),
        _ => None,
    }
}

fn read_js_str(x: &JSValue, field: &str) -> BackendResult<String> {
    x.get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .context(BackendFormatSnafu {
            message: format!("missing field {} in {}", field, x),
        })
}

fn today() -> BackendResult<Date> {
    let now = Local::now();
    Ok(Date::new(now.year(), now.month(), now.day())?)
}

impl<B: Backend> DocsDataAccess<B> {
    /// Connects to the backend and looks up the administrator's address.
    pub fn connect(backend: B, settings: AdapterSettings) -> BackendResult<DocsDataAccess<B>> {
        let mut res = DocsDataAccess {
            backend,
            settings,
            admin_email: String::new(),
            ids: Cache::new(),
            tables: Cache::new(),
        };
        let email = res.run_function("getEmail", vec![])?;
        let email = email.as_str().unwrap_or_default().to_string();
        ensure!(
            !email.is_empty(),
            RemoteScriptSnafu {
                details: "Failed to retrieve user email.",
            }
        );
        info!("Connected as {}", email);
        res.admin_email = email;
        Ok(res)
    }

    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn request<F>(&mut self, mut call: F) -> BackendResult<JSValue>
    where
        F: FnMut(&mut B) -> BackendResult<JSValue>,
    {
        let backend = &mut self.backend;
        self.settings.retry.run(&mut || call(&mut *backend))
    }

    /// Runs a remote function and returns its result.
    fn run_function(&mut self, function: &str, parameters: Vec<JSValue>) -> BackendResult<JSValue> {
        debug!("run_function: {} {:?}", function, parameters);
        let response = self.request(|b| b.run_function(function, &parameters))?;
        Ok(response
            .pointer("/response/result")
            .cloned()
            .unwrap_or(JSValue::Null))
    }

    fn read_range(&mut self, range: &str) -> BackendResult<Vec<Row>> {
        let sheet_id = self.get_book_club_info_sheet_id()?;
        let result = self.request(|b| b.get_values(&sheet_id, range))?;
        values_to_rows(&result)
    }

    fn write_range(&mut self, range: &str, values: Vec<Row>) -> BackendResult<()> {
        let sheet_id = self.get_book_club_info_sheet_id()?;
        debug!("write_range: {} {:?}", range, values);
        self.request(|b| b.update_values(&sheet_id, range, &values))?;
        Ok(())
    }

    fn read_table(&mut self, sheet: &str, width: usize) -> BackendResult<Vec<Row>> {
        let sheet_id = self.get_book_club_info_sheet_id()?;
        let retry = self.settings.retry;
        let fetch_number = self.settings.fetch_number;
        let backend = &mut self.backend;
        read_all_rows(sheet, width, fetch_number, |range| {
            let result = retry.run(&mut || backend.get_values(&sheet_id, range))?;
            values_to_rows(&result)
        })
    }

    /// All the files visible to the service account, following the pages.
    pub fn get_file_list(&mut self) -> BackendResult<Vec<JSValue>> {
        let mut files: Vec<JSValue> = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let token = page_token.clone();
            let page = self.request(|b| b.list_files(token.as_deref()))?;
            if let Some(l) = page.get("files").and_then(|f| f.as_array()) {
                files.extend(l.iter().cloned());
            }
            match page.get("nextPageToken").and_then(|t| t.as_str()) {
                Some(t) => page_token = Some(t.to_string()),
                None => return Ok(files),
            }
        }
    }

    pub fn get_book_club_info_sheet_id(&mut self) -> BackendResult<String> {
        if let Some(id) = self.ids.get(SHEET_ID) {
            return Ok(id.clone());
        }
        let files = self.get_file_list()?;
        let id = files
            .iter()
            .find(|f| f.get("name").and_then(|n| n.as_str()) == Some(BOOK_CLUB_SHEET))
            .and_then(|f| f.get("id"))
            .and_then(|id| id.as_str())
            .context(BackendFormatSnafu {
                message: format!("No {} spreadsheet found.", BOOK_CLUB_SHEET),
            })?
            .to_string();
        debug!("get_book_club_info_sheet_id: {}", id);
        self.ids.set(SHEET_ID, id.clone());
        Ok(id)
    }

    /// Creates the club spreadsheet and hands it over to the administrator.
    /// Returns false if it already exists.
    pub fn make_new_book_club(&mut self) -> BackendResult<bool> {
        let files = self.get_file_list()?;
        if files
            .iter()
            .any(|f| f.get("name").and_then(|n| n.as_str()) == Some(BOOK_CLUB_SHEET))
        {
            info!("make_new_book_club: {} already exists", BOOK_CLUB_SHEET);
            return Ok(false);
        }
        let body = json!({
            "properties": {"title": BOOK_CLUB_SHEET},
            "sheets": [
                {"properties": {"title": USERS_SHEET}},
                {"properties": {"title": HISTORY_SHEET}},
                {"properties": {"title": GLOBAL_INFO_SHEET}},
            ]
        });
        let created = self.request(|b| b.create_spreadsheet(&body))?;
        let sheet_id = read_js_str(&created, "spreadsheetId")?;
        let admin_email = self.admin_email.clone();
        self.request(|b| b.share_file(&sheet_id, &admin_email))?;
        info!("Created the spreadsheet {} for {}", sheet_id, admin_email);
        self.ids.set(SHEET_ID, sheet_id);
        self.tables.set(USER_TABLE, vec![]);
        self.tables.set(HISTORY, vec![]);
        Ok(true)
    }

    // The non-empty rows of the user sheet, as stored.
    fn get_user_rows(&mut self) -> BackendResult<Vec<Row>> {
        if let Some(rows) = self.tables.get(USER_TABLE) {
            return Ok(rows.clone());
        }
        let rows = self.read_table(USERS_SHEET, USER_SHEET_WIDTH)?;
        self.tables.set(USER_TABLE, rows.clone());
        Ok(rows)
    }

    // The rows of the user table, one per username. A later row for the same
    // name replaces the earlier one. Rows without a username are ignored.
    fn get_user_table(&mut self) -> BackendResult<Vec<Row>> {
        let mut table: Vec<Row> = Vec::new();
        for row in self.get_user_rows()? {
            if row.first().map_or(true, |name| name.is_empty()) {
                debug!("get_user_table: no username in {:?}", row);
                continue;
            }
            match table.iter_mut().find(|r| r.first() == row.first()) {
                Some(r) => *r = row,
                None => table.push(row),
            }
        }
        Ok(table)
    }

    fn get_history_table(&mut self) -> BackendResult<Vec<Row>> {
        if let Some(table) = self.tables.get(HISTORY) {
            return Ok(table.clone());
        }
        let table = self.read_table(HISTORY_SHEET, HISTORY_SHEET_WIDTH)?;
        self.tables.set(HISTORY, table.clone());
        Ok(table)
    }

    fn user_row(&mut self, username: &str) -> BackendResult<Option<Row>> {
        let table = self.get_user_table()?;
        Ok(table
            .into_iter()
            .find(|r| r.first().map(|s| s.as_str()) == Some(username)))
    }

    fn user_form_id(&mut self, username: &str) -> BackendResult<String> {
        match self.user_row(username)? {
            Some(row) if row.len() >= USER_SHEET_WIDTH => Ok(row[3].clone()),
            _ => BackendFormatSnafu {
                message: format!("Requested user {} does not exist", username),
            }
            .fail(),
        }
    }

    fn form_location<'a>(&self, book: &'a Book) -> BackendResult<&'a FormLocation> {
        let location = book.location.as_ref().context(IncompatibleLocationSnafu { kind: "none" })?;
        location
            .as_any()
            .downcast_ref::<FormLocation>()
            .context(IncompatibleLocationSnafu {
                kind: format!("{:?}", location),
            })
    }

    fn book_from_response(&self, form_id: &str, response: &JSValue) -> BackendResult<Option<Book>> {
        let response_id = read_js_str(response, "formResponseId")?;
        let location: Rc<dyn Location> = Rc::new(FormLocation::new(form_id, &response_id));
        match Book::new(
            &read_js_str(response, "title")?,
            &read_js_str(response, "authorFirstName")?,
            &read_js_str(response, "authorLastName")?,
            Some(location),
        ) {
            Ok(book) => Ok(Some(book)),
            Err(e) => {
                warn!("Skipping the suggestion {}: {}", response_id, e);
                Ok(None)
            }
        }
    }
}

impl<B: Backend> DataAccess for DocsDataAccess<B> {
    fn get_user_names(&mut self) -> BackendResult<Vec<String>> {
        let table = self.get_user_table()?;
        Ok(table
            .iter()
            .filter_map(|r| r.first().cloned())
            .collect())
    }

    fn get_user_info(&mut self, username: &str) -> BackendResult<UserInfo> {
        let row = self.user_row(username)?.unwrap_or_default();
        if row.len() < USER_SHEET_WIDTH {
            return Ok(UserInfo::Raw(row));
        }
        match User::new(&row[0], &row[1], vec![], &row[2]) {
            Ok(user) => Ok(UserInfo::User(user)),
            Err(e) => {
                warn!("get_user_info: invalid row {:?}: {}", row, e);
                Ok(UserInfo::Raw(row))
            }
        }
    }

    fn get_user_books(&mut self, user: &mut User) -> BackendResult<Vec<Book>> {
        let form_id = self.user_form_id(user.username())?;
        let result = self.run_function("getBookList", vec![json!(form_id)])?;
        let responses = result.as_array().context(BackendFormatSnafu {
            message: format!("getBookList returned {}", result),
        })?;
        let mut books: Vec<Book> = Vec::new();
        for response in responses {
            if let Some(book) = self.book_from_response(&form_id, response)? {
                books.push(book);
            }
        }
        debug!("get_user_books: {} has {} books", user.username(), books.len());
        user.replace_books(books.clone());
        Ok(books)
    }

    fn get_history(&mut self) -> BackendResult<Vec<HistoryRecord>> {
        let table = self.get_history_table()?;
        Ok(table.iter().map(|r| HistoryRecord::from_row(r)).collect())
    }

    fn get_current_poll(&mut self) -> BackendResult<Option<Poll>> {
        let (col, row) = POLL_ID_POSITION;
        let cell = self.read_range(&a1_notation(GLOBAL_INFO_SHEET, col, row, col, row))?;
        let poll_id = cell
            .first()
            .and_then(|r| r.first())
            .cloned()
            .unwrap_or_default();
        if poll_id.is_empty() {
            return Ok(None);
        }
        let info = self.run_function("getPollInfo", vec![json!(poll_id)])?;
        let options: Vec<String> = info
            .get("options")
            .and_then(|o| o.as_array())
            .and_then(|l| {
                l.iter()
                    .map(|o| o.as_str().map(|s| s.to_string()))
                    .collect::<Option<Vec<String>>>()
            })
            .context(BackendFormatSnafu {
                message: format!("getPollInfo returned {}", info),
            })?;
        let scores: Vec<u64> = info
            .get("scores")
            .and_then(|o| o.as_array())
            .and_then(|l| {
                l.iter()
                    .map(|s| read_js_int(Some(s)).map(|x| x.max(0) as u64))
                    .collect::<Option<Vec<u64>>>()
            })
            .context(BackendFormatSnafu {
                message: format!("getPollInfo returned {}", info),
            })?;
        let url = read_js_str(&info, "url")?;
        let date = info.get("date").context(BackendFormatSnafu {
            message: "the poll has no date",
        })?;
        let date = match (
            read_js_int(date.get("year")),
            read_js_int(date.get("month")),
            read_js_int(date.get("day")),
        ) {
            (Some(y), Some(m), Some(d)) => Date::new(y as i32, m.max(0) as u32, d.max(0) as u32)?,
            _ => {
                return BackendFormatSnafu {
                    message: format!("cannot read the poll date {}", date),
                }
                .fail()
            }
        };

        let mut locations: HashMap<String, Row> = HashMap::new();
        if !options.is_empty() {
            let range = a1_notation(GLOBAL_INFO_SHEET, 1, 2, LOCATION_WIDTH, options.len() + 1);
            for r in self.read_range(&range)? {
                if let Some(identifier) = r.first() {
                    locations.insert(identifier.clone(), r.clone());
                }
            }
        }
        let mut books: Vec<Book> = Vec::new();
        for identifier in options.iter() {
            let r = locations.get(identifier).context(BackendFormatSnafu {
                message: format!("no location recorded for the option {:?}", identifier),
            })?;
            ensure!(
                r.len() >= 3,
                BackendFormatSnafu {
                    message: format!("incomplete location for the option {:?}", identifier),
                }
            );
            let (title, first, last) = if r.len() >= LOCATION_WIDTH {
                (r[3].clone(), r[4].clone(), r[5].clone())
            } else {
                parse_option_identifier(identifier)?
            };
            let location: Rc<dyn Location> = Rc::new(FormLocation::new(&r[1], &r[2]));
            books.push(Book::new(&title, &first, &last, Some(location))?);
        }
        Ok(Some(Poll::new(books, scores, &url, &poll_id, date)?))
    }

    fn create_user(&mut self, username: &str, email: &str) -> BackendResult<Option<User>> {
        // Checked before anything is created remotely.
        User::new(username, email, vec![], "")?;
        let names = self.get_user_names()?;
        if names.iter().any(|n| n == username) {
            info!("create_user: {} already exists", username);
            return Ok(None);
        }
        let service_email = self.settings.service_email.clone();
        let form = self.run_function("makeBooksForm", vec![json!(service_email), json!(username)])?;
        let form_url = read_js_str(&form, "form_url")?;
        let form_id = read_js_str(&form, "form_id")?;
        let record: Row = vec![
            username.to_string(),
            email.to_string(),
            form_url.clone(),
            form_id,
        ];
        let mut rows = self.get_user_rows()?;
        let idx = rows.len() + 1;
        let range = a1_notation(USERS_SHEET, 1, idx, USER_SHEET_WIDTH, idx);
        self.write_range(&range, vec![record.clone()])?;
        rows.push(record);
        self.tables.set(USER_TABLE, rows);
        info!("create_user: created {}", username);
        Ok(Some(User::new(username, email, vec![], &form_url)?))
    }

    fn remove_book(&mut self, book: &Book) -> BackendResult<bool> {
        if book.location.is_none() {
            return Ok(false);
        }
        let location = self.form_location(book)?.clone();
        self.run_function(
            "delResponse",
            vec![json!(location.form_id()), json!(location.response_id())],
        )?;
        info!("remove_book: removed {}", book);
        Ok(true)
    }

    fn remove_all_books(&mut self, user: &mut User) -> BackendResult<bool> {
        let form_id = self.user_form_id(user.username())?;
        self.run_function("delAllResponses", vec![json!(form_id)])?;
        user.replace_books(vec![]);
        Ok(true)
    }

    fn new_poll(&mut self, options: Vec<Book>) -> BackendResult<Poll> {
        let mut rows: Vec<Row> = Vec::new();
        for book in options.iter() {
            let location = self.form_location(book)?;
            rows.push(vec![
                option_identifier(book),
                location.form_id().to_string(),
                location.response_id().to_string(),
                book.title().to_string(),
                book.author_first_name().to_string(),
                book.author_last_name().to_string(),
            ]);
        }
        let identifiers: Vec<JSValue> = rows.iter().map(|r| json!(r[0])).collect();
        let service_email = self.settings.service_email.clone();
        let form = self.run_function("makePollForm", vec![json!(service_email), json!(identifiers)])?;
        let form_url = read_js_str(&form, "form_url")?;
        let form_id = read_js_str(&form, "form_id")?;

        let mut values: Vec<Row> = vec![vec![form_id.clone()]];
        values.append(&mut rows);
        let range = a1_notation(GLOBAL_INFO_SHEET, 1, 1, LOCATION_WIDTH, options.len() + 1);
        self.write_range(&range, values)?;
        info!("new_poll: {} with {} options", form_id, options.len());
        let scores = vec![0; options.len()];
        Ok(Poll::new(options, scores, &form_url, &form_id, today()?)?)
    }

    fn close_poll(&mut self, poll: &Poll) -> BackendResult<bool> {
        self.run_function("closeForm", vec![json!(poll.form_id())])?;
        Ok(true)
    }

    fn add_winner(&mut self, book: &Book) -> BackendResult<()> {
        let mut history = self.get_history_table()?;
        let record = HistoryRecord {
            date: Local::now().format("%Y/%m/%d").to_string(),
            title: book.title().to_string(),
            author_first_name: book.author_first_name().to_string(),
            author_last_name: book.author_last_name().to_string(),
        };
        let idx = history.len() + 1;
        let range = a1_notation(HISTORY_SHEET, 1, idx, HISTORY_SHEET_WIDTH, idx);
        self.write_range(&range, vec![record.to_row()])?;
        history.push(record.to_row());
        self.tables.set(HISTORY, history);
        info!("add_winner: {}", book);
        Ok(())
    }

    fn send_email(&mut self, to: &str, subject: &str, body: &str) -> BackendResult<bool> {
        self.run_function("sendEmail", vec![json!(to), json!(subject), json!(body)])?;
        Ok(true)
    }

    fn remove_user(&mut self, user: &User) -> BackendResult<bool> {
        let is_user = |r: &Row| r.first().map(|s| s.as_str()) == Some(user.username());
        let record = match self.get_user_table()?.into_iter().find(|r| is_user(r)) {
            Some(r) => r,
            None => return Ok(false),
        };
        if let Some(form_id) = record.get(3).filter(|s| !s.is_empty()) {
            self.run_function("deleteForm", vec![json!(form_id)])?;
        }
        // Every row of the user goes; the following rows shift up and the
        // freed rows at the bottom are blanked.
        let rows = self.get_user_rows()?;
        let remaining: Vec<Row> = rows.iter().filter(|r| !is_user(*r)).cloned().collect();
        let mut values = remaining.clone();
        values.resize(rows.len(), vec![String::new(); USER_SHEET_WIDTH]);
        let range = a1_notation(USERS_SHEET, 1, 1, USER_SHEET_WIDTH, rows.len());
        self.write_range(&range, values)?;
        self.tables.set(USER_TABLE, remaining);
        info!("remove_user: removed {}", user.username());
        Ok(true)
    }

    fn delete_poll(&mut self, poll_id: &str) -> BackendResult<bool> {
        self.run_function("deleteForm", vec![json!(poll_id)])?;
        let (col, row) = POLL_ID_POSITION;
        let range = a1_notation(GLOBAL_INFO_SHEET, col, row, col, row);
        let current = self.read_range(&range)?;
        if current.first().and_then(|r| r.first()).map(|s| s.as_str()) == Some(poll_id) {
            self.write_range(&range, vec![vec![String::new()]])?;
        }
        Ok(true)
    }

    fn refresh(&mut self) {
        debug!("refresh: dropping the cache");
        self.ids.timeout_all();
        self.tables.timeout_all();
    }
}
