// The narrow interface to the document, spreadsheet and form service.
//
// Requests and responses are the JSON documents of the service. The adapter
// sends every call through the retrying executor.

use book_club::{BackendResult, Row};
use serde_json::Value as JSValue;

pub trait Backend {
    /// One page of the files visible to the service account:
    /// `{"files": [{"id", "name"}], "nextPageToken"}`.
    fn list_files(&mut self, page_token: Option<&str>) -> BackendResult<JSValue>;

    /// Creates a spreadsheet from `{"properties": {"title"}, "sheets": [...]}`.
    /// Answers `{"spreadsheetId"}`.
    fn create_spreadsheet(&mut self, body: &JSValue) -> BackendResult<JSValue>;

    /// Transfers the ownership of a file.
    fn share_file(&mut self, file_id: &str, email: &str) -> BackendResult<JSValue>;

    /// The cells of a range in A1 notation, row by row:
    /// `{"range", "majorDimension": "ROWS", "values": [[...]]}`. Trailing empty
    /// cells and rows are left out; `values` is missing for an empty range.
    fn get_values(&mut self, spreadsheet_id: &str, range: &str) -> BackendResult<JSValue>;

    /// Writes rows of raw values starting at the top left corner of the range.
    fn update_values(
        &mut self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Row],
    ) -> BackendResult<JSValue>;

    /// Runs a function of the remote script. Answers
    /// `{"response": {"result": ...}}` or `{"error": {"details": [...]}}`.
    fn run_function(&mut self, function: &str, parameters: &[JSValue]) -> BackendResult<JSValue>;
}
