use std::any::Any;
use std::fmt::Debug;

use crate::errors::BackendResult;
use crate::model::{Book, HistoryRecord, User, UserInfo};
use crate::poll::Poll;

/// Where the record of a book suggestion lives in a backend.
///
/// Each backend has its own kind of location.
pub trait Location: Debug {
    /// True if `other` is the same kind of location and points to the same record.
    fn compare(&self, other: &dyn Location) -> bool;

    fn as_any(&self) -> &dyn Any;
}

/// All the operations the book club needs from its storage.
///
/// Every method may fail with a connectivity error, a remote-script error or a
/// backend-format error.
pub trait DataAccess {
    fn get_user_names(&mut self) -> BackendResult<Vec<String>>;

    fn get_user_info(&mut self, username: &str) -> BackendResult<UserInfo>;

    /// Fetches the books of the user, replaces the user's list with them and
    /// returns them.
    fn get_user_books(&mut self, user: &mut User) -> BackendResult<Vec<Book>>;

    fn get_history(&mut self) -> BackendResult<Vec<HistoryRecord>>;

    /// The poll currently open, if any.
    fn get_current_poll(&mut self) -> BackendResult<Option<Poll>>;

    /// Returns `None` if a user with this name already exists.
    fn create_user(&mut self, username: &str, email: &str) -> BackendResult<Option<User>>;

    fn remove_book(&mut self, book: &Book) -> BackendResult<bool>;

    fn remove_all_books(&mut self, user: &mut User) -> BackendResult<bool>;

    /// Replaces the current poll with a new one over `options`.
    /// `close_poll` should usually be called on the previous poll first.
    fn new_poll(&mut self, options: Vec<Book>) -> BackendResult<Poll>;

    /// Stops the poll from accepting votes.
    fn close_poll(&mut self, poll: &Poll) -> BackendResult<bool>;

    fn add_winner(&mut self, book: &Book) -> BackendResult<()>;

    fn send_email(&mut self, to: &str, subject: &str, body: &str) -> BackendResult<bool>;

    fn remove_user(&mut self, user: &User) -> BackendResult<bool>;

    fn delete_poll(&mut self, poll_id: &str) -> BackendResult<bool>;

    /// Forgets everything cached so that the next reads go to the backend.
    fn refresh(&mut self) {}
}
