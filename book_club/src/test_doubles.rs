// In-memory stand-ins for the backend traits, used by the unit tests.

use std::any::Any;
use std::rc::Rc;

use crate::data_access::{DataAccess, Location};
use crate::errors::*;
use crate::model::*;
use crate::poll::Poll;

/// A location that compares with a fixed answer.
#[derive(Debug)]
pub struct FixedLocation(pub bool);

impl Location for FixedLocation {
    fn compare(&self, _other: &dyn Location) -> bool {
        self.0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Canned users, books, history and poll. Writes are recorded.
#[derive(Default)]
pub struct CannedData {
    pub books: Vec<(String, Vec<Book>)>,
    // Users that only exist as a short row.
    pub raw_users: Vec<String>,
    pub history: Vec<HistoryRecord>,
    pub current_poll: Option<Poll>,
    pub removed_books: Vec<Book>,
    pub closed_polls: Vec<String>,
    pub winners: Vec<Book>,
    pub emails: Vec<(String, String, String)>,
}

impl CannedData {
    pub fn add_user(&mut self, username: &str, books: &[(&str, &str, &str)]) {
        let books = books
            .iter()
            .map(|(t, f, l)| Book::new(t, f, l, Some(Rc::new(FixedLocation(true)))).unwrap())
            .collect();
        self.books.push((username.to_string(), books));
    }
}

impl DataAccess for CannedData {
    fn get_user_names(&mut self) -> BackendResult<Vec<String>> {
        let mut names: Vec<String> = self.books.iter().map(|(n, _)| n.clone()).collect();
        names.extend(self.raw_users.iter().cloned());
        Ok(names)
    }

    fn get_user_info(&mut self, username: &str) -> BackendResult<UserInfo> {
        if self.books.iter().any(|(n, _)| n == username) {
            let email = format!("{}@example.com", username);
            Ok(UserInfo::User(User::new(username, &email, vec![], "link")?))
        } else {
            Ok(UserInfo::Raw(vec![username.to_string()]))
        }
    }

    fn get_user_books(&mut self, user: &mut User) -> BackendResult<Vec<Book>> {
        let books = self
            .books
            .iter()
            .find(|(n, _)| n == user.username())
            .map(|(_, b)| b.clone())
            .unwrap_or_default();
        user.replace_books(books.clone());
        Ok(books)
    }

    fn get_history(&mut self) -> BackendResult<Vec<HistoryRecord>> {
        Ok(self.history.clone())
    }

    fn get_current_poll(&mut self) -> BackendResult<Option<Poll>> {
        Ok(self.current_poll.clone())
    }

    fn create_user(&mut self, username: &str, email: &str) -> BackendResult<Option<User>> {
        if self.books.iter().any(|(n, _)| n == username) {
            return Ok(None);
        }
        let user = User::new(username, email, vec![], "link")?;
        self.books.push((username.to_string(), vec![]));
        Ok(Some(user))
    }

    fn remove_book(&mut self, book: &Book) -> BackendResult<bool> {
        self.removed_books.push(book.clone());
        Ok(true)
    }

    fn remove_all_books(&mut self, user: &mut User) -> BackendResult<bool> {
        user.replace_books(vec![]);
        Ok(true)
    }

    fn new_poll(&mut self, options: Vec<Book>) -> BackendResult<Poll> {
        let scores = vec![0; options.len()];
        let poll = Poll::new(options, scores, "link", "poll-id", Date::new(2000, 1, 1)?)?;
        self.current_poll = Some(poll.clone());
        Ok(poll)
    }

    fn close_poll(&mut self, poll: &Poll) -> BackendResult<bool> {
        self.closed_polls.push(poll.form_id().to_string());
        Ok(true)
    }

    fn add_winner(&mut self, book: &Book) -> BackendResult<()> {
        self.winners.push(book.clone());
        Ok(())
    }

    fn send_email(&mut self, to: &str, subject: &str, body: &str) -> BackendResult<bool> {
        self.emails
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(true)
    }

    fn remove_user(&mut self, user: &User) -> BackendResult<bool> {
        self.books.retain(|(n, _)| n != user.username());
        Ok(true)
    }

    fn delete_poll(&mut self, _poll_id: &str) -> BackendResult<bool> {
        self.current_poll = None;
        Ok(true)
    }
}
