// ********* Domain data structures ***********

use std::fmt::Display;
use std::rc::Rc;

use snafu::ensure;

use crate::data_access::{DataAccess, Location};
use crate::errors::*;

/// A book suggested by a member of the club.
///
/// Two books are equal when their title and author names match, ignoring case.
/// The location does not take part in the comparison.
#[derive(Debug, Clone)]
pub struct Book {
    title: String,
    author_first_name: String,
    author_last_name: String,
    /// Where the suggestion is stored in the backend, if anywhere.
    pub location: Option<Rc<dyn Location>>,
}

impl Book {
    pub fn new(
        title: &str,
        author_first_name: &str,
        author_last_name: &str,
        location: Option<Rc<dyn Location>>,
    ) -> ValidationResult<Book> {
        ensure!(!title.is_empty(), EmptyFieldSnafu { field: "title" });
        ensure!(
            !author_first_name.is_empty(),
            EmptyFieldSnafu {
                field: "author's first name"
            }
        );
        ensure!(
            !author_last_name.is_empty(),
            EmptyFieldSnafu {
                field: "author's last name"
            }
        );
        Ok(Book {
            title: title.to_string(),
            author_first_name: author_first_name.to_string(),
            author_last_name: author_last_name.to_string(),
            location,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author_first_name(&self) -> &str {
        &self.author_first_name
    }

    pub fn author_last_name(&self) -> &str {
        &self.author_last_name
    }

    /// The author's full name, first name first.
    pub fn author_name(&self) -> String {
        format!("{} {}", self.author_first_name, self.author_last_name)
    }

    /// Removes this book from the backend.
    ///
    /// A book without a location cannot be removed: this returns `Ok(false)`
    /// without contacting the backend.
    pub fn delete(&self, data: &mut dyn DataAccess) -> BackendResult<bool> {
        if self.location.is_none() {
            return Ok(false);
        }
        data.remove_book(self)
    }

    /// The case-insensitive identity of the book, used to detect repeats.
    pub fn key(&self) -> BookKey {
        BookKey::new(
            &self.title,
            &self.author_first_name,
            &self.author_last_name,
        )
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Book) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Book {}

impl Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} by {}", self.title, self.author_name())
    }
}

/// Lower-cased (title, first name, last name).
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct BookKey(String, String, String);

impl BookKey {
    pub fn new(title: &str, first: &str, last: &str) -> BookKey {
        BookKey(title.to_lowercase(), first.to_lowercase(), last.to_lowercase())
    }
}

/// A book club participant.
#[derive(Debug, Clone)]
pub struct User {
    username: String,
    email: String,
    books: Vec<Book>,
    // Only updated by replace_books.
    num_books: usize,
    form_link: String,
}

impl User {
    pub fn new(
        username: &str,
        email: &str,
        books: Vec<Book>,
        form_link: &str,
    ) -> ValidationResult<User> {
        ensure!(
            User::is_valid_username(username),
            InvalidUsernameSnafu { username }
        );
        ensure!(!email.is_empty(), EmptyFieldSnafu { field: "email" });
        let num_books = books.len();
        Ok(User {
            username: username.to_string(),
            email: email.to_string(),
            books,
            num_books,
            form_link: form_link.to_string(),
        })
    }

    /// Usernames are non-empty and only made of ASCII letters, digits, '_' and '-'.
    pub fn is_valid_username(username: &str) -> bool {
        !username.is_empty()
            && username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn book_count(&self) -> usize {
        self.num_books
    }

    /// The link to the form the user fills in to suggest books.
    pub fn form_link(&self) -> &str {
        &self.form_link
    }

    /// Replaces the whole list of books and the cached count.
    pub fn replace_books(&mut self, books: Vec<Book>) {
        self.num_books = books.len();
        self.books = books;
    }
}

/// What the backend knows about a user.
///
/// Rows that are too short (or otherwise unusable) to build a user are handed
/// back untouched.
#[derive(Debug, Clone)]
pub enum UserInfo {
    User(User),
    Raw(Vec<String>),
}

impl UserInfo {
    pub fn into_user(self) -> Option<User> {
        match self {
            UserInfo::User(u) => Some(u),
            UserInfo::Raw(_) => None,
        }
    }
}

/// A calendar date. Only the ranges of the fields are checked.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct Date {
    year: i32,
    month: u32,
    day: u32,
}

impl Date {
    pub fn new(year: i32, month: u32, day: u32) -> ValidationResult<Date> {
        ensure!((1..=12).contains(&month), MonthOutOfRangeSnafu { month });
        ensure!((1..=31).contains(&day), DayOutOfRangeSnafu { day });
        Ok(Date { year, month, day })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }
}

impl Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.year, self.month, self.day)
    }
}

/// One past winner, as stored in the history table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct HistoryRecord {
    pub date: String,
    pub title: String,
    pub author_first_name: String,
    pub author_last_name: String,
}

impl HistoryRecord {
    /// Builds a record from a table row. Missing cells are left empty.
    pub fn from_row(row: &[String]) -> HistoryRecord {
        let cell = |idx: usize| row.get(idx).cloned().unwrap_or_default();
        HistoryRecord {
            date: cell(0),
            title: cell(1),
            author_first_name: cell(2),
            author_last_name: cell(3),
        }
    }

    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.date.clone(),
            self.title.clone(),
            self.author_first_name.clone(),
            self.author_last_name.clone(),
        ]
    }

    pub fn key(&self) -> BookKey {
        BookKey::new(
            &self.title,
            &self.author_first_name,
            &self.author_last_name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_doubles::{CannedData, FixedLocation};

    fn book(title: &str, first: &str, last: &str) -> Book {
        Book::new(title, first, last, Some(Rc::new(FixedLocation(true)))).unwrap()
    }

    #[test]
    fn book_rejects_empty_fields() {
        assert!(Book::new("", "f", "l", None).is_err());
        assert!(Book::new("t", "", "l", None).is_err());
        assert!(Book::new("t", "f", "", None).is_err());
        assert!(Book::new("t", "f", "l", None).is_ok());
    }

    #[test]
    fn book_equality_ignores_case_and_location() {
        let a = book("Dune", "Frank", "Herbert");
        let b = Book::new("dUNE", "FRANK", "herbert", None).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, book("Dune Messiah", "Frank", "Herbert"));
        assert_ne!(a, book("Dune", "Brian", "Herbert"));
        assert_ne!(a, book("Dune", "Frank", "Herbertson"));
    }

    #[test]
    fn book_author_name() {
        let b = book("title", "fName", "lName");
        assert_eq!(b.author_name(), "fName lName");
        assert_eq!(b.to_string(), "title by fName lName");
    }

    #[test]
    fn book_delete_without_location_is_a_no_op() {
        let mut data = CannedData::default();
        let b = Book::new("t", "f", "l", None).unwrap();
        assert!(!b.delete(&mut data).unwrap());
        assert!(data.removed_books.is_empty());

        let b = book("t", "f", "l");
        assert!(b.delete(&mut data).unwrap());
        assert_eq!(data.removed_books, vec![b]);
    }

    #[test]
    fn username_character_set() {
        assert!(User::is_valid_username("anna_b-2"));
        assert!(!User::is_valid_username(""));
        assert!(!User::is_valid_username("anna b"));
        assert!(!User::is_valid_username("anna@b"));
        assert!(User::new("bad name", "a@b.c", vec![], "link").is_err());
        assert!(User::new("anna", "", vec![], "link").is_err());
    }

    #[test]
    fn user_book_count_follows_replacement() {
        let mut u = User::new("anna", "anna@example.com", vec![book("a", "b", "c")], "link")
            .unwrap();
        assert_eq!(u.book_count(), 1);
        u.replace_books(vec![book("a", "b", "c"), book("d", "e", "f")]);
        assert_eq!(u.book_count(), 2);
        assert_eq!(u.books()[1].title(), "d");
        u.replace_books(vec![]);
        assert_eq!(u.book_count(), 0);
        assert!(u.books().is_empty());
    }

    #[test]
    fn date_ranges() {
        assert!(Date::new(2000, 0, 1).is_err());
        assert!(Date::new(2000, 13, 1).is_err());
        assert!(Date::new(2000, 1, 0).is_err());
        assert!(Date::new(2000, 1, 32).is_err());
        // No calendar check beyond the ranges.
        assert!(Date::new(2001, 2, 31).is_ok());
        assert!(Date::new(-44, 3, 15).is_ok());
    }

    #[test]
    fn date_display_and_equality() {
        let d = Date::new(2000, 1, 1).unwrap();
        assert_eq!(d.to_string(), "2000/1/1");
        assert_eq!(d, Date::new(2000, 1, 1).unwrap());
        assert_ne!(d, Date::new(2001, 1, 1).unwrap());
        assert_ne!(d, Date::new(2000, 2, 1).unwrap());
        assert_ne!(d, Date::new(2000, 1, 2).unwrap());
    }

    #[test]
    fn history_record_from_short_row() {
        let r = HistoryRecord::from_row(&["2020/01/02".to_string(), "Emma".to_string()]);
        assert_eq!(r.title, "Emma");
        assert_eq!(r.author_last_name, "");
        assert_eq!(r.to_row().len(), 4);
    }
}
