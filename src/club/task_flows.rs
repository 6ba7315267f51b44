// The tasks of the front end, on top of DataAccess.

use log::{debug, info, warn};

use book_club::selection::{select_books, select_books_strict};
use book_club::*;
use rand::Rng;

use std::thread;
use std::time::Duration;

use crate::club::backend::Backend;
use crate::club::docs_adapter::DocsDataAccess;

pub fn book_club_exists<B: Backend>(data: &mut DocsDataAccess<B>) -> BackendResult<bool> {
    match data.get_book_club_info_sheet_id() {
        Ok(_) => Ok(true),
        Err(BackendError::BackendFormat { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Creates the spreadsheet of a new club. Returns false if it exists already
/// or if the backend could not be reached.
pub fn create_new_book_club<B: Backend>(data: &mut DocsDataAccess<B>) -> BackendResult<bool> {
    match data.make_new_book_club() {
        Err(e) if e.is_transient() => {
            warn!("create_new_book_club: {}", e);
            Ok(false)
        }
        x => x,
    }
}

/// Starts a poll over `n` books, replacing the current poll if any.
/// Returns `None`, and leaves the current poll alone, when there are not
/// enough users with books.
pub fn create_poll<R: Rng + ?Sized>(
    data: &mut dyn DataAccess,
    n: usize,
    strict: bool,
    rng: &mut R,
) -> BackendResult<Option<Poll>> {
    let books = if strict {
        select_books_strict(data, n, rng)?
    } else {
        select_books(data, n, rng)?
    };
    let books = match books {
        Some(b) => b,
        None => {
            info!("create_poll: not enough books for {} options", n);
            return Ok(None);
        }
    };
    if let Some(old) = data.get_current_poll()? {
        info!("create_poll: deleting the previous poll {}", old.form_id());
        data.delete_poll(old.form_id())?;
    }
    let poll = data.new_poll(books)?;
    info!("create_poll: started {}", poll.form_id());
    Ok(Some(poll))
}

/// Closes the current poll and records its winner.
///
/// The votes are read `settle` after closing the form. The winning book is
/// added to the history and the poll is deleted. Then the book is removed from
/// the suggestions of its owner and every user is told about it; a backend
/// failure in these last two steps is logged and does not undo the rest.
pub fn end_poll(data: &mut dyn DataAccess, settle: Duration) -> BackendResult<Option<Book>> {
    end_poll_with(data, settle, &mut rand::rng())
}

pub fn end_poll_with<R: Rng + ?Sized>(
    data: &mut dyn DataAccess,
    settle: Duration,
    rng: &mut R,
) -> BackendResult<Option<Book>> {
    let mut poll = match data.get_current_poll()? {
        Some(p) => p,
        None => return Ok(None),
    };
    poll.close_voting(data)?;
    thread::sleep(settle);
    poll.update_results(data)?;
    debug!("end_poll: scores {:?}", poll.scores());
    let winner = match poll.get_winner_with(rng) {
        Some(b) => b.clone(),
        None => {
            data.delete_poll(poll.form_id())?;
            return Ok(None);
        }
    };
    info!("end_poll: the winner is {}", winner);
    data.add_winner(&winner)?;
    // Once the winner is in the history the poll must go, so that a failure
    // below cannot record it twice.
    data.delete_poll(poll.form_id())?;
    match winner.delete(data) {
        Ok(true) => {}
        Ok(false) => warn!("end_poll: {} is not stored anywhere", winner),
        Err(e) if e.is_recoverable() => {
            warn!("end_poll: could not remove {} from the suggestions: {}", winner, e)
        }
        Err(e) => return Err(e),
    }
    match notify_users(data, &winner) {
        Err(e) if e.is_recoverable() => warn!("end_poll: could not notify the users: {}", e),
        res => res?,
    }
    Ok(Some(winner))
}

fn notify_users(data: &mut dyn DataAccess, winner: &Book) -> BackendResult<()> {
    let subject = "The book club has a new book";
    let body = format!(
        "The poll is closed. The next book is {} by {}.",
        winner.title(),
        winner.author_name()
    );
    for username in data.get_user_names()? {
        match data.get_user_info(&username)? {
            UserInfo::User(user) => {
                data.send_email(user.email(), subject, &body)?;
            }
            UserInfo::Raw(row) => debug!("notify_users: skipping {:?}", row),
        }
    }
    Ok(())
}

/// Creates a user and sends them the link to their suggestion form.
/// Returns `None` if the name is taken.
pub fn create_new_user(
    data: &mut dyn DataAccess,
    username: &str,
    email: &str,
) -> BackendResult<Option<User>> {
    let user = match data.create_user(username, email)? {
        Some(u) => u,
        None => return Ok(None),
    };
    let body = format!(
        "Welcome to the book club, {}! Suggest books here: {}",
        user.username(),
        user.form_link()
    );
    data.send_email(user.email(), "Welcome to the book club", &body)?;
    Ok(Some(user))
}

/// Deletes the books and the record of a user. Returns false if there is no
/// usable record for this name.
pub fn delete_user(data: &mut dyn DataAccess, username: &str) -> BackendResult<bool> {
    let mut user = match data.get_user_info(username)?.into_user() {
        Some(u) => u,
        None => return Ok(false),
    };
    data.remove_all_books(&mut user)?;
    data.remove_user(&user)
}

/// Deletes the book at `user.books()[book_index]`.
pub fn delete_user_book(
    data: &mut dyn DataAccess,
    user: &mut User,
    book_index: usize,
) -> BackendResult<bool> {
    let book = match user.books().get(book_index) {
        Some(b) => b.clone(),
        None => return Ok(false),
    };
    let deleted = book.delete(data)?;
    if deleted {
        let mut books = user.books().to_vec();
        books.remove(book_index);
        user.replace_books(books);
    }
    Ok(deleted)
}
