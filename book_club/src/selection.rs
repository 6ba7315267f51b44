// Choosing the books that go into a new poll.

use std::collections::HashSet;

use log::{debug, info};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

use crate::data_access::DataAccess;
use crate::errors::BackendResult;
use crate::model::{Book, BookKey, User, UserInfo};

/// Removes `count` usernames drawn at random from `names` and returns them.
fn draw_names<R: Rng + ?Sized>(names: &mut Vec<String>, count: usize, rng: &mut R) -> Vec<String> {
    names.shuffle(rng);
    let split = names.len() - count;
    names.split_off(split)
}

/// Loads a user and their books. Users that cannot be built, or that have no
/// books, are dropped.
fn load_user(data: &mut dyn DataAccess, username: &str) -> BackendResult<Option<User>> {
    let mut user = match data.get_user_info(username)? {
        UserInfo::User(u) => u,
        UserInfo::Raw(row) => {
            debug!("load_user: no usable record for {:?}: {:?}", username, row);
            return Ok(None);
        }
    };
    data.get_user_books(&mut user)?;
    if user.book_count() > 0 {
        Ok(Some(user))
    } else {
        debug!("load_user: {} has no books", username);
        Ok(None)
    }
}

/// Picks `n` books, each from a different user, for a new poll.
///
/// Users are drawn at random among all the users until `n` of them have at
/// least one book; one of their books is then picked at random.
/// Returns `None` if there are not enough users with books.
pub fn select_books<R: Rng + ?Sized>(
    data: &mut dyn DataAccess,
    n: usize,
    rng: &mut R,
) -> BackendResult<Option<Vec<Book>>> {
    let mut names = data.get_user_names()?;
    let mut p_users: Vec<User> = Vec::new();

    while p_users.len() < n {
        let num_to_choose = n - p_users.len();
        if names.len() < num_to_choose {
            info!(
                "select_books: {} users left, {} more needed",
                names.len(),
                num_to_choose
            );
            return Ok(None);
        }
        for username in draw_names(&mut names, num_to_choose, rng) {
            if let Some(user) = load_user(data, &username)? {
                p_users.push(user);
            }
        }
    }

    let books: Vec<Book> = p_users
        .iter()
        .filter_map(|u| u.books().choose(rng).cloned())
        .collect();
    Ok(Some(books))
}

/// Like [`select_books`], but never proposes a book twice in the same poll
/// nor a book that already won.
///
/// Each batch of drawn users is processed starting with the users with the
/// fewest books. When the random pick of a user is excluded, the other books
/// of that user are tried in random order; a user with only excluded books
/// is skipped and another user is drawn.
pub fn select_books_strict<R: Rng + ?Sized>(
    data: &mut dyn DataAccess,
    n: usize,
    rng: &mut R,
) -> BackendResult<Option<Vec<Book>>> {
    let mut excluded: HashSet<BookKey> = data.get_history()?.iter().map(|h| h.key()).collect();
    let mut names = data.get_user_names()?;
    let mut books: Vec<Book> = Vec::new();

    while books.len() < n {
        let num_to_choose = n - books.len();
        if names.len() < num_to_choose {
            info!(
                "select_books_strict: {} users left, {} more needed",
                names.len(),
                num_to_choose
            );
            return Ok(None);
        }
        let mut batch: Vec<User> = Vec::new();
        for username in draw_names(&mut names, num_to_choose, rng) {
            if let Some(user) = load_user(data, &username)? {
                batch.push(user);
            }
        }
        // Fewest books first: they get the least contested pick.
        batch.sort_by_key(|u| u.book_count());

        for user in batch {
            let mut candidates: Vec<&Book> = user.books().iter().collect();
            candidates.shuffle(rng);
            match candidates.into_iter().find(|b| !excluded.contains(&b.key())) {
                Some(book) => {
                    excluded.insert(book.key());
                    books.push(book.clone());
                }
                None => debug!(
                    "select_books_strict: all the books of {} are excluded",
                    user.username()
                ),
            }
        }
    }
    Ok(Some(books))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HistoryRecord;
    use crate::test_doubles::CannedData;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn club() -> CannedData {
        let mut data = CannedData::default();
        data.add_user("A", &[("Emma", "Jane", "Austen"), ("Persuasion", "Jane", "Austen")]);
        data.add_user("B", &[]);
        data.add_user("C", &[
            ("Dune", "Frank", "Herbert"),
            ("Ubik", "Philip", "Dick"),
            ("Solaris", "Stanislaw", "Lem"),
        ]);
        data
    }

    fn owner(data: &CannedData, book: &Book) -> String {
        data.books
            .iter()
            .find(|(_, books)| books.contains(book))
            .map(|(name, _)| name.clone())
            .unwrap()
    }

    #[test]
    fn two_option_poll_skips_users_without_books() {
        for seed in 0..30 {
            let mut data = club();
            let mut rng = StdRng::seed_from_u64(seed);
            let books = select_books(&mut data, 2, &mut rng).unwrap().unwrap();
            let mut owners: Vec<String> = books.iter().map(|b| owner(&data, b)).collect();
            owners.sort();
            assert_eq!(owners, vec!["A", "C"]);

            let poll = data.new_poll(books).unwrap();
            assert_eq!(poll.scores(), &[0, 0]);
        }
    }

    #[test]
    fn not_enough_users_with_books() {
        let mut data = club();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(select_books(&mut data, 3, &mut rng).unwrap().is_none());
        assert!(select_books(&mut data, 4, &mut rng).unwrap().is_none());
        assert!(select_books_strict(&mut data, 3, &mut rng).unwrap().is_none());
    }

    #[test]
    fn raw_user_rows_are_skipped() {
        let mut data = club();
        data.raw_users.push("D".to_string());
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let books = select_books(&mut data, 2, &mut rng).unwrap().unwrap();
            assert_eq!(books.len(), 2);
        }
    }

    #[test]
    fn strict_selection_avoids_past_winners() {
        for seed in 0..30 {
            let mut data = club();
            data.history.push(HistoryRecord {
                date: "2020/01/01".to_string(),
                title: "EMMA".to_string(),
                author_first_name: "jane".to_string(),
                author_last_name: "austen".to_string(),
            });
            let mut rng = StdRng::seed_from_u64(seed);
            let books = select_books_strict(&mut data, 2, &mut rng).unwrap().unwrap();
            assert_eq!(books.len(), 2);
            assert!(books.iter().any(|b| b.title() == "Persuasion"));
        }
    }

    #[test]
    fn strict_selection_skips_users_with_only_excluded_books() {
        let mut data = CannedData::default();
        data.add_user("A", &[("Emma", "Jane", "Austen")]);
        data.add_user("B", &[("Emma", "Jane", "Austen")]);
        data.add_user("C", &[("Ubik", "Philip", "Dick")]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let books = select_books_strict(&mut data, 2, &mut rng).unwrap().unwrap();
            let titles: HashSet<&str> = books.iter().map(|b| b.title()).collect();
            assert_eq!(titles, ["Emma", "Ubik"].into_iter().collect());
        }

        // Three users, but only two distinct books.
        let mut rng = StdRng::seed_from_u64(3);
        assert!(select_books_strict(&mut data, 3, &mut rng).unwrap().is_none());
    }
}
