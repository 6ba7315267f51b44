use log::{debug, info};
use rand::seq::IndexedRandom;
use rand::Rng;
use snafu::{ensure, OptionExt};

use crate::data_access::DataAccess;
use crate::errors::*;
use crate::model::{Book, Date};

/// A round of voting over a fixed list of books.
///
/// `options` and `scores` are index-aligned and always have the same length.
#[derive(Debug, Clone)]
pub struct Poll {
    options: Vec<Book>,
    scores: Vec<u64>,
    form_link: String,
    form_id: String,
    date_created: Date,
    // Index of the winning option, once computed.
    winner: Option<usize>,
}

impl Poll {
    pub fn new(
        options: Vec<Book>,
        scores: Vec<u64>,
        form_link: &str,
        form_id: &str,
        date_created: Date,
    ) -> ValidationResult<Poll> {
        ensure!(
            options.len() == scores.len(),
            ScoreCountMismatchSnafu {
                options: options.len(),
                scores: scores.len(),
            }
        );
        Ok(Poll {
            options,
            scores,
            form_link: form_link.to_string(),
            form_id: form_id.to_string(),
            date_created,
            winner: None,
        })
    }

    pub fn options(&self) -> &[Book] {
        &self.options
    }

    pub fn scores(&self) -> &[u64] {
        &self.scores
    }

    /// The link used to vote.
    pub fn form_link(&self) -> &str {
        &self.form_link
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    pub fn date(&self) -> Date {
        self.date_created
    }

    /// The winner of the poll. Ties are broken at random.
    ///
    /// The result is kept: calling this again returns the same book until
    /// `update_results` is called.
    pub fn get_winner(&mut self) -> Option<&Book> {
        self.get_winner_with(&mut rand::rng())
    }

    pub fn get_winner_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&Book> {
        if self.winner.is_none() {
            let threshold = *self.scores.iter().max()?;
            let potential_winners: Vec<usize> = self
                .scores
                .iter()
                .enumerate()
                .filter(|(_, s)| **s == threshold)
                .map(|(idx, _)| idx)
                .collect();
            debug!(
                "get_winner: threshold {} reached by options {:?}",
                threshold, potential_winners
            );
            self.winner = potential_winners.choose(rng).cloned();
        }
        self.winner.and_then(|idx| self.options.get(idx))
    }

    /// Closes the poll for voting.
    pub fn close_voting(&self, data: &mut dyn DataAccess) -> BackendResult<bool> {
        data.close_poll(self)
    }

    /// Replaces the scores with the ones of the live poll, and forgets the winner.
    pub fn update_results(&mut self, data: &mut dyn DataAccess) -> BackendResult<()> {
        let current = data.get_current_poll()?.context(BackendFormatSnafu {
            message: "no poll is currently open",
        })?;
        ensure!(
            current.scores.len() == self.options.len(),
            BackendFormatSnafu {
                message: format!(
                    "the current poll has {} options, expected {}",
                    current.scores.len(),
                    self.options.len()
                ),
            }
        );
        info!("update_results: poll {} scores {:?}", self.form_id, current.scores);
        self.scores = current.scores;
        self.winner = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_doubles::CannedData;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn options(n: usize) -> Vec<Book> {
        (0..n)
            .map(|i| Book::new(&format!("title{}", i), "first", "last", None).unwrap())
            .collect()
    }

    fn poll(scores: Vec<u64>) -> Poll {
        Poll::new(
            options(scores.len()),
            scores,
            "link",
            "form-id",
            Date::new(2000, 1, 1).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn scores_must_match_options() {
        let res = Poll::new(options(2), vec![0], "l", "i", Date::new(2000, 1, 1).unwrap());
        assert_eq!(
            res.err(),
            Some(ValidationError::ScoreCountMismatch {
                options: 2,
                scores: 1
            })
        );
    }

    #[test]
    fn single_maximum_always_wins() {
        for seed in 0..50 {
            let mut p = poll(vec![0, 0, 1]);
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(p.get_winner_with(&mut rng).unwrap().title(), "title2");
        }
    }

    #[test]
    fn ties_are_broken_fairly() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0u32; 3];
        for _ in 0..2000 {
            let mut p = poll(vec![0, 1, 1]);
            let title = p.get_winner_with(&mut rng).unwrap().title().to_string();
            match title.as_str() {
                "title0" => counts[0] += 1,
                "title1" => counts[1] += 1,
                _ => counts[2] += 1,
            }
        }
        assert_eq!(counts[0], 0);
        assert!(counts[1] > 800, "{:?}", counts);
        assert!(counts[2] > 800, "{:?}", counts);
    }

    #[test]
    fn winner_is_stable_until_results_are_updated() {
        let mut p = poll(vec![3, 3, 3, 3]);
        let first = p.get_winner().unwrap().clone();
        for _ in 0..20 {
            assert_eq!(p.get_winner().unwrap(), &first);
        }

        let mut data = CannedData::default();
        data.current_poll = Some(poll(vec![0, 0, 5, 0]));
        p.update_results(&mut data).unwrap();
        assert_eq!(p.scores(), &[0, 0, 5, 0]);
        assert_eq!(p.get_winner().unwrap().title(), "title2");
    }

    #[test]
    fn empty_poll_has_no_winner() {
        let mut p = poll(vec![]);
        assert!(p.get_winner().is_none());
    }

    #[test]
    fn update_results_without_open_poll_fails() {
        let mut p = poll(vec![1, 2]);
        let mut data = CannedData::default();
        let err = p.update_results(&mut data).unwrap_err();
        assert!(matches!(err, BackendError::BackendFormat { .. }));

        data.current_poll = Some(poll(vec![1, 2, 3]));
        assert!(p.update_results(&mut data).is_err());
        assert_eq!(p.scores(), &[1, 2]);
    }

    #[test]
    fn close_voting_goes_to_the_backend() {
        let p = poll(vec![1, 2]);
        let mut data = CannedData::default();
        assert!(p.close_voting(&mut data).unwrap());
        assert_eq!(data.closed_polls, vec!["form-id".to_string()]);
    }
}
