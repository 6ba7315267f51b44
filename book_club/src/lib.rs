/*!
Domain model and data-access primitives for running the poll of a book club.

Members suggest books through their own submission form. From time to time a
poll is opened with one book from each of a few members drawn at random; when
the poll is closed, the book with the most votes is added to the history of
winners and removed from the suggestions of its owner.

This crate does not talk to any service by itself. Storage is reached through
the [`DataAccess`] trait; the helpers in [`retry`] and [`range`] are the
building blocks of an implementation over a spreadsheet-like service.

See the [`manual`] for the layout expected in the backend.
*/

mod cache;
mod data_access;
mod errors;
pub mod manual;
mod model;
mod poll;
pub mod range;
pub mod retry;
pub mod selection;

#[cfg(test)]
mod test_doubles;

pub use crate::cache::Cache;
pub use crate::data_access::*;
pub use crate::errors::*;
pub use crate::model::*;
pub use crate::poll::Poll;
pub use crate::range::Row;
pub use crate::retry::RetryPolicy;
