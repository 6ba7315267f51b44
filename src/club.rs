use log::{debug, info};

use book_club::*;
use snafu::{prelude::*, Snafu};

use std::io;
use std::time::Duration;

use crate::args::{Args, Command};
use crate::club::config_reader::*;
use crate::club::docs_adapter::DocsDataAccess;
use crate::club::io_local::LocalBackend;
use crate::club::menu::{Session, SessionSettings};

pub mod backend;
pub mod config_reader;
pub mod docs_adapter;
pub mod io_local;
pub mod io_xlsx;
pub mod menu;
pub mod task_flows;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClubError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Workbook {path} has no sheet named {sheet}"))]
    MissingSheet { path: String, sheet: String },
    #[snafu(display("Error reading file {path}"))]
    OpeningJson { source: std::io::Error, path: String },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error reading the terminal"))]
    Terminal { source: std::io::Error },

    #[snafu(display("{source}"), context(false))]
    Backend { source: BackendError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ClubResult<T> = Result<T, ClubError>;

pub fn run(args: &Args) -> ClubResult<()> {
    let config = match &args.config {
        Some(path) => read_config(path)?,
        None => ClubConfig::default(),
    };
    debug!("config: {:?}", config);
    let store_path = args
        .store
        .clone()
        .unwrap_or_else(|| config.store_path());
    info!("Using the store {:?}", store_path);
    let mut backend = LocalBackend::open(&store_path, &config.admin_email())?;

    let command = args.command.clone().unwrap_or(Command::Menu);
    match command {
        Command::Import { path } => {
            let count = io_xlsx::import_workbook(&path, &mut backend)?;
            println!("Imported {} sheet(s) from {}", count, path);
            return Ok(());
        }
        Command::Suggest {
            username,
            title,
            first_name,
            last_name,
        } => {
            let response_id = backend.submit_book(&username, &title, &first_name, &last_name)?;
            println!("Recorded the suggestion {} for {}", response_id, username);
            return Ok(());
        }
        Command::Vote { option } => {
            backend.cast_vote(option)?;
            println!("Recorded a vote for option {}", option);
            return Ok(());
        }
        _ => {}
    }

    let mut data = DocsDataAccess::connect(backend, config.adapter_settings())?;
    match command {
        Command::Init => {
            if task_flows::create_new_book_club(&mut data)? {
                println!("Created a new book club.");
            } else {
                println!("The book club could not be created.");
            }
        }
        Command::StartPoll => {
            ensure_book_club(&mut data)?;
            match task_flows::create_poll(
                &mut data,
                config.poll_options(),
                config.strict_selection(),
                &mut rand::rng(),
            )? {
                Some(poll) => print_poll(&poll, &mut io::stdout()).context(TerminalSnafu)?,
                None => println!("There are not enough users with books to start a poll."),
            }
        }
        Command::EndPoll => {
            ensure_book_club(&mut data)?;
            match task_flows::end_poll(&mut data, config.settle_time())? {
                Some(winner) => println!("The winner is {}", winner),
                None => println!("There is no poll to close."),
            }
        }
        Command::AddUser { username, email } => {
            ensure_book_club(&mut data)?;
            match task_flows::create_new_user(&mut data, &username, &email)? {
                Some(user) => println!("Created {}. Form: {}", user.username(), user.form_link()),
                None => println!("User {} already exists.", username),
            }
        }
        _ => {
            ensure_book_club(&mut data)?;
            let settings = SessionSettings {
                poll_options: config.poll_options(),
                strict_selection: config.strict_selection(),
                settle_time: config.settle_time(),
            };
            let stdin = io::stdin();
            let mut session = Session::new(&mut data, stdin.lock(), io::stdout(), settings);
            session.run()?;
        }
    }
    Ok(())
}

fn ensure_book_club(data: &mut DocsDataAccess<LocalBackend>) -> ClubResult<()> {
    if !task_flows::book_club_exists(data)? {
        whatever!("No book club found. Run `bookclub init` first.")
    }
    Ok(())
}

/// Writes the options of a poll, numbered from 1, with their scores.
pub fn print_poll<W: io::Write>(poll: &Poll, out: &mut W) -> io::Result<()> {
    writeln!(out, "Poll created on {}: {}", poll.date(), poll.form_link())?;
    for (idx, (book, score)) in poll.options().iter().zip(poll.scores()).enumerate() {
        writeln!(out, "{:2}) {} ({} votes)", idx + 1, book, score)?;
    }
    Ok(())
}

pub(crate) fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
