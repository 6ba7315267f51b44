use clap::{Parser, Subcommand};

/// Runs the poll of a book club.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. For the list of the fields,
    /// read the manual of the book_club crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The file holding the local copy of the spreadsheets and forms.
    /// Overrides the storePath field of the configuration.
    #[clap(short, long, value_parser)]
    pub store: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    /// (default menu) What to do.
    #[clap(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Opens the interactive menu.
    Menu,
    /// Creates the spreadsheet of a new book club.
    Init,
    /// Copies the Users, History and GlobalInfo sheets of an .xlsx workbook into the store.
    Import {
        #[clap(value_parser)]
        path: String,
    },
    /// Starts a new poll, replacing the current one.
    StartPoll,
    /// Closes the current poll and announces the winner.
    EndPoll,
    /// Adds a user and creates their suggestion form.
    AddUser {
        #[clap(value_parser)]
        username: String,
        #[clap(value_parser)]
        email: String,
    },
    /// Fills the suggestion form of a user, as they would.
    Suggest {
        #[clap(value_parser)]
        username: String,
        #[clap(value_parser)]
        title: String,
        #[clap(value_parser)]
        first_name: String,
        #[clap(value_parser)]
        last_name: String,
    },
    /// Votes for an option of the current poll, numbered from 1.
    Vote {
        #[clap(value_parser)]
        option: usize,
    },
}
