// The interactive front end: numbered menus read from a terminal.
//
// Menus are lists of tagged actions. Submenus are pushed on a stack and
// built from the current data when they are opened.

use log::{debug, warn};

use book_club::*;
use snafu::prelude::*;

use std::io::{BufRead, Write};
use std::time::Duration;

use crate::club::task_flows;
use crate::club::*;

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Action {
    ViewPoll,
    StartPoll,
    EndPoll,
    AddUser,
    ManageUsers,
    ViewHistory,
    Refresh,
    OpenUser(String),
    ViewBooks(String),
    ChooseBook(String),
    DeleteBook(String, usize),
    DeleteUser(String),
    GoBack,
    Exit,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MenuItem {
    pub name: String,
    pub action: Action,
}

impl MenuItem {
    pub fn new(name: &str, action: Action) -> MenuItem {
        MenuItem {
            name: name.to_string(),
            action,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Menu {
    pub name: String,
    pub items: Vec<MenuItem>,
}

pub fn top_menu() -> Menu {
    Menu {
        name: "The Book Club".to_string(),
        items: vec![
            MenuItem::new("View poll info", Action::ViewPoll),
            MenuItem::new("Start a new poll", Action::StartPoll),
            MenuItem::new("Close the current poll", Action::EndPoll),
            MenuItem::new("Add a new user", Action::AddUser),
            MenuItem::new("Manage users", Action::ManageUsers),
            MenuItem::new("View history", Action::ViewHistory),
            MenuItem::new("Refresh data", Action::Refresh),
            MenuItem::new("Exit", Action::Exit),
        ],
    }
}

enum Navigation {
    Stay,
    Open(Menu),
    // Number of menus to close.
    Back(usize),
    Exit,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SessionSettings {
    pub poll_options: usize,
    pub strict_selection: bool,
    pub settle_time: Duration,
}

pub struct Session<'a, R: BufRead, W: Write> {
    data: &'a mut dyn DataAccess,
    input: R,
    output: W,
    settings: SessionSettings,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(
        data: &'a mut dyn DataAccess,
        input: R,
        output: W,
        settings: SessionSettings,
    ) -> Session<'a, R, W> {
        Session {
            data,
            input,
            output,
            settings,
        }
    }

    /// Runs until `Exit` is chosen or the input ends.
    pub fn run(&mut self) -> ClubResult<()> {
        let mut stack: Vec<Menu> = vec![top_menu()];
        while let Some(menu) = stack.last().cloned() {
            let action = match self.choose(&menu)? {
                Some(a) => a,
                None => break,
            };
            debug!("menu: {:?}", action);
            match self.execute(action)? {
                Navigation::Stay => {}
                Navigation::Open(m) => stack.push(m),
                Navigation::Back(n) => {
                    let keep = stack.len().saturating_sub(n).max(1);
                    stack.truncate(keep);
                }
                Navigation::Exit => break,
            }
        }
        Ok(())
    }

    fn say(&mut self, text: &str) -> ClubResult<()> {
        writeln!(self.output, "{}", text).context(TerminalSnafu)
    }

    // None at the end of the input.
    fn prompt(&mut self, text: &str) -> ClubResult<Option<String>> {
        write!(self.output, "{}", text).context(TerminalSnafu)?;
        self.output.flush().context(TerminalSnafu)?;
        let mut line = String::new();
        if self.input.read_line(&mut line).context(TerminalSnafu)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn choose(&mut self, menu: &Menu) -> ClubResult<Option<Action>> {
        loop {
            self.say(&format!("\n{}", menu.name))?;
            for (idx, item) in menu.items.iter().enumerate() {
                self.say(&format!("{:2}) {}", idx + 1, item.name))?;
            }
            let line = match self.prompt("Please enter the number of your choice: ")? {
                Some(l) => l,
                None => return Ok(None),
            };
            match line.parse::<usize>() {
                Ok(c) if c >= 1 && c <= menu.items.len() => {
                    return Ok(Some(menu.items[c - 1].action.clone()))
                }
                _ => debug!("menu: invalid choice {:?}", line),
            }
        }
    }

    fn execute(&mut self, action: Action) -> ClubResult<Navigation> {
        let res = match action {
            Action::ViewPoll => self.view_poll(),
            Action::StartPoll => self.start_poll(),
            Action::EndPoll => self.end_poll(),
            Action::AddUser => self.add_user(),
            Action::ManageUsers => self.manage_users(),
            Action::ViewHistory => self.view_history(),
            Action::Refresh => {
                self.data.refresh();
                self.say("The data will be read again from the backend.")?;
                Ok(Navigation::Stay)
            }
            Action::OpenUser(name) => self.open_user(&name),
            Action::ViewBooks(name) => self.view_books(&name),
            Action::ChooseBook(name) => self.choose_book(&name),
            Action::DeleteBook(name, idx) => self.delete_book(&name, idx),
            Action::DeleteUser(name) => self.delete_user(&name),
            Action::GoBack => Ok(Navigation::Back(1)),
            Action::Exit => Ok(Navigation::Exit),
        };
        match res {
            Err(ClubError::Backend { source }) if source.is_recoverable() => {
                warn!("menu: {}", source);
                self.say(&format!("The operation failed: {}", source))?;
                Ok(Navigation::Stay)
            }
            x => x,
        }
    }

    fn load_user(&mut self, username: &str) -> ClubResult<Option<User>> {
        match self.data.get_user_info(username)? {
            UserInfo::User(mut user) => {
                self.data.get_user_books(&mut user)?;
                Ok(Some(user))
            }
            UserInfo::Raw(_) => {
                self.say(&format!("There is no usable record for {}.", username))?;
                Ok(None)
            }
        }
    }

    fn view_poll(&mut self) -> ClubResult<Navigation> {
        match self.data.get_current_poll()? {
            Some(poll) => print_poll(&poll, &mut self.output).context(TerminalSnafu)?,
            None => self.say("There is no poll open.")?,
        }
        Ok(Navigation::Stay)
    }

    fn start_poll(&mut self) -> ClubResult<Navigation> {
        let poll = task_flows::create_poll(
            &mut *self.data,
            self.settings.poll_options,
            self.settings.strict_selection,
            &mut rand::rng(),
        )?;
        match poll {
            Some(poll) => print_poll(&poll, &mut self.output).context(TerminalSnafu)?,
            None => self.say("There are not enough users with books to start a poll.")?,
        }
        Ok(Navigation::Stay)
    }

    fn end_poll(&mut self) -> ClubResult<Navigation> {
        match task_flows::end_poll(&mut *self.data, self.settings.settle_time)? {
            Some(winner) => self.say(&format!("The winner is {}.", winner))?,
            None => self.say("There is no poll to close.")?,
        }
        Ok(Navigation::Stay)
    }

    fn add_user(&mut self) -> ClubResult<Navigation> {
        let username = match self.prompt("Username: ")? {
            Some(u) if !u.is_empty() => u,
            _ => return Ok(Navigation::Stay),
        };
        if !User::is_valid_username(&username) {
            self.say("Usernames may only contain letters, digits, '_' and '-'.")?;
            return Ok(Navigation::Stay);
        }
        let email = match self.prompt("Email: ")? {
            Some(e) if !e.is_empty() => e,
            _ => return Ok(Navigation::Stay),
        };
        match task_flows::create_new_user(&mut *self.data, &username, &email)? {
            Some(user) => self.say(&format!(
                "Added {}. Suggestion form: {}",
                user.username(),
                user.form_link()
            ))?,
            None => self.say(&format!("The user {} already exists.", username))?,
        }
        Ok(Navigation::Stay)
    }

    fn manage_users(&mut self) -> ClubResult<Navigation> {
        let mut items: Vec<MenuItem> = self
            .data
            .get_user_names()?
            .into_iter()
            .map(|n| MenuItem::new(&n, Action::OpenUser(n.clone())))
            .collect();
        items.push(MenuItem::new("Go back", Action::GoBack));
        Ok(Navigation::Open(Menu {
            name: "Manage users".to_string(),
            items,
        }))
    }

    fn open_user(&mut self, username: &str) -> ClubResult<Navigation> {
        let user = match self.load_user(username)? {
            Some(u) => u,
            None => return Ok(Navigation::Stay),
        };
        let name = username.to_string();
        Ok(Navigation::Open(Menu {
            name: format!("{} ({} books)", user.username(), user.book_count()),
            items: vec![
                MenuItem::new("View books", Action::ViewBooks(name.clone())),
                MenuItem::new("Delete a book", Action::ChooseBook(name.clone())),
                MenuItem::new("Delete user", Action::DeleteUser(name)),
                MenuItem::new("Go back", Action::GoBack),
            ],
        }))
    }

    fn view_books(&mut self, username: &str) -> ClubResult<Navigation> {
        if let Some(user) = self.load_user(username)? {
            if user.books().is_empty() {
                self.say(&format!("{} has not suggested any book.", username))?;
            }
            for book in user.books() {
                self.say(&format!("  {}", book))?;
            }
        }
        Ok(Navigation::Stay)
    }

    fn choose_book(&mut self, username: &str) -> ClubResult<Navigation> {
        let user = match self.load_user(username)? {
            Some(u) => u,
            None => return Ok(Navigation::Stay),
        };
        let mut items: Vec<MenuItem> = user
            .books()
            .iter()
            .enumerate()
            .map(|(idx, b)| {
                MenuItem::new(&b.to_string(), Action::DeleteBook(username.to_string(), idx))
            })
            .collect();
        items.push(MenuItem::new("Go back", Action::GoBack));
        Ok(Navigation::Open(Menu {
            name: format!("Books of {}", username),
            items,
        }))
    }

    fn delete_book(&mut self, username: &str, idx: usize) -> ClubResult<Navigation> {
        if let Some(mut user) = self.load_user(username)? {
            if task_flows::delete_user_book(&mut *self.data, &mut user, idx)? {
                self.say("The book was deleted.")?;
            } else {
                self.say("The book could not be deleted.")?;
            }
        }
        Ok(Navigation::Back(1))
    }

    fn delete_user(&mut self, username: &str) -> ClubResult<Navigation> {
        let answer = self.prompt(&format!("Delete {} and all their books? (y/n) ", username))?;
        if answer.as_deref() != Some("y") {
            return Ok(Navigation::Stay);
        }
        if task_flows::delete_user(&mut *self.data, username)? {
            self.say(&format!("{} was deleted.", username))?;
        } else {
            self.say(&format!("{} could not be deleted.", username))?;
        }
        // The user list is stale too.
        Ok(Navigation::Back(2))
    }

    fn view_history(&mut self) -> ClubResult<Navigation> {
        let history = self.data.get_history()?;
        if history.is_empty() {
            self.say("No book has won a poll yet.")?;
        }
        for record in history {
            self.say(&format!(
                "{}: {} by {} {}",
                record.date, record.title, record.author_first_name, record.author_last_name
            ))?;
        }
        Ok(Navigation::Stay)
    }
}
