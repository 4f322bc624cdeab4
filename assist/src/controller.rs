//! The interactive session state machine.

use tracing::debug;

use crate::archive::FinalArchive;
use crate::collectors::Category;
use crate::error::Result;
use crate::menu::{ask_category, ask_continue, CategoryChoice, ContinueChoice, Prompter};
use crate::session::Session;

/// Where the menu loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    SelectingCategory,
    GatheringForCategory(CategoryChoice),
    AskingContinue,
    Finalizing,
    Done,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub archive: FinalArchive,
    pub gathered: Vec<Category>,
    pub skipped: bool,
    pub headless: bool,
}

/// Drives a [`Session`] through the menu until the archive is built.
pub struct Controller<'s, 'p> {
    session: Session<'s>,
    prompter: &'p mut dyn Prompter,
    state: MenuState,
}

impl<'s, 'p> Controller<'s, 'p> {
    pub fn new(session: Session<'s>, prompter: &'p mut dyn Prompter) -> Self {
        Self {
            session,
            prompter,
            state: MenuState::SelectingCategory,
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn session(&self) -> &Session<'s> {
        &self.session
    }

    /// Advance one state. `Finalizing` and `Done` are left to [`run`].
    ///
    /// [`run`]: Controller::run
    pub fn step(&mut self) -> Result<MenuState> {
        debug!(state = ?self.state, "Menu step");

        self.state = match self.state {
            MenuState::SelectingCategory => {
                MenuState::GatheringForCategory(ask_category(self.prompter)?)
            }
            MenuState::GatheringForCategory(CategoryChoice::Gather(category)) => {
                self.session.gather(category);
                MenuState::AskingContinue
            }
            MenuState::GatheringForCategory(CategoryChoice::Skip) => {
                self.session.mark_skipped();
                MenuState::Finalizing
            }
            MenuState::AskingContinue => match ask_continue(self.prompter)? {
                ContinueChoice::Another => MenuState::SelectingCategory,
                ContinueChoice::Quit => MenuState::Finalizing,
            },
            state @ (MenuState::Finalizing | MenuState::Done) => state,
        };

        Ok(self.state)
    }

    /// Run the menu, then build the archive.
    pub fn run(mut self) -> Result<Outcome> {
        while !matches!(self.state, MenuState::Finalizing | MenuState::Done) {
            self.step()?;
        }
        finish(self.session)
    }
}

/// Gather `categories` in order without prompting, then finalize.
pub fn run_unattended(mut session: Session<'_>, categories: &[Category]) -> Result<Outcome> {
    if categories.is_empty() {
        session.mark_skipped();
    }
    for &category in categories {
        session.gather(category);
    }
    finish(session)
}

fn finish(session: Session<'_>) -> Result<Outcome> {
    let gathered = session.gathered().to_vec();
    let skipped = session.skipped();
    let headless = session.is_headless();
    let archive = session.finalize()?;

    Ok(Outcome {
        archive,
        gathered,
        skipped,
        headless,
    })
}
