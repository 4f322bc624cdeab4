//! Menu front-ends.
//!
//! [`Prompter`] asks the operator to pick one item from a list. The
//! arrow-key front-end is used on a terminal; the numbered line front-end
//! works over any reader/writer pair.

use std::io::{BufRead, Write};

use console::{style, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Select;

use crate::collectors::Category;
use crate::error::{Error, Result};

/// Picks one item from a menu.
pub trait Prompter {
    /// Return the index of the chosen item. Implementations keep asking
    /// until the answer is valid.
    fn select(&mut self, prompt: &str, items: &[&str]) -> Result<usize>;
}

/// An answer to the category menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryChoice {
    Gather(Category),
    Skip,
}

/// An answer to the continue menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinueChoice {
    Another,
    Quit,
}

pub const CATEGORY_PROMPT: &str = "Which problem are you experiencing?";
pub const CATEGORY_ITEMS: [&str; 5] = [
    "Battery",
    "Storage",
    "Networking",
    "Temperature",
    "Skip (no specific problem)",
];

pub const CONTINUE_PROMPT: &str = "Collect logs for another problem?";
pub const CONTINUE_ITEMS: [&str; 2] = ["Choose another category", "Quit and create the archive"];

/// Ask for a symptom category.
pub fn ask_category(prompter: &mut dyn Prompter) -> Result<CategoryChoice> {
    let index = prompter.select(CATEGORY_PROMPT, &CATEGORY_ITEMS)?;
    Ok(match index {
        0..=3 => CategoryChoice::Gather(Category::ALL[index]),
        4 => CategoryChoice::Skip,
        _ => return Err(Error::PromptError(format!("invalid menu index {}", index))),
    })
}

/// Ask whether to gather another category.
pub fn ask_continue(prompter: &mut dyn Prompter) -> Result<ContinueChoice> {
    match prompter.select(CONTINUE_PROMPT, &CONTINUE_ITEMS)? {
        0 => Ok(ContinueChoice::Another),
        1 => Ok(ContinueChoice::Quit),
        index => Err(Error::PromptError(format!("invalid menu index {}", index))),
    }
}

/// Arrow-key menu on the terminal.
pub struct DialoguerPrompter {
    term: Term,
    theme: ColorfulTheme,
}

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for DialoguerPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for DialoguerPrompter {
    fn select(&mut self, prompt: &str, items: &[&str]) -> Result<usize> {
        let choice = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_on_opt(&self.term)?;

        choice.ok_or(Error::UserCancelled)
    }
}

/// Numbered menu read line by line.
///
/// Anything other than a listed number prints a notice and shows the same
/// menu again. End of input cancels.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the writer, e.g. to inspect what was shown.
    pub fn into_output(self) -> W {
        self.output
    }

    fn show(&mut self, prompt: &str, items: &[&str]) -> std::io::Result<()> {
        writeln!(self.output, "{}", style(prompt).bold())?;
        for (i, item) in items.iter().enumerate() {
            writeln!(self.output, "  {}) {}", i + 1, item)?;
        }
        write!(self.output, "Enter a number [1-{}]: ", items.len())?;
        self.output.flush()
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn select(&mut self, prompt: &str, items: &[&str]) -> Result<usize> {
        let prompt_err = |e: std::io::Error| Error::PromptError(e.to_string());

        loop {
            self.show(prompt, items).map_err(prompt_err)?;

            let mut line = String::new();
            if self.input.read_line(&mut line).map_err(prompt_err)? == 0 {
                return Err(Error::UserCancelled);
            }

            match line.trim().parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => return Ok(n - 1),
                _ => writeln!(
                    self.output,
                    "{}",
                    style(format!("Invalid selection: {:?}", line.trim())).yellow()
                )
                .map_err(prompt_err)?,
            }
        }
    }
}
