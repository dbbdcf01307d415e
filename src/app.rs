//! Interactive menu and report printing.
//!
//! The menu reads choices from a [`Prompter`] and dispatches to the feedback
//! store. Failures inside a single action are reported to the operator and
//! the loop carries on; only I/O errors on the terminal itself end it.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use clap::Subcommand;
use log::{error, info};

use crate::config::Config;
use crate::prompt::Prompter;
use crate::record::Score;
use crate::store::{FeedbackStore, UpsertOutcome};

/// Writes every record, one per line.
pub fn print_records<W: Write>(store: &FeedbackStore, out: &mut W) -> Result<()> {
    let mut count = 0usize;
    for record in &store.list_all() {
        let record = record.context("Reading feedback")?;
        writeln!(out, "{record}")?;
        count += 1;
    }
    if count == 0 {
        writeln!(out, "No feedback available yet.")?;
    }
    Ok(())
}

/// Writes the average rating of every course.
pub fn print_averages<W: Write>(store: &FeedbackStore, precision: usize, out: &mut W) -> Result<()> {
    let averages = store
        .aggregate_by_category()
        .context("Analyzing feedback")?;
    if averages.is_empty() {
        writeln!(out, "No feedback available for analysis.")?;
        return Ok(());
    }
    for (course, mean) in averages.iter() {
        writeln!(out, "Course: {course}, Average Rating: {mean:.precision$}")?;
    }
    Ok(())
}

/// Writes the confirmation for a finished upsert.
pub fn print_outcome<W: Write>(outcome: UpsertOutcome, out: &mut W) -> Result<()> {
    match outcome {
        UpsertOutcome::Updated => writeln!(out, "Feedback updated successfully!")?,
        UpsertOutcome::Created => writeln!(out, "Feedback submitted successfully!")?,
    }
    Ok(())
}

/// One-shot operations available from the command line.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Submit feedback, or update it if this name already rated this course
    Submit {
        /// Name of the student
        #[arg(long)]
        name: String,

        /// Course being rated
        #[arg(long)]
        course: String,

        /// Rating between 1 and 5
        #[arg(long, value_parser = parse_score)]
        rating: Score,

        /// Free-form comment
        #[arg(long, default_value = "")]
        comment: String,
    },
    /// Print all feedback in submission order
    List,
    /// Print the average rating of each course
    Analyze,
}

fn parse_score(value: &str) -> std::result::Result<Score, String> {
    value.parse().map_err(|e: crate::error::Error| e.to_string())
}

/// Runs a single command against the store and writes its report to `out`.
pub fn run_command<W: Write>(
    command: Command,
    config: &Config,
    store: &FeedbackStore,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Submit {
            name,
            course,
            rating,
            comment,
        } => {
            store
                .initialize()
                .context(format!("Initializing store {}", store.path().display()))?;
            let outcome = store
                .upsert(&name, &course, rating, &comment)
                .context("Saving feedback")?;
            info!("Feedback for {name}/{course}: {outcome:?}");
            print_outcome(outcome, out)
        }
        Command::List => print_records(store, out),
        Command::Analyze => print_averages(store, config.display.precision, out),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Submit,
    View,
    Analyze,
    Exit,
}

impl Choice {
    fn parse(input: &str) -> Option<Self> {
        match input {
            "1" => Some(Self::Submit),
            "2" => Some(Self::View),
            "3" => Some(Self::Analyze),
            "4" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Whether the menu should keep going after an action.
enum Flow {
    Continue,
    Quit,
}

pub struct App<R, W> {
    store: FeedbackStore,
    precision: usize,
    prompter: Prompter<R, W>,
}

impl<R: BufRead, W: Write> App<R, W> {
    pub fn new(config: &Config, store: FeedbackStore, prompter: Prompter<R, W>) -> Self {
        Self {
            store,
            precision: config.display.precision,
            prompter,
        }
    }

    pub fn into_output(self) -> W {
        self.prompter.into_output()
    }

    /// Runs the menu until the operator exits or input ends.
    pub fn run(&mut self) -> Result<()> {
        self.store
            .initialize()
            .context(format!("Initializing store {}", self.store.path().display()))?;
        info!("Using feedback store {}", self.store.path().display());

        loop {
            let out = self.prompter.output();
            writeln!(out)?;
            writeln!(out, "===== Student Feedback Review System =====")?;
            writeln!(out, "1. Submit/Update Feedback")?;
            writeln!(out, "2. View Feedback")?;
            writeln!(out, "3. Analyze Feedback")?;
            writeln!(out, "4. Exit")?;

            let Some(input) = self.prompter.read_line("Enter your choice (1-4): ")? else {
                info!("Input closed, leaving menu");
                break;
            };

            let flow = match Choice::parse(input.trim()) {
                Some(choice) => self.dispatch(choice),
                None => {
                    writeln!(self.prompter.output(), "Invalid choice! Please enter 1-4.")?;
                    Ok(Flow::Continue)
                }
            };

            match flow {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(err) => {
                    error!("{err:#}");
                    writeln!(self.prompter.output(), "Error: {err:#}")?;
                }
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, choice: Choice) -> Result<Flow> {
        match choice {
            Choice::Submit => self.submit(),
            Choice::View => {
                let out = self.prompter.output();
                writeln!(out, "\n--- All Feedback ---")?;
                print_records(&self.store, out)?;
                Ok(Flow::Continue)
            }
            Choice::Analyze => {
                let out = self.prompter.output();
                writeln!(out, "\n--- Feedback Analysis ---")?;
                print_averages(&self.store, self.precision, out)?;
                Ok(Flow::Continue)
            }
            Choice::Exit => {
                writeln!(self.prompter.output(), "Exiting... Thank you!")?;
                Ok(Flow::Quit)
            }
        }
    }

    fn submit(&mut self) -> Result<Flow> {
        writeln!(self.prompter.output(), "\n--- Submit Feedback ---")?;
        let Some(name) = self.read_required("Enter your name: ")? else {
            return Ok(Flow::Quit);
        };
        let Some(course) = self.read_required("Enter course name: ")? else {
            return Ok(Flow::Quit);
        };
        let prompt = format!("Rate the course ({}-{}): ", Score::MIN, Score::MAX);
        let Some(score) = self.prompter.read_score(&prompt)? else {
            return Ok(Flow::Quit);
        };
        let Some(comment) = self.prompter.read_line("Enter your comments: ")? else {
            return Ok(Flow::Quit);
        };

        let outcome = self
            .store
            .upsert(&name, &course, score, &comment)
            .context("Saving feedback")?;
        info!("Feedback for {name}/{course}: {outcome:?}");
        print_outcome(outcome, self.prompter.output())?;
        Ok(Flow::Continue)
    }

    /// Prompts until a non-blank line is given, returned trimmed.
    fn read_required(&mut self, prompt: &str) -> Result<Option<String>> {
        loop {
            match self.prompter.read_line(prompt)? {
                Some(line) if line.trim().is_empty() => {
                    writeln!(self.prompter.output(), "This field cannot be empty.")?;
                }
                other => return Ok(other.map(|line| line.trim().to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::Path;
    use tempfile::tempdir;

    fn run_menu(store_path: &Path, input: &str) -> String {
        let config = Config::default();
        let prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let mut app = App::new(&config, FeedbackStore::new(store_path), prompter);
        app.run().unwrap();
        String::from_utf8(app.into_output()).unwrap()
    }

    #[test]
    fn test_exit_creates_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feedback.csv");
        let out = run_menu(&path, "4\n");
        assert!(out.contains("===== Student Feedback Review System ====="));
        assert!(out.contains("Exiting... Thank you!"));
        assert!(path.exists());
    }

    #[test]
    fn test_submit_then_update() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feedback.csv");
        let out = run_menu(
            &path,
            "1\nAnn\nMath\n4\nok\n1\nann\nmath\n7\n5\ngreat\n2\n4\n",
        );

        assert!(out.contains("Feedback submitted successfully!"));
        assert!(out.contains("score must be between 1 and 5, got 7"));
        assert!(out.contains("Feedback updated successfully!"));
        assert!(out.contains("Name: Ann, Course: Math, Rating: 5, Comment: great"));
        assert_eq!(out.matches("Name: ").count(), 1);
    }

    #[test]
    fn test_view_and_analyze_empty() {
        let dir = tempdir().unwrap();
        let out = run_menu(&dir.path().join("feedback.csv"), "2\n3\n4\n");
        assert!(out.contains("No feedback available yet."));
        assert!(out.contains("No feedback available for analysis."));
    }

    #[test]
    fn test_analyze_prints_two_decimals() {
        let dir = tempdir().unwrap();
        let out = run_menu(
            &dir.path().join("feedback.csv"),
            "1\nAnn\nMath\n4\n\n1\nBo\nMath\n2\n\n3\n4\n",
        );
        assert!(out.contains("Course: Math, Average Rating: 3.00"));
    }

    #[test]
    fn test_invalid_choice_and_empty_name() {
        let dir = tempdir().unwrap();
        let out = run_menu(
            &dir.path().join("feedback.csv"),
            "9\n1\n\nAnn\nMath\n3\nfine\n4\n",
        );
        assert!(out.contains("Invalid choice! Please enter 1-4."));
        assert!(out.contains("This field cannot be empty."));
        assert!(out.contains("Feedback submitted successfully!"));
    }

    #[test]
    fn test_eof_ends_menu() {
        let dir = tempdir().unwrap();
        let out = run_menu(&dir.path().join("feedback.csv"), "1\nAnn\n");
        assert!(!out.contains("successfully"));
    }

    #[test]
    fn test_corrupt_store_is_reported_and_menu_continues() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feedback.csv");
        std::fs::write(&path, "Name,Course,Rating,Comment\nAnn,Math\n").unwrap();

        let out = run_menu(&path, "2\n3\n4\n");
        assert_eq!(out.matches("Corrupt store at line 2").count(), 2);
        assert!(out.contains("Exiting... Thank you!"));
    }

    #[test]
    fn test_comment_keeps_inner_spacing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feedback.csv");
        run_menu(&path, "1\n  Ann \nMath\n4\n  indented, trailing  \r\n4\n");

        let store = FeedbackStore::new(&path);
        let record = store.list_all().iter().next().unwrap().unwrap();
        assert_eq!(record.subject, "Ann");
        assert_eq!(record.annotation, "  indented, trailing  ");
    }

    #[derive(clap::Parser, Debug)]
    struct Cli {
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> std::result::Result<Command, clap::Error> {
        use clap::Parser;
        Cli::try_parse_from(std::iter::once("feedback").chain(args.iter().copied()))
            .map(|cli| cli.command)
    }

    fn run(command: Command, store: &FeedbackStore) -> String {
        let mut out = Vec::new();
        run_command(command, &Config::default(), store, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_submit_list_analyze_commands() {
        let dir = tempdir().unwrap();
        let store = FeedbackStore::new(dir.path().join("cli").join("feedback.csv"));

        let submit = parse(&["submit", "--name", "Ann", "--course", "Math", "--rating", "4", "--comment", "ok"]).unwrap();
        assert_eq!(run(submit, &store), "Feedback submitted successfully!\n");

        let submit = parse(&["submit", "--name", "Bo", "--course", "Math", "--rating", "2"]).unwrap();
        assert_eq!(run(submit, &store), "Feedback submitted successfully!\n");

        let update = parse(&["submit", "--name", "ann", "--course", "MATH", "--rating", "5", "--comment", "great"]).unwrap();
        assert_eq!(run(update, &store), "Feedback updated successfully!\n");

        assert_eq!(
            run(parse(&["list"]).unwrap(), &store),
            "Name: Ann, Course: Math, Rating: 5, Comment: great\n\
             Name: Bo, Course: Math, Rating: 2, Comment: \n"
        );
        assert_eq!(
            run(parse(&["analyze"]).unwrap(), &store),
            "Course: Math, Average Rating: 3.50\n"
        );
    }

    #[test]
    fn test_commands_on_missing_store() {
        let dir = tempdir().unwrap();
        let store = FeedbackStore::new(dir.path().join("absent.csv"));
        assert_eq!(run(Command::List, &store), "No feedback available yet.\n");
        assert_eq!(
            run(Command::Analyze, &store),
            "No feedback available for analysis.\n"
        );
        assert!(!store.path().exists());
    }

    #[test]
    fn test_submit_rejects_bad_rating() {
        for rating in ["0", "6", "five"] {
            let result = parse(&["submit", "--name", "Ann", "--course", "Math", "--rating", rating]);
            assert!(result.is_err(), "rating {rating} should be rejected");
        }
        assert!(parse(&["submit", "--name", "Ann", "--course", "Math", "--rating", "1"]).is_ok());
    }

    #[test]
    fn test_print_averages_precision() {
        let dir = tempdir().unwrap();
        let store = FeedbackStore::new(dir.path().join("feedback.csv"));
        for (name, rating) in [("Ann", 1), ("Bo", 1), ("Cy", 2)] {
            store
                .upsert(name, "Art", Score::new(rating).unwrap(), "")
                .unwrap();
        }

        let mut out = Vec::new();
        print_averages(&store, 3, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Course: Art, Average Rating: 1.333\n"
        );
    }
}
