//! Line-oriented operator input.
//!
//! Wraps any `BufRead`/`Write` pair so the interactive menu can be driven by
//! a terminal or by in-memory buffers in tests. Every read returns `None` once
//! input is exhausted.

use std::io::{self, BufRead, Write};

use log::debug;

use crate::record::Score;

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Prints `prompt` and reads one line without its line ending.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(len);
        Ok(Some(line))
    }

    /// Prompts until the operator enters an integer in `1..=5`.
    pub fn read_score(&mut self, prompt: &str) -> io::Result<Option<Score>> {
        loop {
            let Some(line) = self.read_line(prompt)? else {
                return Ok(None);
            };
            match line.parse::<Score>() {
                Ok(score) => return Ok(Some(score)),
                Err(err) => {
                    debug!("Rejected score input {line:?}");
                    writeln!(self.output, "{err}")?;
                }
            }
        }
    }
}
