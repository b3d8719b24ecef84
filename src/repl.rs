use std::io::{self, BufRead, Write};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Skip,
    Ask(String),
}

pub fn classify(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        Command::Skip
    } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        Command::Quit
    } else {
        Command::Ask(line.to_string())
    }
}

/// Line-oriented question loop shared by the translator and the agent.
///
/// A failing turn is printed as `Error: ...` and the loop keeps reading.
pub struct Repl<R, W> {
    input: R,
    output: W,
    prompt: String,
}

impl<R: BufRead, W: Write> Repl<R, W> {
    pub fn new(input: R, output: W, prompt: impl Into<String>) -> Self {
        Self {
            input,
            output,
            prompt: prompt.into(),
        }
    }

    pub fn print(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    /// Runs until `exit`/`quit` or end of input.
    pub fn run<F>(&mut self, mut handle: F) -> io::Result<()>
    where
        F: FnMut(&str) -> Result<String>,
    {
        let mut line = String::new();
        loop {
            write!(self.output, "\n{}", self.prompt)?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(());
            }

            let question = match classify(&line) {
                Command::Quit => return Ok(()),
                Command::Skip => continue,
                Command::Ask(question) => question,
            };

            match handle(&question) {
                Ok(text) => writeln!(self.output, "{}", text)?,
                Err(e) => {
                    tracing::warn!(error = %e, "turn failed");
                    writeln!(self.output, "Error: {}", e)?
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io::Cursor;

    #[test]
    fn test_classify() {
        assert_eq!(classify("  EXIT \n"), Command::Quit);
        assert_eq!(classify("quit"), Command::Quit);
        assert_eq!(classify("   \n"), Command::Skip);
        assert_eq!(classify(" top products \n"), Command::Ask("top products".to_string()));
    }

    #[test]
    fn test_error_does_not_end_loop() {
        let input = Cursor::new("first\nsecond\nquit\nthird\n");
        let mut output = Vec::new();
        let mut seen = Vec::new();

        {
            let mut repl = Repl::new(input, &mut output, "> ");
            repl.run(|q| {
                seen.push(q.to_string());
                if q == "first" {
                    Err(Error::Api {
                        status: 500,
                        body: "boom".to_string(),
                    })
                } else {
                    Ok(format!("answer to {}", q))
                }
            })
            .unwrap();
        }

        assert_eq!(seen, vec!["first", "second"]);
        let printed = String::from_utf8(output).unwrap();
        assert!(printed.contains("Error: API error 500: boom"));
        assert!(printed.contains("answer to second"));
        assert!(!printed.contains("third"));
    }

    #[test]
    fn test_end_of_input_stops() {
        let mut output = Vec::new();
        let mut calls = 0;
        Repl::new(Cursor::new("one\n\n"), &mut output, "> ")
            .run(|_| {
                calls += 1;
                Ok(String::new())
            })
            .unwrap();
        assert_eq!(calls, 1);
    }
}
