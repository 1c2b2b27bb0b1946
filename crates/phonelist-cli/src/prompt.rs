//! Interactive questions asked before a run starts.
//!
//! Every answer is validated here and re-asked until it is usable, so the
//! engine only ever sees a complete request.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use phonelist_core::{AreaCode, CountryCode, DialingPlan};

use crate::workspace::AreaTable;

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `question` and read one trimmed line. Closed input is an error.
    fn ask(&mut self, question: &str) -> io::Result<String> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for an answer",
            ));
        }
        Ok(line.trim().to_string())
    }

    fn say(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{message}")
    }

    pub fn country_code(&mut self) -> io::Result<CountryCode> {
        loop {
            let answer = self.ask("Enter the country code (e.g. 1 for USA): ")?;
            match CountryCode::parse(&answer) {
                Ok(code) => return Ok(code),
                Err(_) => self.say("Invalid: enter positive digits only.")?,
            }
        }
    }

    /// Ask for a state when a table is available, else fall back to manual
    /// entry. Returns the codes and the matched state key.
    pub fn area_codes(
        &mut self,
        plan: &DialingPlan,
        table: Option<&AreaTable>,
    ) -> io::Result<(Vec<AreaCode>, Option<String>)> {
        if let Some(table) = table {
            if self.confirm("Use predefined area codes by state? (y/n): ")? {
                let state = self.ask("Enter state (e.g. TX): ")?;
                match table.lookup(&state) {
                    Some((key, codes)) => {
                        let parsed: Result<Vec<AreaCode>, _> =
                            codes.iter().map(|code| AreaCode::parse(code, plan)).collect();
                        match parsed {
                            Ok(parsed) => {
                                self.say(&format!(
                                    "Found {} area codes for {key}: {}",
                                    parsed.len(),
                                    codes.join(", ")
                                ))?;
                                return Ok((parsed, Some(key.to_string())));
                            }
                            Err(err) => self.say(&format!("Table entry unusable: {err}"))?,
                        }
                    }
                    None => self.say("State not found.")?,
                }
            }
        }

        self.say("Manual area code entry:")?;
        let count = loop {
            let answer = self.ask("How many area codes to add? ")?;
            match answer.parse::<usize>() {
                Ok(count) if count > 0 => break count,
                _ => self.say("Please enter a positive number.")?,
            }
        };

        let mut codes = Vec::with_capacity(count);
        for index in 1..=count {
            loop {
                let answer = self.ask(&format!("Area code {index}/{count}: "))?;
                match AreaCode::parse(&answer, plan) {
                    Ok(code) => {
                        codes.push(code);
                        break;
                    }
                    Err(_) => self.say(&format!(
                        "Invalid: exactly {} digits required.",
                        plan.area_code_digits
                    ))?,
                }
            }
        }
        Ok((codes, None))
    }

    pub fn output_path(&mut self, default: &Path) -> io::Result<PathBuf> {
        let answer = self.ask(&format!("Output file [{}]: ", default.display()))?;
        if answer.is_empty() {
            Ok(default.to_path_buf())
        } else {
            Ok(PathBuf::from(answer))
        }
    }

    pub fn workers(&mut self, default: usize) -> io::Result<usize> {
        loop {
            let answer = self.ask(&format!("Number of worker threads [{default}]: "))?;
            if answer.is_empty() {
                return Ok(default);
            }
            match answer.parse::<usize>() {
                Ok(workers) if workers > 0 => return Ok(workers),
                _ => self.say("Please enter a positive number.")?,
            }
        }
    }

    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        loop {
            let answer = self.ask(question)?.to_lowercase();
            match answer.as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => self.say("Please answer y or n.")?,
            }
        }
    }
}
