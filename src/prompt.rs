use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use anyhow::Context;

/// Interactive boundary: everything that talks to a human goes through here.
pub trait Prompter {
    fn show(&mut self, line: &str);
    fn ask(&mut self, question: &str) -> anyhow::Result<String>;
}

pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn show(&mut self, line: &str) {
        println!("{line}");
    }

    fn ask(&mut self, question: &str) -> anyhow::Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{question}")?;
        stdout.flush()?;

        let mut answer = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut answer)
            .context("failed to read from stdin")?;
        if read == 0 {
            anyhow::bail!("stdin closed before an answer was given");
        }
        Ok(answer.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Test double: answers questions from a fixed queue and records what was
/// shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    pub shown: Vec<String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            shown: Vec::new(),
            asked: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn show(&mut self, line: &str) {
        self.shown.push(line.to_string());
    }

    fn ask(&mut self, question: &str) -> anyhow::Result<String> {
        self.asked.push(question.to_string());
        self.answers
            .pop_front()
            .with_context(|| format!("no scripted answer left for {question:?}"))
    }
}
