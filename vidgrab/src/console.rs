use std::{
    io::{self, Write},
    thread,
    time::Duration,
};

/// What came back from a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Answer(String),
    /// Ctrl+C, Esc or end of input.
    Interrupted,
}

/// Interactive input and output of the menu.
pub trait Console {
    fn ask(&mut self, message: &str) -> io::Result<Reply>;
    fn say(&mut self, line: &str);
    fn clear(&mut self);
    fn pause(&mut self, duration: Duration);
}

/// Real terminal. Uses `requestty` prompts unless raw prompts are requested.
pub struct Terminal {
    raw: bool,
}

impl Terminal {
    pub fn new(raw: bool) -> Self {
        Self { raw }
    }

    fn ask_raw(message: &str) -> io::Result<Reply> {
        print!("{}: ", message);
        io::stdout().flush()?;

        let mut input = String::new();

        if io::stdin().read_line(&mut input)? == 0 {
            println!();
            return Ok(Reply::Interrupted);
        }

        Ok(Reply::Answer(input.trim_end_matches(['\r', '\n']).to_owned()))
    }

    fn ask_modern(message: &str) -> io::Result<Reply> {
        let question = requestty::Question::input("answer")
            .message(message.to_owned())
            .build();

        match requestty::prompt_one(question) {
            Ok(answer) => Ok(Reply::Answer(
                answer.try_into_string().unwrap_or_default(),
            )),
            Err(requestty::ErrorKind::IoError(e)) => Err(e),
            Err(_) => Ok(Reply::Interrupted),
        }
    }
}

impl Console for Terminal {
    fn ask(&mut self, message: &str) -> io::Result<Reply> {
        if self.raw {
            Self::ask_raw(message)
        } else {
            Self::ask_modern(message)
        }
    }

    fn say(&mut self, line: &str) {
        println!("{}", line);
    }

    fn clear(&mut self) {
        print!("\x1B[2J\x1B[1;1H");
        let _ = io::stdout().flush();
    }

    fn pause(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}
