//! Interactive stepping through a game from line-based input.

use std::io::{BufRead, Write};

use chess::ReplayCursor;

use crate::render;

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Prev,
    Start,
    End,
    /// Select a game by its 1-based number.
    Game(usize),
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command '{0}' (n, p, s, e, g N, q)")]
    Unknown(String),
    #[error("'g' expects a game number")]
    MissingGame,
}

impl std::str::FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = match words.next().unwrap_or("n") {
            "n" | "next" => Command::Next,
            "p" | "prev" => Command::Prev,
            "s" | "start" => Command::Start,
            "e" | "end" => Command::End,
            "q" | "quit" => Command::Quit,
            "g" | "game" => {
                let number = words
                    .next()
                    .and_then(|n| n.parse().ok())
                    .ok_or(CommandError::MissingGame)?;
                Command::Game(number)
            }
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

/// Owns the cursor for the lifetime of an interactive run.
pub struct Session {
    cursor: ReplayCursor,
    unicode: bool,
}

impl Session {
    pub fn new(cursor: ReplayCursor, unicode: bool) -> Self {
        Self { cursor, unicode }
    }

    pub fn cursor(&self) -> &ReplayCursor {
        &self.cursor
    }

    /// Current position as text.
    pub fn render(&mut self) -> String {
        let board = self.cursor.current_board();
        let ply = self.cursor.index().map_or(0, |i| i + 1);
        let mut out = render::render_headers(self.cursor.game());
        out.push_str(&render::render_position(
            self.cursor.game(),
            &board,
            self.cursor.current_node(),
            ply,
            self.unicode,
        ));
        out
    }

    /// Apply one command. Returns `false` when the session should end.
    pub fn apply(&mut self, command: Command) -> Result<bool, chess::ReplayError> {
        match command {
            Command::Next => {
                self.cursor.step_forward();
            }
            Command::Prev => {
                self.cursor.step_backward();
            }
            Command::Start => self.cursor.go_to_start(),
            Command::End => self.cursor.go_to_end(),
            Command::Game(number) => {
                let len = self.cursor.games().len();
                let index = number
                    .checked_sub(1)
                    .ok_or(chess::ReplayError::IndexOutOfRange { index: 0, len })?;
                self.cursor.select_game(index)?;
            }
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Read commands until `q` or end of input, printing the position after each.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> std::io::Result<()> {
        write!(output, "{}", self.render())?;
        for line in input.lines() {
            let line = line?;
            let keep_going = match line.parse::<Command>() {
                Ok(command) => match self.apply(command) {
                    Ok(keep_going) => keep_going,
                    Err(err) => {
                        writeln!(output, "{}", err)?;
                        continue;
                    }
                },
                Err(err) => {
                    writeln!(output, "{}", err)?;
                    continue;
                }
            };
            if !keep_going {
                break;
            }
            write!(output, "{}", self.render())?;
        }
        output.flush()
    }
}
