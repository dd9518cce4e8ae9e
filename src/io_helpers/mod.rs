use std::io::{self, BufRead, IsTerminal};
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

pub mod buf_reader;

pub use buf_reader::get_bufreader;

/// Failures while loading local JSON input
#[derive(Error, Debug)]
pub enum InputError {
    #[error("failed to read input data")]
    IOError(#[from] io::Error),
    #[error("input failed to parse as valid JSON")]
    JSONParsingError(#[from] serde_json::Error),
    #[error("no input: pass a FILE or pipe JSON on stdin")]
    NoInput,
}

/// Stdin as a reader, unless it is an interactive terminal nobody is typing into
pub fn stdin_reader() -> Result<Box<dyn BufRead + Send>, InputError> {
    if io::stdin().is_terminal() {
        return Err(InputError::NoInput);
    }
    Ok(Box::new(io::BufReader::new(io::stdin())))
}

pub fn read_json(reader: impl BufRead) -> Result<Value, InputError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Reads one JSON document from `file_path`, or from stdin when absent
pub fn load_json(file_path: Option<&Path>) -> Result<Value, InputError> {
    let reader = match file_path {
        Some(path) => get_bufreader(path)?,
        None => stdin_reader()?,
    };
    read_json(reader)
}
