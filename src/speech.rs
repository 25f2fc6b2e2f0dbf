use std::cell::RefCell;
use std::process::{Child, Command, Stdio};
use std::rc::Rc;

use tracing::{debug, warn};

/// Symbols used for spoken stimuli; stimulus `i` is `ALPHABET[i]`.
pub const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub fn symbol(value: u32) -> Option<char> {
    ALPHABET.get(value as usize).map(|&b| b as char)
}

/// Speech collaborator. Fire-and-forget: nothing is reported back.
pub trait Speaker {
    fn speak(&mut self, symbol: char);
}

/// Speaker for visual-only setups and headless runs
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSpeaker;

impl Speaker for SilentSpeaker {
    fn speak(&mut self, _symbol: char) {}
}

/// Speaks through an external text-to-speech program (`espeak`, `say`, ...)
/// given the letter as its last argument. A new utterance cuts off one
/// still in progress.
#[derive(Debug)]
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
    current: Option<Child>,
}

impl CommandSpeaker {
    /// Builds a speaker from a whitespace-separated command line.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            current: None,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn flush(&mut self) {
        if let Some(mut child) = self.current.take() {
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&mut self, symbol: char) {
        self.flush();

        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(symbol.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => {
                debug!(program = %self.program, %symbol, "speaking");
                self.current = Some(child);
            }
            Err(err) => warn!(program = %self.program, %err, "speech command failed to start"),
        }
    }
}

impl Drop for CommandSpeaker {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Test speaker that remembers what it was asked to say. Clones share the
/// same record, so one clone can be handed to a controller and another
/// inspected.
#[derive(Debug, Default, Clone)]
pub struct RecordingSpeaker {
    spoken: Rc<RefCell<Vec<char>>>,
}

impl RecordingSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<char> {
        self.spoken.borrow().clone()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&mut self, symbol: char) {
        self.spoken.borrow_mut().push(symbol);
    }
}
