//! Interactive confirmation on a terminal.

use std::io::{self, BufRead, BufReader, Write};
use std::sync::Mutex;

use crate::recovery::{Confirmer, RecoveryPrompt};

/// Asks on a writer and reads the answer from a reader.
///
/// Only an explicit "y" or "yes" confirms; anything else, including a read
/// error or end of input, declines.
pub struct StdinConfirmer<R = BufReader<io::Stdin>, W = io::Stderr> {
    io: Mutex<(R, W)>,
}

impl StdinConfirmer {
    pub fn new() -> Self {
        Self::with_io(BufReader::new(io::stdin()), io::stderr())
    }
}

impl Default for StdinConfirmer {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> StdinConfirmer<R, W> {
    pub fn with_io(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }
}

impl<R, W> Confirmer for StdinConfirmer<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn confirm(&self, prompt: &RecoveryPrompt) -> bool {
        let mut guard = self.io.lock().expect("confirmer mutex poisoned");
        let (reader, writer) = &mut *guard;

        if write!(writer, "{prompt} [y/N] ").and_then(|_| writer.flush()).is_err() {
            return false;
        }

        let mut answer = String::new();
        match reader.read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
        }
    }
}
