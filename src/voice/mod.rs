//! Speech input and output.
//!
//! Recognition and synthesis sit behind [`Listener`] and [`Speaker`] so the
//! dispatcher can be driven by external commands, by the terminal or by
//! scripted fakes in tests.

mod command;

pub use command::{CommandListener, CommandSpeaker};

use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Spoken when nothing could be recognised.
pub const NOT_UNDERSTOOD: &str = "Sorry, I didn't catch that.";

/// Voice toggle label while idle.
pub const LABEL_IDLE: &str = "Click and Speak";

/// Voice toggle label while capturing.
pub const LABEL_LISTENING: &str = "Listening...";

/// Captures a single utterance.
pub trait Listener: Send + Sync {
    /// Block until one utterance is transcribed, or return `None` on
    /// silence, timeout or recognition failure.
    fn listen(&self) -> Option<String>;
}

/// Speaks feedback to the user.
pub trait Speaker: Send + Sync {
    /// Speak `text` and return when done. Failures are logged, never raised.
    fn speak(&self, text: &str);
}

/// Reads utterances typed into the terminal.
///
/// Lines arrive over a channel fed by the UI's stdin reader, so waiting for
/// an utterance never races with the input loop.
pub struct ConsoleListener {
    lines: flume::Receiver<String>,
    timeout: Duration,
}

impl ConsoleListener {
    pub fn new(lines: flume::Receiver<String>, timeout: Duration) -> Self {
        Self { lines, timeout }
    }
}

impl Listener for ConsoleListener {
    fn listen(&self) -> Option<String> {
        match self.lines.recv_timeout(self.timeout) {
            Ok(line) if !line.trim().is_empty() => Some(line.trim().to_string()),
            Ok(_) => None,
            Err(err) => {
                debug!(%err, "no utterance");
                None
            }
        }
    }
}

/// Prints feedback to stdout.
#[derive(Default)]
pub struct ConsoleSpeaker;

impl Speaker for ConsoleSpeaker {
    fn speak(&self, text: &str) {
        let mut stdout = io::stdout().lock();
        let _ = writeln!(stdout, "🔊 {}", text);
        let _ = stdout.flush();
    }
}

/// Speaker that records everything said. Useful for tests and `--json`.
#[derive(Default)]
pub struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
}

impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, text: &str) {
        if let Ok(mut spoken) = self.spoken.lock() {
            spoken.push(text.to_string());
        }
    }
}

/// Listener that replays a fixed script of utterances.
pub struct ScriptedListener {
    script: Mutex<Vec<Option<String>>>,
}

impl ScriptedListener {
    pub fn new<I, S>(utterances: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let mut script: Vec<Option<String>> = utterances
            .into_iter()
            .map(|u| u.map(Into::into))
            .collect();
        script.reverse();
        Self {
            script: Mutex::new(script),
        }
    }
}

impl Listener for ScriptedListener {
    fn listen(&self) -> Option<String> {
        self.script.lock().ok()?.pop().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_listener_replays_in_order() {
        let listener = ScriptedListener::new([Some("one"), None, Some("two")]);
        assert_eq!(listener.listen().as_deref(), Some("one"));
        assert_eq!(listener.listen(), None);
        assert_eq!(listener.listen().as_deref(), Some("two"));
        assert_eq!(listener.listen(), None);
    }

    #[test]
    fn test_console_listener_times_out() {
        let (_tx, rx) = flume::unbounded();
        let listener = ConsoleListener::new(rx, Duration::from_millis(10));
        assert_eq!(listener.listen(), None);
    }

    #[test]
    fn test_console_listener_trims_lines() {
        let (tx, rx) = flume::unbounded();
        let listener = ConsoleListener::new(rx, Duration::from_millis(100));
        tx.send("  five plus three  ".to_string()).unwrap();
        tx.send("   ".to_string()).unwrap();
        assert_eq!(listener.listen().as_deref(), Some("five plus three"));
        assert_eq!(listener.listen(), None);
    }

    #[test]
    fn test_recording_speaker() {
        let speaker = RecordingSpeaker::default();
        speaker.speak("Cleared");
        assert_eq!(speaker.spoken(), vec!["Cleared".to_string()]);
    }
}
