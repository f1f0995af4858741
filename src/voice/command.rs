//! Speech backends that shell out to external programs.
//!
//! Commands are given as program plus arguments. The transcriber prints one
//! utterance to stdout; the synthesiser receives the text to speak as its
//! final argument.

use super::{Listener, Speaker};
use anyhow::Context;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

fn split_command(command: &[String]) -> anyhow::Result<(&str, &[String])> {
    match command.split_first() {
        Some((program, args)) if !program.trim().is_empty() => Ok((program.as_str(), args)),
        _ => anyhow::bail!("Empty command"),
    }
}

/// Runs a transcription command per utterance.
pub struct CommandListener {
    command: Vec<String>,
    timeout: Duration,
    calibration: Duration,
}

impl CommandListener {
    pub fn new(command: Vec<String>, timeout: Duration, calibration: Duration) -> Self {
        Self {
            command,
            timeout,
            calibration,
        }
    }

    fn spawn(&self) -> anyhow::Result<Child> {
        let (program, args) = split_command(&self.command)?;
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start transcriber '{}'", program))
    }

    fn transcribe(&self) -> anyhow::Result<Option<String>> {
        // Ambient-noise calibration window before listening.
        thread::sleep(self.calibration);

        let mut child = self.spawn()?;
        let mut stdout = child
            .stdout
            .take()
            .context("Transcriber stdout was not captured")?;

        let (tx, rx) = flume::bounded(1);
        thread::spawn(move || {
            let mut text = String::new();
            let read = stdout.read_to_string(&mut text).map(|_| text);
            let _ = tx.send(read);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(read) => {
                let status = child.wait().context("Failed to wait for transcriber")?;
                let text = read.context("Failed to read transcriber output")?;
                if !status.success() {
                    debug!(%status, "transcriber reported failure");
                    return Ok(None);
                }
                let text = text.trim();
                Ok((!text.is_empty()).then(|| text.to_string()))
            }
            Err(_) => {
                debug!(timeout = ?self.timeout, "transcriber timed out");
                let _ = child.kill();
                let _ = child.wait();
                Ok(None)
            }
        }
    }
}

impl Listener for CommandListener {
    fn listen(&self) -> Option<String> {
        match self.transcribe() {
            Ok(text) => text,
            Err(err) => {
                warn!(?err, "speech recognition failed");
                None
            }
        }
    }
}

/// Runs a synthesis command per utterance and waits for it to finish.
pub struct CommandSpeaker {
    command: Vec<String>,
}

impl CommandSpeaker {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    fn run(&self, text: &str) -> anyhow::Result<()> {
        let (program, args) = split_command(&self.command)?;
        let status = Command::new(program)
            .args(args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("Failed to start synthesiser '{}'", program))?;
        if !status.success() {
            anyhow::bail!("Synthesiser exited with {}", status);
        }
        Ok(())
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&self, text: &str) {
        if let Err(err) = self.run(text) {
            warn!(?err, "speech synthesis failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(command: &str) -> Vec<String> {
        command.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_split_command() {
        let command = argv("espeak -s 150");
        let (program, args) = split_command(&command).unwrap();
        assert_eq!(program, "espeak");
        assert_eq!(args, ["-s", "150"]);
        assert!(split_command(&[]).is_err());
        assert!(split_command(&["  ".to_string()]).is_err());
    }

    #[test]
    fn test_missing_transcriber_yields_none() {
        let listener = CommandListener::new(
            argv("voxcalc-no-such-transcriber"),
            Duration::from_millis(100),
            Duration::ZERO,
        );
        assert_eq!(listener.listen(), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_transcriber_output_is_trimmed() {
        let listener =
            CommandListener::new(argv("echo five plus three"), Duration::from_secs(5), Duration::ZERO);
        assert_eq!(listener.listen().as_deref(), Some("five plus three"));
    }

    #[cfg(unix)]
    #[test]
    fn test_slow_transcriber_times_out() {
        let listener =
            CommandListener::new(argv("sleep 5"), Duration::from_millis(50), Duration::ZERO);
        assert_eq!(listener.listen(), None);
    }

    #[test]
    fn test_missing_synthesiser_is_not_fatal() {
        CommandSpeaker::new(argv("voxcalc-no-such-synthesiser")).speak("hello");
    }
}
