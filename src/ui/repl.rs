//! Interactive terminal loop.
//!
//! Each input line is either a run of keypad labels (`7 + 3 =`) or a colon
//! command. While a voice capture is running the loop waits for the worker
//! to finish instead of reading input, so the console listener receives the
//! next line.

use super::keypad::{render_calculator, render_display, render_keypad, render_notice, render_voice_toggle};
use crate::calculator::copy_to_clipboard;
use crate::dispatcher::{Dispatcher, VoiceEvent, VoiceOutcome};
use crate::session::{self, Key, VoiceState};
use anyhow::Context;
use std::io::{BufRead, Write};
use std::thread;
use tracing::{debug, info};

const HELP: &str = "\
Keys:     labels separated by spaces, e.g. `sin 3 0 ) =` or `x ** 2 d/dx`
:voice    speak a command (type the utterance when no transcriber is set)
:say T    run T as a voice command
:type T   append free text to the display
:copy     copy the display to the clipboard
:keys     show the keypad
:help     show this help
:quit     exit";

/// A parsed input line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Keys(Vec<Key>),
    Voice,
    Say(String),
    Type(String),
    Copy,
    Keypad,
    Help,
    Quit,
    Nothing,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Self::Nothing);
        }
        if let Some(rest) = line.strip_prefix(':') {
            let (name, arg) = rest.split_once(' ').unwrap_or((rest, ""));
            let arg = arg.trim();
            return match name {
                "voice" | "v" => Ok(Self::Voice),
                "say" if !arg.is_empty() => Ok(Self::Say(arg.to_string())),
                "type" | "t" if !arg.is_empty() => Ok(Self::Type(arg.to_string())),
                "copy" => Ok(Self::Copy),
                "keys" => Ok(Self::Keypad),
                "help" | "h" => Ok(Self::Help),
                "quit" | "q" => Ok(Self::Quit),
                "say" | "type" | "t" => Err(format!(":{} needs text", name)),
                other => Err(format!("Unknown command ':{}'", other)),
            };
        }
        line.split_whitespace()
            .map(str::parse)
            .collect::<Result<Vec<Key>, _>>()
            .map(Self::Keys)
    }
}

/// Whether the loop keeps going.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Forward stdin lines into a channel until EOF.
pub fn spawn_stdin_reader() -> flume::Receiver<String> {
    let (tx, rx) = flume::unbounded();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
        debug!("stdin closed");
    });
    rx
}

pub struct Repl<W: Write> {
    dispatcher: Dispatcher,
    events: flume::Receiver<VoiceEvent>,
    out: W,
}

impl<W: Write> Repl<W> {
    pub fn new(dispatcher: Dispatcher, events: flume::Receiver<VoiceEvent>, out: W) -> Self {
        Self {
            dispatcher,
            events,
            out,
        }
    }

    fn voice_state(&self) -> VoiceState {
        session::lock(self.dispatcher.session()).voice_state()
    }

    fn show_display(&mut self) -> anyhow::Result<()> {
        let buffer = session::lock(self.dispatcher.session()).buffer().to_string();
        writeln!(self.out, "{}", render_display(&buffer))?;
        Ok(())
    }

    /// Draw the whole calculator.
    pub fn show_calculator(&mut self) -> anyhow::Result<()> {
        let (buffer, state) = {
            let session = session::lock(self.dispatcher.session());
            (session.buffer().to_string(), session.voice_state())
        };
        writeln!(self.out, "{}", render_calculator(&buffer, state))?;
        Ok(())
    }

    /// Run until `:quit` or end of input.
    pub fn run(&mut self, lines: &flume::Receiver<String>) -> anyhow::Result<()> {
        self.show_calculator()?;
        writeln!(self.out, "Type :help for commands.")?;

        loop {
            if self.voice_state() == VoiceState::Capturing {
                let Ok(event) = self.events.recv() else { break };
                self.on_voice_event(event)?;
                continue;
            }

            let pending: Vec<VoiceEvent> = self.events.try_iter().collect();
            for event in pending {
                self.on_voice_event(event)?;
            }

            self.out.flush()?;
            let Ok(line) = lines.recv() else { break };
            if self.execute_line(&line)? == Flow::Quit {
                break;
            }
        }

        info!("calculator closed");
        Ok(())
    }

    pub fn execute_line(&mut self, line: &str) -> anyhow::Result<Flow> {
        match Command::parse(line) {
            Ok(command) => self.execute(command),
            Err(message) => {
                writeln!(self.out, "{}", message)?;
                Ok(Flow::Continue)
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> anyhow::Result<Flow> {
        match command {
            Command::Keys(keys) => {
                for key in keys {
                    let result = session::lock(self.dispatcher.session()).press(key);
                    if let Err(err) = result {
                        writeln!(self.out, "{}", render_notice(&err))?;
                    }
                }
                self.show_display()?;
            }
            Command::Voice => match self.dispatcher.activate() {
                Some(_) => {
                    writeln!(self.out, "{}", render_voice_toggle(VoiceState::Capturing))?;
                    self.out.flush()?;
                }
                None => debug!("voice toggle ignored while capturing"),
            },
            Command::Say(transcript) => {
                let outcome = self.dispatcher.say(&transcript);
                self.show_outcome(&outcome)?;
            }
            Command::Type(text) => {
                session::lock(self.dispatcher.session()).append(&text);
                self.show_display()?;
            }
            Command::Copy => {
                let buffer = session::lock(self.dispatcher.session()).buffer().to_string();
                match copy_to_clipboard(&buffer).context("Copy failed") {
                    Ok(()) => writeln!(self.out, "Copied {}", buffer)?,
                    Err(err) => writeln!(self.out, "{:#}", err)?,
                }
            }
            Command::Keypad => writeln!(self.out, "{}", render_keypad())?,
            Command::Help => writeln!(self.out, "{}", HELP)?,
            Command::Quit => return Ok(Flow::Quit),
            Command::Nothing => {}
        }
        Ok(Flow::Continue)
    }

    fn on_voice_event(&mut self, event: VoiceEvent) -> anyhow::Result<()> {
        match event {
            VoiceEvent::Finished { outcome } => {
                self.show_outcome(&outcome)?;
                let state = self.voice_state();
                writeln!(self.out, "{}", render_voice_toggle(state))?;
            }
        }
        Ok(())
    }

    fn show_outcome(&mut self, outcome: &VoiceOutcome) -> anyhow::Result<()> {
        if let VoiceOutcome::Failed(err) = outcome {
            writeln!(self.out, "{}", render_notice(err))?;
        }
        self.show_display()
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, shared};
    use crate::voice::{RecordingSpeaker, ScriptedListener};
    use std::sync::Arc;

    fn repl(script: Vec<Option<&str>>) -> Repl<Vec<u8>> {
        let (dispatcher, events) = Dispatcher::new(
            shared(Session::default()),
            Arc::new(ScriptedListener::new(script)),
            Arc::new(RecordingSpeaker::default()),
        );
        Repl::new(dispatcher, events, Vec::new())
    }

    fn buffer(repl: &Repl<Vec<u8>>) -> String {
        session::lock(repl.dispatcher.session()).buffer().to_string()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(""), Ok(Command::Nothing));
        assert_eq!(Command::parse(":voice"), Ok(Command::Voice));
        assert_eq!(Command::parse(":q"), Ok(Command::Quit));
        assert_eq!(
            Command::parse(":say five plus three"),
            Ok(Command::Say("five plus three".into()))
        );
        assert_eq!(
            Command::parse("7 + 3 ="),
            Ok(Command::Keys(vec![Key::Digit(7), Key::Plus, Key::Digit(3), Key::Equals]))
        );
        assert!(Command::parse(":say").is_err());
        assert!(Command::parse(":bogus").is_err());
        assert!(Command::parse("7 plus 3").is_err());
    }

    #[test]
    fn test_key_line_updates_display() {
        let mut repl = repl(vec![]);
        repl.execute_line("sin 3 0 ) =").unwrap();
        assert_eq!(buffer(&repl), "0.5");
        let out = String::from_utf8(repl.into_output()).unwrap();
        assert!(out.contains("0.5 ]"));
    }

    #[test]
    fn test_errors_are_reported() {
        let mut repl = repl(vec![]);
        repl.execute_line("d/dx").unwrap();
        let out = String::from_utf8(repl.into_output()).unwrap();
        assert!(out.contains("[Warning]"));
    }

    #[test]
    fn test_type_appends_free_text() {
        let mut repl = repl(vec![]);
        repl.execute_line(":type 2x+1").unwrap();
        repl.execute_line("∫").unwrap();
        assert_eq!(buffer(&repl), "x**2 + x + C");
    }

    #[test]
    fn test_voice_round_trip() {
        let mut repl = repl(vec![Some("five plus three equals")]);
        repl.execute_line(":voice").unwrap();
        let event = repl.events.recv().unwrap();
        repl.on_voice_event(event).unwrap();
        assert_eq!(buffer(&repl), "8");
        assert_eq!(repl.voice_state(), VoiceState::Idle);
        let out = String::from_utf8(repl.into_output()).unwrap();
        assert!(out.contains("Listening..."));
        assert!(out.contains("Click and Speak"));
    }

    #[test]
    fn test_run_until_quit() {
        let mut repl = repl(vec![]);
        let (tx, lines) = flume::unbounded();
        for line in ["2 * 3 =", ":quit", "9"] {
            tx.send(line.to_string()).unwrap();
        }
        repl.run(&lines).unwrap();
        assert_eq!(buffer(&repl), "6");
    }
}
