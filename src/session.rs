//! Calculator session: the expression buffer, the voice capture state and
//! the keypad that drives them.

use crate::calculator::{self, DEFAULT_PRECISION, Operation};
use crate::error::CalcError;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Keypad layout, row by row, as button labels.
pub const KEYPAD: [[&str; 5]; 6] = [
    ["7", "8", "9", "/", "C"],
    ["4", "5", "6", "*", "√"],
    ["1", "2", "3", "-", "x²"],
    ["0", ".", "x", "+", "="],
    ["sin", "cos", "tan", "log", "**"],
    ["d/dx", "∫", "(", ")", "π"],
];

const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

/// Functions with a keypad button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyFunction {
    Sin,
    Cos,
    Tan,
    Log,
}

impl KeyFunction {
    fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Log => "log",
        }
    }
}

/// A keypad button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    Point,
    Plus,
    Minus,
    Times,
    Divide,
    Power,
    OpenParen,
    CloseParen,
    Variable,
    Square,
    Sqrt,
    Pi,
    Function(KeyFunction),
    Equals,
    Clear,
    Derivative,
    Integral,
}

/// What pressing a key does to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Append(&'static str),
    Evaluate,
    Clear,
    Calculus(Operation),
}

impl Key {
    /// The button label.
    pub fn label(self) -> &'static str {
        match self {
            Key::Digit(d) => DIGITS[usize::from(d % 10)],
            Key::Point => ".",
            Key::Plus => "+",
            Key::Minus => "-",
            Key::Times => "*",
            Key::Divide => "/",
            Key::Power => "**",
            Key::OpenParen => "(",
            Key::CloseParen => ")",
            Key::Variable => "x",
            Key::Square => "x²",
            Key::Sqrt => "√",
            Key::Pi => "π",
            Key::Function(f) => f.name(),
            Key::Equals => "=",
            Key::Clear => "C",
            Key::Derivative => "d/dx",
            Key::Integral => "∫",
        }
    }

    pub fn action(self) -> KeyAction {
        match self {
            Key::Equals => KeyAction::Evaluate,
            Key::Clear => KeyAction::Clear,
            Key::Derivative => KeyAction::Calculus(Operation::Differentiate),
            Key::Integral => KeyAction::Calculus(Operation::Integrate),
            Key::Square => KeyAction::Append("²"),
            Key::Function(KeyFunction::Sin) => KeyAction::Append("sin("),
            Key::Function(KeyFunction::Cos) => KeyAction::Append("cos("),
            Key::Function(KeyFunction::Tan) => KeyAction::Append("tan("),
            Key::Function(KeyFunction::Log) => KeyAction::Append("log("),
            other => KeyAction::Append(other.label()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = match s {
            "." => Key::Point,
            "+" => Key::Plus,
            "-" => Key::Minus,
            "*" => Key::Times,
            "/" => Key::Divide,
            "**" => Key::Power,
            "(" => Key::OpenParen,
            ")" => Key::CloseParen,
            "x" => Key::Variable,
            "x²" | "x^2" => Key::Square,
            "√" | "sqrt" => Key::Sqrt,
            "π" | "pi" => Key::Pi,
            "sin" => Key::Function(KeyFunction::Sin),
            "cos" => Key::Function(KeyFunction::Cos),
            "tan" => Key::Function(KeyFunction::Tan),
            "log" => Key::Function(KeyFunction::Log),
            "=" => Key::Equals,
            "C" | "c" => Key::Clear,
            "d/dx" => Key::Derivative,
            "∫" | "int" => Key::Integral,
            digit if digit.len() == 1 && digit.as_bytes()[0].is_ascii_digit() => {
                Key::Digit(digit.as_bytes()[0] - b'0')
            }
            other => return Err(format!("Unknown key '{}'", other)),
        };
        Ok(key)
    }
}

/// Voice capture state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VoiceState {
    #[default]
    Idle,
    Capturing,
}

/// What a failed operation does to the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Numeric evaluation: start over.
    ClearBuffer,
    /// Calculus: keep the expression so it can be edited.
    KeepBuffer,
}

/// Result of a successful session operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Text was appended.
    Updated,
    /// The buffer was emptied.
    Cleared,
    /// Nothing to do (e.g. `=` on an empty buffer).
    Unchanged,
    /// Numeric evaluation replaced the buffer.
    Evaluated(String),
    /// A derivative or integral replaced the buffer.
    Calculated(Operation, String),
}

/// The calculator's entire mutable state.
#[derive(Debug)]
pub struct Session {
    buffer: String,
    voice: VoiceState,
    precision: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION)
    }
}

impl Session {
    pub fn new(precision: u32) -> Self {
        Self {
            buffer: String::new(),
            voice: VoiceState::Idle,
            precision,
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn set_buffer(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    /// Append raw text (free typing into the display).
    pub fn append(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn voice_state(&self) -> VoiceState {
        self.voice
    }

    /// Enter `Capturing`; returns false if a capture is already running.
    pub fn begin_capture(&mut self) -> bool {
        if self.voice == VoiceState::Capturing {
            return false;
        }
        self.voice = VoiceState::Capturing;
        true
    }

    pub fn end_capture(&mut self) {
        self.voice = VoiceState::Idle;
    }

    /// Handle a keypad button.
    pub fn press(&mut self, key: Key) -> Result<Outcome, CalcError> {
        debug!(%key, "key pressed");
        match key.action() {
            KeyAction::Append(text) => {
                self.append(text);
                Ok(Outcome::Updated)
            }
            KeyAction::Clear => {
                self.clear();
                Ok(Outcome::Cleared)
            }
            KeyAction::Evaluate => self.evaluate(),
            KeyAction::Calculus(op) => self.calculus(op),
        }
    }

    /// Numeric evaluation of the buffer; failure clears it.
    pub fn evaluate(&mut self) -> Result<Outcome, CalcError> {
        if self.buffer.trim().is_empty() {
            return Ok(Outcome::Unchanged);
        }
        match calculator::evaluate_expression(&self.buffer, self.precision) {
            Ok(evaluation) => {
                self.buffer = evaluation.result.clone();
                Ok(Outcome::Evaluated(evaluation.result))
            }
            Err(err) => Err(self.fail(err, FailurePolicy::ClearBuffer)),
        }
    }

    /// Derivative or integral of the buffer; failure keeps it.
    pub fn calculus(&mut self, op: Operation) -> Result<Outcome, CalcError> {
        match calculator::calculate(&self.buffer, op) {
            Ok(result) => {
                self.buffer = result.clone();
                Ok(Outcome::Calculated(op, result))
            }
            Err(err) => Err(self.fail(err, FailurePolicy::KeepBuffer)),
        }
    }

    fn fail(&mut self, err: CalcError, policy: FailurePolicy) -> CalcError {
        if err.is_warning() {
            debug!(%err, "calculator warning");
        } else {
            warn!(?err, buffer = %self.buffer, "calculator operation failed");
        }
        if policy == FailurePolicy::ClearBuffer {
            self.clear();
        }
        err
    }
}

/// Session handle shared between the UI loop and the voice worker.
pub type SharedSession = Arc<Mutex<Session>>;

pub fn shared(session: Session) -> SharedSession {
    Arc::new(Mutex::new(session))
}

/// Lock a shared session, recovering the state if a holder panicked.
pub fn lock(session: &SharedSession) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}
