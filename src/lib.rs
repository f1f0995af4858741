//! Keypad and voice calculator with numeric evaluation and symbolic
//! calculus in `x`.

pub mod calculator;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod report;
pub mod session;
pub mod symbolic;
pub mod ui;
pub mod voice;

pub use config::Config;
pub use dispatcher::{Dispatcher, VoiceEvent, VoiceOutcome};
pub use error::CalcError;
pub use session::{Key, Session, SharedSession, VoiceState};
