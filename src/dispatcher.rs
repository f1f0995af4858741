//! Voice command dispatch.
//!
//! An activation moves the session from `Idle` to `Capturing`, runs one
//! capture-and-transcribe cycle on a worker thread, routes the cleaned
//! transcript into the session and reports back over a channel. The session
//! returns to `Idle` whatever the outcome.

use crate::calculator::{self, Marker, Operation};
use crate::error::CalcError;
use crate::session::{self, Outcome, SharedSession};
use crate::voice::{Listener, NOT_UNDERSTOOD, Speaker};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Result of handling one voice command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoiceOutcome {
    /// Capture produced nothing.
    NoTranscript,
    /// The transcript cleaned to nothing; dropped silently.
    Ignored,
    /// The buffer was cleared.
    Cleared,
    /// The buffer now holds this expression, unevaluated.
    Expression(String),
    /// Numeric evaluation produced this result.
    Evaluated(String),
    /// A derivative or integral produced this result.
    Calculated(Operation, String),
    /// The routed operation failed.
    Failed(CalcError),
}

impl VoiceOutcome {
    /// Text spoken back to the user, if any.
    pub fn feedback(&self) -> Option<String> {
        match self {
            Self::NoTranscript => Some(NOT_UNDERSTOOD.to_string()),
            Self::Ignored => None,
            Self::Cleared => Some("Cleared".to_string()),
            Self::Expression(expr) => Some(format!("Expression is {}", expr)),
            Self::Evaluated(result) => Some(format!("The result is {}", result)),
            Self::Calculated(op, result) => Some(format!("The {} is {}", op.noun(), result)),
            Self::Failed(err) => Some(err.to_string().replace('\n', " ")),
        }
    }
}

/// Sent to the UI loop when a voice worker finishes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoiceEvent {
    Finished { outcome: VoiceOutcome },
}

fn strip_markers(text: &str) -> String {
    text.chars()
        .filter(|&c| c != '=' && Marker::from_symbol(c).is_none())
        .collect::<String>()
        .trim()
        .to_string()
}

fn route(shared: &SharedSession, cleaned: &str) -> VoiceOutcome {
    let mut session = session::lock(shared);
    // A command word alone ("equals", "differentiate") acts on the buffer.
    let expression = strip_markers(cleaned);

    if cleaned.contains(Marker::Clear.symbol()) {
        session.clear();
        return VoiceOutcome::Cleared;
    }

    let op = if cleaned.contains(Marker::Derivative.symbol()) {
        Some(Operation::Differentiate)
    } else if cleaned.contains(Marker::Integral.symbol()) {
        Some(Operation::Integrate)
    } else {
        None
    };

    if let Some(op) = op {
        if !expression.is_empty() {
            session.set_buffer(expression);
        }
        return match session.calculus(op) {
            Ok(Outcome::Calculated(op, result)) => VoiceOutcome::Calculated(op, result),
            Ok(_) => VoiceOutcome::Expression(session.buffer().to_string()),
            Err(err) => VoiceOutcome::Failed(err),
        };
    }

    if cleaned.contains('=') {
        if !expression.is_empty() {
            session.set_buffer(expression);
        }
        return match session.evaluate() {
            Ok(Outcome::Evaluated(result)) => VoiceOutcome::Evaluated(result),
            Ok(_) => VoiceOutcome::Ignored,
            Err(err) => VoiceOutcome::Failed(err),
        };
    }

    session.set_buffer(cleaned.trim());
    VoiceOutcome::Expression(session.buffer().to_string())
}

/// Route one transcript into the session and speak the feedback.
///
/// The session lock is released before speaking.
pub fn handle_transcript(
    session: &SharedSession,
    speaker: &dyn Speaker,
    transcript: Option<&str>,
) -> VoiceOutcome {
    let outcome = match transcript.map(str::trim).filter(|t| !t.is_empty()) {
        None => VoiceOutcome::NoTranscript,
        Some(transcript) => {
            let cleaned = calculator::parse_voice_command(transcript);
            info!(%transcript, %cleaned, "voice command");
            if cleaned.is_empty() {
                VoiceOutcome::Ignored
            } else {
                route(session, &cleaned)
            }
        }
    };

    if let Some(text) = outcome.feedback() {
        speaker.speak(&text);
    }
    outcome
}

/// Owns the voice backends and runs capture workers.
#[derive(Clone)]
pub struct Dispatcher {
    session: SharedSession,
    listener: Arc<dyn Listener>,
    speaker: Arc<dyn Speaker>,
    events: flume::Sender<VoiceEvent>,
}

impl Dispatcher {
    /// Create a dispatcher and the receiving end of its completion channel.
    pub fn new(
        session: SharedSession,
        listener: Arc<dyn Listener>,
        speaker: Arc<dyn Speaker>,
    ) -> (Self, flume::Receiver<VoiceEvent>) {
        let (events, rx) = flume::unbounded();
        (
            Self {
                session,
                listener,
                speaker,
                events,
            },
            rx,
        )
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn speaker(&self) -> &dyn Speaker {
        self.speaker.as_ref()
    }

    /// Start a capture worker, or do nothing if one is already running.
    pub fn activate(&self) -> Option<JoinHandle<()>> {
        if !session::lock(&self.session).begin_capture() {
            debug!("voice capture already running");
            return None;
        }
        info!("voice capture started");

        let worker = self.clone();
        Some(thread::spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                let transcript = worker.listener.listen();
                handle_transcript(&worker.session, worker.speaker(), transcript.as_deref())
            }))
            .unwrap_or_else(|_| {
                error!("voice capture aborted");
                VoiceOutcome::Failed(CalcError::NoTranscript)
            });
            session::lock(&worker.session).end_capture();
            debug!(?outcome, "voice capture finished");
            let _ = worker.events.send(VoiceEvent::Finished { outcome });
        }))
    }

    /// Handle a transcript directly, as if it had just been captured.
    pub fn say(&self, transcript: &str) -> VoiceOutcome {
        handle_transcript(&self.session, self.speaker(), Some(transcript))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, VoiceState, shared};
    use crate::voice::{RecordingSpeaker, ScriptedListener};

    fn say(session: &SharedSession, transcript: &str) -> (VoiceOutcome, Vec<String>) {
        let speaker = RecordingSpeaker::default();
        let outcome = handle_transcript(session, &speaker, Some(transcript));
        (outcome, speaker.spoken())
    }

    #[test]
    fn test_spoken_sum_is_evaluated() {
        let session = shared(Session::default());
        let (outcome, spoken) = say(&session, "five plus three equals");
        assert_eq!(outcome, VoiceOutcome::Evaluated("8".into()));
        assert_eq!(session::lock(&session).buffer(), "8");
        assert_eq!(spoken, vec!["The result is 8".to_string()]);
    }

    #[test]
    fn test_expression_without_equals_is_echoed() {
        let session = shared(Session::default());
        let (outcome, spoken) = say(&session, "what is two times six please");
        assert_eq!(outcome, VoiceOutcome::Expression("2*6".into()));
        assert_eq!(session::lock(&session).buffer(), "2*6");
        assert_eq!(spoken, vec!["Expression is 2*6".to_string()]);
    }

    #[test]
    fn test_spoken_derivative() {
        let session = shared(Session::default());
        let (outcome, spoken) = say(&session, "derivative of x squared");
        assert_eq!(
            outcome,
            VoiceOutcome::Calculated(Operation::Differentiate, "2*x".into())
        );
        assert_eq!(spoken, vec!["The derivative is 2*x".to_string()]);
    }

    #[test]
    fn test_spoken_integral() {
        let session = shared(Session::default());
        let (_, spoken) = say(&session, "integrate x");
        assert_eq!(session::lock(&session).buffer(), "x**2/2 + C");
        assert_eq!(spoken, vec!["The integral is x**2/2 + C".to_string()]);
    }

    #[test]
    fn test_calculus_without_expression_warns() {
        let session = shared(Session::default());
        let (outcome, spoken) = say(&session, "differentiate");
        assert_eq!(outcome, VoiceOutcome::Failed(CalcError::MissingExpression));
        assert_eq!(
            spoken,
            vec!["Please enter an expression with variable 'x'".to_string()]
        );
    }

    #[test]
    fn test_bare_equals_evaluates_buffer() {
        let session = shared(Session::default());
        session::lock(&session).set_buffer("7+3");
        let (outcome, spoken) = say(&session, "equals");
        assert_eq!(outcome, VoiceOutcome::Evaluated("10".into()));
        assert_eq!(session::lock(&session).buffer(), "10");
        assert_eq!(spoken, vec!["The result is 10".to_string()]);
    }

    #[test]
    fn test_bare_equals_on_empty_buffer_is_ignored() {
        let session = shared(Session::default());
        let (outcome, spoken) = say(&session, "equals");
        assert_eq!(outcome, VoiceOutcome::Ignored);
        assert!(spoken.is_empty());
    }

    #[test]
    fn test_bare_calculus_word_uses_buffer() {
        let session = shared(Session::default());
        session::lock(&session).set_buffer("x**2");
        let (outcome, _) = say(&session, "differentiate");
        assert_eq!(
            outcome,
            VoiceOutcome::Calculated(Operation::Differentiate, "2*x".into())
        );
    }

    #[test]
    fn test_spoken_sine_with_punctuation() {
        let session = shared(Session::default());
        let (outcome, _) = say(&session, "What is the sine of three zero equals.");
        assert_eq!(outcome, VoiceOutcome::Evaluated("0.5".into()));
    }

    #[test]
    fn test_spoken_clear() {
        let session = shared(Session::default());
        session::lock(&session).set_buffer("12+3");
        let (outcome, spoken) = say(&session, "clear");
        assert_eq!(outcome, VoiceOutcome::Cleared);
        assert_eq!(session::lock(&session).buffer(), "");
        assert_eq!(spoken, vec!["Cleared".to_string()]);
    }

    #[test]
    fn test_filler_only_is_silently_dropped() {
        let session = shared(Session::default());
        session::lock(&session).set_buffer("7");
        let (outcome, spoken) = say(&session, "um hello there");
        assert_eq!(outcome, VoiceOutcome::Ignored);
        assert!(spoken.is_empty());
        assert_eq!(session::lock(&session).buffer(), "7");
    }

    #[test]
    fn test_failed_spoken_evaluation_clears() {
        let session = shared(Session::default());
        let (outcome, _) = say(&session, "one divided by zero equals");
        assert!(matches!(outcome, VoiceOutcome::Failed(CalcError::InvalidExpression(_))));
        assert_eq!(session::lock(&session).buffer(), "");
    }

    #[test]
    fn test_no_transcript_apologises() {
        let session = shared(Session::default());
        let speaker = RecordingSpeaker::default();
        assert_eq!(
            handle_transcript(&session, &speaker, None),
            VoiceOutcome::NoTranscript
        );
        assert_eq!(speaker.spoken(), vec![NOT_UNDERSTOOD.to_string()]);
    }

    #[test]
    fn test_activation_runs_worker_and_reports() {
        let session = shared(Session::default());
        let listener = Arc::new(ScriptedListener::new([Some("five plus three equals")]));
        let speaker = Arc::new(RecordingSpeaker::default());
        let (dispatcher, events) = Dispatcher::new(session.clone(), listener, speaker.clone());

        let worker = dispatcher.activate().unwrap();
        worker.join().unwrap();

        assert_eq!(
            events.recv().unwrap(),
            VoiceEvent::Finished {
                outcome: VoiceOutcome::Evaluated("8".into())
            }
        );
        assert_eq!(session::lock(&session).buffer(), "8");
        assert_eq!(session::lock(&session).voice_state(), VoiceState::Idle);
        assert_eq!(speaker.spoken(), vec!["The result is 8".to_string()]);
    }

    #[test]
    fn test_activation_while_capturing_is_ignored() {
        let session = shared(Session::default());
        session::lock(&session).begin_capture();
        let listener = Arc::new(ScriptedListener::new([Some("one")]));
        let (dispatcher, events) =
            Dispatcher::new(session.clone(), listener, Arc::new(RecordingSpeaker::default()));

        assert!(dispatcher.activate().is_none());
        assert!(events.try_recv().is_err());
        assert_eq!(session::lock(&session).voice_state(), VoiceState::Capturing);
    }

    #[test]
    fn test_failed_capture_returns_to_idle() {
        let session = shared(Session::default());
        let listener = Arc::new(ScriptedListener::new([None::<String>]));
        let (dispatcher, events) =
            Dispatcher::new(session.clone(), listener, Arc::new(RecordingSpeaker::default()));

        dispatcher.activate().unwrap().join().unwrap();
        assert_eq!(
            events.recv().unwrap(),
            VoiceEvent::Finished {
                outcome: VoiceOutcome::NoTranscript
            }
        );
        assert_eq!(session::lock(&session).voice_state(), VoiceState::Idle);
    }

    struct BrokenListener;

    impl Listener for BrokenListener {
        fn listen(&self) -> Option<String> {
            panic!("audio device went away")
        }
    }

    #[test]
    fn test_worker_panic_still_reports_and_returns_to_idle() {
        let session = shared(Session::default());
        let (dispatcher, events) = Dispatcher::new(
            session.clone(),
            Arc::new(BrokenListener),
            Arc::new(RecordingSpeaker::default()),
        );

        dispatcher.activate().unwrap().join().unwrap();
        assert_eq!(
            events.recv().unwrap(),
            VoiceEvent::Finished {
                outcome: VoiceOutcome::Failed(CalcError::NoTranscript)
            }
        );
        assert_eq!(session::lock(&session).voice_state(), VoiceState::Idle);
    }
}
