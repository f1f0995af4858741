//! One-shot commands and their printable reports.

use crate::calculator::{self, Operation};
use crate::dispatcher::{VoiceOutcome, handle_transcript};
use crate::error::CalcError;
use crate::session::{Session, SharedSession, shared};
use crate::voice::Speaker;
use serde::Serialize;
use std::fmt;

/// Outcome of a one-shot command.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Feedback spoken by voice commands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spoken: Option<String>,
}

impl Report {
    fn from_result(input: &str, result: Result<String, CalcError>) -> Self {
        match result {
            Ok(output) => Self {
                input: input.to_string(),
                output: Some(output),
                ..Self::default()
            },
            Err(err) => Self {
                input: input.to_string(),
                error: Some(err.to_string()),
                ..Self::default()
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.output, &self.error) {
            (_, Some(error)) => write!(f, "{}", error),
            (Some(output), None) => write!(f, "{}", output),
            (None, None) => Ok(()),
        }
    }
}

/// Evaluate a free-text expression numerically.
pub fn eval(input: &str, precision: u32) -> Report {
    let result = if input.trim().is_empty() {
        Err(CalcError::InvalidExpression(String::new()))
    } else {
        calculator::evaluate_expression(input, precision).map(|e| e.result)
    };
    Report::from_result(input, result)
}

/// Differentiate or integrate a free-text expression.
pub fn calculus(input: &str, op: Operation) -> Report {
    Report::from_result(input, calculator::calculate(input, op))
}

/// Run the voice text pipeline without touching a session.
pub fn parse(transcript: &str) -> Report {
    let cleaned = calculator::parse_voice_command(transcript);
    Report {
        input: transcript.to_string(),
        output: Some(cleaned),
        ..Report::default()
    }
}

/// Run a full voice command against a fresh session.
pub fn say(transcript: &str, precision: u32, speaker: &dyn Speaker) -> Report {
    let session: SharedSession = shared(Session::new(precision));
    let outcome = handle_transcript(&session, speaker, Some(transcript));
    let buffer = crate::session::lock(&session).buffer().to_string();

    let mut report = Report {
        input: transcript.to_string(),
        spoken: outcome.feedback(),
        ..Report::default()
    };
    match outcome {
        VoiceOutcome::Failed(err) => report.error = Some(err.to_string()),
        VoiceOutcome::NoTranscript => report.error = Some(CalcError::NoTranscript.to_string()),
        _ => report.output = Some(buffer),
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::DEFAULT_PRECISION;
    use crate::voice::RecordingSpeaker;

    #[test]
    fn test_eval_report() {
        let report = eval("7+3", DEFAULT_PRECISION);
        assert_eq!(report.output.as_deref(), Some("10"));
        assert!(!report.is_error());
        assert_eq!(report.to_string(), "10");
    }

    #[test]
    fn test_eval_error_report() {
        let report = eval("1/0", DEFAULT_PRECISION);
        assert!(report.is_error());
        assert_eq!(report.to_string(), "Invalid Expression");
        assert_eq!(
            report.to_json().unwrap(),
            r#"{"input":"1/0","error":"Invalid Expression"}"#
        );
    }

    #[test]
    fn test_calculus_report() {
        assert_eq!(
            calculus("x", Operation::Integrate).output.as_deref(),
            Some("x**2/2 + C")
        );
        assert!(calculus("", Operation::Differentiate).is_error());
    }

    #[test]
    fn test_parse_report() {
        let report = parse("five plus three equals");
        assert_eq!(
            report.to_json().unwrap(),
            r#"{"input":"five plus three equals","output":"5+3="}"#
        );
    }

    #[test]
    fn test_say_report() {
        let speaker = RecordingSpeaker::default();
        let report = say("five plus three equals", DEFAULT_PRECISION, &speaker);
        assert_eq!(report.output.as_deref(), Some("8"));
        assert_eq!(report.spoken.as_deref(), Some("The result is 8"));
        assert_eq!(speaker.spoken(), vec!["The result is 8".to_string()]);
    }

    #[test]
    fn test_say_without_transcript() {
        let speaker = RecordingSpeaker::default();
        let report = say("   ", DEFAULT_PRECISION, &speaker);
        assert_eq!(report.error.as_deref(), Some("Sorry, I didn't catch that."));
    }
}
