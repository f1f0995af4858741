//! Text rendering of the calculator: display line, keypad grid and voice
//! toggle.

use crate::error::CalcError;
use crate::session::{KEYPAD, VoiceState};
use crate::voice::{LABEL_IDLE, LABEL_LISTENING};

/// Width of one keypad cell, in characters.
const CELL_WIDTH: usize = 6;

/// Hint shown under the display.
pub const VARIABLE_HINT: &str = "Use 'x' as variable for Calculus";

fn row_rule() -> String {
    let cells: Vec<String> = (0..KEYPAD[0].len()).map(|_| "-".repeat(CELL_WIDTH)).collect();
    format!("+{}+", cells.join("+"))
}

/// Render the keypad as a boxed grid.
pub fn render_keypad() -> String {
    let rule = row_rule();
    let mut lines = vec![rule.clone()];
    for row in KEYPAD {
        let cells: Vec<String> = row
            .iter()
            .map(|label| format!("{:^width$}", label, width = CELL_WIDTH))
            .collect();
        lines.push(format!("|{}|", cells.join("|")));
        lines.push(rule.clone());
    }
    lines.join("\n")
}

/// Render the buffer right-aligned across the keypad width.
pub fn render_display(buffer: &str) -> String {
    let width = row_rule().chars().count() - 4;
    format!("[ {:>width$} ]", buffer, width = width)
}

/// Label of the voice toggle for `state`.
pub fn voice_label(state: VoiceState) -> &'static str {
    match state {
        VoiceState::Idle => LABEL_IDLE,
        VoiceState::Capturing => LABEL_LISTENING,
    }
}

pub fn render_voice_toggle(state: VoiceState) -> String {
    format!("( {} )", voice_label(state))
}

/// A warning or error notice.
pub fn render_notice(err: &CalcError) -> String {
    format!("[{}] {}", err.title(), err)
}

/// Display, hint, voice toggle and keypad together.
pub fn render_calculator(buffer: &str, state: VoiceState) -> String {
    [
        render_display(buffer),
        VARIABLE_HINT.to_string(),
        render_voice_toggle(state),
        render_keypad(),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypad_has_every_button() {
        let keypad = render_keypad();
        for label in KEYPAD.iter().flatten() {
            assert!(keypad.contains(label), "missing {label}");
        }
        assert_eq!(keypad.lines().count(), KEYPAD.len() * 2 + 1);
    }

    #[test]
    fn test_keypad_rows_align() {
        let widths: Vec<usize> = render_keypad().lines().map(|l| l.chars().count()).collect();
        assert!(widths.iter().all(|w| *w == widths[0]));
    }

    #[test]
    fn test_display_is_right_aligned() {
        let display = render_display("42");
        assert!(display.ends_with("42 ]"));
        assert_eq!(display.chars().count(), row_rule().chars().count());
    }

    #[test]
    fn test_voice_labels() {
        assert_eq!(voice_label(VoiceState::Idle), "Click and Speak");
        assert_eq!(voice_label(VoiceState::Capturing), "Listening...");
    }

    #[test]
    fn test_notice_titles() {
        assert_eq!(
            render_notice(&CalcError::MissingExpression),
            "[Warning] Please enter an expression with variable 'x'"
        );
        assert_eq!(
            render_notice(&CalcError::InvalidExpression("1/0".into())),
            "[Error] Invalid Expression"
        );
    }
}
