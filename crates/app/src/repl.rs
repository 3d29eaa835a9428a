//! Line-oriented front end for a quiz session.

use std::fmt::Write as _;

use quiz_core::model::ScoreBand;
use services::SessionSnapshot;

/// One user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// 1-based choice number of the current question.
    Choose(usize),
    /// Raw answer text.
    Answer(String),
    Next,
    Previous,
    /// 1-based question number.
    GoTo(usize),
    Note(String),
    Finish,
    Restart,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  <n>          pick choice n
  a <text>     answer with raw text
  n / p        next / previous question
  g <n>        go to question n
  note <text>  attach a note (empty clears it)
  f            finish the quiz
  r            restart
  s            print the session as JSON
  h            this help
  q            quit";

/// Parse an input line.
///
/// # Errors
///
/// Returns a message for the user when the line is not a command.
pub fn parse_intent(line: &str) -> Result<Intent, String> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));

    if let Ok(n) = word.parse::<usize>() {
        if !rest.is_empty() {
            return Err(format!("unexpected text after choice number: {rest}"));
        }
        return Ok(Intent::Choose(n));
    }

    match word.to_ascii_lowercase().as_str() {
        "a" | "answer" if !rest.is_empty() => Ok(Intent::Answer(rest.to_string())),
        "a" | "answer" => Err("answer needs text".into()),
        "n" | "next" => Ok(Intent::Next),
        "p" | "prev" | "previous" => Ok(Intent::Previous),
        "g" | "goto" => rest
            .parse()
            .map(Intent::GoTo)
            .map_err(|_| format!("goto needs a question number, got {rest:?}")),
        "note" => Ok(Intent::Note(rest.to_string())),
        "f" | "finish" => Ok(Intent::Finish),
        "r" | "restart" => Ok(Intent::Restart),
        "s" | "show" => Ok(Intent::Show),
        "h" | "help" | "?" => Ok(Intent::Help),
        "q" | "quit" | "exit" => Ok(Intent::Quit),
        "" => Err("type h for help".into()),
        other => Err(format!("unknown command: {other} (type h for help)")),
    }
}

fn band_label(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Good => "good",
        ScoreBand::Fair => "fair",
        ScoreBand::Poor => "needs work",
    }
}

/// Render the current question, feedback and, once completed, the result.
#[must_use]
pub fn render(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    let q = &snapshot.question;

    let _ = writeln!(
        out,
        "{} · {}   question {} of {}   ({} answered)",
        snapshot.title,
        snapshot.subject,
        q.number,
        snapshot.total,
        snapshot.progress.answered
    );
    let _ = writeln!(out, "{}", q.prompt);
    for (i, choice) in q.choices.iter().enumerate() {
        let marker = if q.selected.as_deref() == Some(choice.as_str()) { '*' } else { ' ' };
        let _ = writeln!(out, " {marker} {}) {choice}", i + 1);
    }
    if let Some(selected) = q.selected.as_deref().filter(|s| !q.choices.iter().any(|c| c == s)) {
        let _ = writeln!(out, "   answered: {selected}");
    }

    if let Some(feedback) = &snapshot.feedback {
        if feedback.is_correct {
            let _ = writeln!(out, "Correct!");
        } else {
            let _ = writeln!(out, "Incorrect. The correct answer is {}.", feedback.correct_answer);
        }
        if let Some(explanation) = &feedback.explanation {
            let _ = writeln!(out, "{explanation}");
        }
    }
    if let Some(note) = q.note.as_deref().filter(|n| !n.is_empty()) {
        let _ = writeln!(out, "note: {note}");
    }

    if let Some(result) = &snapshot.result {
        let _ = writeln!(
            out,
            "Quiz complete: {}/{} correct ({}%, {})",
            result.correct,
            result.total,
            result.percentage,
            band_label(snapshot.score.band())
        );
        if !result.notes.is_empty() {
            let _ = writeln!(out, "Your notes:");
            for note in &result.notes {
                let _ = writeln!(out, "  Q{}: {}", note.number, note.text);
            }
        }
    } else if snapshot.can_finish {
        let _ = writeln!(out, "All questions answered. Type f to finish.");
    }

    out
}
