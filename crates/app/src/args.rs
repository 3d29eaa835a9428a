use std::fmt;
use std::path::PathBuf;

use quiz_core::model::{ExamMode, QuizId, SessionPolicy};
use services::HistoryTab;

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidQuizId { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidStatus { raw: String },
    InvalidExamMode { raw: String },
    InvalidBank { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid --quiz-id value: {raw:?}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidStatus { raw } => {
                write!(f, "invalid --status value: {raw} (all|finished|unfinished)")
            }
            ArgsError::InvalidExamMode { raw } => {
                write!(f, "invalid --mode value: {raw} (solved|new|bookmarked|all)")
            }
            ArgsError::InvalidBank { raw } => write!(f, "invalid --bank value: {raw:?}"),
        }
    }
}

impl std::error::Error for ArgsError {}

/// Where questions come from and how the session behaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionArgs {
    pub bank: Option<PathBuf>,
    pub policy: SessionPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeArgs {
    pub session: SessionArgs,
    pub quiz_id: QuizId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateArgs {
    pub session: SessionArgs,
    pub subject: String,
    pub chapters: Vec<String>,
    pub name: String,
    pub question_count: Option<u32>,
    pub time_limit: Option<u32>,
    pub exam_mode: ExamMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryArgs {
    pub search: String,
    pub tab: HistoryTab,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Take(TakeArgs),
    Create(CreateArgs),
    History(HistoryArgs),
    Help,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number(flag: &'static str, raw: String) -> Result<u32, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn parse_bank(raw: String) -> Result<PathBuf, ArgsError> {
    if raw.trim().is_empty() {
        return Err(ArgsError::InvalidBank { raw });
    }
    Ok(PathBuf::from(raw))
}

impl SessionArgs {
    fn from_env(env: &impl Fn(&str) -> Option<String>) -> Result<Self, ArgsError> {
        Ok(Self {
            bank: env("QUIZ_BANK").map(parse_bank).transpose()?,
            policy: SessionPolicy::default(),
        })
    }

    /// Consume a shared session flag. Returns `false` if `arg` is not one.
    fn accept(
        &mut self,
        arg: &str,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<bool, ArgsError> {
        match arg {
            "--bank" => self.bank = Some(parse_bank(require_value(args, "--bank")?)?),
            "--permissive" => self.policy = self.policy.with_choice_validation(false),
            "--gated" => self.policy = self.policy.with_answer_required_to_advance(true),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Parse the command line. `env` supplies environment fallbacks.
pub fn parse(
    argv: impl IntoIterator<Item = String>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Command, ArgsError> {
    let mut args = argv.into_iter().peekable();

    // No subcommand (or flags only) means `take`.
    let command = match args.peek().map(String::as_str) {
        None => "take".to_string(),
        Some(first) if first.starts_with('-') && first != "-h" && first != "--help" => {
            "take".to_string()
        }
        Some(_) => args.next().unwrap_or_default(),
    };

    match command.as_str() {
        "take" => parse_take(&mut args, &env),
        "create" => parse_create(&mut args, &env),
        "history" => parse_history(&mut args),
        "help" | "--help" | "-h" => Ok(Command::Help),
        _ => Err(ArgsError::UnknownCommand(command)),
    }
}

fn parse_take(
    args: &mut impl Iterator<Item = String>,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<Command, ArgsError> {
    let mut session = SessionArgs::from_env(env)?;
    let mut raw_id = env("QUIZ_ID").unwrap_or_else(|| "sample".to_string());

    while let Some(arg) = args.next() {
        if session.accept(&arg, args)? {
            continue;
        }
        match arg.as_str() {
            "--quiz-id" => raw_id = require_value(args, "--quiz-id")?,
            "--help" | "-h" => return Ok(Command::Help),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    let quiz_id = QuizId::new(raw_id.as_str()).map_err(|_| ArgsError::InvalidQuizId { raw: raw_id })?;
    Ok(Command::Take(TakeArgs { session, quiz_id }))
}

fn parse_create(
    args: &mut impl Iterator<Item = String>,
    env: &impl Fn(&str) -> Option<String>,
) -> Result<Command, ArgsError> {
    let mut parsed = CreateArgs {
        session: SessionArgs::from_env(env)?,
        subject: String::new(),
        chapters: Vec::new(),
        name: String::new(),
        question_count: None,
        time_limit: None,
        exam_mode: ExamMode::default(),
    };

    while let Some(arg) = args.next() {
        if parsed.session.accept(&arg, args)? {
            continue;
        }
        match arg.as_str() {
            "--subject" => parsed.subject = require_value(args, "--subject")?,
            "--chapter" => parsed.chapters.push(require_value(args, "--chapter")?),
            "--name" => parsed.name = require_value(args, "--name")?,
            "--count" => {
                parsed.question_count = Some(parse_number("--count", require_value(args, "--count")?)?);
            }
            "--time-limit" => {
                parsed.time_limit =
                    Some(parse_number("--time-limit", require_value(args, "--time-limit")?)?);
            }
            "--mode" => {
                let raw = require_value(args, "--mode")?;
                parsed.exam_mode = raw
                    .parse()
                    .map_err(|_| ArgsError::InvalidExamMode { raw })?;
            }
            "--help" | "-h" => return Ok(Command::Help),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(Command::Create(parsed))
}

fn parse_history(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
    let mut parsed = HistoryArgs {
        search: String::new(),
        tab: HistoryTab::All,
        page: 1,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--search" => parsed.search = require_value(args, "--search")?,
            "--status" => {
                let raw = require_value(args, "--status")?;
                parsed.tab = raw.parse().map_err(|_| ArgsError::InvalidStatus { raw })?;
            }
            "--page" => parsed.page = parse_number("--page", require_value(args, "--page")?)?,
            "--help" | "-h" => return Ok(Command::Help),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(Command::History(parsed))
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- take    [--quiz-id <id>] [session options]");
    eprintln!("  cargo run -p app -- create  --subject <s> --chapter <c>... --name <n> [options]");
    eprintln!("  cargo run -p app -- history [--search <text>] [--status all|finished|unfinished] [--page <n>]");
    eprintln!();
    eprintln!("Session options:");
    eprintln!("  --bank <path>             JSON question bank (default: bundled sample quiz)");
    eprintln!("  --permissive              Accept answers that are not listed choices");
    eprintln!("  --gated                   Require an answer before moving to the next question");
    eprintln!();
    eprintln!("Create options:");
    eprintln!("  --count <n>               Number of questions (default: 10)");
    eprintln!("  --time-limit <minutes>    Make the quiz timed");
    eprintln!("  --mode <mode>             solved|new|bookmarked|all (default: all)");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_BANK, QUIZ_ID, RUST_LOG");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_to_take_sample() {
        let Command::Take(take) = parse(argv(&[]), no_env).unwrap() else {
            panic!("expected take");
        };
        assert_eq!(take.quiz_id.as_str(), "sample");
        assert_eq!(take.session.bank, None);
        assert_eq!(take.session.policy, SessionPolicy::default());
    }

    #[test]
    fn flags_without_subcommand_mean_take() {
        let Command::Take(take) = parse(argv(&["--gated", "--quiz-id", "algebra"]), no_env).unwrap()
        else {
            panic!("expected take");
        };
        assert_eq!(take.quiz_id.as_str(), "algebra");
        assert!(take.session.policy.requires_answer_to_advance());
        assert!(take.session.policy.validates_choices());
    }

    #[test]
    fn env_fallbacks_are_overridden_by_flags() {
        let env = |key: &str| match key {
            "QUIZ_BANK" => Some("bank.json".to_string()),
            "QUIZ_ID" => Some("from-env".to_string()),
            _ => None,
        };
        let Command::Take(take) = parse(argv(&["take", "--permissive"]), env).unwrap() else {
            panic!("expected take");
        };
        assert_eq!(take.quiz_id.as_str(), "from-env");
        assert_eq!(take.session.bank, Some(PathBuf::from("bank.json")));
        assert!(!take.session.policy.validates_choices());

        let Command::Take(take) = parse(argv(&["--quiz-id", "cli"]), env).unwrap() else {
            panic!("expected take");
        };
        assert_eq!(take.quiz_id.as_str(), "cli");
    }

    #[test]
    fn create_collects_details() {
        let cmd = parse(
            argv(&[
                "create", "--subject", "Physics", "--chapter", "Kinematics", "--chapter", "Energy",
                "--name", "Mechanics", "--count", "4", "--time-limit", "20", "--mode", "new",
            ]),
            no_env,
        )
        .unwrap();
        let Command::Create(create) = cmd else {
            panic!("expected create");
        };
        assert_eq!(create.chapters, ["Kinematics", "Energy"]);
        assert_eq!(create.question_count, Some(4));
        assert_eq!(create.time_limit, Some(20));
        assert_eq!(create.exam_mode, ExamMode::New);
    }

    #[test]
    fn history_flags() {
        let cmd = parse(
            argv(&["history", "--search", "chem", "--status", "unfinished", "--page", "2"]),
            no_env,
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::History(HistoryArgs {
                search: "chem".into(),
                tab: HistoryTab::Unfinished,
                page: 2,
            })
        );
    }

    #[test]
    fn reports_bad_input() {
        assert_eq!(
            parse(argv(&["--quiz-id"]), no_env),
            Err(ArgsError::MissingValue { flag: "--quiz-id" })
        );
        assert_eq!(
            parse(argv(&["--quiz-id", "  "]), no_env),
            Err(ArgsError::InvalidQuizId { raw: "  ".into() })
        );
        assert!(matches!(
            parse(argv(&["history", "--page", "two"]), no_env),
            Err(ArgsError::InvalidNumber { flag: "--page", .. })
        ));
        assert!(matches!(
            parse(argv(&["history", "--status", "done"]), no_env),
            Err(ArgsError::InvalidStatus { .. })
        ));
        assert_eq!(
            parse(argv(&["grade"]), no_env),
            Err(ArgsError::UnknownCommand("grade".into()))
        );
        assert_eq!(
            parse(argv(&["take", "--verbose"]), no_env),
            Err(ArgsError::UnknownArg("--verbose".into()))
        );
        assert_eq!(parse(argv(&["-h"]), no_env), Ok(Command::Help));
    }
}
