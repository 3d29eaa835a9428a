mod args;
mod repl;

use std::io::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use args::{Command, CreateArgs, HistoryArgs, SessionArgs, TakeArgs};
use quiz_core::model::QuizDetailsDraft;
use repl::Intent;
use services::{
    Clock, HistoryQuery, HistoryService, QuizSession, QuizWizard, SessionLoopService,
};
use storage::QuestionBank;
use storage::repository::Storage;
use storage::sample::sample_repository;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Questions from the bank file if one is given, otherwise the bundled sample
/// quiz. History always starts from the bundled rows.
fn open_storage(session: &SessionArgs) -> Result<Storage, Box<dyn std::error::Error>> {
    let sample = sample_repository()?;
    let Some(path) = &session.bank else {
        return Ok(Storage::from_repository(sample));
    };
    let bank = QuestionBank::from_path(path)?.into_repository();
    tracing::info!(bank = %path.display(), "loaded question bank");
    Ok(Storage {
        questions: Arc::new(bank),
        attempts: Arc::new(sample),
    })
}

fn loop_service(storage: &Storage, session: &SessionArgs) -> SessionLoopService {
    SessionLoopService::new(
        Clock::system(),
        Arc::clone(&storage.questions),
        Arc::clone(&storage.attempts),
    )
    .with_policy(session.policy)
}

async fn run_take(args: TakeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(&args.session)?;
    let svc = loop_service(&storage, &args.session);
    let session = svc.start_session(&args.quiz_id).await?;
    drive(&svc, session).await
}

async fn run_create(args: CreateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut wizard = QuizWizard::new();
    if let Some(minutes) = args.time_limit {
        wizard.set_time_limit(minutes)?;
    }
    wizard.next()?;
    wizard.set_exam_mode(args.exam_mode);
    wizard.next()?;
    let mut details = QuizDetailsDraft {
        subject: args.subject,
        chapters: args.chapters,
        name: args.name,
        ..QuizDetailsDraft::default()
    };
    if let Some(count) = args.question_count {
        details.question_count = count;
    }
    wizard.set_details(details);
    wizard.next()?;
    let config = wizard.generate(&Clock::system(), &mut rand::rng())?;
    println!("Created quiz {} ({})", config.id(), config.exam_mode().title());
    if let Some(minutes) = config.time().time_limit_minutes() {
        println!("Time limit: {minutes} min");
    }

    let storage = open_storage(&args.session)?;
    let svc = loop_service(&storage, &args.session);
    let session = svc.start_from_config(&config).await?;
    drive(&svc, session).await
}

async fn run_history(args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Storage::from_repository(sample_repository()?);
    let history = HistoryService::new(Arc::clone(&storage.attempts));

    let overview = history.overview().await?;
    println!(
        "{} attempts, {} finished, {} unfinished",
        overview.attempts, overview.finished, overview.unfinished
    );
    if let (Some(avg), Some(best)) = (overview.average_score, overview.best_score) {
        println!("average score {avg}%, best {best}%");
    }

    let page = history
        .list(&HistoryQuery {
            search: args.search,
            tab: args.tab,
            page: args.page,
        })
        .await?;
    if page.items.is_empty() {
        println!("No quizzes found");
        return Ok(());
    }
    for attempt in &page.items {
        let score = attempt
            .band()
            .map_or_else(|| "-".to_string(), |_| format!("{}%", attempt.score()));
        println!(
            "{:<4} {:<28} {:<12} {} {:>5} {:>3} questions  {}",
            attempt.id().to_string(),
            attempt.title(),
            attempt.subject(),
            attempt.taken_at().format("%Y-%m-%d"),
            score,
            attempt.total_questions(),
            attempt.status()
        );
    }
    println!("page {} of {}", page.page, page.total_pages);
    Ok(())
}

/// Read commands from stdin until the user quits or input ends.
async fn drive(svc: &SessionLoopService, mut session: QuizSession) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", repl::render(&session.snapshot()));
    println!("(type h for help)");

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let intent = match repl::parse_intent(&line) {
            Ok(intent) => intent,
            Err(msg) => {
                eprintln!("{msg}");
                continue;
            }
        };

        let step = match intent {
            Intent::Choose(n) => {
                let choice = n
                    .checked_sub(1)
                    .and_then(|i| session.current_question().choices().get(i).cloned());
                match choice {
                    Some(choice) => session.select_answer(choice),
                    None => {
                        eprintln!("no choice {n} on this question");
                        continue;
                    }
                }
            }
            Intent::Answer(text) => session.select_answer(text),
            Intent::Next => session.next(),
            Intent::Previous => session.previous(),
            Intent::GoTo(n) => match n.checked_sub(1) {
                Some(index) => session.go_to(index),
                None => {
                    eprintln!("questions are numbered from 1");
                    continue;
                }
            },
            Intent::Note(text) => Ok(session.set_note(text)),
            Intent::Finish => svc.finish(&mut session).await.map(|outcome| {
                println!("Saved to history as attempt {}", outcome.attempt_id);
                outcome.snapshot
            }),
            Intent::Restart => Ok(svc.restart(&mut session)),
            Intent::Show => {
                println!("{}", session.snapshot().to_json()?);
                continue;
            }
            Intent::Help => {
                println!("{}", repl::HELP);
                continue;
            }
            Intent::Quit => break,
        };

        match step {
            Ok(snapshot) => println!("{}", repl::render(&snapshot)),
            Err(err) => eprintln!("{err}"),
        }
    }

    leave(svc, session).await
}

/// Store the session's history entry on the way out: a finished session whose
/// recording failed gets one more attempt, an in-progress one is abandoned.
async fn leave(svc: &SessionLoopService, mut session: QuizSession) -> Result<(), Box<dyn std::error::Error>> {
    if session.is_complete() {
        if session.attempt_id().is_none() {
            let id = svc.record_completion(&mut session).await?;
            println!("Saved to history as attempt {id}");
        }
        return Ok(());
    }
    if let Some(id) = svc.abandon(session).await? {
        println!("Quiz left unfinished (attempt {id})");
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let command = args::parse(std::env::args().skip(1), |key| std::env::var(key).ok()).map_err(|e| {
        args::print_usage();
        e
    })?;

    match command {
        Command::Take(take) => run_take(take).await,
        Command::Create(create) => run_create(create).await,
        Command::History(history) => run_history(history).await,
        Command::Help => {
            args::print_usage();
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AttemptStatus, QuizId};
    use quiz_core::time::fixed_now;
    use storage::repository::AttemptRepository;

    #[tokio::test]
    async fn leaving_records_a_finished_but_unsaved_session() {
        let repo = sample_repository().unwrap();
        let svc = SessionLoopService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        let mut session = svc.start_session(&QuizId::new("sample").unwrap()).await.unwrap();
        for i in 0..session.len() {
            session.go_to(i).unwrap();
            let correct = session.current_question().correct_answer().to_owned();
            session.select_answer(correct).unwrap();
        }
        // completed locally, nothing stored yet
        session.finish(fixed_now()).unwrap();

        leave(&svc, session).await.unwrap();
        let rows = repo.list_attempts(1).await.unwrap();
        assert_eq!(rows[0].status(), AttemptStatus::Finished);
        assert_eq!(rows[0].score(), 100);
    }

    #[tokio::test]
    async fn leaving_mid_quiz_records_unfinished() {
        let repo = sample_repository().unwrap();
        let svc = SessionLoopService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        );
        let session = svc.start_session(&QuizId::new("sample").unwrap()).await.unwrap();

        leave(&svc, session).await.unwrap();
        let rows = repo.list_attempts(1).await.unwrap();
        assert_eq!(rows[0].status(), AttemptStatus::Unfinished);
    }
}
