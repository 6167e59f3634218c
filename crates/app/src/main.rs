use std::fmt;

use mastery_core::model::{LearnerId, NewSkillRecord, RecordError, RecordKind};
use mastery_core::{ContentCatalog, views};
use services::{AppServices, Clock, ProgressStore, ServiceError};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { command: &'static str, name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidNumber { name: &'static str, raw: String },
    InvalidLearner { raw: String },
    InvalidRecordKind(RecordError),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { command, name } => {
                write!(f, "{command} requires <{name}>")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidNumber { name, raw } => write!(f, "invalid <{name}> value: {raw}"),
            ArgsError::InvalidLearner { raw } => write!(f, "invalid --learner value: {raw:?}"),
            ArgsError::InvalidRecordKind(err) => write!(f, "{err} (expected lesson, practice or exam)"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  mastery <command> [--db <sqlite_url>] [--learner <id>] [--catalog <file.json>] [--json]"
    );
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  show                                        print the learner's progress");
    eprintln!("  learners                                    list learners with stored progress");
    eprintln!("  record-practice <topic> <level> <score> <total>");
    eprintln!("  add-record <topic> <level> <score> <lesson|practice|exam> [seconds]");
    eprintln!("  unlock-next <topic>");
    eprintln!("  reset-topic <topic>                         wipe one topic");
    eprintln!("  reset-category <topic>                      new content version, history kept");
    eprintln!("  unlock-all");
    eprintln!("  reset-all");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://progress.sqlite3");
    eprintln!("  --learner default");
    eprintln!("  --json prints the stored document instead of the summary");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  MASTERY_DB_URL, MASTERY_LEARNER, MASTERY_CATALOG, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Show,
    Learners,
    RecordPractice {
        topic: String,
        level: u32,
        score: u32,
        total: u32,
    },
    AddRecord {
        topic: String,
        level: u32,
        score: u32,
        kind: RecordKind,
        seconds: u32,
    },
    UnlockNext { topic: String },
    ResetTopic { topic: String },
    ResetCategory { topic: String },
    UnlockAll,
    ResetAll,
}

struct Args {
    command: Command,
    db_url: String,
    learner: LearnerId,
    catalog_path: Option<String>,
    json: bool,
}

fn positional(
    positionals: &mut impl Iterator<Item = String>,
    command: &'static str,
    name: &'static str,
) -> Result<String, ArgsError> {
    positionals
        .next()
        .ok_or(ArgsError::MissingArgument { command, name })
}

fn number(
    positionals: &mut impl Iterator<Item = String>,
    command: &'static str,
    name: &'static str,
) -> Result<u32, ArgsError> {
    let raw = positional(positionals, command, name)?;
    raw.parse()
        .map_err(|_| ArgsError::InvalidNumber { name, raw: raw.clone() })
}

impl Command {
    fn parse(name: &str, positionals: Vec<String>) -> Result<Self, ArgsError> {
        let mut rest = positionals.into_iter();
        let command = match name {
            "show" => Self::Show,
            "learners" => Self::Learners,
            "record-practice" => Self::RecordPractice {
                topic: positional(&mut rest, "record-practice", "topic")?,
                level: number(&mut rest, "record-practice", "level")?,
                score: number(&mut rest, "record-practice", "score")?,
                total: number(&mut rest, "record-practice", "total")?,
            },
            "add-record" => Self::AddRecord {
                topic: positional(&mut rest, "add-record", "topic")?,
                level: number(&mut rest, "add-record", "level")?,
                score: number(&mut rest, "add-record", "score")?,
                kind: positional(&mut rest, "add-record", "type")?
                    .parse::<RecordKind>()
                    .map_err(ArgsError::InvalidRecordKind)?,
                seconds: match rest.next() {
                    Some(raw) => raw.parse::<u32>().map_err(|_| ArgsError::InvalidNumber {
                        name: "seconds",
                        raw: raw.clone(),
                    })?,
                    None => 0,
                },
            },
            "unlock-next" => Self::UnlockNext {
                topic: positional(&mut rest, "unlock-next", "topic")?,
            },
            "reset-topic" => Self::ResetTopic {
                topic: positional(&mut rest, "reset-topic", "topic")?,
            },
            "reset-category" => Self::ResetCategory {
                topic: positional(&mut rest, "reset-category", "topic")?,
            },
            "unlock-all" => Self::UnlockAll,
            "reset-all" => Self::ResetAll,
            other => return Err(ArgsError::UnknownCommand(other.to_owned())),
        };
        if let Some(extra) = rest.next() {
            return Err(ArgsError::UnknownArg(extra));
        }
        Ok(command)
    }
}

impl Args {
    fn parse(argv: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("MASTERY_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://progress.sqlite3".into(), normalize_sqlite_url);
        let mut learner_raw =
            std::env::var("MASTERY_LEARNER").unwrap_or_else(|_| "default".into());
        let mut catalog_path = std::env::var("MASTERY_CATALOG").ok();
        let mut json = false;

        let mut command_name: Option<String> = None;
        let mut positionals = Vec::new();

        let mut args = argv.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--learner" => learner_raw = require_value(&mut args, "--learner")?,
                "--catalog" => catalog_path = Some(require_value(&mut args, "--catalog")?),
                "--json" => json = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ if command_name.is_none() => command_name = Some(arg),
                _ => positionals.push(arg),
            }
        }

        let command = Command::parse(command_name.as_deref().unwrap_or("show"), positionals)?;
        let learner = LearnerId::new(learner_raw.clone())
            .map_err(|_| ArgsError::InvalidLearner { raw: learner_raw })?;

        Ok(Self {
            command,
            db_url,
            learner,
            catalog_path,
            json,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Catalog used when no catalog file is configured.
fn sample_catalog() -> Result<ContentCatalog, mastery_core::CatalogError> {
    ContentCatalog::builder()
        .quiz_category("numeros", 3)
        .quiz_category("sumas", 3)
        .quiz_category("restas", 3)
        .quiz_category("formas", 2)
        .lesson("contar-hasta-10", 1)
        .lesson("figuras-basicas", 1)
        .build()
}

fn load_catalog(path: Option<&str>) -> Result<ContentCatalog, ServiceError> {
    match path {
        Some(path) => {
            let catalog = AppServices::read_catalog(path)?;
            info!(path, topics = catalog.len(), "catalog loaded");
            Ok(catalog)
        }
        None => {
            debug!("no catalog file configured; using sample catalog");
            Ok(sample_catalog()?)
        }
    }
}

fn print_progress(store: &ProgressStore) {
    let doc = store.document();
    let catalog = store.catalog();
    println!(
        "learner {}: overall mastery {}%",
        store.learner(),
        views::overall_mastery(doc, catalog)
    );
    for (key, topic) in doc {
        let levels = catalog
            .max_level(key.as_str())
            .map_or_else(|| "?".to_string(), |n| n.to_string());
        let summary = views::topic_summary(doc, key.as_str());
        let best: Vec<String> = topic
            .high_scores
            .iter()
            .map(|(level, score)| format!("L{level}={score}"))
            .collect();
        println!(
            "  {key:<20} level {}/{levels}  v{}  attempts {}  best [{}]",
            topic.unlocked_level,
            topic.content_version,
            summary.attempts,
            best.join(" ")
        );
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1)).inspect_err(|_| print_usage())?;

    let catalog = load_catalog(parsed.catalog_path.as_deref())?;
    prepare_sqlite_file(&parsed.db_url)?;
    let services =
        AppServices::new_sqlite(&parsed.db_url, catalog, Clock::default_clock()).await?;

    if parsed.command == Command::Learners {
        for learner in services.learners().await? {
            println!("{learner}");
        }
        return Ok(());
    }

    let mut store = services.open_learner(parsed.learner).await;
    match &parsed.command {
        Command::Show | Command::Learners => {}
        Command::RecordPractice {
            topic,
            level,
            score,
            total,
        } => {
            store.record_practice_result(topic, *level, *score, *total);
        }
        Command::AddRecord {
            topic,
            level,
            score,
            kind,
            seconds,
        } => {
            let record = NewSkillRecord::new(*score, *level, *kind, f64::from(*seconds));
            store.add_skill_record(topic, record);
        }
        Command::UnlockNext { topic } => {
            store.unlock_next_level(topic);
        }
        Command::ResetTopic { topic } => {
            store.reset_progress_for_key(topic);
        }
        Command::ResetCategory { topic } => {
            store.reset_practice_category_progress(topic);
        }
        Command::UnlockAll => {
            store.unlock_all_levels();
        }
        Command::ResetAll => {
            store.reset_all_progress();
        }
    }

    store.flush().await;
    if parsed.json {
        println!("{}", store.document().to_json_pretty()?);
    } else {
        print_progress(&store);
    }
    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(list.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn parses_record_practice() {
        let parsed = args(&["record-practice", "numeros", "1", "9", "10", "--learner", "ana"]).unwrap();
        assert_eq!(
            parsed.command,
            Command::RecordPractice {
                topic: "numeros".into(),
                level: 1,
                score: 9,
                total: 10
            }
        );
        assert_eq!(parsed.learner.as_str(), "ana");
    }

    #[test]
    fn defaults_to_show() {
        let parsed = args(&["--db", "sqlite::memory:", "--learner", "ana"]).unwrap();
        assert_eq!(parsed.command, Command::Show);
        assert_eq!(parsed.db_url, "sqlite::memory:");
        assert!(!parsed.json);
        assert!(args(&["show", "--json"]).unwrap().json);
    }

    #[test]
    fn parses_add_record() {
        let parsed = args(&["add-record", "sumas", "1", "4", "lesson", "90"]).unwrap();
        assert_eq!(
            parsed.command,
            Command::AddRecord {
                topic: "sumas".into(),
                level: 1,
                score: 4,
                kind: RecordKind::Lesson,
                seconds: 90
            }
        );

        let parsed = args(&["add-record", "exam_basic", "1", "7", "exam"]).unwrap();
        assert!(matches!(parsed.command, Command::AddRecord { seconds: 0, .. }));

        assert!(matches!(
            args(&["add-record", "sumas", "1", "4", "quiz"]),
            Err(ArgsError::InvalidRecordKind(RecordError::InvalidKind(_)))
        ));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            args(&["record-practice", "numeros", "one"]),
            Err(ArgsError::InvalidNumber { name: "level", .. })
        ));
        assert!(matches!(
            args(&["unlock-next"]),
            Err(ArgsError::MissingArgument { .. })
        ));
        assert!(matches!(args(&["explode"]), Err(ArgsError::UnknownCommand(_))));
        assert!(matches!(
            args(&["show", "--learner", "  "]),
            Err(ArgsError::InvalidLearner { .. })
        ));
        assert!(matches!(args(&["show", "--verbose"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn sample_catalog_is_valid() {
        let catalog = sample_catalog().unwrap();
        assert_eq!(catalog.max_level("numeros"), Some(3));
        assert!(catalog.contains("exam_basic"));
    }
}
