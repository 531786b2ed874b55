use std::fmt;
use std::path::Path;

use services::{AppServices, Clock};
use study_core::model::{LessonId, ParseIdError};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod terminal;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidLessonId(ParseIdError),
    InvalidDbUrl { raw: String },
    ConflictingFlags,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidLessonId(err) => write!(f, "invalid lesson id: {err}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::ConflictingFlags => write!(f, "--offline and --online are exclusive"),
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
    eprintln!("  app add <path> [--name <name>]   load a document and save it to the library");
    eprintln!("  app list                         list saved lessons, newest first");
    eprintln!("  app remove <id>");
    eprintln!("  app summary <id> [--deep]        show the summary or the deep explanation");
    eprintln!("  app flashcards <id>              practice the lesson's flashcards");
    eprintln!("  app exam <id>                    timed practice exam");
    eprintln!("  app chat <id>                    ask the tutor about the lesson");
    eprintln!("  app stats                        XP, level and badges");
    eprintln!("  app settings [--api-key <key>] [--model <model>] [--base-url <url>]");
    eprintln!("               [--instructions <text>] [--offline | --online]");
    eprintln!();
    eprintln!("Every command accepts --db <sqlite_url> (default sqlite://study.sqlite3).");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_DB_URL, STUDY_AI_API_KEY, STUDY_AI_BASE_URL, STUDY_AI_MODEL, RUST_LOG");
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SettingsArgs {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub instructions: Option<String>,
    pub offline: Option<bool>,
}

impl SettingsArgs {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Add { path: String, name: Option<String> },
    List,
    Remove(LessonId),
    Summary { id: LessonId, deep: bool },
    Flashcards(LessonId),
    Exam(LessonId),
    Chat(LessonId),
    Stats,
    Settings(SettingsArgs),
}

struct Args {
    db_url: String,
    command: Command,
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("STUDY_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://study.sqlite3".into(), normalize_sqlite_url);

        let mut iter = argv.into_iter();
        let name = iter
            .next()
            .ok_or(ArgsError::MissingArgument { name: "command" })?;

        let mut positional = Vec::new();
        let mut lesson_name = None;
        let mut deep = false;
        let mut settings = SettingsArgs::default();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut iter, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--name" => lesson_name = Some(require_value(&mut iter, "--name")?),
                "--deep" => deep = true,
                "--api-key" => settings.api_key = Some(require_value(&mut iter, "--api-key")?),
                "--model" => settings.model = Some(require_value(&mut iter, "--model")?),
                "--base-url" => settings.base_url = Some(require_value(&mut iter, "--base-url")?),
                "--instructions" => {
                    settings.instructions = Some(require_value(&mut iter, "--instructions")?);
                }
                "--offline" | "--online" => {
                    let offline = arg == "--offline";
                    if settings.offline.is_some_and(|prev| prev != offline) {
                        return Err(ArgsError::ConflictingFlags);
                    }
                    settings.offline = Some(offline);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let mut lesson_id = || -> Result<LessonId, ArgsError> {
            positional
                .next()
                .ok_or(ArgsError::MissingArgument { name: "id" })?
                .parse()
                .map_err(ArgsError::InvalidLessonId)
        };

        let command = match name.as_str() {
            "add" => Command::Add {
                path: positional
                    .next()
                    .ok_or(ArgsError::MissingArgument { name: "path" })?,
                name: lesson_name,
            },
            "list" => Command::List,
            "remove" => Command::Remove(lesson_id()?),
            "summary" => Command::Summary {
                id: lesson_id()?,
                deep,
            },
            "flashcards" => Command::Flashcards(lesson_id()?),
            "exam" => Command::Exam(lesson_id()?),
            "chat" => Command::Chat(lesson_id()?),
            "stats" => Command::Stats,
            "settings" => Command::Settings(settings),
            _ => return Err(ArgsError::UnknownCommand(name)),
        };

        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Self { db_url, command })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") || raw.starts_with("sqlite:file:")
    {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        // In-memory and URI-style databases need no file.
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
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

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.is_empty() || matches!(argv[0].as_str(), "--help" | "-h" | "help") {
        print_usage();
        return Ok(());
    }

    let args = Args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&args.db_url)?;
    info!(db = %args.db_url, "opening study library");
    let services = AppServices::new_sqlite(&args.db_url, Clock::default()).await?;

    match args.command {
        Command::Add { path, name } => terminal::add(&services, Path::new(&path), name).await,
        Command::List => terminal::list(&services).await,
        Command::Remove(id) => terminal::remove(&services, id).await,
        Command::Summary { id, deep } => terminal::summary(&services, id, deep).await,
        Command::Flashcards(id) => terminal::flashcards(&services, id).await,
        Command::Exam(id) => terminal::exam(&services, id).await,
        Command::Chat(id) => terminal::chat(&services, id).await,
        Command::Stats => terminal::stats(&services).await,
        Command::Settings(update) if update.is_empty() => terminal::show_settings(&services).await,
        Command::Settings(update) => terminal::update_settings(&services, update).await,
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

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(args.iter().map(ToString::to_string).collect())
    }

    #[test]
    fn parses_add_with_name_and_db() {
        let args = parse(&["add", "notes.md", "--name", "Biology", "--db", "sqlite::memory:"]).unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(
            args.command,
            Command::Add {
                path: "notes.md".into(),
                name: Some("Biology".into())
            }
        );
    }

    #[test]
    fn parses_lesson_commands() {
        assert_eq!(
            parse(&["summary", "3", "--deep"]).unwrap().command,
            Command::Summary {
                id: LessonId::new(3),
                deep: true
            }
        );
        assert_eq!(
            parse(&["exam", "7"]).unwrap().command,
            Command::Exam(LessonId::new(7))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            parse(&["exam", "seven"]),
            Err(ArgsError::InvalidLessonId(_))
        ));
        assert!(matches!(
            parse(&["chat"]),
            Err(ArgsError::MissingArgument { name: "id" })
        ));
        assert!(matches!(parse(&["dance"]), Err(ArgsError::UnknownCommand(_))));
        assert!(matches!(
            parse(&["list", "--verbose"]),
            Err(ArgsError::UnknownArg(_))
        ));
        assert!(matches!(
            parse(&["settings", "--offline", "--online"]),
            Err(ArgsError::ConflictingFlags)
        ));
    }

    #[test]
    fn settings_flags_are_collected() {
        let args = parse(&["settings", "--model", "gpt-4o", "--offline"]).unwrap();
        assert_eq!(
            args.command,
            Command::Settings(SettingsArgs {
                model: Some("gpt-4o".into()),
                offline: Some(true),
                ..SettingsArgs::default()
            })
        );
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/study.sqlite3".into());
        assert!(url.starts_with("sqlite:///") || url.starts_with("sqlite://"));
        assert!(url.ends_with("data/study.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
    }
}
