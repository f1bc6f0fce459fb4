use accutype::{
    config::{Config, ConfigStore, FileConfigStore},
    export,
    history::ResultsDb,
    logging,
    result::TypingResult,
    score::{score, score_batch_json, start_before, ScoreRequest},
    sentences::SentenceBank,
    session::{Keystroke, TestSession, Transition},
    ScoreError,
};
use anyhow::{bail, Context};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::{
    fs,
    io::{self, BufRead, Write},
    path::PathBuf,
};
use tracing::warn;

/// typing accuracy and speed tests scored by edit distance
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Shows reference sentences, captures what you type, scores accuracy by edit distance and words per minute, and keeps a history of results."
)]
struct Cli {
    /// results database to use instead of the default location
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    /// config file to use instead of the default location
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// take a typing test on the terminal, one sentence per line
    Run,

    /// score a single attempt
    Score {
        /// text the user was asked to type
        given: String,
        /// text the user typed
        typed: String,
        /// printable characters keyed in; defaults to the length of the typed text
        #[clap(short = 'c', long)]
        count: Option<usize>,
        /// how long the attempt took
        #[clap(short = 's', long)]
        seconds: i64,
        /// user name, defaults to the configured one
        #[clap(short = 'u', long)]
        user: Option<String>,
        /// store the result in the history
        #[clap(long)]
        save: bool,
    },

    /// score a JSON array of recorded attempts
    Batch {
        file: PathBuf,
        /// store the results in the history
        #[clap(long)]
        save: bool,
    },

    /// list stored results
    History {
        #[clap(short = 'u', long)]
        user: Option<String>,
    },

    /// show one stored result in full
    Show { id: i64 },

    /// delete one stored result
    Remove { id: i64 },

    /// list users with their averages
    Users,

    /// write stored results to a CSV file
    Export {
        /// output path; a dated file name is used when this is a directory
        path: PathBuf,
        #[clap(short = 'u', long)]
        user: Option<String>,
    },

    /// list or edit the sentences tests draw from
    #[clap(subcommand)]
    Sentences(SentencesCommand),

    /// show or change settings
    #[clap(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
enum SentencesCommand {
    List,
    /// case-insensitive substring search
    Search { query: String },
    Add { sentence: String },
    Remove { sentence: String },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    Show,
    Set { key: String, value: String },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = store.load();
    let _ = logging::init(&config.log_level);

    match cli.command {
        Command::Run => run_test(&config, &open_db(&cli.db)?),
        Command::Score {
            given,
            typed,
            count,
            seconds,
            user,
            save,
        } => {
            let end_time = Local::now();
            let typed = typed.trim().to_string();
            let request = ScoreRequest {
                typed_character_count: Some(count.unwrap_or_else(|| typed.chars().count())),
                given_text: given,
                typed_text: typed,
                start_time: start_before(end_time, seconds)?,
                end_time,
                user_name: user.unwrap_or_else(|| config.user_name.clone()),
            };
            match score(&request) {
                Ok(result) => {
                    print!("{result}");
                    if save {
                        let id = open_db(&cli.db)?.insert(&result)?;
                        println!("saved as {id}");
                    }
                    Ok(())
                }
                Err(e) if e.is_recoverable() => {
                    println!("Nothing typed. Cancelled test.");
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        }
        Command::Batch { file, save } => {
            let json = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let results = score_batch_json(&json, Local::now())?;
            let db = if save { Some(open_db(&cli.db)?) } else { None };
            for (index, outcome) in results.iter().enumerate() {
                match outcome {
                    Ok(result) => {
                        println!("#{index}: {}", summary_line(result));
                        if let Some(db) = &db {
                            db.insert(result)?;
                        }
                    }
                    Err(e) => println!("#{index}: skipped, {e}"),
                }
            }
            Ok(())
        }
        Command::History { user } => {
            let db = open_db(&cli.db)?;
            let results = match user {
                Some(name) => db.list_for_user(&name)?,
                None => db.list()?,
            };
            for stored in &results {
                println!("{}\t{}", stored.id, export::display_row(stored).join("\t"));
            }
            Ok(())
        }
        Command::Show { id } => match open_db(&cli.db)?.get(id)? {
            Some(stored) => {
                print!("{stored}");
                Ok(())
            }
            None => bail!("no result with id {id}"),
        },
        Command::Remove { id } => {
            if !open_db(&cli.db)?.remove(id)? {
                bail!("no result with id {id}");
            }
            println!("removed {id}");
            Ok(())
        }
        Command::Users => {
            let db = open_db(&cli.db)?;
            for name in db.users()? {
                if let Some(summary) = db.user_summary(&name)? {
                    println!(
                        "{}\t{} tests\t{:.1}% average accuracy\t{:.1} WPM average speed",
                        summary.user_name,
                        summary.tests,
                        summary.average_accuracy,
                        summary.average_speed
                    );
                }
            }
            Ok(())
        }
        Command::Export { path, user } => {
            let db = open_db(&cli.db)?;
            let (results, name) = match user {
                Some(name) => (db.list_for_user(&name)?, name),
                None => (db.list()?, config.user_name.clone()),
            };
            let path = if path.is_dir() {
                path.join(export::default_file_name(Local::now().date_naive(), &name))
            } else {
                path
            };
            export::export_to_path(&path, &results)?;
            println!("exported {} results to {}", results.len(), path.display());
            Ok(())
        }
        Command::Sentences(command) => edit_sentences(command, config, &store),
        Command::Config(ConfigCommand::Show) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Config(ConfigCommand::Set { key, value }) => {
            let mut config = config;
            config.set(&key, &value)?;
            store.save(&config)?;
            println!("{key} = {value}");
            Ok(())
        }
    }
}

fn open_db(path: &Option<PathBuf>) -> anyhow::Result<ResultsDb> {
    let db = match path {
        Some(p) => ResultsDb::open(p),
        None => ResultsDb::new(),
    };
    db.context("opening results database")
}

fn summary_line(result: &TypingResult) -> String {
    format!(
        "{}% accuracy, {} WPM, {} seconds, {} words, {}",
        result.accuracy_percent(),
        result.words_per_minute(),
        result.duration_seconds(),
        result.words(),
        result.user_name()
    )
}

/// Sentence edits are written to the configured sentences file. Without one,
/// the bank is saved as `sentences.txt` next to the config file and the
/// config is pointed at it.
fn edit_sentences(
    command: SentencesCommand,
    mut config: Config,
    store: &FileConfigStore,
) -> anyhow::Result<()> {
    let mut bank = SentenceBank::load(config.sentences_file.as_deref())?;
    let message = match command {
        SentencesCommand::List => {
            bank.iter().for_each(|sentence| println!("{sentence}"));
            return Ok(());
        }
        SentencesCommand::Search { query } => {
            bank.search(&query)
                .into_iter()
                .for_each(|sentence| println!("{sentence}"));
            return Ok(());
        }
        SentencesCommand::Add { sentence } => {
            if !bank.add(&sentence) {
                bail!("sentence is blank or already present");
            }
            format!("added: {}", sentence.trim())
        }
        SentencesCommand::Remove { sentence } => {
            if !bank.remove(&sentence) {
                bail!("no such sentence: {}", sentence.trim());
            }
            format!("removed: {}", sentence.trim())
        }
    };

    let path = match &config.sentences_file {
        Some(path) => path.clone(),
        None => store.path().with_file_name("sentences.txt"),
    };
    bank.save(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    if config.sentences_file.is_none() {
        config.sentences_file = Some(path);
        store.save(&config)?;
    }
    println!("{message}");
    Ok(())
}

/// Line-based test: each line read is keyed in character by character and
/// followed by enter. Lines after the first are separated by one space.
/// A line arriving after the time limit still counts; the test is then
/// scored as ending at the limit.
fn run_test(config: &Config, db: &ResultsDb) -> anyhow::Result<()> {
    let bank = SentenceBank::load(config.sentences_file.as_deref())?;
    let mut session = TestSession::new(config.session_settings(), bank.deck());

    let Some(first) = session.start(Local::now()) else {
        bail!("no sentences available");
    };
    println!("Type the text below exactly as it is written. Press enter when you are done.");
    if let Some(remaining) = session.remaining(Local::now()) {
        println!("You have {} seconds.", remaining.as_secs());
    }
    println!("{first}");
    io::stdout().flush()?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        if !session.typed_text().is_empty() {
            session.key(Keystroke::Char(' '));
        }
        for c in line.chars() {
            session.key(Keystroke::Char(c));
        }

        let transition = match session.tick(Local::now()) {
            Ok(Transition::Stayed) => session.enter(Local::now()),
            other => {
                println!("Time is up.");
                other
            }
        };

        match transition {
            Ok(Transition::Stayed) => {}
            Ok(Transition::NextSentence(sentence)) => {
                println!("{sentence}");
                io::stdout().flush()?;
            }
            Ok(Transition::Finished(result)) => {
                db.insert(&result)?;
                println!("Test completed.");
                print!("{result}");
                return Ok(());
            }
            Err(ScoreError::NothingTyped) => {
                println!("Nothing typed. Cancelled test.");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
    }

    session.abandon();
    warn!("input closed before the test finished");
    Ok(())
}
