// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use tmuxnote::{
    agenda::{agenda_record, parse_feed, AgendaEvent},
    chat::{chat_record, Signal},
    config::{JournalPath, Settings},
    notify::{CommandNotifier, Silent},
    path::{self, default_config_path},
    JournalFormat, JournalStore, Record, Source,
};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::{
    fs::read_to_string,
    io::{stdin, ErrorKind},
    path::{Path, PathBuf},
    process::exit,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "tmuxnote [options] <command>",
    subcommand_help_heading = "Commands",
    version
)]
struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file.
    #[arg(short, long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Path to journal file, overriding configuration.
    #[arg(short, long, global = true, value_name = "path")]
    pub journal: Option<PathBuf>,

    /// Update journal without firing notifications.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    fn run(self) -> Result<()> {
        let mut settings = load_settings(self.config, default_config_path())?;
        if let Some(path) = self.journal {
            settings.journal.path = JournalPath::new(path);
        }
        let relay = Relay {
            store: JournalStore::new(settings.journal.path.as_path(), settings.journal.format),
            settings,
            quiet: self.quiet,
        };

        match self.command {
            Command::Chat(opts) => run_chat(&relay, opts),
            Command::Weechat(opts) => run_weechat(&relay, opts),
            Command::Agenda(opts) => run_agenda(&relay, opts),
            Command::Clear(opts) => run_clear(&relay, opts),
            Command::Delete(opts) => run_delete(&relay, opts),
            Command::Show(opts) => run_show(&relay, opts),
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Record chat highlight or private message.
    #[command(override_usage = "tmuxnote chat [options] <sender> <message>")]
    Chat(ChatOptions),

    /// Handle raw weechat signal.
    #[command(override_usage = "tmuxnote weechat [options] <signal> [<message>]")]
    Weechat(WeechatOptions),

    /// Report agenda event inside its notification window.
    #[command(override_usage = "tmuxnote agenda [options] [<event>]...")]
    Agenda(AgendaOptions),

    /// Clear short marker of a source, or of every source.
    #[command(override_usage = "tmuxnote clear [options] [<source>]")]
    Clear(ClearOptions),

    /// Delete whole segment of a source.
    #[command(override_usage = "tmuxnote delete [options] <source>")]
    Delete(DeleteOptions),

    /// Print journal.
    #[command(override_usage = "tmuxnote show [options]")]
    Show(ShowOptions),
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ChatOptions {
    /// Nick of message sender.
    #[arg(required = true, value_name = "sender")]
    pub sender: String,

    /// Message text.
    #[arg(required = true, value_name = "message")]
    pub message: String,

    /// Treat message as private instead of highlight.
    #[arg(short, long)]
    pub private: bool,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct WeechatOptions {
    /// Signal name, e.g., weechat_highlight, weechat_pv, input_text_changed.
    #[arg(required = true, value_name = "signal")]
    pub signal: Signal,

    /// Signal payload of the form "prefix<TAB>message".
    #[arg(default_value = "", value_name = "message")]
    pub message: String,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct AgendaOptions {
    /// Agenda events of the form "HH:MM text".
    #[arg(value_name = "event")]
    pub events: Vec<String>,

    /// Read agenda events from file, or "-" for standard input.
    #[arg(short, long, value_name = "path")]
    pub feed: Option<PathBuf>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ClearOptions {
    /// Source to clear marker of, e.g., chat or agenda.
    #[arg(value_name = "source")]
    pub source: Option<Source>,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct DeleteOptions {
    /// Source to delete segment of, e.g., chat or agenda.
    #[arg(required = true, value_name = "source")]
    pub source: Source,
}

#[derive(Parser, Clone, Debug)]
#[command(author, about, long_about)]
struct ShowOptions {
    /// Print journal as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Everything a command needs to touch the journal.
struct Relay {
    settings: Settings,
    store: JournalStore,
    quiet: bool,
}

impl Relay {
    fn update(&self, record: &Record) -> Result<()> {
        let policy = self.settings.merge_policy();
        let now = Local::now().naive_local();
        let change = if self.quiet {
            self.store.update(record, &policy, now, &Silent)?
        } else {
            let notifier = CommandNotifier::new(&self.settings.notify);
            self.store.update(record, &policy, now, &notifier)?
        };

        if change.is_unchanged() {
            info!("journal {:?} left unchanged", self.store.path().display());
        }

        Ok(())
    }
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}

fn load_settings(config: Option<PathBuf>, default: path::Result<PathBuf>) -> Result<Settings> {
    let (path, explicit) = match config {
        Some(path) => (path, true),
        None => match default {
            Ok(path) => (path, false),
            Err(error) => {
                warn!("{error}, using default settings");
                return Ok(Settings::default());
            }
        },
    };

    read_settings(&path, explicit)
}

fn read_settings(path: &Path, explicit: bool) -> Result<Settings> {
    match read_to_string(path) {
        Ok(data) => data
            .parse()
            .with_context(|| format!("invalid configuration at {:?}", path.display())),
        Err(err) if err.kind() == ErrorKind::NotFound && !explicit => Ok(Settings::default()),
        Err(err) => Err(err)
            .with_context(|| format!("cannot read configuration at {:?}", path.display())),
    }
}

fn run_chat(relay: &Relay, opts: ChatOptions) -> Result<()> {
    let signal = if opts.private {
        Signal::Private
    } else {
        Signal::Highlight
    };

    let message = format!("{}\t{}", opts.sender, opts.message);
    if let Some(record) = chat_record(signal, &message, &relay.settings.chat) {
        relay.update(&record)?;
    }

    Ok(())
}

fn run_weechat(relay: &Relay, opts: WeechatOptions) -> Result<()> {
    if let Some(record) = chat_record(opts.signal, &opts.message, &relay.settings.chat) {
        relay.update(&record)?;
    }

    Ok(())
}

fn run_agenda(relay: &Relay, opts: AgendaOptions) -> Result<()> {
    let mut events = opts
        .events
        .iter()
        .map(|line| line.parse::<AgendaEvent>())
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(feed) = opts.feed {
        let content = if feed.as_os_str() == "-" {
            std::io::read_to_string(stdin()).context("cannot read agenda feed from stdin")?
        } else {
            read_to_string(&feed)
                .with_context(|| format!("cannot read agenda feed {:?}", feed.display()))?
        };
        events.extend(parse_feed(&content));
    }

    let now = Local::now().naive_local();
    let record = agenda_record(&events, now, &relay.settings.agenda_window());
    relay.update(&record)
}

fn run_clear(relay: &Relay, opts: ClearOptions) -> Result<()> {
    let sources = match opts.source {
        Some(source) => vec![source],
        None => Source::ALL.to_vec(),
    };

    for source in sources {
        relay.update(&Record::delete_short(source))?;
    }

    Ok(())
}

fn run_delete(relay: &Relay, opts: DeleteOptions) -> Result<()> {
    relay.update(&Record::delete(opts.source))
}

fn run_show(relay: &Relay, opts: ShowOptions) -> Result<()> {
    let journal = relay.store.load()?;
    if opts.json {
        print!("{}", JournalFormat::Json.encode(&journal)?);
    } else {
        print!("{journal}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use tmuxnote::path::NoWayHome;

    #[sealed_test]
    fn no_config_directory_means_default_settings() -> Result<()> {
        std::fs::write("config.toml", "[chat]\nhistory_cap = 5\n")?;
        assert_eq!(load_settings(None, Err(NoWayHome))?, Settings::default());
        Ok(())
    }

    #[sealed_test]
    fn missing_default_config_means_default_settings() -> Result<()> {
        let settings = load_settings(None, Ok(PathBuf::from("config.toml")))?;
        assert_eq!(settings, Settings::default());
        Ok(())
    }

    #[sealed_test]
    fn missing_explicit_config_is_an_error() {
        assert!(load_settings(Some(PathBuf::from("config.toml")), Err(NoWayHome)).is_err());
    }

    #[sealed_test]
    fn explicit_config_is_parsed() -> Result<()> {
        std::fs::write("config.toml", "[chat]\nhistory_cap = 5\n")?;
        let settings = load_settings(Some(PathBuf::from("config.toml")), Err(NoWayHome))?;
        assert_eq!(settings.chat.history_cap, 5);
        Ok(())
    }
}
