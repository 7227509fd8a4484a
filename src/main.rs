//! `sash` - interactive front end for a remote session

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use sash_lib::config::{ConfigStorage, SessionConfig};
use sash_lib::session::{BackendPreference, Entry, ErrorCategory, RemoteSession, SessionError};
use sash_lib::ssh::{HostKeyPolicy, SshConfig};

#[derive(Parser, Debug)]
#[command(name = "sash", version, about = "Browse and script a remote host over SSH")]
struct Cli {
    /// Target as user@host[:port]
    target: Option<String>,

    /// Use a saved profile
    #[arg(short, long, conflicts_with = "target")]
    profile: Option<String>,

    /// Verify the host key against this known_hosts file
    #[arg(long, value_name = "FILE", conflicts_with = "insecure")]
    known_hosts: Option<PathBuf>,

    /// Accept any host key (vulnerable to impersonation)
    #[arg(long)]
    insecure: bool,

    /// Scrape `ls` output instead of using SFTP
    #[arg(long)]
    shell: bool,

    /// Connection timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Save the resulting connection settings under this profile name
    #[arg(long, value_name = "NAME")]
    save: Option<String>,
}

/// One line typed at the prompt
#[derive(Debug, PartialEq, Eq)]
enum Command {
    List,
    Cd(String),
    Up,
    Pwd,
    Cat(String),
    Write { name: String, text: String },
    Rm(String),
    Exec(String),
    Help,
    Quit,
}

enum Flow {
    Continue,
    /// The directory changed; the watcher re-lists and re-prompts
    Moved,
    Quit,
}

const HELP: &str = "\
commands:
  ls                  list the current directory
  cd <dir>            change directory (relative, absolute or ~)
  up                  go to the parent directory
  pwd                 print the current directory
  cat <file>          print a file
  write <file> <text> replace a file's content (\\n for newlines)
  rm <name>           delete a file or an empty directory
  !<command>          run a command in the current directory
  quit                disconnect and exit";

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    if let Some(command) = line.strip_prefix('!') {
        let command = command.trim();
        if command.is_empty() {
            return Err("usage: !<command>".to_string());
        }
        return Ok(Some(Command::Exec(command.to_string())));
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let need = |usage: &str| {
        if rest.is_empty() {
            Err(format!("usage: {}", usage))
        } else {
            Ok(rest.to_string())
        }
    };

    let command = match verb {
        "ls" => Command::List,
        "cd" if rest.is_empty() => Command::Cd("~".to_string()),
        "cd" => Command::Cd(rest.to_string()),
        "up" | "cd.." => Command::Up,
        "pwd" => Command::Pwd,
        "cat" => Command::Cat(need("cat <file>")?),
        "rm" => Command::Rm(need("rm <name>")?),
        "write" => {
            let args = need("write <file> <text>")?;
            let (name, text) = args
                .split_once(char::is_whitespace)
                .map(|(n, t)| (n.to_string(), t.to_string()))
                .unwrap_or((args, String::new()));
            Command::Write {
                name,
                text: text.replace("\\n", "\n"),
            }
        }
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {} (try help)", other)),
    };
    Ok(Some(command))
}

/// Split `user@host[:port]`
fn parse_user_target(target: &str) -> Option<(String, String, u16)> {
    let (user, rest) = target.split_once('@')?;
    if user.is_empty() {
        return None;
    }
    let (host, port) = SshConfig::parse_target(rest)?;
    Some((user.to_string(), host, port))
}

fn build_profile(cli: &Cli, saved: Option<SessionConfig>) -> Result<SessionConfig> {
    let mut profile = match (saved, &cli.target) {
        (Some(saved), _) => saved,
        (None, Some(target)) => {
            let (user, host, port) =
                parse_user_target(target).context("target must look like user@host[:port]")?;
            let mut profile = SessionConfig::new(host.clone(), host, user);
            profile.port = port;
            profile
        }
        (None, None) => bail!("either a target or --profile is required"),
    };

    if cli.insecure {
        profile.host_key = HostKeyPolicy::Insecure;
    } else if let Some(path) = &cli.known_hosts {
        profile.host_key = HostKeyPolicy::KnownHosts { path: path.clone() };
    }
    if cli.shell {
        profile.backend = BackendPreference::Shell;
    }
    if let Some(timeout) = cli.timeout {
        profile.timeout_secs = timeout;
    }
    if let Some(name) = &cli.save {
        profile.name = name.clone();
    }
    Ok(profile)
}

fn print_entries(entries: &[Entry]) {
    for entry in entries {
        let marker = if entry.is_dir() { "/" } else { "" };
        println!(
            "{} {:>9} {:<16} {}{}",
            entry.permissions(),
            entry.display_size(),
            entry.modified(),
            entry.name(),
            marker
        );
    }
}

fn report(err: &SessionError) {
    match err.category() {
        ErrorCategory::Unreachable => eprintln!("connection problem: {}", err),
        ErrorCategory::Rejected => eprintln!("refused: {}", err),
        ErrorCategory::LocalParse => eprintln!("unreadable listing: {}", err),
    }
}

fn prompt(session: &RemoteSession) {
    print!("{}> ", session.current_path());
    let _ = std::io::stdout().flush();
}

async fn list(session: &RemoteSession) {
    match session.list_current_directory().await {
        Ok(entries) => print_entries(&entries),
        Err(e) => report(&e),
    }
}

async fn execute(session: &mut RemoteSession, command: Command) -> Flow {
    let outcome = match command {
        Command::List => {
            list(session).await;
            Ok(Flow::Continue)
        }
        Command::Cd(dir) => session.navigate(&dir).await.map(|_| Flow::Moved),
        Command::Up => session.navigate_up().await.map(|_| Flow::Moved),
        Command::Pwd => {
            println!("{}", session.current_path());
            Ok(Flow::Continue)
        }
        Command::Cat(name) => session.read_file(&name).await.map(|text| {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
            Flow::Continue
        }),
        Command::Write { name, text } => session
            .write_file(&name, &text)
            .await
            .map(|_| Flow::Continue),
        Command::Rm(name) => session.delete_entry(&name).await.map(|_| Flow::Continue),
        Command::Exec(command) => session.run_command(&command).await.map(|result| {
            print!("{}", result.output);
            if !result.ok() {
                eprintln!("(exit status {:?})", result.exit_status);
            }
            Flow::Continue
        }),
        Command::Help => {
            println!("{}", HELP);
            Ok(Flow::Continue)
        }
        Command::Quit => Ok(Flow::Quit),
    };

    outcome.unwrap_or_else(|e| {
        report(&e);
        Flow::Continue
    })
}

async fn repl(session: &mut RemoteSession) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut cwd_rx = session.subscribe();

    list(session).await;
    prompt(session);

    loop {
        tokio::select! {
            changed = cwd_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                cwd_rx.borrow_and_update();
                list(session).await;
                prompt(session);
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                let flow = match parse_command(&line) {
                    Ok(Some(command)) => execute(session, command).await,
                    Ok(None) => Flow::Continue,
                    Err(usage) => {
                        eprintln!("{}", usage);
                        Flow::Continue
                    }
                };
                match flow {
                    Flow::Quit => break,
                    Flow::Moved => {}
                    Flow::Continue => prompt(session),
                }
                if !session.is_connected() {
                    eprintln!("connection lost");
                    break;
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    sash_lib::init_logging();
    let cli = Cli::parse();

    let storage = ConfigStorage::new()?;
    let mut saved = storage.load().await?;

    let existing = match &cli.profile {
        Some(name) => Some(
            saved
                .find(name)
                .cloned()
                .with_context(|| format!("no saved profile named {}", name))?,
        ),
        None => None,
    };
    let profile = build_profile(&cli, existing)?;

    if cli.save.is_some() {
        saved.upsert(profile.clone());
        storage.save(&saved).await?;
        info!("Saved profile {} to {:?}", profile.name, storage.path());
    }

    let password = rpassword::prompt_password(format!(
        "{}@{}'s password: ",
        profile.username, profile.host
    ))?;

    let mut session = RemoteSession::connect(profile.to_ssh_config(password), profile.backend)
        .await
        .with_context(|| format!("could not open a session on {}", profile.host))?;
    println!(
        "Connected to {} ({} backend)",
        profile.host,
        session.backend_kind()
    );

    let result = repl(&mut session).await;
    session.disconnect().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("  ").unwrap(), None);
        assert_eq!(parse_command("ls").unwrap(), Some(Command::List));
        assert_eq!(
            parse_command("cd my dir").unwrap(),
            Some(Command::Cd("my dir".to_string()))
        );
        assert_eq!(parse_command("cd").unwrap(), Some(Command::Cd("~".to_string())));
        assert_eq!(
            parse_command("!make -j4 test").unwrap(),
            Some(Command::Exec("make -j4 test".to_string()))
        );
        assert_eq!(
            parse_command("write notes.txt a\\nb").unwrap(),
            Some(Command::Write {
                name: "notes.txt".to_string(),
                text: "a\nb".to_string()
            })
        );
        assert!(parse_command("rm").is_err());
        assert!(parse_command("frobnicate").is_err());
    }

    #[test]
    fn test_parse_user_target() {
        assert_eq!(
            parse_user_target("ops@10.0.0.5:2222"),
            Some(("ops".to_string(), "10.0.0.5".to_string(), 2222))
        );
        assert_eq!(
            parse_user_target("me@[::1]"),
            Some(("me".to_string(), "::1".to_string(), 22))
        );
        assert_eq!(parse_user_target("nouser.example"), None);
        assert_eq!(parse_user_target("@host"), None);
    }

    #[test]
    fn test_build_profile_applies_flags() {
        let cli = Cli::parse_from(["sash", "ops@box:2200", "--shell", "--insecure", "--timeout", "5"]);
        let profile = build_profile(&cli, None).unwrap();
        assert_eq!(profile.port, 2200);
        assert_eq!(profile.backend, BackendPreference::Shell);
        assert_eq!(profile.host_key, HostKeyPolicy::Insecure);
        assert_eq!(profile.timeout_secs, 5);

        let cli = Cli::parse_from(["sash"]);
        assert!(build_profile(&cli, None).is_err());
    }
}
