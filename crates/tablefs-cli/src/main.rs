//! tablefs command-line tool.
//!
//! Browse and edit a tablefs database from the shell.
//!
//! ## Usage
//!
//! ```bash
//! tablefs mkdir -p notes/2024
//! echo "ship it" | tablefs put notes/2024/todo.txt
//! tablefs cat notes/2024/todo.txt
//! tablefs ls notes
//! tablefs --db /tmp/scratch.db tree
//! ```
//!
//! The database defaults to `$XDG_DATA_HOME/tablefs/tablefs.db`. A config
//! file at `$XDG_CONFIG_HOME/tablefs/config.toml` is read when present;
//! `--config` names another one and `--db` overrides its database path.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use tablefs::{FileHandle, Fs, Metadata, OpenFlags, PathStore, TableFsConfig};

/// Inspect and edit a tablefs database.
#[derive(Parser, Debug)]
#[command(name = "tablefs")]
#[command(about = "Filesystem stored in a single SQLite table")]
struct Args {
    /// Config file (default: ~/.config/tablefs/config.toml if it exists)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Database file, overriding the config (":memory:" for a throwaway one)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a directory
    Ls {
        #[arg(default_value = ".")]
        path: String,
        /// Show mode, size and mtime
        #[arg(short, long)]
        long: bool,
    },
    /// Print the whole tree under a directory
    Tree {
        #[arg(default_value = ".")]
        path: String,
    },
    /// Create a directory
    Mkdir {
        path: String,
        /// Create missing parents, succeed if it exists
        #[arg(short, long)]
        parents: bool,
        /// Permission bits in octal (default from config)
        #[arg(short, long, value_parser = parse_octal)]
        mode: Option<u32>,
    },
    /// Write a file from a local file or stdin, replacing its content
    Put {
        path: String,
        /// Local file to read (default: stdin)
        #[arg(short, long)]
        from: Option<PathBuf>,
        /// Append instead of replacing
        #[arg(short, long)]
        append: bool,
    },
    /// Print a file to stdout
    Cat { path: String },
    /// Write stdin into a file at a byte offset
    WriteAt { path: String, offset: u64 },
    /// Shrink or zero-extend a file
    Truncate { path: String, size: u64 },
    /// Move a file or directory
    Mv { from: String, to: String },
    /// Remove a file or empty directory
    Rm {
        path: String,
        /// Remove directories and their contents
        #[arg(short, long)]
        recursive: bool,
    },
    /// Show metadata
    Stat { path: String },
    /// Change permission bits
    Chmod {
        #[arg(value_parser = parse_octal)]
        mode: u32,
        path: String,
    },
}

fn parse_octal(s: &str) -> Result<u32, String> {
    let digits = s.strip_prefix("0o").unwrap_or(s);
    u32::from_str_radix(digits, 8).map_err(|e| format!("invalid octal mode {s:?}: {e}"))
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tablefs").join("config.toml"))
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tablefs")
        .join("tablefs.db")
}

fn expand(path: &str) -> PathBuf {
    shellexpand::tilde(path).as_ref().into()
}

/// Resolve configuration: explicit file, then the default file, then built-in
/// defaults with the database under the user's data directory.
fn load_config(args: &Args) -> Result<TableFsConfig> {
    let mut config = match &args.config {
        Some(file) => {
            let path = expand(file);
            TableFsConfig::load(&path)
                .with_context(|| format!("loading config {}", path.display()))?
        }
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => TableFsConfig::load(&path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => TableFsConfig {
                database: tablefs::DatabaseConfig {
                    path: default_db_path(),
                    ..Default::default()
                },
                ..Default::default()
            },
        },
    };

    if let Some(db) = &args.db {
        config.database.path = PathBuf::from(db);
    }
    if !config.database.is_in_memory() {
        let expanded = expand(&config.database.path.to_string_lossy());
        config.database.path = expanded;
        if let Some(parent) = config.database.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(config)
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    tracing::info!(db = %config.database.path.display(), "opening database");

    let fs = PathStore::open(&config.database)
        .with_context(|| format!("opening {}", config.database.path.display()))?;

    run(&fs, &config, args.command)
}

fn run(fs: &PathStore, config: &TableFsConfig, command: Command) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Command::Ls { path, long } => {
            let meta = fs.stat(Path::new(&path))?;
            let entries = if meta.is_dir() {
                fs.readdir(Path::new(&path), 0)?
            } else {
                vec![meta]
            };
            for entry in &entries {
                if long {
                    writeln!(out, "{}", long_line(entry))?;
                } else {
                    writeln!(out, "{}", display_name(entry))?;
                }
            }
        }
        Command::Tree { path } => {
            writeln!(out, "{path}")?;
            let mut dir = fs.open(Path::new(&path))?;
            print_tree(fs, &mut dir, Path::new(&path), "", &mut out)?;
        }
        Command::Mkdir {
            path,
            parents,
            mode,
        } => {
            let perm = mode.unwrap_or(config.defaults.dir_perm);
            if parents {
                fs.mkdir_all(Path::new(&path), perm)?;
            } else {
                fs.mkdir(Path::new(&path), perm)?;
            }
        }
        Command::Put { path, from, append } => {
            let data = match from {
                Some(local) => std::fs::read(&local)
                    .with_context(|| format!("reading {}", local.display()))?,
                None => read_stdin()?,
            };
            let flags = if append {
                OpenFlags::append()
            } else {
                OpenFlags::create_truncate()
            };
            let mut handle = fs.open_file(Path::new(&path), flags, config.defaults.file_perm)?;
            handle.write(&data)?;
            handle.close()?;
            tracing::debug!(path = %path, bytes = data.len(), "put");
        }
        Command::Cat { path } => {
            let data = fs.read_all(Path::new(&path))?;
            out.write_all(&data)?;
        }
        Command::WriteAt { path, offset } => {
            let data = read_stdin()?;
            let handle = fs.open_file(Path::new(&path), OpenFlags::create(), config.defaults.file_perm)?;
            handle.write_at(&data, offset)?;
        }
        Command::Truncate { path, size } => {
            let handle = fs.open_file(Path::new(&path), OpenFlags::write(), 0)?;
            handle.truncate(size)?;
        }
        Command::Mv { from, to } => {
            fs.rename(Path::new(&from), Path::new(&to))?;
        }
        Command::Rm { path, recursive } => {
            if recursive {
                fs.remove_all(Path::new(&path))?;
            } else {
                fs.remove(Path::new(&path))?;
            }
        }
        Command::Stat { path } => {
            let meta = fs.stat(Path::new(&path))?;
            writeln!(out, "  Name: {}", meta.name)?;
            writeln!(out, "  Type: {}", if meta.is_dir() { "directory" } else { "file" })?;
            writeln!(out, "  Size: {}", meta.size)?;
            writeln!(out, "  Mode: {:o} ({:04o})", meta.mode, meta.perm())?;
            writeln!(out, " Owner: {}:{}", meta.uid, meta.gid)?;
            writeln!(out, "Access: {}", unix_seconds(meta.atime))?;
            writeln!(out, "Modify: {}", unix_seconds(meta.mtime))?;
        }
        Command::Chmod { mode, path } => {
            fs.chmod(Path::new(&path), mode)?;
        }
    }
    Ok(())
}

fn read_stdin() -> Result<Vec<u8>> {
    let mut data = Vec::new();
    io::stdin()
        .read_to_end(&mut data)
        .context("reading stdin")?;
    Ok(data)
}

fn display_name(entry: &Metadata) -> String {
    if entry.is_dir() {
        format!("{}/", entry.name)
    } else {
        entry.name.clone()
    }
}

fn long_line(entry: &Metadata) -> String {
    format!(
        "{}{:04o} {:>4}:{:<4} {:>10} {:>12} {}",
        if entry.is_dir() { 'd' } else { '-' },
        entry.perm(),
        entry.uid,
        entry.gid,
        entry.size,
        unix_seconds(entry.mtime),
        display_name(entry),
    )
}

/// Seconds since the epoch; negative for times before it.
fn unix_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

fn print_tree(
    fs: &PathStore,
    dir: &mut FileHandle,
    path: &Path,
    indent: &str,
    out: &mut impl Write,
) -> Result<()> {
    if !dir.stat()?.is_dir() {
        bail!("{} is not a directory", path.display());
    }
    let entries = dir.readdir(0)?;
    for (i, entry) in entries.iter().enumerate() {
        let last = i + 1 == entries.len();
        let (branch, next) = if last { ("└── ", "    ") } else { ("├── ", "│   ") };
        writeln!(out, "{indent}{branch}{}", display_name(entry))?;

        if entry.is_dir() {
            let child = path.join(&entry.name);
            let mut handle = fs.open(&child)?;
            print_tree(fs, &mut handle, &child, &format!("{indent}{next}"), out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_octal() {
        assert_eq!(parse_octal("755").unwrap(), 0o755);
        assert_eq!(parse_octal("0o644").unwrap(), 0o644);
        assert!(parse_octal("9").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["tablefs", "--db", ":memory:", "mkdir", "-p", "a/b"]).unwrap();
        assert_eq!(args.db.as_deref(), Some(":memory:"));
        assert!(matches!(args.command, Command::Mkdir { parents: true, .. }));
    }

    #[test]
    fn test_run_against_memory_db() {
        let config = TableFsConfig::default();
        let fs = PathStore::in_memory();

        run(&fs, &config, Command::Mkdir { path: "a/b".into(), parents: true, mode: None }).unwrap();
        run(&fs, &config, Command::Mv { from: "a".into(), to: "z".into() }).unwrap();
        assert!(fs.stat(Path::new("z/b")).unwrap().is_dir());

        run(&fs, &config, Command::Rm { path: "z".into(), recursive: true }).unwrap();
        assert!(!fs.exists(Path::new("z")).unwrap());
    }

    #[test]
    fn test_unix_seconds() {
        assert_eq!(unix_seconds(UNIX_EPOCH), 0);
        assert_eq!(unix_seconds(UNIX_EPOCH - std::time::Duration::from_secs(5)), -5);
    }
}
