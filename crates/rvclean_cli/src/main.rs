//! `rvclean`: combine, clean and export social-listening exports.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use rvclean_clean::{
    EnumMessageLevel, EnumSessionAction, Session, SpecCleanOptions, SpecColumnControl,
    SpecMessage, SpecUpload,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "rvclean", version, about)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. info, debug)
    #[arg(long = "log-level", global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Combine, clean and export files to one workbook
    Clean(CleanArgs),

    /// Print cleaned columns with their default selection and names
    Columns(ColumnsArgs),

    /// Print the default options as TOML
    Config,
}

#[derive(Debug, Args)]
struct CleanArgs {
    /// Input .csv/.xlsx/.xls files; the first readable one sets the schema
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output workbook path
    #[arg(short, long)]
    output: PathBuf,

    /// Repeatable: include a cleaned column
    #[arg(long = "select")]
    select: Vec<String>,

    /// Repeatable: exclude a cleaned column
    #[arg(long = "deselect")]
    deselect: Vec<String>,

    /// Repeatable: column=name output rename
    #[arg(long = "rename", value_parser = parse_rename)]
    rename: Vec<(String, String)>,

    /// TOML file overriding the default options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the final column controls before writing
    #[arg(long = "list-columns", default_value_t = false)]
    list_columns: bool,
}

#[derive(Debug, Args)]
struct ColumnsArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,
}

fn parse_rename(raw: &str) -> Result<(String, String), String> {
    let Some((c_col, c_name)) = raw.split_once('=') else {
        return Err(format!("expected column=name, got {raw:?}"));
    };
    let (c_col, c_name) = (c_col.trim(), c_name.trim());
    if c_col.is_empty() || c_name.is_empty() {
        return Err(format!("expected column=name, got {raw:?}"));
    }
    Ok((c_col.to_string(), c_name.to_string()))
}

fn load_options(path: Option<&Path>) -> Result<SpecCleanOptions> {
    let Some(path) = path else {
        return Ok(SpecCleanOptions::default());
    };
    let c_text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&c_text).with_context(|| format!("failed to parse config {}", path.display()))
}

fn read_uploads(files: &[PathBuf]) -> Result<Vec<SpecUpload>> {
    files
        .iter()
        .map(|path| {
            let bytes =
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string)
                .unwrap_or_else(|| path.display().to_string());
            Ok(SpecUpload::new(file_name, bytes))
        })
        .collect()
}

fn print_messages(messages: &[SpecMessage]) {
    for message in messages {
        match message.level {
            EnumMessageLevel::Warning | EnumMessageLevel::Error => {
                eprintln!("[{}] {}", message.level.as_str(), message.text)
            }
            _ => println!("{}", message.text),
        }
    }
}

fn print_columns(columns: &[SpecColumnControl]) {
    for control in columns {
        let c_mark = if control.if_checked { "x" } else { " " };
        println!("[{c_mark}] {} -> {}", control.column, control.display_name);
    }
}

/// Apply one action, failing on the first error message.
fn apply(session: &mut Session, action: EnumSessionAction) -> Result<()> {
    let l_messages = session.handle(action).to_vec();
    print_messages(&l_messages);
    if let Some(message) = l_messages
        .iter()
        .find(|m| m.level == EnumMessageLevel::Error)
    {
        bail!("{}", message.text);
    }
    Ok(())
}

/// Submit and clean `files`, returning the session ready for selection.
fn prepare_session(files: &[PathBuf], options: SpecCleanOptions) -> Result<Session> {
    let uploads = read_uploads(files)?;
    let mut session = Session::new(options);
    apply(&mut session, EnumSessionAction::Submit(uploads))?;
    apply(&mut session, EnumSessionAction::Clean)?;
    Ok(session)
}

fn run_clean(args: &CleanArgs) -> Result<()> {
    let options = load_options(args.config.as_deref())?;
    let mut session = prepare_session(&args.files, options)?;

    for c_col in &args.select {
        apply(
            &mut session,
            EnumSessionAction::SetColumnChecked {
                column: c_col.clone(),
                if_checked: true,
            },
        )?;
    }
    for c_col in &args.deselect {
        apply(
            &mut session,
            EnumSessionAction::SetColumnChecked {
                column: c_col.clone(),
                if_checked: false,
            },
        )?;
    }
    for (c_col, c_name) in &args.rename {
        apply(
            &mut session,
            EnumSessionAction::SetColumnName {
                column: c_col.clone(),
                display_name: c_name.clone(),
            },
        )?;
    }

    let view = session.render();
    print_messages(&view.messages);
    if args.list_columns {
        print_columns(&view.columns);
    }
    let Some(export) = view.export else {
        bail!("nothing to export; adjust the column selection");
    };
    fs::write(&args.output, &export.bytes)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        path = %args.output.display(),
        rows = view.n_rows_cleaned.unwrap_or(0),
        "wrote workbook"
    );
    println!(
        "Wrote {} rows to {}",
        view.n_rows_cleaned.unwrap_or(0),
        args.output.display()
    );
    Ok(())
}

fn run_columns(args: &ColumnsArgs) -> Result<()> {
    let options = load_options(args.config.as_deref())?;
    let session = prepare_session(&args.files, options)?;
    print_columns(&session.render().columns);
    Ok(())
}

fn run_config() -> Result<()> {
    let c_text = toml::to_string_pretty(&SpecCleanOptions::default())
        .context("failed to serialize default options")?;
    print!("{c_text}");
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt().with_env_filter(env).with_writer(std::io::stderr).init();

    match cli.cmd {
        Command::Clean(args) => run_clean(&args),
        Command::Columns(args) => run_columns(&args),
        Command::Config => run_config(),
    }
}
