use std::path::{Path, PathBuf};
use std::process::{Command as Process, ExitCode};
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use thingbase_locator::Resolver;
use thingbase_store::ThingStore;
use tracing::debug;
use walkdir::WalkDir;

use crate::cli::*;
use crate::config::CliConfig;

/// Shared state for one invocation.
struct Session {
    config: CliConfig,
    context: String,
    store: ThingStore,
}

impl Session {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        let config = CliConfig::load(cli.config.as_deref())?;
        let context = config.context(cli.context.as_deref())?;
        let resolver = Resolver::new(Arc::new(config.schemes.clone()));
        let store = ThingStore::new(resolver, config.store);
        debug!(%context, "session opened");
        Ok(Self {
            config,
            context,
            store,
        })
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let session = Session::open(&cli)?;
    match cli.command {
        Command::Create(args) => cmd_create(&session, args),
        Command::Validate(args) => cmd_validate(&session, args),
        Command::Resolve(args) => cmd_resolve(&session, args),
        Command::Show(args) => cmd_show(&session, args),
        Command::Edit(args) => cmd_edit(&session, args),
        Command::List(_) => cmd_list(&session),
    }
}

fn cmd_create(session: &Session, args: CreateArgs) -> anyhow::Result<ExitCode> {
    let (thing, path) = session
        .store
        .create_new(&args.thing, &session.context, !args.context_less)
        .with_context(|| format!("creating {}", args.thing))?;
    println!("{} Created {}", "✓".green().bold(), path.display().to_string().bold());
    println!("  Id: {}", thing.identifier().cyan());
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(session: &Session, args: ValidateArgs) -> anyhow::Result<ExitCode> {
    let Some(schema) = args.schema.as_deref().or(session.config.schema.as_deref()) else {
        bail!("no schema given; pass --schema or set `schema` in the config file");
    };
    let outcome = session
        .store
        .validate(&args.thing, schema, &session.context, !args.context_less)
        .with_context(|| format!("validating {} against {}", args.thing, schema))?;

    if outcome.is_valid() {
        println!("{} {} is valid against {}", "✓".green().bold(), args.thing.bold(), schema);
        return Ok(ExitCode::SUCCESS);
    }
    println!(
        "{} {} violates {} ({} problems)",
        "✗".red().bold(),
        args.thing.bold(),
        schema,
        outcome.violations().len()
    );
    for violation in outcome.violations() {
        println!("  {}", violation.to_string().yellow());
    }
    Ok(ExitCode::FAILURE)
}

fn cmd_resolve(session: &Session, args: ResolveArgs) -> anyhow::Result<ExitCode> {
    let location = session
        .store
        .resolver()
        .resolve(&args.thing, &session.context, !args.context_less)
        .with_context(|| format!("resolving {}", args.thing))?;
    println!("{}", location.to_string().bold());
    println!("  Context: {}", location.context_path());
    let access = if location.writable() { "read-write".green() } else { "read-only".yellow() };
    println!("  Access: {}", access);
    Ok(ExitCode::SUCCESS)
}

fn cmd_show(session: &Session, args: ShowArgs) -> anyhow::Result<ExitCode> {
    let thing = session
        .store
        .read(&args.thing, &session.context, !args.context_less)
        .with_context(|| format!("reading {}", args.thing))?;
    let yaml = thingbase_record::to_yaml(&thing)?;
    print!("{}", String::from_utf8_lossy(&yaml));
    Ok(ExitCode::SUCCESS)
}

fn cmd_edit(session: &Session, args: EditArgs) -> anyhow::Result<ExitCode> {
    let path = session
        .store
        .resolver()
        .local_path(&args.thing, &session.context, !args.context_less)
        .with_context(|| format!("resolving {}", args.thing))?;
    let Some(editor) = session.config.editor(args.editor.as_deref()) else {
        bail!("no editor configured; pass --editor, set `editor` in the config file or $EDITOR");
    };
    let (program, extra) = editor_command(&editor)?;
    debug!(program, path = %path.display(), "spawning editor");
    let status = Process::new(program)
        .args(extra)
        .arg(&path)
        .status()
        .with_context(|| format!("starting editor {program}"))?;
    if !status.success() {
        bail!("editor {program} exited with {status}");
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_list(session: &Session) -> anyhow::Result<ExitCode> {
    let root = session
        .store
        .resolver()
        .local_path(&session.context, &session.context, false)
        .with_context(|| format!("context {} is not a local directory", session.context))?;
    let records = list_records(&root)?;
    if records.is_empty() {
        println!("No records under {}.", root.display());
    }
    for record in &records {
        println!("  {}", record.display());
    }
    Ok(ExitCode::SUCCESS)
}

/// Split an editor setting such as `code --wait` into program and arguments.
fn editor_command(editor: &str) -> anyhow::Result<(&str, Vec<&str>)> {
    let mut words = editor.split_whitespace();
    let Some(program) = words.next() else {
        bail!("editor command is empty");
    };
    Ok((program, words.collect()))
}

/// `*.yml` and `*.yaml` files under `root`, relative to it, sorted.
/// Hidden entries are skipped.
fn list_records(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut records = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));
    for entry in walker {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_record = matches!(
            entry.path().extension().and_then(|e| e.to_str()),
            Some("yml" | "yaml")
        );
        if is_record {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            records.push(relative.to_path_buf());
        }
    }
    Ok(records)
}
