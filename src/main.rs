mod shell;

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mindmap::storage::{self, HealthReport};
use mindmap::{
    BlockId, BlockStore, FileStorage, FocusWeight, ImportError, ImportMode, LayoutConfig, MoodTag, PartialBlock,
    StorageError, StoreError, SystemClock, TracingNotifier, parse_import,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::shell::{HELP, ShellCommand, parse_line};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("import rejected: {0}")]
    Import(#[from] ImportError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("no block matches `{0}`")]
    UnknownBlock(String),
    #[error("`{0}` matches more than one block")]
    AmbiguousBlock(String),
    #[error("{0} is destructive; pass --yes to confirm")]
    ConfirmationRequired(&'static str),
}

#[derive(Parser, Debug)]
#[command(name = "tenebris", about = "Mindmap block layout engine")]
struct Cli {
    /// Directory holding persisted mindmaps.
    #[arg(long, env = "TENEBRIS_DATA_DIR", default_value = ".tenebris")]
    data_dir: PathBuf,

    /// Mindmap identifier; selects the storage keys.
    #[arg(long, env = "TENEBRIS_MINDMAP", default_value = "default")]
    mindmap: String,

    #[arg(long, default_value_t = 1280.0)]
    viewport_width: f64,

    #[arg(long, default_value_t = 800.0)]
    viewport_height: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every block as JSON.
    List,
    /// Create a block at a screen position.
    Create {
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        x: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        y: f64,
        #[arg(default_value = "")]
        content: String,
    },
    Update(UpdateArgs),
    Delete {
        id: String,
    },
    Duplicate {
        id: String,
    },
    /// Drag a block by a screen delta and drop it.
    Move {
        id: String,
        #[arg(allow_negative_numbers = true)]
        dx: f64,
        #[arg(allow_negative_numbers = true)]
        dy: f64,
    },
    /// Toggle a block's pin.
    Pin {
        id: String,
    },
    /// Fit the camera to every block.
    Fit,
    /// Lay blocks out in a grid. Without --apply, prints the preview and
    /// leaves the stored mindmap untouched.
    Organize {
        #[arg(long, default_value_t = false)]
        apply: bool,
    },
    Stats,
    Export {
        /// Output file; stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replace every block with the contents of an exported file.
    Import {
        path: PathBuf,
        /// Keep ids, sizes, tags and timestamps instead of re-creating blocks.
        #[arg(long, default_value_t = false)]
        full: bool,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Report corrupted storage entries.
    Health,
    /// Remove corrupted storage entries.
    Clean {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Remove every stored mindmap.
    Reset {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Read line commands from stdin against one open store.
    Shell,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    id: String,
    #[arg(long)]
    content: Option<String>,
    #[arg(long, value_parser = parse_mood)]
    mood: Option<MoodTag>,
    #[arg(long)]
    focus: Option<i64>,
    #[arg(long)]
    width: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    #[arg(long, conflicts_with = "clear_image")]
    image: Option<String>,
    #[arg(long, default_value_t = false)]
    clear_image: bool,
}

impl UpdateArgs {
    fn to_partial(&self) -> PartialBlock {
        let image = match (&self.image, self.clear_image) {
            (Some(image), _) => Some(Some(image.clone())),
            (None, true) => Some(None),
            (None, false) => None,
        };
        PartialBlock {
            content: self.content.clone(),
            image,
            mood_tag: self.mood,
            focus_weight: self.focus.map(FocusWeight::new),
            width: self.width,
            height: self.height,
            ..PartialBlock::default()
        }
    }
}

fn parse_mood(raw: &str) -> Result<MoodTag, String> {
    MoodTag::parse(raw).ok_or_else(|| format!("unknown mood tag `{raw}`"))
}

type Store = BlockStore<FileStorage>;

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut storage = FileStorage::open(&cli.data_dir)?;

    match cli.command {
        Command::Health => return run_health(&storage),
        Command::Clean { yes } => return run_clean(&mut storage, yes),
        Command::Reset { yes } => return run_reset(&mut storage, yes),
        _ => {}
    }

    tracing::debug!(mindmap = %cli.mindmap, dir = %cli.data_dir.display(), "opening mindmap");
    let mut store = BlockStore::init(&cli.mindmap, storage, LayoutConfig::from_env(), SystemClock, TracingNotifier)?;
    store.set_viewport(cli.viewport_width, cli.viewport_height);
    run_command(&mut store, cli.command)?;
    store.teardown()?;
    Ok(())
}

fn run_command(store: &mut Store, command: Command) -> Result<(), CliError> {
    match command {
        Command::List => print_json(&serde_json::to_value(store.blocks())?),
        Command::Create { x, y, content } => {
            let id = store.create_block(x, y, &content)?;
            store.end_edit(&id)?;
            println!("{id}");
            Ok(())
        }
        Command::Update(args) => {
            let id = resolve_id(store, &args.id)?;
            store.update_block(&id, &args.to_partial())?;
            print_json(&serde_json::to_value(store.block(&id))?)
        }
        Command::Delete { id } => {
            let id = resolve_id(store, &id)?;
            store.delete_block(&id)?;
            println!("{id}");
            Ok(())
        }
        Command::Duplicate { id } => {
            let id = resolve_id(store, &id)?;
            println!("{}", store.duplicate_block(&id)?);
            Ok(())
        }
        Command::Move { id, dx, dy } => {
            let id = resolve_id(store, &id)?;
            drag(store, &id, dx, dy)?;
            print_json(&serde_json::to_value(store.block(&id))?)
        }
        Command::Pin { id } => {
            let id = resolve_id(store, &id)?;
            let pinned = store.toggle_pin(&id)?;
            println!("{id} {}", if pinned { "pinned" } else { "unpinned" });
            Ok(())
        }
        Command::Fit => print_json(&serde_json::to_value(store.fit_viewport()?)?),
        Command::Organize { apply: true } => {
            if store.toggle_organize_mode()? {
                store.apply_organize()?;
            }
            print_json(&serde_json::to_value(store.blocks())?)
        }
        Command::Organize { apply: false } => print_json(&serde_json::to_value(store.organize_preview())?),
        Command::Stats => print_json(&serde_json::to_value(store.stats())?),
        Command::Export { output } => {
            let json = store.export_document().to_json()?;
            match output {
                Some(path) => {
                    fs::write(&path, json)?;
                    eprintln!("exported {} blocks to {}", store.blocks().len(), path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        Command::Import { path, full, yes } => {
            let plan = parse_import(&fs::read_to_string(&path)?)?;
            if !yes {
                eprintln!(
                    "{} would replace {} blocks with {} imported blocks",
                    path.display(),
                    store.blocks().len(),
                    plan.len()
                );
                return Err(CliError::ConfirmationRequired("import"));
            }
            let mode = if full { ImportMode::Full } else { ImportMode::Replay };
            let count = store.apply_import(&plan, mode)?;
            eprintln!("imported {count} blocks");
            Ok(())
        }
        Command::Shell => run_shell(store),
        Command::Health | Command::Clean { .. } | Command::Reset { .. } => Ok(()),
    }
}

/// Drag-and-drop in one step: overlap is resolved at the drop.
fn drag(store: &mut Store, id: &BlockId, dx: f64, dy: f64) -> Result<(), CliError> {
    store.end_edit(id)?;
    store.begin_drag(id)?;
    store.move_block(id, dx, dy)?;
    store.end_drag(id)?;
    Ok(())
}

/// Match a full id or a unique prefix of one.
fn resolve_id(store: &Store, raw: &str) -> Result<BlockId, CliError> {
    let needle = raw.trim().to_ascii_lowercase();
    let mut matches = store
        .blocks()
        .iter()
        .map(|b| b.id)
        .filter(|id| !needle.is_empty() && id.to_string().starts_with(&needle));
    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id),
        (Some(_), Some(_)) => Err(CliError::AmbiguousBlock(raw.to_string())),
        (None, _) => Err(CliError::UnknownBlock(raw.to_string())),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

// =============================================================================
// STORAGE MAINTENANCE
// =============================================================================

fn print_health(report: &HealthReport) {
    println!("keys: {}", report.keys);
    println!("bytes: {}", report.bytes);
    if report.is_healthy() {
        println!("corrupted: none");
    } else {
        for key in &report.corrupted {
            println!("corrupted: {key}");
        }
    }
}

fn run_health(storage: &FileStorage) -> Result<(), CliError> {
    print_health(&storage::scan_health(storage)?);
    for id in storage::mindmap_ids(storage)? {
        println!("mindmap: {id}");
    }
    Ok(())
}

fn run_clean(storage: &mut FileStorage, yes: bool) -> Result<(), CliError> {
    if !yes {
        print_health(&storage::scan_health(storage)?);
        return Err(CliError::ConfirmationRequired("clean"));
    }
    let removed = storage::clean_corrupted(storage)?;
    println!("removed {} corrupted entries", removed.len());
    Ok(())
}

fn run_reset(storage: &mut FileStorage, yes: bool) -> Result<(), CliError> {
    if !yes {
        return Err(CliError::ConfirmationRequired("reset"));
    }
    println!("removed {} entries", storage::reset_all(storage)?);
    Ok(())
}

// =============================================================================
// SHELL
// =============================================================================

fn run_shell(store: &mut Store) -> Result<(), CliError> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(ShellCommand::Quit)) => break,
            Ok(Some(command)) => {
                if let Err(error) = run_shell_command(store, command) {
                    eprintln!("error: {error}");
                }
            }
            Err(usage) => eprintln!("error: {usage}"),
        }
        store.tick()?;
        stdout.flush()?;
    }
    Ok(())
}

fn run_shell_command(store: &mut Store, command: ShellCommand) -> Result<(), CliError> {
    match command {
        ShellCommand::Create { x, y, content } => {
            println!("{}", store.create_block(x, y, &content)?);
        }
        ShellCommand::Text { id, content } => {
            let id = resolve_id(store, &id)?;
            store.update_block(&id, &PartialBlock { content: Some(content), ..PartialBlock::default() })?;
        }
        ShellCommand::Mood { id, tag } => {
            let id = resolve_id(store, &id)?;
            store.update_block(&id, &PartialBlock { mood_tag: Some(tag), ..PartialBlock::default() })?;
        }
        ShellCommand::Focus { id, weight } => {
            let id = resolve_id(store, &id)?;
            let patch = PartialBlock { focus_weight: Some(FocusWeight::new(weight)), ..PartialBlock::default() };
            store.update_block(&id, &patch)?;
        }
        ShellCommand::Resize { id, width, height } => {
            let id = resolve_id(store, &id)?;
            let patch = PartialBlock { width: Some(width), height: Some(height), ..PartialBlock::default() };
            store.update_block(&id, &patch)?;
        }
        ShellCommand::Image { id, image } => {
            let id = resolve_id(store, &id)?;
            store.update_block(&id, &PartialBlock { image: Some(image), ..PartialBlock::default() })?;
        }
        ShellCommand::Edit { id } => {
            let id = resolve_id(store, &id)?;
            if !store.begin_edit(&id)? {
                eprintln!("{id} is being dragged");
            }
        }
        ShellCommand::Done { id } => {
            let id = resolve_id(store, &id)?;
            store.end_edit(&id)?;
        }
        ShellCommand::Drag { id, dx, dy } => {
            let id = resolve_id(store, &id)?;
            drag(store, &id, dx, dy)?;
        }
        ShellCommand::Delete { id } => {
            let id = resolve_id(store, &id)?;
            store.delete_block(&id)?;
        }
        ShellCommand::Undo => {
            if let Some(id) = store.undo_delete()? {
                println!("{id}");
            }
        }
        ShellCommand::Duplicate { id } => {
            let id = resolve_id(store, &id)?;
            println!("{}", store.duplicate_block(&id)?);
        }
        ShellCommand::Pin { id } => {
            let id = resolve_id(store, &id)?;
            store.toggle_pin(&id)?;
        }
        ShellCommand::PinMode => {
            println!("pin mode {}", if store.toggle_pin_mode() { "on" } else { "off" });
        }
        ShellCommand::Organize => {
            println!("organize {}", if store.toggle_organize_mode()? { "on" } else { "off" });
        }
        ShellCommand::Apply => {
            store.apply_organize()?;
        }
        ShellCommand::Revert => {
            store.revert_organize()?;
        }
        ShellCommand::Fit => print_json(&serde_json::to_value(store.fit_viewport()?)?)?,
        ShellCommand::Flush => {
            store.flush_deferred()?;
        }
        ShellCommand::List => {
            for block in store.visible_blocks() {
                let first_line = block.content.lines().next().unwrap_or_default();
                println!(
                    "{}  ({:.0}, {:.0})  {:.0}x{:.0}  {:<9} {}",
                    block.id,
                    block.x,
                    block.y,
                    block.width,
                    block.height,
                    block.mood_tag.as_str(),
                    first_line
                );
            }
        }
        ShellCommand::Stats => print_json(&serde_json::to_value(store.stats())?)?,
        ShellCommand::Help => println!("{HELP}"),
        ShellCommand::Quit => {}
    }
    Ok(())
}
