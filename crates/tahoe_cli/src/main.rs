//! `tahoe` command-line front end.
//!
//! # Responsibility
//! - Map subcommands onto [`NoteStore`] operations.
//! - Act as the failure boundary: errors are logged, printed to stderr and
//!   turned into a non-zero exit code.

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tahoe_core::{
    default_log_level, export_file_name, init_logging, log_dir_for, AccentColor, ContentBlock,
    FolderId, Language, NoteId, NoteStore, NoteTreeNode, Point, RenderedBlock, Theme,
};

const DEFAULT_DATA_DIR: &str = ".tahoe";
const PREVIEW_CHARS: usize = 60;

#[derive(Debug, Parser)]
#[command(name = "tahoe", version, about = "Markdown notes with wiki links and tasks")]
struct Cli {
    /// Directory holding the database, settings, assets and logs.
    #[arg(long, env = "TAHOE_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a root note.
    New {
        /// Title; a default note is created when omitted.
        title: Option<String>,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long)]
        folder: Option<FolderId>,
    },
    /// Create an empty note under a parent.
    Subnote {
        parent: NoteId,
        #[arg(default_value = "")]
        title: String,
    },
    /// Print the note hierarchy.
    List {
        /// Only notes in this folder.
        #[arg(long)]
        folder: Option<FolderId>,
    },
    /// Print one note's raw content.
    Show { id: NoteId },
    /// Print one note as parsed blocks.
    Render { id: NoteId },
    /// Replace a note's content from a file, or stdin when omitted.
    Edit {
        id: NoteId,
        #[arg(long)]
        from: Option<PathBuf>,
    },
    Rename { id: NoteId, title: String },
    /// Move a note under a new parent, or to the root.
    Move {
        id: NoteId,
        #[arg(long, conflicts_with = "root")]
        parent: Option<NoteId>,
        #[arg(long)]
        root: bool,
    },
    /// Delete a note and all of its sub-notes.
    Delete { id: NoteId },
    Folder {
        #[command(subcommand)]
        command: FolderCommand,
    },
    /// Import a markdown file as a new note.
    Import { path: PathBuf },
    /// Export a note to a markdown file.
    Export {
        id: NoteId,
        /// Target file, or a directory to place `<title>.md` in.
        #[arg(long)]
        to: Option<PathBuf>,
    },
    /// Copy an image into the assets directory and reference it from a note.
    #[command(name = "attach-image")]
    AttachImage { id: NoteId, image: PathBuf },
    /// List tasks across all notes.
    Tasks {
        /// Hide completed tasks.
        #[arg(long)]
        open: bool,
    },
    /// Toggle the task on a line of a note.
    Toggle { id: NoteId, line: usize },
    /// Print wiki-link graph nodes, positions and links.
    Graph {
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long, default_value_t = 600.0)]
        height: f64,
        /// Report the node under this `x,y` point.
        #[arg(long, value_parser = parse_point)]
        at: Option<Point>,
    },
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Debug, Subcommand)]
enum FolderCommand {
    New {
        #[arg(default_value = "")]
        name: String,
    },
    List,
    Rename { id: FolderId, name: String },
    /// Delete a folder; its notes are kept.
    Delete { id: FolderId },
    /// Put a note in a folder, or take it out with `--none`.
    Assign {
        note: NoteId,
        #[arg(required_unless_present = "none")]
        folder: Option<FolderId>,
        #[arg(long)]
        none: bool,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    Show,
    Set {
        #[arg(long)]
        theme: Option<Theme>,
        #[arg(long)]
        accent: Option<AccentColor>,
        #[arg(long)]
        language: Option<Language>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let data_dir = resolve_data_dir(cli.data_dir)?;
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, &log_dir_for(&data_dir))
        .map_err(|err| anyhow::anyhow!("failed to initialize logging: {err}"))?;

    let store = NoteStore::open(&data_dir)
        .with_context(|| format!("failed to open store at `{}`", data_dir.display()))?;

    match cli.command {
        Command::New {
            title,
            content,
            folder,
        } => {
            let note = match title {
                None if content.is_empty() && folder.is_none() => store.create_root_note()?,
                title => store.create_note(title.as_deref().unwrap_or(""), &content, None, folder)?,
            };
            println!("{}", note.id);
        }
        Command::Subnote { parent, title } => {
            println!("{}", store.create_subnote(parent, &title)?.id);
        }
        Command::List { folder } => match folder {
            Some(folder) => {
                for note in store.notes_in_folder(folder)? {
                    println!("{}  {}", note.id, note.title);
                }
            }
            None => print_tree(&store.note_tree()?, 0),
        },
        Command::Show { id } => print!("{}", store.note(id)?.content),
        Command::Render { id } => {
            for rendered in store.render_note(id)? {
                println!("{}", describe_block(&rendered));
            }
        }
        Command::Edit { id, from } => {
            let content = read_content(from.as_deref())?;
            store.update_content(id, &content)?;
        }
        Command::Rename { id, title } => {
            store.rename_note(id, &title)?;
        }
        Command::Move { id, parent, root } => {
            if parent.is_none() && !root {
                anyhow::bail!("either --parent or --root is required");
            }
            store.move_note(id, parent)?;
        }
        Command::Delete { id } => {
            let deleted = store.delete_note(id)?;
            println!("deleted {} note(s)", deleted.len());
        }
        Command::Folder { command } => run_folder(&store, command)?,
        Command::Import { path } => {
            println!("{}", store.import_markdown(&path)?.id);
        }
        Command::Export { id, to } => {
            let note = store.note(id)?;
            let destination = match to {
                Some(path) if path.is_dir() => path.join(export_file_name(&note.title)),
                Some(path) => path,
                None => PathBuf::from(export_file_name(&note.title)),
            };
            store.export_markdown(id, &destination)?;
            println!("{}", destination.display());
        }
        Command::AttachImage { id, image } => {
            let (_, relative) = store.attach_image(id, &image)?;
            println!("{relative}");
        }
        Command::Tasks { open } => {
            for task in store.tasks()? {
                if open && task.done {
                    continue;
                }
                let mark = if task.done { 'x' } else { ' ' };
                println!(
                    "[{mark}] {}  ({} line {}, {})",
                    task.text, task.note_title, task.line_index, task.note_id
                );
            }
        }
        Command::Toggle { id, line } => {
            store.toggle_task(id, line)?;
        }
        Command::Graph { width, height, at } => {
            let graph = store.graph(width, height)?;
            if let Some(point) = at {
                match graph.node_at(point) {
                    Some(node) => println!("{}  {}", node.id, node.title),
                    None => println!("no node at {:.1},{:.1}", point.x, point.y),
                }
                return Ok(());
            }
            for node in &graph.nodes {
                println!(
                    "{}  ({:.1}, {:.1})  {}",
                    node.id, node.position.x, node.position.y, node.title
                );
            }
            for link in &graph.links {
                println!("{} -> {}", link.source, link.target);
            }
        }
        Command::Settings { command } => match command {
            SettingsCommand::Show => {
                let settings = store.settings();
                println!("theme={}", settings.theme);
                println!(
                    "accent={} ({})",
                    settings.accent_color,
                    settings.accent_color.color_name()
                );
                println!("language={}", settings.language);
            }
            SettingsCommand::Set {
                theme,
                accent,
                language,
            } => {
                let mut settings = store.settings();
                settings.theme = theme.unwrap_or(settings.theme);
                settings.accent_color = accent.unwrap_or(settings.accent_color);
                settings.language = language.unwrap_or(settings.language);
                store.save_settings(&settings)?;
            }
        },
    }
    Ok(())
}

fn run_folder(store: &NoteStore, command: FolderCommand) -> anyhow::Result<()> {
    match command {
        FolderCommand::New { name } => println!("{}", store.create_folder(&name)?.id),
        FolderCommand::List => {
            for folder in store.list_folders()? {
                println!("{}  {}", folder.id, folder.name);
            }
        }
        FolderCommand::Rename { id, name } => {
            store.rename_folder(id, &name)?;
        }
        FolderCommand::Delete { id } => {
            let detached = store.delete_folder(id)?;
            println!("detached {detached} note(s)");
        }
        FolderCommand::Assign { note, folder, none } => {
            store.set_folder(note, if none { None } else { folder })?;
        }
    }
    Ok(())
}

fn resolve_data_dir(requested: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    let path = requested.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    Ok(cwd.join(path))
}

fn read_content(from: Option<&Path>) -> anyhow::Result<String> {
    match from {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display())),
        None => std::io::read_to_string(std::io::stdin()).context("failed to read stdin"),
    }
}

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{value}`"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<f64>()
            .map_err(|err| format!("invalid coordinate `{part}`: {err}"))
    };
    Ok(Point::new(parse(x)?, parse(y)?))
}

fn print_tree(nodes: &[NoteTreeNode], depth: usize) {
    for node in nodes {
        let preview: String = node
            .note
            .content
            .lines()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("")
            .chars()
            .take(PREVIEW_CHARS)
            .collect();
        println!(
            "{}{}  {}  {}",
            "  ".repeat(depth),
            node.note.id,
            node.note.title,
            preview
        );
        print_tree(&node.children, depth + 1);
    }
}

fn describe_block(rendered: &RenderedBlock) -> String {
    let text = rendered
        .spans
        .as_ref()
        .map(|spans| spans.text.as_str())
        .unwrap_or_default();
    match &rendered.block {
        ContentBlock::Header { level, .. } => format!("header({level}) {text}"),
        ContentBlock::Paragraph { .. } => format!("paragraph {text}"),
        ContentBlock::ListItem { .. } => format!("list-item {text}"),
        ContentBlock::Image { path } => format!("image {path}"),
        ContentBlock::Code { language, text } => format!(
            "code({})\n{text}",
            language.as_deref().unwrap_or("plain")
        ),
        ContentBlock::Callout { kind, title, .. } => format!(
            "callout({kind}) {}{}{text}",
            title.as_deref().unwrap_or(""),
            if text.is_empty() { "" } else { "\n" }
        ),
        ContentBlock::Quote { .. } => format!("quote {text}"),
        ContentBlock::Task { done, .. } => {
            format!("task[{}] {text}", if *done { 'x' } else { ' ' })
        }
        ContentBlock::HorizontalRule => "rule".to_string(),
        ContentBlock::Footnote { id, .. } => format!("footnote({id}) {text}"),
    }
}
