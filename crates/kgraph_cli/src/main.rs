//! `kgraph` command-line entry point.
//!
//! # Responsibility
//! - Expose raw heading paths (`/a.b:c,d.$`) over a SQLite-backed graph.
//! - Keep stdout to one record per line; diagnostics go to stderr.
//!
//! # See also
//! - `kgraph_core::path::parser` for the path grammar.

use clap::{Parser, Subcommand};
use kgraph_core::db::{open_db, open_db_in_memory, DbError};
use kgraph_core::path::creation_tether;
use kgraph_core::view::act::fetch_or_create_node;
use kgraph_core::view::{alias, node, tag, FetchSet, Tether};
use kgraph_core::{
    abs_path, decide_path, default_log_level, disambiguate, init_logging, GraphStore, NodeId,
    PathError, SqliteGraphStore, StoreError,
};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "kgraph")]
#[command(about = "Query and edit a personal knowledge graph by heading path", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database file (in-memory scratch graph when omitted)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files (logging is off when omitted)
    #[arg(long, global = true)]
    log_dir: Option<String>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true, default_value = default_log_level())]
    log_level: String,

    /// Node id relative paths resolve against
    #[arg(long, global = true, value_parser = parse_node_id)]
    selected: Option<NodeId>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every node a path matches
    Resolve { path: String },

    /// Resolve a path, creating missing nodes
    Create { path: String },

    /// Erase the node a path names, with its subtree and aliases
    Erase { path: String },

    /// Tag the node a path names (`lang.rust` lives at /meta.tag.lang.rust)
    Tag { path: String, tag: String },

    /// Install an alias of `target` under the node a path names
    Alias { path: String, target: String },

    /// Print or replace the body of the node a path names
    Body {
        path: String,
        /// New body text
        #[arg(long)]
        set: Option<String>,
    },

    /// Print the whole graph
    Tree,
}

#[derive(Debug)]
enum CliError {
    Logging(String),
    Db(DbError),
    Store(StoreError),
    Path(PathError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(message) => write!(f, "logging: {message}"),
            Self::Db(err) => write!(f, "database: {err}"),
            Self::Store(err) => write!(f, "store: {err}"),
            Self::Path(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(_) => None,
            Self::Db(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Path(err) => Some(err),
        }
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<PathError> for CliError {
    fn from(value: PathError) -> Self {
        Self::Path(value)
    }
}

type CliResult<T> = Result<T, CliError>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(&cli.log_level, log_dir).map_err(CliError::Logging)?;
    }

    let conn = match cli.db.as_deref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let mut store = SqliteGraphStore::try_new(&conn)?;
    let selected = cli.selected;

    match cli.command {
        Commands::Resolve { path } => print_matches(&store, &decide_path(&store, selected, &path)?),
        Commands::Create { path } => {
            let mut actor = fetch_or_create_node(&mut store);
            if let Some(selected) = selected {
                actor = actor.selected(selected);
            }
            let id = creation_tether(selected, &path)? | actor;
            print_node(&store, id?)
        }
        Commands::Erase { path } => {
            let target = resolve_single(&store, selected, &path)?;
            let erased = Tether::new(node(target)).erase(&mut store)?;
            info!(
                "event=cli_erase module=cli status=ok erased={} path={path}",
                erased.len()
            );
            for id in erased {
                println!("{id}");
            }
            Ok(())
        }
        Commands::Tag { path, tag: tag_path } => {
            let target = resolve_single(&store, selected, &path)?;
            let definition = (node(target) | tag().with(tag_path)).fetch_or_create_node(&mut store)?;
            print_node(&store, definition)
        }
        Commands::Alias { path, target } => {
            let dst = resolve_single(&store, selected, &path)?;
            let src = resolve_single(&store, selected, &target)?;
            let src = (node(dst) | alias().with(src)).fetch_or_create_node(&mut store)?;
            print_node(&store, src)
        }
        Commands::Body { path, set } => {
            let target = Tether::new(node(resolve_single(&store, selected, &path)?));
            if let Some(body) = set {
                target.update_body(&mut store, body)?;
            }
            println!("{}", target.fetch_body(&store)?);
            Ok(())
        }
        Commands::Tree => print_tree(&store, store.root_node(), 0),
    }
}

fn parse_node_id(raw: &str) -> Result<NodeId, String> {
    NodeId::parse_str(raw.trim()).map_err(|err| format!("invalid node id `{raw}`: {err}"))
}

fn resolve_single(
    store: &dyn GraphStore,
    selected: Option<NodeId>,
    raw: &str,
) -> CliResult<NodeId> {
    let matches = decide_path(store, selected, raw)?
        .into_iter()
        .collect::<FetchSet>();
    matches
        .single()
        .map_err(|err| CliError::Path(err.with_breadcrumb("path", raw)))
}

fn print_node(store: &dyn GraphStore, id: NodeId) -> CliResult<()> {
    println!("{id}\t{}", abs_path(store, id)?);
    Ok(())
}

/// One match prints `id<TAB>path`; several add a disambiguating label.
fn print_matches(store: &dyn GraphStore, ids: &[NodeId]) -> CliResult<()> {
    if let [only] = ids {
        return print_node(store, *only);
    }
    for (id, label) in disambiguate(store, ids)? {
        println!("{id}\t{label}\t{}", abs_path(store, id)?);
    }
    Ok(())
}

fn print_tree(store: &dyn GraphStore, id: NodeId, depth: usize) -> CliResult<()> {
    let heading = store.fetch_heading(id)?;
    let indent = "  ".repeat(depth);
    match store.fetch_alias_source(id)? {
        Some(src) => println!("{indent}{heading} -> {}\t{id}", abs_path(store, src)?),
        None => println!("{indent}{heading}\t{id}"),
    }
    for child in store.fetch_children(id)? {
        print_tree(store, child, depth + 1)?;
    }
    Ok(())
}
