/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Command-line front end.
//!
//! Each invocation opens a named workflow from the store, applies one edit
//! through [`WorkflowEditorApp`] and saves it back. Nodes are referenced by
//! id, a unique id prefix, or a unique label.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;

use bpaf::Bpaf;
use euclid::default::Point2D;

use crate::app::WorkflowEditorApp;
use crate::graph::error::GraphError;
use crate::graph::sample::demo_workflow;
use crate::graph::{Graph, NodeId};
use crate::persistence::{WorkflowStore, WorkflowStoreError};
use crate::prefs::{EditorPreferences, PrefsError};
use crate::registries::atomic::node_type::{FieldKind, NodeTypeRegistry};
use crate::render::node_summary;
use crate::services::runner::{DryRunRunner, RunError};

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
/// Edit workflow graphs stored as JSON documents
pub struct Cli {
    /// Directory holding workflow documents
    #[bpaf(long("data-dir"), argument("DIR"))]
    pub data_dir: Option<PathBuf>,
    /// Log filter directive, e.g. flowshell=debug
    #[bpaf(long("log-filter"), argument("FILTER"))]
    pub log_filter: Option<String>,
    #[bpaf(external(command))]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Bpaf)]
pub enum Command {
    /// Create a workflow
    #[bpaf(command("new"))]
    New {
        #[bpaf(positional("NAME"))]
        name: String,
        /// Seed with the demo retrieval pipeline
        demo: bool,
        /// Replace an existing workflow of the same name
        force: bool,
    },
    /// List stored workflows
    #[bpaf(command("list"))]
    List,
    /// Print a workflow's nodes and edges
    #[bpaf(command("show"))]
    Show {
        #[bpaf(positional("NAME"))]
        name: String,
    },
    /// Print the node type catalog
    #[bpaf(command("palette"))]
    Palette,
    /// Add a node and print its id
    #[bpaf(command("add-node"))]
    AddNode {
        #[bpaf(positional("NAME"))]
        name: String,
        /// Node type tag
        #[bpaf(long("type"), argument("TYPE"))]
        node_type: String,
        #[bpaf(long("x"), argument("X"), fallback(0.0))]
        x: f32,
        #[bpaf(long("y"), argument("Y"), fallback(0.0))]
        y: f32,
        #[bpaf(long("label"), argument("LABEL"))]
        label: Option<String>,
    },
    /// Remove a node and its edges
    #[bpaf(command("remove-node"))]
    RemoveNode {
        #[bpaf(positional("NAME"))]
        name: String,
        #[bpaf(positional("NODE"))]
        node: String,
    },
    /// Move a node
    #[bpaf(command("move"))]
    Move {
        #[bpaf(positional("NAME"))]
        name: String,
        #[bpaf(positional("NODE"))]
        node: String,
        #[bpaf(long("x"), argument("X"))]
        x: f32,
        #[bpaf(long("y"), argument("Y"))]
        y: f32,
    },
    /// Connect two nodes
    #[bpaf(command("connect"))]
    Connect {
        #[bpaf(positional("NAME"))]
        name: String,
        #[bpaf(positional("FROM"))]
        from: String,
        #[bpaf(positional("TO"))]
        to: String,
    },
    /// Remove the edge between two nodes
    #[bpaf(command("disconnect"))]
    Disconnect {
        #[bpaf(positional("NAME"))]
        name: String,
        #[bpaf(positional("FROM"))]
        from: String,
        #[bpaf(positional("TO"))]
        to: String,
    },
    /// Set a config field from text, as the inspector would
    #[bpaf(command("set"))]
    Set {
        #[bpaf(positional("NAME"))]
        name: String,
        #[bpaf(positional("NODE"))]
        node: String,
        #[bpaf(positional("FIELD"))]
        field: String,
        #[bpaf(positional("VALUE"))]
        value: String,
    },
    /// Rename a node
    #[bpaf(command("label"))]
    Label {
        #[bpaf(positional("NAME"))]
        name: String,
        #[bpaf(positional("NODE"))]
        node: String,
        #[bpaf(positional("LABEL"))]
        label: String,
    },
    /// Write the canvas as SVG
    #[bpaf(command("render"))]
    Render {
        #[bpaf(positional("NAME"))]
        name: String,
        /// Output file; stdout when omitted
        #[bpaf(long("out"), argument("PATH"))]
        out: Option<PathBuf>,
    },
    /// Dry-run the workflow and print the receipt
    #[bpaf(command("run"))]
    Run {
        #[bpaf(positional("NAME"))]
        name: String,
    },
    /// Delete a stored workflow
    #[bpaf(command("delete"))]
    Delete {
        #[bpaf(positional("NAME"))]
        name: String,
    },
}

#[derive(Debug)]
pub enum CliError {
    Prefs(PrefsError),
    Store(WorkflowStoreError),
    Graph(GraphError),
    Run(RunError),
    Usage(String),
    Io(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Prefs(e) => write!(f, "{e}"),
            CliError::Store(e) => write!(f, "{e}"),
            CliError::Graph(e) => write!(f, "{e}"),
            CliError::Run(e) => write!(f, "{e}"),
            CliError::Usage(e) => write!(f, "{e}"),
            CliError::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<PrefsError> for CliError {
    fn from(e: PrefsError) -> Self {
        CliError::Prefs(e)
    }
}

impl From<WorkflowStoreError> for CliError {
    fn from(e: WorkflowStoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<GraphError> for CliError {
    fn from(e: GraphError) -> Self {
        CliError::Graph(e)
    }
}

impl From<RunError> for CliError {
    fn from(e: RunError) -> Self {
        CliError::Run(e)
    }
}

impl From<std::fmt::Error> for CliError {
    fn from(e: std::fmt::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

pub fn main() -> ExitCode {
    let cli = cli().run();
    let prefs = match EditorPreferences::load_default() {
        Ok(prefs) => prefs,
        Err(e) => {
            eprintln!("flowshell: {e}");
            return ExitCode::FAILURE;
        },
    };
    init_logging(&log_filter(&cli, &prefs));

    match execute(&cli, &prefs) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("flowshell: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Flag, then `RUST_LOG`, then preferences, then `warn`.
pub fn log_filter(cli: &Cli, prefs: &EditorPreferences) -> String {
    cli.log_filter
        .clone()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .or_else(|| prefs.log_filter.clone())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

#[cfg(feature = "tracing")]
fn init_logging(filter: &str) {
    if !crate::init_tracing(filter) {
        log::debug!("Subscriber already installed");
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(_filter: &str) {}

/// Run one command and return what it prints on success.
pub fn execute(cli: &Cli, prefs: &EditorPreferences) -> Result<String, CliError> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(|| prefs.data_dir());
    let store = WorkflowStore::open(data_dir)?;

    let mut out = String::new();
    match &cli.command {
        Command::New { name, demo, force } => {
            if !force && store.path_for(name)?.exists() {
                return Err(CliError::Usage(format!(
                    "Workflow {name:?} already exists; pass --force to replace it"
                )));
            }
            let graph = if *demo { demo_workflow() } else { Graph::new() };
            let mut app = WorkflowEditorApp::from_graph(name, graph);
            let path = app.save(&store)?;
            writeln!(out, "Created {}", path.display())?;
        },
        Command::List => {
            for name in store.list_names()? {
                writeln!(out, "{name}")?;
            }
        },
        Command::Show { name } => {
            let app = open(&store, prefs, name)?;
            describe(&mut out, &app)?;
        },
        Command::Palette => {
            for schema in NodeTypeRegistry::global().palette() {
                writeln!(
                    out,
                    "{:<14} {} {} [{}]",
                    schema.tag,
                    schema.icon,
                    schema.display_label,
                    schema.category.as_str()
                )?;
                for field in schema.fields {
                    writeln!(
                        out,
                        "    {:<18} {:<14} default {}",
                        field.name,
                        describe_kind(&field.kind),
                        field.default_value()
                    )?;
                }
            }
        },
        Command::AddNode {
            name,
            node_type,
            x,
            y,
            label,
        } => {
            let mut app = open(&store, prefs, name)?;
            let id = app.add_node_from_tag(node_type, Point2D::new(*x, *y), label.as_deref())?;
            app.save(&store)?;
            writeln!(out, "{id}")?;
        },
        Command::RemoveNode { name, node } => {
            let mut app = open(&store, prefs, name)?;
            let id = resolve_node(app.graph(), node)?;
            app.remove_node(id)?;
            app.save(&store)?;
        },
        Command::Move { name, node, x, y } => {
            let mut app = open(&store, prefs, name)?;
            let id = resolve_node(app.graph(), node)?;
            app.move_node(id, Point2D::new(*x, *y))?;
            app.save(&store)?;
        },
        Command::Connect { name, from, to } => {
            let mut app = open(&store, prefs, name)?;
            let from = resolve_node(app.graph(), from)?;
            let to = resolve_node(app.graph(), to)?;
            if !app.connect(from, to)? {
                writeln!(out, "Edge already exists")?;
            }
            app.save(&store)?;
        },
        Command::Disconnect { name, from, to } => {
            let mut app = open(&store, prefs, name)?;
            let from = resolve_node(app.graph(), from)?;
            let to = resolve_node(app.graph(), to)?;
            if !app.disconnect(from, to) {
                return Err(CliError::Usage("No such edge".to_string()));
            }
            app.save(&store)?;
        },
        Command::Set {
            name,
            node,
            field,
            value,
        } => {
            let mut app = open(&store, prefs, name)?;
            let id = resolve_node(app.graph(), node)?;
            app.edit_field(id, field, value)?;
            app.save(&store)?;
        },
        Command::Label { name, node, label } => {
            let mut app = open(&store, prefs, name)?;
            let id = resolve_node(app.graph(), node)?;
            app.set_node_label(id, label)?;
            app.save(&store)?;
        },
        Command::Render { name, out: path } => {
            let app = open(&store, prefs, name)?;
            let svg = app.render_svg()?;
            match path {
                Some(path) => {
                    std::fs::write(path, svg)
                        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
                    writeln!(out, "Wrote {}", path.display())?;
                },
                None => out.push_str(&svg),
            }
        },
        Command::Run { name } => {
            let app = open(&store, prefs, name)?;
            let receipt = app.run(&DryRunRunner)?;
            let json = serde_json::to_string_pretty(&receipt)
                .map_err(|e| CliError::Io(e.to_string()))?;
            writeln!(out, "{json}")?;
        },
        Command::Delete { name } => {
            store.delete(name)?;
        },
    }
    Ok(out)
}

fn open(
    store: &WorkflowStore,
    prefs: &EditorPreferences,
    name: &str,
) -> Result<WorkflowEditorApp, CliError> {
    let mut app = WorkflowEditorApp::with_preferences(prefs);
    app.open(store, name)?;
    Ok(app)
}

/// Find a node by full id, exact label, or unique id prefix, in that order.
pub fn resolve_node(graph: &Graph, reference: &str) -> Result<NodeId, CliError> {
    let reference = reference.trim();
    if let Some(id) = NodeId::parse(reference)
        && graph.contains_node(id)
    {
        return Ok(id);
    }

    let by_label: Vec<NodeId> = graph
        .nodes()
        .filter(|node| node.label() == reference)
        .map(|node| node.id())
        .collect();
    match by_label.as_slice() {
        [id] => return Ok(*id),
        [] => {},
        _ => {
            return Err(CliError::Usage(format!(
                "{reference:?} labels more than one node; use an id prefix"
            )));
        },
    }

    let by_prefix: Vec<NodeId> = graph
        .node_ids()
        .filter(|id| !reference.is_empty() && id.to_string().starts_with(reference))
        .collect();
    match by_prefix.as_slice() {
        [id] => Ok(*id),
        [] => Err(CliError::Usage(format!("No node matches {reference:?}"))),
        _ => Err(CliError::Usage(format!(
            "{reference:?} matches more than one node; use a longer id prefix"
        ))),
    }
}

fn describe(out: &mut String, app: &WorkflowEditorApp) -> std::fmt::Result {
    let graph = app.graph();
    writeln!(
        out,
        "{}: {} nodes, {} edges",
        app.name(),
        graph.node_count(),
        graph.edge_count()
    )?;
    for node in graph.nodes() {
        let id = node.id().to_string();
        let position = node.position();
        writeln!(
            out,
            "  {} {:<14} {:<20} ({}, {})  {}",
            &id[..8],
            node.schema().tag,
            node.label(),
            position.x,
            position.y,
            node_summary(graph, node)
        )?;
        for (field, value) in node.config() {
            writeln!(out, "      {field} = {value}")?;
        }
    }
    for (from, to) in graph.edges() {
        let label = |id: NodeId| graph.get_node(id).map(|node| node.label()).unwrap_or("?");
        writeln!(out, "  {} -> {}", label(from), label(to))?;
    }
    Ok(())
}

fn describe_kind(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Select { options } => format!("one of {}", options.join("|")),
        FieldKind::NumberRange { min, max, .. } => match max {
            Some(max) => format!("{min}..={max}"),
            None => format!(">= {min}"),
        },
        other => other.name().to_string(),
    }
}
