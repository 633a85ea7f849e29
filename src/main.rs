use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

use beadplan::config::Config;
use beadplan::core::{DependencyTable, TableDrift};
use beadplan::parser::{parse_document, ParsedDocument};
use beadplan::pipeline::{
    ApplyReport, CreationOutcome, CreationReport, DependencyApplier, EdgeOutcome, EdgeSource,
    RunReport, TaskCreator,
};
use beadplan::{
    bplog, bplog_error, BdTracker, DryRunTracker, Error, ExternalId, IdMap, Result, TaskId,
    Tracker,
};

const RULE: &str = "============================================================";

/// beadplan - import a Markdown task plan into the bd issue tracker
#[derive(Parser, Debug)]
#[command(name = "beadplan")]
#[command(version, about, long_about = None)]
#[command(
    after_help = "ENVIRONMENT:\n    BEADPLAN_DEBUG=1       Enable debug logging (alternative to --debug)\n    BEADPLAN_LOG=<level>   Log level: error, warn, info, debug or trace"
)]
pub struct Cli {
    /// Enable debug logging (writes to ~/.beadplan/beadplan.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Config file (default: ./beadplan.toml if present)
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Parse the plan and print the task records it contains
    Parse {
        /// Plan document
        document: PathBuf,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create one tracker task per record and print the id mapping
    Create {
        /// Plan document
        document: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Add dependencies between tasks created by an earlier `create`
    Link {
        /// Plan document (needed when edges come from the document)
        document: Option<PathBuf>,

        /// Mapping file written by `create --save-map`
        #[arg(long)]
        map: PathBuf,

        /// Where dependency edges come from
        #[arg(long, value_enum, default_value_t = EdgeArg::Auto)]
        edges: EdgeArg,

        /// Print what would be done without calling the tracker
        #[arg(long)]
        dry_run: bool,
    },

    /// Create all tasks, then add their dependencies
    Run {
        /// Plan document
        document: PathBuf,

        #[command(flatten)]
        run: RunArgs,

        /// Where dependency edges come from
        #[arg(long, value_enum, default_value_t = EdgeArg::Auto)]
        edges: EdgeArg,
    },

    /// Compare the configured dependency table with the plan's Dependencies fields
    Check {
        /// Plan document
        document: PathBuf,
    },
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct RunArgs {
    /// Print what would be done without calling the tracker
    #[arg(long, conflicts_with = "save_map")]
    pub dry_run: bool,

    /// Write the id mapping to this JSON file (not with --dry-run, whose
    /// ids do not exist in the tracker)
    #[arg(long)]
    pub save_map: Option<PathBuf>,

    /// Known mapping for a pre-existing item, e.g. `hel.0=uur-1-5-97e`
    #[arg(long = "seed", value_name = "ID=EXTERNAL", value_parser = parse_seed)]
    pub seeds: Vec<(TaskId, ExternalId)>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeArg {
    /// The config table when it has edges, otherwise the document
    Auto,
    /// The `[dependencies]` table from the config
    Table,
    /// The `Dependencies:` fields of the plan
    Document,
}

impl From<EdgeArg> for EdgeSource {
    fn from(arg: EdgeArg) -> Self {
        match arg {
            EdgeArg::Auto => EdgeSource::Auto,
            EdgeArg::Table => EdgeSource::Table,
            EdgeArg::Document => EdgeSource::Document,
        }
    }
}

fn parse_seed(s: &str) -> std::result::Result<(TaskId, ExternalId), String> {
    let (id, external) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=EXTERNAL, got {:?}", s))?;
    let id: TaskId = id.parse().map_err(|e: Error| e.to_string())?;
    let external = external.trim();
    if external.is_empty() {
        return Err(format!("empty external id in {:?}", s));
    }
    Ok((id, ExternalId::new(external)))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    beadplan::log::init_with_debug(cli.debug);

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Incomplete { failed }) => {
            bplog!("run incomplete: {} failed item(s)", failed);
            ExitCode::from(2)
        }
        Err(e) => {
            bplog_error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    match cli.command {
        Command::Parse { document, json } => run_parse(&document, json),
        Command::Create { document, run } => run_create(&config, &document, &run),
        Command::Link {
            document,
            map,
            edges,
            dry_run,
        } => run_link(&config, document.as_deref(), &map, edges.into(), dry_run),
        Command::Run {
            document,
            run,
            edges,
        } => run_full(&config, &document, &run, edges.into()),
        Command::Check { document } => run_check(&config, &document),
    }
}

fn load_document(path: &Path) -> Result<ParsedDocument> {
    bplog!("parsing {}", path.display());
    let parsed = parse_document(&fs::read_to_string(path)?);
    bplog!(
        "parsed {} records, dropped {} blocks",
        parsed.records.len(),
        parsed.dropped
    );
    Ok(parsed)
}

/// The tracker for this run: `bd` (or the configured command), or a dry run.
fn make_tracker(config: &Config, dry_run: bool) -> Result<Box<dyn Tracker>> {
    if dry_run {
        return Ok(Box::new(DryRunTracker::new()));
    }
    let tracker = BdTracker::new(config.effective_command());
    if !tracker.is_available() {
        return Err(Error::TrackerNotAvailable(tracker.program().to_string()));
    }
    Ok(Box::new(tracker))
}

/// Config seeds plus `--seed` flags; a flag may not remap a configured id.
fn seeded_map(config: &Config, seeds: &[(TaskId, ExternalId)]) -> Result<IdMap> {
    let mut map = config.seeded_map()?;
    for (id, external) in seeds {
        map.insert(id.clone(), external.clone())?;
    }
    Ok(map)
}

fn run_parse(document: &Path, json: bool) -> Result<()> {
    let parsed = load_document(document)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&parsed.records)?);
        return Ok(());
    }

    for record in &parsed.records {
        println!("{}  {}", record.id, record.title);
        println!(
            "    type={} priority={} estimate={} labels=[{}]",
            record.task_type.as_deref().unwrap_or("-"),
            record.priority.as_deref().unwrap_or("-"),
            record
                .estimate
                .map(|m| format!("{}m", m))
                .unwrap_or_else(|| "-".to_string()),
            record.labels.join(", ")
        );
        if let Some(deps) = &record.dependencies {
            println!("    depends on: {}", deps);
        }
    }
    println!();
    println!(
        "{} tasks parsed, {} blocks dropped (missing ID or title)",
        parsed.records.len(),
        parsed.dropped
    );
    Ok(())
}

fn create_phase(
    config: &Config,
    parsed: &ParsedDocument,
    tracker: &mut dyn Tracker,
    map: &mut IdMap,
) -> CreationReport {
    println!("Creating tasks");
    println!("{}", RULE);
    println!();

    let creator = TaskCreator::new(config.defaults.clone());
    let report = creator.create_all_with(&parsed.records, tracker, map, |record, outcome| {
        println!("Creating {}: {}...", record.id, record.title);
        match outcome {
            CreationOutcome::Created(external) => println!("  ✓ Created: {}", external),
            CreationOutcome::AlreadyMapped(external) => {
                println!("  - Skipped: already mapped to {}", external)
            }
            CreationOutcome::Failed(err) => println!("  ✗ Failed: {}", err),
        }
    });

    println!();
    println!(
        "Created {} tasks ({} already mapped, {} failed, {} blocks not created)",
        report.created(),
        report.already_mapped(),
        report.failed(),
        parsed.dropped
    );
    println!();
    println!("Task mapping:");
    for (id, external) in map.iter() {
        println!("  {} -> {}", id, external);
    }
    println!();
    report
}

fn link_phase(edges: &DependencyTable, tracker: &mut dyn Tracker, map: &IdMap) -> ApplyReport {
    println!("Adding dependencies");
    println!("{}", RULE);
    println!();

    let lookup = |id: &TaskId| {
        map.get(id)
            .map(ToString::to_string)
            .unwrap_or_else(|| "?".to_string())
    };
    let mut current: Option<TaskId> = None;
    let report = DependencyApplier::apply_with(edges, tracker, map, |edge, outcome| {
        if current.as_ref() != Some(&edge.dependent) {
            println!("{} ({}) depends on:", edge.dependent, lookup(&edge.dependent));
            current = Some(edge.dependent.clone());
        }
        let mark = match outcome {
            EdgeOutcome::Applied => "✓".to_string(),
            EdgeOutcome::Unmapped(missing) => {
                let missing: Vec<String> = missing.iter().map(ToString::to_string).collect();
                format!("✗ missing mapping for {}", missing.join(", "))
            }
            EdgeOutcome::Failed(err) => format!("✗ {}", err),
        };
        println!(
            "  - {} ({}) {}",
            edge.prerequisite,
            lookup(&edge.prerequisite),
            mark
        );
    });

    println!();
    println!(
        "Added {}/{} dependencies",
        report.applied(),
        report.attempted()
    );
    report
}

fn save_map(map: &IdMap, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        map.save(path)?;
        println!("Mapping written to {}", path.display());
    }
    Ok(())
}

fn finish(failed: usize) -> Result<()> {
    if failed > 0 {
        return Err(Error::Incomplete { failed });
    }
    Ok(())
}

fn run_create(config: &Config, document: &Path, args: &RunArgs) -> Result<()> {
    let parsed = load_document(document)?;
    let mut tracker = make_tracker(config, args.dry_run)?;
    let mut map = seeded_map(config, &args.seeds)?;

    let report = create_phase(config, &parsed, tracker.as_mut(), &mut map);
    save_map(&map, args.save_map.as_deref())?;
    finish(report.failed())
}

fn run_link(
    config: &Config,
    document: Option<&Path>,
    map_path: &Path,
    source: EdgeSource,
    dry_run: bool,
) -> Result<()> {
    let records = match document {
        Some(path) => load_document(path)?.records,
        None if source == EdgeSource::Document => {
            return Err(Error::Validation(
                "--edges document needs the plan document".to_string(),
            ));
        }
        None => Vec::new(),
    };

    let mut map = IdMap::load(map_path)?;
    for (id, external) in &config.seed {
        if !map.contains(id) {
            map.insert(id.clone(), external.clone())?;
        }
    }

    let edges = source.select_known(&config.dependencies, &records, &map);
    let mut tracker = make_tracker(config, dry_run)?;
    let report = link_phase(&edges, tracker.as_mut(), &map);
    finish(report.failed())
}

/// Create, save the mapping, then link. A failed save is reported but does
/// not stop the link phase; it is returned once every edge has been tried.
fn import(
    config: &Config,
    parsed: &ParsedDocument,
    tracker: &mut dyn Tracker,
    map: &mut IdMap,
    source: EdgeSource,
    save_path: Option<&Path>,
) -> (RunReport, Result<()>) {
    let creation = create_phase(config, parsed, tracker, map);

    let saved = save_map(map, save_path);
    if let Err(e) = &saved {
        bplog_error!("failed to save mapping: {}", e);
        eprintln!("error: failed to save mapping: {}", e);
        println!();
    }

    let edges = source.select_known(&config.dependencies, &parsed.records, map);
    let dependencies = link_phase(&edges, tracker, map);

    (
        RunReport {
            creation,
            dependencies,
        },
        saved,
    )
}

fn run_full(config: &Config, document: &Path, args: &RunArgs, source: EdgeSource) -> Result<()> {
    let parsed = load_document(document)?;
    let mut tracker = make_tracker(config, args.dry_run)?;
    let mut map = seeded_map(config, &args.seeds)?;

    let (report, saved) = import(
        config,
        &parsed,
        tracker.as_mut(),
        &mut map,
        source,
        args.save_map.as_deref(),
    );
    saved?;
    finish(report.failures())
}

fn run_check(config: &Config, document: &Path) -> Result<()> {
    let parsed = load_document(document)?;
    let derived = DependencyTable::from_records_known(&parsed.records, config.seed.keys());
    let drift = TableDrift::between(&config.dependencies, &derived);

    println!(
        "Config table: {} edges, document: {} edges",
        config.dependencies.edge_count(),
        derived.edge_count()
    );
    if drift.is_empty() {
        println!("No drift: both sources declare the same edges");
        return Ok(());
    }

    if !drift.only_in_table.is_empty() {
        println!();
        println!("Only in config table:");
        for edge in &drift.only_in_table {
            println!("  {}", edge);
        }
    }
    if !drift.only_in_document.is_empty() {
        println!();
        println!("Only in document:");
        for edge in &drift.only_in_document {
            println!("  {}", edge);
        }
    }
    finish(drift.only_in_table.len() + drift.only_in_document.len())
}
