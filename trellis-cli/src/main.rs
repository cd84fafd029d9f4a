use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use trellis::{CompileOptions, DataResponse, RequestParams, SimpleResponse, Trellis};
use trellis_api::Schema;
use trellis_query::ServerTimeZone;

#[derive(Parser)]
#[command(name = "trellis", version, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile request parameters into a selection tree
    Compile(CompileArgs),
}

#[derive(Parser)]
struct CompileArgs {
    /// Schema description (JSON)
    #[arg(long)]
    schema: PathBuf,

    /// Root entity name
    #[arg(long)]
    entity: String,

    /// Compiler options (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Include spec: a path, an include object, or a JSON array (repeatable)
    #[arg(long)]
    include: Vec<String>,

    /// Exclude spec: a path or a JSON array of paths (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// Sort spec: a path or a JSON array of {property, direction}
    #[arg(long)]
    sort: Option<String>,

    /// ASC or DESC, for a simple sort
    #[arg(long)]
    direction: Option<String>,

    /// Filter spec: {"exp": ..., "params": {...}} or a bare expression
    #[arg(long, alias = "cayenne-exp")]
    filter: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    start: Option<i64>,

    #[arg(long, allow_hyphen_values = true)]
    limit: Option<i64>,

    /// Server time zone: "local", "UTC" or a fixed offset like "-08:00"
    #[arg(long, allow_hyphen_values = true)]
    time_zone: Option<ServerTimeZone>,

    /// Records to encode (JSON array); prints the data envelope instead of the tree
    #[arg(long)]
    data: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short)]
    verbose: bool,
}

impl CompileArgs {
    fn request_params(&self) -> RequestParams {
        RequestParams {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            sort: self.sort.clone(),
            direction: self.direction.clone(),
            filter: self.filter.clone(),
            start: self.start,
            limit: self.limit,
        }
    }

    fn options(&self) -> Result<CompileOptions> {
        let mut options = match &self.config {
            Some(path) => serde_json::from_str(&read(path)?)
                .with_context(|| format!("invalid config file {}", path.display()))?,
            None => CompileOptions::default(),
        };
        if let Some(time_zone) = self.time_zone {
            options = options.with_time_zone(time_zone);
        }
        Ok(options)
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_records(path: &Path) -> Result<Vec<serde_json::Value>> {
    let value: serde_json::Value = serde_json::from_str(&read(path)?)
        .with_context(|| format!("invalid data file {}", path.display()))?;
    match value {
        serde_json::Value::Array(records) => Ok(records),
        _ => bail!("data file {} must hold a JSON array", path.display()),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Returns whether the request compiled.
fn run_compile(args: CompileArgs) -> Result<bool> {
    init_logging(args.verbose)?;

    let options = args.options()?;
    let schema = Schema::from_json(&read(&args.schema)?)
        .with_context(|| format!("invalid schema file {}", args.schema.display()))?;
    let trellis = Trellis::new(schema, options);
    let params = args.request_params();
    debug!(entity = %args.entity, "compiling request");

    let (compiled, body) = match trellis.select(&args.entity, &params) {
        Ok(tree) => match &args.data {
            Some(path) => {
                let response = DataResponse::new(tree, read_records(path)?);
                (true, response.encode(trellis.schema()))
            }
            None => (true, serde_json::to_value(&tree)?),
        },
        Err(e) => (false, SimpleResponse::from(&e).to_json()),
    };

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &body)?;
    stdout.write_all(b"\n")?;
    Ok(compiled)
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Compile(args) => run_compile(args),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{e:#}");
            std::process::exit(1);
        }
    }
}
