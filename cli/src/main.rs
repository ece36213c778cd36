use std::fs::File;
use std::io::{self, BufRead, BufReader};

use clap::{Args, Parser, Subcommand};
use money::{Money, MoneyError};
use propcontrol::{
    BindError, Binder, BoundField, ConfigError, EditKind, EngineConfig, MemoryStore, Parsed, Path, Registry, Store,
};
use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Bind(#[from] BindError),
    #[error("{0}")]
    Money(#[from] MoneyError),
    #[error("cannot read {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("line {line}: invalid JSON: {source}")]
    InvalidLine { line: usize, source: serde_json::Error },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("{0}")]
    EditKind(String),
    #[error("validation failed: {0}")]
    Invalid(String),
}

#[derive(Parser, Debug)]
#[command(name = "propctl", about = "Normalize, validate and migrate form property values")]
struct Cli {
    #[arg(long, help = "Overrides PROPCONTROL_REQUIRE_HTTPS")]
    require_https: Option<bool>,

    #[arg(long, help = "Overrides PROPCONTROL_DEFAULT_CURRENCY")]
    default_currency: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite JSONL monetary payloads in canonical form.
    Migrate(MigrateArgs),
    /// Normalize one raw input for a control type.
    Parse(EditArgs),
    /// Normalize and validate one raw input; exits non-zero on a message.
    Validate(ValidateArgs),
    /// Sum JSONL monetary payloads.
    Total(TotalArgs),
    /// List registered control types.
    Types,
}

#[derive(Args, Debug)]
struct MigrateArgs {
    #[arg(long, default_value = "-", help = "Input file path, or - for stdin")]
    input: String,

    #[arg(long, default_value_t = false, help = "Emit the migration steps alongside each value")]
    report: bool,
}

#[derive(Args, Debug)]
struct EditArgs {
    #[arg(long = "type", help = "Control type tag, e.g. number or Money")]
    tag: String,

    #[arg(long, default_value = "change", help = "change, blur or commit")]
    kind: String,

    #[arg(long = "option", help = "Allowed option; JSON literals are read as JSON")]
    options: Vec<String>,

    #[arg(long, help = "Current stored value as JSON")]
    current: Option<String>,

    raw: String,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    #[command(flatten)]
    edit: EditArgs,

    #[arg(long, default_value_t = false)]
    allow_http: bool,

    #[arg(long, default_value_t = false)]
    required: bool,
}

#[derive(Args, Debug)]
struct TotalArgs {
    #[arg(long, default_value = "-", help = "Input file path, or - for stdin")]
    input: String,

    #[arg(long, help = "Maximum fraction digits in the pretty amount")]
    max_fraction_digits: Option<u8>,
}

const FIELD_PROP: &str = "value";

fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let mut config = EngineConfig::from_env()?;
    if let Some(require_https) = cli.require_https {
        config.require_https = require_https;
    }
    if cli.default_currency.is_some() {
        config.default_currency = cli.default_currency.map(|c| c.trim().to_ascii_uppercase());
    }

    match cli.command {
        Command::Migrate(args) => run_migrate(&args),
        Command::Parse(args) => run_parse(config, &args),
        Command::Validate(args) => run_validate(config, &args),
        Command::Total(args) => run_total(&config, &args),
        Command::Types => {
            print_json(&json!(Registry::builtin().tags()))?;
            Ok(())
        }
    }
}

fn run_migrate(args: &MigrateArgs) -> Result<(), CliError> {
    let mut rewritten = 0usize;
    let values = read_jsonl(&args.input)?;
    for value in &values {
        let (canonical, report) = money::ingest_with_report(value)?;
        if report.changed_canonical() {
            rewritten += 1;
        }
        let out = if args.report {
            let steps: Vec<String> = report.steps.iter().map(|step| format!("{step:?}")).collect();
            json!({ "value": canonical.to_value(), "changed": report.changed_canonical(), "steps": steps })
        } else {
            canonical.to_value()
        };
        println!("{}", serde_json::to_string(&out)?);
    }
    tracing::info!(total = values.len(), rewritten, "migration finished");
    Ok(())
}

fn run_parse(config: EngineConfig, args: &EditArgs) -> Result<(), CliError> {
    let (binder, field, parsed) = apply_edit(config, args, None)?;
    let resolution = binder.resolve(&field)?;
    print_json(&json!({
        "outcome": outcome(&parsed),
        "value": resolution.value,
        "raw": resolution.raw,
        "error": resolution.error,
    }))
}

fn run_validate(config: EngineConfig, args: &ValidateArgs) -> Result<(), CliError> {
    let https = args.allow_http.then_some(false);
    let (binder, mut field, _) = apply_edit(config, &args.edit, https)?;
    if args.required {
        field = field.required();
    }
    let errors = binder.check_submit(std::slice::from_ref(&field))?;
    match errors.into_iter().next() {
        Some(error) => Err(CliError::Invalid(error.message)),
        None => {
            println!("ok");
            Ok(())
        }
    }
}

fn run_total(config: &EngineConfig, args: &TotalArgs) -> Result<(), CliError> {
    let values = read_jsonl(&args.input)?;
    let sum: Money = money::total(&values)?;
    let mut options = config.pretty_options();
    if let Some(digits) = args.max_fraction_digits {
        options.max_fraction_digits = digits;
    }
    print_json(&json!({
        "total": sum.to_value(),
        "pretty": format!("{}{}", sum.symbol().unwrap_or_default(), money::pretty_string(&sum, &options)),
    }))
}

/// Commit `args.raw` to a single field on a fresh in-memory store.
fn apply_edit(
    config: EngineConfig,
    args: &EditArgs,
    https: Option<bool>,
) -> Result<(Binder<MemoryStore>, BoundField, Parsed), CliError> {
    let kind: EditKind = args.kind.parse().map_err(CliError::EditKind)?;
    let mut field = BoundField::with_tag(Path::root(), FIELD_PROP, args.tag.as_str());
    if !args.options.is_empty() {
        let options: Vec<Value> = args.options.iter().map(|o| json_or_text(o)).collect();
        field = field.options(options);
    }
    if let Some(https) = https {
        field = field.https(https);
    }

    let mut store = MemoryStore::new();
    if let Some(current) = &args.current {
        let current = serde_json::from_str::<Value>(current)?;
        store.set_value(&field.proppath(), Some(current), false);
    }

    let mut binder = Binder::with_config(store, Registry::builtin(), config);
    let parsed = binder.commit(&field, args.raw.as_str(), kind)?;
    Ok((binder, field, parsed))
}

fn outcome(parsed: &Parsed) -> Value {
    match parsed {
        Parsed::Unset => json!("unset"),
        Parsed::Value(_) => json!("value"),
        Parsed::Invalid(err) => json!({ "invalid": err.to_string() }),
    }
}

fn json_or_text(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

fn read_jsonl(input: &str) -> Result<Vec<Value>, CliError> {
    let io_err = |source: io::Error| CliError::Io {
        path: input.to_owned(),
        source,
    };
    let reader: Box<dyn BufRead> = if input == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(File::open(input).map_err(io_err)?))
    };

    let mut values = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let value = serde_json::from_str::<Value>(trimmed).map_err(|source| CliError::InvalidLine {
            line: index + 1,
            source,
        })?;
        values.push(value);
    }
    Ok(values)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
