//! CLI tool turning object notation expressions into YAML or JSON.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use yo_rs::{ContextError, Engine, Format, RenderError, SyntaxError};

#[derive(Parser)]
#[command(name = "yo", version)]
#[command(about = "Turn one-line object notation expressions into YAML or JSON")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate an expression and print the resulting documents
    Eval(EvalArgs),
    /// List the builtin functions usable inside ( ... )
    Funcs,
    /// Print the version
    Version,
}

#[derive(Args)]
struct EvalArgs {
    /// Output JSON instead of YAML
    #[arg(short, long)]
    json: bool,

    /// Values file (YAML or JSON, `-` for stdin); repeatable
    #[arg(short = 'f', long = "values", value_name = "FILE")]
    values: Vec<PathBuf>,

    /// Set values on the command line: key1=val1,key2=val2; repeatable
    #[arg(long, value_name = "K=V")]
    set: Vec<String>,

    /// Expression; read line by line from stdin when omitted
    expr: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Context(#[from] ContextError),
    #[error("{0}")]
    Syntax(#[from] SyntaxError),
    #[error("{0}")]
    Render(#[from] RenderError),
    #[error("{0}")]
    Io(#[from] io::Error),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("YO_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Eval(args) => eval(&args),
        Command::Funcs => funcs(),
        Command::Version => write_out(&format!("{}\n", env!("CARGO_PKG_VERSION"))),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn eval(args: &EvalArgs) -> Result<(), CliError> {
    let data = yo_rs::assemble(&args.values, &args.set)?;
    let mut engine = Engine::new(yo_rs::seed_from_entropy());

    let documents = if args.expr.is_empty() {
        let lines = io::stdin().lock().lines().collect::<Result<Vec<_>, _>>()?;
        yo_rs::parse_lines(lines, &data, &mut engine)?
    } else {
        yo_rs::parse_with(&args.expr.join(" "), &data, &mut engine)?
    };

    let format = if args.json { Format::Json } else { Format::Yaml };
    let values: Vec<_> = documents.iter().map(yo_rs::Generator::materialize).collect();
    tracing::debug!(documents = values.len(), %format, "rendering");
    write_out(&yo_rs::render(&values, format)?)
}

fn funcs() -> Result<(), CliError> {
    let engine = Engine::new(0);
    let functions = engine.functions();
    let width = functions.iter().map(|b| b.name.len()).max().unwrap_or(0);

    let mut out = String::new();
    for builtin in functions.iter() {
        out.push_str(&format!(
            "{:<width$}  {}\n{:<width$}  usage: {}\n",
            builtin.name, builtin.summary, "", builtin.usage
        ));
    }
    write_out(&out)
}

fn write_out(text: &str) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
