// Card Template CLI
// Render notification card templates and evaluate single expressions

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use serde_json::Value as Json;

use card_template::{evaluate, render, Context, PartialContext};

#[derive(Parser, Debug)]
#[command(
    name = "card-template",
    about = "Render workflow notification card templates",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a template file, replacing {{ expr }} placeholders
    Render(RenderArgs),
    /// Evaluate one expression and print the result
    Eval(EvalArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Template file, or '-' for stdin
    template: PathBuf,

    #[command(flatten)]
    context: ContextArgs,
}

#[derive(Args, Debug)]
struct EvalArgs {
    /// Expression text, e.g. "vars.name == 'demo'"
    expression: String,

    /// Print the result as JSON instead of plain text
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    context: ContextArgs,
}

#[derive(Args, Debug)]
struct ContextArgs {
    /// Context file (.json, .yaml or .yml)
    #[arg(long, short = 'c', value_name = "FILE")]
    context: Option<PathBuf>,

    /// Merge the process environment into the `envs` scope
    #[arg(long)]
    process_env: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Render(args) => {
            let ctx = load_context(&args.context)?;
            let template = read_template(&args.template)?;
            let output = render(&template, &ctx)?;
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
        }
        Command::Eval(args) => {
            let ctx = load_context(&args.context)?;
            let value = evaluate(&args.expression, &ctx)?;
            if args.json {
                println!("{}", value.to_json());
            } else {
                println!("{}", value);
            }
        }
    }

    Ok(())
}

fn load_context(args: &ContextArgs) -> Result<Context> {
    let mut partial = match &args.context {
        Some(path) => read_context_file(path)?,
        None => PartialContext::default(),
    };

    if args.process_env {
        // Context values win over ambient variables of the same name
        let mut envs = partial.envs.take().unwrap_or_default();
        for (key, value) in std::env::vars() {
            envs.entry(key).or_insert(Json::String(value));
        }
        partial.envs = Some(envs);
    }

    Ok(partial.normalize())
}

fn read_context_file(path: &Path) -> Result<PartialContext> {
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("cannot read context file {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&text)
            .wrap_err_with(|| format!("invalid YAML context in {}", path.display())),
        _ => serde_json::from_str(&text)
            .wrap_err_with(|| format!("invalid JSON context in {}", path.display())),
    }
}

fn read_template(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .wrap_err("cannot read template from stdin")?;
        return Ok(buffer);
    }
    fs::read_to_string(path).wrap_err_with(|| format!("cannot read template {}", path.display()))
}
