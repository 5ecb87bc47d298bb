//! `specgen` command-line interface

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use specgen_core::telemetry::{init_tracing, LogFormat};
use specgen_core::{Generator, GeneratorConfig, OutputMode};
use specgen_protocol::AllSpecsResponse;
use specgen_synth::TestFramework;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

fn cli() -> Command {
    Command::new("specgen")
        .version(specgen_core::VERSION)
        .about("Generate test classes from specification engine scenarios")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("text")
                .value_parser(value_parser!(LogFormat))
                .help("Log output format: text or json"),
        )
        .subcommand(
            output_args(
                Command::new("generate")
                    .about("Fetch specifications from the engine and regenerate output")
                    .arg(
                        Arg::new("engine")
                            .long("engine")
                            .help("Engine address, host:port"),
                    ),
            ),
        )
        .subcommand(
            output_args(
                Command::new("render")
                    .about("Regenerate output from a JSON specification dump")
                    .arg(
                        Arg::new("input")
                            .long("input")
                            .short('i')
                            .required(true)
                            .value_parser(value_parser!(PathBuf))
                            .help("JSON file in AllSpecsResponse shape"),
                    ),
            ),
        )
        .subcommand(Command::new("config").about("Print the effective configuration as TOML"))
}

fn output_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("project")
                .long("project")
                .short('p')
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Project file or directory"),
        )
        .arg(
            Arg::new("framework")
                .long("framework")
                .value_parser(value_parser!(TestFramework))
                .help("Test framework: xunit, nunit or mstest"),
        )
        .arg(
            Arg::new("staged")
                .long("staged")
                .action(ArgAction::SetTrue)
                .help("Build in a staging directory and swap on success"),
        )
}

fn load_config(matches: &ArgMatches, args: Option<&ArgMatches>) -> anyhow::Result<GeneratorConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::default(),
    };

    if let Some(args) = args {
        if let Ok(Some(engine)) = args.try_get_one::<String>("engine") {
            config = config.with_engine_address(engine.clone());
        }
        if let Some(framework) = args.get_one::<TestFramework>("framework") {
            config = config.with_framework(*framework);
        }
        if args.get_flag("staged") {
            config = config.with_output_mode(OutputMode::Staged);
        }
    }

    config.validate()?;
    Ok(config)
}

/// Cancel `token` on Ctrl-C
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling run");
            token.cancel();
        }
    });
}

async fn generate(config: &GeneratorConfig, project: &Path) -> anyhow::Result<PathBuf> {
    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let generator = Generator::connect(config).await?;
    Ok(generator.create_or_update(project, &cancel).await?)
}

async fn render(config: &GeneratorConfig, input: &Path, project: &Path) -> anyhow::Result<PathBuf> {
    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let text = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("cannot read {}", input.display()))?;
    let response: AllSpecsResponse = serde_json::from_str(&text)
        .with_context(|| format!("{} is not an AllSpecsResponse", input.display()))?;
    let specifications = response.into_specifications()?;

    Ok(config
        .coordinator()
        .write_specifications(specifications, project, &cancel)
        .await?)
}

async fn run(matches: ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("generate", args)) => {
            let config = load_config(&matches, Some(args))?;
            let project = args.get_one::<PathBuf>("project").context("missing --project")?;
            let output = generate(&config, project).await?;
            println!("{}", output.display());
        }
        Some(("render", args)) => {
            let config = load_config(&matches, Some(args))?;
            let project = args.get_one::<PathBuf>("project").context("missing --project")?;
            let input = args.get_one::<PathBuf>("input").context("missing --input")?;
            let output = render(&config, input, project).await?;
            println!("{}", output.display());
        }
        Some(("config", _)) => {
            let config = load_config(&matches, None)?;
            print!("{}", config.to_toml_string()?);
        }
        _ => unreachable!("subcommand_required"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();

    let format = matches
        .get_one::<LogFormat>("log-format")
        .copied()
        .unwrap_or_default();
    if let Err(e) = init_tracing(format) {
        eprintln!("warning: {e}");
    }

    match run(matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
