use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use voxcalc::calculator::Operation;
use voxcalc::report::{self, Report};
use voxcalc::session::{Session, shared};
use voxcalc::ui::{Repl, spawn_stdin_reader};
use voxcalc::voice::{
    CommandListener, CommandSpeaker, ConsoleListener, ConsoleSpeaker, Listener, RecordingSpeaker,
    Speaker,
};
use voxcalc::{Config, Dispatcher};

#[derive(Parser, Debug)]
#[command(name = "voxcalc", version)]
#[command(about = "Keypad and voice calculator with derivatives and integrals")]
struct Cli {
    /// Configuration file (defaults to ~/.config/voxcalc/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Print one-shot results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate an expression numerically (trig in degrees)
    Eval { expression: String },
    /// Differentiate an expression with respect to x
    Diff { expression: String },
    /// Integrate an expression with respect to x
    Integrate { expression: String },
    /// Translate a spoken phrase into an expression
    Parse { transcript: String },
    /// Run a spoken command as if it had been heard
    Say { transcript: String },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "voxcalc=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn speaker(config: &Config) -> Arc<dyn Speaker> {
    match &config.voice.speech_command {
        Some(command) => Arc::new(CommandSpeaker::new(command.clone())),
        None => Arc::new(ConsoleSpeaker),
    }
}

fn listener(config: &Config, lines: &flume::Receiver<String>) -> Arc<dyn Listener> {
    let voice = &config.voice;
    match &voice.transcribe_command {
        Some(command) => Arc::new(CommandListener::new(
            command.clone(),
            voice.listen_timeout(),
            voice.calibration(),
        )),
        None => Arc::new(ConsoleListener::new(lines.clone(), voice.listen_timeout())),
    }
}

fn print_report(report: &Report, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", report.to_json()?);
    } else if report.is_error() {
        eprintln!("{}", report);
    } else {
        println!("{}", report);
    }
    Ok(())
}

fn run_interactive(config: &Config) -> anyhow::Result<()> {
    let lines = spawn_stdin_reader();
    let session = shared(Session::new(config.display.precision));
    let (dispatcher, events) = Dispatcher::new(session, listener(config, &lines), speaker(config));
    let mut repl = Repl::new(dispatcher, events, std::io::stdout());
    repl.run(&lines)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let precision = config.display.precision;

    let report = match cli.command {
        None => return run_interactive(&config),
        Some(Commands::Eval { expression }) => report::eval(&expression, precision),
        Some(Commands::Diff { expression }) => report::calculus(&expression, Operation::Differentiate),
        Some(Commands::Integrate { expression }) => report::calculus(&expression, Operation::Integrate),
        Some(Commands::Parse { transcript }) => report::parse(&transcript),
        Some(Commands::Say { transcript }) if cli.json => {
            report::say(&transcript, precision, &RecordingSpeaker::default())
        }
        Some(Commands::Say { transcript }) => {
            report::say(&transcript, precision, speaker(&config).as_ref())
        }
    };

    print_report(&report, cli.json)?;
    if report.is_error() {
        std::process::exit(1);
    }
    Ok(())
}
