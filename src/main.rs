use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use companion_voice::voice::{RecognitionReceiver, recognition_channel};
use companion_voice::{
    ActivityJournal, CommandCatalog, Config, ConsoleSink, Dispatcher, LineRecognizer,
    PersonaCategory, ResponseTable, SessionDriver, SpeechRecognizer, VoiceInterpreter,
};

/// Companion - voice commands for a medication and caregiving companion
#[derive(Parser)]
#[command(name = "companion", version, about)]
struct Cli {
    /// Persona to speak as (e.g., "june_cleaver"); omit or pass "" for neutral
    #[arg(short, long, env = "COMPANION_PERSONA", global = true)]
    persona: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show which command an utterance matches
    Match {
        /// Spoken text
        #[arg(required = true)]
        utterance: Vec<String>,
    },
    /// Run an utterance through the full command pipeline
    Say {
        /// Spoken text
        #[arg(required = true)]
        utterance: Vec<String>,
    },
    /// Listen for commands, one utterance per line of input
    Listen,
    /// Speak a medication reminder
    Remind {
        /// Medication name
        #[arg(short, long)]
        medication: String,
        /// Dosage (e.g., "10mg")
        #[arg(short, long)]
        dosage: String,
        /// Remind to take it with food
        #[arg(long)]
        with_food: bool,
    },
    /// List the command catalog
    Commands,
    /// List the available personas
    Personas,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,companion_voice=info",
        1 => "info,companion_voice=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.persona.as_deref())?;
    tracing::debug!(?config, "loaded configuration");

    let catalog = match &config.commands_path {
        Some(path) => CommandCatalog::load(path)?,
        None => CommandCatalog::reference(),
    };
    let responses = match &config.responses_path {
        Some(path) => ResponseTable::load(path)?,
        None => ResponseTable::embedded()?,
    };

    match cli.command {
        Command::Match { utterance } => {
            let utterance = utterance.join(" ").to_lowercase();
            let result = catalog.match_utterance(&utterance);
            match result.action {
                Some(action) => println!("{action} ({:.2})", result.score),
                None => println!("no match"),
            }
            Ok(())
        }
        Command::Commands => {
            for rule in catalog.rules() {
                println!(
                    "{:<18} {:.2}  {}",
                    rule.action.as_str(),
                    rule.confidence,
                    rule.patterns.join(", ")
                );
            }
            Ok(())
        }
        Command::Personas => {
            let roster = responses.roster();
            for category in PersonaCategory::ALL {
                println!("{category:?}");
                for persona in roster.by_category(category) {
                    println!("  {:<20} {:<22} {}", persona.id, persona.display_name, persona.era);
                }
            }
            Ok(())
        }
        Command::Say { utterance } => {
            let (interpreter, _events) = build(&config, catalog, responses)?;
            let outcome = interpreter.process_text(&utterance.join(" ")).await;
            tracing::info!(%outcome, "command finished");
            Ok(())
        }
        Command::Remind {
            medication,
            dosage,
            with_food,
        } => {
            let (interpreter, _events) = build(&config, catalog, responses)?;
            interpreter.remind(&medication, &dosage, with_food).await;
            Ok(())
        }
        Command::Listen => {
            let (interpreter, events) = build(&config, catalog, responses)?;
            interpreter.greet().await;

            let mut driver = SessionDriver::new(interpreter, events, config.session.auto_stop);
            let sessions = driver.run().await;
            tracing::info!(sessions, "companion stopped listening");
            Ok(())
        }
    }
}

/// Assemble an interpreter speaking to the console and hearing standard input
fn build(
    config: &Config,
    catalog: CommandCatalog,
    responses: ResponseTable,
) -> anyhow::Result<(VoiceInterpreter, RecognitionReceiver)> {
    let speaker = responses
        .roster()
        .select(config.persona.as_deref())?
        .map_or_else(|| "Companion".to_string(), |p| p.display_name.clone());

    let (tx, rx) = recognition_channel();
    let recognizer: Arc<dyn SpeechRecognizer> = Arc::new(LineRecognizer::stdin(tx));
    let sink = Arc::new(ConsoleSink::new(&config.synthesis, speaker));
    let dispatcher = Dispatcher::with_defaults(Arc::new(ActivityJournal::new()));

    let interpreter = VoiceInterpreter::new(
        catalog,
        recognizer,
        sink,
        Arc::new(responses),
        dispatcher,
    )
    .with_persona(config.persona.clone())
    .with_recognizer_config(config.recognizer.clone());

    Ok((interpreter, rx))
}
