//! Agora CLI - moderated AI debates.
//!
//! Wires five AI participants (introducer, two debaters, mediator,
//! judge) into a debate run, renders the transcript stream to the
//! console, and optionally speaks it aloud.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use agora_core::{
    default_config, Config, DebateEvent, DebateRunner, LlmClient, RunOptions, SpeechRenderer,
};
use clap::Parser;
use colored::Colorize;

#[derive(Parser)]
#[command(
    name = "agora",
    version,
    about = "Moderated AI debates with a mediator and a judge",
    long_about = "Runs a turn-based debate between two AI debaters, coordinated by a \
                  mediator and settled by a judge, using OpenAI-compatible APIs."
)]
struct Cli {
    /// Path to a TOML config file (embedded defaults are used otherwise)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the debate theme
    #[arg(long, value_name = "THEME")]
    theme: Option<String>,

    /// Override the stance argued by opponent A
    #[arg(long, value_name = "STANCE")]
    opponent_a_stance: Option<String>,

    /// Override the stance argued by opponent B
    #[arg(long, value_name = "STANCE")]
    opponent_b_stance: Option<String>,

    /// Override the name of opponent A
    #[arg(long, value_name = "NAME")]
    opponent_a_name: Option<String>,

    /// Override the name of opponent B
    #[arg(long, value_name = "NAME")]
    opponent_b_name: Option<String>,

    /// Override the temperament of opponent A
    #[arg(long, value_name = "TEMPERAMENT")]
    opponent_a_temperament: Option<String>,

    /// Override the temperament of opponent B
    #[arg(long, value_name = "TEMPERAMENT")]
    opponent_b_temperament: Option<String>,

    /// Override the number of statements each debater makes
    #[arg(short, long, value_name = "ROUNDS")]
    rounds: Option<u32>,

    /// Override the debate rules
    #[arg(long, value_name = "RULES")]
    rules: Option<String>,

    /// Override the debate language
    #[arg(long, value_name = "LANGUAGE")]
    language: Option<String>,

    /// Override the chat model
    #[arg(short, long, value_name = "MODEL")]
    model: Option<String>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Disable mediator transition announcements
    #[arg(long)]
    no_mediator_speech: bool,

    /// Disable audible speech entirely
    #[arg(long)]
    no_speech: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => default_config(),
    };
    apply_overrides(&mut config, &cli)?;

    // The reasoning backend credential is required before any debate
    // state is created.
    let api_base = env::var("OPENAI_API_BASE")
        .or_else(|_| env::var("OPENAI_BASE_URL"))
        .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
    let api_key = match env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => {
            eprintln!(
                "{} OPENAI_API_KEY is not set; it is required for the reasoning backend.",
                "Error:".red().bold()
            );
            std::process::exit(1);
        }
    };

    print_setup(&config);

    // Speech is optional: a failed engine init degrades to a silent run.
    let speech = if cli.no_speech {
        None
    } else {
        match SpeechRenderer::new().await {
            Ok(renderer) => Some(renderer.spawn()),
            Err(e) => {
                eprintln!("{}", format!("Warning: speech disabled ({e}).").yellow());
                None
            }
        }
    };

    let backend = Arc::new(LlmClient::new(
        api_base,
        api_key,
        config.debate.chat_model.clone(),
    ));
    let options = RunOptions {
        mediator_speech: !cli.no_mediator_speech,
    };
    let (runner, mut rx) = DebateRunner::new(&config, backend, speech, options)?;

    println!();
    println!("{}", "--- Starting Debate ---".cyan().bold());

    let opponent_a_name = config.agents.opponent_a.default_name.clone();
    let handle = tokio::spawn(runner.run());

    let mut judgment_seen = false;
    while let Some(event) = rx.recv().await {
        if matches!(event, DebateEvent::Judgment { .. }) {
            judgment_seen = true;
        }
        render_event(&event, &opponent_a_name);
    }

    println!();
    println!("{}", "--- End of Debate ---".cyan().bold());

    match handle.await? {
        Ok(final_state) => {
            println!();
            println!("{}", "--- Final Debate State ---".cyan());
            let value = serde_json::to_value(&final_state)?;
            if let Some(map) = value.as_object() {
                for (key, val) in map {
                    println!("{key}: {val}");
                }
            }
        }
        Err(e) if judgment_seen => {
            // The judgment is already delivered and printed; a failure
            // retrieving the final state is only a warning.
            eprintln!(
                "{}",
                format!("Warning: could not retrieve final debate state ({e}).").yellow()
            );
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

/// Apply CLI flag overrides onto the loaded configuration.
fn apply_overrides(config: &mut Config, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(theme) = &cli.theme {
        config.debate.theme = theme.clone();
    }
    if let Some(stance) = &cli.opponent_a_stance {
        config.debate.opponent_a_stance = stance.clone();
    }
    if let Some(stance) = &cli.opponent_b_stance {
        config.debate.opponent_b_stance = stance.clone();
    }
    if let Some(name) = &cli.opponent_a_name {
        config.agents.opponent_a.default_name = name.clone();
    }
    if let Some(name) = &cli.opponent_b_name {
        config.agents.opponent_b.default_name = name.clone();
    }
    if let Some(temperament) = &cli.opponent_a_temperament {
        config.agents.opponent_a.temperament = temperament.clone();
    }
    if let Some(temperament) = &cli.opponent_b_temperament {
        config.agents.opponent_b.temperament = temperament.clone();
    }
    if let Some(rounds) = cli.rounds {
        if rounds == 0 {
            return Err("--rounds must be at least 1".into());
        }
        config.debate.total_rounds = rounds;
    }
    if let Some(rules) = &cli.rules {
        config.debate.rules = rules.clone();
    }
    if let Some(language) = &cli.language {
        config.debate.language = language.clone();
    }
    if let Some(model) = &cli.model {
        config.debate.chat_model = model.clone();
    }
    Ok(())
}

/// Print the effective debate configuration before the run starts.
fn print_setup(config: &Config) {
    println!("{}", "--- Debate Setup ---".cyan().bold());
    println!("{}", "Effective Debate Configuration:".bold());
    println!("  Debate Theme: {}", config.debate.theme.bright_white());
    println!(
        "  Opponent A ('{}') Stance: {}",
        config.agents.opponent_a.default_name.blue(),
        config.debate.opponent_a_stance
    );
    println!(
        "  Opponent A Temperament: {}",
        config.agents.opponent_a.temperament
    );
    println!(
        "  Opponent B ('{}') Stance: {}",
        config.agents.opponent_b.default_name.red(),
        config.debate.opponent_b_stance
    );
    println!(
        "  Opponent B Temperament: {}",
        config.agents.opponent_b.temperament
    );
    println!("  Total Rounds: {}", config.debate.total_rounds);
    println!("  Debate Rules: {}", config.debate.rules);
    println!("  Language: {}", config.debate.language);
    println!("  Chat Model: {}", config.debate.chat_model.dimmed());
    println!("  Speech Engine: {}", config.debate.speech_engine.dimmed());
    println!("---");
}

/// Render one transcript event to the console.
fn render_event(event: &DebateEvent, opponent_a_name: &str) {
    match event {
        DebateEvent::Introduction { speaker, text } => {
            println!();
            println!(
                "{}",
                format!("📜 Introduction ({speaker}):").magenta().bold()
            );
            print_wrapped(text);
        }
        DebateEvent::Statement { speaker, text } => {
            println!();
            let header = format!("💬 {speaker}:");
            if speaker == opponent_a_name {
                println!("{}", header.blue().bold());
            } else {
                println!("{}", header.red().bold());
            }
            print_wrapped(text);
        }
        DebateEvent::MediatorAnnouncement { speaker, text } => {
            println!();
            println!("{}", format!("🗣️  {speaker} (Mediator):").cyan().bold());
            print_wrapped(text);
        }
        DebateEvent::Judgment {
            speaker,
            text,
            winner,
        } => {
            println!();
            println!("{}", format!("⚖️  Judge ({speaker}):").yellow().bold());
            print_wrapped(text);
            println!(
                "{} {}",
                "🏆 Declared Winner:".yellow().bold(),
                winner.to_string().bright_white()
            );
        }
        DebateEvent::Log { message, level } => {
            println!("{}", format!("[{level}] {message}").dimmed());
        }
    }
}

fn print_wrapped(text: &str) {
    for line in textwrap(text, 72).lines() {
        println!("  {line}");
    }
}

/// Simple text wrapping function.
fn textwrap(text: &str, width: usize) -> String {
    let mut result = String::new();
    let mut current_line_len = 0;

    for word in text.split_whitespace() {
        if current_line_len + word.len() + 1 > width && current_line_len > 0 {
            result.push('\n');
            current_line_len = 0;
        }
        if current_line_len > 0 {
            result.push(' ');
            current_line_len += 1;
        }
        result.push_str(word);
        current_line_len += word.len();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn textwrap_respects_width() {
        let text = "one two three four five six seven eight nine ten";
        for line in textwrap(text, 12).lines() {
            assert!(line.len() <= 12);
        }
    }

    #[test]
    fn textwrap_keeps_all_words() {
        let text = "alpha beta gamma delta";
        let wrapped = textwrap(text, 10);
        assert_eq!(wrapped.split_whitespace().count(), 4);
    }
}
