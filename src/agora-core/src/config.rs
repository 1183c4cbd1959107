//! Configuration module for loading TOML config files.
//!
//! Supplies the static per-agent text templates and tunable debate
//! parameters. The CLI applies flag overrides on top of the loaded (or
//! embedded default) configuration; the core only ever sees resolved
//! values.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::DebateError;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub debate: DebateSettings,
    pub agents: AgentsConfig,
}

/// Global debate parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct DebateSettings {
    pub theme: String,
    pub opponent_a_stance: String,
    pub opponent_b_stance: String,
    /// Statements each debater is entitled to make.
    pub total_rounds: u32,
    pub rules: String,
    pub language: String,
    /// Chat model for the reasoning backend.
    pub chat_model: String,
    /// Speech renderer engine identifier.
    pub speech_engine: String,
}

/// One profile per participant role.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentsConfig {
    pub introducer: AgentProfile,
    pub opponent_a: AgentProfile,
    pub opponent_b: AgentProfile,
    pub mediator: AgentProfile,
    pub judge: AgentProfile,
}

/// Static configuration for one participant.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentProfile {
    pub default_name: String,
    pub prompt_template: String,
    pub tts_voice: String,
    /// Debater speaking style; unused for the other roles.
    #[serde(default)]
    pub temperament: String,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DebateError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| DebateError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, DebateError> {
        toml::from_str(content)
            .map_err(|e| DebateError::Config(format!("Failed to parse config: {e}")))
    }

    pub fn introducer_prompt(&self, agent_name: &str) -> String {
        render(
            &self.agents.introducer.prompt_template,
            &[
                ("agent_name", agent_name),
                ("debate_theme", &self.debate.theme),
                ("debate_rules", &self.debate.rules),
                ("language", &self.debate.language),
            ],
        )
    }

    pub fn opponent_prompt(&self, profile: &AgentProfile, name: &str, stance: &str) -> String {
        let role_description = format!(
            "You argue persuasively {} the debate theme: '{}'.",
            stance, self.debate.theme
        );
        render(
            &profile.prompt_template,
            &[
                ("name", name),
                ("temperament", &profile.temperament),
                ("role_description", &role_description),
                ("debate_theme", &self.debate.theme),
                ("debate_rules", &self.debate.rules),
                ("language", &self.debate.language),
            ],
        )
    }

    pub fn mediator_prompt(
        &self,
        agent_name: &str,
        opponent_a_name: &str,
        opponent_b_name: &str,
        judge_name: &str,
    ) -> String {
        render(
            &self.agents.mediator.prompt_template,
            &[
                ("agent_name", agent_name),
                ("opponent_a_name", opponent_a_name),
                ("opponent_b_name", opponent_b_name),
                ("judge_name", judge_name),
                ("language", &self.debate.language),
                ("total_rounds", &self.debate.total_rounds.to_string()),
                ("debate_rules", &self.debate.rules),
            ],
        )
    }

    pub fn judge_prompt(
        &self,
        agent_name: &str,
        opponent_a_name: &str,
        opponent_b_name: &str,
    ) -> String {
        render(
            &self.agents.judge.prompt_template,
            &[
                ("agent_name", agent_name),
                ("opponent_a_name", opponent_a_name),
                ("opponent_b_name", opponent_b_name),
                ("language", &self.debate.language),
            ],
        )
    }
}

/// Replace `{key}` placeholders in a template.
fn render(template: &str, pairs: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in pairs {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

/// Default configuration embedded in the binary.
pub fn default_config() -> Config {
    Config {
        debate: DebateSettings {
            theme: "Should artificial intelligence development be regulated by governments?"
                .to_string(),
            opponent_a_stance: "in favor of".to_string(),
            opponent_b_stance: "against".to_string(),
            total_rounds: 2,
            rules: "Keep statements concise, address the opponent's last argument, and \
                    never interrupt out of turn."
                .to_string(),
            language: "English".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            speech_engine: "kokoro".to_string(),
        },
        agents: AgentsConfig {
            introducer: AgentProfile {
                default_name: "Herald".to_string(),
                prompt_template: DEFAULT_INTRODUCER_PROMPT.to_string(),
                tts_voice: "af_sky".to_string(),
                temperament: String::new(),
            },
            opponent_a: AgentProfile {
                default_name: "Aurelia".to_string(),
                prompt_template: DEFAULT_OPPONENT_PROMPT.to_string(),
                tts_voice: "bf_emma".to_string(),
                temperament: "calm and analytical".to_string(),
            },
            opponent_b: AgentProfile {
                default_name: "Magnus".to_string(),
                prompt_template: DEFAULT_OPPONENT_PROMPT.to_string(),
                tts_voice: "bm_george".to_string(),
                temperament: "passionate and combative".to_string(),
            },
            mediator: AgentProfile {
                default_name: "Mediator".to_string(),
                prompt_template: DEFAULT_MEDIATOR_PROMPT.to_string(),
                tts_voice: "af_nicole".to_string(),
                temperament: String::new(),
            },
            judge: AgentProfile {
                default_name: "Judge Solon".to_string(),
                prompt_template: DEFAULT_JUDGE_PROMPT.to_string(),
                tts_voice: "am_michael".to_string(),
                temperament: String::new(),
            },
        },
    }
}

const DEFAULT_INTRODUCER_PROMPT: &str = r#"You are {agent_name}, the host opening a formal debate.

DEBATE THEME: {debate_theme}
DEBATE RULES: {debate_rules}

Welcome the audience, present the theme, and summarize the rules in two or
three sentences. Speak in {language}. Do not argue for either side and do
not acknowledge being an AI. Output only your spoken words, with no stage
directions and no markdown formatting.
"#;

const DEFAULT_OPPONENT_PROMPT: &str = r#"You are {name}, a debater in a formal moderated debate.

DEBATE THEME: {debate_theme}
YOUR POSITION: {role_description}
YOUR TEMPERAMENT: {temperament}
DEBATE RULES: {debate_rules}

Speak in {language}. Present clear, compelling arguments supported by
evidence and reasoning, and address your opponent's most recent points.
Stay fully in character and never acknowledge being an AI. Output only
your spoken words, with no stage directions, no text in parentheses, and
no markdown formatting.
"#;

const DEFAULT_MEDIATOR_PROMPT: &str = r#"You are {agent_name}, the mediator of a formal debate between
{opponent_a_name} and {opponent_b_name}, with {judge_name} presiding as judge.

Each debater is entitled to {total_rounds} statements. DEBATE RULES: {debate_rules}

When asked, produce a single short transition announcement in {language}:
name who speaks next, or hand the floor to the judge when the rounds are
complete. One or two sentences, neutral in tone, no commentary on the
arguments themselves. Output only your spoken words.
"#;

const DEFAULT_JUDGE_PROMPT: &str = r#"You are {agent_name}, the judge of a formal debate between
{opponent_a_name} and {opponent_b_name}.

When the debate ends you deliver the verdict in {language}: weigh the
strength of each side's arguments, explain your reasoning in a short
paragraph, and declare the winner. The final line of your reply must be
exactly one of:

WINNER: {opponent_a_name}
WINNER: {opponent_b_name}
WINNER: DRAW

Output only your spoken words followed by that final line.
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_renders_introducer_prompt() {
        let config = default_config();
        let prompt = config.introducer_prompt("Herald");

        assert!(prompt.contains("You are Herald"));
        assert!(prompt.contains(&config.debate.theme));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn opponent_prompt_carries_stance_and_temperament() {
        let config = default_config();
        let prompt = config.opponent_prompt(&config.agents.opponent_a, "Aurelia", "in favor of");

        assert!(prompt.contains("You argue persuasively in favor of"));
        assert!(prompt.contains("calm and analytical"));
    }

    #[test]
    fn mediator_prompt_names_all_parties() {
        let config = default_config();
        let prompt = config.mediator_prompt("Mediator", "Aurelia", "Magnus", "Judge Solon");

        assert!(prompt.contains("Aurelia"));
        assert!(prompt.contains("Magnus"));
        assert!(prompt.contains("Judge Solon"));
        assert!(prompt.contains("entitled to 2 statements"));
    }

    #[test]
    fn judge_prompt_pins_the_winner_line() {
        let config = default_config();
        let prompt = config.judge_prompt("Judge Solon", "Aurelia", "Magnus");

        assert!(prompt.contains("WINNER: Aurelia"));
        assert!(prompt.contains("WINNER: DRAW"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let toml = r#"
[debate]
theme = "Cats versus dogs"
opponent_a_stance = "for cats"
opponent_b_stance = "for dogs"
total_rounds = 3
rules = "Be kind."
language = "English"
chat_model = "gpt-4o-mini"
speech_engine = "kokoro"

[agents.introducer]
default_name = "Host"
prompt_template = "You are {agent_name}."
tts_voice = "af_sky"

[agents.opponent_a]
default_name = "Whiskers"
prompt_template = "You are {name}, {temperament}."
tts_voice = "bf_emma"
temperament = "smug"

[agents.opponent_b]
default_name = "Rex"
prompt_template = "You are {name}."
tts_voice = "bm_george"

[agents.mediator]
default_name = "Ref"
prompt_template = "You are {agent_name}."
tts_voice = "af_nicole"

[agents.judge]
default_name = "Arbiter"
prompt_template = "You are {agent_name}."
tts_voice = "am_michael"
"#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.debate.total_rounds, 3);
        assert_eq!(config.agents.opponent_a.temperament, "smug");
        // Temperament is optional and defaults to empty.
        assert_eq!(config.agents.opponent_b.temperament, "");
    }

    #[test]
    fn malformed_config_is_a_config_error() {
        let result = Config::from_toml("not even toml [");
        assert!(matches!(result, Err(DebateError::Config(_))));
    }
}
