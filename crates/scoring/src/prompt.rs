use std::sync::OnceLock;

use minijinja::{Environment, context};

use riftcoach_core::request::UserProfile;
use riftcoach_core::{GameMode, MatchBundle, PlayerScore};
use riftcoach_llm::CompletionRequest;

const SYSTEM_TEMPLATE: &str = "\
You are a supportive esports performance coach. Address {{ display_name }} in {{ language }} \
with a {{ tone }} tone.
{% if mode == \"arena\" -%}
This was a round-based duo match. Talk only about what happened in the rounds that were \
played. Never mention win rates, tier rankings, or predictions about future rounds.
{%- elif mode == \"blind_mode\" -%}
This was a single-lane brawl: there is no warding or objective play to discuss.
{%- else -%}
Cover fighting, economy, vision, objectives, and teamwork as the numbers warrant.
{%- endif %}
Respond with exactly one JSON object: {\"narrative\": string, \"tts_summary\": string (one or \
two spoken sentences), \"highlights\": [string], \"improvements\": [string]}.";

const USER_TEMPLATE: &str = "\
Match {{ match_id }} ({{ duration_minutes }} minutes, {{ participant_count }} players).
{{ display_name }} played {{ champion }} and {{ result }}. K/D/A {{ kills }}/{{ deaths }}/{{ assists }}.
Performance scores (0-100):
{% for line in score_lines %}{{ line }}
{% endfor -%}
Write the coaching narrative for {{ display_name }}.";

fn environment() -> &'static Environment<'static> {
    static ENV: OnceLock<Environment<'static>> = OnceLock::new();
    ENV.get_or_init(|| {
        let mut env = Environment::new();
        env.add_template("system", SYSTEM_TEMPLATE)
            .expect("system template must parse");
        env.add_template("user", USER_TEMPLATE)
            .expect("user template must parse");
        env
    })
}

/// One compact score line per participant, listing only the dimensions the
/// mode actually weighs.
fn score_line(score: &PlayerScore, weights: [f64; 5]) -> String {
    let named = [
        ("combat", score.combat),
        ("economy", score.economy),
        ("vision", score.vision),
        ("objectives", score.objectives),
        ("teamplay", score.teamplay),
    ];
    let parts: Vec<String> = named
        .iter()
        .zip(weights)
        .filter(|(_, w)| *w > 0.0)
        .map(|((name, value), _)| format!("{name} {value:.0}"))
        .collect();

    format!(
        "{} ({}): {}, overall {:.1}",
        score.summoner_identifier,
        score.champion,
        parts.join(", "),
        score.overall
    )
}

/// Build the narrator request from scoring evidence.
///
/// Inputs are the serialized score numerics and a compact match summary;
/// raw timeline frames never reach the model.
pub fn build_prompt(
    mode: GameMode,
    bundle: &MatchBundle,
    scores: &[PlayerScore],
    requester_identifier: &str,
    profile: Option<&UserProfile>,
    weights: [f64; 5],
) -> Result<CompletionRequest, minijinja::Error> {
    let requester = bundle
        .detail
        .participant_by_identifier(requester_identifier);

    let display_name = profile
        .and_then(|p| p.display_name.as_deref())
        .unwrap_or(requester_identifier);
    let language = profile
        .and_then(|p| p.language.as_deref())
        .unwrap_or("en");
    let tone = profile.and_then(|p| p.tone.as_deref()).unwrap_or("direct");

    let score_lines: Vec<String> = scores.iter().map(|s| score_line(s, weights)).collect();

    let env = environment();
    let system = env.get_template("system")?.render(context! {
        mode => mode.as_str(),
        display_name => display_name,
        language => language,
        tone => tone,
    })?;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let duration_minutes = bundle.detail.duration_minutes().round() as u64;
    let user = env.get_template("user")?.render(context! {
        match_id => bundle.detail.match_id,
        duration_minutes => duration_minutes,
        participant_count => bundle.detail.participants.len(),
        display_name => display_name,
        champion => requester.map_or("unknown", |p| p.champion.as_str()),
        result => requester.map_or("finished the match", |p| if p.win { "won" } else { "lost" }),
        kills => requester.map_or(0, |p| p.kills),
        deaths => requester.map_or(0, |p| p.deaths),
        assists => requester.map_or(0, |p| p.assists),
        score_lines => score_lines,
    })?;

    Ok(CompletionRequest::new(system, user))
}
