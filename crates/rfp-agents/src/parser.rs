//! Tolerant extraction of a verdict from free-form backend output.
//!
//! The reply is expected to follow a four-label grammar (see
//! [`crate::prompts`]), but models drift: labels go missing, fields arrive in
//! another order, verdict tokens leak into the description. Every field is
//! extracted independently and defaults when absent, so parsing never fails.

use std::sync::LazyLock;

use regex::Regex;
use requirements::{AnalysisResult, SourceReference, Verdict};

/// Title given to the single extracted reference link.
pub const SOURCE_TITLE: &str = "Technical Documentation";

const MIN_MODEL_CHARS: usize = 3;
const MODEL_PLACEHOLDERS: [&str; 4] = ["n/a", "vazio", "empty", "vacío"];

static VERDICT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Atende:[^\S\n]*(Sim|Yes|Sí|Si|Não|Nao|No|Parcial|Partial)")
        .expect("VERDICT_RE regex should compile")
});

static MODEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Modelo:[^\S\n]*(.*)").expect("MODEL_RE regex should compile")
});

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Link de refer[eê]ncia:[^\S\n]*(https?://\S+)")
        .expect("LINK_RE regex should compile")
});

static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)Descri(?:c|ç)(?:a|ã)o:\s*(.*)$").expect("DESCRIPTION_RE regex should compile")
});

/// Labelled segments removed when no description label is present.
static LABELLED_SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Atende|Modelo|Link de refer[eê]ncia):.*\n?")
        .expect("LABELLED_SEGMENT_RE regex should compile")
});

static LEADING_VERDICT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:Sim|Não|Nao|Yes|No|Sí|Si)\b[\s,.:;-]*")
        .expect("LEADING_VERDICT_RE regex should compile")
});

/// Fields extracted from one reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReply {
    pub verdict: Verdict,
    pub model: Option<String>,
    pub link: Option<String>,
    pub description: String,
}

impl ParsedReply {
    /// Attach the manufacturer and materialize the sources list.
    pub fn into_result(self, manufacturer: &str) -> AnalysisResult {
        let sources = self
            .link
            .map(|uri| {
                vec![SourceReference {
                    title: SOURCE_TITLE.to_string(),
                    uri,
                }]
            })
            .unwrap_or_default();
        AnalysisResult {
            verdict: self.verdict,
            manufacturer: manufacturer.to_string(),
            description: self.description,
            sources,
            suggested_model: self.model,
        }
    }
}

fn parse_verdict(text: &str) -> Verdict {
    let Some(caps) = VERDICT_RE.captures(text) else {
        return Verdict::Indeterminate;
    };
    match caps[1].to_lowercase().as_str() {
        "sim" | "yes" | "sí" | "si" => Verdict::Yes,
        "não" | "nao" | "no" => Verdict::No,
        _ => Verdict::Partial,
    }
}

fn parse_model(text: &str) -> Option<String> {
    let caps = MODEL_RE.captures(text)?;
    let model = caps[1].trim();
    let lower = model.to_lowercase();
    if model.chars().count() < MIN_MODEL_CHARS
        || MODEL_PLACEHOLDERS.iter().any(|p| lower.contains(p))
    {
        return None;
    }
    Some(model.to_string())
}

fn parse_link(text: &str) -> Option<String> {
    let caps = LINK_RE.captures(text)?;
    let link = caps[1].trim();
    let link = link
        .strip_suffix('.')
        .or_else(|| link.strip_suffix(','))
        .unwrap_or(link);
    Some(link.to_string())
}

fn parse_description(text: &str) -> String {
    let description = match DESCRIPTION_RE.captures(text) {
        Some(caps) => caps[1].trim().to_string(),
        None => LABELLED_SEGMENT_RE.replace_all(text, "").trim().to_string(),
    };
    LEADING_VERDICT_RE
        .replace(&description, "")
        .trim()
        .to_string()
}

/// Parse a raw backend reply. Never fails.
pub fn parse_reply(text: &str) -> ParsedReply {
    ParsedReply {
        verdict: parse_verdict(text),
        model: parse_model(text),
        link: parse_link(text),
        description: parse_description(text),
    }
}

/// Parse a reply straight into an [`AnalysisResult`].
pub fn parse_analysis(text: &str, manufacturer: &str) -> AnalysisResult {
    parse_reply(text).into_result(manufacturer)
}
