use std::sync::LazyLock;

use regex::Regex;
use shared::protocol::{Prediction, RiskLevel};

static DISEASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:predicted\s+)?(?:disease|outbreak|diagnosis)\s*[:=\-]\s*(.+?)\s*$")
        .expect("disease pattern")
});

static CONFIDENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:confidence|probability|likelihood)\s*[:=\-]?\s*([0-9]+(?:\.[0-9]+)?)\s*(%)?")
        .expect("confidence pattern")
});

static RISK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)risk(?:\s+level)?\s*[:=\-]\s*(low|medium|moderate|high|critical|severe)")
        .expect("risk pattern")
});

static RECOMMENDATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:recommendations?|advice|suggested\s+actions?|actions?)\s*[:=\-]\s*(.+?)\s*$")
        .expect("recommendation pattern")
});

/// Splits the model's free text into the fields the alerts panel renders.
///
/// A confidence written as a fraction (`0.82`) is scaled to a percentage.
/// Fields the text does not mention stay `None`; `raw` always carries the
/// trimmed input.
pub fn parse_prediction(text: &str) -> Prediction {
    let disease = DISEASE_RE
        .captures(text)
        .map(|caps| caps[1].trim_matches(|c: char| c == '*' || c.is_whitespace()).to_string())
        .filter(|value| !value.is_empty());

    let confidence = CONFIDENCE_RE.captures(text).and_then(|caps| {
        let value: f64 = caps[1].parse().ok()?;
        let has_percent = caps.get(2).is_some();
        let scaled = if !has_percent && value <= 1.0 {
            value * 100.0
        } else {
            value
        };
        (0.0..=100.0).contains(&scaled).then_some(scaled)
    });

    let risk = RISK_RE
        .captures(text)
        .and_then(|caps| risk_level(&caps[1]));

    let recommendation = RECOMMENDATION_RE
        .captures(text)
        .map(|caps| caps[1].to_string())
        .filter(|value| !value.is_empty());

    Prediction {
        disease,
        confidence,
        risk,
        recommendation,
        raw: text.trim().to_string(),
    }
}

fn risk_level(word: &str) -> Option<RiskLevel> {
    match word.to_ascii_lowercase().as_str() {
        "low" => Some(RiskLevel::Low),
        "medium" | "moderate" => Some(RiskLevel::Medium),
        "high" => Some(RiskLevel::High),
        "critical" | "severe" => Some(RiskLevel::Critical),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/parse_tests.rs"]
mod tests;
