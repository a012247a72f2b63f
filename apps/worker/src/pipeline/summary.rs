//! Executive summary synthesis.

use crate::models::score::ScorePayload;

/// Characters of narrative kept when the narrative itself is the summary.
const SUMMARY_CHAR_LIMIT: usize = 500;

/// Builds the record's executive summary: the first ~500 characters of the
/// narrative, or — when no narrative is available — one synthesized sentence
/// referencing score, decision, top strengths, and the leading concern.
pub fn executive_summary(narrative: &str, score: Option<&ScorePayload>) -> String {
    let narrative = narrative.trim();
    if !narrative.is_empty() {
        return truncate_chars(narrative, SUMMARY_CHAR_LIMIT);
    }

    let Some(score) = score else {
        return "Report generated without scoring data.".to_string();
    };

    let recommendations = &score.recommendations;
    let mut summary = format!(
        "{:.0}% match — {}.",
        score.overall_score,
        recommendations.decision.headline()
    );
    let strengths: Vec<&str> = recommendations
        .strengths
        .iter()
        .take(2)
        .map(String::as_str)
        .collect();
    if !strengths.is_empty() {
        summary.push_str(&format!(" Strengths: {}.", strengths.join(", ")));
    }
    if let Some(concern) = recommendations.concerns.first() {
        summary.push_str(&format!(" Main concern: {concern}."));
    }
    summary
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit).collect();
    truncated.push('…');
    truncated
}
