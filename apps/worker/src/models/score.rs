//! Score payload carried by `MatchScored` events, and the canonical hiring
//! decision type.
//!
//! `Decision` is the single mapping between decision strings and their
//! report wording. No other module may re-interpret decision values.

use serde::{Deserialize, Serialize};

/// The full scoring result attached to a `MatchScored` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorePayload {
    pub overall_score: f64,
    pub skills_score: f64,
    pub experience_score: f64,
    pub education_score: f64,
    pub breakdown: ScoreBreakdown,
    pub matching_skills: Vec<SkillMatch>,
    pub recommendations: RecommendationSet,
    pub analysis_confidence: f64,
    pub processing_time_ms: i64,
    pub scored_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub skills_match: f64,
    pub experience_match: f64,
    pub education_match: f64,
    pub overall_fit: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMatch {
    pub skill: String,
    pub match_score: f64,
    pub match_type: SkillMatchType,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillMatchType {
    Exact,
    Partial,
    Related,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub decision: Decision,
    pub reasoning: String,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub suggestions: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Decision
// ────────────────────────────────────────────────────────────────────────────

/// Canonical hiring decision. Scoring services emit several spellings
/// (`hire`, `strong_hire`, `consider`, `interview`, `reject`, `pass`);
/// everything funnels through `Decision::parse` exactly once at the event
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    StrongHire,
    Hire,
    Interview,
    Consider,
    Reject,
    Pass,
}

impl Decision {
    /// Parses a decision string. Unknown values map to `Consider`, the one
    /// fallback used everywhere.
    pub fn parse(value: &str) -> Decision {
        match value.trim().to_lowercase().as_str() {
            "strong_hire" | "strong-hire" => Decision::StrongHire,
            "hire" => Decision::Hire,
            "interview" => Decision::Interview,
            "consider" => Decision::Consider,
            "reject" => Decision::Reject,
            "pass" => Decision::Pass,
            _ => Decision::Consider,
        }
    }

    /// Stable lowercase label used in records and event payloads.
    pub fn label(&self) -> &'static str {
        match self {
            Decision::StrongHire => "strong_hire",
            Decision::Hire => "hire",
            Decision::Interview => "interview",
            Decision::Consider => "consider",
            Decision::Reject => "reject",
            Decision::Pass => "pass",
        }
    }

    /// Report wording for executive summaries and rendered output.
    pub fn headline(&self) -> &'static str {
        match self {
            Decision::StrongHire => "Strongly recommend hiring",
            Decision::Hire => "Recommend hiring",
            Decision::Interview => "Recommend interviewing",
            Decision::Consider => "Worth considering",
            Decision::Reject => "Not recommended",
            Decision::Pass => "Recommend passing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_decisions() {
        assert_eq!(Decision::parse("hire"), Decision::Hire);
        assert_eq!(Decision::parse("strong_hire"), Decision::StrongHire);
        assert_eq!(Decision::parse("STRONG-HIRE"), Decision::StrongHire);
        assert_eq!(Decision::parse("reject"), Decision::Reject);
        assert_eq!(Decision::parse("pass"), Decision::Pass);
    }

    #[test]
    fn test_parse_unknown_falls_back_to_consider() {
        assert_eq!(Decision::parse("maybe"), Decision::Consider);
        assert_eq!(Decision::parse(""), Decision::Consider);
    }

    #[test]
    fn test_label_round_trips_through_parse() {
        for decision in [
            Decision::StrongHire,
            Decision::Hire,
            Decision::Interview,
            Decision::Consider,
            Decision::Reject,
            Decision::Pass,
        ] {
            assert_eq!(Decision::parse(decision.label()), decision);
        }
    }

    #[test]
    fn test_score_payload_deserializes() {
        let json = serde_json::json!({
            "overall_score": 82.5,
            "skills_score": 90.0,
            "experience_score": 75.0,
            "education_score": 80.0,
            "breakdown": {
                "skills_match": 0.9,
                "experience_match": 0.75,
                "education_match": 0.8,
                "overall_fit": 0.82
            },
            "matching_skills": [{
                "skill": "Rust",
                "match_score": 0.95,
                "match_type": "exact",
                "explanation": "Five years of production Rust"
            }],
            "recommendations": {
                "decision": "hire",
                "reasoning": "Strong technical match",
                "strengths": ["systems design"],
                "concerns": ["no people management"],
                "suggestions": ["probe team experience"]
            },
            "analysis_confidence": 0.87,
            "processing_time_ms": 1450,
            "scored_at": "2026-07-01T12:00:00Z"
        });
        let payload: ScorePayload = serde_json::from_value(json).unwrap();
        assert_eq!(payload.recommendations.decision, Decision::Hire);
        assert_eq!(payload.matching_skills[0].match_type, SkillMatchType::Exact);
    }
}
