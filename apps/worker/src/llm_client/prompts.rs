// All LLM prompt constants for narrative report generation.
// The pipeline builds the final prompt by replacing the placeholders below.

/// System prompt for report narrative generation.
pub const NARRATIVE_SYSTEM: &str = "You are an expert talent analyst writing \
    candidate match-analysis reports for hiring teams. \
    Write clear, factual markdown grounded ONLY in the structured scoring data provided. \
    Do NOT invent scores, skills, or biographical details not present in the context. \
    Do NOT include preambles or apologies — begin directly with the report body.";

/// Narrative prompt template.
/// Replace: {report_type}, {context_json}
pub const NARRATIVE_PROMPT_TEMPLATE: &str = r#"Write a {report_type} report for the candidate described by the scoring context below.

SCORING CONTEXT (source of truth — ONLY use facts from this):
{context_json}

Structure the report as markdown with these sections:
1. Overall assessment — the match score, the decision, and one paragraph of rationale
2. Skills analysis — each matched/missing skill with its match strength and explanation
3. Strengths and concerns — drawn verbatim from the recommendations
4. Suggested next steps

HARD RULES:
1. Every figure you mention MUST appear in the scoring context
2. Quote skill names exactly as given
3. If a section has no supporting data, state that the data was unavailable instead of inventing it"#;
