//! Built-in report templates, keyed by `TemplateKind`.
//!
//! Templates are markdown with `template` engine placeholders. The variable
//! bags are assembled by the pipeline (individual reports) and the derived
//! report builders (comparison, interview guide).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TemplateKind {
    Individual,
    Comparison,
    InterviewGuide,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Individual => "individual",
            TemplateKind::Comparison => "comparison",
            TemplateKind::InterviewGuide => "interview-guide",
        }
    }
}

/// Returns the markdown template source for a kind.
pub fn template_source(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::Individual => INDIVIDUAL_TEMPLATE,
        TemplateKind::Comparison => COMPARISON_TEMPLATE,
        TemplateKind::InterviewGuide => INTERVIEW_GUIDE_TEMPLATE,
    }
}

const INDIVIDUAL_TEMPLATE: &str = r#"# Candidate Match Report

**Job:** {{job_id}}
**Candidate:** {{resume_id}}
**Match score:** {{overall_score}}%
**Decision:** {{decision_headline}}
**Confidence:** {{confidence}}

## Assessment

{{reasoning}}

## Skills

{{#each skills}}- **{{skill}}** ({{match_type}}, {{match_score}}): {{explanation}}
{{/each}}

{{#if strengths}}## Strengths

{{#each strengths}}- {{this}}
{{/each}}{{/if}}

{{#if concerns}}## Concerns

{{#each concerns}}- {{this}}
{{/each}}{{/if}}

{{#if suggestions}}## Suggested Next Steps

{{#each suggestions}}- {{this}}
{{/each}}{{/if}}
"#;

const COMPARISON_TEMPLATE: &str = r#"# Candidate Comparison

**Job:** {{job_id}}
**Candidates compared:** {{candidate_count}}

## Ranking

{{#each candidates}}- **{{resume_id}}** — {{overall_score}}% ({{recommendation}}): {{summary}}
{{/each}}

## Leading Candidate

{{leader.resume_id}} at {{leader.overall_score}}%.
"#;

const INTERVIEW_GUIDE_TEMPLATE: &str = r#"# Interview Guide

**Job:** {{job_id}}
**Candidate:** {{resume_id}}
**Match score:** {{overall_score}}%

## Focus Areas

{{#each concerns}}- Probe: {{this}}
{{/each}}

## Confirmed Strengths

{{#each strengths}}- {{this}}
{{/each}}

## Suggested Questions

{{#each suggestions}}- {{this}}
{{/each}}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::template::{render_str, Escape};
    use serde_json::json;

    #[test]
    fn test_kind_labels() {
        assert_eq!(TemplateKind::Individual.as_str(), "individual");
        assert_eq!(TemplateKind::InterviewGuide.as_str(), "interview-guide");
    }

    #[test]
    fn test_all_templates_parse_and_render() {
        let vars = json!({
            "job_id": "job-1",
            "resume_id": "resume-1",
            "overall_score": 82,
            "decision_headline": "Recommend hiring",
            "confidence": 0.9,
            "reasoning": "Strong match.",
            "skills": [],
            "strengths": ["systems design"],
            "concerns": [],
            "suggestions": [],
            "candidate_count": 2,
            "candidates": [],
            "leader": {"resume_id": "resume-1", "overall_score": 82}
        });
        for kind in [
            TemplateKind::Individual,
            TemplateKind::Comparison,
            TemplateKind::InterviewGuide,
        ] {
            let out = render_str(template_source(kind), &vars, Escape::None).unwrap();
            assert!(out.contains("job-1"), "{kind:?} should render job id");
        }
    }

    #[test]
    fn test_individual_template_renders_skills_loop() {
        let vars = json!({
            "job_id": "job-1",
            "resume_id": "resume-1",
            "overall_score": 82,
            "decision_headline": "Recommend hiring",
            "confidence": 0.9,
            "reasoning": "Strong match.",
            "skills": [
                {"skill": "Rust", "match_type": "exact", "match_score": 0.95,
                 "explanation": "Production experience"}
            ],
            "strengths": [],
            "concerns": [],
            "suggestions": []
        });
        let out = render_str(
            template_source(TemplateKind::Individual),
            &vars,
            Escape::None,
        )
        .unwrap();
        assert!(out.contains("**Rust** (exact, 0.95): Production experience"));
    }
}
