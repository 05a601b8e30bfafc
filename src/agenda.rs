use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::api::{classify_error_message, error_message, InferenceTransport};
use crate::config::AgendaConfig;
use crate::error::{PipelineError, Result};
use crate::summarize::truncate_words;

const AGENDA_INSTRUCTION: &str = "Analyze the following document and create a structured meeting agenda. \
The agenda should include the following sections: Introduction, Discussion Points, Conclusions, and Action Items. \
Make sure to incorporate these key points: {points}. \
Each section should be clearly separated with bullet points.\n\n\
Use this structure:\n\
### Meeting Agenda:\n\
1. **Introduction:**\n\
   - Brief overview of the meeting's purpose.\n\n\
2. **Discussion Points:**\n\
   - Problem: Explain the issues or challenges.\n\
   - Solution: Propose a solution and its benefits.\n\
   - Technology: Discuss technology and its implementation.\n\
   - What Needs: Resources and support required.\n\n\
3. **Conclusions:**\n\
   - Key insights and decisions made.\n\n\
4. **Action Items:**\n\
   - Assign tasks and responsibilities.\n\
   - Schedule follow-up actions.\n\n\
Finally, provide a list of important keywords from the agenda.";

/// Turns combined document text plus free-text meeting points into a
/// formatted agenda via the summarization endpoint.
pub struct AgendaGenerator {
    config: AgendaConfig,
    token: String,
    transport: Arc<dyn InferenceTransport>,
}

impl AgendaGenerator {
    pub fn new(
        config: AgendaConfig,
        token: String,
        transport: Arc<dyn InferenceTransport>,
    ) -> Self {
        Self {
            config,
            token,
            transport,
        }
    }

    /// Generate an agenda from document text and meeting points. The
    /// combined prompt is truncated to the configured word cap before
    /// submission to respect request-size limits.
    pub async fn generate(&self, documents_text: &str, meeting_points: &str) -> Result<String> {
        let instruction = AGENDA_INSTRUCTION.replace("{points}", meeting_points);
        let full_input = truncate_words(
            &format!("{}\n\n{}", instruction, documents_text),
            self.config.max_input_words,
        );

        info!(
            "Requesting agenda outline ({} words of input)",
            full_input.split_whitespace().count()
        );

        let payload = json!({
            "inputs": full_input,
            "parameters": {
                "max_length": self.config.max_length,
                "do_sample": false,
            },
        });

        let response = self
            .transport
            .post_json(&self.config.endpoint, &self.token, payload)
            .await?;

        let outline = response
            .as_array()
            .and_then(|items| items.first())
            .and_then(|item| item.get("summary_text"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| match error_message(&response) {
                Some(message) => classify_error_message(message),
                None => PipelineError::Fatal(format!(
                    "Unexpected API response format: {}",
                    response
                )),
            })?;

        Ok(format_agenda(&outline, meeting_points))
    }
}

/// Format the model's outline into the bullet-pointed agenda layout,
/// followed by an echo of the supplied meeting points.
fn format_agenda(outline: &str, meeting_points: &str) -> String {
    let structured = outline
        .split(". ")
        .filter(|piece| !piece.trim().is_empty())
        .map(|piece| format!("• {}", piece.trim()))
        .collect::<Vec<_>>()
        .join("\n");

    let points = meeting_points
        .split(',')
        .filter(|point| !point.trim().is_empty())
        .map(|point| format!("• {}", point.trim()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "### Generated Meeting Outline:\n\n{}\n\n### Meeting Points:\n{}",
        structured, points
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_agenda_bullets_outline() {
        let agenda = format_agenda(
            "Review Q3 results. Plan the budget. Assign owners",
            "Q3 results, Budget allocation",
        );

        assert!(agenda.starts_with("### Generated Meeting Outline:"));
        assert!(agenda.contains("• Review Q3 results"));
        assert!(agenda.contains("• Plan the budget"));
        assert!(agenda.contains("• Assign owners"));
    }

    #[test]
    fn test_format_agenda_echoes_points() {
        let agenda = format_agenda("Single sentence", "Q3 results, Budget allocation");

        let points_section = agenda.split("### Meeting Points:").nth(1).unwrap();
        assert!(points_section.contains("• Q3 results"));
        assert!(points_section.contains("• Budget allocation"));
    }

    #[test]
    fn test_instruction_substitutes_points() {
        let instruction = AGENDA_INSTRUCTION.replace("{points}", "hiring plan");
        assert!(instruction.contains("incorporate these key points: hiring plan"));
        assert!(!instruction.contains("{points}"));
    }
}
