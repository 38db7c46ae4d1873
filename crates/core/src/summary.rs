//! 1-on-1 meeting summaries: the prompt sent through the generation proxy and
//! the section parsing applied to the generated text.

use regex::Regex;

pub const KEY_TAKEAWAYS_HEADING: &str = "Key Takeaways";
pub const NEXT_ACTIONS_HEADING: &str = "Next Actions";

/// Model preference used for summaries, in proxy override syntax.
pub const SUMMARY_MODEL_OVERRIDE: &str = "models/gemini-2.5-flash,models/gemini-1.5-flash";

const SUMMARY_INSTRUCTIONS: [&str; 7] = [
    "Summarize the following 1-on-1 conversation for the manager.",
    "Respond using the exact section headings [Key Takeaways] and [Next Actions].",
    "[Key Takeaways]",
    "- Provide concise bullet points capturing the most important outcomes or insights.",
    "[Next Actions]",
    "- List clear, actionable next steps with owners when possible.",
    "",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingSummary {
    pub key_takeaways: String,
    pub next_actions: String,
}

/// Returns `None` when the transcript is blank; nothing should be sent upstream then.
pub fn build_summary_prompt(transcript: &str) -> Option<String> {
    let transcript = transcript.trim();
    if transcript.is_empty() {
        return None;
    }
    let mut lines: Vec<&str> = SUMMARY_INSTRUCTIONS.to_vec();
    lines.push("Transcript:");
    lines.push(transcript);
    Some(lines.join("\n"))
}

pub fn parse_summary(text: &str) -> MeetingSummary {
    MeetingSummary {
        key_takeaways: section_or_placeholder(text, KEY_TAKEAWAYS_HEADING),
        next_actions: section_or_placeholder(text, NEXT_ACTIONS_HEADING),
    }
}

fn section_or_placeholder(text: &str, heading: &str) -> String {
    extract_section(text, heading).unwrap_or_else(|| format!("No [{heading}] section found."))
}

/// Body of `[heading]` up to the next `[...]` heading line or the end of text.
pub fn extract_section(text: &str, heading: &str) -> Option<String> {
    let pattern = format!(r"\[{}\]\s*([\s\S]*?)(?:\n\[[^\]]+\]|\s*$)", regex::escape(heading));
    let re = Regex::new(&pattern).ok()?;
    let captures = re.captures(text)?;
    captures.get(1).map(|body| body.as_str().trim().to_string())
}
