//! Prompt assembly
//!
//! The per-exchange system message stitches together the persona
//! instructions, the retrieved knowledge block, and the session's
//! long-term summary. The summary refresh sees the conversation as a
//! flat `role: content` transcript.

use banter_llm::Message;

const SUMMARY_CONTEXT_HEADER: &str = "Summary of my conversation with the user:";

/// Compose the system message for one exchange
#[must_use]
pub fn compose_system_message(base: &str, knowledge_block: &str, summary: &str) -> String {
    format!("{base}\n\n{knowledge_block}\n\n{SUMMARY_CONTEXT_HEADER}\n{summary}")
}

/// Flatten turns into the transcript fed to the summary refresh
#[must_use]
pub fn flatten_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}
