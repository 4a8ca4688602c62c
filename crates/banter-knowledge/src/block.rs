//! Knowledge block formatting
//!
//! Retrieved passages are rendered into a markdown block that the
//! orchestrator splices into the system prompt: a fixed header, then one
//! subsection per passage naming its provenance.

use serde::{Deserialize, Serialize};

/// Header line opening every knowledge block
pub const KNOWLEDGE_HEADER: &str = "# My Knowledge";

/// A retrieved passage with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Passage text
    pub text: String,
    /// URL of the document the passage came from
    pub source_url: String,
    /// Paragraph index within the source document
    pub paragraph: u32,
}

impl Passage {
    /// Create a passage
    #[must_use]
    pub fn new(text: impl Into<String>, source_url: impl Into<String>, paragraph: u32) -> Self {
        Self {
            text: text.into(),
            source_url: source_url.into(),
            paragraph,
        }
    }
}

/// Format passages into a knowledge block, rank order preserved.
///
/// Zero passages is not an error; the block is then the header alone.
#[must_use]
pub fn format_knowledge_block(passages: &[Passage]) -> String {
    let mut lines = vec![KNOWLEDGE_HEADER.to_string()];

    for passage in passages {
        lines.push(format!(
            "## From {} (paragraph {})",
            passage.source_url, passage.paragraph
        ));
        lines.push(passage.text.clone());
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_passage_block() {
        let passages = [Passage::new("foo", "http://x", 2)];
        assert_eq!(
            format_knowledge_block(&passages),
            "# My Knowledge\n## From http://x (paragraph 2)\nfoo\n"
        );
    }

    #[test]
    fn test_empty_block_is_header_only() {
        assert_eq!(format_knowledge_block(&[]), "# My Knowledge");
    }

    #[test]
    fn test_passages_keep_rank_order() {
        let passages = [
            Passage::new("first hit", "http://a", 0),
            Passage::new("second hit", "http://b", 7),
        ];
        let block = format_knowledge_block(&passages);
        assert_eq!(
            block,
            "# My Knowledge\n\
             ## From http://a (paragraph 0)\n\
             first hit\n\
             \n\
             ## From http://b (paragraph 7)\n\
             second hit\n"
        );
    }
}
