//! Truncation Utilities
//!
//! Keeps log lines and error bodies short while preserving both ends of the
//! text and respecting UTF-8 boundaries.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncationPolicy {
    Bytes(usize),
}

impl TruncationPolicy {
    pub fn byte_budget(&self) -> usize {
        match self {
            TruncationPolicy::Bytes(b) => *b,
        }
    }
}

pub fn truncate_text(content: &str, policy: TruncationPolicy) -> String {
    let max_bytes = policy.byte_budget();

    if content.len() <= max_bytes {
        return content.to_string();
    }

    if max_bytes == 0 {
        return format!("... [{} chars truncated] ...", content.len());
    }

    let half = max_bytes / 2;

    let prefix_end = content
        .char_indices()
        .map(|(idx, c)| idx + c.len_utf8())
        .take_while(|&end| end <= half)
        .last()
        .unwrap_or(0);

    let suffix_target = content.len().saturating_sub(half);
    let suffix_start = content
        .char_indices()
        .map(|(idx, _)| idx)
        .find(|&idx| idx >= suffix_target)
        .unwrap_or(content.len())
        .max(prefix_end);

    let prefix = &content[..prefix_end];
    let suffix = &content[suffix_start..];
    let truncated_count = content.len() - (prefix.len() + suffix.len());

    format!("{} ... [{} chars truncated] ... {}", prefix, truncated_count, suffix)
}

/// One-line preview of model output for debug logs.
pub fn preview(content: &str) -> String {
    truncate_text(&content.replace('\n', " "), TruncationPolicy::Bytes(160))
}
