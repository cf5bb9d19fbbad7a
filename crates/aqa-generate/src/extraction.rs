//! JSON extraction from raw LLM completion text: try a fenced ```json
//! block first, then a balanced-brace scan from the first `{`, else fall
//! back to the trimmed raw text.

/// Extracts the JSON payload from an LLM completion's text.
pub fn extract_json(content: &str) -> String {
    if let Some(fenced) = extract_fenced_block(content) {
        return fenced;
    }
    if let Some(braced) = extract_balanced_braces(content) {
        return braced;
    }
    content.trim().to_string()
}

fn extract_fenced_block(content: &str) -> Option<String> {
    let start_marker = content.find("```")?;
    let after_marker = &content[start_marker + 3..];
    let body_start = after_marker
        .strip_prefix("json")
        .map(|s| s.trim_start_matches(['\r', '\n']))
        .unwrap_or(after_marker);
    let end = body_start.find("```")?;
    Some(body_start[..end].trim().to_string())
}

fn extract_balanced_braces(content: &str) -> Option<String> {
    let start = content.find('{')?;
    let mut depth = 0i32;
    for (offset, ch) in content[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(content[start..start + offset + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_fenced_json_block() {
        let text = "Here's the plan:\n```json\n{\"a\": 1}\n```\nHope that helps.";
        assert_eq!(extract_json(text), "{\"a\": 1}");
    }

    #[test]
    fn extracts_from_fenced_block_without_json_tag() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json(text), "{\"a\": 1}");
    }

    #[test]
    fn falls_back_to_balanced_brace_scan() {
        let text = "Sure, here you go: {\"a\": {\"b\": 1}} -- done";
        assert_eq!(extract_json(text), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn falls_back_to_trimmed_text_when_no_json_found() {
        assert_eq!(extract_json("  just words  "), "just words");
    }
}
