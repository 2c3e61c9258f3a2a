/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) && end > 0 {
        end -= 1;
    }
    &s[..end]
}

/// Strip a surrounding markdown fence (```json, ```JSON or bare ```) from a reply.
pub fn strip_code_blocks(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
        _ => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Narrow a model reply down to its outermost `{ ... }` span.
///
/// Models in JSON mode occasionally still wrap the object in a fence or a
/// sentence of prose. Returns the fence-stripped input unchanged when no
/// braces are present, so the caller's parser reports the real problem.
pub fn extract_json_object(response: &str) -> &str {
    let unfenced = strip_code_blocks(response);
    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}
