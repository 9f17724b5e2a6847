/// Splits bio text into display lines after every period that is followed by whitespace.
///
/// The period stays with its sentence and segments are trimmed. Text without such a break, or
/// blank text, comes back as a single unchanged line.
pub fn split_bio(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        if c == '.' && chars.peek().is_some_and(|n| n.is_whitespace()) {
            push_trimmed(&mut lines, &current);
            current.clear();
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
        }
    }
    push_trimmed(&mut lines, &current);

    if lines.is_empty() {
        vec![text.to_string()]
    } else {
        lines
    }
}

fn push_trimmed(lines: &mut Vec<String>, segment: &str) {
    let segment = segment.trim();
    if !segment.is_empty() {
        lines.push(segment.to_string());
    }
}
