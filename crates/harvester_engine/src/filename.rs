/// Filename for the `index`-th image (1-based) a source saves in one run:
/// `{tag}_{index}.jpg`.
///
/// Sources share the destination directory, so the tag keeps their sequences
/// from overwriting each other.
pub fn image_filename(source_tag: &str, index: usize) -> String {
    format!("{}_{index}.jpg", sanitize_tag(source_tag))
}

fn sanitize_tag(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);
    if cleaned.is_empty() {
        "source".to_string()
    } else {
        cleaned.to_string()
    }
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}
