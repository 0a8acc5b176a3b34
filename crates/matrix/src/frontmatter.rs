/// Split Markdown content into its YAML frontmatter and body.
///
/// Returns `(frontmatter_yaml, body)`. Content without an opening `---`, or
/// with an unclosed block, is returned whole as the body.
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let trimmed = content.trim_start();
    let Some(after_open) = trimmed.strip_prefix("---") else {
        return (None, content);
    };
    let after_open = after_open.trim_start_matches(['\r', '\n']);

    if let Some(end) = after_open.find("\n---") {
        let yaml = after_open[..end].trim_end_matches('\r');
        let rest = &after_open[end + 4..];
        (Some(yaml), rest.trim_start_matches(['\r', '\n']))
    } else {
        (None, content)
    }
}
