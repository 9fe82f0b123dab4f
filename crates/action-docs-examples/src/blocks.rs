//! Fenced YAML blocks in free-form text.

/// The content of one fenced `yaml`/`yml` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub content: String,
    /// 1-based line of the first content line in the surrounding text
    pub start_line: usize,
}

struct Fence {
    marker: char,
    length: usize,
    indent: usize,
    is_yaml: bool,
    start_line: usize,
    lines: Vec<String>,
}

/// Find every fenced block tagged `yaml` or `yml` (case-insensitive).
///
/// Both backtick and tilde fences are recognized, and fences may be indented
/// (inside list items, for instance); that indentation is removed from the
/// content. A block left open at the end of the text runs to the end.
pub fn extract_blocks(text: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut open: Option<Fence> = None;

    for (index, line) in text.lines().enumerate() {
        match open.as_mut() {
            Some(fence) => {
                if closes(line, fence) {
                    if let Some(fence) = open.take() {
                        push_block(&mut blocks, fence);
                    }
                } else {
                    fence.lines.push(remove_indent(line, fence.indent).to_string());
                }
            }
            None => {
                open = opening_fence(line, index + 2);
            }
        }
    }

    if let Some(fence) = open {
        push_block(&mut blocks, fence);
    }
    blocks
}

fn push_block(blocks: &mut Vec<CodeBlock>, fence: Fence) {
    if fence.is_yaml {
        blocks.push(CodeBlock {
            content: fence.lines.join("\n"),
            start_line: fence.start_line,
        });
    }
}

fn fence_run(line: &str) -> Option<(usize, char, usize, &str)> {
    let trimmed = line.trim_start();
    let indent = line.len() - trimmed.len();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let length = trimmed.chars().take_while(|c| *c == marker).count();
    if length < 3 {
        return None;
    }
    Some((indent, marker, length, &trimmed[length..]))
}

fn opening_fence(line: &str, start_line: usize) -> Option<Fence> {
    let (indent, marker, length, info) = fence_run(line)?;
    if marker == '`' && info.contains('`') {
        return None;
    }
    let language = info
        .trim()
        .trim_start_matches('{')
        .trim_start_matches('.')
        .split(|c: char| c.is_whitespace() || c == '}' || c == ',')
        .next()
        .unwrap_or_default()
        .to_lowercase();

    Some(Fence {
        marker,
        length,
        indent,
        is_yaml: language == "yaml" || language == "yml",
        start_line,
        lines: Vec::new(),
    })
}

fn closes(line: &str, fence: &Fence) -> bool {
    matches!(
        fence_run(line),
        Some((_, marker, length, rest)) if marker == fence.marker && length >= fence.length && rest.trim().is_empty()
    )
}

fn remove_indent(line: &str, indent: usize) -> &str {
    let available = line.len() - line.trim_start_matches(' ').len();
    &line[available.min(indent)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_yaml_blocks_with_start_lines() {
        let text = "# Usage\n\n```yaml\n- uses: a/b@v1\n```\n\ntext\n\n```YML\nid: x\n```\n";
        let blocks = extract_blocks(text);
        assert_eq!(
            blocks,
            vec![
                CodeBlock {
                    content: "- uses: a/b@v1".to_string(),
                    start_line: 4,
                },
                CodeBlock {
                    content: "id: x".to_string(),
                    start_line: 10,
                },
            ]
        );
    }

    #[test]
    fn test_ignores_other_languages_and_their_contents() {
        let text = "````markdown\n```yaml\nuses: a/b@v1\n```\n````\n```sh\necho hi\n```\n";
        assert!(extract_blocks(text).is_empty());
    }

    #[test]
    fn test_indented_fence_and_tilde() {
        let text = "1. Add a step:\n\n   ~~~ yaml title=\"workflow\"\n   - uses: a/b@v1\n     with:\n       x: 1\n   ~~~\n";
        let blocks = extract_blocks(text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "- uses: a/b@v1\n  with:\n    x: 1");
        assert_eq!(blocks[0].start_line, 4);
    }

    #[test]
    fn test_unterminated_block_runs_to_end() {
        let blocks = extract_blocks("```yaml\na: 1\nb: 2");
        assert_eq!(blocks[0].content, "a: 1\nb: 2");
    }

    #[test]
    fn test_shorter_fence_does_not_close() {
        let blocks = extract_blocks("````yaml\n```\nstill: inside\n````\n");
        assert_eq!(blocks[0].content, "```\nstill: inside");
    }
}
