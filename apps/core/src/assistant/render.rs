//! Assistant message renderer.
//!
//! Turns the small markdown subset the assistant replies with into HTML.
//! Parsing is an ordered pipeline of pure stages producing a [`Document`]
//! tree; the tree is then rendered through an auto-escaping template, so text
//! coming from the backend can never inject markup.
//!
//! | stage | function | input -> output |
//! |---|---|---|
//! | 1 | [`apply_strong`] | raw line -> `Text`/`Strong` nodes |
//! | 2 | [`apply_emphasis`] | nodes -> nodes with `Emphasis`; a pair never crosses a `Strong` boundary |
//! | 3 | [`detect_list_item`] | nodes -> `Line::Item` when the line starts with `- ` |
//! | 4 | [`detect_heading`] | `Line::Text` -> `Line::Heading` for `### `, `## `, `# ` |
//! | 3b | [`group_list_items`] | lines -> segments, adjacent items merged into one list |
//! | 5-7 | [`build_blocks`] | segments -> blocks: blank lines split paragraphs, newlines become `LineBreak`, loose text is wrapped in a paragraph |

use minijinja::{context, Environment};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::error::AppResult;

static STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("Invalid regex: strong span"));

const MESSAGE_TEMPLATE_NAME: &str = "message.html";
const MESSAGE_TEMPLATE: &str = r#"
{%- macro inline(tokens) -%}
{%- for token in tokens -%}
{%- if token.kind == "text" -%}{{ token.text }}
{%- elif token.kind == "strong_start" -%}<strong>
{%- elif token.kind == "strong_end" -%}</strong>
{%- elif token.kind == "emphasis_start" -%}<em>
{%- elif token.kind == "emphasis_end" -%}</em>
{%- elif token.kind == "line_break" -%}<br>
{%- endif -%}
{%- endfor -%}
{%- endmacro -%}
{%- for block in blocks -%}
{%- if block.kind == "paragraph" -%}<p>{{ inline(block.tokens) }}</p>
{%- elif block.kind == "heading" -%}<h{{ block.level }}>{{ inline(block.tokens) }}</h{{ block.level }}>
{%- elif block.kind == "list" -%}<ul>{%- for item in block.items -%}<li>{{ inline(item) }}</li>{%- endfor -%}</ul>
{%- endif -%}
{%- endfor -%}
"#;

// `.html` template names get HTML auto-escaping.
static TEMPLATES: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.add_template(MESSAGE_TEMPLATE_NAME, MESSAGE_TEMPLATE)
        .expect("Invalid template: message");
    env
});

/// Inline content of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inline {
    Text { text: String },
    Strong { children: Vec<Inline> },
    Emphasis { children: Vec<Inline> },
    LineBreak,
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Paragraph { inlines: Vec<Inline> },
    Heading { level: u8, inlines: Vec<Inline> },
    List { items: Vec<Vec<Inline>> },
}

/// Parsed message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// A source line after the inline stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Blank,
    Text(Vec<Inline>),
    Item(Vec<Inline>),
    Heading(u8, Vec<Inline>),
}

/// Lines with adjacent list items merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Blank,
    Text(Vec<Inline>),
    List(Vec<Vec<Inline>>),
    Heading(u8, Vec<Inline>),
}

/// Parse and render markdown to HTML.
pub fn render_message(markdown: &str) -> AppResult<String> {
    render_document(&parse_message(markdown))
}

/// Render text without markdown interpretation: only paragraphs and line breaks.
pub fn render_plain(text: &str) -> AppResult<String> {
    let lines = split_lines(text)
        .into_iter()
        .map(|line| {
            if line.trim().is_empty() {
                Line::Blank
            } else {
                Line::Text(vec![Inline::text(line)])
            }
        })
        .collect();
    render_document(&Document {
        blocks: build_blocks(group_list_items(lines)),
    })
}

/// Run the parsing pipeline.
pub fn parse_message(markdown: &str) -> Document {
    let lines = split_lines(markdown)
        .into_iter()
        .map(|line| {
            if line.trim().is_empty() {
                return Line::Blank;
            }
            let nodes = apply_emphasis(apply_strong(line));
            detect_heading(detect_list_item(nodes))
        })
        .collect();

    Document {
        blocks: build_blocks(group_list_items(lines)),
    }
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Stage 1. Input: one raw line. Output: `Text` and `Strong` nodes, where each
/// `**...**` pair (shortest match, left to right) became a `Strong` holding a
/// single text child.
pub fn apply_strong(line: &str) -> Vec<Inline> {
    let mut nodes = Vec::new();
    let mut last = 0;

    for caps in STRONG.captures_iter(line) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        push_node(&mut nodes, Inline::text(&line[last..whole.start()]));
        let mut children = Vec::new();
        push_node(&mut children, Inline::text(inner.as_str()));
        nodes.push(Inline::Strong { children });
        last = whole.end();
    }
    push_node(&mut nodes, Inline::text(&line[last..]));
    nodes
}

/// Stage 2. Input: nodes from stage 1. Output: the same nodes where each pair
/// of single `*` (nearest closing star first) wraps the content between them
/// in `Emphasis`. Pairs are matched at the top level, where they may enclose a
/// `Strong`, and separately inside each `Strong`. An unpaired star stays text.
pub fn apply_emphasis(nodes: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::new();
    let mut open: Option<Vec<Inline>> = None;

    for node in nodes {
        match node {
            Inline::Text { text } => {
                let mut rest = text.as_str();
                while let Some(pos) = rest.find('*') {
                    let before = &rest[..pos];
                    match open.take() {
                        None => {
                            push_node(&mut out, Inline::text(before));
                            open = Some(Vec::new());
                        }
                        Some(mut children) => {
                            push_node(&mut children, Inline::text(before));
                            out.push(Inline::Emphasis { children });
                        }
                    }
                    rest = &rest[pos + 1..];
                }
                let target = open.as_mut().unwrap_or(&mut out);
                push_node(target, Inline::text(rest));
            }
            Inline::Strong { children } => {
                let strong = Inline::Strong {
                    children: apply_emphasis(children),
                };
                open.as_mut().unwrap_or(&mut out).push(strong);
            }
            other => open.as_mut().unwrap_or(&mut out).push(other),
        }
    }

    if let Some(children) = open {
        push_node(&mut out, Inline::text("*"));
        for child in children {
            push_node(&mut out, child);
        }
    }
    out
}

/// Stage 3. A line whose text starts with `- ` followed by at least one
/// character becomes a list item with the marker removed.
pub fn detect_list_item(nodes: Vec<Inline>) -> Line {
    match strip_marker(nodes, "- ") {
        Ok(content) => Line::Item(content),
        Err(nodes) => Line::Text(nodes),
    }
}

/// Stage 4. Text lines starting with `### `, `## ` or `# ` (checked in that
/// order) become headings of level 3, 2 or 1. Other lines pass through.
pub fn detect_heading(line: Line) -> Line {
    let mut nodes = match line {
        Line::Text(nodes) => nodes,
        other => return other,
    };

    for (marker, level) in [("### ", 3u8), ("## ", 2), ("# ", 1)] {
        match strip_marker(nodes, marker) {
            Ok(content) => return Line::Heading(level, content),
            Err(unchanged) => nodes = unchanged,
        }
    }
    Line::Text(nodes)
}

/// Stage 3b. Each maximal run of adjacent `Item` lines becomes one list.
pub fn group_list_items(lines: Vec<Line>) -> Vec<Segment> {
    let mut segments = Vec::new();

    for line in lines {
        match line {
            Line::Item(content) => match segments.last_mut() {
                Some(Segment::List(items)) => items.push(content),
                _ => segments.push(Segment::List(vec![content])),
            },
            Line::Blank => segments.push(Segment::Blank),
            Line::Text(nodes) => segments.push(Segment::Text(nodes)),
            Line::Heading(level, nodes) => segments.push(Segment::Heading(level, nodes)),
        }
    }
    segments
}

/// Stages 5 to 7. Blank lines close the current paragraph, consecutive text
/// lines are joined with `LineBreak`, and every run of loose text is wrapped
/// in a `Paragraph`. Empty paragraphs are never produced.
pub fn build_blocks(segments: Vec<Segment>) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<Inline> = Vec::new();

    fn flush(blocks: &mut Vec<Block>, paragraph: &mut Vec<Inline>) {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph {
                inlines: std::mem::take(paragraph),
            });
        }
    }

    for segment in segments {
        match segment {
            Segment::Text(nodes) => {
                if !paragraph.is_empty() {
                    paragraph.push(Inline::LineBreak);
                }
                paragraph.extend(nodes);
            }
            Segment::Blank => flush(&mut blocks, &mut paragraph),
            Segment::List(items) => {
                flush(&mut blocks, &mut paragraph);
                blocks.push(Block::List { items });
            }
            Segment::Heading(level, inlines) => {
                flush(&mut blocks, &mut paragraph);
                blocks.push(Block::Heading { level, inlines });
            }
        }
    }
    flush(&mut blocks, &mut paragraph);
    blocks
}

/// Render a parsed document through the escaping template.
pub fn render_document(document: &Document) -> AppResult<String> {
    let blocks: Vec<BlockView<'_>> = document.blocks.iter().map(BlockView::from).collect();
    let template = TEMPLATES.get_template(MESSAGE_TEMPLATE_NAME)?;
    Ok(template.render(context! { blocks => blocks })?)
}

// --- Helpers ---

/// Appends a node, merging adjacent text and dropping empty text.
fn push_node(nodes: &mut Vec<Inline>, node: Inline) {
    match node {
        Inline::Text { text } if text.is_empty() => {}
        Inline::Text { text } => match nodes.last_mut() {
            Some(Inline::Text { text: previous }) => previous.push_str(&text),
            _ => nodes.push(Inline::Text { text }),
        },
        other => nodes.push(other),
    }
}

/// Removes `marker` from the start of the first text node. Fails (returning the
/// nodes untouched) when the line does not start with it or nothing follows it.
fn strip_marker(mut nodes: Vec<Inline>, marker: &str) -> Result<Vec<Inline>, Vec<Inline>> {
    let rest = match nodes.first() {
        Some(Inline::Text { text }) => text.strip_prefix(marker).map(str::to_string),
        _ => None,
    };
    let Some(rest) = rest else {
        return Err(nodes);
    };

    if rest.is_empty() && nodes.len() == 1 {
        return Err(nodes);
    }

    let tail = nodes.split_off(1);
    let mut content = Vec::with_capacity(tail.len() + 1);
    push_node(&mut content, Inline::text(rest));
    for node in tail {
        push_node(&mut content, node);
    }
    Ok(content)
}

// --- Template views ---

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Token<'a> {
    Text { text: &'a str },
    StrongStart,
    StrongEnd,
    EmphasisStart,
    EmphasisEnd,
    LineBreak,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum BlockView<'a> {
    Paragraph { tokens: Vec<Token<'a>> },
    Heading { level: u8, tokens: Vec<Token<'a>> },
    List { items: Vec<Vec<Token<'a>>> },
}

impl<'a> From<&'a Block> for BlockView<'a> {
    fn from(block: &'a Block) -> Self {
        match block {
            Block::Paragraph { inlines } => BlockView::Paragraph {
                tokens: tokens(inlines),
            },
            Block::Heading { level, inlines } => BlockView::Heading {
                level: *level,
                tokens: tokens(inlines),
            },
            Block::List { items } => BlockView::List {
                items: items.iter().map(|item| tokens(item)).collect(),
            },
        }
    }
}

fn tokens(inlines: &[Inline]) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    flatten(inlines, &mut out);
    out
}

fn flatten<'a>(inlines: &'a [Inline], out: &mut Vec<Token<'a>>) {
    for inline in inlines {
        match inline {
            Inline::Text { text } => out.push(Token::Text { text }),
            Inline::Strong { children } => {
                out.push(Token::StrongStart);
                flatten(children, out);
                out.push(Token::StrongEnd);
            }
            Inline::Emphasis { children } => {
                out.push(Token::EmphasisStart);
                flatten(children, out);
                out.push(Token::EmphasisEnd);
            }
            Inline::LineBreak => out.push(Token::LineBreak),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strong(text: &str) -> Inline {
        Inline::Strong {
            children: vec![Inline::text(text)],
        }
    }

    fn em(children: Vec<Inline>) -> Inline {
        Inline::Emphasis { children }
    }

    #[test]
    fn test_strong_stage() {
        assert_eq!(
            apply_strong("a **b** c **d**"),
            vec![Inline::text("a "), strong("b"), Inline::text(" c "), strong("d")]
        );
        assert_eq!(apply_strong("no markers"), vec![Inline::text("no markers")]);
        assert_eq!(apply_strong("**open only"), vec![Inline::text("**open only")]);
    }

    #[test]
    fn test_emphasis_stage() {
        let nodes = apply_emphasis(apply_strong("**bold** and *italic*"));
        assert_eq!(
            nodes,
            vec![
                strong("bold"),
                Inline::text(" and "),
                em(vec![Inline::text("italic")])
            ]
        );
    }

    #[test]
    fn test_emphasis_inside_strong() {
        let nodes = apply_emphasis(apply_strong("**a *b* c**"));
        assert_eq!(
            nodes,
            vec![Inline::Strong {
                children: vec![Inline::text("a "), em(vec![Inline::text("b")]), Inline::text(" c")]
            }]
        );
    }

    #[test]
    fn test_emphasis_around_strong() {
        let nodes = apply_emphasis(apply_strong("*a **b** c*"));
        assert_eq!(
            nodes,
            vec![em(vec![Inline::text("a "), strong("b"), Inline::text(" c")])]
        );
    }

    #[test]
    fn test_unpaired_star_stays_text() {
        assert_eq!(
            apply_emphasis(apply_strong("5 * 3 = 15")),
            vec![Inline::text("5 * 3 = 15")]
        );
    }

    #[test]
    fn test_list_item_detection() {
        assert_eq!(
            detect_list_item(vec![Inline::text("- item")]),
            Line::Item(vec![Inline::text("item")])
        );
        assert_eq!(
            detect_list_item(vec![Inline::text("- "), strong("x")]),
            Line::Item(vec![strong("x")])
        );
        // Marker alone is not an item.
        assert_eq!(
            detect_list_item(vec![Inline::text("- ")]),
            Line::Text(vec![Inline::text("- ")])
        );
        assert_eq!(
            detect_list_item(vec![Inline::text("-item")]),
            Line::Text(vec![Inline::text("-item")])
        );
    }

    #[test]
    fn test_heading_levels_most_specific_first() {
        let heading = |s: &str| detect_heading(Line::Text(vec![Inline::text(s)]));
        assert_eq!(heading("# One"), Line::Heading(1, vec![Inline::text("One")]));
        assert_eq!(heading("## Two"), Line::Heading(2, vec![Inline::text("Two")]));
        assert_eq!(heading("### Three"), Line::Heading(3, vec![Inline::text("Three")]));
        assert_eq!(
            heading("#### Four"),
            Line::Text(vec![Inline::text("#### Four")])
        );
    }

    #[test]
    fn test_list_item_is_not_a_heading() {
        let line = detect_heading(detect_list_item(vec![Inline::text("- # not a title")]));
        assert_eq!(line, Line::Item(vec![Inline::text("# not a title")]));
    }

    #[test]
    fn test_adjacent_items_share_one_list() {
        let segments = group_list_items(vec![
            Line::Item(vec![Inline::text("a")]),
            Line::Item(vec![Inline::text("b")]),
            Line::Blank,
            Line::Item(vec![Inline::text("c")]),
        ]);
        assert_eq!(
            segments,
            vec![
                Segment::List(vec![vec![Inline::text("a")], vec![Inline::text("b")]]),
                Segment::Blank,
                Segment::List(vec![vec![Inline::text("c")]]),
            ]
        );
    }

    #[test]
    fn test_render_bold_and_italic() {
        assert_eq!(
            render_message("**bold** and *italic*").unwrap(),
            "<p><strong>bold</strong> and <em>italic</em></p>"
        );
    }

    #[test]
    fn test_render_list() {
        assert_eq!(
            render_message("- a\n- b").unwrap(),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_render_headings_and_paragraphs() {
        let html = render_message("# Title\n\nFirst line\nsecond line\n\n## Next\nMore").unwrap();
        assert_eq!(
            html,
            "<h1>Title</h1><p>First line<br>second line</p><h2>Next</h2><p>More</p>"
        );
    }

    #[test]
    fn test_render_mixed_reply() {
        let reply = "Here are some tips:\n- Drink **water**\n- Sleep *well*\n\nTake care";
        assert_eq!(
            render_message(reply).unwrap(),
            "<p>Here are some tips:</p><ul><li>Drink <strong>water</strong></li><li>Sleep <em>well</em></li></ul><p>Take care</p>"
        );
    }

    #[test]
    fn test_render_escapes_markup() {
        let html = render_message("<script>alert(1)</script> **<b>x</b>**").unwrap();
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.starts_with("<p>"));
    }

    #[test]
    fn test_render_empty_input() {
        assert_eq!(render_message("").unwrap(), "");
        assert_eq!(render_message("\n\n").unwrap(), "");
    }

    #[test]
    fn test_crlf_line_endings() {
        assert_eq!(
            render_message("- a\r\n- b\r\n").unwrap(),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_render_plain_ignores_markdown() {
        assert_eq!(
            render_plain("**not bold**\n- not a list").unwrap(),
            "<p>**not bold**<br>- not a list</p>"
        );
    }
}
