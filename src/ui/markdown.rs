use crate::ui::canvas::{Canvas, Rgb, TextStyle};
use crate::ui::theme;

/// The subset of markdown the panel lays out natively: headings, paragraphs,
/// bullet lists, fenced code, rules, and inline bold/italic/code. Anything
/// else renders as the literal text it is.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    Bullet(Vec<Span>),
    Code(Vec<String>),
    Rule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

pub fn parse_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut code: Option<Vec<String>> = None;

    let mut flush_paragraph = |paragraph: &mut Vec<String>, blocks: &mut Vec<Block>| {
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(parse_spans(&paragraph.join(" "))));
            paragraph.clear();
        }
    };

    for line in text.lines() {
        if let Some(lines) = code.as_mut() {
            if line.trim_start().starts_with("```") {
                blocks.push(Block::Code(std::mem::take(lines)));
                code = None;
            } else {
                lines.push(line.to_string());
            }
            continue;
        }
        let trimmed = line.trim();
        if trimmed.starts_with("```") {
            flush_paragraph(&mut paragraph, &mut blocks);
            code = Some(Vec::new());
        } else if trimmed.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
        } else if let Some(heading) = parse_heading(trimmed) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(heading);
        } else if is_rule(trimmed) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Rule);
        } else if let Some(rest) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* "))
        {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Bullet(parse_spans(rest)));
        } else {
            paragraph.push(trimmed.to_string());
        }
    }
    if let Some(lines) = code {
        blocks.push(Block::Code(lines));
    }
    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

fn parse_heading(line: &str) -> Option<Block> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = line[level..].strip_prefix(' ')?;
    Some(Block::Heading {
        level: level as u8,
        spans: parse_spans(rest),
    })
}

fn is_rule(line: &str) -> bool {
    line.len() >= 3
        && (line.chars().all(|c| c == '-')
            || line.chars().all(|c| c == '*')
            || line.chars().all(|c| c == '_'))
}

/// Inline scanner. Markers toggle state, so an unclosed marker styles the
/// rest of the line instead of erroring.
pub fn parse_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut bold = false;
    let mut italic = false;

    let flush = |current: &mut String, spans: &mut Vec<Span>, bold: bool, italic: bool| {
        if !current.is_empty() {
            spans.push(Span {
                text: std::mem::take(current),
                bold,
                italic,
                code: false,
            });
        }
    };

    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '`' => {
                flush(&mut current, &mut spans, bold, italic);
                let mut code = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '`' {
                        closed = true;
                        break;
                    }
                    code.push(inner);
                }
                if closed {
                    spans.push(Span {
                        text: code,
                        bold: false,
                        italic: false,
                        code: true,
                    });
                } else {
                    current.push('`');
                    current.push_str(&code);
                }
            }
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    flush(&mut current, &mut spans, bold, italic);
                    bold = !bold;
                } else {
                    flush(&mut current, &mut spans, bold, italic);
                    italic = !italic;
                }
            }
            '_' => {
                flush(&mut current, &mut spans, bold, italic);
                italic = !italic;
            }
            _ => current.push(ch),
        }
    }
    flush(&mut current, &mut spans, bold, italic);
    spans
}

const BLOCK_GAP: i32 = 6;
const BULLET_INDENT: i32 = 16;
const CODE_PAD: i32 = 6;

struct Seg {
    dx: i32,
    text: String,
    style: TextStyle,
    color: Rgb,
    code_bg: bool,
}

struct LaidLine {
    dy: i32,
    height: i32,
    bullet: bool,
    code_line: bool,
    rule: bool,
    segs: Vec<Seg>,
}

pub fn height(canvas: &Canvas, width: i32, text: &str) -> i32 {
    height_of_blocks(canvas, width, &parse_blocks(text))
}

/// Paints the text into the column starting at (x, y) and reports the height
/// consumed.
pub fn draw(canvas: &mut Canvas, x: i32, y: i32, width: i32, text: &str) -> i32 {
    draw_blocks(canvas, x, y, width, &parse_blocks(text))
}

pub(crate) fn height_of_blocks(canvas: &Canvas, width: i32, blocks: &[Block]) -> i32 {
    lay(canvas, width, blocks).1
}

pub(crate) fn draw_blocks(
    canvas: &mut Canvas,
    x: i32,
    y: i32,
    width: i32,
    blocks: &[Block],
) -> i32 {
    let (lines, total) = lay(canvas, width, blocks);
    for line in &lines {
        let ly = y + line.dy;
        if line.rule {
            canvas.draw_line(x, ly, x + width, ly, theme::GRID, 1);
            continue;
        }
        if line.code_line {
            canvas.fill_rect(x, ly, width.max(0) as u32, line.height as u32, theme::CODE_BG);
        }
        if line.bullet {
            let dot = (canvas.base_size() / 4.0).max(2.0) as u32;
            canvas.fill_rect(x + 4, ly + line.height / 2 - 1, dot, dot, theme::TEXT);
        }
        for seg in &line.segs {
            if seg.code_bg {
                let w = canvas.text_width(&seg.text, seg.style) + 4.0;
                canvas.fill_rect(x + seg.dx - 2, ly, w as u32, line.height as u32, theme::CODE_BG);
            }
            canvas.draw_text(x + seg.dx, ly, &seg.text, seg.style, seg.color);
        }
    }
    total
}

fn lay(canvas: &Canvas, width: i32, blocks: &[Block]) -> (Vec<LaidLine>, i32) {
    let mut lines = Vec::new();
    let mut dy = 0;
    for block in blocks {
        match block {
            Block::Heading { level, spans } => {
                let style = heading_style(canvas.base_size(), *level);
                if dy > 0 {
                    dy += BLOCK_GAP / 2;
                }
                dy = lay_spans(canvas, spans, style, width, 0, dy, false, &mut lines);
                dy += BLOCK_GAP;
            }
            Block::Paragraph(spans) => {
                let style = TextStyle::sans(canvas.base_size());
                dy = lay_spans(canvas, spans, style, width, 0, dy, false, &mut lines);
                dy += BLOCK_GAP;
            }
            Block::Bullet(spans) => {
                let style = TextStyle::sans(canvas.base_size());
                dy = lay_spans(
                    canvas,
                    spans,
                    style,
                    width - BULLET_INDENT,
                    BULLET_INDENT,
                    dy,
                    true,
                    &mut lines,
                );
                dy += 2;
            }
            Block::Code(code_lines) => {
                let style = TextStyle::mono(canvas.base_size() * 0.95);
                let lh = canvas.line_height(style);
                let max = (width - 2 * CODE_PAD).max(40) as f32;
                for (i, code_line) in code_lines.iter().enumerate() {
                    lines.push(LaidLine {
                        dy,
                        height: lh,
                        bullet: false,
                        code_line: true,
                        rule: false,
                        segs: vec![Seg {
                            dx: CODE_PAD,
                            text: canvas.truncate(code_line, style, max),
                            style,
                            color: theme::TEXT,
                            code_bg: false,
                        }],
                    });
                    dy += lh;
                    if i + 1 == code_lines.len() {
                        dy += BLOCK_GAP;
                    }
                }
            }
            Block::Rule => {
                lines.push(LaidLine {
                    dy: dy + 3,
                    height: 1,
                    bullet: false,
                    code_line: false,
                    rule: true,
                    segs: Vec::new(),
                });
                dy += BLOCK_GAP + 2;
            }
        }
    }
    (lines, dy)
}

fn lay_spans(
    canvas: &Canvas,
    spans: &[Span],
    base: TextStyle,
    width: i32,
    indent: i32,
    mut dy: i32,
    bullet: bool,
    out: &mut Vec<LaidLine>,
) -> i32 {
    let lh = canvas.line_height(base);
    let max = width.max(40) as f32;
    let mut segs: Vec<Seg> = Vec::new();
    let mut cursor = 0f32;
    let mut first = bullet;

    let mut flush = |segs: &mut Vec<Seg>, dy: &mut i32, first: &mut bool| {
        out.push(LaidLine {
            dy: *dy,
            height: lh,
            bullet: *first,
            code_line: false,
            rule: false,
            segs: std::mem::take(segs),
        });
        *first = false;
        *dy += lh;
    };

    for span in spans {
        let style = span_style(base, span);
        let color = if span.code { theme::CHIP_TEXT } else { theme::TEXT };
        for word in span.text.split_whitespace() {
            let word_w = canvas.text_width(word, style);
            let mut space_w = if cursor == 0.0 {
                0.0
            } else {
                canvas.text_width(" ", style)
            };
            if cursor + space_w + word_w > max && cursor > 0.0 {
                flush(&mut segs, &mut dy, &mut first);
                cursor = 0.0;
                space_w = 0.0;
            }
            let dx = indent + (cursor + space_w) as i32;
            cursor += space_w + word_w;
            segs.push(Seg {
                dx,
                text: word.to_string(),
                style,
                color,
                code_bg: span.code,
            });
        }
    }
    if !segs.is_empty() || bullet {
        flush(&mut segs, &mut dy, &mut first);
    }
    dy
}

fn heading_style(base: f32, level: u8) -> TextStyle {
    let size = match level {
        1 => base * 1.5,
        2 => base * 1.3,
        _ => base * 1.15,
    };
    TextStyle::sans(size).bold()
}

fn span_style(base: TextStyle, span: &Span) -> TextStyle {
    let mut style = if span.code {
        TextStyle::mono(base.size * 0.95)
    } else {
        base
    };
    if span.bold {
        style = style.bold();
    }
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Span {
        Span {
            text: text.to_string(),
            bold: false,
            italic: false,
            code: false,
        }
    }

    #[test]
    fn blocks_split_on_structure() {
        let blocks = parse_blocks("# Title\n\nFirst line\nsecond line\n\n- item one\n- item two");
        assert_eq!(blocks.len(), 4);
        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 1,
                spans: vec![plain("Title")],
            }
        );
        assert_eq!(blocks[1], Block::Paragraph(vec![plain("First line second line")]));
        assert_eq!(blocks[2], Block::Bullet(vec![plain("item one")]));
        assert_eq!(blocks[3], Block::Bullet(vec![plain("item two")]));
    }

    #[test]
    fn fenced_code_keeps_lines_verbatim() {
        let blocks = parse_blocks("```sql\nSELECT *\nFROM users;\n```\nafter");
        assert_eq!(
            blocks[0],
            Block::Code(vec!["SELECT *".to_string(), "FROM users;".to_string()])
        );
        assert_eq!(blocks[1], Block::Paragraph(vec![plain("after")]));
    }

    #[test]
    fn unclosed_fence_still_renders() {
        let blocks = parse_blocks("```\ndangling");
        assert_eq!(blocks, vec![Block::Code(vec!["dangling".to_string()])]);
    }

    #[test]
    fn rules_are_detected() {
        assert_eq!(parse_blocks("---"), vec![Block::Rule]);
        assert_eq!(parse_blocks("--"), vec![Block::Paragraph(vec![plain("--")])]);
    }

    #[test]
    fn inline_markers_toggle() {
        let spans = parse_spans("a **bold** and `code` end");
        assert_eq!(spans.len(), 5);
        assert_eq!(spans[0], plain("a "));
        assert!(spans[1].bold);
        assert_eq!(spans[1].text, "bold");
        assert!(spans[3].code);
        assert_eq!(spans[3].text, "code");
        assert_eq!(spans[4], plain(" end"));
    }

    #[test]
    fn italics_toggle_on_single_markers() {
        let spans = parse_spans("_soft_ or *starred*");
        assert!(spans[0].italic);
        assert_eq!(spans[0].text, "soft");
        assert!(spans[2].italic);
        assert_eq!(spans[2].text, "starred");
    }

    #[test]
    fn unclosed_backtick_is_literal() {
        let spans = parse_spans("tick ` rest");
        let joined: String = spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(joined, "tick ` rest");
        assert!(spans.iter().all(|s| !s.code));
    }
}
