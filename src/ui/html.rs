use crate::ui::canvas::Canvas;
use crate::ui::markdown::{self, Block, Span};

/// Flows sanitizer-free HTML as text. Markup is reduced to the block
/// structure the panel can draw (headings, paragraphs, bullets, pre) and
/// every other tag is dropped; the text between tags survives with entities
/// decoded. Script and style bodies are discarded whole.
#[derive(Debug, Clone, PartialEq)]
pub enum HtmlBlock {
    Heading(u8, String),
    Paragraph(String),
    Bullet(String),
    Pre(Vec<String>),
}

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    Paragraph,
    Heading(u8),
    Bullet,
}

pub fn parse_html_blocks(html: &str) -> Vec<HtmlBlock> {
    let mut blocks = Vec::new();
    let mut text = String::new();
    let mut mode = Mode::Paragraph;
    let mut rest = html;

    loop {
        match rest.find('<') {
            None => {
                text.push_str(rest);
                break;
            }
            Some(at) => {
                text.push_str(&rest[..at]);
                rest = &rest[at..];
                let Some(end) = rest.find('>') else {
                    // Dangling '<' with no close; treat as text.
                    text.push_str(rest);
                    break;
                };
                let tag = &rest[1..end];
                rest = &rest[end + 1..];
                let (name, closing) = tag_name(tag);
                match name.as_str() {
                    "script" | "style" if !closing => {
                        let close = format!("</{name}");
                        match rest.to_ascii_lowercase().find(&close) {
                            Some(stop) => {
                                rest = &rest[stop..];
                                rest = &rest[rest.find('>').map(|i| i + 1).unwrap_or(rest.len())..];
                            }
                            None => rest = "",
                        }
                    }
                    "pre" if !closing => {
                        flush(&mut blocks, &mut text, mode);
                        let stop = rest.to_ascii_lowercase().find("</pre").unwrap_or(rest.len());
                        let body = &rest[..stop];
                        rest = &rest[stop..];
                        rest = &rest[rest.find('>').map(|i| i + 1).unwrap_or(rest.len())..];
                        let lines: Vec<String> = body
                            .trim_matches('\n')
                            .lines()
                            .map(decode_entities)
                            .collect();
                        if !lines.is_empty() {
                            blocks.push(HtmlBlock::Pre(lines));
                        }
                    }
                    "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                        flush(&mut blocks, &mut text, mode);
                        mode = if closing {
                            Mode::Paragraph
                        } else {
                            Mode::Heading(name.as_bytes()[1] - b'0')
                        };
                    }
                    "li" => {
                        flush(&mut blocks, &mut text, mode);
                        mode = if closing { Mode::Paragraph } else { Mode::Bullet };
                    }
                    "p" | "div" | "br" | "hr" | "ul" | "ol" | "table" | "tr" | "section"
                    | "article" | "blockquote" => {
                        flush(&mut blocks, &mut text, mode);
                        if closing && mode != Mode::Paragraph {
                            mode = Mode::Paragraph;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    flush(&mut blocks, &mut text, mode);
    blocks
}

fn flush(blocks: &mut Vec<HtmlBlock>, text: &mut String, mode: Mode) {
    let collapsed = decode_entities(&text.split_whitespace().collect::<Vec<_>>().join(" "));
    text.clear();
    if collapsed.is_empty() {
        return;
    }
    blocks.push(match mode {
        Mode::Paragraph => HtmlBlock::Paragraph(collapsed),
        Mode::Heading(level) => HtmlBlock::Heading(level, collapsed),
        Mode::Bullet => HtmlBlock::Bullet(collapsed),
    });
}

fn tag_name(tag: &str) -> (String, bool) {
    let tag = tag.trim();
    let closing = tag.starts_with('/');
    let tag = tag.trim_start_matches('/');
    let name: String = tag
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    (name, closing)
}

pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        // A ';' more than 12 bytes out means this '&' is ordinary text.
        let Some(semi) = rest.find(';').filter(|&i| i < 12) else {
            out.push('&');
            rest = &rest[1..];
            continue;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some(' '),
            _ => entity
                .strip_prefix('#')
                .and_then(|digits| digits.parse::<u32>().ok())
                .and_then(char::from_u32),
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn height(canvas: &Canvas, width: i32, html: &str) -> i32 {
    markdown::height_of_blocks(canvas, width, &to_layout_blocks(html))
}

pub fn draw(canvas: &mut Canvas, x: i32, y: i32, width: i32, html: &str) -> i32 {
    markdown::draw_blocks(canvas, x, y, width, &to_layout_blocks(html))
}

/// HTML text becomes plain spans on purpose: a `*` inside markup is content,
/// not emphasis.
fn to_layout_blocks(html: &str) -> Vec<Block> {
    parse_html_blocks(html)
        .into_iter()
        .map(|block| match block {
            HtmlBlock::Heading(level, text) => Block::Heading {
                level,
                spans: vec![plain(text)],
            },
            HtmlBlock::Paragraph(text) => Block::Paragraph(vec![plain(text)]),
            HtmlBlock::Bullet(text) => Block::Bullet(vec![plain(text)]),
            HtmlBlock::Pre(lines) => Block::Code(lines),
        })
        .collect()
}

fn plain(text: String) -> Span {
    Span {
        text,
        bold: false,
        italic: false,
        code: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_reduce_to_blocks() {
        let blocks = parse_html_blocks(
            "<h2>Users</h2><p>There are <b>42</b> users.</p><ul><li>alice</li><li>bob</li></ul>",
        );
        assert_eq!(
            blocks,
            vec![
                HtmlBlock::Heading(2, "Users".to_string()),
                HtmlBlock::Paragraph("There are 42 users.".to_string()),
                HtmlBlock::Bullet("alice".to_string()),
                HtmlBlock::Bullet("bob".to_string()),
            ]
        );
    }

    #[test]
    fn entities_decode() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#169;"), "a & b <c> ©");
        assert_eq!(decode_entities("no entity & here"), "no entity & here");
        assert_eq!(decode_entities("&bogus; stays"), "&bogus; stays");
    }

    #[test]
    fn entities_decode_amid_multibyte_text() {
        assert_eq!(decode_entities("&amp; brûlée"), "& brûlée");
        assert_eq!(decode_entities("&0123456789éx"), "&0123456789éx");
        assert_eq!(decode_entities("crème &#233;clair"), "crème éclair");
    }

    #[test]
    fn script_and_style_bodies_vanish() {
        let blocks =
            parse_html_blocks("before <script>alert('x')</script>after<style>p{}</style>!");
        assert_eq!(
            blocks,
            vec![HtmlBlock::Paragraph("before after!".to_string())]
        );
    }

    #[test]
    fn pre_keeps_lines() {
        let blocks = parse_html_blocks("<pre>SELECT 1;\nSELECT 2;</pre>");
        assert_eq!(
            blocks,
            vec![HtmlBlock::Pre(vec![
                "SELECT 1;".to_string(),
                "SELECT 2;".to_string()
            ])]
        );
    }

    #[test]
    fn dangling_angle_is_text() {
        let blocks = parse_html_blocks("5 < 6 but unclosed");
        assert_eq!(
            blocks,
            vec![HtmlBlock::Paragraph("5 < 6 but unclosed".to_string())]
        );
    }

    #[test]
    fn br_splits_paragraphs() {
        let blocks = parse_html_blocks("one<br/>two");
        assert_eq!(
            blocks,
            vec![
                HtmlBlock::Paragraph("one".to_string()),
                HtmlBlock::Paragraph("two".to_string()),
            ]
        );
    }
}
