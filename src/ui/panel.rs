use crate::record::model::{ComponentKind, ResponseRecord};
use crate::state::hit_test::{HitTarget, HitTestIndex};
use crate::state::session::{Action, Session, View};
use crate::ui::canvas::{Canvas, Rgb, TextStyle};
use crate::ui::{chart, html, markdown, table, template, theme};

const MARGIN: i32 = 12;
const CARD_PAD: i32 = 10;
const CARD_GAP: i32 = 10;
const CHIP_PAD: i32 = 8;

const WELCOME: &str = "# ex-nihilo\n\
Ask the database anything in plain language. Answers come back as cards: \
prose, tables, charts.\n\
- type a question in the terminal prompt\n\
- click a suggestion chip to follow up\n\
- save the cards you want to keep";

/// Draws one complete frame of the panel and rebuilds the click regions to
/// match it. Cards go down first; header and footer paint over whatever a
/// too-tall newest card spilled into their bands.
pub fn render_frame(canvas: &mut Canvas, session: &Session, hits: &mut HitTestIndex) {
    hits.reset();
    canvas.clear(theme::BG);

    let header_h = header_height(canvas);
    let footer_h = footer_height(canvas, session);

    let area_y = header_h + MARGIN;
    let area_h = canvas.height() - footer_h - area_y - MARGIN;
    let width = canvas.width() - 2 * MARGIN;
    draw_cards(canvas, session, hits, MARGIN, area_y, width, area_h);

    draw_header(canvas, session, hits);
    draw_footer(canvas, session, hits);
}

enum Card<'a> {
    Record(&'a ResponseRecord),
    Pending(&'a str),
    Welcome,
}

fn draw_cards(
    canvas: &mut Canvas,
    session: &Session,
    hits: &mut HitTestIndex,
    x: i32,
    y: i32,
    width: i32,
    area_h: i32,
) {
    // Newest first: the bottom of the area is anchored to the latest card,
    // older ones fill whatever room is left above it.
    let mut newest_first: Vec<Card> = Vec::new();
    if session.view == View::Explore {
        if let Some(question) = session.pending_question() {
            newest_first.push(Card::Pending(question));
        }
    }
    for record in session.visible().iter().rev() {
        newest_first.push(Card::Record(record));
    }
    if session.view == View::Explore && session.transcript.is_empty() && !session.waiting {
        newest_first.push(Card::Welcome);
    }
    if newest_first.is_empty() {
        let style = TextStyle::sans(canvas.base_size());
        canvas.draw_text(
            x + CARD_PAD,
            y + CARD_PAD,
            "nothing saved yet",
            style,
            theme::MUTED,
        );
        return;
    }

    let mut chosen: Vec<(usize, i32)> = Vec::new();
    let mut used = 0;
    for (i, card) in newest_first.iter().enumerate() {
        let h = card_height(canvas, session, card, width);
        if used + h > area_h && !chosen.is_empty() {
            break;
        }
        chosen.push((i, h));
        used += h + CARD_GAP;
        if used > area_h {
            break;
        }
    }

    let total: i32 = chosen.iter().map(|(_, h)| h + CARD_GAP).sum::<i32>() - CARD_GAP;
    let mut cursor = y + (area_h - total).max(0);
    for (i, h) in chosen.iter().rev() {
        draw_card(canvas, session, hits, &newest_first[*i], x, cursor, width, *h);
        cursor += h + CARD_GAP;
    }
}

fn card_height(canvas: &Canvas, session: &Session, card: &Card, width: i32) -> i32 {
    let inner = width - 2 * CARD_PAD;
    match card {
        Card::Welcome => markdown::height(canvas, inner, WELCOME) + 2 * CARD_PAD,
        Card::Pending(_) => {
            let lh = canvas.line_height(TextStyle::sans(canvas.base_size()));
            lh * 2 + 4 + 2 * CARD_PAD
        }
        Card::Record(record) => {
            let mut h = title_height(canvas);
            h += body_height(canvas, session, record, inner);
            if session.details_open(&record.id) {
                let d = details_height(canvas, session, record, inner);
                if d > 0 {
                    h += d + 6;
                }
            }
            h + 2 * CARD_PAD
        }
    }
}

fn draw_card(
    canvas: &mut Canvas,
    session: &Session,
    hits: &mut HitTestIndex,
    card: &Card,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
) {
    canvas.fill_round_rect(x, y, width as u32, height as u32, 6, theme::CARD_BG);
    canvas.draw_rect_outline(x, y, width as u32, height as u32, theme::CARD_BORDER, 1);

    let inner_x = x + CARD_PAD;
    let inner_w = width - 2 * CARD_PAD;
    let mut cursor = y + CARD_PAD;

    match card {
        Card::Welcome => {
            markdown::draw(canvas, inner_x, cursor, inner_w, WELCOME);
        }
        Card::Pending(question) => {
            let style = TextStyle::sans(canvas.base_size());
            let line = canvas.truncate(question, style.bold(), inner_w as f32);
            canvas.draw_text(inner_x, cursor, &line, style.bold(), theme::TEXT);
            cursor += canvas.line_height(style) + 4;
            canvas.draw_text(inner_x, cursor, "waiting for an answer…", style, theme::PENDING);
        }
        Card::Record(record) => {
            cursor = draw_card_title(canvas, session, hits, record, inner_x, cursor, inner_w);
            cursor += body_draw(canvas, session, record, inner_x, cursor, inner_w);
            if session.details_open(&record.id) {
                details_draw(canvas, session, record, inner_x, cursor + 6, inner_w);
            }
        }
    }
}

fn title_height(canvas: &Canvas) -> i32 {
    canvas.line_height(TextStyle::sans(canvas.base_size()))
        + canvas.line_height(TextStyle::sans(canvas.base_size() * 0.8))
        + 6
}

fn draw_card_title(
    canvas: &mut Canvas,
    session: &Session,
    hits: &mut HitTestIndex,
    record: &ResponseRecord,
    x: i32,
    y: i32,
    width: i32,
) -> i32 {
    let title_style = TextStyle::sans(canvas.base_size()).bold();
    let small = TextStyle::sans(canvas.base_size() * 0.8);

    // Buttons build right to left so the title can take the rest.
    let mut right = x + width;
    if has_details(session, record) {
        let details_label = if session.details_open(&record.id) {
            "hide"
        } else {
            "details"
        };
        right = draw_button(
            canvas,
            hits,
            right,
            y,
            details_label,
            theme::CHIP_BG,
            theme::CHIP_TEXT,
            Action::ToggleDetails(record.id.clone()),
        );
    }
    match session.view {
        View::Explore => {
            right = draw_button(
                canvas,
                hits,
                right,
                y,
                "save",
                theme::ACCENT_SOFT,
                theme::ACCENT,
                Action::Save(record.id.clone()),
            );
        }
        View::Saved => {
            right = draw_button(
                canvas,
                hits,
                right,
                y,
                "delete",
                theme::CHIP_BG,
                theme::DANGER,
                Action::Delete(record.id.clone()),
            );
            right = draw_button(
                canvas,
                hits,
                right,
                y,
                "update",
                theme::ACCENT_SOFT,
                theme::ACCENT,
                Action::Update(record.id.clone()),
            );
        }
    }

    let title_w = (right - x - 8).max(40);
    let question = if record.user_input.is_empty() {
        "(no question)"
    } else {
        &record.user_input
    };
    let title = canvas.truncate(question, title_style, title_w as f32);
    canvas.draw_text(x, y, &title, title_style, theme::TEXT);

    let sub = format!("{} · {}", record.display_name, kind_label(record.kind()));
    let sub_y = y + canvas.line_height(title_style);
    canvas.draw_text(x, sub_y, &sub, small, theme::MUTED);
    sub_y + canvas.line_height(small) + 6
}

fn kind_label(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Markdown => "markdown",
        ComponentKind::Html => "html",
        ComponentKind::BarGraph => "bar graph",
        ComponentKind::Fallback => "text",
    }
}

/// Templating rule for a card body: html always expands, markdown only once
/// saved, everything else renders as received.
fn is_templated(session: &Session, record: &ResponseRecord) -> bool {
    match record.kind() {
        ComponentKind::Html => true,
        ComponentKind::Markdown => session.view == View::Saved,
        _ => false,
    }
}

fn card_body(session: &Session, record: &ResponseRecord) -> String {
    let text = record.body_text();
    if is_templated(session, record) {
        template::expand(text, record)
    } else {
        text.to_string()
    }
}

fn body_height(canvas: &Canvas, session: &Session, record: &ResponseRecord, width: i32) -> i32 {
    match record.kind() {
        ComponentKind::Markdown => markdown::height(canvas, width, &card_body(session, record)),
        ComponentKind::Html => html::height(canvas, width, &card_body(session, record)),
        ComponentKind::BarGraph => {
            chart::height(canvas, &chart::parse_bar_entries(record.body_text()))
        }
        ComponentKind::Fallback => {
            plain_height(canvas, width, &record_dump(record), dump_style(canvas))
        }
    }
}

fn body_draw(
    canvas: &mut Canvas,
    session: &Session,
    record: &ResponseRecord,
    x: i32,
    y: i32,
    width: i32,
) -> i32 {
    match record.kind() {
        ComponentKind::Markdown => markdown::draw(canvas, x, y, width, &card_body(session, record)),
        ComponentKind::Html => html::draw(canvas, x, y, width, &card_body(session, record)),
        ComponentKind::BarGraph => {
            chart::draw(canvas, x, y, width, &chart::parse_bar_entries(record.body_text()))
        }
        ComponentKind::Fallback => plain_draw(
            canvas,
            x,
            y,
            width,
            &record_dump(record),
            dump_style(canvas),
            theme::TEXT,
        ),
    }
}

/// Fallback cards show the record itself, pretty-printed; an unrecognized
/// tag still gets everything the backend sent onto the screen.
fn record_dump(record: &ResponseRecord) -> String {
    serde_json::to_string_pretty(record).unwrap_or_default()
}

fn dump_style(canvas: &Canvas) -> TextStyle {
    TextStyle::mono(canvas.base_size() * 0.9)
}

fn plain_height(canvas: &Canvas, width: i32, text: &str, style: TextStyle) -> i32 {
    let lh = canvas.line_height(style);
    text.lines()
        .map(|line| canvas.wrap(line, style, width as f32).len() as i32 * lh)
        .sum()
}

fn plain_draw(
    canvas: &mut Canvas,
    x: i32,
    y: i32,
    width: i32,
    text: &str,
    style: TextStyle,
    color: Rgb,
) -> i32 {
    let lh = canvas.line_height(style);
    let mut dy = 0;
    for line in text.lines() {
        for wrapped in canvas.wrap(line, style, width as f32) {
            canvas.draw_text(x, y + dy, &wrapped, style, color);
            dy += lh;
        }
    }
    dy
}

fn has_details(session: &Session, record: &ResponseRecord) -> bool {
    !record.queries.is_empty()
        || !record.result.is_empty()
        || (is_templated(session, record) && !record.body_text().is_empty())
}

fn details_label_style(canvas: &Canvas) -> TextStyle {
    TextStyle::sans(canvas.base_size() * 0.8).bold()
}

fn details_mono_style(canvas: &Canvas) -> TextStyle {
    TextStyle::mono(canvas.base_size() * 0.85)
}

/// The disclosure behind the details button: the queries that produced the
/// card, the rows they returned, and for templated bodies the source text
/// before expansion.
fn details_height(
    canvas: &Canvas,
    session: &Session,
    record: &ResponseRecord,
    width: i32,
) -> i32 {
    let label_lh = canvas.line_height(details_label_style(canvas));
    let mono = details_mono_style(canvas);
    let mut h = 0;
    if !record.queries.is_empty() {
        let text = record.queries.join("\n");
        h += label_lh + plain_height(canvas, width - 8, &text, mono) + 4 + 8;
    }
    if !record.result.is_empty() {
        h += label_lh + table::height(canvas, &record.result) + 8;
    }
    if is_templated(session, record) && !record.body_text().is_empty() {
        h += label_lh + plain_height(canvas, width - 8, record.body_text(), mono) + 4 + 8;
    }
    h
}

fn details_draw(
    canvas: &mut Canvas,
    session: &Session,
    record: &ResponseRecord,
    x: i32,
    y: i32,
    width: i32,
) -> i32 {
    let label_style = details_label_style(canvas);
    let label_lh = canvas.line_height(label_style);
    let mono = details_mono_style(canvas);
    let mut dy = 0;
    if !record.queries.is_empty() {
        canvas.draw_text(x, y + dy, "queries", label_style, theme::MUTED);
        dy += label_lh;
        dy += mono_box(canvas, x, y + dy, width, &record.queries.join("\n"), mono) + 8;
    }
    if !record.result.is_empty() {
        canvas.draw_text(x, y + dy, "result", label_style, theme::MUTED);
        dy += label_lh;
        dy += table::draw(canvas, x, y + dy, width, &record.result) + 8;
    }
    if is_templated(session, record) && !record.body_text().is_empty() {
        canvas.draw_text(x, y + dy, "template", label_style, theme::MUTED);
        dy += label_lh;
        dy += mono_box(canvas, x, y + dy, width, record.body_text(), mono) + 8;
    }
    dy
}

fn mono_box(canvas: &mut Canvas, x: i32, y: i32, width: i32, text: &str, style: TextStyle) -> i32 {
    let h = plain_height(canvas, width - 8, text, style) + 4;
    canvas.fill_rect(x, y, width.max(0) as u32, h as u32, theme::CODE_BG);
    plain_draw(canvas, x + 4, y + 2, width - 8, text, style, theme::MUTED);
    h
}

fn header_height(canvas: &Canvas) -> i32 {
    canvas.line_height(TextStyle::sans(canvas.base_size() * 1.1).bold()) + 12
}

fn draw_header(canvas: &mut Canvas, session: &Session, hits: &mut HitTestIndex) {
    let title_style = TextStyle::sans(canvas.base_size() * 1.1).bold();
    let h = header_height(canvas);
    canvas.fill_rect(0, 0, canvas.width() as u32, h as u32, theme::HEADER_BG);
    canvas.draw_text(MARGIN, 6, "ex-nihilo", title_style, theme::TEXT);

    let tab_style = TextStyle::sans(canvas.base_size() * 0.9);
    let mut right = canvas.width() - MARGIN;
    for (label, view) in [("saved", View::Saved), ("explore", View::Explore)] {
        let w = canvas.text_width(label, tab_style) as i32 + 2 * CHIP_PAD;
        right -= w + 6;
        let active = session.view == view;
        let bg = if active { theme::ACCENT_SOFT } else { theme::HEADER_BG };
        let fg = if active { theme::ACCENT } else { theme::MUTED };
        canvas.fill_round_rect(right, 5, w as u32, (h - 10) as u32, 4, bg);
        canvas.draw_text(right + CHIP_PAD, 7, label, tab_style, fg);
        hits.add(HitTarget {
            action: Action::SwitchView(view),
            x: right,
            y: 5,
            w: w as u32,
            h: (h - 10) as u32,
        });
    }
}

fn footer_height(canvas: &Canvas, session: &Session) -> i32 {
    let hint_lh = canvas.line_height(TextStyle::sans(canvas.base_size() * 0.8));
    let chip_h = canvas.line_height(TextStyle::sans(canvas.base_size() * 0.85)) + 6;
    let show_chips = session.view == View::Explore && !session.suggestions.is_empty();
    hint_lh + 8 + if show_chips { chip_h + 8 } else { 0 }
}

fn draw_footer(canvas: &mut Canvas, session: &Session, hits: &mut HitTestIndex) {
    let hint_style = TextStyle::sans(canvas.base_size() * 0.8);
    let hint_lh = canvas.line_height(hint_style);
    let chip_style = TextStyle::sans(canvas.base_size() * 0.85);
    let chip_h = canvas.line_height(chip_style) + 6;

    let show_chips = session.view == View::Explore && !session.suggestions.is_empty();
    let footer_h = footer_height(canvas, session);
    let top = canvas.height() - footer_h;
    canvas.fill_rect(0, top, canvas.width() as u32, footer_h as u32, theme::BG);

    if show_chips {
        let mut cx = MARGIN;
        let cy = top;
        for suggestion in &session.suggestions {
            let max_w = (canvas.width() / 2) as f32;
            let label = canvas.truncate(suggestion, chip_style, max_w);
            let w = canvas.text_width(&label, chip_style) as i32 + 2 * CHIP_PAD;
            if cx + w > canvas.width() - MARGIN {
                break;
            }
            canvas.fill_round_rect(cx, cy, w as u32, chip_h as u32, (chip_h / 2) as u32, theme::CHIP_BG);
            canvas.draw_text(cx + CHIP_PAD, cy + 3, &label, chip_style, theme::CHIP_TEXT);
            hits.add(HitTarget {
                action: Action::Suggest(suggestion.clone()),
                x: cx,
                y: cy,
                w: w as u32,
                h: chip_h as u32,
            });
            cx += w + 8;
        }
    }

    let hint_y = canvas.height() - hint_lh - 4;
    canvas.draw_text(
        MARGIN,
        hint_y,
        "type a question in the terminal · :saved :explore :key <value> :quit",
        hint_style,
        theme::MUTED,
    );
    let key_note = if session.api_key.is_empty() {
        ("no api key (set with :key)", theme::DANGER)
    } else {
        ("key set", theme::MUTED)
    };
    let kw = canvas.text_width(key_note.0, hint_style) as i32;
    canvas.draw_text(canvas.width() - MARGIN - kw, hint_y, key_note.0, hint_style, key_note.1);
}

fn draw_button(
    canvas: &mut Canvas,
    hits: &mut HitTestIndex,
    right: i32,
    y: i32,
    label: &str,
    bg: Rgb,
    fg: Rgb,
    action: Action,
) -> i32 {
    let style = TextStyle::sans(canvas.base_size() * 0.85);
    let h = canvas.line_height(style) + 4;
    let w = canvas.text_width(label, style) as i32 + 2 * CHIP_PAD;
    let x = right - w;
    canvas.fill_round_rect(x, y, w as u32, h as u32, 4, bg);
    canvas.draw_text(x + CHIP_PAD, y + 2, label, style, fg);
    hits.add(HitTarget {
        action,
        x,
        y,
        w: w as u32,
        h: h as u32,
    });
    x - 6
}
