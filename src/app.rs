use std::io::{self, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Result;

use crate::api::Backend;
use crate::record;
use crate::state::hit_test::{HitTarget, HitTestIndex};
use crate::state::session::{Action, Session, View};
use crate::store::SavedStore;
use crate::ui::canvas::Canvas;
use crate::ui::{panel, theme};
use crate::x11::backend::PanelWindow;
use crate::x11::events::{self, PanelEvent};

#[derive(Debug, PartialEq)]
enum Input {
    Question(String),
    SwitchView(View),
    SetKey(String),
    Help,
    Quit,
    Unknown(String),
}

pub fn run() -> Result<()> {
    let backend = Backend::from_env()?;
    let store = SavedStore::open_default();
    let api_key = std::env::var("NIHILO_API_KEY")
        .ok()
        .or_else(|| store.load_api_key())
        .unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!("no API key on file; questions will fail until :key is set");
    }
    let mut session = Session::new(api_key, store.load_saved());

    let (width, height) = window_size();
    let window = PanelWindow::open(width, height, "ex-nihilo")?;
    let mut size = (width as usize, height as usize);
    let mut hits = HitTestIndex::new();

    println!("ex-nihilo ready. Type a question, or :help for commands.");

    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let mut line = String::new();
        loop {
            print!(">> ");
            let _ = io::stdout().flush();
            line.clear();
            if io::stdin().read_line(&mut line).is_err() {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if tx.send(trimmed.to_string()).is_err() {
                break;
            }
        }
    });

    let mut frame = render(&window, size, &session, &mut hits)?;
    let mut dirty = false;

    loop {
        while let Ok(line) = rx.try_recv() {
            match parse_input(&line) {
                Input::Quit => return Ok(()),
                Input::Help => print_help(),
                Input::SwitchView(view) => {
                    session.switch_view(view);
                    dirty = true;
                }
                Input::SetKey(value) => {
                    if value.is_empty() {
                        println!("usage: :key <value>");
                    } else {
                        session.api_key = value;
                        if let Err(err) = store.store_api_key(&session.api_key) {
                            tracing::warn!("API key not persisted: {err}");
                        }
                        dirty = true;
                    }
                }
                Input::Unknown(command) => {
                    println!("unknown command {command}; try :help");
                }
                Input::Question(text) => {
                    frame = ask(&window, size, &mut session, &backend, &mut hits, &text)?;
                    dirty = true;
                }
            }
        }

        while let Some(event) = events::poll(&window)? {
            match event {
                PanelEvent::Click { x, y } => {
                    let Some(target) = hits.hit_target(x, y).cloned() else {
                        continue;
                    };
                    flash_press(&window, size, &mut frame, &target)?;
                    if let Some(question) =
                        apply_action(&mut session, &backend, &store, target.action)
                    {
                        frame =
                            ask(&window, size, &mut session, &backend, &mut hits, &question)?;
                    }
                    dirty = true;
                }
                PanelEvent::Resized {
                    width: new_w,
                    height: new_h,
                } => {
                    let new_size = (new_w as usize, new_h as usize);
                    if new_size != size && new_w > 0 && new_h > 0 {
                        size = new_size;
                        dirty = true;
                    }
                }
                PanelEvent::Exposed => dirty = true,
            }
        }

        if dirty {
            frame = render(&window, size, &session, &mut hits)?;
            dirty = false;
        }

        thread::sleep(Duration::from_millis(16));
    }
}

/// Sends one question through the backend. The pending card goes up before
/// the request so the window shows what it is waiting for; on failure the
/// card simply stays pending and the warning goes to the log.
fn ask<'w>(
    window: &'w PanelWindow,
    size: (usize, usize),
    session: &mut Session,
    backend: &Backend,
    hits: &mut HitTestIndex,
    question: &str,
) -> Result<Canvas<'w>> {
    session.begin_question(question);
    let frame = render(window, size, session, hits)?;
    match backend.universal(question, &session.api_key) {
        Ok(answer) => {
            let answer = record::ingest(answer);
            tracing::info!(id = %answer.id, kind = ?answer.kind(), "answer received");
            session.resolve(answer);
        }
        Err(err) => tracing::warn!("question not answered: {err}"),
    }
    Ok(frame)
}

fn apply_action(
    session: &mut Session,
    backend: &Backend,
    store: &SavedStore,
    action: Action,
) -> Option<String> {
    match action {
        Action::Suggest(text) => return Some(text),
        Action::SwitchView(view) => session.switch_view(view),
        Action::ToggleDetails(id) => session.toggle_details(&id),
        Action::Save(id) => {
            if session.save(&id) {
                persist_saved(store, session);
            }
        }
        Action::Update(id) => {
            let queries = session.queries_of(&id).unwrap_or_default();
            if queries.is_empty() {
                tracing::debug!(id = %id, "no queries to re-run");
            } else {
                match backend.run_queries(&queries) {
                    Ok(rows) => {
                        session.update_result(&id, rows);
                        persist_saved(store, session);
                    }
                    Err(err) => tracing::warn!("update failed: {err}"),
                }
            }
        }
        Action::Delete(id) => {
            if session.delete_saved(&id) {
                persist_saved(store, session);
            }
        }
    }
    None
}

fn persist_saved(store: &SavedStore, session: &Session) {
    if let Err(err) = store.write_saved(&session.saved) {
        tracing::warn!("saved cards not written: {err}");
    }
}

fn render<'w>(
    window: &'w PanelWindow,
    size: (usize, usize),
    session: &Session,
    hits: &mut HitTestIndex,
) -> Result<Canvas<'w>> {
    let mut frame = Canvas::new(size.0, size.1, window.fonts());
    panel::render_frame(&mut frame, session, hits);
    window.present(size.0, size.1, frame.pixels())?;
    Ok(frame)
}

fn flash_press(
    window: &PanelWindow,
    size: (usize, usize),
    frame: &mut Canvas,
    target: &HitTarget,
) -> Result<()> {
    frame.draw_rect_outline(target.x, target.y, target.w, target.h, theme::PRESS, 2);
    window.present(size.0, size.1, frame.pixels())?;
    thread::sleep(Duration::from_millis(60));
    Ok(())
}

fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    match trimmed {
        ":quit" | ":q" => Input::Quit,
        ":help" => Input::Help,
        ":saved" => Input::SwitchView(View::Saved),
        ":explore" => Input::SwitchView(View::Explore),
        _ => {
            if let Some(rest) = trimmed.strip_prefix(":key") {
                Input::SetKey(rest.trim().to_string())
            } else if trimmed.starts_with(':') {
                Input::Unknown(trimmed.to_string())
            } else {
                Input::Question(trimmed.to_string())
            }
        }
    }
}

fn print_help() {
    println!("anything you type is sent to the model as a question");
    println!("  :saved      show saved cards");
    println!("  :explore    back to the conversation");
    println!("  :key <v>    set the API key");
    println!("  :quit       leave");
}

fn window_size() -> (u16, u16) {
    let parsed = std::env::var("NIHILO_WINDOW").ok().and_then(|value| {
        let (w, h) = value.split_once('x')?;
        Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
    });
    let (w, h): (u16, u16) = parsed.unwrap_or((960, 720));
    (w.max(320), h.max(240))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse() {
        assert_eq!(parse_input(":quit"), Input::Quit);
        assert_eq!(parse_input(" :q "), Input::Quit);
        assert_eq!(parse_input(":saved"), Input::SwitchView(View::Saved));
        assert_eq!(parse_input(":explore"), Input::SwitchView(View::Explore));
        assert_eq!(
            parse_input(":key sk-123"),
            Input::SetKey("sk-123".to_string())
        );
        assert_eq!(parse_input(":key"), Input::SetKey(String::new()));
        assert_eq!(
            parse_input(":frobnicate"),
            Input::Unknown(":frobnicate".to_string())
        );
    }

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(
            parse_input("how many users signed up today?"),
            Input::Question("how many users signed up today?".to_string())
        );
    }
}
