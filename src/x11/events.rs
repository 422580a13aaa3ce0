use anyhow::Result;
use x11rb::connection::Connection;
use x11rb::protocol::Event;

use crate::x11::backend::PanelWindow;

#[derive(Debug, Clone, Copy)]
pub enum PanelEvent {
    Click { x: i32, y: i32 },
    Resized { width: u16, height: u16 },
    Exposed,
}

/// Non-blocking event poll. Skips events the panel has no use for; returns
/// `None` once the queue is drained.
pub fn poll(window: &PanelWindow) -> Result<Option<PanelEvent>> {
    while let Some(event) = window.connection().poll_for_event()? {
        match event {
            Event::ButtonRelease(ev) => {
                return Ok(Some(PanelEvent::Click {
                    x: ev.event_x.into(),
                    y: ev.event_y.into(),
                }))
            }
            Event::ConfigureNotify(ev) => {
                return Ok(Some(PanelEvent::Resized {
                    width: ev.width,
                    height: ev.height,
                }))
            }
            Event::Expose(ev) if ev.count == 0 => return Ok(Some(PanelEvent::Exposed)),
            _ => {}
        }
    }
    Ok(None)
}
