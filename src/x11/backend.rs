use anyhow::{anyhow, Context, Result};
use fontdue::Font;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    ChangeWindowAttributesAux, ConnectionExt, CreateGCAux, CreateWindowAux, EventMask,
    ImageFormat, WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperConnectionExt;

use crate::ui::canvas::Fonts;

const SANS_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
];

const MONO_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansMono-Regular.ttf",
];

/// The panel's X11 window plus everything needed to push frames at it.
pub struct PanelWindow {
    conn: RustConnection,
    window: u32,
    gc: u32,
    _cursor: u32,
    depth: u8,
    fonts: Fonts,
}

impl PanelWindow {
    pub fn open(width: u16, height: u16, title: &str) -> Result<Self> {
        let fonts = load_fonts()?;
        let (conn, screen_num) = x11rb::connect(None).context("connecting to the X server")?;
        let screen = &conn.setup().roots[screen_num];

        let window = conn.generate_id()?;
        let gc = conn.generate_id()?;

        let aux = CreateWindowAux::new()
            .background_pixel(screen.black_pixel)
            .event_mask(
                EventMask::EXPOSURE
                    | EventMask::BUTTON_PRESS
                    | EventMask::BUTTON_RELEASE
                    | EventMask::STRUCTURE_NOTIFY,
            );

        conn.create_window(
            screen.root_depth,
            window,
            screen.root,
            0,
            0,
            width,
            height,
            0,
            WindowClass::INPUT_OUTPUT,
            0,
            &aux,
        )?;

        conn.create_gc(gc, window, &CreateGCAux::new())?;
        conn.change_property8(
            x11rb::protocol::xproto::PropMode::REPLACE,
            window,
            x11rb::protocol::xproto::AtomEnum::WM_NAME,
            x11rb::protocol::xproto::AtomEnum::STRING,
            title.as_bytes(),
        )?;
        let cursor = create_default_cursor(&conn, window)?;
        let depth = screen.root_depth;
        conn.map_window(window)?;
        conn.flush()?;

        Ok(Self {
            conn,
            window,
            gc,
            _cursor: cursor,
            depth,
            fonts,
        })
    }

    pub fn connection(&self) -> &RustConnection {
        &self.conn
    }

    pub fn fonts(&self) -> &Fonts {
        &self.fonts
    }

    /// Pushes a finished frame to the window in one image transfer.
    pub fn present(&self, width: usize, height: usize, pixels: &[u8]) -> Result<()> {
        self.conn.put_image(
            ImageFormat::Z_PIXMAP,
            self.window,
            self.gc,
            width as u16,
            height as u16,
            0,
            0,
            0,
            self.depth,
            pixels,
        )?;
        self.conn.flush()?;
        Ok(())
    }
}

fn create_default_cursor(conn: &RustConnection, window: u32) -> Result<u32> {
    let font = conn.generate_id()?;
    conn.open_font(font, b"cursor")?;
    let cursor = conn.generate_id()?;
    conn.create_glyph_cursor(cursor, font, font, 68, 69, 0, 0, 0, 0xffff, 0xffff, 0xffff)?;
    conn.close_font(font)?;
    conn.change_window_attributes(window, &ChangeWindowAttributesAux::new().cursor(cursor))?;
    Ok(cursor)
}

fn load_fonts() -> Result<Fonts> {
    let (sans, sans_path) = find_font(std::env::var("NIHILO_FONT").ok(), SANS_CANDIDATES)
        .ok_or_else(|| anyhow!("no usable sans font found; set NIHILO_FONT to a .ttf path"))?;
    let mono = match find_font(std::env::var("NIHILO_MONO_FONT").ok(), MONO_CANDIDATES) {
        Some((mono, _)) => mono,
        // no mono face anywhere, reuse the sans face
        None => load_font_from_path(&sans_path)
            .ok_or_else(|| anyhow!("font at {sans_path} vanished while loading"))?,
    };
    let base_size = std::env::var("NIHILO_FONT_SIZE")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(15.0);
    Ok(Fonts {
        sans,
        mono,
        base_size,
    })
}

fn find_font(preferred: Option<String>, candidates: &[&str]) -> Option<(Font, String)> {
    preferred
        .iter()
        .map(|s| s.as_str())
        .chain(candidates.iter().copied())
        .find_map(|path| load_font_from_path(path).map(|font| (font, path.to_string())))
}

fn load_font_from_path(path: &str) -> Option<Font> {
    match std::fs::read(path) {
        Ok(bytes) => Font::from_bytes(bytes, fontdue::FontSettings::default()).ok(),
        Err(_) => None,
    }
}
