use fontdue::Font;

pub type Rgb = (u8, u8, u8);

/// The two faces the panel draws with, plus the base size everything scales
/// from.
pub struct Fonts {
    pub sans: Font,
    pub mono: Font,
    pub base_size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Sans,
    Mono,
}

#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub face: Face,
    pub size: f32,
    pub bold: bool,
}

impl TextStyle {
    pub fn sans(size: f32) -> Self {
        Self {
            face: Face::Sans,
            size,
            bold: false,
        }
    }

    pub fn mono(size: f32) -> Self {
        Self {
            face: Face::Mono,
            size,
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Software frame buffer in the window's BGRx layout. A frame is drawn here
/// in full, then handed to the X11 side in one `put_image`.
pub struct Canvas<'f> {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    fonts: &'f Fonts,
}

impl<'f> Canvas<'f> {
    pub fn new(width: usize, height: usize, fonts: &'f Fonts) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width * height * 4],
            fonts,
        }
    }

    pub fn width(&self) -> i32 {
        self.width as i32
    }

    pub fn height(&self) -> i32 {
        self.height as i32
    }

    pub fn base_size(&self) -> f32 {
        self.fonts.base_size
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn clear(&mut self, rgb: Rgb) {
        self.fill_rect(0, 0, self.width as u32, self.height as u32, rgb);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, rgb: Rgb) {
        let (pw, ph) = (self.width as i32, self.height as i32);
        for iy in y..(y + h as i32) {
            for ix in x..(x + w as i32) {
                if ix >= 0 && ix < pw && iy >= 0 && iy < ph {
                    let idx = (iy as usize * self.width + ix as usize) * 4;
                    self.pixels[idx] = rgb.2;
                    self.pixels[idx + 1] = rgb.1;
                    self.pixels[idx + 2] = rgb.0;
                    self.pixels[idx + 3] = 0;
                }
            }
        }
    }

    pub fn draw_rect_outline(&mut self, x: i32, y: i32, w: u32, h: u32, rgb: Rgb, t: u32) {
        for i in 0..t as i32 {
            let (w_i, h_i) = (w as i32, h as i32);
            self.draw_line(x, y + i, x + w_i, y + i, rgb, 1);
            self.draw_line(x, y + h_i - 1 - i, x + w_i, y + h_i - 1 - i, rgb, 1);
            self.draw_line(x + i, y, x + i, y + h_i, rgb, 1);
            self.draw_line(x + w_i - 1 - i, y, x + w_i - 1 - i, y + h_i, rgb, 1);
        }
    }

    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, rgb: Rgb, t: u32) {
        let thickness = t.max(1) as i32;
        let half = thickness / 2;
        let mut x = x1;
        let mut y = y1;
        let dx = (x2 - x1).abs();
        let dy = -(y2 - y1).abs();
        let sx = if x1 < x2 { 1 } else { -1 };
        let sy = if y1 < y2 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.fill_rect(x - half, y - half, thickness as u32, thickness as u32, rgb);
            if x == x2 && y == y2 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    pub fn fill_round_rect(&mut self, x: i32, y: i32, w: u32, h: u32, r: u32, rgb: Rgb) {
        let r = r.min(w.min(h) / 2) as i32;
        let w_i = w as i32;
        let h_i = h as i32;
        self.fill_rect(x + r, y, (w_i - 2 * r).max(0) as u32, h, rgb);
        self.fill_rect(x, y + r, r as u32, (h_i - 2 * r).max(0) as u32, rgb);
        self.fill_rect(x + w_i - r, y + r, r as u32, (h_i - 2 * r).max(0) as u32, rgb);
        self.fill_circle_quadrant(x + r, y + r, r, rgb, -1, -1);
        self.fill_circle_quadrant(x + w_i - r - 1, y + r, r, rgb, 1, -1);
        self.fill_circle_quadrant(x + r, y + h_i - r - 1, r, rgb, -1, 1);
        self.fill_circle_quadrant(x + w_i - r - 1, y + h_i - r - 1, r, rgb, 1, 1);
    }

    fn fill_circle_quadrant(&mut self, cx: i32, cy: i32, r: i32, rgb: Rgb, sx: i32, sy: i32) {
        let r2 = (r * r) as f32;
        for dy in 0..=r {
            let dx = (r2 - (dy * dy) as f32).sqrt() as i32;
            let y = cy + sy * dy;
            let x_start = if sx < 0 { cx - dx } else { cx };
            self.fill_rect(x_start, y, (dx + 1) as u32, 1, rgb);
        }
    }

    /// Draws one line of text with `y` as the top of the line box. Returns
    /// the advance width. Bold is synthesized by overstriking one pixel to
    /// the right.
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, style: TextStyle, rgb: Rgb) -> f32 {
        let width = self.draw_text_pass(x, y, text, style, rgb);
        if style.bold {
            self.draw_text_pass(x + 1, y, text, style, rgb);
        }
        width
    }

    fn draw_text_pass(&mut self, x: i32, y: i32, text: &str, style: TextStyle, rgb: Rgb) -> f32 {
        let primary = self.font_for(style.face);
        let fallback = self.font_for(other_face(style.face));
        let metrics = line_metrics(primary, style.size);
        let baseline = y as f32 + metrics.ascent;
        let mut cursor = x as f32;
        let (pw, ph) = (self.width as i32, self.height as i32);
        for ch in text.chars() {
            let font = if primary.lookup_glyph_index(ch) != 0 {
                primary
            } else {
                fallback
            };
            let (g, bitmap) = font.rasterize(ch, style.size);
            let gx = cursor as i32 + g.xmin;
            let gy = baseline as i32 - (g.ymin + g.height as i32);
            for by in 0..g.height {
                for bx in 0..g.width {
                    let alpha = bitmap[by * g.width + bx];
                    if alpha == 0 {
                        continue;
                    }
                    let px = gx + bx as i32;
                    let py = gy + by as i32;
                    if px >= 0 && px < pw && py >= 0 && py < ph {
                        let idx = (py as usize * self.width + px as usize) * 4;
                        let a = alpha as u16;
                        let inv = 255 - a;
                        let bg = (
                            self.pixels[idx + 2],
                            self.pixels[idx + 1],
                            self.pixels[idx],
                        );
                        self.pixels[idx] = ((rgb.2 as u16 * a + bg.2 as u16 * inv) / 255) as u8;
                        self.pixels[idx + 1] = ((rgb.1 as u16 * a + bg.1 as u16 * inv) / 255) as u8;
                        self.pixels[idx + 2] = ((rgb.0 as u16 * a + bg.0 as u16 * inv) / 255) as u8;
                        self.pixels[idx + 3] = 0;
                    }
                }
            }
            cursor += g.advance_width;
        }
        cursor - x as f32
    }

    pub fn text_width(&self, text: &str, style: TextStyle) -> f32 {
        let primary = self.font_for(style.face);
        let fallback = self.font_for(other_face(style.face));
        let mut width: f32 = text
            .chars()
            .map(|ch| {
                let font = if primary.lookup_glyph_index(ch) != 0 {
                    primary
                } else {
                    fallback
                };
                font.metrics(ch, style.size).advance_width
            })
            .sum();
        if style.bold {
            width += 1.0;
        }
        width
    }

    pub fn line_height(&self, style: TextStyle) -> i32 {
        let m = line_metrics(self.font_for(style.face), style.size);
        ((m.ascent + m.descent.abs() + m.line_gap) * 1.2) as i32
    }

    /// Greedy word wrap. A single word wider than the limit is split hard so
    /// nothing escapes the column.
    pub fn wrap(&self, text: &str, style: TextStyle, max_width: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        for word in text.split_whitespace() {
            for piece in self.split_long_word(word, style, max_width) {
                let candidate = if current.is_empty() {
                    piece.clone()
                } else {
                    format!("{current} {piece}")
                };
                if self.text_width(&candidate, style) <= max_width || current.is_empty() {
                    current = candidate;
                } else {
                    lines.push(current);
                    current = piece;
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        if lines.is_empty() {
            lines.push(String::new());
        }
        lines
    }

    fn split_long_word(&self, word: &str, style: TextStyle, max_width: f32) -> Vec<String> {
        if self.text_width(word, style) <= max_width {
            return vec![word.to_string()];
        }
        let mut pieces = Vec::new();
        let mut current = String::new();
        for ch in word.chars() {
            current.push(ch);
            if self.text_width(&current, style) > max_width && current.chars().count() > 1 {
                current.pop();
                pieces.push(current);
                current = ch.to_string();
            }
        }
        if !current.is_empty() {
            pieces.push(current);
        }
        pieces
    }

    /// Shortens text to fit, with an ellipsis when anything was cut.
    pub fn truncate(&self, text: &str, style: TextStyle, max_width: f32) -> String {
        if self.text_width(text, style) <= max_width {
            return text.to_string();
        }
        let mut kept = String::new();
        for ch in text.chars() {
            kept.push(ch);
            if self.text_width(&format!("{kept}…"), style) > max_width {
                kept.pop();
                break;
            }
        }
        format!("{kept}…")
    }

    fn font_for(&self, face: Face) -> &'f Font {
        match face {
            Face::Sans => &self.fonts.sans,
            Face::Mono => &self.fonts.mono,
        }
    }
}

fn other_face(face: Face) -> Face {
    match face {
        Face::Sans => Face::Mono,
        Face::Mono => Face::Sans,
    }
}

fn line_metrics(font: &Font, size: f32) -> fontdue::LineMetrics {
    font.horizontal_line_metrics(size)
        .unwrap_or(fontdue::LineMetrics {
            ascent: size,
            descent: 0.0,
            line_gap: 0.0,
            new_line_size: size * 1.2,
        })
}
