pub mod canvas;
pub mod chart;
pub mod html;
pub mod markdown;
pub mod panel;
pub mod table;
pub mod template;

/// Panel palette. Everything draws from these so the whole surface shifts
/// together if one value changes.
pub mod theme {
    use super::canvas::Rgb;

    pub const BG: Rgb = (18, 20, 26);
    pub const HEADER_BG: Rgb = (24, 27, 35);
    pub const CARD_BG: Rgb = (28, 31, 40);
    pub const CARD_BORDER: Rgb = (52, 57, 70);
    pub const TEXT: Rgb = (222, 226, 235);
    pub const MUTED: Rgb = (140, 148, 163);
    pub const ACCENT: Rgb = (86, 156, 255);
    pub const ACCENT_SOFT: Rgb = (31, 58, 97);
    pub const CHIP_BG: Rgb = (38, 52, 74);
    pub const CHIP_TEXT: Rgb = (158, 196, 255);
    pub const DANGER: Rgb = (224, 96, 96);
    pub const PENDING: Rgb = (214, 178, 94);
    pub const CODE_BG: Rgb = (22, 24, 31);
    pub const TABLE_HEAD_BG: Rgb = (34, 38, 48);
    pub const GRID: Rgb = (60, 65, 80);
    pub const BAR: Rgb = (84, 170, 255);
    pub const PRESS: Rgb = (240, 244, 252);
}
