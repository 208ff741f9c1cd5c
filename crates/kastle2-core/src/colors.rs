//! Fixed bank color palette (Wave Bard).
//!
//! `real` is the value stored in the image and driven onto the hardware
//! LED; `display` compensates for how the LED renders next to a screen.

#[derive(Debug, Clone, Copy)]
pub struct PaletteColor {
    pub name: &'static str,
    pub display: &'static str,
    pub real: &'static str,
}

const fn color(name: &'static str, display: &'static str, real: &'static str) -> PaletteColor {
    PaletteColor {
        name,
        display,
        real,
    }
}

pub static BANK_COLORS: &[PaletteColor] = &[
    color("Red", "#FF0000", "#CC0000"),
    color("Orange", "#FFA500", "#FFA500"),
    color("Gold", "#FFD700", "#E6BE00"),
    color("Yellow", "#CCFF11", "#66AA11"),
    color("Lime", "#DFFF88", "#63A600"),
    color("Green", "#00FF00", "#00FF00"),
    color("Light Green", "#AAFFAA", "#55FF55"),
    color("Olive", "#808000", "#334400"),
    color("Teal", "#00A0A0", "#006666"),
    color("Turquoise", "#40E0D0", "#32C1B3"),
    color("Aquamarine", "#7FFFD4", "#66E0B3"),
    color("Lavender", "#A6E6FA", "#CCCCE0"),
    color("White", "#DDDDEE", "#558899"),
    color("Cyan", "#00FFFF", "#00FFFF"),
    color("Light Blue", "#66CCFF", "#3399FF"),
    color("Blue", "#3333FF", "#0000FF"),
    color("Indigo", "#4B0082", "#33006B"),
    color("Purple", "#800080", "#660066"),
    color("Magenta", "#FF00FF", "#D000D0"),
    color("Raspberry", "#FF0066", "#770022"),
    color("Light Pink", "#FF88CC", "#DD55CC"),
    color("Pink", "#FFC0CB", "#FF99AA"),
    color("Brown", "#A52A2A", "#8B1A1A"),
    color("Maroon", "#800000", "#660000"),
];

/// Finds the palette entry whose stored (`real`) value matches `hex`.
pub fn lookup_color(hex: &str) -> Option<&'static PaletteColor> {
    BANK_COLORS.iter().find(|c| c.real == hex)
}
