use palette::{FromColor, IntoColor};

/// Set of display colors for a note card, derived from the note's base color.
///
/// The base color is used as background. The border is a darker shade of it and the text color is
/// chosen (white or almost black) to be readable on the background.
pub struct NoteColors {
    background: palette::Srgb<u8>,
    border: palette::Srgb<u8>,
    text: palette::Srgb<u8>,
}

/// Lab lightness above which dark text is used
const LIGHT_BACKGROUND_THRESHOLD: f32 = 65.0;

impl NoteColors {
    pub fn from_base_color_hex(base_color_hex: &str) -> Result<Self, String> {
        let base_color: palette::Srgb<u8> = base_color_hex.parse().map_err(|e| format!("{}", e))?;
        let base_color_f32 = base_color.into_format::<f32>();
        let base_color_hsl: palette::Hsl = base_color_f32.into_color();
        let base_color_lab: palette::Lab = base_color_f32.into_color();

        let mut border = base_color_hsl;
        border.lightness = (border.lightness * 0.75).clamp(0.0, 1.0);

        Ok(Self {
            background: base_color,
            border: palette::Srgb::<f32>::from_color(border).into_format(),
            text: if base_color_lab.l > LIGHT_BACKGROUND_THRESHOLD {
                palette::Srgb::new(0x21, 0x25, 0x29)
            } else {
                palette::Srgb::new(0xff, 0xff, 0xff)
            },
        })
    }

    /// Create a CSS style string, which sets all display colors to custom CSS properties, to be
    /// picked up by our CSS styling rules from the main.css file.
    pub fn as_css(&self) -> String {
        format!(
            "--note-bg:#{:x};--note-border:#{:x};--note-text:#{:x};",
            self.background, self.border, self.text,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_store::models::NoteColor;

    #[test]
    fn test_all_note_colors_have_white_text() {
        for color in NoteColor::ALL {
            let colors = NoteColors::from_base_color_hex(color.hex()).unwrap();
            assert!(
                colors.as_css().contains("--note-text:#ffffff;"),
                "{:?} should have white text",
                color
            );
        }
    }

    #[test]
    fn test_light_color_has_dark_text() {
        let colors = NoteColors::from_base_color_hex("#ffeb3b").unwrap();
        assert_eq!(
            colors.as_css(),
            format!(
                "--note-bg:#ffeb3b;--note-border:#{:x};--note-text:#212529;",
                colors.border
            )
        );
    }

    #[test]
    fn test_invalid_color() {
        assert!(NoteColors::from_base_color_hex("green").is_err());
    }
}
