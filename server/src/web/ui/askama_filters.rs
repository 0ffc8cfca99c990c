/// Shorten free text (event notes, note contents) for the dashboard and note cards to at most
/// `length` characters, including the appended ellipsis ("…"). The text is cut at a word
/// boundary, unless that would drop more than half of the remaining text.
#[askama::filter_fn]
pub fn ellipsis(value: &str, _: &dyn askama::Values, length: usize) -> askama::Result<String> {
    Ok(shorten(value, length))
}

fn shorten(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    let next_char = text.chars().nth(max_chars.saturating_sub(1));
    if !next_char.is_some_and(char::is_whitespace) {
        if let Some(pos) = cut.rfind(char::is_whitespace) {
            if pos >= cut.len() / 2 {
                cut.truncate(pos);
            }
        }
    }
    let mut result = cut
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '.'))
        .to_owned();
    result.push('…');
    result
}

#[cfg(test)]
mod tests {
    use super::shorten;

    #[test]
    fn test_short_text_is_kept() {
        assert_eq!(shorten("Traer alargador", 20), "Traer alargador");
        assert_eq!(shorten("  Traer alargador\n", 15), "Traer alargador");
    }

    #[test]
    fn test_cut_at_word_boundary() {
        assert_eq!(
            shorten("Reunión de coordinación con el equipo", 20),
            "Reunión de…"
        );
        assert_eq!(shorten("Sala A, Sala B, Sala C", 8), "Sala A…");
        assert_eq!(shorten("Proyector y notebook", 11), "Proyector…");
    }

    #[test]
    fn test_long_words_are_cut() {
        assert_eq!(shorten("Electroencefalografista", 10), "Electroen…");
        assert_eq!(shorten("abc", 0), "…");
    }
}
