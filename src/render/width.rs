use unicode_width::UnicodeWidthStr;

/// Columns `text` occupies once ANSI escapes are stripped.
pub fn display_width(text: &str) -> usize {
    let stripped = strip_ansi_escapes::strip(text);
    UnicodeWidthStr::width(String::from_utf8_lossy(&stripped).as_ref())
}

/// Cut `text` to at most `max_width` columns, ending with `…` when shortened.
pub fn truncate_display(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }

    let mut result = String::new();
    let mut width = 0usize;
    for ch in text.chars() {
        let w = display_width(ch.encode_utf8(&mut [0; 4]));
        if width + w >= max_width {
            if width < max_width {
                result.push('…');
            }
            break;
        }
        width += w;
        result.push(ch);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_escape_sequences() {
        assert_eq!(display_width("\x1b[36mabc\x1b[0m"), 3);
        assert_eq!(display_width("⚡"), 2);
    }

    #[test]
    fn truncates_with_ellipsis() {
        assert_eq!(truncate_display("quantum", 10), "quantum");
        assert_eq!(truncate_display("quantum physics", 8), "quantum…");
    }
}
