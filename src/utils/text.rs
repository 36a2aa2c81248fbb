/// Cuts `value` to at most `max_bytes` without splitting a UTF-8 sequence.
pub fn truncate_utf8_prefix(value: &str, max_bytes: usize) -> String {
    if value.len() <= max_bytes {
        return value.to_string();
    }
    let mut end = max_bytes;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::truncate_utf8_prefix;

    #[test]
    fn keeps_short_values() {
        assert_eq!(truncate_utf8_prefix("date", 10), "date");
        assert_eq!(truncate_utf8_prefix("date", 0), "");
    }

    #[test]
    fn does_not_split_multibyte_chars() {
        assert_eq!(truncate_utf8_prefix("wyd\u{0105}rzenie", 4), "wyd");
        assert_eq!(truncate_utf8_prefix("wyd\u{0105}rzenie", 5), "wyd\u{0105}");
    }
}
