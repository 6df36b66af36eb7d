//! Splitting outbound text to fit a channel's message size limit.

/// Telegram's maximum message length, in UTF-16 code units.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Split `text` into pieces of at most `limit` UTF-16 code units, breaking on
/// line boundaries where possible. Lines longer than `limit` are cut hard
/// between characters.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if utf16_len(text) <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = utf16_len(line);

        if current_len + line_len <= limit {
            current.push_str(line);
            current_len += line_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
        } else {
            let mut piece = String::new();
            let mut piece_len = 0;
            for c in line.chars() {
                let c_len = c.len_utf16();
                if !piece.is_empty() && piece_len + c_len > limit {
                    chunks.push(std::mem::take(&mut piece));
                    piece_len = 0;
                }
                piece.push(c);
                piece_len += c_len;
            }
            if !piece.is_empty() {
                chunks.push(piece);
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_message("привет", 4096), vec!["привет"]);
    }

    #[test]
    fn breaks_on_line_boundaries() {
        let text = "aaaa\nbbbb\ncccc";
        let chunks = split_message(text, 10);
        assert_eq!(chunks, vec!["aaaa\nbbbb\n", "cccc"]);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn long_lines_are_cut_by_characters() {
        let text = "ж".repeat(25);
        let chunks = split_message(&text, 10);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn telegram_sized_reply() {
        let line = format!("{}\n", "x".repeat(99));
        let text = line.repeat(100);
        let chunks = split_message(&text, TELEGRAM_MESSAGE_LIMIT);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= TELEGRAM_MESSAGE_LIMIT));
    }

    #[test]
    fn astral_characters_count_as_two_units() {
        let text = "😀".repeat(3000);
        let chunks = split_message(&text, TELEGRAM_MESSAGE_LIMIT);
        assert_eq!(chunks.len(), 2);
        assert_eq!(utf16_len(&chunks[0]), TELEGRAM_MESSAGE_LIMIT);
        assert!(chunks.iter().all(|c| utf16_len(c) <= TELEGRAM_MESSAGE_LIMIT));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn surrogate_pairs_are_never_split() {
        let chunks = split_message("😀😀😀", 3);
        assert_eq!(chunks, vec!["😀", "😀", "😀"]);
    }
}
