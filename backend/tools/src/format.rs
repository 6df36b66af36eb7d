//! Rendering of search hits for direct display to the user.

use reframe_core::SearchHit;

pub const NO_RESULTS_MESSAGE: &str = "Не удалось найти информацию по этому запросу.";

/// Markdown list of hits, or [`NO_RESULTS_MESSAGE`] when there are none.
pub fn format_results(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }

    let mut out = String::from("### Результаты поиска:\n\n");
    for (i, hit) in hits.iter().enumerate() {
        out.push_str(&format!(
            "{}. **{}**\n   {}\n   Источник: {}\n\n",
            i + 1,
            hit.title,
            hit.snippet,
            hit.url
        ));
    }
    out
}

/// Compact observation text fed back to the model during reasoning.
pub fn format_observation(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }
    hits.iter()
        .map(|h| format!("- {} ({}): {}", h.title, h.url, h.snippet))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(n: u32) -> SearchHit {
        SearchHit {
            title: format!("Title {n}"),
            snippet: format!("Snippet {n}"),
            url: format!("https://example.org/{n}"),
        }
    }

    #[test]
    fn empty_results_use_fixed_message() {
        assert_eq!(format_results(&[]), NO_RESULTS_MESSAGE);
        assert_eq!(format_observation(&[]), NO_RESULTS_MESSAGE);
    }

    #[test]
    fn results_are_numbered_with_sources() {
        let text = format_results(&[hit(1), hit(2)]);
        assert!(text.starts_with("### Результаты поиска:\n\n"));
        assert!(text.contains("1. **Title 1**\n   Snippet 1\n   Источник: https://example.org/1"));
        assert!(text.contains("2. **Title 2**"));
    }

    #[test]
    fn observation_carries_urls() {
        let text = format_observation(&[hit(3)]);
        assert_eq!(text, "- Title 3 (https://example.org/3): Snippet 3");
    }
}
