//! Keyword predicates that gate web search and prompt correction.

/// Phrases that suggest the user wants factual grounding.
pub const DEFAULT_SEARCH_KEYWORDS: &[&str] = &[
    "статья",
    "исследование",
    "факт",
    "методика",
    "метод",
    "техника",
    "что говорит наука",
    "научно доказано",
    "исследования показывают",
    "согласно исследованиям",
    "ссылка",
    "источник",
    "проверь",
    "article",
    "research",
    "fact",
    "method",
    "technique",
    "source",
    "studies show",
];

/// Words in observer feedback that count as a problem report.
pub const DEFAULT_PROBLEM_KEYWORDS: &[&str] = &["ошибка", "проблема"];

/// A case-insensitive substring matcher over a fixed list of phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn search_triggers() -> Self {
        Self::new(DEFAULT_SEARCH_KEYWORDS)
    }

    pub fn problem_triggers() -> Self {
        Self::new(DEFAULT_PROBLEM_KEYWORDS)
    }

    /// The configured list, or `fallback` when there is none.
    pub fn from_override(list: Option<&[String]>, fallback: fn() -> Self) -> Self {
        match list {
            Some(list) if !list.is_empty() => Self::new(list),
            _ => fallback(),
        }
    }

    /// First keyword found anywhere in `text`.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.keywords
            .iter()
            .find(|k| haystack.contains(k.as_str()))
            .map(String::as_str)
    }

    pub fn matches(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Whether the persona should consult web search before answering.
pub fn should_search(triggers: &KeywordSet, user_text: &str) -> bool {
    triggers.matches(user_text)
}

/// Whether observer feedback reports a problem.
///
/// Plain substring presence: "проблематично" counts.
pub fn problem_detected(triggers: &KeywordSet, feedback: &str) -> bool {
    triggers.matches(feedback)
}
