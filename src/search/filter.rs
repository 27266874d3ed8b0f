use chrono::{DateTime, Duration, Utc};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::{DueBucket, SearchQuery};
use crate::entity::Task;

/// Lowercase and strip diacritics, so `BÚG` compares equal to `bug`.
pub fn normalize(s: &str) -> String {
    s.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Split on whitespace and commas, strip a leading `#`, normalize each
/// piece and drop the empty ones.
pub fn tokenize(s: &str) -> Vec<String> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .map(|t| t.strip_prefix('#').unwrap_or(t))
        .filter(|t| !t.is_empty())
        .map(normalize)
        .collect()
}

/// Apply `query` to `tasks`, keeping the input order.
///
/// The clock is read once; every due-date clause in the pass uses the same
/// instant.
pub fn filter_tasks(tasks: &[Task], query: &SearchQuery) -> Vec<Task> {
    filter_tasks_at(tasks, query, Utc::now())
}

/// [`filter_tasks`] against an explicit `now`.
pub fn filter_tasks_at(tasks: &[Task], query: &SearchQuery, now: DateTime<Utc>) -> Vec<Task> {
    let matcher = Matcher::new(query, now);
    tasks.iter().filter(|t| matcher.matches(t)).cloned().collect()
}

/// A query with its text clauses tokenized up front.
struct Matcher<'a> {
    query: &'a SearchQuery,
    text_tokens: Vec<String>,
    tag_tokens: Vec<String>,
    now: DateTime<Utc>,
}

impl<'a> Matcher<'a> {
    fn new(query: &'a SearchQuery, now: DateTime<Utc>) -> Self {
        Self {
            query,
            text_tokens: query.text.as_deref().map(tokenize).unwrap_or_default(),
            tag_tokens: query.tags.iter().flat_map(|t| tokenize(t)).collect(),
            now,
        }
    }

    fn matches(&self, task: &Task) -> bool {
        self.matches_text(task)
            && self.matches_tags(task)
            && self.matches_priority(task)
            && self.matches_due(task)
            && self.matches_estimate(task)
    }

    fn matches_text(&self, task: &Task) -> bool {
        if self.text_tokens.is_empty() {
            return true;
        }
        let haystack = normalize(&format!(
            "{} {}",
            task.title,
            task.description.as_deref().unwrap_or("")
        ));
        self.text_tokens.iter().all(|t| haystack.contains(t.as_str()))
    }

    // Per token, any tag: tokens need not all hit the same tag.
    fn matches_tags(&self, task: &Task) -> bool {
        if self.tag_tokens.is_empty() {
            return true;
        }
        let tags: Vec<String> = task.tags.iter().map(|t| normalize(t)).collect();
        self.tag_tokens
            .iter()
            .all(|token| tags.iter().any(|tag| tag.contains(token.as_str())))
    }

    fn matches_priority(&self, task: &Task) -> bool {
        self.query.priority.map_or(true, |p| task.priority == p)
    }

    fn matches_due(&self, task: &Task) -> bool {
        let Some(bucket) = self.query.due else {
            return true;
        };
        match (bucket, task.due_at) {
            (DueBucket::None, due) => due.is_none(),
            (DueBucket::Overdue, Some(due)) => due < self.now,
            (DueBucket::Week, Some(due)) => due >= self.now && due <= self.now + Duration::weeks(1),
            (_, None) => false,
        }
    }

    fn matches_estimate(&self, task: &Task) -> bool {
        let est = task.estimate_minutes;
        self.query.estimate_min.map_or(true, |min| est >= min)
            && self.query.estimate_max.map_or(true, |max| est <= max)
    }
}
