//! Search module: operator parsing and task filtering.

mod filter;

pub use filter::{filter_tasks, filter_tasks_at, normalize, tokenize};

use crate::entity::Priority;

/// Due-date bucket selected with `due:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueBucket {
    /// Has a due date strictly in the past.
    Overdue,
    /// Due between now and seven days from now.
    Week,
    /// No due date at all.
    None,
}

impl std::str::FromStr for DueBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overdue" => Ok(DueBucket::Overdue),
            "week" => Ok(DueBucket::Week),
            "none" => Ok(DueBucket::None),
            _ => Err(format!("Invalid due bucket: {}", s)),
        }
    }
}

/// Structured query parsed from a search string.
///
/// Operators recognized in the query string:
/// - `tag:backend` - required tag substring (can specify multiple)
/// - `p:high` - priority (`low`, `medium`, `high`)
/// - `due:overdue` / `due:week` / `due:none` - due-date bucket
/// - `est:<60`, `est:>=120`, `est:30` - estimate bounds in minutes
///
/// Everything else is free text.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Free text, tokens joined with single spaces
    pub text: Option<String>,
    /// Tag filters (every token must match some tag)
    pub tags: Vec<String>,
    pub priority: Option<Priority>,
    pub due: Option<DueBucket>,
    /// Inclusive lower bound on the estimate
    pub estimate_min: Option<u32>,
    /// Inclusive upper bound on the estimate
    pub estimate_max: Option<u32>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the query has any clause.
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.tags.is_empty()
            && self.priority.is_none()
            && self.due.is_none()
            && self.estimate_min.is_none()
            && self.estimate_max.is_none()
    }
}

/// Parse a raw search string into a [`SearchQuery`].
///
/// Never fails. Operator tokens with invalid values are dropped entirely:
/// `p:urgent` neither filters nor becomes free text.
///
/// # Examples
///
/// ```
/// use kanban_auditor::entity::Priority;
/// use kanban_auditor::search::parse_query;
///
/// let query = parse_query("login bug tag:backend p:high est:<=60");
/// assert_eq!(query.text.as_deref(), Some("login bug"));
/// assert_eq!(query.tags, vec!["backend".to_string()]);
/// assert_eq!(query.priority, Some(Priority::High));
/// assert_eq!(query.estimate_max, Some(60));
/// ```
pub fn parse_query(raw: &str) -> SearchQuery {
    let mut query = SearchQuery::default();
    let mut text = Vec::new();

    for token in raw.split_whitespace() {
        if let Some(value) = token.strip_prefix("tag:") {
            if !value.is_empty() {
                query.tags.push(value.to_string());
            }
        } else if let Some(value) = token.strip_prefix("p:") {
            if let Ok(priority) = value.parse() {
                query.priority = Some(priority);
            }
        } else if let Some(value) = token.strip_prefix("due:") {
            if let Ok(bucket) = value.parse() {
                query.due = Some(bucket);
            }
        } else if let Some(value) = token.strip_prefix("est:") {
            apply_estimate(&mut query, value);
        } else {
            text.push(token);
        }
    }

    if !text.is_empty() {
        query.text = Some(text.join(" "));
    }

    query
}

/// Fold an `est:` value into the min/max range. Strict comparators are
/// turned into inclusive bounds on whole minutes.
fn apply_estimate(query: &mut SearchQuery, value: &str) {
    let (op, digits) = if let Some(rest) = value.strip_prefix("<=") {
        ("<=", rest)
    } else if let Some(rest) = value.strip_prefix(">=") {
        (">=", rest)
    } else if let Some(rest) = value.strip_prefix('<') {
        ("<", rest)
    } else if let Some(rest) = value.strip_prefix('>') {
        (">", rest)
    } else {
        ("=", value)
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return;
    }
    let Ok(n) = digits.parse::<u32>() else {
        return;
    };

    match op {
        "<=" => query.estimate_max = Some(n),
        "<" => query.estimate_max = Some(n.saturating_sub(1)),
        ">=" => query.estimate_min = Some(n),
        ">" => query.estimate_min = Some(n.saturating_add(1)),
        _ => {
            query.estimate_min = Some(n);
            query.estimate_max = Some(n);
        }
    }
}

/// Operator examples shown as search help.
pub fn search_examples() -> &'static [&'static str] {
    &[
        "tag:frontend - tasks tagged frontend",
        "p:high - high priority",
        "due:overdue - past their due date",
        "due:week - due within the next 7 days",
        "due:none - no due date",
        "est:<60 - under 60 minutes",
        "est:>=120 - 120 minutes or more",
        "bug tag:backend - combined",
    ]
}
