//! Placeholder expansion for additional purge URL templates.
//!
//! A template line may carry one of four tokens that are filled from the
//! triggering content item. Scalar tokens yield exactly one URL; set tokens
//! fan out into one URL per element and yield nothing for an empty set.
//!
//! ```text
//! https://example.com/category/%categories%   + categories [news, rust]
//!   -> https://example.com/category/news
//!   -> https://example.com/category/rust
//! ```

use super::content::ContentItem;

/// Tokens recognised inside a template line.
///
/// Declaration order is the precedence order: when a line carries more than
/// one kind, only the first kind found is substituted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    Slug,
    AuthorNicename,
    Categories,
    Tags,
}

/// Value source for a placeholder kind.
enum Expansion<'a> {
    Scalar(&'a str),
    FanOut(&'a [String]),
}

impl PlaceholderKind {
    pub const ALL: [PlaceholderKind; 4] = [
        PlaceholderKind::Slug,
        PlaceholderKind::AuthorNicename,
        PlaceholderKind::Categories,
        PlaceholderKind::Tags,
    ];

    pub fn token(self) -> &'static str {
        match self {
            PlaceholderKind::Slug => "%slug%",
            PlaceholderKind::AuthorNicename => "%author_nicename%",
            PlaceholderKind::Categories => "%categories%",
            PlaceholderKind::Tags => "%tags%",
        }
    }

    /// First placeholder kind present in `template`, if any.
    pub fn detect(template: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| template.contains(kind.token()))
    }

    fn expansion(self, item: &ContentItem) -> Expansion<'_> {
        match self {
            PlaceholderKind::Slug => Expansion::Scalar(&item.slug),
            PlaceholderKind::AuthorNicename => Expansion::Scalar(&item.author_nicename),
            PlaceholderKind::Categories => Expansion::FanOut(&item.categories),
            PlaceholderKind::Tags => Expansion::FanOut(&item.tags),
        }
    }
}

/// Expand a single template line against `item`.
///
/// The line is trimmed first. Lines without a recognised token pass through
/// verbatim; this never fails.
pub fn expand(template: &str, item: &ContentItem) -> Vec<String> {
    let template = template.trim();

    let Some(kind) = PlaceholderKind::detect(template) else {
        return vec![template.to_string()];
    };

    let token = kind.token();
    match kind.expansion(item) {
        Expansion::Scalar(value) => vec![template.replace(token, value)],
        Expansion::FanOut(values) => values
            .iter()
            .map(|value| template.replace(token, value))
            .collect(),
    }
}
