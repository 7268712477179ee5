//! Event filter rules
//!
//! A [`FilterRuleSet`] is assembled once from every `--include-*` /
//! `--exclude-*` occurrence and then evaluated as a pure predicate.
//!
//! Each axis (event name, category, thread) is decided on its own:
//!
//! 1. An axis without include patterns admits every value; otherwise the
//!    value must match at least one include pattern.
//! 2. A value matching any exclude pattern is rejected, even if it was
//!    included.
//!
//! An event is retained when every axis admits it. Repeated flags union
//! their patterns, and a comma-separated list is the same as repeating the
//! flag once per item. Items are not trimmed, so `"Tiger, Zebra"` names
//! `Tiger` and ` Zebra`.
//!
//! `*` matches any run of characters, possibly empty. Every other character,
//! `?` included, only matches itself.

use scrubjay_shared::RecordedEvent;
use std::fmt;
use std::str::FromStr;
use wildmatch::WildMatchPattern;

use crate::error::{Result, ScrubError};

/// Filtering dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Event,
    Category,
    Thread,
}

/// One of the six rule groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    IncludeEvents,
    ExcludeEvents,
    IncludeCategories,
    ExcludeCategories,
    IncludeThreads,
    ExcludeThreads,
}

impl RuleKind {
    pub const ALL: [RuleKind; 6] = [
        RuleKind::IncludeEvents,
        RuleKind::ExcludeEvents,
        RuleKind::IncludeCategories,
        RuleKind::ExcludeCategories,
        RuleKind::IncludeThreads,
        RuleKind::ExcludeThreads,
    ];

    /// Flag name without leading dashes
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::IncludeEvents => "include-events",
            RuleKind::ExcludeEvents => "exclude-events",
            RuleKind::IncludeCategories => "include-categories",
            RuleKind::ExcludeCategories => "exclude-categories",
            RuleKind::IncludeThreads => "include-threads",
            RuleKind::ExcludeThreads => "exclude-threads",
        }
    }

    pub fn axis(&self) -> Axis {
        match self {
            RuleKind::IncludeEvents | RuleKind::ExcludeEvents => Axis::Event,
            RuleKind::IncludeCategories | RuleKind::ExcludeCategories => Axis::Category,
            RuleKind::IncludeThreads | RuleKind::ExcludeThreads => Axis::Thread,
        }
    }

    pub fn is_include(&self) -> bool {
        matches!(
            self,
            RuleKind::IncludeEvents | RuleKind::IncludeCategories | RuleKind::IncludeThreads
        )
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--{}", self.name())
    }
}

impl FromStr for RuleKind {
    type Err = ScrubError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim_start_matches('-');
        RuleKind::ALL
            .into_iter()
            .find(|k| k.name() == name)
            .ok_or_else(|| ScrubError::InvalidFilter {
                flag: s.to_string(),
                reason: "unknown filter flag".to_string(),
            })
    }
}

/// `*` is the only wildcard. NUL stands in for the single-character
/// wildcard and is refused in patterns by [`parse_patterns`].
type Glob = WildMatchPattern<'*', '\0'>;

/// A literal or a `*` glob, matched against the whole value
#[derive(Clone)]
pub struct Pattern {
    source: String,
    glob: Option<Glob>,
}

impl Pattern {
    pub fn new(source: &str) -> Self {
        let glob = source.contains('*').then(|| Glob::new(source));
        Self {
            source: source.to_string(),
            glob,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_glob(&self) -> bool {
        self.glob.is_some()
    }

    pub fn matches(&self, value: &str) -> bool {
        match &self.glob {
            Some(glob) => glob.matches(value),
            None => self.source == value,
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split a flag argument into patterns.
pub fn parse_patterns(kind: RuleKind, list: &str) -> Result<Vec<Pattern>> {
    let invalid = |reason: String| ScrubError::InvalidFilter {
        flag: kind.to_string(),
        reason,
    };
    list.split(',')
        .map(|item| {
            if item.is_empty() {
                Err(invalid(format!("empty pattern in '{}'", list)))
            } else if item.contains('\0') {
                Err(invalid(format!("NUL character in pattern '{}'", item.escape_debug())))
            } else {
                Ok(Pattern::new(item))
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
struct AxisRules {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl AxisRules {
    fn is_unrestricted(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// `values` are the alternative spellings of the event's value on this
    /// axis (all categories, or full and simple event name).
    fn admits<'a, I>(&self, values: I) -> bool
    where
        I: Iterator<Item = &'a str> + Clone,
    {
        let hit = |patterns: &[Pattern], mut values: I| {
            values.any(|v| patterns.iter().any(|p| p.matches(v)))
        };
        let included = self.include.is_empty() || hit(&self.include, values.clone());
        included && !hit(&self.exclude, values)
    }
}

/// Immutable predicate over event name, category and thread
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRuleSet {
    events: AxisRules,
    categories: AxisRules,
    threads: AxisRules,
}

impl FilterRuleSet {
    pub fn builder() -> FilterBuilder {
        FilterBuilder::default()
    }

    /// Build from `(flag, argument)` occurrences in command-line order.
    pub fn from_rules<'a, I>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = (RuleKind, &'a str)>,
    {
        let mut builder = Self::builder();
        for (kind, list) in rules {
            builder.add(kind, list)?;
        }
        Ok(builder.build())
    }

    /// True when no rule was given; such a set retains every event.
    pub fn is_empty(&self) -> bool {
        self.events.is_unrestricted()
            && self.categories.is_unrestricted()
            && self.threads.is_unrestricted()
    }

    pub fn patterns(&self, kind: RuleKind) -> &[Pattern] {
        let axis = self.axis(kind.axis());
        if kind.is_include() {
            &axis.include
        } else {
            &axis.exclude
        }
    }

    pub fn matches(&self, event: &RecordedEvent) -> bool {
        let event_type = &event.event_type;
        self.matches_values(
            &event_type.name,
            event_type.simple_name(),
            &event_type.categories,
            event.thread_name.as_deref(),
        )
    }

    /// Evaluate against already extracted values.
    pub fn matches_values(
        &self,
        name: &str,
        simple_name: &str,
        categories: &[String],
        thread: Option<&str>,
    ) -> bool {
        self.events.admits([name, simple_name].into_iter())
            && self.categories.admits(categories.iter().map(String::as_str))
            && self.threads.admits(thread.into_iter())
    }

    fn axis(&self, axis: Axis) -> &AxisRules {
        match axis {
            Axis::Event => &self.events,
            Axis::Category => &self.categories,
            Axis::Thread => &self.threads,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AxisRules {
        match axis {
            Axis::Event => &mut self.events,
            Axis::Category => &mut self.categories,
            Axis::Thread => &mut self.threads,
        }
    }
}

/// Accumulates flag occurrences into a [`FilterRuleSet`]
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    rules: FilterRuleSet,
}

impl FilterBuilder {
    /// Add one flag occurrence; `list` may be comma-separated.
    pub fn add(&mut self, kind: RuleKind, list: &str) -> Result<&mut Self> {
        let patterns = parse_patterns(kind, list)?;
        let axis = self.rules.axis_mut(kind.axis());
        let group = if kind.is_include() {
            &mut axis.include
        } else {
            &mut axis.exclude
        };
        for pattern in patterns {
            if !group.contains(&pattern) {
                group.push(pattern);
            }
        }
        Ok(self)
    }

    pub fn build(self) -> FilterRuleSet {
        self.rules
    }
}
