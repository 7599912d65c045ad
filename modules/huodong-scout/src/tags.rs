//! Title keyword tagging.
//!
//! Tags come from a fixed, ordered keyword table. Every matching rule
//! contributes its tag; nothing short-circuits. Titles matching no rule get
//! the single fallback tag.

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    DoubleDrops,
    SignIn,
    UnrestrictBattle,
    Event,
    TotalAssault,
    Celebration,
    GrandAssault,
    Exam,
    MiniEvent,
    Rerun,
    Other,
    /// Category label supplied by the page itself, outside the vocabulary.
    Page(String),
}

const VOCABULARY: &[Tag] = &[
    Tag::DoubleDrops,
    Tag::SignIn,
    Tag::UnrestrictBattle,
    Tag::Event,
    Tag::TotalAssault,
    Tag::Celebration,
    Tag::GrandAssault,
    Tag::Exam,
    Tag::MiniEvent,
    Tag::Rerun,
    Tag::Other,
];

/// (title substrings, tag) in evaluation order. Any substring matches.
const TITLE_RULES: &[(&[&str], Tag)] = &[
    (&["2倍", "3倍"], Tag::DoubleDrops),
    (&["登入活动"], Tag::SignIn),
    (&["制约解除决战"], Tag::UnrestrictBattle),
    (&["[活动]"], Tag::Event),
    (&["总力战"], Tag::TotalAssault),
    (&["招募100次"], Tag::Celebration),
    (&["大决战"], Tag::GrandAssault),
    (&["综合战术考试"], Tag::Exam),
    (&["[迷你活动]"], Tag::MiniEvent),
    (&["复刻"], Tag::Rerun),
];

impl Tag {
    pub fn as_str(&self) -> &str {
        match self {
            Tag::DoubleDrops => "资源翻倍",
            Tag::SignIn => "签到",
            Tag::UnrestrictBattle => "制约解除决战",
            Tag::Event => "活动",
            Tag::TotalAssault => "总力战",
            Tag::Celebration => "庆典",
            Tag::GrandAssault => "大决战",
            Tag::Exam => "考试",
            Tag::MiniEvent => "长草活动",
            Tag::Rerun => "复刻",
            Tag::Other => "其他",
            Tag::Page(label) => label,
        }
    }

    /// Map a free-text label onto the vocabulary, so a page label equal to
    /// a known tag name compares equal to that tag.
    pub fn from_label(label: &str) -> Self {
        VOCABULARY
            .iter()
            .find(|tag| tag.as_str() == label)
            .cloned()
            .unwrap_or_else(|| Tag::Page(label.to_string()))
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Insertion-ordered set of tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagSet(Vec<Tag>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `tag` unless already present. Returns whether it was added.
    pub fn insert(&mut self, tag: Tag) -> bool {
        if self.0.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.0.iter().map(Tag::as_str).collect()
    }
}

/// Tags implied by an activity title.
pub fn infer_tags(title: &str) -> TagSet {
    let mut tags = TagSet::new();
    for (patterns, tag) in TITLE_RULES {
        if patterns.iter().any(|p| title.contains(p)) {
            tags.insert(tag.clone());
        }
    }
    if tags.is_empty() {
        tags.insert(Tag::Other);
    }
    tags
}

/// Title tags followed by the page's own type label, when it has one.
pub fn tags_for_card(title: &str, page_type_tag: &str) -> TagSet {
    let mut tags = infer_tags(title);
    let label = page_type_tag.trim();
    if !label.is_empty() {
        tags.insert(Tag::from_label(label));
    }
    tags
}
