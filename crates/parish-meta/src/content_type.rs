//! Catalog of the plugin's content types
//!
//! Registration itself belongs to the host; this catalog only names the types
//! so callers can build records and meta keys without stringly-typed slugs.

use crate::error::MetaError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Parish content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContentType {
    /// Cemetery with plots and opening hours
    #[serde(rename = "parish_cemetery")]
    Cemetery,
    /// Dated parish event
    #[serde(rename = "parish_event")]
    Event,
    /// Photo gallery
    #[serde(rename = "parish_gallery")]
    Gallery,
    /// Parish group or community
    #[serde(rename = "parish_group")]
    Group,
    /// Parish history entry
    #[serde(rename = "parish_history")]
    History,
    /// Mass intention
    #[serde(rename = "parish_intention")]
    Intention,
    /// News article
    #[serde(rename = "parish_news")]
    News,
    /// Newsletter issue
    #[serde(rename = "parish_newsletter")]
    Newsletter,
}

impl ContentType {
    /// Every content type, in registration order
    pub const ALL: [Self; 8] = [
        Self::Cemetery,
        Self::Event,
        Self::Gallery,
        Self::Group,
        Self::History,
        Self::Intention,
        Self::News,
        Self::Newsletter,
    ];

    /// Record type slug
    #[inline]
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Cemetery => "parish_cemetery",
            Self::Event => "parish_event",
            Self::Gallery => "parish_gallery",
            Self::Group => "parish_group",
            Self::History => "parish_history",
            Self::Intention => "parish_intention",
            Self::News => "parish_news",
            Self::Newsletter => "parish_newsletter",
        }
    }

    /// Singular display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cemetery => "Cemetery",
            Self::Event => "Event",
            Self::Gallery => "Gallery",
            Self::Group => "Group",
            Self::History => "History",
            Self::Intention => "Intention",
            Self::News => "News",
            Self::Newsletter => "Newsletter",
        }
    }

    /// Plural display label
    #[must_use]
    pub const fn plural_label(self) -> &'static str {
        match self {
            Self::Cemetery => "Cemeteries",
            Self::Event => "Events",
            Self::Gallery => "Galleries",
            Self::Group => "Groups",
            Self::History => "History",
            Self::Intention => "Intentions",
            Self::News => "News",
            Self::Newsletter => "Newsletters",
        }
    }

    /// Look up a content type by slug
    #[must_use]
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.slug() == slug)
    }

    /// Meta key for a field of this type, e.g. `parish_news_summary`
    #[inline]
    #[must_use]
    pub fn meta_key(self, field: &str) -> String {
        format!("{}_{}", self.slug(), field)
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ContentType {
    type Err = MetaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slug(s).ok_or_else(|| MetaError::UnknownContentType(s.to_string()))
    }
}
