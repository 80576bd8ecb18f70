//! Node name filters
//!
//! Filters are predicates over a node's display name, as seen after flag
//! decoration. A handful of defaults cover regions and streaming services;
//! providers may replace the two service filters and register any number of
//! named custom filters.

pub mod flag;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use flag::prepend_flag;

pub const HK_FILTER: &str = "hkFilter";
pub const US_FILTER: &str = "usFilter";
pub const JAPAN_FILTER: &str = "japanFilter";
pub const KOREA_FILTER: &str = "koreaFilter";
pub const SINGAPORE_FILTER: &str = "singaporeFilter";
pub const TAIWAN_FILTER: &str = "taiwanFilter";
pub const NETFLIX_FILTER: &str = "netflixFilter";
pub const YOUTUBE_PREMIUM_FILTER: &str = "youtubePremiumFilter";

/// A predicate over a node name.
#[derive(Clone)]
pub struct NodeNameFilter(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl NodeNameFilter {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        NodeNameFilter(Arc::new(predicate))
    }

    /// Matches names containing any of the keywords.
    pub fn keywords<I, S>(keywords: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(Into::into)
            .map(|k| if case_sensitive { k } else { k.to_lowercase() })
            .collect();
        NodeNameFilter::new(move |name| {
            if case_sensitive {
                keywords.iter().any(|k| name.contains(k.as_str()))
            } else {
                let name = name.to_lowercase();
                keywords.iter().any(|k| name.contains(k.as_str()))
            }
        })
    }

    pub fn pattern(regex: Regex) -> Self {
        NodeNameFilter::new(move |name| regex.is_match(name))
    }

    pub fn negate(self) -> Self {
        NodeNameFilter::new(move |name| !self.matches(name))
    }

    pub fn matches(&self, name: &str) -> bool {
        (self.0)(name)
    }
}

impl fmt::Debug for NodeNameFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NodeNameFilter(..)")
    }
}

/// Declarative filter as written in provider files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterSpec {
    Keywords {
        keywords: Vec<String>,
        #[serde(default, rename = "caseSensitive")]
        case_sensitive: bool,
        #[serde(default)]
        exclude: bool,
    },
    Pattern {
        pattern: String,
        #[serde(default)]
        exclude: bool,
    },
}

impl FilterSpec {
    pub fn build(&self) -> Result<NodeNameFilter, regex::Error> {
        let (filter, exclude) = match self {
            FilterSpec::Keywords {
                keywords,
                case_sensitive,
                exclude,
            } => (
                NodeNameFilter::keywords(keywords.iter().cloned(), *case_sensitive),
                *exclude,
            ),
            FilterSpec::Pattern { pattern, exclude } => {
                (NodeNameFilter::pattern(Regex::new(pattern)?), *exclude)
            }
        };
        Ok(if exclude { filter.negate() } else { filter })
    }
}

static REGION_FILTERS: Lazy<[(&'static str, NodeNameFilter); 6]> = Lazy::new(|| {
    [
        (HK_FILTER, NodeNameFilter::keywords(["🇭🇰", "HK", "香港", "港"], true)),
        (US_FILTER, NodeNameFilter::keywords(["🇺🇸", "US", "美国", "美"], true)),
        (JAPAN_FILTER, NodeNameFilter::keywords(["🇯🇵", "JP", "日本", "日"], true)),
        (KOREA_FILTER, NodeNameFilter::keywords(["🇰🇷", "KR", "韩国", "韩", "韓"], true)),
        (
            SINGAPORE_FILTER,
            NodeNameFilter::keywords(["🇸🇬", "SG", "新加坡", "狮城"], true),
        ),
        (TAIWAN_FILTER, NodeNameFilter::keywords(["🇹🇼", "TW", "台湾", "台灣"], true)),
    ]
});

static DEFAULT_NETFLIX_FILTER: Lazy<NodeNameFilter> = Lazy::new(|| {
    NodeNameFilter::keywords(["netflix", "nf", "hkbn", "hkt", "hgc", "nbu"], false)
});

static DEFAULT_YOUTUBE_PREMIUM_FILTER: Lazy<NodeNameFilter> = Lazy::new(|| {
    NodeNameFilter::keywords(["日", "美", "韩", "🇯🇵", "🇺🇸", "🇰🇷"], false)
});

/// The six region filters, in a fixed order.
pub fn region_filters() -> Vec<(&'static str, NodeNameFilter)> {
    REGION_FILTERS.iter().cloned().collect()
}

pub fn default_netflix_filter() -> NodeNameFilter {
    DEFAULT_NETFLIX_FILTER.clone()
}

pub fn default_youtube_premium_filter() -> NodeNameFilter {
    DEFAULT_YOUTUBE_PREMIUM_FILTER.clone()
}

/// Filters fixed by the first provider of an artifact.
#[derive(Debug, Clone)]
pub struct ResolvedFilters {
    pub netflix_filter: NodeNameFilter,
    pub youtube_premium_filter: NodeNameFilter,
    pub custom_filters: HashMap<String, NodeNameFilter>,
}

impl Default for ResolvedFilters {
    fn default() -> Self {
        ResolvedFilters {
            netflix_filter: default_netflix_filter(),
            youtube_premium_filter: default_youtube_premium_filter(),
            custom_filters: HashMap::new(),
        }
    }
}

/// Every filter visible to an artifact, by name.
///
/// Custom filters shadow built-in ones of the same name.
#[derive(Debug, Clone)]
pub struct FilterSet {
    filters: BTreeMap<String, NodeNameFilter>,
}

impl FilterSet {
    pub fn new(resolved: &ResolvedFilters) -> Self {
        let mut filters: BTreeMap<String, NodeNameFilter> = region_filters()
            .into_iter()
            .map(|(name, filter)| (name.to_string(), filter))
            .collect();
        filters.insert(NETFLIX_FILTER.to_string(), resolved.netflix_filter.clone());
        filters.insert(
            YOUTUBE_PREMIUM_FILTER.to_string(),
            resolved.youtube_premium_filter.clone(),
        );
        for (name, filter) in &resolved.custom_filters {
            filters.insert(name.clone(), filter.clone());
        }
        FilterSet { filters }
    }

    pub fn get(&self, name: &str) -> Option<&NodeNameFilter> {
        self.filters.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }
}

impl Default for FilterSet {
    fn default() -> Self {
        FilterSet::new(&ResolvedFilters::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_filters() {
        let filters = FilterSet::default();
        assert!(filters.get(HK_FILTER).unwrap().matches("🇭🇰 HK 01"));
        assert!(filters.get(HK_FILTER).unwrap().matches("香港 IPLC"));
        assert!(!filters.get(HK_FILTER).unwrap().matches("US 01"));
        assert!(filters.get(JAPAN_FILTER).unwrap().matches("日本 东京"));
        assert!(filters.get(TAIWAN_FILTER).unwrap().matches("台湾 01"));
        assert_eq!(filters.names().count(), 8);
    }

    #[test]
    fn test_default_service_filters() {
        assert!(default_netflix_filter().matches("HK HKBN Netflix"));
        assert!(!default_netflix_filter().matches("US 01"));
        assert!(default_youtube_premium_filter().matches("🇺🇸 US 01"));
        assert!(!default_youtube_premium_filter().matches("HK 01"));
    }

    #[test]
    fn test_custom_filter_shadows_builtin() {
        let mut resolved = ResolvedFilters::default();
        resolved
            .custom_filters
            .insert(HK_FILTER.to_string(), NodeNameFilter::new(|_| false));
        resolved
            .custom_filters
            .insert("iplc".to_string(), NodeNameFilter::keywords(["IPLC"], true));
        let filters = FilterSet::new(&resolved);
        assert!(!filters.get(HK_FILTER).unwrap().matches("HK 01"));
        assert!(filters.get("iplc").unwrap().matches("HK IPLC"));
    }

    #[test]
    fn test_filter_spec() {
        let spec: FilterSpec = serde_yaml::from_str("keywords: [iplc]").unwrap();
        assert!(spec.build().unwrap().matches("HK IPLC 01"));

        let spec: FilterSpec =
            serde_yaml::from_str("keywords: [iplc]\ncaseSensitive: true").unwrap();
        assert!(!spec.build().unwrap().matches("HK IPLC 01"));

        let spec: FilterSpec = serde_yaml::from_str("pattern: '^HK'\nexclude: true").unwrap();
        let filter = spec.build().unwrap();
        assert!(!filter.matches("HK 01"));
        assert!(filter.matches("US 01"));

        let spec = FilterSpec::Pattern {
            pattern: "(".to_string(),
            exclude: false,
        };
        assert!(spec.build().is_err());
    }
}
