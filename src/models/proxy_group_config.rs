use serde::{Deserialize, Serialize};

/// Type of proxy group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyGroupType {
    #[default]
    #[serde(rename = "select")]
    Select,
    #[serde(rename = "url-test")]
    URLTest,
    #[serde(rename = "fallback")]
    Fallback,
    #[serde(rename = "load-balance")]
    LoadBalance,
}

impl ProxyGroupType {
    /// Get string representation of the proxy group type
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyGroupType::Select => "select",
            ProxyGroupType::URLTest => "url-test",
            ProxyGroupType::Fallback => "fallback",
            ProxyGroupType::LoadBalance => "load-balance",
        }
    }

    /// Whether the client periodically probes the group's members.
    pub fn is_tested(&self) -> bool {
        !matches!(self, ProxyGroupType::Select)
    }
}

/// One declarative rule of a proxy group modifier.
///
/// A rule names the group and describes its members: literal `proxies`
/// (other groups, `DIRECT`, ...) followed by every node accepted by
/// `filter`. A rule with neither takes every node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyGroupConfig {
    /// Name of the proxy group
    pub name: String,
    /// Type of the proxy group
    #[serde(rename = "type", default)]
    pub group_type: ProxyGroupType,
    /// Name of the filter selecting member nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Literal members placed before filtered nodes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proxies: Vec<String>,
    /// URL for testing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Interval in seconds between tests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    /// Tolerance value for tests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<u32>,
}

impl ProxyGroupConfig {
    /// Create a new proxy group config
    pub fn new(name: impl Into<String>, group_type: ProxyGroupType) -> Self {
        Self {
            name: name.into(),
            group_type,
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_proxies<I, S>(mut self, proxies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proxies = proxies.into_iter().map(Into::into).collect();
        self
    }
}

/// Declarative description of the proxy groups an artifact wants.
pub type ProxyGroupModifier = Vec<ProxyGroupConfig>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_group_yaml() {
        let yaml = r#"
- name: Proxy
  type: select
  proxies: [Auto, DIRECT]
  filter: hkFilter
- name: Auto
  type: url-test
  url: http://www.gstatic.com/generate_204
  interval: 300
"#;
        let groups: ProxyGroupModifier = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_type, ProxyGroupType::Select);
        assert_eq!(groups[0].filter.as_deref(), Some("hkFilter"));
        assert_eq!(groups[0].proxies, vec!["Auto", "DIRECT"]);
        assert_eq!(groups[1].group_type, ProxyGroupType::URLTest);
        assert_eq!(groups[1].interval, Some(300));
        assert!(groups[1].group_type.is_tested());
    }
}
