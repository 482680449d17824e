use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    YouTube,
    Rss,
    Html,
}

impl AdapterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::YouTube => "youtube",
            AdapterKind::Rss => "rss",
            AdapterKind::Html => "html",
        }
    }
}

impl std::str::FromStr for AdapterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "youtube" => Ok(AdapterKind::YouTube),
            "rss" | "atom" | "feed" => Ok(AdapterKind::Rss),
            "html" | "page" => Ok(AdapterKind::Html),
            _ => Err(format!("Unknown adapter kind: {}", s)),
        }
    }
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_enabled() -> bool {
    true
}

/// One named source in the configuration: an adapter kind run once per parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub kind: AdapterKind,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, kind: AdapterKind, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            params,
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_kind_round_trips_through_str() {
        for kind in [AdapterKind::YouTube, AdapterKind::Rss, AdapterKind::Html] {
            assert_eq!(kind.as_str().parse::<AdapterKind>().unwrap(), kind);
        }
        assert_eq!("Atom".parse::<AdapterKind>().unwrap(), AdapterKind::Rss);
        assert!("podcast".parse::<AdapterKind>().is_err());
    }

    #[test]
    fn test_source_config_defaults_enabled() {
        let source: SourceConfig = toml::from_str(
            r#"
            name = "anthropic"
            kind = "rss"
            params = ["https://example.com/feed.xml"]
            "#,
        )
        .unwrap();

        assert!(source.enabled);
        assert_eq!(source.kind, AdapterKind::Rss);
        assert_eq!(source.params.len(), 1);
    }
}
