use config::{Config, File};
use deployer_verifier::discovery::DEFAULT_OSO_URL;
use serde::{de, Deserialize};
use std::{collections::BTreeMap, net::SocketAddr, str::FromStr};
use url::Url;

/// Wrapper under [`serde::de::IgnoredAny`] which implements
/// [`PartialEq`] and [`Eq`] for fields to be ignored.
#[derive(Copy, Clone, Debug, Default, Deserialize)]
struct IgnoredAny(de::IgnoredAny);

impl PartialEq for IgnoredAny {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for IgnoredAny {}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub server: ServerSettings,
    pub discovery: DiscoverySettings,
    pub reconciliation: ReconciliationSettings,
    pub metrics: MetricsSettings,

    // Is required as we deny unknown fields, but allow users provide
    // path to config through PREFIX__CONFIG env variable. If removed,
    // the setup would fail with `unknown field `config`, expected one of...`
    #[serde(rename = "config")]
    config_path: IgnoredAny,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from_str("0.0.0.0:8050").expect("should be valid url"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiscoverySettings {
    Oso(OsoSettings),
    Static(StaticDiscoverySettings),
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self::Oso(Default::default())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct OsoSettings {
    pub url: Url,
    pub api_key: Option<String>,
    /// Timeout of a single request in seconds.
    pub request_timeout: u64,
    /// Retries of transient failures, on top of the first attempt.
    pub max_retries: u32,
}

impl Default for OsoSettings {
    fn default() -> Self {
        Self {
            url: Url::parse(DEFAULT_OSO_URL).expect("valid url"),
            api_key: None,
            request_timeout: 10,
            max_retries: 3,
        }
    }
}

/// Fixed deployer to contracts mapping, keyed by deployer address.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StaticDiscoverySettings {
    pub deployers: BTreeMap<String, Vec<StaticContractSettings>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StaticContractSettings {
    pub contract_address: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ReconciliationSettings {
    /// Upper bound in seconds on a discovery call, retries included.
    pub discovery_timeout: u64,
}

impl Default for ReconciliationSettings {
    fn default() -> Self {
        Self {
            discovery_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub addr: SocketAddr,
    pub route: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: SocketAddr::from_str("0.0.0.0:6060").expect("should be valid url"),
            route: "/metrics".to_string(),
        }
    }
}

impl Settings {
    pub fn new() -> anyhow::Result<Self> {
        let config_path = std::env::var("DEPLOYER_VERIFIER__CONFIG");

        let mut builder = Config::builder();
        if let Ok(config_path) = config_path {
            builder = builder.add_source(File::with_name(&config_path));
        };
        // Use `__` so that it would be possible to address keys with underscores in names (e.g. `api_key`)
        builder = builder
            .add_source(config::Environment::with_prefix("DEPLOYER_VERIFIER").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;

        Ok(settings)
    }
}
