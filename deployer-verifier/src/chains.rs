use crate::Error;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedChain {
    pub id: u64,
    /// Indexer namespace the chain is reported under.
    pub namespace: &'static str,
    pub name: &'static str,
}

const fn chain(id: u64, namespace: &'static str, name: &'static str) -> SupportedChain {
    SupportedChain {
        id,
        namespace,
        name,
    }
}

pub const SUPPORTED_CHAINS: &[SupportedChain] = &[
    chain(1, "MAINNET", "Ethereum"),
    chain(10, "OPTIMISM", "OP Mainnet"),
    chain(130, "UNICHAIN", "Unichain"),
    chain(185, "MINT", "Mint"),
    chain(252, "FRAX", "Fraxtal"),
    chain(255, "KROMA", "Kroma"),
    chain(288, "BOBA", "Boba"),
    chain(291, "ORDERLY", "Orderly"),
    chain(360, "SHAPE", "Shape"),
    chain(480, "WORLDCHAIN", "World Chain"),
    chain(690, "REDSTONE", "Redstone"),
    chain(957, "LYRA", "Derive"),
    chain(1135, "LISK", "Lisk"),
    chain(1750, "METAL", "Metal L2"),
    chain(1868, "SONEIUM", "Soneium"),
    chain(1923, "SWELL", "Swellchain"),
    chain(6805, "RACE", "RACE"),
    chain(7560, "CYBER", "Cyber"),
    chain(8008, "POLYNOMIAL", "Polynomial"),
    chain(8453, "BASE", "Base"),
    chain(34443, "MODE", "Mode"),
    chain(42161, "ARBITRUM_ONE", "Arbitrum One"),
    chain(57073, "INK", "Ink"),
    chain(60808, "BOB", "BOB"),
    chain(7777777, "ZORA", "Zora"),
];

/// Canonical chain identifier.
///
/// Namespaces that are not in [`SUPPORTED_CHAINS`] are kept as `Unsupported`
/// together with the (upper-cased) namespace they came from, so contracts on
/// different unknown chains stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainId {
    Supported(u64),
    Unsupported {
        #[serde(rename = "unsupported")]
        namespace: String,
    },
}

impl ChainId {
    /// Returns the chain id when it belongs to the supported set.
    pub fn supported(id: u64) -> Result<Self, Error> {
        supported_chain(id)
            .map(|chain| Self::Supported(chain.id))
            .ok_or_else(|| Error::UnsupportedChain(id.to_string()))
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, Self::Supported(_))
    }

    pub fn id(&self) -> Option<u64> {
        match self {
            Self::Supported(id) => Some(*id),
            Self::Unsupported { .. } => None,
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supported(id) => write!(f, "{id}"),
            Self::Unsupported { namespace } => write!(f, "unsupported:{namespace}"),
        }
    }
}

/// Accepts either a numeric chain id from the supported set or an indexer namespace.
impl FromStr for ChainId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(namespace) = s.strip_prefix("unsupported:") {
            return Ok(resolve_chain(namespace));
        }
        match s.parse::<u64>() {
            Ok(id) => Self::supported(id),
            Err(_) => Ok(resolve_chain(s)),
        }
    }
}

pub fn supported_chain(id: u64) -> Option<&'static SupportedChain> {
    SUPPORTED_CHAINS.iter().find(|chain| chain.id == id)
}

/// Maps an indexer namespace onto the canonical chain id. Never fails:
/// unknown namespaces resolve to [`ChainId::Unsupported`].
pub fn resolve_chain(namespace: &str) -> ChainId {
    let normalized = namespace.trim().to_ascii_uppercase();
    SUPPORTED_CHAINS
        .iter()
        .find(|chain| chain.namespace == normalized)
        .map(|chain| ChainId::Supported(chain.id))
        .unwrap_or(ChainId::Unsupported {
            namespace: normalized,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case("OPTIMISM", ChainId::Supported(10))]
    #[case("BASE", ChainId::Supported(8453))]
    #[case("base", ChainId::Supported(8453))]
    #[case(" Mode ", ChainId::Supported(34443))]
    #[case("ARBITRUM_ONE", ChainId::Supported(42161))]
    #[case("SOLANA", ChainId::Unsupported { namespace: "SOLANA".into() })]
    #[case("any_evm", ChainId::Unsupported { namespace: "ANY_EVM".into() })]
    #[case("", ChainId::Unsupported { namespace: "".into() })]
    fn resolves_namespaces(#[case] namespace: &str, #[case] expected: ChainId) {
        assert_eq!(resolve_chain(namespace), expected);
    }

    #[test]
    fn supported_table_has_unique_ids_and_namespaces() {
        let ids: HashSet<_> = SUPPORTED_CHAINS.iter().map(|c| c.id).collect();
        let namespaces: HashSet<_> = SUPPORTED_CHAINS.iter().map(|c| c.namespace).collect();
        assert_eq!(ids.len(), SUPPORTED_CHAINS.len());
        assert_eq!(namespaces.len(), SUPPORTED_CHAINS.len());
        for chain in SUPPORTED_CHAINS {
            assert_eq!(chain.namespace, chain.namespace.to_ascii_uppercase());
            assert_eq!(resolve_chain(chain.namespace), ChainId::Supported(chain.id));
        }
    }

    #[test]
    fn parses_ids_and_namespaces() {
        assert_eq!("10".parse::<ChainId>().unwrap(), ChainId::Supported(10));
        assert_eq!("zora".parse::<ChainId>().unwrap(), ChainId::Supported(7777777));
        assert_eq!(
            "unsupported:fantom".parse::<ChainId>().unwrap(),
            ChainId::Unsupported {
                namespace: "FANTOM".into()
            }
        );
        assert!(matches!(
            "424242".parse::<ChainId>(),
            Err(Error::UnsupportedChain(id)) if id == "424242"
        ));
    }

    #[test]
    fn serialization() {
        assert_eq!(
            serde_json::to_value(ChainId::Supported(10)).unwrap(),
            serde_json::json!(10)
        );
        let unsupported = ChainId::Unsupported {
            namespace: "SOLANA".into(),
        };
        let value = serde_json::to_value(&unsupported).unwrap();
        assert_eq!(value, serde_json::json!({ "unsupported": "SOLANA" }));
        assert_eq!(
            serde_json::from_value::<ChainId>(value).unwrap(),
            unsupported
        );
        assert_eq!(unsupported.to_string(), "unsupported:SOLANA");
        assert_eq!(
            unsupported.to_string().parse::<ChainId>().unwrap(),
            unsupported
        );
    }
}
