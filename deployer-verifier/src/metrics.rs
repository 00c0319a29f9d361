use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

lazy_static! {
    pub static ref DEPLOYER_VERIFICATIONS: IntCounterVec = register_int_counter_vec!(
        "deployer_verifier_verifications_total",
        "number of deployer ownership confirmations",
        &["status"],
    )
    .unwrap();
    pub static ref DISCOVERY_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "deployer_verifier_discovery_requests_total",
        "number of contract discovery requests to the indexer",
        &["status"],
    )
    .unwrap();
    pub static ref DROPPED_DISCOVERED_CONTRACTS: IntCounter = register_int_counter!(
        "deployer_verifier_dropped_discovered_contracts_total",
        "number of indexer results dropped because of malformed addresses",
    )
    .unwrap();
}

pub fn count_verification(verified: bool) {
    let status = if verified { "ok" } else { "fail" };
    DEPLOYER_VERIFICATIONS.with_label_values(&[status]).inc();
}

pub fn count_discovery(status: &str) {
    DISCOVERY_REQUESTS.with_label_values(&[status]).inc();
}
