// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::metrics::KindLabel;
use prometheus_client::metrics::{counter::Counter, family::Family, histogram::Histogram};
use std::sync::LazyLock;

pub static STATE_TRANSITION_TIME: LazyLock<Histogram> = LazyLock::new(|| {
    let metric = crate::metrics::default_histogram();
    crate::metrics::default_registry().register(
        "cns_state_transition_time",
        "Duration of tipset state transitions in fil_cns",
        metric.clone(),
    );
    metric
});

pub static STATE_TRANSITION_FAILURE: LazyLock<Family<KindLabel, Counter>> = LazyLock::new(|| {
    let metric = Family::default();
    crate::metrics::default_registry().register(
        "cns_state_transition_failure",
        "Number of rejected tipset state transitions, by cause",
        metric.clone(),
    );
    metric
});

pub mod values {
    use crate::metrics::KindLabel;

    pub const INVALID_BASE: KindLabel = KindLabel::new("invalid_base");
    pub const NOT_WINNING_TICKET: KindLabel = KindLabel::new("not_winning_ticket");
    pub const STATE_ROOT_MISMATCH: KindLabel = KindLabel::new("state_root_mismatch");
    pub const RECEIPT_COUNT_MISMATCH: KindLabel = KindLabel::new("receipt_count_mismatch");
    pub const POWER_LOOKUP: KindLabel = KindLabel::new("power_lookup");
    pub const PARENT_WEIGHT: KindLabel = KindLabel::new("parent_weight");
    pub const UNORDERED_TIPSETS: KindLabel = KindLabel::new("unordered_tipsets");
    pub const BLOCK_PROCESSING: KindLabel = KindLabel::new("block_processing");
    pub const TIPSET_PROCESSING: KindLabel = KindLabel::new("tipset_processing");
    pub const CANCELLED: KindLabel = KindLabel::new("cancelled");
    pub const STORE: KindLabel = KindLabel::new("store");
}
