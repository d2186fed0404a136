// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn empty_document_uses_every_default() {
    let config = GlobalConfig::parse("");
    assert_eq!(config.interval_secs, 10);
    assert_eq!(config.priority_ratio, 60.0);
    assert_eq!(config.limits.max_concurrent, 0);
}

#[test]
fn partial_document_overrides_only_the_given_keys() {
    let config = GlobalConfig::parse("priority_ratio = 30\n[limits]\nmax_concurrent = 4\n");
    assert_eq!(config.interval_secs, 10);
    assert_eq!(config.priority_ratio, 30.0);
    assert_eq!(config.limits.max_concurrent, 4);
}

#[test]
fn malformed_document_falls_back_to_defaults() {
    let config = GlobalConfig::parse("interval_secs = [this isn't valid toml");
    assert_eq!(config.interval_secs, 10);
}
