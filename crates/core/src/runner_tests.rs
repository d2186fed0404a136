// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::task::TaskRecord;

struct FixedExit(i32);

#[async_trait]
impl ExitCodeRunner for FixedExit {
    async fn run(&self, _record: &TaskRecord) -> i32 {
        self.0
    }
}

#[tokio::test]
async fn demo_with_zero_duration_and_no_errors_always_succeeds() {
    let demo = Demo::new(0, 0, 0.0);
    let ok = demo.run(&TaskRecord::new("debian", 1.0)).await;
    assert!(ok);
}

#[tokio::test]
async fn demo_with_error_rate_one_always_fails() {
    let demo = Demo::new(0, 0, 1.0);
    let ok = demo.run(&TaskRecord::new("debian", 1.0)).await;
    assert!(!ok);
}

#[tokio::test]
async fn exit0_treats_zero_as_success() {
    let exit0 = Exit0::new(Arc::new(FixedExit(0)));
    assert!(exit0.run(&TaskRecord::new("debian", 1.0)).await);
}

#[tokio::test]
async fn exit0_treats_nonzero_as_failure() {
    let exit0 = Exit0::new(Arc::new(FixedExit(1)));
    assert!(!exit0.run(&TaskRecord::new("debian", 1.0)).await);
}
