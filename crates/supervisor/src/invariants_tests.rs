// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property-based check of the admission cap invariant (spec section 8,
//! P1): however broadcasts and executor completions interleave, the
//! number of concurrently active executors never exceeds `maxActive`.

use crate::test_support;
use actl_core::Task;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
enum Op {
    Broadcast,
    CompleteOldest,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Broadcast), Just(Op::CompleteOldest)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn active_count_never_exceeds_max_active(
        max_active in 1usize..4,
        count in 1usize..5,
        ops in prop::collection::vec(op_strategy(), 1..16),
    ) -> Result<(), TestCaseError> {
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        rt.block_on(async move {
            let mut config = test_support::test_config();
            config.count = count;
            config.max_active = max_active;
            let (sup, _tmp, executor, _clock) = test_support::build(config);
            sup.start().await.expect("start");

            let mut next_component = 0usize;
            for op in ops {
                match op {
                    Op::Broadcast => {
                        sup.broadcast_task(Task::new().with_component(format!("c{next_component}")))
                            .await
                            .expect("broadcast");
                        next_component += 1;
                    }
                    Op::CompleteOldest => {
                        if let Some(call) = executor.calls().into_iter().next() {
                            let _ = call
                                .events
                                .send(actl_daemon::ExecutorEvent::Exited {
                                    code: Some(0),
                                    signal: None,
                                })
                                .await;
                        }
                    }
                }
                tokio::time::sleep(Duration::from_millis(10)).await;

                let status = sup.status();
                prop_assert!(
                    status.active <= max_active,
                    "active {} exceeded max_active {}",
                    status.active,
                    max_active
                );
                prop_assert!(
                    status.queue_length == 0 || status.active >= max_active,
                    "queue is non-empty ({}) while a slot ({}/{}) is free",
                    status.queue_length,
                    status.active,
                    max_active
                );
            }

            sup.stop().await;
            Ok(())
        })
    }
}
