// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_advances_instant_and_epoch_together() {
    let clock = FakeClock::new();
    let before_instant = clock.now();
    let before_epoch = clock.epoch_ms();

    clock.advance(Duration::from_secs(5));

    assert_eq!(clock.now(), before_instant + Duration::from_secs(5));
    assert_eq!(clock.epoch_ms(), before_epoch + 5_000);
}

#[test]
fn fake_clock_set_overrides_instant_only() {
    let clock = FakeClock::new();
    let target = Instant::now() + Duration::from_secs(60);
    clock.set(target);
    assert_eq!(clock.now(), target);
}

#[test]
fn system_clock_epoch_is_plausible() {
    let clock = SystemClock;
    // Any time after 2020-01-01 in epoch ms.
    assert!(clock.epoch_ms() > 1_577_836_800_000);
}
