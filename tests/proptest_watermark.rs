//! Property tests for watermark precedence and the skip/update decision.

use chrono::{DateTime, Duration, TimeZone, Utc};
use linear_jira_sync::state::{SyncState, SyncedIssue};
use linear_jira_sync::sync::{determine_watermark, needs_update};
use proptest::prelude::*;

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn state_with(last: Option<i64>) -> SyncState {
    let mut state = SyncState::fresh();
    state.last_sync_time = last.map(ts);
    state
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn force_full_sync_always_yields_none(
        last in proptest::option::of(0_i64..4_000_000_000),
        since in proptest::option::of(0_i64..4_000_000_000),
    ) {
        let state = state_with(last);
        prop_assert_eq!(determine_watermark(&state, since.map(ts), true), None);
    }

    #[test]
    fn explicit_since_wins_over_state(
        last in proptest::option::of(0_i64..4_000_000_000),
        since in 0_i64..4_000_000_000,
    ) {
        let state = state_with(last);
        prop_assert_eq!(determine_watermark(&state, Some(ts(since)), false), Some(ts(since)));
    }

    #[test]
    fn state_is_the_fallback(last in proptest::option::of(0_i64..4_000_000_000)) {
        let state = state_with(last);
        prop_assert_eq!(determine_watermark(&state, None, false), last.map(ts));
    }

    #[test]
    fn update_only_when_strictly_newer(
        baseline in 0_i64..4_000_000_000,
        delta in -86_400_i64..86_400,
    ) {
        let updated = ts(baseline) + Duration::seconds(delta);
        prop_assert_eq!(needs_update(Some(updated), Some(ts(baseline))), delta > 0);
        prop_assert!(!needs_update(None, Some(ts(baseline))));
        prop_assert!(needs_update(Some(updated), None));
    }

    #[test]
    fn synced_record_never_regresses_baseline(
        baseline in 0_i64..4_000_000_000,
        delta in 1_i64..86_400,
    ) {
        let mut record = SyncedIssue::new("lin-1", "PROJ-1", "1", Some(ts(baseline)));
        let newer = ts(baseline) + Duration::seconds(delta);
        record.mark_synced(Some(newer));
        prop_assert_eq!(record.source_updated_at, Some(newer));
        record.mark_synced(None);
        prop_assert_eq!(record.source_updated_at, Some(newer));
    }
}

#[test]
fn fresh_state_means_full_sync() {
    assert_eq!(determine_watermark(&SyncState::fresh(), None, false), None);
}
