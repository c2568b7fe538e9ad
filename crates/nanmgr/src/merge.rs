// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Combine every connected client's requested configuration into the one
//! device-level request the HAL hears (spec.md §4.3).

use crate::types::ConfigRequest;

/// Merge a set of per-client requests field-wise. Returns `None` for an
/// empty input — per spec.md §4.3, the caller must `disable()` the HAL
/// instead of merging nothing.
pub fn merge<'a>(requests: impl IntoIterator<Item = &'a ConfigRequest>) -> Option<ConfigRequest> {
    let mut iter = requests.into_iter();
    let first = iter.next()?;
    let mut merged = *first;
    for req in iter {
        merged.support_5g_band |= req.support_5g_band;
        merged.master_preference = merged.master_preference.max(req.master_preference);
        merged.cluster_low = merged.cluster_low.min(req.cluster_low);
        merged.cluster_high = merged.cluster_high.max(req.cluster_high);
        merged.identity_change_callback_enabled |= req.identity_change_callback_enabled;
    }
    Some(merged)
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;

    fn arb_config() -> impl Strategy<Value = ConfigRequest> {
        (any::<u16>(), any::<u16>(), any::<u8>(), any::<bool>(), any::<bool>()).prop_map(
            |(cluster_low, cluster_high, master_preference, support_5g_band, identity_change_callback_enabled)| ConfigRequest {
                cluster_low,
                cluster_high,
                master_preference,
                support_5g_band,
                identity_change_callback_enabled,
            },
        )
    }

    proptest! {
        #[test]
        fn cluster_low_is_the_minimum(a in arb_config(), b in arb_config(), c in arb_config()) {
            let merged = merge([&a, &b, &c]).unwrap();
            prop_assert_eq!(merged.cluster_low, a.cluster_low.min(b.cluster_low).min(c.cluster_low));
        }

        #[test]
        fn cluster_high_is_the_maximum(a in arb_config(), b in arb_config(), c in arb_config()) {
            let merged = merge([&a, &b, &c]).unwrap();
            prop_assert_eq!(merged.cluster_high, a.cluster_high.max(b.cluster_high).max(c.cluster_high));
        }

        #[test]
        fn master_preference_is_the_maximum(a in arb_config(), b in arb_config(), c in arb_config()) {
            let merged = merge([&a, &b, &c]).unwrap();
            prop_assert_eq!(merged.master_preference, a.master_preference.max(b.master_preference).max(c.master_preference));
        }

        #[test]
        fn flags_are_ored(a in arb_config(), b in arb_config(), c in arb_config()) {
            let merged = merge([&a, &b, &c]).unwrap();
            prop_assert_eq!(merged.support_5g_band, a.support_5g_band || b.support_5g_band || c.support_5g_band);
            prop_assert_eq!(
                merged.identity_change_callback_enabled,
                a.identity_change_callback_enabled || b.identity_change_callback_enabled || c.identity_change_callback_enabled
            );
        }
    }
}
