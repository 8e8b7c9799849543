//! Property tests for range resolution arithmetic

use dripfeed_core::range::{RangeSpec, parse_range_header};
use proptest::prelude::*;

proptest! {
    #[test]
    fn resolved_explicit_ranges_stay_in_bounds(
        start in 0u64..10_000,
        end in 0u64..20_000,
        total in 1u64..15_000,
    ) {
        if let Ok(resolved) = RangeSpec::Explicit(start, end).resolve(total) {
            prop_assert!(resolved.length > 0);
            prop_assert_eq!(resolved.start, start);
            prop_assert!(resolved.start + resolved.length <= total);
        }
    }

    #[test]
    fn explicit_end_is_clamped_or_rejected(
        start in 0u64..2_000,
        end in 0u64..5_000,
        total in 1u64..2_000,
    ) {
        match RangeSpec::Explicit(start, end).resolve(total) {
            Ok(resolved) => {
                prop_assert_eq!(resolved.end(), end.min(total - 1));
                prop_assert!(start <= end.min(total - 1));
            }
            Err(_) => prop_assert!(start > end.min(total - 1) || start >= total),
        }
    }

    #[test]
    fn suffix_ranges_end_at_the_file_end(n in 0u64..20_000, total in 0u64..15_000) {
        if let Ok(resolved) = RangeSpec::Suffix(n).resolve(total) {
            prop_assert_eq!(resolved.start + resolved.length, total);
            prop_assert_eq!(resolved.length, n.min(total));
        }
    }

    #[test]
    fn parser_round_trips_explicit_headers(a in 0u64..1_000_000, b in 0u64..1_000_000) {
        let header = format!("bytes={a}-{b}");
        prop_assert_eq!(parse_range_header(&header), Some(RangeSpec::Explicit(a, b)));
    }

    #[test]
    fn resolved_slices_index_safely(
        payload in proptest::collection::vec(any::<u8>(), 1..4096),
        start in 0u64..5_000,
        end in 0u64..5_000,
    ) {
        let total = payload.len() as u64;
        if let Ok(resolved) = RangeSpec::Explicit(start.min(end), start.max(end)).resolve(total) {
            let lo = resolved.start as usize;
            let hi = (resolved.start + resolved.length) as usize;
            let slice = &payload[lo..hi];
            prop_assert_eq!(slice.len() as u64, resolved.length);
        }
    }
}
