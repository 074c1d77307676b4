use super::types::Plan;

/// Lease months assigned to one fleet position. The split depends on
/// fleet size: a single vehicle carries the whole term, a pair splits it
/// 38/46, a trio splits it 38/38/8. Fleet sizes outside 1..=3 (and slot
/// indexes outside the fleet) get 0 months; callers must treat 0 as "not
/// allocable". Both plans currently share the same table; the plan
/// parameter stays so they can diverge.
pub fn lease_months(plan: Plan, fleet_size: usize, slot_index: usize) -> u32 {
    match plan {
        Plan::JSeven | Plan::JNine => match (fleet_size, slot_index) {
            (1, 0) => 84,
            (2, 0) => 38,
            (2, 1) => 46,
            (3, 0 | 1) => 38,
            (3, 2) => 8,
            _ => 0,
        },
    }
}

/// Whether the vehicle at this position is transferred out before the
/// full term and therefore contributes a resale credit. A lone vehicle
/// completes its 84 months, so nothing is resale-eligible at fleet size 1.
pub fn is_resale_eligible(fleet_size: usize, slot_index: usize) -> bool {
    match fleet_size {
        2 => slot_index == 0,
        3 => slot_index < 2,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const PLANS: [Plan; 2] = [Plan::JSeven, Plan::JNine];

    #[test]
    fn single_vehicle_carries_the_full_term() {
        for plan in PLANS {
            assert_eq!(lease_months(plan, 1, 0), 84);
        }
    }

    #[test]
    fn two_vehicle_split_is_38_then_46() {
        for plan in PLANS {
            assert_eq!(lease_months(plan, 2, 0), 38);
            assert_eq!(lease_months(plan, 2, 1), 46);
        }
    }

    #[test]
    fn three_vehicle_split_is_38_38_then_8() {
        for plan in PLANS {
            assert_eq!(lease_months(plan, 3, 0), 38);
            assert_eq!(lease_months(plan, 3, 1), 38);
            assert_eq!(lease_months(plan, 3, 2), 8);
        }
    }

    #[test]
    fn allocated_months_always_sum_to_the_plan_term() {
        for plan in PLANS {
            for fleet_size in 1..=3usize {
                let sum: u32 = (0..fleet_size)
                    .map(|idx| lease_months(plan, fleet_size, idx))
                    .sum();
                assert_eq!(
                    sum,
                    plan.total_term_months(),
                    "fleet of {fleet_size} must carry the full term"
                );
            }
        }
    }

    #[test]
    fn unsupported_fleet_sizes_are_not_allocable() {
        for plan in PLANS {
            assert_eq!(lease_months(plan, 0, 0), 0);
            assert_eq!(lease_months(plan, 4, 0), 0);
            assert_eq!(lease_months(plan, 4, 3), 0);
        }
    }

    #[test]
    fn slot_index_outside_fleet_is_not_allocable() {
        for plan in PLANS {
            assert_eq!(lease_months(plan, 1, 1), 0);
            assert_eq!(lease_months(plan, 2, 2), 0);
            assert_eq!(lease_months(plan, 3, 3), 0);
        }
    }

    #[test]
    fn resale_eligibility_matches_the_transfer_rules() {
        assert!(!is_resale_eligible(1, 0));
        assert!(is_resale_eligible(2, 0));
        assert!(!is_resale_eligible(2, 1));
        assert!(is_resale_eligible(3, 0));
        assert!(is_resale_eligible(3, 1));
        assert!(!is_resale_eligible(3, 2));
    }

    #[test]
    fn resale_never_applies_outside_supported_fleet_sizes() {
        assert!(!is_resale_eligible(0, 0));
        assert!(!is_resale_eligible(4, 0));
        assert!(!is_resale_eligible(4, 1));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_allocation_is_pure_and_degrades_to_zero(
            fleet_size in 0usize..16,
            slot_index in 0usize..16
        ) {
            for plan in PLANS {
                let months = lease_months(plan, fleet_size, slot_index);
                prop_assert_eq!(months, lease_months(plan, fleet_size, slot_index));
                if !(1..=3).contains(&fleet_size) || slot_index >= fleet_size {
                    prop_assert_eq!(months, 0);
                } else {
                    prop_assert!(months > 0);
                    prop_assert!(months <= plan.total_term_months());
                }
            }
        }

        #[test]
        fn prop_resale_eligible_slots_never_include_the_last_vehicle(
            fleet_size in 1usize..=3
        ) {
            prop_assert!(!is_resale_eligible(fleet_size, fleet_size - 1));
        }
    }
}
