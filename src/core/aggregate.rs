use super::allocator::{is_resale_eligible, lease_months};
use super::types::{CalculationResult, LeaseLine, Plan, ResolvedSlot, SlotPricing};

/// Per-month share of a slot's option surcharge, floored. Zero when the
/// slot has no allocable months so the division can never be by zero.
pub fn additional_monthly(option_total: i64, months: u32) -> i64 {
    if months > 0 && option_total > 0 {
        option_total / i64::from(months)
    } else {
        0
    }
}

/// Compares the purchase path against the lease path for the given fleet.
/// Total over well-formed input: the one rejected case (empty fleet or a
/// slot without an assigned model) comes back as an error-flagged zeroed
/// result rather than an `Err`.
pub fn compute(
    plan: Plan,
    slots: &[ResolvedSlot],
    misc_fee_per_vehicle: i64,
    tax_rate: f64,
) -> CalculationResult {
    if slots.is_empty() {
        return CalculationResult::rejected("select at least one vehicle");
    }

    let mut pricings: Vec<SlotPricing> = Vec::with_capacity(slots.len());
    for slot in slots {
        match slot.pricing {
            Some(pricing) => pricings.push(pricing),
            None => return CalculationResult::rejected("select a model for every vehicle"),
        }
    }

    let fleet_size = slots.len();

    let vehicle_price_total: i64 = pricings.iter().map(|p| p.base_price).sum();
    // Tax applies to the vehicle price only, never to options or fees.
    let tax_total = (vehicle_price_total as f64 * tax_rate).floor() as i64;
    let option_total: i64 = slots.iter().map(|s| s.option_total).sum();
    let misc_total = misc_fee_per_vehicle * fleet_size as i64;

    let mut resale_count = 0u32;
    let mut resale_total = 0i64;
    for (idx, slot) in slots.iter().enumerate() {
        if is_resale_eligible(fleet_size, idx) {
            resale_count += 1;
            resale_total += slot.resale_value.filter(|v| *v > 0).unwrap_or(0);
        }
    }

    let purchase_total = vehicle_price_total + tax_total + option_total + misc_total - resale_total;

    let mut lease_breakdown = Vec::with_capacity(fleet_size);
    for (idx, slot) in slots.iter().enumerate() {
        let months = lease_months(plan, fleet_size, idx);
        let monthly_rate = pricings[idx].monthly_rate + additional_monthly(slot.option_total, months);
        lease_breakdown.push(LeaseLine {
            label: format!("vehicle {}", idx + 1),
            months,
            monthly_rate,
            total: monthly_rate * i64::from(months),
        });
    }

    let lease_total: i64 = lease_breakdown.iter().map(|line| line.total).sum();
    let savings = purchase_total - lease_total;

    CalculationResult {
        vehicle_price_total,
        tax_total,
        option_total,
        misc_total,
        resale_count,
        resale_total,
        purchase_total,
        lease_breakdown,
        lease_total,
        savings,
        error: None,
    }
}
