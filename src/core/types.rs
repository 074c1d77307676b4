use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Plan {
    JSeven,
    JNine,
}

impl Plan {
    pub fn label(self) -> &'static str {
        match self {
            Plan::JSeven => "J Seven",
            Plan::JNine => "J Nine",
        }
    }

    /// Fixed total lease term carried by the whole fleet, however it is
    /// split across vehicles.
    pub fn total_term_months(self) -> u32 {
        match self {
            Plan::JSeven | Plan::JNine => 84,
        }
    }

    pub fn max_fleet_size(self) -> usize {
        match self {
            Plan::JSeven | Plan::JNine => 3,
        }
    }
}

/// Per-vehicle pricing resolved from the catalog for the active plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPricing {
    pub base_price: i64,
    pub monthly_rate: i64,
}

/// One fleet position as the aggregator sees it; pricing is `None` when
/// the slot has no assigned model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSlot {
    pub pricing: Option<SlotPricing>,
    pub option_total: i64,
    pub resale_value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseLine {
    pub label: String,
    pub months: u32,
    pub monthly_rate: i64,
    pub total: i64,
}

/// Immutable snapshot produced by one Calculate action. All amounts are
/// integer yen; `savings` keeps its sign (positive means the lease path
/// is cheaper).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub vehicle_price_total: i64,
    pub tax_total: i64,
    pub option_total: i64,
    pub misc_total: i64,
    pub resale_count: u32,
    pub resale_total: i64,
    pub purchase_total: i64,
    pub lease_breakdown: Vec<LeaseLine>,
    pub lease_total: i64,
    pub savings: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CalculationResult {
    /// Zeroed result flagged with an error message. Callers must check
    /// `error` before rendering any monetary figure.
    pub fn rejected(message: &str) -> Self {
        Self {
            vehicle_price_total: 0,
            tax_total: 0,
            option_total: 0,
            misc_total: 0,
            resale_count: 0,
            resale_total: 0,
            purchase_total: 0,
            lease_breakdown: Vec::new(),
            lease_total: 0,
            savings: 0,
            error: Some(message.to_string()),
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.error.is_some()
    }
}
