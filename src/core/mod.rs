mod aggregate;
mod allocator;
mod fleet;
mod types;

pub use aggregate::{additional_monthly, compute};
pub use allocator::{is_resale_eligible, lease_months};
pub use fleet::{
    FleetError, FleetSelection, FleetSlot, IssueKind, MAX_ENTRY_AMOUNT, MAX_OPTIONS_PER_SLOT,
    OptionEntry, ValidationIssue,
};
pub use types::{CalculationResult, LeaseLine, Plan, ResolvedSlot, SlotPricing};
