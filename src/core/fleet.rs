use serde::Serialize;
use thiserror::Error;

use crate::catalog::Catalog;
use super::aggregate::{self, additional_monthly};
use super::allocator::{is_resale_eligible, lease_months};
use super::types::{CalculationResult, Plan, ResolvedSlot, SlotPricing};

/// Upper bound on any single user-entered amount, in yen. Keeps option
/// and resale sums well inside i64 cost arithmetic.
pub const MAX_ENTRY_AMOUNT: i64 = 1_000_000_000;

/// Cap on option rows per slot; together with [`MAX_ENTRY_AMOUNT`] it
/// bounds the per-slot surcharge.
pub const MAX_OPTIONS_PER_SLOT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FleetError {
    #[error("fleet already has the maximum of {0} vehicles")]
    FleetFull(usize),
    #[error("no vehicle slot with id {0}")]
    UnknownSlot(u64),
    #[error("no option with id {option_id} on slot {slot_id}")]
    UnknownOption { slot_id: u64, option_id: u64 },
    #[error("unknown vehicle model '{0}'")]
    UnknownModel(String),
    #[error("option name must not be empty")]
    EmptyOptionName,
    #[error("slot already has the maximum of {0} options")]
    TooManyOptions(usize),
    #[error("option price must be positive and at most 1000000000 yen, got {0}")]
    InvalidOptionPrice(i64),
    #[error("resale value must be positive and at most 1000000000 yen, got {0}")]
    InvalidResaleValue(i64),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    MissingResaleValue,
    InvalidOptionPrice,
}

/// One user-correctable problem, tied to the slot it occurred on so the
/// shell can highlight the offending vehicle rather than a global banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub slot_id: u64,
    pub position: usize,
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionEntry {
    pub id: u64,
    pub name: String,
    pub price: i64,
}

/// One vehicle position in the active fleet. The id outlives any model
/// assignment and is never reused after removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetSlot {
    pub id: u64,
    pub model_id: Option<String>,
    pub options: Vec<OptionEntry>,
    pub resale_value: Option<i64>,
}

impl FleetSlot {
    pub fn option_total(&self) -> i64 {
        self.options.iter().map(|o| o.price).sum()
    }
}

/// The mutable fleet aggregate. All mutation goes through commands; the
/// calculation snapshot is replaced wholesale by each Calculate and never
/// partially updated.
#[derive(Debug, Clone)]
pub struct FleetSelection {
    plan: Plan,
    slots: Vec<FleetSlot>,
    next_slot_id: u64,
    next_option_id: u64,
    misc_fee_per_vehicle: i64,
    tax_rate: f64,
    result: Option<CalculationResult>,
}

impl FleetSelection {
    pub fn new(plan: Plan) -> Self {
        Self {
            plan,
            slots: Vec::new(),
            next_slot_id: 1,
            next_option_id: 1,
            misc_fee_per_vehicle: 70_000,
            tax_rate: 0.10,
            result: None,
        }
    }

    pub fn plan(&self) -> Plan {
        self.plan
    }

    /// Switching plans keeps the fleet and the last result, matching the
    /// input screen's behavior of re-entering with state preserved.
    pub fn set_plan(&mut self, plan: Plan) {
        self.plan = plan;
    }

    pub fn set_misc_fee(&mut self, misc_fee_per_vehicle: i64) {
        self.misc_fee_per_vehicle = misc_fee_per_vehicle;
    }

    pub fn set_tax_rate(&mut self, tax_rate: f64) {
        self.tax_rate = tax_rate;
    }

    pub fn misc_fee_per_vehicle(&self) -> i64 {
        self.misc_fee_per_vehicle
    }

    pub fn tax_rate(&self) -> f64 {
        self.tax_rate
    }

    pub fn slots(&self) -> &[FleetSlot] {
        &self.slots
    }

    pub fn result(&self) -> Option<&CalculationResult> {
        self.result.as_ref()
    }

    pub fn add_slot(
        &mut self,
        catalog: &Catalog,
        model_id: Option<&str>,
    ) -> Result<u64, FleetError> {
        if self.slots.len() >= self.plan.max_fleet_size() {
            return Err(FleetError::FleetFull(self.plan.max_fleet_size()));
        }
        let model_id = match model_id {
            Some(id) => {
                if catalog.lookup(id).is_none() {
                    return Err(FleetError::UnknownModel(id.to_string()));
                }
                Some(id.to_string())
            }
            None => None,
        };

        let id = self.next_slot_id;
        self.next_slot_id += 1;
        self.slots.push(FleetSlot {
            id,
            model_id,
            options: Vec::new(),
            resale_value: None,
        });
        Ok(id)
    }

    /// Removes the slot and everything keyed on it in one step: options,
    /// resale value, and the derived monthly add-on all go with it.
    pub fn remove_slot(&mut self, slot_id: u64) -> Result<(), FleetError> {
        let position = self
            .slots
            .iter()
            .position(|s| s.id == slot_id)
            .ok_or(FleetError::UnknownSlot(slot_id))?;
        self.slots.remove(position);
        Ok(())
    }

    pub fn set_model(
        &mut self,
        catalog: &Catalog,
        slot_id: u64,
        model_id: &str,
    ) -> Result<(), FleetError> {
        if catalog.lookup(model_id).is_none() {
            return Err(FleetError::UnknownModel(model_id.to_string()));
        }
        self.slot_mut(slot_id)?.model_id = Some(model_id.to_string());
        Ok(())
    }

    pub fn add_option(&mut self, slot_id: u64, name: &str, price: i64) -> Result<u64, FleetError> {
        if name.trim().is_empty() {
            return Err(FleetError::EmptyOptionName);
        }
        if price <= 0 || price > MAX_ENTRY_AMOUNT {
            return Err(FleetError::InvalidOptionPrice(price));
        }
        if self.slot_mut(slot_id)?.options.len() >= MAX_OPTIONS_PER_SLOT {
            return Err(FleetError::TooManyOptions(MAX_OPTIONS_PER_SLOT));
        }
        let id = self.next_option_id;
        self.next_option_id += 1;
        self.slot_mut(slot_id)?.options.push(OptionEntry {
            id,
            name: name.trim().to_string(),
            price,
        });
        Ok(id)
    }

    pub fn remove_option(&mut self, slot_id: u64, option_id: u64) -> Result<(), FleetError> {
        let slot = self.slot_mut(slot_id)?;
        let position = slot
            .options
            .iter()
            .position(|o| o.id == option_id)
            .ok_or(FleetError::UnknownOption { slot_id, option_id })?;
        slot.options.remove(position);
        Ok(())
    }

    pub fn clear_options(&mut self, slot_id: u64) -> Result<(), FleetError> {
        self.slot_mut(slot_id)?.options.clear();
        Ok(())
    }

    pub fn set_resale_value(&mut self, slot_id: u64, value: i64) -> Result<(), FleetError> {
        if value <= 0 || value > MAX_ENTRY_AMOUNT {
            return Err(FleetError::InvalidResaleValue(value));
        }
        self.slot_mut(slot_id)?.resale_value = Some(value);
        Ok(())
    }

    pub fn clear_resale_value(&mut self, slot_id: u64) -> Result<(), FleetError> {
        self.slot_mut(slot_id)?.resale_value = None;
        Ok(())
    }

    /// Clears the fleet and the last result. Slot ids keep counting up so
    /// an id can never refer to two different vehicles within a session.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.result = None;
    }

    pub fn allocated_months(&self, slot_id: u64) -> Option<u32> {
        let position = self.position_of(slot_id)?;
        Some(lease_months(self.plan, self.slots.len(), position))
    }

    pub fn slot_is_resale_eligible(&self, slot_id: u64) -> Option<bool> {
        let position = self.position_of(slot_id)?;
        Some(is_resale_eligible(self.slots.len(), position))
    }

    /// Derived monthly add-on, recomputed from the current options rather
    /// than cached, so it can never go stale relative to edits.
    pub fn additional_monthly(&self, slot_id: u64) -> Option<i64> {
        let position = self.position_of(slot_id)?;
        let months = lease_months(self.plan, self.slots.len(), position);
        Some(additional_monthly(self.slots[position].option_total(), months))
    }

    /// Per-slot problems that must be fixed before a result can be
    /// produced. Incomplete model selection is not listed here; the
    /// aggregator reports that through its error-flagged result.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let fleet_size = self.slots.len();
        let mut issues = Vec::new();
        for (position, slot) in self.slots.iter().enumerate() {
            if is_resale_eligible(fleet_size, position)
                && !slot.resale_value.is_some_and(|v| v > 0)
            {
                issues.push(ValidationIssue {
                    slot_id: slot.id,
                    position,
                    kind: IssueKind::MissingResaleValue,
                    message: format!(
                        "vehicle {} is resale-eligible and needs a positive resale value",
                        position + 1
                    ),
                });
            }
            for option in &slot.options {
                if option.price <= 0 {
                    issues.push(ValidationIssue {
                        slot_id: slot.id,
                        position,
                        kind: IssueKind::InvalidOptionPrice,
                        message: format!(
                            "option '{}' on vehicle {} needs a positive price",
                            option.name,
                            position + 1
                        ),
                    });
                }
            }
        }
        issues
    }

    /// The Calculate command. Refuses to produce anything while per-slot
    /// validation fails; otherwise resolves models through the catalog,
    /// runs the aggregator, and replaces the stored snapshot wholesale.
    pub fn calculate(&mut self, catalog: &Catalog) -> Result<&CalculationResult, Vec<ValidationIssue>> {
        let issues = self.validate();
        if !issues.is_empty() {
            return Err(issues);
        }

        let fleet_size = self.slots.len();
        let resolved: Vec<ResolvedSlot> = self
            .slots
            .iter()
            .enumerate()
            .map(|(position, slot)| ResolvedSlot {
                pricing: slot
                    .model_id
                    .as_deref()
                    .and_then(|id| catalog.lookup(id))
                    .map(|model| SlotPricing {
                        base_price: model.full_price,
                        monthly_rate: model.monthly_rate(self.plan),
                    }),
                option_total: slot.option_total(),
                resale_value: if is_resale_eligible(fleet_size, position) {
                    slot.resale_value
                } else {
                    None
                },
            })
            .collect();

        let result = aggregate::compute(
            self.plan,
            &resolved,
            self.misc_fee_per_vehicle,
            self.tax_rate,
        );
        Ok(&*self.result.insert(result))
    }

    fn position_of(&self, slot_id: u64) -> Option<usize> {
        self.slots.iter().position(|s| s.id == slot_id)
    }

    fn slot_mut(&mut self, slot_id: u64) -> Result<&mut FleetSlot, FleetError> {
        self.slots
            .iter_mut()
            .find(|s| s.id == slot_id)
            .ok_or(FleetError::UnknownSlot(slot_id))
    }
}
