use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{non_negative, round_to_dollar};

/// Values a state formula may read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCreditInputs {
    pub qre: Decimal,
    pub prior_year_qre: Decimal,
    pub avg_prior_qres: Decimal,
    pub avg_gross_receipts: Decimal,
    pub base_amount: Decimal,
    pub federal_credit: Decimal,
    pub basic_research_payments: Decimal,
    pub num_employees: u32,
}

/// Amount a rate is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Basis {
    Qre,
    /// `max(qre - base_amount, 0)`
    IncrementalOverBase,
    /// `max(qre - prior_year_qre, 0)`
    IncrementalOverPriorYear,
    BasicResearchPayments,
}

impl Basis {
    pub fn value(
        &self,
        inputs: &StateCreditInputs,
    ) -> Decimal {
        match self {
            Self::Qre => inputs.qre,
            Self::IncrementalOverBase => non_negative(inputs.qre - inputs.base_amount),
            Self::IncrementalOverPriorYear => non_negative(inputs.qre - inputs.prior_year_qre),
            Self::BasicResearchPayments => inputs.basic_research_payments,
        }
    }
}

/// `rate * basis`, unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Term {
    pub rate: Decimal,
    pub basis: Basis,
}

impl Term {
    pub const fn new(
        rate: Decimal,
        basis: Basis,
    ) -> Self {
        Self { rate, basis }
    }

    fn raw(
        &self,
        inputs: &StateCreditInputs,
    ) -> Decimal {
        self.rate * self.basis.value(inputs)
    }
}

/// Employee-count band: applies `rate` when the headcount is below `below`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmployeeTier {
    pub below: u32,
    pub rate: Decimal,
}

/// Shape of a state's credit computation.
///
/// Every variant produces a whole-dollar, non-negative amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum StateFormula {
    NoCredit,
    /// `rate * federal_credit`
    FederalMultiple { rate: Decimal },
    /// `rate * qre`
    FlatRate { rate: Decimal },
    /// `rate * max(qre - base, 0)` where the base is the base amount or prior-year QRE.
    Incremental { rate: Decimal, basis: Basis },
    /// `lower_rate` on the basis up to `breakpoint`, `upper_rate` on the rest.
    Tiered {
        basis: Basis,
        breakpoint: Decimal,
        lower_rate: Decimal,
        upper_rate: Decimal,
    },
    /// One rate on the whole basis, chosen by whether it exceeds `threshold`.
    ThresholdRate {
        basis: Basis,
        threshold: Decimal,
        rate_at_or_below: Decimal,
        rate_above: Decimal,
    },
    /// The larger of two separately rounded terms.
    MaxOf { first: Term, second: Term },
    /// Two terms added, rounded once.
    SumOf { first: Term, second: Term },
    /// Rate on QRE chosen by the first band the headcount falls under.
    EmployeeTiered {
        tiers: &'static [EmployeeTier],
        default_rate: Decimal,
    },
    /// `startup_rate * qre` when there is no prior QRE, otherwise incremental over base.
    IncrementalWithStartupRate {
        incremental_rate: Decimal,
        startup_rate: Decimal,
    },
}

impl StateFormula {
    pub fn evaluate(
        &self,
        inputs: &StateCreditInputs,
    ) -> Decimal {
        let raw = match *self {
            Self::NoCredit => Decimal::ZERO,
            Self::FederalMultiple { rate } => rate * inputs.federal_credit,
            Self::FlatRate { rate } => rate * inputs.qre,
            Self::Incremental { rate, basis } => rate * basis.value(inputs),
            Self::Tiered {
                basis,
                breakpoint,
                lower_rate,
                upper_rate,
            } => {
                let amount = basis.value(inputs);
                if amount <= breakpoint {
                    lower_rate * amount
                } else {
                    lower_rate * breakpoint + upper_rate * (amount - breakpoint)
                }
            }
            Self::ThresholdRate {
                basis,
                threshold,
                rate_at_or_below,
                rate_above,
            } => {
                let amount = basis.value(inputs);
                if amount <= threshold {
                    rate_at_or_below * amount
                } else {
                    rate_above * amount
                }
            }
            Self::MaxOf { first, second } => {
                round_to_dollar(first.raw(inputs)).max(round_to_dollar(second.raw(inputs)))
            }
            Self::SumOf { first, second } => first.raw(inputs) + second.raw(inputs),
            Self::EmployeeTiered { tiers, default_rate } => {
                let rate = tiers
                    .iter()
                    .find(|tier| inputs.num_employees < tier.below)
                    .map_or(default_rate, |tier| tier.rate);
                rate * inputs.qre
            }
            Self::IncrementalWithStartupRate {
                incremental_rate,
                startup_rate,
            } => {
                if inputs.avg_prior_qres.is_zero() {
                    startup_rate * inputs.qre
                } else {
                    incremental_rate * Basis::IncrementalOverBase.value(inputs)
                }
            }
        };
        non_negative(round_to_dollar(raw))
    }
}
