use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use super::{EntityRestriction, StateCode, StateCreditInputs};
use crate::EntityType;

pub const NO_STATE_CREDIT_MESSAGE: &str = "No state R&D tax credit available for your state.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateCreditCalculation {
    /// Code as supplied by the caller.
    pub state_code: String,
    pub state_name: Option<&'static str>,
    pub eligible: bool,
    pub credit: Decimal,
    pub message: String,
    pub pre_application: Option<&'static str>,
    pub inputs: StateCreditInputs,
}

#[derive(Debug, Clone)]
pub struct StateCreditCalculator {
    include_state_credit: bool,
}

impl StateCreditCalculator {
    pub fn new(include_state_credit: bool) -> Self {
        Self {
            include_state_credit,
        }
    }

    /// Resolves the rule for `state_code` and evaluates it.
    ///
    /// Unknown codes, ineligible entity types and the exclusion flag all
    /// produce a zero credit with an explanatory message.
    pub fn calculate(
        &self,
        state_code: &str,
        entity_type: EntityType,
        inputs: StateCreditInputs,
    ) -> StateCreditCalculation {
        let mut result = StateCreditCalculation {
            state_code: state_code.to_string(),
            state_name: None,
            eligible: false,
            credit: Decimal::ZERO,
            message: NO_STATE_CREDIT_MESSAGE.to_string(),
            pre_application: None,
            inputs,
        };

        let Some(code) = StateCode::parse(state_code) else {
            warn!(state_code, "Unknown state code; no state credit");
            return result;
        };

        let rule = code.rule();
        result.state_name = Some(rule.name);

        if rule.entity_restrictions == EntityRestriction::None {
            debug!(state = code.as_str(), "State offers no R&D credit");
            return result;
        }

        if !rule.entity_restrictions.permits(entity_type) {
            warn!(
                state = code.as_str(),
                entity_type = entity_type.as_str(),
                "Entity type not eligible for state credit"
            );
            result.message = format!(
                "State credit not available for your entity type ({}).",
                entity_type.as_str()
            );
            return result;
        }

        result.eligible = true;
        result.pre_application = Some(rule.pre_application);

        if !self.include_state_credit {
            result.message = format!("{} state credit excluded from this calculation.", rule.name);
            return result;
        }

        result.credit = rule.formula.evaluate(&result.inputs);
        result.message = rule.description.to_string();
        debug!(state = code.as_str(), credit = %result.credit, "Calculated state credit");
        result
    }
}
