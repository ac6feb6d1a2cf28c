mod activity;
mod employee;
mod entity_type;
mod expense;
mod historical;
mod input;
mod qre_breakdown;

pub use activity::{ResearchActivity, ResearchSubcomponent, RoleDescriptions};
pub use employee::{ActivityAllocation, Employee, EmployeeRole, SubcomponentAllocation};
pub use entity_type::EntityType;
pub use expense::{ContractorExpense, ContractorType, SupplyExpense};
pub use historical::{HistoricalData, HistoricalYear};
pub use input::{CreditCalculationInput, CreditMethod};
pub use qre_breakdown::QreBreakdown;
