use std::io::Read;
use std::path::Path;

use rd_core::calculations::StateCode;
use rd_core::{CalculationConfig, CalculationConfigError, CreditCalculationInput};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur when loading a calculation snapshot.
#[derive(Debug, Error)]
pub enum SnapshotLoadError {
    #[error("could not read snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid calculation settings: {0}")]
    InvalidConfig(#[from] CalculationConfigError),
}

/// Loader for [`CreditCalculationInput`] snapshots stored as JSON.
///
/// Money and percentages may be written as strings (`"150000.00"`) or
/// numbers. Strings keep every digit; numbers pass through `f64`.
pub struct SnapshotLoader;

impl SnapshotLoader {
    /// Parse a snapshot from any reader and check its rate settings.
    ///
    /// An unrecognised state code is accepted and logged; the state stage
    /// reports it as having no credit.
    pub fn parse<R: Read>(reader: R) -> Result<CreditCalculationInput, SnapshotLoadError> {
        let input: CreditCalculationInput = serde_json::from_reader(reader)?;
        Self::check(&input)?;
        Ok(input)
    }

    pub fn parse_str(json: &str) -> Result<CreditCalculationInput, SnapshotLoadError> {
        Self::parse(json.as_bytes())
    }

    pub fn load_from_file(path: &Path) -> Result<CreditCalculationInput, SnapshotLoadError> {
        let file = std::fs::File::open(path).map_err(|source| SnapshotLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(std::io::BufReader::new(file))
    }

    fn check(input: &CreditCalculationInput) -> Result<(), SnapshotLoadError> {
        CalculationConfig::from_input(input).validate()?;

        if StateCode::parse(&input.state_code).is_none() {
            warn!(state = %input.state_code, "Snapshot names an unrecognised state");
        }

        debug!(
            year = input.year,
            employees = input.employees.len(),
            activities = input.selected_activities.len(),
            contractors = input.contractor_expenses.len(),
            supplies = input.supply_expenses.len(),
            history_years = input.historical_data.len(),
            "Loaded snapshot"
        );
        Ok(())
    }
}
