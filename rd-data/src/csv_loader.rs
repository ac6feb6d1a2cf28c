//! CSV loaders for the tabular parts of a credit snapshot.
//!
//! Headers are matched by name, so column order does not matter. Whitespace
//! around cells is trimmed and currency cells may carry a `$` and thousands
//! separators. Optional columns may be left empty or omitted entirely.
//!
//! ## Historical data
//!
//! | Column           | Required | Type    | Notes                               |
//! |------------------|----------|---------|-------------------------------------|
//! | `year`           | yes      | integer | One row per calendar year           |
//! | `qre`            | yes      | decimal | Manually entered QRE                |
//! | `gross_receipts` | yes      | decimal |                                     |
//! | `calculated_qre` | no       | decimal | Used when `qre` is zero             |
//! | `paid`           | no       | bool    | `true` / `false`                    |
//! | `completed`      | no       | bool    | `true` / `false`                    |
//!
//! ```csv
//! year,qre,gross_receipts
//! 2023,"$60,000","$1,000,000"
//! 2022,50000,900000
//! ```
//!
//! ## Contractor expenses
//!
//! `id, year, contractor_name, contractor_type, amount, research_percentage`
//! are required; `subcomponent_id` and `role` are optional.
//! `contractor_type` is `individual` or `company`.
//!
//! ## Supply expenses
//!
//! `id, year, supplier_name, amount, research_percentage` are required;
//! `subcomponent_id`, `vendor`, `category` and `quantity` are optional.
//!
//! Research percentages are whole-number percentages in `[0, 100]`.
use std::path::Path;

use rd_core::calculations::common::is_valid_percentage;
use rd_core::{ContractorExpense, ContractorType, HistoricalData, HistoricalYear, SupplyExpense};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::utils::{deserialize_decimal, deserialize_optional_decimal, deserialize_optional_string};

// ---------------------------------------------------------------------------
// Serde-compatible rows that mirror the CSV layouts
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct HistoricalRow {
    year: i32,
    #[serde(deserialize_with = "deserialize_decimal")]
    qre: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    gross_receipts: Decimal,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    calculated_qre: Option<Decimal>,
    #[serde(default)]
    paid: Option<bool>,
    #[serde(default)]
    completed: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ContractorRow {
    id: String,
    year: i32,
    contractor_name: String,
    contractor_type: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    amount: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    research_percentage: Decimal,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    subcomponent_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SupplyRow {
    id: String,
    year: i32,
    supplier_name: String,
    #[serde(deserialize_with = "deserialize_decimal")]
    amount: Decimal,
    #[serde(deserialize_with = "deserialize_decimal")]
    research_percentage: Decimal,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    subcomponent_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    vendor: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    category: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_decimal")]
    quantity: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Public error type
// ---------------------------------------------------------------------------

/// Errors that can occur while loading or converting CSV data.
///
/// Row numbers are 1-based and do not count the header.
#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    /// Bad structure, missing required column or a cell of the wrong type.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("year {year} appears more than once (row {row})")]
    DuplicateYear { year: i32, row: usize },

    #[error("research percentage {value} on row {row} must be between 0 and 100")]
    InvalidPercentage { value: Decimal, row: usize },

    #[error("negative amount {value} on row {row}")]
    NegativeAmount { value: Decimal, row: usize },

    #[error("unrecognised contractor type '{value}' on row {row}")]
    InvalidContractorType { value: String, row: usize },
}

// ---------------------------------------------------------------------------
// Core loaders
// ---------------------------------------------------------------------------

/// Deserializes every row of `input`, pairing each with its 1-based row number.
fn read_rows<T: DeserializeOwned>(input: &str) -> Result<Vec<(usize, T)>, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<T>()
        .enumerate()
        .map(|(idx, result)| Ok((idx + 1, result?)))
        .collect()
}

fn read_file(path: &Path) -> Result<String, CsvLoadError> {
    std::fs::read_to_string(path).map_err(|source| CsvLoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn check_amount(
    value: Decimal,
    row: usize,
) -> Result<(), CsvLoadError> {
    if value < Decimal::ZERO {
        return Err(CsvLoadError::NegativeAmount { value, row });
    }
    Ok(())
}

fn check_percentage(
    value: Decimal,
    row: usize,
) -> Result<(), CsvLoadError> {
    if !is_valid_percentage(value) {
        return Err(CsvLoadError::InvalidPercentage { value, row });
    }
    Ok(())
}

/// Parse historical QRE and gross receipts, one row per calendar year.
///
/// # Errors
///
/// * [CsvLoadError::Parse] if the CSV is structurally invalid.
/// * [CsvLoadError::DuplicateYear] if a year appears twice.
/// * [CsvLoadError::NegativeAmount] for a negative QRE or gross receipts cell.
pub fn load_historical_from_str(input: &str) -> Result<HistoricalData, CsvLoadError> {
    let mut history = HistoricalData::new();

    for (row_number, row) in read_rows::<HistoricalRow>(input)? {
        check_amount(row.qre, row_number)?;
        check_amount(row.gross_receipts, row_number)?;
        if history.get(row.year).is_some() {
            return Err(CsvLoadError::DuplicateYear {
                year: row.year,
                row: row_number,
            });
        }
        history.insert(
            row.year,
            HistoricalYear {
                qre: row.qre,
                gross_receipts: row.gross_receipts,
                calculated_qre: row.calculated_qre,
                paid: row.paid,
                completed: row.completed,
            },
        );
    }

    debug!(years = history.len(), "Loaded historical data");
    Ok(history)
}

/// Parse contractor payments. Rows are returned in file order.
pub fn load_contractors_from_str(input: &str) -> Result<Vec<ContractorExpense>, CsvLoadError> {
    read_rows::<ContractorRow>(input)?
        .into_iter()
        .map(|(row_number, row)| {
            check_amount(row.amount, row_number)?;
            check_percentage(row.research_percentage, row_number)?;
            let contractor_type = ContractorType::parse(&row.contractor_type).ok_or_else(|| {
                CsvLoadError::InvalidContractorType {
                    value: row.contractor_type.clone(),
                    row: row_number,
                }
            })?;
            Ok(ContractorExpense {
                id: row.id,
                year: row.year,
                amount: row.amount,
                research_percentage: row.research_percentage,
                subcomponent_id: row.subcomponent_id,
                contractor_name: row.contractor_name,
                role: row.role,
                contractor_type,
            })
        })
        .collect()
}

/// Parse supply purchases. Rows are returned in file order.
pub fn load_supplies_from_str(input: &str) -> Result<Vec<SupplyExpense>, CsvLoadError> {
    read_rows::<SupplyRow>(input)?
        .into_iter()
        .map(|(row_number, row)| {
            check_amount(row.amount, row_number)?;
            check_percentage(row.research_percentage, row_number)?;
            Ok(SupplyExpense {
                id: row.id,
                year: row.year,
                amount: row.amount,
                research_percentage: row.research_percentage,
                subcomponent_id: row.subcomponent_id,
                supplier_name: row.supplier_name,
                vendor: row.vendor,
                category: row.category,
                quantity: row.quantity,
            })
        })
        .collect()
}

pub fn load_historical_from_file(path: &Path) -> Result<HistoricalData, CsvLoadError> {
    load_historical_from_str(&read_file(path)?)
}

pub fn load_contractors_from_file(path: &Path) -> Result<Vec<ContractorExpense>, CsvLoadError> {
    load_contractors_from_str(&read_file(path)?)
}

pub fn load_supplies_from_file(path: &Path) -> Result<Vec<SupplyExpense>, CsvLoadError> {
    load_supplies_from_str(&read_file(path)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
