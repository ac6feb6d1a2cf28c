use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalYear {
    #[serde(default)]
    pub qre: Decimal,
    #[serde(default)]
    pub gross_receipts: Decimal,
    #[serde(default)]
    pub calculated_qre: Option<Decimal>,
    #[serde(default)]
    pub paid: Option<bool>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl HistoricalYear {
    /// Manually entered QRE when positive, then the calculated QRE, then zero.
    pub fn effective_qre(&self) -> Decimal {
        if self.qre > Decimal::ZERO {
            return self.qre;
        }
        self.calculated_qre.unwrap_or(Decimal::ZERO)
    }
}

/// Prior-year QRE and gross receipts keyed by calendar year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoricalData(BTreeMap<i32, HistoricalYear>);

impl HistoricalData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        year: i32,
        data: HistoricalYear,
    ) -> Option<HistoricalYear> {
        self.0.insert(year, data)
    }

    pub fn get(
        &self,
        year: i32,
    ) -> Option<&HistoricalYear> {
        self.0.get(&year)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &HistoricalYear)> {
        self.0.iter().map(|(year, data)| (*year, data))
    }

    /// The `count` most recent records before `year`, newest first.
    ///
    /// Calendar gaps do not shrink the window: with no 2022 record, a 2024
    /// lookback of three reaches back to the next older record.
    pub fn recent_prior_years(
        &self,
        year: i32,
        count: usize,
    ) -> impl Iterator<Item = (i32, &HistoricalYear)> {
        self.0
            .range(..year)
            .rev()
            .take(count)
            .map(|(prior, data)| (*prior, data))
    }

    /// Of the `count` most recent prior records, those with a positive effective QRE.
    pub fn qualifying_prior_years(
        &self,
        year: i32,
        count: usize,
    ) -> Vec<(i32, &HistoricalYear)> {
        self.recent_prior_years(year, count)
            .filter(|(_, data)| data.effective_qre() > Decimal::ZERO)
            .collect()
    }

    pub fn prior_year_qre(
        &self,
        year: i32,
    ) -> Decimal {
        self.get(year - 1)
            .map(HistoricalYear::effective_qre)
            .unwrap_or(Decimal::ZERO)
    }

    /// Mean of the positive effective QREs over the `count` most recent prior records.
    pub fn average_prior_qre(
        &self,
        year: i32,
        count: usize,
    ) -> Decimal {
        let values: Vec<Decimal> = self
            .qualifying_prior_years(year, count)
            .into_iter()
            .map(|(_, data)| data.effective_qre())
            .collect();
        mean(&values)
    }

    /// Mean of the positive gross receipts over the `count` most recent prior records.
    pub fn average_prior_gross_receipts(
        &self,
        year: i32,
        count: usize,
    ) -> Decimal {
        let values: Vec<Decimal> = self
            .recent_prior_years(year, count)
            .map(|(_, data)| data.gross_receipts)
            .filter(|receipts| *receipts > Decimal::ZERO)
            .collect();
        mean(&values)
    }
}

impl FromIterator<(i32, HistoricalYear)> for HistoricalData {
    fn from_iter<T: IntoIterator<Item = (i32, HistoricalYear)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().sum::<Decimal>() / Decimal::from(values.len())
}
