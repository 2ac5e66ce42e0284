use crate::{Diagnostics, ForecastType, Table, Tabular};

/// Metadata recorded when a forecast is validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastMeta {
    pub forecast_unit: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// A validated forecast table and its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastData {
    table: Table,
    meta: ForecastMeta,
}

impl ForecastData {
    pub(crate) fn new(table: Table, meta: ForecastMeta) -> Self {
        Self { table, meta }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn meta(&self) -> &ForecastMeta {
        &self.meta
    }
}

/// A forecast table tagged with its type.
///
/// Built by [`as_forecast`](crate::as_forecast). The variant is the forecast type
/// the table was validated as; scoring switches on it.
#[derive(Debug, Clone, PartialEq)]
pub enum Forecast {
    Binary(ForecastData),
    Point(ForecastData),
    Quantile(ForecastData),
    Sample(ForecastData),
}

impl Forecast {
    pub(crate) fn new(forecast_type: ForecastType, data: ForecastData) -> Self {
        match forecast_type {
            ForecastType::Binary => Forecast::Binary(data),
            ForecastType::Point => Forecast::Point(data),
            ForecastType::Quantile => Forecast::Quantile(data),
            ForecastType::Sample => Forecast::Sample(data),
        }
    }

    pub fn forecast_type(&self) -> ForecastType {
        match self {
            Forecast::Binary(_) => ForecastType::Binary,
            Forecast::Point(_) => ForecastType::Point,
            Forecast::Quantile(_) => ForecastType::Quantile,
            Forecast::Sample(_) => ForecastType::Sample,
        }
    }

    pub fn data(&self) -> &ForecastData {
        match self {
            Forecast::Binary(data)
            | Forecast::Point(data)
            | Forecast::Quantile(data)
            | Forecast::Sample(data) => data,
        }
    }

    fn data_mut(&mut self) -> &mut ForecastData {
        match self {
            Forecast::Binary(data)
            | Forecast::Point(data)
            | Forecast::Quantile(data)
            | Forecast::Sample(data) => data,
        }
    }

    pub fn table(&self) -> &Table {
        &self.data().table
    }

    /// The forecast unit recorded at validation time.
    pub fn forecast_unit(&self) -> &[String] {
        &self.data().meta.forecast_unit
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.data().meta.diagnostics
    }

    /// Mutable access to the underlying table.
    ///
    /// Edits are not re-validated; the recorded type and forecast unit may go stale
    /// until [`validate_forecast`](crate::validate_forecast) is run.
    pub fn table_mut(&mut self) -> &mut Table {
        &mut self.data_mut().table
    }

    pub fn into_table(self) -> Table {
        match self {
            Forecast::Binary(data)
            | Forecast::Point(data)
            | Forecast::Quantile(data)
            | Forecast::Sample(data) => data.table,
        }
    }
}

impl Tabular for Forecast {
    fn table(&self) -> &Table {
        Forecast::table(self)
    }
}
