use crate::prelude::{StageError, StageResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One cleaned row of satellite index input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub plot_id: i64,
    pub date: NaiveDate,
    #[serde(rename = "NDVI")]
    pub ndvi: f64,
    #[serde(rename = "SAVI")]
    pub savi: f64,
    #[serde(rename = "NDWI")]
    pub ndwi: f64,
}

impl Observation {
    pub fn new(plot_id: i64, date: NaiveDate, ndvi: f64, savi: f64, ndwi: f64) -> Self {
        Self {
            plot_id,
            date,
            ndvi,
            savi,
            ndwi,
        }
    }
}

/// Index columns the slope estimator can run over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexColumn {
    Ndvi,
    Savi,
    Ndwi,
}

impl IndexColumn {
    pub const ALL: [IndexColumn; 3] = [IndexColumn::Ndvi, IndexColumn::Savi, IndexColumn::Ndwi];

    pub fn name(self) -> &'static str {
        match self {
            IndexColumn::Ndvi => "NDVI",
            IndexColumn::Savi => "SAVI",
            IndexColumn::Ndwi => "NDWI",
        }
    }

    pub fn value(self, observation: &Observation) -> f64 {
        match self {
            IndexColumn::Ndvi => observation.ndvi,
            IndexColumn::Savi => observation.savi,
            IndexColumn::Ndwi => observation.ndwi,
        }
    }
}

/// Date-ordered observations of a single plot.
///
/// Dates are strictly increasing; construction sorts and rejects repeats so
/// every downstream stage can rely on it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    plot_id: i64,
    observations: Vec<Observation>,
}

impl PlotSeries {
    pub fn new(plot_id: i64, mut observations: Vec<Observation>) -> StageResult<Self> {
        if let Some(foreign) = observations.iter().find(|obs| obs.plot_id != plot_id) {
            return Err(StageError::InvalidInput(format!(
                "observation for plot {} placed in series of plot {}",
                foreign.plot_id, plot_id
            )));
        }

        observations.sort_by_key(|obs| obs.date);
        if let Some(pair) = observations.windows(2).find(|pair| pair[0].date == pair[1].date) {
            return Err(StageError::InvalidInput(format!(
                "plot {} has duplicate observations on {}",
                plot_id, pair[1].date
            )));
        }

        Ok(Self {
            plot_id,
            observations,
        })
    }

    pub fn plot_id(&self) -> i64 {
        self.plot_id
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.observations.iter().map(|obs| obs.date)
    }

    /// Values of one index column in date order.
    pub fn column(&self, column: IndexColumn) -> Vec<f64> {
        self.observations
            .iter()
            .map(|obs| column.value(obs))
            .collect()
    }

    /// Days elapsed since the first observation, one entry per observation.
    pub fn day_offsets(&self) -> Vec<i64> {
        match self.observations.first() {
            Some(first) => self
                .observations
                .iter()
                .map(|obs| (obs.date - first.date).num_days())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Splits a flat observation list into per-plot series, ascending by plot id.
pub fn group_by_plot(observations: Vec<Observation>) -> StageResult<Vec<PlotSeries>> {
    let mut grouped: BTreeMap<i64, Vec<Observation>> = BTreeMap::new();
    for obs in observations {
        grouped.entry(obs.plot_id).or_default().push(obs);
    }

    grouped
        .into_iter()
        .map(|(plot_id, observations)| PlotSeries::new(plot_id, observations))
        .collect()
}
