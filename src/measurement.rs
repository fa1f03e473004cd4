use std::path::Path;

use csv::ReaderBuilder;
use log::{debug, info};
use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Measurement {
    pub room: String,
    pub wall: String,
    pub wall_x_coord_cm: f64,
    pub wall_y_coord_cm: f64,
    pub wall_humidity_digits: f64,
    #[serde(rename = "wall_temperature_degC")]
    pub wall_temperature_deg_c: f64,
}

impl Measurement {
    pub fn new(
        room: &str,
        wall: &str,
        x_cm: f64,
        y_cm: f64,
        humidity_digits: f64,
        temperature_deg_c: f64,
    ) -> Self {
        Self {
            room: room.to_owned(),
            wall: wall.to_owned(),
            wall_x_coord_cm: x_cm,
            wall_y_coord_cm: y_cm,
            wall_humidity_digits: humidity_digits,
            wall_temperature_deg_c: temperature_deg_c,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.wall_x_coord_cm, self.wall_y_coord_cm)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeasurementTable {
    rows: Vec<Measurement>,
}

impl MeasurementTable {
    pub fn from_rows(rows: Vec<Measurement>) -> Self {
        Self { rows }
    }

    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?;
        let rows = deserialize_rows(reader)?;
        info!("Read {} measurements from {}", rows.len(), path.display());
        Ok(Self { rows })
    }

    pub fn read_from<R: std::io::Read>(source: R) -> Result<Self> {
        let reader = ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);
        Ok(Self {
            rows: deserialize_rows(reader)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn select(&self, room: &str, wall: &str) -> Vec<&Measurement> {
        let selection: Vec<_> = self
            .rows
            .iter()
            .filter(|m| m.room == room && m.wall == wall)
            .collect();
        debug!("Selected {} rows for {room}, {wall}", selection.len());
        selection
    }

    /// Distinct room/wall pairs in order of first appearance.
    pub fn walls(&self) -> Vec<(&str, &str)> {
        let mut walls: Vec<(&str, &str)> = Vec::new();
        for m in &self.rows {
            let key = (m.room.as_str(), m.wall.as_str());
            if !walls.contains(&key) {
                walls.push(key);
            }
        }
        walls
    }
}

fn deserialize_rows<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<Measurement>> {
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<Measurement>, _>>()?;
    Ok(rows)
}
