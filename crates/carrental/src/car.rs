//! Car records and the car registry.
//!
//! Cars are created once and never modified or deleted.

use rusqlite::{params, OptionalExtension};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::billing::Tariff;
use crate::error::{Error, Result};
use crate::storage::columns::SqlDecimal;
use crate::storage::Database;

/// A rentable car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    /// Identifier assigned by storage.
    pub id: i64,
    /// Model name.
    pub model: String,
    /// Price per hour of rental.
    pub hourly_rate: Decimal,
    /// Price per kilometre driven.
    pub per_km_rate: Decimal,
}

impl Car {
    /// The billing parameters of this car.
    #[must_use]
    pub fn tariff(&self) -> Tariff {
        Tariff {
            hourly_rate: self.hourly_rate,
            per_km_rate: self.per_km_rate,
        }
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("ID")?,
            model: row.get("Model")?,
            hourly_rate: row.get::<_, SqlDecimal>("HourlyRate")?.0,
            per_km_rate: row.get::<_, SqlDecimal>("PerKmRate")?.0,
        })
    }
}

/// Input for [`CarRegistry::add_car`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCar {
    /// Model name; must not be blank.
    pub model: String,
    /// Price per hour; must not be negative.
    pub hourly_rate: Decimal,
    /// Price per kilometre; must not be negative.
    pub per_km_rate: Decimal,
}

impl NewCar {
    /// Create a new car input.
    #[must_use]
    pub fn new(model: impl Into<String>, hourly_rate: Decimal, per_km_rate: Decimal) -> Self {
        Self {
            model: model.into(),
            hourly_rate,
            per_km_rate,
        }
    }

    /// Check the input, returning it with the model trimmed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank model or a negative rate.
    pub fn validate(self) -> Result<Self> {
        let model = self.model.trim();
        if model.is_empty() {
            return Err(Error::validation("model", "must not be empty"));
        }
        ensure_non_negative("hourly_rate", self.hourly_rate)?;
        ensure_non_negative("per_km_rate", self.per_km_rate)?;

        Ok(Self {
            model: model.to_string(),
            ..self
        })
    }
}

pub(crate) fn ensure_non_negative(field: &'static str, value: Decimal) -> Result<()> {
    if value < Decimal::ZERO {
        return Err(Error::validation(
            field,
            format!("must not be negative, got {value}"),
        ));
    }
    Ok(())
}

/// Creates and lists cars.
#[derive(Debug, Clone)]
pub struct CarRegistry {
    db: Database,
}

impl CarRegistry {
    /// Create a registry backed by the given database.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Add a car and return it with its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, or a storage error.
    pub fn add_car(&self, car: NewCar) -> Result<Car> {
        let car = car.validate()?;
        let conn = self.db.connect()?;

        conn.execute(
            "INSERT INTO Cars (Model, HourlyRate, PerKmRate) VALUES (?1, ?2, ?3)",
            params![
                car.model,
                SqlDecimal(car.hourly_rate),
                SqlDecimal(car.per_km_rate)
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!("Added car {} ({})", id, car.model);

        Ok(Car {
            id,
            model: car.model,
            hourly_rate: car.hourly_rate,
            per_km_rate: car.per_km_rate,
        })
    }

    /// Get every car, in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_all_cars(&self) -> Result<Vec<Car>> {
        let conn = self.db.connect()?;
        let mut stmt =
            conn.prepare("SELECT ID, Model, HourlyRate, PerKmRate FROM Cars ORDER BY ID")?;

        let cars = stmt
            .query_map([], Car::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(cars)
    }

    /// Get a car by its identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_car(&self, id: i64) -> Result<Option<Car>> {
        let conn = self.db.connect()?;
        let car = conn
            .query_row(
                "SELECT ID, Model, HourlyRate, PerKmRate FROM Cars WHERE ID = ?1",
                [id],
                Car::from_row,
            )
            .optional()?;
        Ok(car)
    }
}
