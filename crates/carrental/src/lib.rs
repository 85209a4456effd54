//! `carrental` - persistence and billing for a car-rental business
//!
//! Cars and clients are registered once; rentals are opened against them and
//! closed with an exact decimal charge computed from elapsed time and
//! kilometres driven.
//!
//! ```no_run
//! use carrental::{BillingPolicy, CarRegistry, ClientRegistry, Database, NewCar, NewClient, RentalManager};
//! use rust_decimal::Decimal;
//!
//! let db = Database::open("rental.db")?;
//! let car = CarRegistry::new(db.clone()).add_car(NewCar::new("Model 3", Decimal::TEN, Decimal::TWO))?;
//! let client = ClientRegistry::new(db.clone()).register_client(NewClient::new("Ada", "ada@example.com"))?;
//!
//! let rentals = RentalManager::with_system_clock(db, BillingPolicy::default());
//! let rental = rentals.start_rental(client.id, car.id)?;
//! let closed = rentals.end_rental(rental.id, Decimal::from(42))?;
//! println!("total: {:?}", closed.total_amount);
//! # Ok::<(), carrental::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod billing;
pub mod car;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod rental;
pub mod storage;

#[cfg(test)]
mod testing;

pub use billing::{BillingPolicy, Tariff};
pub use car::{Car, CarRegistry, NewCar};
pub use client::{Client, ClientRegistry, NewClient};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use rental::{Rental, RentalManager, RentalStatus};
pub use storage::{Database, StorageStats};
