//! Rental lifecycle and checkout billing.
//!
//! A rental is created open by [`RentalManager::start_rental`] and closed
//! exactly once by [`RentalManager::end_rental`], which stamps the end time,
//! records the kilometres driven and stores the billed total. Closed rentals
//! are terminal.
//!
//! Both operations run inside a single `IMMEDIATE` transaction, so the
//! existence checks and the write they guard cannot interleave with another
//! connection's write.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::billing::{elapsed_hours, BillingPolicy, Tariff};
use crate::car::ensure_non_negative;
use crate::error::{Error, Result};
use crate::storage::columns::{SqlDecimal, SqlTimestamp};
use crate::storage::Database;

/// Lifecycle state of a rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    /// The car is out; no end time yet.
    Open,
    /// The car is back and the rental has been billed.
    Closed,
}

impl RentalStatus {
    /// Lowercase name of the state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rental transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rental {
    /// Identifier assigned by storage.
    pub id: i64,
    /// The renting client.
    pub client_id: i64,
    /// The rented car.
    pub car_id: i64,
    /// When the rental was opened.
    pub start_time: DateTime<Utc>,
    /// When the rental was closed, if it has been.
    pub end_time: Option<DateTime<Utc>>,
    /// Distance driven, recorded at close.
    pub kilometers_driven: Option<Decimal>,
    /// Billed amount, recorded at close.
    pub total_amount: Option<Decimal>,
}

impl Rental {
    /// Current lifecycle state, derived from the end time.
    #[must_use]
    pub fn status(&self) -> RentalStatus {
        if self.end_time.is_some() {
            RentalStatus::Closed
        } else {
            RentalStatus::Open
        }
    }

    /// Whether the rental is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status() == RentalStatus::Open
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("ID")?,
            client_id: row.get("ClientID")?,
            car_id: row.get("CarID")?,
            start_time: row.get::<_, SqlTimestamp>("StartTime")?.0,
            end_time: row
                .get::<_, Option<SqlTimestamp>>("EndTime")?
                .map(|t| t.0),
            kilometers_driven: row
                .get::<_, Option<SqlDecimal>>("KilometersDriven")?
                .map(|d| d.0),
            total_amount: row
                .get::<_, Option<SqlDecimal>>("TotalAmount")?
                .map(|d| d.0),
        })
    }
}

const RENTAL_COLUMNS: &str =
    "ID, ClientID, CarID, StartTime, EndTime, KilometersDriven, TotalAmount";

/// What `end_rental` needs to know about an existing rental.
struct Checkout {
    client_id: i64,
    car_id: i64,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    tariff: Tariff,
}

/// Opens, closes and looks up rentals.
pub struct RentalManager {
    db: Database,
    clock: Arc<dyn Clock>,
    policy: BillingPolicy,
}

impl fmt::Debug for RentalManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RentalManager")
            .field("db", &self.db)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RentalManager {
    /// Create a manager that reads the time from `clock`.
    #[must_use]
    pub fn new(db: Database, clock: Arc<dyn Clock>, policy: BillingPolicy) -> Self {
        Self { db, clock, policy }
    }

    /// Create a manager on the system clock.
    #[must_use]
    pub fn with_system_clock(db: Database, policy: BillingPolicy) -> Self {
        Self::new(db, Arc::new(mockable::DefaultClock), policy)
    }

    /// Open a rental of `car_id` by `client_id`, starting now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReferentialIntegrity`] if the client or car does not
    /// exist, or a storage error.
    pub fn start_rental(&self, client_id: i64, car_id: i64) -> Result<Rental> {
        let mut conn = self.db.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !row_exists(&tx, "SELECT 1 FROM Clients WHERE ID = ?1", client_id)? {
            return Err(Error::missing_reference("client", client_id));
        }
        if !row_exists(&tx, "SELECT 1 FROM Cars WHERE ID = ?1", car_id)? {
            return Err(Error::missing_reference("car", car_id));
        }

        let start_time = self.clock.utc();
        tx.execute(
            "INSERT INTO Rentals (ClientID, CarID, StartTime) VALUES (?1, ?2, ?3)",
            params![client_id, car_id, SqlTimestamp(start_time)],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(
            "Started rental {} of car {} for client {}",
            id, car_id, client_id
        );

        Ok(Rental {
            id,
            client_id,
            car_id,
            start_time,
            end_time: None,
            kilometers_driven: None,
            total_amount: None,
        })
    }

    /// Close an open rental and bill it.
    ///
    /// The charge is `elapsed_hours * hourly_rate + kilometers_driven *
    /// per_km_rate`, with elapsed time measured from the stored start time to
    /// now. Nothing is written unless every check passes.
    ///
    /// # Errors
    ///
    /// Returns a validation error for negative kilometres,
    /// [`Error::NotFound`] for an unknown rental, [`Error::AlreadyClosed`]
    /// for a rental that was closed before, or a storage error.
    pub fn end_rental(&self, rental_id: i64, kilometers_driven: Decimal) -> Result<Rental> {
        ensure_non_negative("kilometers_driven", kilometers_driven)?;

        let mut conn = self.db.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let checkout = load_checkout(&tx, rental_id)?
            .ok_or_else(|| Error::not_found("rental", rental_id))?;
        if checkout.end_time.is_some() {
            return Err(Error::AlreadyClosed { rental_id });
        }

        let end_time = self.clock.utc();
        let hours = elapsed_hours(checkout.start_time, end_time)?;
        let total_amount = self
            .policy
            .charge(hours, checkout.tariff, kilometers_driven)?;

        let updated = tx.execute(
            r"
            UPDATE Rentals
            SET EndTime = ?1, KilometersDriven = ?2, TotalAmount = ?3
            WHERE ID = ?4 AND EndTime IS NULL
            ",
            params![
                SqlTimestamp(end_time),
                SqlDecimal(kilometers_driven),
                SqlDecimal(total_amount),
                rental_id
            ],
        )?;
        if updated != 1 {
            return Err(Error::AlreadyClosed { rental_id });
        }
        tx.commit()?;

        info!(
            "Closed rental {} after {} h and {} km, total {}",
            rental_id, hours, kilometers_driven, total_amount
        );

        Ok(Rental {
            id: rental_id,
            client_id: checkout.client_id,
            car_id: checkout.car_id,
            start_time: checkout.start_time,
            end_time: Some(end_time),
            kilometers_driven: Some(kilometers_driven),
            total_amount: Some(total_amount),
        })
    }

    /// Get a rental by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_rental(&self, id: i64) -> Result<Option<Rental>> {
        let conn = self.db.connect()?;
        let rental = conn
            .query_row(
                &format!("SELECT {RENTAL_COLUMNS} FROM Rentals WHERE ID = ?1"),
                [id],
                Rental::from_row,
            )
            .optional()?;
        Ok(rental)
    }

    /// List rentals, optionally only those in the given state.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_rentals(&self, status: Option<RentalStatus>) -> Result<Vec<Rental>> {
        let filter = match status {
            None => "",
            Some(RentalStatus::Open) => "WHERE EndTime IS NULL",
            Some(RentalStatus::Closed) => "WHERE EndTime IS NOT NULL",
        };

        let conn = self.db.connect()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {RENTAL_COLUMNS} FROM Rentals {filter} ORDER BY ID"))?;
        let rentals = stmt
            .query_map([], Rental::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!("Listed {} rentals", rentals.len());
        Ok(rentals)
    }
}

fn row_exists(conn: &Connection, sql: &str, id: i64) -> Result<bool> {
    let found = conn
        .query_row(sql, [id], |_| Ok(()))
        .optional()?
        .is_some();
    Ok(found)
}

fn load_checkout(conn: &Connection, rental_id: i64) -> Result<Option<Checkout>> {
    let checkout = conn
        .query_row(
            r"
            SELECT
                Rentals.ClientID AS ClientID,
                Rentals.CarID AS CarID,
                Rentals.StartTime AS StartTime,
                Rentals.EndTime AS EndTime,
                Cars.HourlyRate AS HourlyRate,
                Cars.PerKmRate AS PerKmRate
            FROM Rentals JOIN Cars ON Rentals.CarID = Cars.ID
            WHERE Rentals.ID = ?1
            ",
            [rental_id],
            |row| {
                Ok(Checkout {
                    client_id: row.get("ClientID")?,
                    car_id: row.get("CarID")?,
                    start_time: row.get::<_, SqlTimestamp>("StartTime")?.0,
                    end_time: row
                        .get::<_, Option<SqlTimestamp>>("EndTime")?
                        .map(|t| t.0),
                    tariff: Tariff {
                        hourly_rate: row.get::<_, SqlDecimal>("HourlyRate")?.0,
                        per_km_rate: row.get::<_, SqlDecimal>("PerKmRate")?.0,
                    },
                })
            },
        )
        .optional()?;
    Ok(checkout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::car::{Car, CarRegistry, NewCar};
    use crate::client::{Client, ClientRegistry, NewClient};
    use crate::testing::{create_test_database, fixture_time, MutableClock};
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use std::sync::Barrier;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        clock: Arc<MutableClock>,
        rentals: RentalManager,
        car: Car,
        client: Client,
    }

    fn fixture_with_rates(hourly: Decimal, per_km: Decimal) -> Fixture {
        crate::logging::init_test_logging();
        let (dir, db) = create_test_database();
        let car = CarRegistry::new(db.clone())
            .add_car(NewCar::new("Model 3", hourly, per_km))
            .unwrap();
        let client = ClientRegistry::new(db.clone())
            .register_client(NewClient::new("Ada", "ada@example.com"))
            .unwrap();
        let clock = Arc::new(MutableClock::new(fixture_time()));
        let rentals = RentalManager::new(db, clock.clone(), BillingPolicy::default());

        Fixture {
            _dir: dir,
            clock,
            rentals,
            car,
            client,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_rates(dec!(10), dec!(2))
    }

    #[test]
    fn test_start_rental_is_open() {
        let f = fixture();
        let rental = f.rentals.start_rental(f.client.id, f.car.id).unwrap();

        assert_eq!(rental.status(), RentalStatus::Open);
        assert_eq!(rental.start_time, fixture_time());
        assert!(rental.end_time.is_none());
        assert!(rental.kilometers_driven.is_none());
        assert!(rental.total_amount.is_none());
        assert_eq!(f.rentals.get_rental(rental.id).unwrap(), Some(rental));
    }

    #[test]
    fn test_start_rental_unknown_client() {
        let f = fixture();
        let err = f.rentals.start_rental(999, f.car.id).unwrap_err();

        assert!(matches!(
            err,
            Error::ReferentialIntegrity {
                entity: "client",
                id: 999
            }
        ));
        assert!(f.rentals.list_rentals(None).unwrap().is_empty());
    }

    #[test]
    fn test_start_rental_unknown_car() {
        let f = fixture();
        let err = f.rentals.start_rental(f.client.id, 999).unwrap_err();

        assert!(matches!(
            err,
            Error::ReferentialIntegrity {
                entity: "car",
                id: 999
            }
        ));
    }

    #[test]
    fn test_two_hour_rental_bills_exactly() {
        let f = fixture();
        let rental = f.rentals.start_rental(f.client.id, f.car.id).unwrap();

        f.clock.advance(Duration::hours(2));
        let closed = f.rentals.end_rental(rental.id, dec!(5)).unwrap();

        assert_eq!(closed.total_amount, Some(dec!(30)));
        assert_eq!(closed.kilometers_driven, Some(dec!(5)));
        assert_eq!(closed.end_time, Some(fixture_time() + Duration::hours(2)));
        assert_eq!(closed.status(), RentalStatus::Closed);
    }

    #[test]
    fn test_half_hour_bills_half_the_hourly_rate() {
        let f = fixture_with_rates(dec!(10), dec!(0));
        let rental = f.rentals.start_rental(f.client.id, f.car.id).unwrap();

        f.clock.advance(Duration::minutes(30));
        let closed = f.rentals.end_rental(rental.id, dec!(0)).unwrap();

        assert_eq!(closed.total_amount, Some(dec!(5)));
    }

    #[test]
    fn test_closed_rental_reads_back_identical() {
        let f = fixture();
        let rental = f.rentals.start_rental(f.client.id, f.car.id).unwrap();

        f.clock.advance(Duration::minutes(95));
        let closed = f.rentals.end_rental(rental.id, dec!(42.7)).unwrap();

        let stored = f.rentals.get_rental(rental.id).unwrap().unwrap();
        assert_eq!(stored, closed);
        assert_eq!(stored.kilometers_driven.unwrap().scale(), 1);
    }

    #[test]
    fn test_end_unknown_rental() {
        let f = fixture();
        let err = f.rentals.end_rental(12345, dec!(1)).unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn test_end_twice_is_rejected() {
        let f = fixture();
        let rental = f.rentals.start_rental(f.client.id, f.car.id).unwrap();

        f.clock.advance(Duration::hours(1));
        let first = f.rentals.end_rental(rental.id, dec!(10)).unwrap();

        f.clock.advance(Duration::hours(5));
        let err = f.rentals.end_rental(rental.id, dec!(500)).unwrap_err();
        assert!(err.is_already_closed());

        let stored = f.rentals.get_rental(rental.id).unwrap().unwrap();
        assert_eq!(stored, first);
    }

    #[test]
    fn test_negative_kilometers_leave_rental_open() {
        let f = fixture();
        let rental = f.rentals.start_rental(f.client.id, f.car.id).unwrap();

        f.clock.advance(Duration::hours(1));
        let err = f.rentals.end_rental(rental.id, dec!(-3)).unwrap_err();
        assert!(err.is_validation());

        let stored = f.rentals.get_rental(rental.id).unwrap().unwrap();
        assert!(stored.is_open());
        assert_eq!(stored, rental);
    }

    #[test]
    fn test_clock_going_backwards_leaves_rental_open() {
        let f = fixture();
        let rental = f.rentals.start_rental(f.client.id, f.car.id).unwrap();

        f.clock.advance(Duration::minutes(-1));
        let err = f.rentals.end_rental(rental.id, dec!(1)).unwrap_err();
        assert!(err.is_validation());
        assert!(f.rentals.get_rental(rental.id).unwrap().unwrap().is_open());
    }

    #[test]
    fn test_concurrent_closes_bill_once() {
        let f = fixture();
        let rental = f.rentals.start_rental(f.client.id, f.car.id).unwrap();
        f.clock.advance(Duration::hours(2));

        let rental_id = rental.id;
        let db = f.rentals.db.clone();
        let barrier = Barrier::new(2);
        let results: Vec<Result<Rental>> = std::thread::scope(|scope| {
            let handles: Vec<_> = [dec!(5), dec!(50)]
                .into_iter()
                .map(|km| {
                    let db = db.clone();
                    let clock = f.clock.clone();
                    let barrier = &barrier;
                    scope.spawn(move || {
                        let manager = RentalManager::new(db, clock, BillingPolicy::default());
                        barrier.wait();
                        manager.end_rental(rental_id, km)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let closed: Vec<&Rental> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(closed.len(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(Error::AlreadyClosed { rental_id: id }) if *id == rental_id)));

        let stored = f.rentals.get_rental(rental.id).unwrap().unwrap();
        assert_eq!(&stored, closed[0]);
    }

    #[test]
    fn test_end_rental_touches_only_its_row() {
        let f = fixture();
        let first = f.rentals.start_rental(f.client.id, f.car.id).unwrap();
        let second = f.rentals.start_rental(f.client.id, f.car.id).unwrap();

        f.clock.advance(Duration::hours(3));
        f.rentals.end_rental(first.id, dec!(20)).unwrap();

        assert_eq!(f.rentals.get_rental(second.id).unwrap(), Some(second));
    }

    #[test]
    fn test_list_rentals_by_status() {
        let f = fixture();
        let open = f.rentals.start_rental(f.client.id, f.car.id).unwrap();
        let to_close = f.rentals.start_rental(f.client.id, f.car.id).unwrap();
        f.clock.advance(Duration::hours(1));
        let closed = f.rentals.end_rental(to_close.id, dec!(0)).unwrap();

        assert_eq!(f.rentals.list_rentals(None).unwrap().len(), 2);
        assert_eq!(
            f.rentals.list_rentals(Some(RentalStatus::Open)).unwrap(),
            vec![open]
        );
        assert_eq!(
            f.rentals.list_rentals(Some(RentalStatus::Closed)).unwrap(),
            vec![closed]
        );
    }

    #[test]
    fn test_rental_status_display() {
        assert_eq!(RentalStatus::Open.to_string(), "open");
        assert_eq!(RentalStatus::Closed.as_str(), "closed");
    }

    #[test]
    fn test_rental_manager_debug_omits_clock() {
        let f = fixture();
        let debug_str = format!("{:?}", f.rentals);
        assert!(debug_str.contains("RentalManager"));
        assert!(debug_str.contains("policy"));
    }
}
