//! `SQLite` schema definitions for carrental.
//!
//! Rates, kilometres and amounts are stored as decimal TEXT so that values
//! read back exactly as written. Timestamps are RFC 3339 UTC TEXT.

/// SQL statement to create the cars table.
pub const CREATE_CARS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS Cars (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    Model TEXT NOT NULL,
    HourlyRate TEXT NOT NULL,
    PerKmRate TEXT NOT NULL
)
";

/// SQL statement to create the clients table.
pub const CREATE_CLIENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS Clients (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT NOT NULL,
    Email TEXT NOT NULL UNIQUE
)
";

/// SQL statement to create the rentals table.
pub const CREATE_RENTALS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS Rentals (
    ID INTEGER PRIMARY KEY AUTOINCREMENT,
    ClientID INTEGER NOT NULL,
    CarID INTEGER NOT NULL,
    StartTime TEXT NOT NULL,
    EndTime TEXT,
    KilometersDriven TEXT,
    TotalAmount TEXT,
    FOREIGN KEY(ClientID) REFERENCES Clients(ID),
    FOREIGN KEY(CarID) REFERENCES Cars(ID)
)
";

/// Index for looking up rentals by car.
pub const CREATE_RENTALS_CAR_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_rentals_car ON Rentals(CarID)
";

/// Index for looking up rentals by client.
pub const CREATE_RENTALS_CLIENT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_rentals_client ON Rentals(ClientID)
";

/// Partial index over rentals that have not been closed yet.
pub const CREATE_OPEN_RENTALS_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_rentals_open ON Rentals(ID) WHERE EndTime IS NULL
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
///
/// Referenced tables come before the tables that reference them.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_CARS_TABLE,
    CREATE_CLIENTS_TABLE,
    CREATE_RENTALS_TABLE,
    CREATE_RENTALS_CAR_INDEX,
    CREATE_RENTALS_CLIENT_INDEX,
    CREATE_OPEN_RENTALS_INDEX,
    CREATE_METADATA_TABLE,
];
