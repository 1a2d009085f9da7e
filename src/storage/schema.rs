use rusqlite::{Connection, Result};

/// Create the store tables if they do not exist yet
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS subscribers (
            address TEXT PRIMARY KEY,
            created_at INTEGER DEFAULT (strftime('%s', 'now'))
        )",
        [],
    )?;

    // One row per (address, transaction) pairing; no uniqueness on hash
    conn.execute(
        "CREATE TABLE IF NOT EXISTS address_transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            address TEXT NOT NULL,
            transaction_hash TEXT NOT NULL,
            from_address TEXT NOT NULL,
            to_address TEXT,
            value REAL NOT NULL,
            value_wei TEXT NOT NULL,
            block_number INTEGER NOT NULL,
            timestamp INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS block_cursor (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            height INTEGER NOT NULL DEFAULT 0,
            last_updated INTEGER DEFAULT (strftime('%s', 'now'))
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_address_transactions_address ON address_transactions(address, id)",
        [],
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO block_cursor (id, height) VALUES (1, 0)",
        [],
    )?;

    Ok(())
}
