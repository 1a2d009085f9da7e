use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::StorageError;
use crate::models::{canonicalize_address, has_address_shape, Transaction};
use crate::storage::schema::initialize_schema;
use crate::storage::Storage;

/// SQLite-backed store with the same semantics as [`crate::storage::MemoryStorage`]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) a database file and initialize the schema
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        initialize_schema(&conn)?;

        Ok(SqliteStorage {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn new_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;

        Ok(SqliteStorage {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Lock("Failed to acquire lock".to_string()))
    }

    fn insert_row(conn: &Connection, address: &str, transaction: &Transaction) -> Result<(), StorageError> {
        conn.execute(
            "INSERT INTO address_transactions
                (address, transaction_hash, from_address, to_address, value, value_wei, block_number, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                address,
                transaction.hash,
                transaction.from_address,
                transaction.to_address,
                transaction.value,
                transaction.value_wei,
                transaction.block_number,
                transaction.timestamp,
            ],
        )?;
        Ok(())
    }
}

impl Storage for SqliteStorage {
    fn add_subscriber(&self, address: &str) -> Result<bool, StorageError> {
        if !has_address_shape(address) {
            return Ok(false);
        }

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO subscribers (address) VALUES (?1)",
            params![canonicalize_address(address)],
        )?;
        Ok(true)
    }

    fn is_subscribed(&self, address: &str) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM subscribers WHERE address = ?1",
                params![canonicalize_address(address)],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn list_subscribers(&self) -> Result<HashSet<String>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT address FROM subscribers")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut subscribers = HashSet::new();
        for row in rows {
            subscribers.insert(row?);
        }
        Ok(subscribers)
    }

    fn store_transaction(&self, transaction: &Transaction, owners: &[&str]) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        for owner in owners {
            Self::insert_row(&tx, &canonicalize_address(owner), transaction)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_transactions(&self, address: &str) -> Result<Vec<Transaction>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT transaction_hash, from_address, to_address, value, value_wei, block_number, timestamp
             FROM address_transactions WHERE address = ?1 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![canonicalize_address(address)], |row| {
            Ok(Transaction {
                hash: row.get(0)?,
                from_address: row.get(1)?,
                to_address: row.get(2)?,
                value: row.get(3)?,
                value_wei: row.get(4)?,
                block_number: row.get(5)?,
                timestamp: row.get(6)?,
            })
        })?;

        let mut transactions = Vec::new();
        for row in rows {
            transactions.push(row?);
        }
        Ok(transactions)
    }

    fn update_block_cursor(&self, height: u64) -> Result<(), StorageError> {
        let conn = self.lock()?;
        let rows_affected = conn.execute(
            "UPDATE block_cursor SET height = ?1, last_updated = strftime('%s', 'now') WHERE id = 1",
            params![height],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::Corrupt("block_cursor row is missing".to_string()));
        }
        Ok(())
    }

    fn get_block_cursor(&self) -> Result<u64, StorageError> {
        let conn = self.lock()?;
        let height: u64 = conn.query_row("SELECT height FROM block_cursor WHERE id = 1", [], |row| row.get(0))?;
        Ok(height)
    }
}
