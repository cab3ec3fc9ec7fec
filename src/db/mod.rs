// Customers Service
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Database abstraction to persist customers and their addresses.
//!
//! The facilities in this module provide an abstraction over different database systems.  The
//! PostgreSQL backend is for production use and the SQLite backend is primarily intended to
//! support unit tests.

use crate::model::{Address, AddressData, AddressId, Customer, CustomerData, CustomerId, ModelError};
use async_trait::async_trait;
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(any(feature = "sqlite", test))]
pub mod sqlite;

/// Database errors.  Any unexpected errors that come from the database are classified as
/// `BackendError`, but errors we know about have more specific types.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DbError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all error type for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Indicates a failure processing the data that already exists in the database.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// Indicates that a requested entry does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Indicates that the database is not available (maybe because of too many active concurrent
    /// connections).
    #[error("Unavailable")]
    Unavailable,
}

impl From<ModelError> for DbError {
    fn from(e: ModelError) -> Self {
        DbError::DataIntegrityError(e.to_string())
    }
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// A database executor that can talk to multiple database implementations.
///
/// This type provides a generic mechanism to access a typed instance of a database, which is needed
/// by sqlx to offer type safety guarantees during query compilation.  Users of this type are forced
/// to destructure it and issue different calls for each database.
///
/// Note that this can wrap an executor that talks directly to a pool or to an open transaction.
pub enum Executor {
    /// A PostgreSQL executor that can be used in `sqlx` operations.
    #[cfg(feature = "postgres")]
    Postgres(postgres::PostgresExecutor),

    /// A SQLite executor that can be used in `sqlx` operations.
    #[cfg(any(feature = "sqlite", test))]
    Sqlite(sqlite::SqliteExecutor),
}

/// A wrapper for a database executor backed by an open transaction.
pub struct TxExecutor(Executor);

impl TxExecutor {
    /// Returns the executor wrapped by this transaction.
    ///
    /// This would be better called `executor` but this method is used so frequently that it makes
    /// call sites too verbose.
    pub fn ex(&mut self) -> &mut Executor {
        &mut self.0
    }

    /// Commits the transaction.
    pub async fn commit(self) -> DbResult<()> {
        match self.0 {
            #[cfg(feature = "postgres")]
            Executor::Postgres(e) => e.commit().await,

            #[cfg(any(feature = "sqlite", test))]
            Executor::Sqlite(e) => e.commit().await,
        }
    }
}

/// Abstraction over the database connection.
#[async_trait]
pub trait Db {
    /// Obtains an executor for direct access to the pool.
    ///
    /// This would be better called `executor` but this method is used so frequently that it makes
    /// call sites too verbose.
    async fn ex(&self) -> DbResult<Executor>;

    /// Begins a transaction.
    ///
    /// It is the responsibility of the caller to call `commit` on the returned executor.  Otherwise
    /// the transaction is rolled back on drop.
    async fn begin(&self) -> DbResult<TxExecutor>;

    /// Closes the connection pool, preventing new connections from being established.
    async fn close(&self);
}

/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Customer {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i32 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let username: String = row.try_get("username").map_err(postgres::map_sqlx_error)?;
        let password: String = row.try_get("password").map_err(postgres::map_sqlx_error)?;
        let first_name: String = row.try_get("first_name").map_err(postgres::map_sqlx_error)?;
        let last_name: String = row.try_get("last_name").map_err(postgres::map_sqlx_error)?;
        let locked: bool = row.try_get("locked").map_err(postgres::map_sqlx_error)?;

        let data = CustomerData::new(username, password, first_name, last_name);
        Ok(Customer::new(CustomerId::new(id), data, locked))
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Address {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let address_id: i32 = row.try_get("address_id").map_err(postgres::map_sqlx_error)?;
        let customer_id: i32 = row.try_get("customer_id").map_err(postgres::map_sqlx_error)?;
        let street_address: String =
            row.try_get("street_address").map_err(postgres::map_sqlx_error)?;
        let city: String = row.try_get("city").map_err(postgres::map_sqlx_error)?;
        let state: String = row.try_get("state").map_err(postgres::map_sqlx_error)?;
        let zipcode: i32 = row.try_get("zipcode").map_err(postgres::map_sqlx_error)?;
        let country: String = row.try_get("country").map_err(postgres::map_sqlx_error)?;

        let data = AddressData::new(street_address, city, state, zipcode, country);
        Ok(Address::new(CustomerId::new(customer_id), AddressId::new(address_id), data))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Customer {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let username: String = row.try_get("username").map_err(sqlite::map_sqlx_error)?;
        let password: String = row.try_get("password").map_err(sqlite::map_sqlx_error)?;
        let first_name: String = row.try_get("first_name").map_err(sqlite::map_sqlx_error)?;
        let last_name: String = row.try_get("last_name").map_err(sqlite::map_sqlx_error)?;
        let locked: bool = row.try_get("locked").map_err(sqlite::map_sqlx_error)?;

        let data = CustomerData::new(username, password, first_name, last_name);
        Ok(Customer::new(CustomerId::from_i64(id)?, data, locked))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Address {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let address_id: i64 = row.try_get("address_id").map_err(sqlite::map_sqlx_error)?;
        let customer_id: i64 = row.try_get("customer_id").map_err(sqlite::map_sqlx_error)?;
        let street_address: String =
            row.try_get("street_address").map_err(sqlite::map_sqlx_error)?;
        let city: String = row.try_get("city").map_err(sqlite::map_sqlx_error)?;
        let state: String = row.try_get("state").map_err(sqlite::map_sqlx_error)?;
        let zipcode: i64 = row.try_get("zipcode").map_err(sqlite::map_sqlx_error)?;
        let country: String = row.try_get("country").map_err(sqlite::map_sqlx_error)?;

        let zipcode = i32::try_from(zipcode)
            .map_err(|e| DbError::DataIntegrityError(format!("Invalid zipcode: {}", e)))?;
        let data = AddressData::new(street_address, city, state, zipcode, country);
        Ok(Address::new(CustomerId::from_i64(customer_id)?, AddressId::from_i64(address_id)?, data))
    }
}

/// Checks that an update statement affected exactly one row.
fn ensure_one_update(rows_affected: u64) -> DbResult<()> {
    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}

/// Creates a new customer with the given `data` and returns its identifier.
///
/// The new customer starts out unlocked and with no addresses attached.
pub(crate) async fn create_customer(ex: &mut Executor, data: &CustomerData) -> DbResult<CustomerId> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO customers (username, password, first_name, last_name, locked)
                VALUES ($1, $2, $3, $4, FALSE)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(data.username())
                .bind(data.password())
                .bind(data.first_name())
                .bind(data.last_name())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            let id: i32 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
            Ok(CustomerId::new(id))
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO customers (username, password, first_name, last_name, locked)
                VALUES (?, ?, ?, ?, FALSE)";
            let done = sqlx::query(query_str)
                .bind(data.username())
                .bind(data.password())
                .bind(data.first_name())
                .bind(data.last_name())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Ok(CustomerId::from_i64(done.last_insert_rowid())?)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the customer with identifier `id`, without its addresses attached.
pub(crate) async fn get_customer(ex: &mut Executor, id: CustomerId) -> DbResult<Customer> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM customers WHERE id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_i32())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Customer::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM customers WHERE id = ?";
            let row = sqlx::query(query_str)
                .bind(id.as_i32())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Customer::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Lists all customers, without their addresses attached, ordered by identifier.
pub(crate) async fn list_customers(ex: &mut Executor) -> DbResult<Vec<Customer>> {
    let rows = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM customers ORDER BY id";
            let rows = sqlx::query(query_str)
                .fetch_all(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Customer::try_from).collect::<DbResult<Vec<Customer>>>()?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM customers ORDER BY id";
            let rows =
                sqlx::query(query_str).fetch_all(ex).await.map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Customer::try_from).collect::<DbResult<Vec<Customer>>>()?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    Ok(rows)
}

/// Looks up the identifier of the customer whose username is `username`, if any.
pub(crate) async fn find_customer_by_username(
    ex: &mut Executor,
    username: &str,
) -> DbResult<Option<CustomerId>> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT id FROM customers WHERE username = $1";
            let maybe_row = sqlx::query(query_str)
                .bind(username)
                .fetch_optional(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            match maybe_row {
                Some(row) => {
                    let id: i32 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
                    Ok(Some(CustomerId::new(id)))
                }
                None => Ok(None),
            }
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT id FROM customers WHERE username = ?";
            let maybe_row = sqlx::query(query_str)
                .bind(username)
                .fetch_optional(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            match maybe_row {
                Some(row) => {
                    let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
                    Ok(Some(CustomerId::from_i64(id)?))
                }
                None => Ok(None),
            }
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Updates the client-settable fields of the customer with identifier `id`.
///
/// The `locked` flag and the attached addresses are not touched.
pub(crate) async fn update_customer(
    ex: &mut Executor,
    id: CustomerId,
    data: &CustomerData,
) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE customers SET username = $1, password = $2, first_name = $3, last_name = $4
                WHERE id = $5";
            let done = sqlx::query(query_str)
                .bind(data.username())
                .bind(data.password())
                .bind(data.first_name())
                .bind(data.last_name())
                .bind(id.as_i32())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE customers SET username = ?, password = ?, first_name = ?, last_name = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(data.username())
                .bind(data.password())
                .bind(data.first_name())
                .bind(data.last_name())
                .bind(id.as_i32())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    ensure_one_update(rows_affected)
}

/// Sets the `locked` flag of the customer with identifier `id`.
pub(crate) async fn set_customer_locked(
    ex: &mut Executor,
    id: CustomerId,
    locked: bool,
) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "UPDATE customers SET locked = $1 WHERE id = $2";
            let done = sqlx::query(query_str)
                .bind(locked)
                .bind(id.as_i32())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "UPDATE customers SET locked = ? WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(locked)
                .bind(id.as_i32())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    ensure_one_update(rows_affected)
}

/// Deletes the customer with identifier `id`.  Deleting a customer that does not exist is not
/// an error.
pub(crate) async fn delete_customer(ex: &mut Executor, id: CustomerId) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM customers WHERE id = $1";
            sqlx::query(query_str)
                .bind(id.as_i32())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM customers WHERE id = ?";
            sqlx::query(query_str)
                .bind(id.as_i32())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
    Ok(())
}

/// Creates a new address owned by `customer_id` with the given `data` and returns its
/// identifier.  The owning customer must exist.
pub(crate) async fn create_address(
    ex: &mut Executor,
    customer_id: CustomerId,
    data: &AddressData,
) -> DbResult<AddressId> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO addresses (customer_id, street_address, city, state, zipcode, country)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING address_id";
            let row = sqlx::query(query_str)
                .bind(customer_id.as_i32())
                .bind(data.street_address())
                .bind(data.city())
                .bind(data.state())
                .bind(data.zipcode())
                .bind(data.country())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            let id: i32 = row.try_get("address_id").map_err(postgres::map_sqlx_error)?;
            Ok(AddressId::new(id))
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO addresses (customer_id, street_address, city, state, zipcode, country)
                VALUES (?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(customer_id.as_i32())
                .bind(data.street_address())
                .bind(data.city())
                .bind(data.state())
                .bind(data.zipcode())
                .bind(data.country())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Ok(AddressId::from_i64(done.last_insert_rowid())?)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the address with identifier `id`, regardless of which customer owns it.
pub(crate) async fn get_address(ex: &mut Executor, id: AddressId) -> DbResult<Address> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM addresses WHERE address_id = $1";
            let row = sqlx::query(query_str)
                .bind(id.as_i32())
                .fetch_one(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Address::try_from(row)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM addresses WHERE address_id = ?";
            let row = sqlx::query(query_str)
                .bind(id.as_i32())
                .fetch_one(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Address::try_from(row)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Lists the addresses owned by `customer_id`, ordered by identifier.
pub(crate) async fn list_addresses(
    ex: &mut Executor,
    customer_id: CustomerId,
) -> DbResult<Vec<Address>> {
    let addresses = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "SELECT * FROM addresses WHERE customer_id = $1 ORDER BY address_id";
            let rows = sqlx::query(query_str)
                .bind(customer_id.as_i32())
                .fetch_all(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            rows.into_iter().map(Address::try_from).collect::<DbResult<Vec<Address>>>()?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM addresses WHERE customer_id = ? ORDER BY address_id";
            let rows = sqlx::query(query_str)
                .bind(customer_id.as_i32())
                .fetch_all(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            rows.into_iter().map(Address::try_from).collect::<DbResult<Vec<Address>>>()?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    Ok(addresses)
}

/// Updates the client-settable fields of the address with identifier `id`.
pub(crate) async fn update_address(
    ex: &mut Executor,
    id: AddressId,
    data: &AddressData,
) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE addresses
                SET street_address = $1, city = $2, state = $3, zipcode = $4, country = $5
                WHERE address_id = $6";
            let done = sqlx::query(query_str)
                .bind(data.street_address())
                .bind(data.city())
                .bind(data.state())
                .bind(data.zipcode())
                .bind(data.country())
                .bind(id.as_i32())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE addresses
                SET street_address = ?, city = ?, state = ?, zipcode = ?, country = ?
                WHERE address_id = ?";
            let done = sqlx::query(query_str)
                .bind(data.street_address())
                .bind(data.city())
                .bind(data.state())
                .bind(data.zipcode())
                .bind(data.country())
                .bind(id.as_i32())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    ensure_one_update(rows_affected)
}

/// Deletes the address with identifier `id`.  Deleting an address that does not exist is not
/// an error.
pub(crate) async fn delete_address(ex: &mut Executor, id: AddressId) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM addresses WHERE address_id = $1";
            sqlx::query(query_str)
                .bind(id.as_i32())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM addresses WHERE address_id = ?";
            sqlx::query(query_str)
                .bind(id.as_i32())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
    Ok(())
}

/// Deletes all addresses owned by `customer_id`.
pub(crate) async fn delete_addresses_by_customer(
    ex: &mut Executor,
    customer_id: CustomerId,
) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "DELETE FROM addresses WHERE customer_id = $1";
            sqlx::query(query_str)
                .bind(customer_id.as_i32())
                .execute(ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM addresses WHERE customer_id = ?";
            sqlx::query(query_str)
                .bind(customer_id.as_i32())
                .execute(ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
    Ok(())
}
