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

//! Extends the driver with operations on a single customer.

use crate::db::{self, DbError};
use crate::driver::{customer_not_found, username_taken, Driver, DriverResult};
use crate::model::{Customer, CustomerData, CustomerId};
use log::info;

impl Driver {
    /// Gets the customer with identifier `id`, with its addresses attached.
    pub(crate) async fn get_customer(self, id: CustomerId) -> DriverResult<Customer> {
        let mut ex = self.db.ex().await?;

        let customer = match db::get_customer(&mut ex, id).await {
            Ok(customer) => customer,
            Err(DbError::NotFound) => return Err(customer_not_found(id)),
            Err(e) => return Err(e.into()),
        };
        let addresses = db::list_addresses(&mut ex, id).await?;
        Ok(customer.with_addresses(addresses))
    }

    /// Replaces the client-settable fields of the customer with identifier `id`.
    ///
    /// The identifier, the lock flag and the attached addresses are all preserved, no matter
    /// what the caller supplied.
    pub(crate) async fn update_customer(
        self,
        id: CustomerId,
        data: CustomerData,
    ) -> DriverResult<Customer> {
        let mut tx = self.db.begin().await?;

        let old = match db::get_customer(tx.ex(), id).await {
            Ok(customer) => customer,
            Err(DbError::NotFound) => return Err(customer_not_found(id)),
            Err(e) => return Err(e.into()),
        };

        match db::find_customer_by_username(tx.ex(), data.username()).await? {
            Some(other) if other != id => return Err(username_taken(data.username())),
            _ => (),
        }

        match db::update_customer(tx.ex(), id, &data).await {
            Ok(()) => (),
            Err(DbError::AlreadyExists) => return Err(username_taken(data.username())),
            Err(DbError::NotFound) => return Err(customer_not_found(id)),
            Err(e) => return Err(e.into()),
        }
        let addresses = db::list_addresses(tx.ex(), id).await?;

        tx.commit().await?;

        info!("Updated customer {}", id);
        Ok(Customer::new(id, data, *old.locked()).with_addresses(addresses))
    }

    /// Deletes the customer with identifier `id` and all of its addresses in a single
    /// transaction.  Deleting a customer that does not exist is not an error.
    pub(crate) async fn delete_customer(self, id: CustomerId) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;
        db::delete_addresses_by_customer(tx.ex(), id).await?;
        db::delete_customer(tx.ex(), id).await?;
        tx.commit().await?;

        info!("Deleted customer {}", id);
        Ok(())
    }

    /// Sets the lock flag of the customer with identifier `id` and returns the updated record.
    pub(crate) async fn set_customer_locked(
        self,
        id: CustomerId,
        locked: bool,
    ) -> DriverResult<Customer> {
        let mut tx = self.db.begin().await?;

        match db::set_customer_locked(tx.ex(), id, locked).await {
            Ok(()) => (),
            Err(DbError::NotFound) => return Err(customer_not_found(id)),
            Err(e) => return Err(e.into()),
        }
        let customer = db::get_customer(tx.ex(), id).await?;
        let addresses = db::list_addresses(tx.ex(), id).await?;

        tx.commit().await?;

        info!("Set lock flag of customer {} to {}", id, locked);
        Ok(customer.with_addresses(addresses))
    }
}
