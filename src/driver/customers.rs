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

//! Extends the driver with operations on the customers collection.

use crate::db::{self, DbError};
use crate::driver::{username_taken, Driver, DriverResult};
use crate::model::{Address, AddressData, Customer, CustomerData, CustomerFilter};
use log::info;

impl Driver {
    /// Creates a new customer with the given `data` and its initial `addresses` in a single
    /// transaction.
    ///
    /// The username check is advisory: the UNIQUE constraint on the column catches races, and
    /// both paths surface the same error.
    pub(crate) async fn create_customer(
        self,
        data: CustomerData,
        addresses: Vec<AddressData>,
    ) -> DriverResult<Customer> {
        let mut tx = self.db.begin().await?;

        if db::find_customer_by_username(tx.ex(), data.username()).await?.is_some() {
            return Err(username_taken(data.username()));
        }

        let id = match db::create_customer(tx.ex(), &data).await {
            Ok(id) => id,
            Err(DbError::AlreadyExists) => return Err(username_taken(data.username())),
            Err(e) => return Err(e.into()),
        };

        let mut created = Vec::with_capacity(addresses.len());
        for address in addresses {
            let address_id = db::create_address(tx.ex(), id, &address).await?;
            created.push(Address::new(id, address_id, address));
        }

        tx.commit().await?;

        info!("Created customer {} with username '{}'", id, data.username());
        Ok(Customer::new(id, data, false).with_addresses(created))
    }

    /// Lists all customers that pass the criteria in `filter`, with their addresses attached.
    pub(crate) async fn list_customers(
        self,
        filter: CustomerFilter,
    ) -> DriverResult<Vec<Customer>> {
        let mut ex = self.db.ex().await?;

        let mut customers = Vec::new();
        for customer in db::list_customers(&mut ex).await? {
            let addresses = db::list_addresses(&mut ex, *customer.id()).await?;
            customers.push(customer.with_addresses(addresses));
        }

        for predicate in filter.predicates() {
            customers.retain(|customer| predicate(customer));
        }
        Ok(customers)
    }
}
