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

//! Extends the driver with operations on a customer's addresses collection.

use crate::db::{self, DbError};
use crate::driver::{customer_not_found, Driver, DriverResult};
use crate::model::{Address, AddressData, AddressFilter, CustomerId};
use log::info;

impl Driver {
    /// Creates a new address owned by `customer_id` with the given `data`.
    ///
    /// The existence check is advisory: the foreign key constraint catches races, and both
    /// paths surface the same error.
    pub(crate) async fn create_address(
        self,
        customer_id: CustomerId,
        data: AddressData,
    ) -> DriverResult<Address> {
        let mut tx = self.db.begin().await?;

        match db::get_customer(tx.ex(), customer_id).await {
            Ok(_customer) => (),
            Err(DbError::NotFound) => return Err(customer_not_found(customer_id)),
            Err(e) => return Err(e.into()),
        }

        let address_id = match db::create_address(tx.ex(), customer_id, &data).await {
            Ok(address_id) => address_id,
            Err(DbError::NotFound) => return Err(customer_not_found(customer_id)),
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;

        info!("Created address {} for customer {}", address_id, customer_id);
        Ok(Address::new(customer_id, address_id, data))
    }

    /// Lists the addresses owned by `customer_id` that pass the criteria in `filter`.
    pub(crate) async fn list_addresses(
        self,
        customer_id: CustomerId,
        filter: AddressFilter,
    ) -> DriverResult<Vec<Address>> {
        let mut ex = self.db.ex().await?;

        match db::get_customer(&mut ex, customer_id).await {
            Ok(_customer) => (),
            Err(DbError::NotFound) => return Err(customer_not_found(customer_id)),
            Err(e) => return Err(e.into()),
        }

        let mut addresses = db::list_addresses(&mut ex, customer_id).await?;
        for predicate in filter.predicates() {
            addresses.retain(|address| predicate(address));
        }
        Ok(addresses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use crate::driver::DriverError;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_create_address_ok() {
        let context = TestContext::setup().await;

        let customer =
            context.driver().create_customer(customer_data("alice"), vec![]).await.unwrap();

        let address = context
            .driver()
            .create_address(*customer.id(), address_data("1 Main St"))
            .await
            .unwrap();
        assert_eq!(customer.id(), address.customer_id());
        assert_eq!(&address_data("1 Main St"), address.data());

        let fetched = context.driver().get_customer(*customer.id()).await.unwrap();
        assert_eq!(&vec![address], fetched.addresses());
    }

    #[tokio::test]
    async fn test_create_address_customer_not_found() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::NotFound("Customer with id '123' was not found.".to_owned()),
            context
                .driver()
                .create_address(CustomerId::new(123), address_data("1 Main St"))
                .await
                .unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_list_addresses_filters() {
        let context = TestContext::setup().await;

        let customer = context
            .driver()
            .create_customer(
                customer_data("alice"),
                vec![
                    AddressData::new("1 Main St", "New York", "NY", 10001, "US"),
                    AddressData::new("2 Elm St", "Boston", "MA", 2110, "US"),
                ],
            )
            .await
            .unwrap();
        let id = *customer.id();

        let addresses =
            context.driver().list_addresses(id, AddressFilter::default()).await.unwrap();
        assert_eq!(2, addresses.len());

        let query: HashMap<String, String> = [("city".to_owned(), "Boston".to_owned())].into();
        let filter = AddressFilter::from_query(&query).unwrap();
        let addresses = context.driver().list_addresses(id, filter).await.unwrap();
        assert_eq!(1, addresses.len());
        assert_eq!("2 Elm St", addresses[0].data().street_address());

        // The zipcode criterion matches the stringified stored value.
        let query: HashMap<String, String> = [("zipcode".to_owned(), "10001".to_owned())].into();
        let filter = AddressFilter::from_query(&query).unwrap();
        let addresses = context.driver().list_addresses(id, filter).await.unwrap();
        assert_eq!(1, addresses.len());
        assert_eq!("1 Main St", addresses[0].data().street_address());
    }

    #[tokio::test]
    async fn test_list_addresses_customer_not_found() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::NotFound("Customer with id '123' was not found.".to_owned()),
            context
                .driver()
                .list_addresses(CustomerId::new(123), AddressFilter::default())
                .await
                .unwrap_err()
        );
    }
}
