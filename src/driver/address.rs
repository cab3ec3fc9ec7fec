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

//! Extends the driver with operations on a single address.

use crate::db::{self, DbError};
use crate::driver::{address_not_found, Driver, DriverResult};
use crate::model::{Address, AddressData, AddressId, CustomerId};
use log::info;

impl Driver {
    /// Gets the address with identifier `address_id` owned by `customer_id`.
    ///
    /// An address owned by a different customer is reported as absent, not as a permissions
    /// problem.
    pub(crate) async fn get_address(
        self,
        customer_id: CustomerId,
        address_id: AddressId,
    ) -> DriverResult<Address> {
        let mut ex = self.db.ex().await?;

        match db::get_address(&mut ex, address_id).await {
            Ok(address) if address.customer_id() == &customer_id => Ok(address),
            Ok(_alien) => Err(address_not_found(customer_id, address_id)),
            Err(DbError::NotFound) => Err(address_not_found(customer_id, address_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Replaces the client-settable fields of the address with identifier `address_id` owned
    /// by `customer_id`.
    pub(crate) async fn update_address(
        self,
        customer_id: CustomerId,
        address_id: AddressId,
        data: AddressData,
    ) -> DriverResult<Address> {
        let mut tx = self.db.begin().await?;

        match db::get_address(tx.ex(), address_id).await {
            Ok(address) if address.customer_id() == &customer_id => (),
            Ok(_alien) => return Err(address_not_found(customer_id, address_id)),
            Err(DbError::NotFound) => return Err(address_not_found(customer_id, address_id)),
            Err(e) => return Err(e.into()),
        }

        db::update_address(tx.ex(), address_id, &data).await?;
        tx.commit().await?;

        info!("Updated address {} of customer {}", address_id, customer_id);
        Ok(Address::new(customer_id, address_id, data))
    }

    /// Deletes the address with identifier `address_id` if it is owned by `customer_id`.
    ///
    /// Deleting an address that does not exist, or that belongs to a different customer, is
    /// not an error.
    pub(crate) async fn delete_address(
        self,
        customer_id: CustomerId,
        address_id: AddressId,
    ) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;

        match db::get_address(tx.ex(), address_id).await {
            Ok(address) if address.customer_id() == &customer_id => {
                db::delete_address(tx.ex(), address_id).await?;
                info!("Deleted address {} of customer {}", address_id, customer_id);
            }
            Ok(_alien) => (),
            Err(DbError::NotFound) => (),
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        Ok(())
    }
}
