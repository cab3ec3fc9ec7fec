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

//! Test utilities for the driver layer.

use crate::db::Db;
use crate::driver::Driver;
use crate::model::{AddressData, CustomerData};
use std::sync::Arc;

/// State of a running test.
pub(crate) struct TestContext {
    /// The database the driver is backed by.
    db: Arc<dyn Db + Send + Sync>,
}

impl TestContext {
    /// Initializes a test context backed by an in-memory database.
    pub(crate) async fn setup() -> Self {
        let db = Arc::from(crate::db::sqlite::testutils::setup().await);
        Self { db }
    }

    /// Returns a new driver to execute one operation against.
    pub(crate) fn driver(&self) -> Driver {
        Driver::new(self.db.clone())
    }
}

/// Returns customer fields that only vary in their `username`.
pub(crate) fn customer_data(username: &str) -> CustomerData {
    CustomerData::new(username, "password", "First", "Last")
}

/// Returns address fields that only vary in their `street_address`.
pub(crate) fn address_data(street_address: &str) -> AddressData {
    AddressData::new(street_address, "City", "ST", 12345, "US")
}
