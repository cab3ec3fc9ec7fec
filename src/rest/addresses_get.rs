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

//! API to list a customer's addresses, with optional filtering.

use crate::driver::Driver;
use crate::model::{Address, AddressFilter, CustomerId};
use crate::rest::{EmptyBody, RestError, RestResult};
use axum::extract::{Path, Query, State};
use axum::Json;
use std::collections::HashMap;

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(customer_id): Path<i32>,
    Query(query): Query<HashMap<String, String>>,
    _body: EmptyBody,
) -> RestResult<Json<Vec<Address>>> {
    let customer_id = CustomerId::new(customer_id);

    let filter = match AddressFilter::from_query(&query) {
        Ok(filter) => filter,
        Err(e) => {
            // A missing customer takes precedence over query problems.
            driver.get_customer(customer_id).await?;
            return Err(RestError::UnsupportedKey(e.to_string()));
        }
    };

    let addresses = driver.list_addresses(customer_id, filter).await?;
    Ok(Json(addresses))
}
