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

//! API to update a single customer.

use crate::driver::Driver;
use crate::model::{Customer, CustomerData, CustomerId};
use crate::rest::{JsonPayload, RestResult};
use axum::extract::{Path, State};
use axum::Json;

/// PUT handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(customer_id): Path<i32>,
    payload: JsonPayload,
) -> RestResult<Json<Customer>> {
    let customer_id = CustomerId::new(customer_id);

    let data = match CustomerData::from_json(&payload.0) {
        Ok(data) => data,
        Err(e) => {
            // A missing record takes precedence over payload problems.
            driver.get_customer(customer_id).await?;
            return Err(e.into());
        }
    };

    let customer = driver.update_customer(customer_id, data).await?;
    Ok(Json(customer))
}
