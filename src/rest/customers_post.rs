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

//! API to create a customer.

use crate::driver::Driver;
use crate::model::{addresses_from_json, Customer, CustomerData};
use crate::rest::{JsonPayload, RestResult};
use axum::extract::State;
use axum::Json;
use http::header::HeaderName;
use http::StatusCode;

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    payload: JsonPayload,
) -> RestResult<(StatusCode, [(HeaderName, String); 1], Json<Customer>)> {
    let data = CustomerData::from_json(&payload.0)?;
    let addresses = addresses_from_json(&payload.0)?;

    let customer = driver.create_customer(data, addresses).await?;

    let location = format!("/customers/{}", customer.id());
    Ok((StatusCode::CREATED, [(http::header::LOCATION, location)], Json(customer)))
}
