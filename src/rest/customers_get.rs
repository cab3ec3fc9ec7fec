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

//! API to list customers, with optional filtering.

use crate::driver::Driver;
use crate::model::{Customer, CustomerFilter};
use crate::rest::{EmptyBody, RestError, RestResult};
use axum::extract::{Query, State};
use axum::Json;
use std::collections::HashMap;

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Query(query): Query<HashMap<String, String>>,
    _body: EmptyBody,
) -> RestResult<Json<Vec<Customer>>> {
    let filter =
        CustomerFilter::from_query(&query).map_err(|e| RestError::UnsupportedKey(e.to_string()))?;
    let customers = driver.list_customers(filter).await?;
    Ok(Json(customers))
}
