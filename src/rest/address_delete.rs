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

//! API to delete a single address of a customer.

use crate::driver::Driver;
use crate::model::{AddressId, CustomerId};
use crate::rest::{EmptyBody, RestResult};
use axum::extract::{Path, State};
use http::StatusCode;

/// DELETE handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path((customer_id, address_id)): Path<(i32, i32)>,
    _body: EmptyBody,
) -> RestResult<StatusCode> {
    driver.delete_address(CustomerId::new(customer_id), AddressId::new(address_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
