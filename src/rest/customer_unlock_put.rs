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

//! API to release the lock on a customer record.

use crate::driver::Driver;
use crate::model::{CustomerId, LockView};
use crate::rest::{EmptyBody, RestResult};
use axum::extract::{Path, State};
use axum::Json;

/// PUT handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(customer_id): Path<i32>,
    _body: EmptyBody,
) -> RestResult<Json<LockView>> {
    let customer = driver.set_customer_locked(CustomerId::new(customer_id), false).await?;
    Ok(Json(LockView::from(customer)))
}
