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

//! API to query a single address of a customer.

use crate::driver::Driver;
use crate::model::{Address, AddressId, CustomerId};
use crate::rest::{EmptyBody, RestResult};
use axum::extract::{Path, State};
use axum::Json;

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path((customer_id, address_id)): Path<(i32, i32)>,
    _body: EmptyBody,
) -> RestResult<Json<Address>> {
    let address =
        driver.get_address(CustomerId::new(customer_id), AddressId::new(address_id)).await?;
    Ok(Json(address))
}

#[cfg(test)]
mod tests {
    use crate::rest::testutils::*;
    use axum::http;
    use http::StatusCode;

    fn route(customer_id: i32, address_id: i32) -> (http::Method, String) {
        (http::Method::GET, format!("/customers/{}/addresses/{}", customer_id, address_id))
    }

    #[tokio::test]
    async fn test_get_ok() {
        let context = TestContext::setup().await;
        let created = context
            .driver()
            .create_customer(customer_data("alice"), vec![address_data("1 Main St")])
            .await
            .unwrap();
        let id = created.id().as_i32();
        let address_id = created.addresses()[0].address_id().as_i32();

        let address = OneShotBuilder::new(context.app(), route(id, address_id))
            .send_empty()
            .await
            .expect_json::<serde_json::Value>()
            .await;
        assert_eq!("1 Main St", address["street_address"]);
        assert_eq!(i64::from(id), address["customer_id"]);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let context = TestContext::setup().await;
        let created = context.driver().create_customer(customer_data("alice"), vec![]).await.unwrap();
        let id = created.id().as_i32();

        OneShotBuilder::new(context.app(), route(id, 123))
            .send_empty()
            .await
            .expect_status(StatusCode::NOT_FOUND)
            .expect_error(&format!(
                "Address with id '123' for customer with id '{}' was not found.",
                id
            ))
            .await;
    }

    #[tokio::test]
    async fn test_get_owned_by_other_customer_is_not_found() {
        let context = TestContext::setup().await;
        let alice = context
            .driver()
            .create_customer(customer_data("alice"), vec![address_data("1 Main St")])
            .await
            .unwrap();
        let bob = context.driver().create_customer(customer_data("bob"), vec![]).await.unwrap();
        let address_id = alice.addresses()[0].address_id().as_i32();

        OneShotBuilder::new(context.app(), route(bob.id().as_i32(), address_id))
            .send_empty()
            .await
            .expect_status(StatusCode::NOT_FOUND)
            .expect_error("was not found")
            .await;
    }

    test_payload_must_be_empty!(TestContext::setup().await.app(), route(1, 1));
}
