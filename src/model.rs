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

//! High-level data types.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Errors caused by invalid values or malformed payloads.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ModelError(pub String);

/// Result type for this module.
pub type ModelResult<T> = Result<T, ModelError>;

/// Identifier of a customer.  Assigned by the store at creation time and immutable afterwards.
/// We store this as an `i32` because that's what the PostgreSQL `SERIAL` type yields.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CustomerId(i32);

impl CustomerId {
    /// Creates an identifier from a value previously vended by the store.
    pub(crate) fn new(id: i32) -> Self {
        Self(id)
    }

    /// Creates an identifier from an `i64` with range validation.  The SQLite backend hands us
    /// row identifiers as 64-bit integers even though the schema constrains them to 32 bits.
    pub(crate) fn from_i64(id: i64) -> ModelResult<Self> {
        match i32::try_from(id) {
            Ok(id) => Ok(Self(id)),
            Err(e) => Err(ModelError(format!("Customer id cannot be represented: {}", e))),
        }
    }

    /// Returns the identifier as an `i32`.
    pub(crate) fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of an address.  Same representation constraints as `CustomerId`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AddressId(i32);

impl AddressId {
    /// Creates an identifier from a value previously vended by the store.
    pub(crate) fn new(id: i32) -> Self {
        Self(id)
    }

    /// Creates an identifier from an `i64` with range validation.
    pub(crate) fn from_i64(id: i64) -> ModelResult<Self> {
        match i32::try_from(id) {
            Ok(id) => Ok(Self(id)),
            Err(e) => Err(ModelError(format!("Address id cannot be represented: {}", e))),
        }
    }

    /// Returns the identifier as an `i32`.
    pub(crate) fn as_i32(self) -> i32 {
        self.0
    }
}

impl fmt::Display for AddressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Returns an error if `key` is present in `obj` with a non-string value.
fn check_string(obj: &serde_json::Map<String, Value>, key: &str) -> ModelResult<()> {
    match obj.get(key) {
        None | Some(Value::String(_)) => Ok(()),
        Some(_) => Err(ModelError(format!(
            "Request body must have a value of type string for the key '{}'",
            key
        ))),
    }
}

/// Extracts the required string `key` from `obj`, which has already passed type validation.
fn take_string(obj: &serde_json::Map<String, Value>, entity: &str, key: &str) -> ModelResult<String> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(ModelError(format!("Invalid {}: missing {}", entity, key))),
    }
}

/// The client-settable fields of a customer.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct CustomerData {
    /// Login name of the customer.  Unique across all customers.
    username: String,

    /// Password of the customer.
    password: String,

    /// First name of the customer.
    first_name: String,

    /// Last name of the customer.
    last_name: String,
}

/// The keys of a customer payload that must carry string values.
const CUSTOMER_STRING_KEYS: [&str; 4] = ["username", "password", "first_name", "last_name"];

impl CustomerData {
    /// Creates a new set of customer fields from their components.
    pub(crate) fn new<S: Into<String>>(username: S, password: S, first_name: S, last_name: S) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Validates and extracts the customer fields of a raw JSON payload.
    ///
    /// Present keys with a value of the wrong type are reported before missing keys, and any
    /// keys we do not know about are ignored.
    pub(crate) fn from_json(data: &Value) -> ModelResult<Self> {
        let obj = data.as_object().ok_or_else(|| {
            ModelError("Invalid Customer: body of request contained bad or no data".to_owned())
        })?;

        for key in CUSTOMER_STRING_KEYS {
            check_string(obj, key)?;
        }

        Ok(Self {
            username: take_string(obj, "Customer", "username")?,
            password: take_string(obj, "Customer", "password")?,
            first_name: take_string(obj, "Customer", "first_name")?,
            last_name: take_string(obj, "Customer", "last_name")?,
        })
    }
}

/// The client-settable fields of an address.
#[derive(Clone, Debug, Getters, PartialEq, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct AddressData {
    /// Street line of the address.
    street_address: String,

    /// City of the address.
    city: String,

    /// State of the address.
    state: String,

    /// Numeric zip code of the address.
    zipcode: i32,

    /// Country of the address.
    country: String,
}

/// The keys of an address payload that must carry string values.
const ADDRESS_STRING_KEYS: [&str; 4] = ["street_address", "city", "state", "country"];

impl AddressData {
    /// Creates a new set of address fields from their components.
    pub(crate) fn new<S: Into<String>>(
        street_address: S,
        city: S,
        state: S,
        zipcode: i32,
        country: S,
    ) -> Self {
        Self {
            street_address: street_address.into(),
            city: city.into(),
            state: state.into(),
            zipcode,
            country: country.into(),
        }
    }

    /// Validates and extracts the address fields of a raw JSON payload.
    pub(crate) fn from_json(data: &Value) -> ModelResult<Self> {
        let obj = data.as_object().ok_or_else(|| {
            ModelError("Invalid Address: body of request contained bad or no data".to_owned())
        })?;

        for key in ADDRESS_STRING_KEYS {
            check_string(obj, key)?;
        }
        let zipcode = match obj.get("zipcode") {
            None => None,
            Some(Value::Number(n)) => match n.as_i64() {
                Some(n) => match i32::try_from(n) {
                    Ok(n) => Some(n),
                    Err(e) => {
                        return Err(ModelError(format!("Zipcode cannot be represented: {}", e)));
                    }
                },
                None => {
                    return Err(ModelError(
                        "Request body must have a value of type int for the key 'zipcode'"
                            .to_owned(),
                    ));
                }
            },
            Some(_) => {
                return Err(ModelError(
                    "Request body must have a value of type int for the key 'zipcode'".to_owned(),
                ));
            }
        };

        Ok(Self {
            street_address: take_string(obj, "Address", "street_address")?,
            city: take_string(obj, "Address", "city")?,
            state: take_string(obj, "Address", "state")?,
            zipcode: zipcode.ok_or_else(|| ModelError("Invalid Address: missing zipcode".to_owned()))?,
            country: take_string(obj, "Address", "country")?,
        })
    }
}

/// Validates and extracts the required `addresses` list of a customer creation payload.
pub(crate) fn addresses_from_json(data: &Value) -> ModelResult<Vec<AddressData>> {
    let obj = data.as_object().ok_or_else(|| {
        ModelError("Invalid Customer: body of request contained bad or no data".to_owned())
    })?;

    match obj.get("addresses") {
        Some(Value::Array(values)) => {
            let mut addresses = Vec::with_capacity(values.len());
            for value in values {
                addresses.push(AddressData::from_json(value)?);
            }
            Ok(addresses)
        }
        Some(_) => Err(ModelError(
            "Request body must have a value of type list for the key 'addresses'".to_owned(),
        )),
        None => Err(ModelError("Invalid Customer: missing addresses".to_owned())),
    }
}

/// An address record owned by exactly one customer.
#[derive(Debug, Getters, Serialize)]
#[cfg_attr(test, derive(Clone, Deserialize, PartialEq))]
pub struct Address {
    /// Identifier of the customer that owns this address.
    customer_id: CustomerId,

    /// Identifier of this address.
    address_id: AddressId,

    /// The client-settable fields of the address.
    #[serde(flatten)]
    data: AddressData,
}

impl Address {
    /// Creates a new address record from its components.
    pub(crate) fn new(customer_id: CustomerId, address_id: AddressId, data: AddressData) -> Self {
        Self { customer_id, address_id, data }
    }
}

/// A customer record together with the addresses it owns.
#[derive(Debug, Getters, Serialize)]
#[cfg_attr(test, derive(Clone, Deserialize, PartialEq))]
pub struct Customer {
    /// Identifier of this customer.
    id: CustomerId,

    /// The client-settable fields of the customer.
    #[serde(flatten)]
    data: CustomerData,

    /// The addresses owned by this customer, ordered by identifier.
    addresses: Vec<Address>,

    /// Whether the account is administratively locked.  Only the lock and unlock operations
    /// may change this flag.
    locked: bool,
}

impl Customer {
    /// Creates a new customer record with no addresses attached yet.
    pub(crate) fn new(id: CustomerId, data: CustomerData, locked: bool) -> Self {
        Self { id, data, addresses: vec![], locked }
    }

    /// Attaches the `addresses` owned by this customer.
    pub(crate) fn with_addresses(mut self, addresses: Vec<Address>) -> Self {
        self.addresses = addresses;
        self
    }
}

/// Restricted serialization of a customer that omits the identifier and the password.  Used
/// only as the response to the lock and unlock operations.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize, PartialEq))]
pub struct LockView {
    /// Login name of the customer.
    username: String,

    /// First name of the customer.
    first_name: String,

    /// Last name of the customer.
    last_name: String,

    /// The addresses owned by the customer.
    addresses: Vec<Address>,

    /// Whether the account is administratively locked.
    locked: bool,
}

impl From<Customer> for LockView {
    fn from(customer: Customer) -> Self {
        Self {
            username: customer.data.username,
            first_name: customer.data.first_name,
            last_name: customer.data.last_name,
            addresses: customer.addresses,
            locked: customer.locked,
        }
    }
}

/// Filter criteria for the customers collection.
///
/// Each present field narrows the working set; an absent field imposes no constraint.  The
/// recognized query keys form a strict allow-list: anything else aborts the request.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct CustomerFilter {
    /// Exact match on the username.
    username: Option<String>,

    /// Exact match on the first name.
    first_name: Option<String>,

    /// Exact match on the last name.
    last_name: Option<String>,

    /// Prefix match on the username.
    prefix_username: Option<String>,
}

impl CustomerFilter {
    /// Parses the query parameters of a customers list request.
    pub(crate) fn from_query(query: &HashMap<String, String>) -> ModelResult<Self> {
        let mut filter = CustomerFilter::default();
        for (key, value) in query {
            match key.as_str() {
                "username" => filter.username = Some(value.clone()),
                "first_name" => filter.first_name = Some(value.clone()),
                "last_name" => filter.last_name = Some(value.clone()),
                "prefix_username" => filter.prefix_username = Some(value.clone()),
                _ => {
                    return Err(ModelError(format!(
                        "The query key '{}' is not supported.",
                        key
                    )));
                }
            }
        }
        Ok(filter)
    }

    /// Returns one predicate per supplied criterion, to be applied in sequence over the full
    /// collection.
    pub(crate) fn predicates(self) -> Vec<Box<dyn Fn(&Customer) -> bool>> {
        let mut predicates: Vec<Box<dyn Fn(&Customer) -> bool>> = vec![];
        if let Some(username) = self.username {
            predicates.push(Box::new(move |c| c.data().username() == &username));
        }
        if let Some(first_name) = self.first_name {
            predicates.push(Box::new(move |c| c.data().first_name() == &first_name));
        }
        if let Some(last_name) = self.last_name {
            predicates.push(Box::new(move |c| c.data().last_name() == &last_name));
        }
        if let Some(prefix) = self.prefix_username {
            predicates.push(Box::new(move |c| c.data().username().starts_with(&prefix)));
        }
        predicates
    }
}

/// Filter criteria for the addresses of one customer.
///
/// All comparisons are between the raw query value and the stringified stored value, so
/// `zipcode=10001` matches the integer 10001.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct AddressFilter {
    /// Exact match on the street line.
    street_address: Option<String>,

    /// Exact match on the city.
    city: Option<String>,

    /// Exact match on the state.
    state: Option<String>,

    /// Exact match on the zip code.
    zipcode: Option<String>,

    /// Exact match on the country.
    country: Option<String>,
}

impl AddressFilter {
    /// Parses the query parameters of an addresses list request.
    pub(crate) fn from_query(query: &HashMap<String, String>) -> ModelResult<Self> {
        let mut filter = AddressFilter::default();
        for (key, value) in query {
            match key.as_str() {
                "street_address" => filter.street_address = Some(value.clone()),
                "city" => filter.city = Some(value.clone()),
                "state" => filter.state = Some(value.clone()),
                "zipcode" => filter.zipcode = Some(value.clone()),
                "country" => filter.country = Some(value.clone()),
                _ => {
                    return Err(ModelError(format!(
                        "The query key '{}' is not supported.",
                        key
                    )));
                }
            }
        }
        Ok(filter)
    }

    /// Returns one predicate per supplied criterion, to be applied in sequence over the full
    /// collection.
    pub(crate) fn predicates(self) -> Vec<Box<dyn Fn(&Address) -> bool>> {
        let mut predicates: Vec<Box<dyn Fn(&Address) -> bool>> = vec![];
        if let Some(street_address) = self.street_address {
            predicates.push(Box::new(move |a| a.data().street_address() == &street_address));
        }
        if let Some(city) = self.city {
            predicates.push(Box::new(move |a| a.data().city() == &city));
        }
        if let Some(state) = self.state {
            predicates.push(Box::new(move |a| a.data().state() == &state));
        }
        if let Some(zipcode) = self.zipcode {
            predicates.push(Box::new(move |a| a.data().zipcode().to_string() == zipcode));
        }
        if let Some(country) = self.country {
            predicates.push(Box::new(move |a| a.data().country() == &country));
        }
        predicates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_customer_id_from_i64_ok() {
        assert_eq!(CustomerId::new(123), CustomerId::from_i64(123).unwrap());
    }

    #[test]
    fn test_customer_id_from_i64_out_of_range() {
        assert!(CustomerId::from_i64(i64::from(i32::MAX) + 1).is_err());
    }

    #[test]
    fn test_address_id_from_i64_out_of_range() {
        assert!(AddressId::from_i64(i64::MIN).is_err());
    }

    #[test]
    fn test_customer_data_from_json_ok() {
        let data = json!({
            "username": "alice", "password": "p", "first_name": "A", "last_name": "B",
        });
        assert_eq!(
            CustomerData::new("alice", "p", "A", "B"),
            CustomerData::from_json(&data).unwrap()
        );
    }

    #[test]
    fn test_customer_data_from_json_ignores_unknown_keys() {
        let data = json!({
            "username": "alice", "password": "p", "first_name": "A", "last_name": "B",
            "age": 5,
        });
        assert_eq!(
            CustomerData::new("alice", "p", "A", "B"),
            CustomerData::from_json(&data).unwrap()
        );
    }

    #[test]
    fn test_customer_data_from_json_missing_key() {
        let data = json!({"username": "alice", "password": "p", "last_name": "B"});
        assert_eq!(
            ModelError("Invalid Customer: missing first_name".to_owned()),
            CustomerData::from_json(&data).unwrap_err()
        );
    }

    #[test]
    fn test_customer_data_from_json_missing_key_reports_first() {
        let data = json!({"first_name": "A"});
        assert_eq!(
            ModelError("Invalid Customer: missing username".to_owned()),
            CustomerData::from_json(&data).unwrap_err()
        );
    }

    #[test]
    fn test_customer_data_from_json_bad_type() {
        let data = json!({
            "username": "alice", "password": 5, "first_name": "A", "last_name": "B",
        });
        assert_eq!(
            ModelError(
                "Request body must have a value of type string for the key 'password'".to_owned()
            ),
            CustomerData::from_json(&data).unwrap_err()
        );
    }

    #[test]
    fn test_customer_data_from_json_bad_type_takes_precedence_over_missing() {
        let data = json!({"password": 5});
        assert_eq!(
            ModelError(
                "Request body must have a value of type string for the key 'password'".to_owned()
            ),
            CustomerData::from_json(&data).unwrap_err()
        );
    }

    #[test]
    fn test_customer_data_from_json_not_an_object() {
        for data in [json!("text"), json!(3), json!([1, 2]), json!(null)] {
            assert_eq!(
                ModelError(
                    "Invalid Customer: body of request contained bad or no data".to_owned()
                ),
                CustomerData::from_json(&data).unwrap_err()
            );
        }
    }

    #[test]
    fn test_address_data_from_json_ok() {
        let data = json!({
            "street_address": "1 Main", "city": "NY", "state": "NY",
            "zipcode": 10001, "country": "US",
        });
        assert_eq!(
            AddressData::new("1 Main", "NY", "NY", 10001, "US"),
            AddressData::from_json(&data).unwrap()
        );
    }

    #[test]
    fn test_address_data_from_json_zipcode_must_be_int() {
        for zipcode in [json!("10001"), json!(10001.5), json!(true)] {
            let data = json!({
                "street_address": "1 Main", "city": "NY", "state": "NY",
                "zipcode": zipcode, "country": "US",
            });
            assert_eq!(
                ModelError(
                    "Request body must have a value of type int for the key 'zipcode'".to_owned()
                ),
                AddressData::from_json(&data).unwrap_err()
            );
        }
    }

    #[test]
    fn test_address_data_from_json_zipcode_out_of_range() {
        let data = json!({
            "street_address": "1 Main", "city": "NY", "state": "NY",
            "zipcode": i64::from(i32::MAX) + 1, "country": "US",
        });
        assert!(
            AddressData::from_json(&data)
                .unwrap_err()
                .to_string()
                .contains("cannot be represented")
        );
    }

    #[test]
    fn test_address_data_from_json_missing_key() {
        let data = json!({"street_address": "1 Main", "city": "NY", "state": "NY", "zipcode": 1});
        assert_eq!(
            ModelError("Invalid Address: missing country".to_owned()),
            AddressData::from_json(&data).unwrap_err()
        );
    }

    #[test]
    fn test_addresses_from_json_ok() {
        let data = json!({"addresses": [
            {"street_address": "1 Main", "city": "NY", "state": "NY",
             "zipcode": 10001, "country": "US"},
        ]});
        assert_eq!(
            vec![AddressData::new("1 Main", "NY", "NY", 10001, "US")],
            addresses_from_json(&data).unwrap()
        );
    }

    #[test]
    fn test_addresses_from_json_empty_list_ok() {
        let data = json!({"addresses": []});
        assert_eq!(Vec::<AddressData>::new(), addresses_from_json(&data).unwrap());
    }

    #[test]
    fn test_addresses_from_json_missing() {
        let data = json!({"username": "alice"});
        assert_eq!(
            ModelError("Invalid Customer: missing addresses".to_owned()),
            addresses_from_json(&data).unwrap_err()
        );
    }

    #[test]
    fn test_addresses_from_json_not_a_list() {
        let data = json!({"addresses": "nope"});
        assert_eq!(
            ModelError(
                "Request body must have a value of type list for the key 'addresses'".to_owned()
            ),
            addresses_from_json(&data).unwrap_err()
        );
    }

    #[test]
    fn test_addresses_from_json_invalid_element() {
        let data = json!({"addresses": [{"street_address": "1 Main"}]});
        assert_eq!(
            ModelError("Invalid Address: missing city".to_owned()),
            addresses_from_json(&data).unwrap_err()
        );
    }

    #[test]
    fn test_customer_serializes_flat() {
        let customer = Customer::new(CustomerId::new(7), CustomerData::new("u", "p", "f", "l"), true)
            .with_addresses(vec![Address::new(
                CustomerId::new(7),
                AddressId::new(3),
                AddressData::new("1 Main", "NY", "NY", 10001, "US"),
            )]);
        let value = serde_json::to_value(&customer).unwrap();
        assert_eq!(
            serde_json::json!({
                "id": 7, "username": "u", "password": "p", "first_name": "f", "last_name": "l",
                "addresses": [{
                    "customer_id": 7, "address_id": 3, "street_address": "1 Main",
                    "city": "NY", "state": "NY", "zipcode": 10001, "country": "US",
                }],
                "locked": true,
            }),
            value
        );
    }

    #[test]
    fn test_lock_view_omits_id_and_password() {
        let customer =
            Customer::new(CustomerId::new(7), CustomerData::new("u", "p", "f", "l"), true);
        let value = serde_json::to_value(LockView::from(customer)).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("id"));
        assert!(!obj.contains_key("password"));
        assert_eq!(Some(&json!("u")), obj.get("username"));
        assert_eq!(Some(&json!(true)), obj.get("locked"));
    }

    /// Convenience to turn a list of pairs into the query map the filters consume.
    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_customer_filter_from_query_ok() {
        let filter =
            CustomerFilter::from_query(&query(&[("username", "alice"), ("last_name", "B")]))
                .unwrap();
        assert_eq!(
            CustomerFilter {
                username: Some("alice".to_owned()),
                last_name: Some("B".to_owned()),
                ..CustomerFilter::default()
            },
            filter
        );
    }

    #[test]
    fn test_customer_filter_from_query_unsupported_key() {
        assert_eq!(
            ModelError("The query key 'age' is not supported.".to_owned()),
            CustomerFilter::from_query(&query(&[("username", "alice"), ("age", "5")]))
                .unwrap_err()
        );
    }

    #[test]
    fn test_customer_filter_predicates() {
        let alice = Customer::new(CustomerId::new(1), CustomerData::new("alice", "p", "A", "B"), false);
        let alfred = Customer::new(CustomerId::new(2), CustomerData::new("alfred", "p", "X", "B"), false);

        let predicates =
            CustomerFilter::from_query(&query(&[("username", "alice")])).unwrap().predicates();
        assert_eq!(1, predicates.len());
        assert!(predicates[0](&alice));
        assert!(!predicates[0](&alfred));

        let predicates =
            CustomerFilter::from_query(&query(&[("prefix_username", "al")])).unwrap().predicates();
        assert!(predicates[0](&alice));
        assert!(predicates[0](&alfred));

        assert!(CustomerFilter::default().predicates().is_empty());
    }

    #[test]
    fn test_address_filter_from_query_unsupported_key() {
        assert_eq!(
            ModelError("The query key 'username' is not supported.".to_owned()),
            AddressFilter::from_query(&query(&[("username", "alice")])).unwrap_err()
        );
    }

    #[test]
    fn test_address_filter_zipcode_compares_stringified() {
        let address = Address::new(
            CustomerId::new(1),
            AddressId::new(1),
            AddressData::new("1 Main", "NY", "NY", 10001, "US"),
        );

        let predicates =
            AddressFilter::from_query(&query(&[("zipcode", "10001")])).unwrap().predicates();
        assert!(predicates[0](&address));

        let predicates =
            AddressFilter::from_query(&query(&[("zipcode", "90210")])).unwrap().predicates();
        assert!(!predicates[0](&address));
    }
}
