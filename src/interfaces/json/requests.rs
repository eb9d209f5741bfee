use crate::domain::card::CardPayload;
use crate::domain::order::{LineItem, ShippingInfo};
use crate::error::{OrderError, Result};
use serde_json::{Map, Value};

/// Body of an order update: either customer details or a card to charge.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOrderRequest {
    Shipping { email: String, info: ShippingInfo },
    Card(CardPayload),
}

/// Parses `{"product": {...}}` or `{"products": [{...}, ...]}`.
pub fn parse_create_order(body: &Value) -> Result<Vec<LineItem>> {
    let object = body
        .as_object()
        .ok_or_else(|| OrderError::InvalidJson("order body must be an object".into()))?;

    if let Some(product) = object.get("product") {
        return Ok(vec![parse_line(product)?]);
    }
    match object.get("products") {
        Some(Value::Array(products)) => products.iter().map(parse_line).collect(),
        Some(_) => Err(OrderError::InvalidJson("products must be a list".into())),
        None => Err(OrderError::InvalidJson(
            "expected a product or a list of products".into(),
        )),
    }
}

fn parse_line(value: &Value) -> Result<LineItem> {
    let line = value
        .as_object()
        .ok_or_else(|| OrderError::InvalidJson("product must be an object".into()))?;
    let product_id = present(line, "id")?
        .as_u64()
        .ok_or_else(|| OrderError::InvalidJson("product id must be a positive integer".into()))?;
    let quantity = present(line, "quantity")?
        .as_i64()
        .ok_or_else(|| OrderError::InvalidJson("quantity must be an integer".into()))?;
    Ok(LineItem { product_id, quantity })
}

fn present<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a Value> {
    match object.get(field) {
        None | Some(Value::Null) => Err(OrderError::MissingFields(format!(
            "creating an order requires a product {}",
            field
        ))),
        Some(value) => Ok(value),
    }
}

const SHIPPING_FIELDS: [&str; 5] = ["country", "address", "postal_code", "city", "province"];

/// Parses `{"order": {email, shipping_information}}` or `{"credit_card": {...}}`.
///
/// Card fields are only type-checked here; whether they are all present is
/// decided when the payment job runs.
pub fn parse_update_order(body: &Value) -> Result<UpdateOrderRequest> {
    let object = body
        .as_object()
        .ok_or_else(|| OrderError::InvalidJson("order body must be an object".into()))?;

    if let Some(order) = object.get("order") {
        return parse_shipping(order);
    }
    if let Some(card) = object.get("credit_card") {
        let card: CardPayload = serde_json::from_value(card.clone())
            .map_err(|e| OrderError::InvalidJson(format!("credit card: {}", e)))?;
        return Ok(UpdateOrderRequest::Card(card));
    }
    Err(OrderError::MissingFields(
        "expected order information or a credit card".into(),
    ))
}

fn parse_shipping(order: &Value) -> Result<UpdateOrderRequest> {
    let order = order
        .as_object()
        .ok_or_else(|| OrderError::InvalidJson("order must be an object".into()))?;
    let (Some(email), Some(info)) = (order.get("email"), order.get("shipping_information")) else {
        return Err(OrderError::MissingFields(
            "email and shipping_information are required".into(),
        ));
    };
    let email = email
        .as_str()
        .ok_or_else(|| OrderError::InvalidJson("email must be a string".into()))?;
    let info_object = info
        .as_object()
        .ok_or_else(|| OrderError::InvalidJson("shipping_information must be an object".into()))?;

    let missing: Vec<&str> = SHIPPING_FIELDS
        .into_iter()
        .filter(|field| info_object.get(*field).is_none_or(Value::is_null))
        .collect();
    if !missing.is_empty() {
        return Err(OrderError::MissingFields(format!(
            "shipping_information is missing {}",
            missing.join(", ")
        )));
    }

    let info: ShippingInfo = serde_json::from_value(info.clone())
        .map_err(|e| OrderError::InvalidJson(format!("shipping_information: {}", e)))?;
    Ok(UpdateOrderRequest::Shipping {
        email: email.to_string(),
        info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_and_multi_product_bodies() {
        let single = parse_create_order(&json!({"product": {"id": 1, "quantity": 2}})).unwrap();
        assert_eq!(single, vec![LineItem { product_id: 1, quantity: 2 }]);

        let multi = parse_create_order(&json!({"products": [
            {"id": 1, "quantity": 1},
            {"id": 3, "quantity": 4}
        ]}))
        .unwrap();
        assert_eq!(multi.len(), 2);
        assert_eq!(multi[1], LineItem { product_id: 3, quantity: 4 });
    }

    #[test]
    fn test_create_order_errors() {
        let missing = parse_create_order(&json!({"product": {"id": 1}})).unwrap_err();
        assert_eq!(missing.code(), "missing-fields");

        let shape = parse_create_order(&json!({"item": {"id": 1, "quantity": 1}})).unwrap_err();
        assert_eq!(shape.code(), "json-not-valid");

        let not_list = parse_create_order(&json!({"products": {"id": 1, "quantity": 1}})).unwrap_err();
        assert_eq!(not_list.code(), "json-not-valid");

        // Zero is present; the ledger rejects it as an invalid quantity.
        let zero = parse_create_order(&json!({"product": {"id": 1, "quantity": 0}})).unwrap();
        assert_eq!(zero[0].quantity, 0);
    }

    #[test]
    fn test_shipping_update() {
        let body = json!({"order": {
            "email": "jdoe@example.com",
            "shipping_information": {
                "country": "Canada",
                "address": "201, rue Président-Kennedy",
                "postal_code": "G7X 3Y7",
                "city": "Chicoutimi",
                "province": "QC"
            }
        }});
        match parse_update_order(&body).unwrap() {
            UpdateOrderRequest::Shipping { email, info } => {
                assert_eq!(email, "jdoe@example.com");
                assert_eq!(info.city, "Chicoutimi");
            }
            other => panic!("unexpected request {:?}", other),
        }

        let partial = json!({"order": {
            "email": "jdoe@example.com",
            "shipping_information": {"country": "Canada"}
        }});
        assert_eq!(parse_update_order(&partial).unwrap_err().code(), "missing-fields");
    }

    #[test]
    fn test_card_update_checks_types_only() {
        let partial = json!({"credit_card": {"name": "John Doe", "number": "4242 4242 4242 4242"}});
        match parse_update_order(&partial).unwrap() {
            UpdateOrderRequest::Card(card) => assert!(card.complete().is_none()),
            other => panic!("unexpected request {:?}", other),
        }

        let wrong_type = json!({"credit_card": {"expiration_year": "soon"}});
        assert_eq!(parse_update_order(&wrong_type).unwrap_err().code(), "json-not-valid");

        assert_eq!(parse_update_order(&json!({})).unwrap_err().code(), "missing-fields");
    }
}
