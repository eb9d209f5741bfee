use crate::domain::order::OrderId;
use crate::domain::view::OrderView;
use crate::error::OrderError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One reply written by the command-line driver: an HTTP-style status and a
/// JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn order(view: &OrderView) -> Self {
        Self::ok(json!({ "order": view }))
    }

    /// Reply to a successful creation, pointing at the new order.
    pub fn created(id: OrderId) -> Self {
        Self {
            status: 302,
            body: json!({ "location": format!("/order/{}", id), "order_id": id }),
        }
    }

    pub fn accepted() -> Self {
        Self {
            status: 202,
            body: json!({}),
        }
    }

    pub fn error(err: &OrderError) -> Self {
        Self::scoped_error(err.scope(), err)
    }

    /// `{"errors": {scope: {"code", "name"}}}`.
    pub fn scoped_error(scope: &str, err: &OrderError) -> Self {
        Self {
            status: err.status(),
            body: json!({
                "errors": {
                    scope: { "code": err.code(), "name": err.to_string() }
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_envelope() {
        let reply = Reply::error(&OrderError::OutOfStock(4));
        assert_eq!(reply.status, 422);
        assert_eq!(reply.body["errors"]["product"]["code"], "out-of-inventory");
        assert!(reply.body["errors"]["product"]["name"].is_string());

        let reply = Reply::scoped_error("credit_card", &OrderError::InvalidJson("bad".into()));
        assert_eq!(reply.body["errors"]["credit_card"]["code"], "json-not-valid");
    }

    #[test]
    fn test_created_points_at_order() {
        let reply = Reply::created(OrderId(12));
        assert_eq!(reply.status, 302);
        assert_eq!(reply.body["location"], "/order/12");
        assert_eq!(reply.body["order_id"], 12);
    }
}
