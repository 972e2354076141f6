//! Basket-creation client.

use crate::error::StorefrontError;
use metrics::counter;
use ordertrack_core::order::{Basket, OrderId};
use ordertrack_core::projection::OrderProjection;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use tracing::{info, warn};

/// Demo catalog matching the upstream storefront.
const CATALOG: &[(&str, f64)] = &[
    ("Hoodie", 29.99),
    ("Leather Jacket", 199.99),
    ("Spider-man lego set", 84.99),
    ("Iphone 15 Pro Max", 1199.00),
    ("Apple watch Ultra 2", 799.00),
    ("Macbook", 1599.00),
];

/// Client for the storefront's `POST /createNewBasket` endpoint.
#[derive(Clone)]
pub struct StorefrontClient {
    client: Client,
    base_url: String,
}

impl StorefrontClient {
    /// Create a client for the storefront at `base_url`.
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a new basket.
    ///
    /// Sends the form-encoded POST the storefront expects and validates the
    /// response shape: non-2xx statuses and non-JSON bodies are distinct
    /// failures, both surfaced to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`StorefrontError`] when the request cannot be sent, the
    /// status is not successful, the response is not JSON, or the body does
    /// not parse as a basket record.
    pub async fn create_basket(&self) -> Result<Basket, StorefrontError> {
        let response = self
            .client
            .post(format!("{}/createNewBasket", self.base_url))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .body("")
            .send()
            .await
            .map_err(|e| StorefrontError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorefrontError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("application/json") {
            return Err(StorefrontError::NotJson { content_type });
        }

        response
            .json::<Basket>()
            .await
            .map_err(|e| StorefrontError::ResponseParseFailed(e.to_string()))
    }

    /// Create a basket and register the new order in the projection.
    ///
    /// # Errors
    ///
    /// Propagates any [`StorefrontError`] from the creation call; projection
    /// registration itself cannot fail.
    pub async fn create_and_register(
        &self,
        projection: &OrderProjection,
    ) -> Result<Basket, StorefrontError> {
        let basket = self.create_basket().await?;

        if projection.register(OrderId::new(basket.id.clone())).await {
            counter!("ordertrack_baskets_created_total").increment(1);
            info!(
                order_id = %basket.id,
                product = %basket.product,
                quantity = basket.quantity,
                "Basket created"
            );
        } else {
            warn!(order_id = %basket.id, "Storefront returned an already-known order id");
        }

        Ok(basket)
    }
}

/// Generate a local demo basket from the upstream catalog.
///
/// Used when no storefront is configured, so the status board has an order to
/// track.
#[must_use]
pub fn demo_basket() -> Basket {
    let mut rng = rand::thread_rng();
    let (product, unit_price) = CATALOG
        .choose(&mut rng)
        .copied()
        .unwrap_or(("Hoodie", 29.99));
    let quantity = rng.gen_range(1..=5_u32);

    Basket {
        id: format!("{:08x}", rng.gen_range(0..=u32::MAX)),
        customer_id: format!("customer-{}", rng.gen_range(1..=9_u32)),
        state: ordertrack_core::order::OrderState::Created,
        product: product.to_string(),
        quantity,
        price: f64::from(quantity) * unit_price,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests use unwrap for brevity

    use super::*;
    use ordertrack_core::order::OrderState;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn basket_body() -> serde_json::Value {
        json!({
            "id": "b8f3",
            "customerId": "customer-7",
            "state": "CREATED",
            "product": "Hoodie",
            "quantity": 2,
            "price": 59.98
        })
    }

    #[tokio::test]
    async fn create_basket_parses_the_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/createNewBasket"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(basket_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = StorefrontClient::new(server.uri());
        let basket = client.create_basket().await.unwrap();

        assert_eq!(basket.id, "b8f3");
        assert_eq!(basket.state, OrderState::Created);
        assert_eq!(basket.quantity, 2);
    }

    #[tokio::test]
    async fn non_success_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/createNewBasket"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = StorefrontClient::new(server.uri());
        let err = client.create_basket().await.unwrap_err();

        assert!(matches!(
            err,
            StorefrontError::Status { status: 500, .. }
        ));
    }

    #[tokio::test]
    async fn non_json_response_is_a_distinct_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/createNewBasket"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html>oops</html>")
                    .insert_header("content-type", "text/html"),
            )
            .mount(&server)
            .await;

        let client = StorefrontClient::new(server.uri());
        let err = client.create_basket().await.unwrap_err();

        assert!(matches!(err, StorefrontError::NotJson { .. }));
    }

    #[tokio::test]
    async fn unparsable_json_is_a_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/createNewBasket"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "nope": true })))
            .mount(&server)
            .await;

        let client = StorefrontClient::new(server.uri());
        let err = client.create_basket().await.unwrap_err();

        assert!(matches!(err, StorefrontError::ResponseParseFailed(_)));
    }

    #[tokio::test]
    async fn create_and_register_adds_the_order_to_the_projection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/createNewBasket"))
            .respond_with(ResponseTemplate::new(200).set_body_json(basket_body()))
            .mount(&server)
            .await;

        let projection = OrderProjection::new();
        let client = StorefrontClient::new(server.uri());
        let basket = client.create_and_register(&projection).await.unwrap();

        assert_eq!(
            projection.state_of(&OrderId::new(basket.id)).await,
            Some(OrderState::Created)
        );
    }

    #[test]
    fn demo_basket_stays_within_the_catalog() {
        let basket = demo_basket();
        assert!(CATALOG.iter().any(|(name, _)| *name == basket.product));
        assert!((1..=5).contains(&basket.quantity));
        assert_eq!(basket.state, OrderState::Created);
    }
}
