//! Order endpoints.

use serde_json::Value;
use tracing::{error, info, instrument};

use stagedoor_core::{NewOrder, OrderId, UserId};

use super::delete::probe_sequentially;
use super::{ApiClient, ApiRequest, GatewayError};

impl ApiClient {
    /// `POST /order`, after validating the payload locally.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Validation` without sending anything when the
    /// order has no user id, a blank title or a non-positive price.
    #[instrument(skip(self, order), fields(title = %order.title))]
    pub async fn order_create(&self, order: &NewOrder) -> Result<Value, GatewayError> {
        order.validate()?;
        let body = serde_json::to_value(order)?;
        Ok(self.execute(ApiRequest::post("order", body)).await?.body)
    }

    /// `GET /order`: every order.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` or `GatewayError::Server`.
    #[instrument(skip(self))]
    pub async fn order_get_all(&self) -> Result<Value, GatewayError> {
        Ok(self.execute(ApiRequest::get("order")).await?.body)
    }

    /// `GET /order/user/{user_id}`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` or `GatewayError::Server`.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn order_get_by_user(&self, user_id: UserId) -> Result<Value, GatewayError> {
        Ok(self
            .execute(ApiRequest::get(format!("order/user/{user_id}")))
            .await?
            .body)
    }

    /// Delete an order, probing the configured candidate routes in order.
    ///
    /// Returns the body of the first non-404 success.
    ///
    /// # Errors
    ///
    /// Returns the first non-404 error as-is, or
    /// `GatewayError::DeleteEndpointNotFound` listing every attempted request
    /// when all of them answered 404.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn order_delete(&self, order_id: OrderId) -> Result<Value, GatewayError> {
        let requests: Vec<ApiRequest> = self
            .inner
            .delete_candidates
            .iter()
            .map(|candidate| candidate.request_for(order_id))
            .collect();
        let attempted: Vec<String> = requests.iter().map(ApiRequest::describe).collect();

        let outcome = probe_sequentially(requests, GatewayError::is_not_found, |request| {
            let description = request.describe();
            async move {
                let result = self.execute(request).await;
                if result.is_ok() {
                    info!(route = %description, "Order deleted");
                }
                result
            }
        })
        .await;

        match outcome {
            Some(result) => result.map(|response| response.body),
            None => {
                for (i, request) in attempted.iter().enumerate() {
                    error!(attempt = i + 1, request = %request, "Delete route answered 404");
                }
                Err(GatewayError::DeleteEndpointNotFound {
                    order_id,
                    attempted,
                })
            }
        }
    }
}
