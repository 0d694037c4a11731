use crate::adapter::{WorkerRequest, WorkerResponse};
use async_trait::async_trait;
use shared::env::Env;

/// Error a handler surfaces to the router boundary; its display text ends up
/// in the inline error image.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// A card endpoint.
///
/// A handler reads from the request shim, performs exactly one terminal
/// write on the response shim (`send`, `json`, or a redirect), and returns.
/// Returning an error instead hands the failure to the router boundary.
#[async_trait]
pub trait CardHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        req: &WorkerRequest,
        res: &mut WorkerResponse,
        env: &Env,
    ) -> Result<(), HandlerError>;
}
