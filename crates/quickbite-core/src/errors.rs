use quickbite_types::domain::status::StatusError;
use quickbite_types::ports::order_gateway::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad command: {0}")]
    BadCommand(String),

    #[error("Order not found: {0}")]
    UnknownOrder(String),

    #[error(transparent)]
    InvalidStatus(#[from] StatusError),

    #[error("Backend error: {0}")]
    Gateway(#[from] GatewayError),
}
