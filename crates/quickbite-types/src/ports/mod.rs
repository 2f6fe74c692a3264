pub mod credentials;
pub mod notifier;
pub mod order_gateway;
