pub mod bill;
pub mod order;
pub mod status;
pub mod stepper;
