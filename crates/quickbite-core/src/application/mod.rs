pub mod order_board;
pub mod polling;
pub mod progression;
