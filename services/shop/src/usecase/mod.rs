pub mod email;
pub mod order;
pub mod payment;
