pub mod email;
pub mod health;
pub mod jobs;
pub mod order;
pub mod payment;
