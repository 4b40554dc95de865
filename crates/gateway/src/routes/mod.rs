pub mod forward;
pub mod health;
pub mod metrics;
