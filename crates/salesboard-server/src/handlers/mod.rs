pub mod goals;
pub mod health;
pub mod manage;
pub mod sales;
