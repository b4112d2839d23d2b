pub mod actor;
pub mod driver;
pub mod event;
pub mod order;
pub mod quote;
