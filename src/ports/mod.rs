pub mod balance;
pub mod history;
