pub mod alert;
pub mod call;
pub mod rule;
