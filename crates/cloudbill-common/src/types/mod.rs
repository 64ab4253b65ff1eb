//! Core types for CloudBill

pub mod cost_record;
pub mod query;
