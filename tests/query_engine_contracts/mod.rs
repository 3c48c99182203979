//! Contract tests for the operator layer.

mod executor_contract;
mod operator_contract;
