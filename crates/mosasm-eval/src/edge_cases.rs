//! Edge case tests for mosasm-eval
