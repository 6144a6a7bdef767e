//! End-to-end tests for the UnderDoc client live under `tests/`.
