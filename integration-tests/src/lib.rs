//! Cross-crate tests for the assembled aircraft problem live in `tests/`.
