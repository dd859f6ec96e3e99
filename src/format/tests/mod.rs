//! Unit tests for the normalized text format.
//!
//! These tests pin the exact serialized output, the failure modes, and the
//! decode-after-encode tolerance.
