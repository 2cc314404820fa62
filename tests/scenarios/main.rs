//! Scenario-based tests for apk-repack

mod helpers;

mod encode_fallback;
