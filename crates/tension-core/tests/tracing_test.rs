//! Tests for the tracing setup.

use std::sync::Mutex;

use tension_core::tracing::init_tracing;

/// Serializes tests that touch TENSION_LOG.
static TRACING_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_init_with_filter() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("TENSION_LOG", "tension_analysis=debug,tension_core=warn");
    init_tracing();
    std::env::remove_var("TENSION_LOG");
}

#[test]
fn test_init_tracing_idempotent() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    init_tracing();
    init_tracing();
}

#[test]
fn test_invalid_filter_falls_back() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("TENSION_LOG", "=;;not a filter[");
    init_tracing();
    std::env::remove_var("TENSION_LOG");
}
