//! Custom assertion helpers for common test patterns.
//!
//! Provides functions and macros for making history assertions more readable
//! and providing better error messages.

use localhist_core::{EntryAdded, HistoryEntry, Subscription};
use localhist_storage::Resource;

/// Assert that the snapshot stored for `entry` is exactly `expected`.
pub async fn assert_entry_bytes(entry: &HistoryEntry, expected: impl AsRef<[u8]>) {
    let stored = entry.read_contents().await.unwrap_or_else(|e| {
        panic!(
            "Failed to read snapshot {} at {}: {}",
            entry.id,
            entry.location.display(),
            e
        )
    });

    assert!(
        stored == expected.as_ref(),
        "Snapshot {} of {} does not match.\nExpected: {:?}\nActual:   {:?}",
        entry.id,
        entry.resource,
        String::from_utf8_lossy(expected.as_ref()),
        String::from_utf8_lossy(&stored)
    );
}

/// Assert that `entries` hold exactly `expected` contents, oldest first.
pub async fn assert_history_contents<T: AsRef<[u8]>>(entries: &[HistoryEntry], expected: &[T]) {
    assert_eq!(
        entries.len(),
        expected.len(),
        "Expected {} history entries, found {}",
        expected.len(),
        entries.len()
    );

    for (entry, content) in entries.iter().zip(expected) {
        assert_entry_bytes(entry, content).await;
    }

    assert!(
        entries.windows(2).all(|w| w[0].id < w[1].id),
        "History entries are not in creation order: {:?}",
        entries.iter().map(|e| e.id.as_str()).collect::<Vec<_>>()
    );
}

/// Drain a subscription and return the resources of the received add-events in order.
pub fn drain_added(subscription: &mut Subscription<EntryAdded>) -> Vec<Resource> {
    subscription
        .drain()
        .into_iter()
        .map(|event| event.entry.resource)
        .collect()
}

/// Assert that an option is Some and extract the value.
#[macro_export]
macro_rules! assert_some {
    ($expr:expr) => {
        match $expr {
            Some(value) => value,
            None => panic!("Expected Some, got None"),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Some(value) => value,
            None => panic!("{}", $msg),
        }
    };
}

/// Assert that an option is None.
#[macro_export]
macro_rules! assert_none {
    ($expr:expr) => {
        if let Some(value) = $expr {
            panic!("Expected None, got Some: {:?}", value);
        }
    };
    ($expr:expr, $msg:literal) => {
        if let Some(value) = $expr {
            panic!("{}: {:?}", $msg, value);
        }
    };
}
