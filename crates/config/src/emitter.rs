// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Thread-safe registry of change listeners.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use tracing::debug;

/// Opaque handle returned by [`Emitter::add_listener`].
pub type ListenerId = String;

/// A callback receiving the previous and the new value.
pub type Listener<T> = Arc<dyn Fn(&T, &T) + Send + Sync>;

struct Registration<T> {
    name: &'static str,
    callback: Listener<T>,
}

impl<T> Clone for Registration<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Registers callbacks and invokes them synchronously on change.
///
/// Listeners run on the notifying thread, outside the registry lock, so a
/// listener may add or remove listeners without deadlocking. Invocation
/// order is unspecified.
pub struct Emitter<T> {
    listeners: RwLock<HashMap<ListenerId, Registration<T>>>,
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> Emitter<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback and returns the id that removes it.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T, &T) + Send + Sync + 'static,
    {
        let registration: Registration<T> = Registration {
            name: std::any::type_name::<F>(),
            callback: Arc::new(listener),
        };

        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut id: ListenerId = new_listener_id();
        while listeners.contains_key(&id) {
            id = new_listener_id();
        }
        listeners.insert(id.clone(), registration);
        id
    }

    /// Removes a callback. Returns whether `id` was registered.
    pub fn remove_listener(&self, id: &str) -> bool {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes every listener with `(old, new)`.
    pub fn notify(&self, old: &T, new: &T) {
        let snapshot: Vec<Registration<T>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        for registration in snapshot {
            let started: Instant = Instant::now();
            (registration.callback)(old, new);
            debug!(
                name = registration.name,
                elapsed = ?started.elapsed(),
                "Listener ran"
            );
        }
    }
}

fn new_listener_id() -> ListenerId {
    format!("{:016x}{:016x}", rand::random::<u64>(), rand::random::<u64>())
}
