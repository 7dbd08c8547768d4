//! Lock helpers shared by devices, listener sets and the registry.
//!
//! A panic on a polling thread is caught and reported as a device fault, so a
//! poisoned lock only means a listener blew up mid-dispatch. The guarded data
//! is still consistent (state is never mutated while listeners run), so the
//! helpers recover the guard instead of propagating the poison.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
        warn!("Recovering poisoned mutex");
        poisoned.into_inner()
    })
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned: PoisonError<_>| {
        warn!("Recovering poisoned read lock");
        poisoned.into_inner()
    })
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned: PoisonError<_>| {
        warn!("Recovering poisoned write lock");
        poisoned.into_inner()
    })
}
