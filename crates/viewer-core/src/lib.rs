mod backend;
mod config;
mod error;
mod events;
mod fetch;
mod glossary;
mod poller;
mod runtime;
mod selection;
mod session;
mod sync;
mod tracks;

#[cfg(test)]
mod test_utils;

pub use backend::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use glossary::*;
pub use poller::*;
pub use runtime::*;
pub use selection::*;
pub use session::*;
pub use sync::*;
pub use tracks::*;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
