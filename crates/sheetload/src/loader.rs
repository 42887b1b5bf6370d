//! The script loading primitive.

use std::fmt;
use std::future::Future;

/// Fetches and executes one script.
///
/// Loads are issued concurrently through a shared reference, so implementors
/// that keep state need interior mutability. Futures are polled on a single
/// task and need not be `Send`.
pub trait ScriptLoader {
    type Error: fmt::Display;

    /// Resolve once the script at `url` has been loaded and executed
    fn load(&self, url: &str) -> impl Future<Output = Result<(), Self::Error>>;
}

impl<L: ScriptLoader> ScriptLoader for &L {
    type Error = L::Error;

    fn load(&self, url: &str) -> impl Future<Output = Result<(), Self::Error>> {
        (**self).load(url)
    }
}
