//! Start outcome of role procedures
//!
//! The facade hands a procedure to its role task and waits on a
//! [`StartReport`]. The SoftDevice call that starts advertising, scanning or
//! connecting runs on the first poll of the role future, so the result of that
//! poll is what the caller gets back: `Ok` once the procedure is pending, the
//! stack error when it failed straight away.

use core::future::{poll_fn, Future};
use core::pin::pin;
use core::task::Poll;

use defmt::debug;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration};

use crate::error::EnrfError;

/// How long a caller waits for the role task to pick up its request
pub const START_TIMEOUT: Duration = Duration::from_secs(2);

pub struct StartReport {
    result: Signal<CriticalSectionRawMutex, Result<(), EnrfError>>,
}

impl StartReport {
    pub const fn new() -> Self {
        Self { result: Signal::new() }
    }

    /// Drop a result nobody waited for; call before handing over a request
    pub fn reset(&self) {
        self.result.reset();
    }

    pub fn report(&self, result: Result<(), EnrfError>) {
        self.result.signal(result);
    }

    /// Result reported since the last reset, if any
    pub fn try_result(&self) -> Option<Result<(), EnrfError>> {
        self.result.try_take()
    }

    /// Result of the request handed over after the last reset
    pub async fn wait(&self) -> Result<(), EnrfError> {
        match with_timeout(START_TIMEOUT, self.result.wait()).await {
            Ok(result) => result,
            Err(_) => {
                debug!("Role task did not start the request");
                Err(EnrfError::Timeout)
            }
        }
    }

    /// Run `procedure`, reporting the outcome of its first poll
    ///
    /// Errors returned after that are left to the role task.
    pub async fn track<T, E, F>(&self, procedure: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: Copy + Into<EnrfError>,
    {
        let mut procedure = pin!(procedure);
        let mut first = true;
        poll_fn(|cx| {
            let poll = procedure.as_mut().poll(cx);
            if first {
                first = false;
                self.report(match &poll {
                    Poll::Ready(Err(e)) => Err((*e).into()),
                    _ => Ok(()),
                });
            }
            poll
        })
        .await
    }
}

impl Default for StartReport {
    fn default() -> Self {
        Self::new()
    }
}
