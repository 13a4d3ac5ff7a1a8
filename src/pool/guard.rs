//! Single-flight guard for host list updates.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

/// Held while one update is in flight.
///
/// Acquiring flips the flag `false → true` with a compare-and-swap; dropping
/// flips it back. Dropping happens on every exit path of the owning future,
/// including when the caller drops that future.
#[derive(Debug)]
pub(crate) struct UpdateGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> UpdateGuard<'a> {
    /// Takes the guard, or fails with [`Error::ConcurrentUpdate`].
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::ConcurrentUpdate)?;
        Ok(Self { flag })
    }
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_rejected() {
        let flag = AtomicBool::new(false);
        let guard = UpdateGuard::acquire(&flag).unwrap();

        assert!(matches!(
            UpdateGuard::acquire(&flag),
            Err(Error::ConcurrentUpdate)
        ));
        assert!(flag.load(Ordering::Acquire));

        drop(guard);
        assert!(!flag.load(Ordering::Acquire));
        assert!(UpdateGuard::acquire(&flag).is_ok());
    }

    #[test]
    fn test_released_on_early_return() {
        fn fails(flag: &AtomicBool) -> Result<()> {
            let _guard = UpdateGuard::acquire(flag)?;
            Err(Error::NoConnections)
        }

        let flag = AtomicBool::new(false);
        assert!(fails(&flag).is_err());
        assert!(!flag.load(Ordering::Acquire));
    }
}
