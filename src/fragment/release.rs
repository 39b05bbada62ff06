//! Scoped release of fragment payloads.

use std::ops::{Deref, DerefMut};

use super::Fragment;

/// Owns a fragment while it is processed and releases it when dropped.
///
/// Dropping happens on every exit path, including early returns and
/// unwinding, so pooled buffers and file handles are always relinquished.
#[derive(Debug)]
pub struct ReleaseGuard {
    fragment: Fragment,
}

impl ReleaseGuard {
    /// Take ownership of `fragment` until the guard is dropped.
    #[must_use]
    pub fn new(fragment: Fragment) -> Self { Self { fragment } }
}

impl Deref for ReleaseGuard {
    type Target = Fragment;

    fn deref(&self) -> &Self::Target { &self.fragment }
}

impl DerefMut for ReleaseGuard {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.fragment }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) { self.fragment.release(); }
}
