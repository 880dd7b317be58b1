//! Single-flight gate for detection requests.

/// Boolean gate allowing at most one outstanding detection request.
///
/// Not a counter: acquiring while busy is a caller bug, and every response
/// path must call [`InFlightGuard::release`] or the sampler stalls.
#[derive(Debug, Default)]
pub struct InFlightGuard {
    busy: bool,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_idle(&self) -> bool {
        !self.busy
    }

    /// Mark a request as outstanding. Returns false if one already was.
    pub fn acquire(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    /// Clear the outstanding request, whatever its outcome.
    pub fn release(&mut self) {
        if self.busy {
            log::trace!("In-flight guard released");
        }
        self.busy = false;
    }
}
