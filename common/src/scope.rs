use std::cell::{Cell, RefCell};
use std::future::Future;

use futures::future::{AbortHandle, Abortable};
use futures::FutureExt;

/// Lifetime of a UI surface (dialog, page) that starts async work.
///
/// Futures wrapped with [`TaskScope::guard`] are aborted at their next
/// suspension point once the scope is closed or dropped, so results that
/// arrive after teardown are discarded instead of written into state that no
/// longer exists. In-flight HTTP requests are not cancelled on the wire.
#[derive(Debug, Default)]
pub struct TaskScope {
    handles: RefCell<Vec<AbortHandle>>,
    closed: Cell<bool>,
}

impl TaskScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tie `future` to this scope. Resolves to `None` if the scope closed
    /// first.
    pub fn guard<F: Future>(&self, future: F) -> impl Future<Output = Option<F::Output>> {
        let (handle, registration) = AbortHandle::new_pair();
        if self.closed.get() {
            handle.abort();
        } else {
            let mut handles = self.handles.borrow_mut();
            handles.retain(|h| !h.is_aborted());
            handles.push(handle);
        }
        Abortable::new(future, registration).map(Result::ok)
    }

    pub fn close(&self) {
        self.closed.set(true);
        for handle in self.handles.borrow_mut().drain(..) {
            handle.abort();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.close();
    }
}
