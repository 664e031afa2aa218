//! Fire-and-forget user notification seam.
//!
//! The cart store never surfaces failures to its callers; the only
//! user-visible effect of a failed operation is one of the fixed toast
//! messages in [`messages`], delivered through a [`Notifier`].

/// The fixed user-facing notification texts.
pub mod messages {
    /// Stock check refused the requested quantity.
    pub const OUT_OF_STOCK: &str = "requested quantity out of stock";
    /// `add_product` failed for any other reason.
    pub const ADD_FAILED: &str = "error adding product";
    /// `remove_product` failed for any reason.
    pub const REMOVE_FAILED: &str = "error removing product";
    /// `update_product_amount` failed for any other reason.
    pub const UPDATE_FAILED: &str = "error updating product amount";
}

/// Sink for error-level user notifications.
///
/// Calls are fire-and-forget: no acknowledgment, no return value. The UI
/// layer supplies its own implementation (toast, status bar, ...).
pub trait Notifier: Send + Sync {
    /// Show an error-level notification to the user.
    fn notify_error(&self, message: &str);
}

/// Default notifier that emits an error-level tracing event.
///
/// Useful where no interactive UI is attached (tests, background jobs).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_error(&self, message: &str) {
        tracing::error!(message, "user notification");
    }
}
