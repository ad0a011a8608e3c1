/// Ownership of a running periodic timer
///
/// Cancelling consumes the handle, so a timer can only be released once.
pub trait TimerHandle {
    fn cancel(self);
}

impl TimerHandle for leptos::leptos_dom::helpers::IntervalHandle {
    fn cancel(self) {
        self.clear();
    }
}
