use crate::types::Notification;

/// Capability surface of the external UI collaborator.
///
/// The controller drives whatever hosts the trigger through this trait and
/// nothing else: no DOM, no widget toolkit, no globals. Methods are plain
/// sinks with nothing useful to return; a misbehaving implementation that
/// panics is contained by the controller's fault boundary.
pub trait UiSurface: Send + Sync {
    /// Enable or disable the trigger element.
    fn set_trigger_enabled(&self, enabled: bool);

    /// Replace the trigger's visible label.
    fn set_trigger_label(&self, label: &str);

    /// Show a feedback notification. The controller schedules the dismissal.
    fn show_notification(&self, notification: &Notification);

    /// Dismiss the currently shown notification, if any.
    fn hide_notification(&self);

    /// Push a message to the live announcement sink (screen readers etc.).
    fn announce(&self, message: &str);
}

/// Surface for embeddings without a UI. Every call is a no-op.
#[derive(Debug, Default)]
pub struct HeadlessSurface;

impl UiSurface for HeadlessSurface {
    fn set_trigger_enabled(&self, _enabled: bool) {}

    fn set_trigger_label(&self, _label: &str) {}

    fn show_notification(&self, _notification: &Notification) {}

    fn hide_notification(&self) {}

    fn announce(&self, _message: &str) {}
}
