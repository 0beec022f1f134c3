/// Transient, self-expiring advisory channel. Fire and forget; a failed
/// flash never affects panel state.
pub trait Notifier {
    fn flash(&self, message: &str);
}

#[derive(Debug, Default)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn flash(&self, message: &str) {
        send(message);
    }
}

pub fn send(body: impl Into<String>) {
    let body = body.into();
    if let Err(err) = notify_rust::Notification::new()
        .appname("stringlens")
        .summary("stringlens")
        .body(&body)
        .show()
    {
        tracing::warn!("system notification failed: {err}");
    }
}
