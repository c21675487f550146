//! Caller-supplied progress and status sinks.

use std::fmt;

use serde::Serialize;

/// Tag attached to every status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTag {
    /// Locating, submitting, or server-side post-processing.
    Resolving,
    /// Transfer in progress.
    Downloading,
    Complete,
    Error,
    Cancelled,
}

impl StatusTag {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resolving => "resolving",
            Self::Downloading => "downloading",
            Self::Complete => "complete",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }

    /// True for tags that end a download.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error | Self::Cancelled)
    }
}

impl fmt::Display for StatusTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives progress and status updates from a poller, in poll order.
///
/// Both calls are fire-and-forget.
pub trait StatusReporter: Send + Sync {
    /// Percent complete, 0 to 100.
    fn progress(&self, percent: f64);

    fn status(&self, tag: StatusTag, message: Option<&str>);
}

/// Adapts a pair of closures into a [`StatusReporter`].
pub struct CallbackReporter<P, S> {
    on_progress: P,
    on_status: S,
}

impl<P, S> CallbackReporter<P, S>
where
    P: Fn(f64) + Send + Sync,
    S: Fn(StatusTag, Option<&str>) + Send + Sync,
{
    pub fn new(on_progress: P, on_status: S) -> Self {
        Self {
            on_progress,
            on_status,
        }
    }
}

impl<P, S> StatusReporter for CallbackReporter<P, S>
where
    P: Fn(f64) + Send + Sync,
    S: Fn(StatusTag, Option<&str>) + Send + Sync,
{
    fn progress(&self, percent: f64) {
        (self.on_progress)(percent);
    }

    fn status(&self, tag: StatusTag, message: Option<&str>) {
        (self.on_status)(tag, message);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_callback_reporter_forwards_calls() {
        let progress = Mutex::new(Vec::new());
        let statuses = Mutex::new(Vec::new());
        let reporter = CallbackReporter::new(
            |p| progress.lock().unwrap().push(p),
            |tag, msg: Option<&str>| statuses.lock().unwrap().push((tag, msg.map(str::to_string))),
        );

        reporter.progress(12.5);
        reporter.status(StatusTag::Downloading, Some("12%"));
        reporter.status(StatusTag::Cancelled, None);

        assert_eq!(*progress.lock().unwrap(), vec![12.5]);
        assert_eq!(
            *statuses.lock().unwrap(),
            vec![
                (StatusTag::Downloading, Some("12%".to_string())),
                (StatusTag::Cancelled, None),
            ]
        );
    }

    #[test]
    fn test_terminal_tags() {
        assert!(StatusTag::Complete.is_terminal());
        assert!(StatusTag::Error.is_terminal());
        assert!(StatusTag::Cancelled.is_terminal());
        assert!(!StatusTag::Resolving.is_terminal());
        assert!(!StatusTag::Downloading.is_terminal());
        assert_eq!(StatusTag::Resolving.to_string(), "resolving");
    }
}
