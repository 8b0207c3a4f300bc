use std::time::Duration;

use crate::error::{ErrorKind, PipelineError};

/// How long a notice stays on screen before it dismisses itself.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: ErrorKind,
    pub message: String,
    pub ttl: Duration,
}

impl Notice {
    pub fn from_error(err: &PipelineError, ttl: Duration) -> Self {
        Self {
            kind: err.kind(),
            message: err.user_message(),
            ttl,
        }
    }
}

pub trait Notifier {
    fn notify(&mut self, notice: Notice);
}

/// Keeps every notice, in order.
impl Notifier for Vec<Notice> {
    fn notify(&mut self, notice: Notice) {
        self.push(notice);
    }
}

impl<N: Notifier + ?Sized> Notifier for &mut N {
    fn notify(&mut self, notice: Notice) {
        (**self).notify(notice);
    }
}

/// Prints notices on stderr.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, notice: Notice) {
        log::warn!("{:?}: {}", notice.kind, notice.message);
        eprintln!("error: {}", notice.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_notifier_keeps_order() {
        let mut notices: Vec<Notice> = Vec::new();
        let sink = &mut notices;
        sink.notify(Notice::from_error(&PipelineError::NoResultAvailable, NOTICE_TTL));
        sink.notify(Notice::from_error(
            &PipelineError::InvalidType("image/png".into()),
            NOTICE_TTL,
        ));

        let kinds: Vec<_> = notices.iter().map(|n| n.kind).collect();
        assert_eq!(kinds, [ErrorKind::NoResultAvailable, ErrorKind::InvalidType]);
        assert_eq!(notices[0].message, "No compressed file available.");
        assert_eq!(notices[1].ttl, Duration::from_secs(5));
    }
}
