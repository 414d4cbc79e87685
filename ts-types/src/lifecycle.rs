use serde::{Deserialize, Serialize};

/// Daily at-most-once lifecycle edge events driven by
/// `ts-supervisor::lifecycle::LifecycleController`.
///
/// Intentionally the three-variant set spec.md settles on: the original
/// Python `LifecycleManager` tracks two further timestamps (`MarketOpen`,
/// `MarketClose`) but never branches on them separately from `PreOpen` /
/// `PostClose`, so they carry no behaviour of their own and are not ported.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum EventKind {
    PreOpen,
    PostClose,
    Cleanup,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreOpen => write!(f, "pre_open"),
            Self::PostClose => write!(f, "post_close"),
            Self::Cleanup => write!(f, "cleanup"),
        }
    }
}
