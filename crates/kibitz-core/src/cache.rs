//! The overlay's conventional buffer channels.

use crate::buffer::{Buffer, BufferPool};
use std::sync::Arc;

/// The two channels every overlay instance carries: `app` for
/// application-side notes and `console` for the formatted log lines the
/// console can export.
///
/// Channels are independent slots in the same pool — clearing one never
/// affects the other.
#[derive(Debug, Clone)]
pub struct Cache {
    pub app: Buffer,
    pub console: Buffer,
}

impl Cache {
    #[must_use]
    pub fn new(pool: &Arc<BufferPool>) -> Self {
        Self {
            app: Buffer::text(pool),
            console: Buffer::text(pool),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels_are_distinct_slots() {
        let pool = BufferPool::new();
        let cache = Cache::new(&pool);

        cache.app.write("app line");
        cache.console.write("console line");
        cache.console.clear();

        assert_eq!(cache.app.contents().as_text(), Some("app line"));
        assert_eq!(cache.console.contents().as_text(), Some(""));
        assert_eq!(pool.len(), 2);
    }
}
