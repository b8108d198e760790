//! Incremental path writer used during template expansion.
//!
//! Values equal to their parameter default are *buffered*: they are only
//! written once something non-default follows, so trailing default segments
//! disappear from the generated path.
//!
//! ```text
//! template  {controller=Home}/{action=Index}/{id?}
//! values    controller=Home action=Index        -> /
//! values    controller=Home action=List         -> /Home/List
//! values    controller=Home action=Index id=3   -> /Home/Index/3
//! ```

use std::fmt::Write;

use crate::core::{encode_path, encode_segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentState {
    Beginning,
    Inside,
}

#[derive(Debug)]
struct Buffered {
    value: String,
    requires_encoding: bool,
}

#[derive(Debug)]
pub(super) struct UriBuildingContext {
    uri: String,
    buffer: Vec<Buffered>,
    /// An empty value was accepted; nothing non-empty may follow.
    blocked: bool,
    uri_state: SegmentState,
    buffer_state: SegmentState,
    /// Offset before the last accepted value, for [`Self::remove_last`].
    last_value_offset: Option<usize>,
}

impl UriBuildingContext {
    pub fn new() -> Self {
        Self {
            uri: String::new(),
            buffer: Vec::new(),
            blocked: false,
            uri_state: SegmentState::Beginning,
            buffer_state: SegmentState::Beginning,
            last_value_offset: None,
        }
    }

    /// Write a value now, flushing anything buffered before it.
    ///
    /// Returns `false` when the value cannot be placed: an empty value
    /// inside a segment, or any value after an empty one.
    pub fn accept(&mut self, value: &str, encode_slashes: bool) -> bool {
        if value.is_empty() {
            if self.uri_state == SegmentState::Inside || self.buffer_state == SegmentState::Inside {
                return false;
            }
            self.blocked = true;
            return true;
        }
        if self.blocked {
            return false;
        }

        for buffered in self.buffer.drain(..) {
            if buffered.requires_encoding {
                write!(self.uri, "{}", encode_segment(&buffered.value)).ok();
            } else {
                self.uri.push_str(&buffered.value);
            }
        }

        if self.uri_state == SegmentState::Beginning
            && self.buffer_state == SegmentState::Beginning
            && !self.uri.is_empty()
        {
            self.uri.push('/');
        }

        self.buffer_state = SegmentState::Inside;
        self.uri_state = SegmentState::Inside;
        self.last_value_offset = Some(self.uri.len());

        if encode_slashes {
            write!(self.uri, "{}", encode_segment(value)).ok();
        } else {
            write!(self.uri, "{}", encode_path(value)).ok();
        }
        true
    }

    /// Hold a default-valued part until something non-default follows.
    pub fn buffer(&mut self, value: &str) -> bool {
        if value.is_empty() {
            if self.buffer_state == SegmentState::Inside {
                return false;
            }
            self.blocked = true;
            return true;
        }
        if self.blocked {
            return false;
        }

        if self.uri_state == SegmentState::Inside {
            // Part of this segment is already written, no point in holding back
            return self.accept(value, true);
        }

        if self.uri_state == SegmentState::Beginning && self.buffer_state == SegmentState::Beginning {
            if !self.uri.is_empty() || !self.buffer.is_empty() {
                self.buffer.push(Buffered {
                    value: "/".to_string(),
                    requires_encoding: false,
                });
            }
            self.buffer_state = SegmentState::Inside;
        }

        self.buffer.push(Buffered {
            value: value.to_string(),
            requires_encoding: true,
        });
        true
    }

    /// Drop the last accepted value (an optional separator whose parameter
    /// turned out empty).
    pub fn remove_last(&mut self) {
        if let Some(offset) = self.last_value_offset.take() {
            self.uri.truncate(offset);
        }
    }

    pub fn end_segment(&mut self) {
        self.buffer_state = SegmentState::Beginning;
        self.uri_state = SegmentState::Beginning;
    }

    /// Final path, always starting with `/`. Buffered defaults are dropped.
    pub fn into_path(self) -> String {
        if self.uri.starts_with('/') {
            self.uri
        } else {
            let mut path = String::with_capacity(self.uri.len() + 1);
            path.push('/');
            path.push_str(&self.uri);
            path
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_joins_segments() {
        let mut ctx = UriBuildingContext::new();
        assert!(ctx.accept("a", true));
        ctx.end_segment();
        assert!(ctx.accept("b c", true));
        ctx.end_segment();
        assert_eq!(ctx.into_path(), "/a/b%20c");
    }

    #[test]
    fn test_trailing_buffer_is_dropped() {
        let mut ctx = UriBuildingContext::new();
        assert!(ctx.accept("blog", true));
        ctx.end_segment();
        assert!(ctx.buffer("Index"));
        ctx.end_segment();
        assert_eq!(ctx.into_path(), "/blog");
    }

    #[test]
    fn test_buffer_flushed_by_later_value() {
        let mut ctx = UriBuildingContext::new();
        assert!(ctx.buffer("Home"));
        ctx.end_segment();
        assert!(ctx.accept("List", true));
        ctx.end_segment();
        assert_eq!(ctx.into_path(), "/Home/List");
    }

    #[test]
    fn test_empty_blocks_following_values() {
        let mut ctx = UriBuildingContext::new();
        assert!(ctx.accept("a", true));
        ctx.end_segment();
        assert!(ctx.accept("", true));
        ctx.end_segment();
        assert!(!ctx.accept("c", true));
    }

    #[test]
    fn test_empty_inside_segment_fails() {
        let mut ctx = UriBuildingContext::new();
        assert!(ctx.accept("name", true));
        assert!(!ctx.accept("", true));
    }

    #[test]
    fn test_remove_last_separator() {
        let mut ctx = UriBuildingContext::new();
        assert!(ctx.accept("report", true));
        assert!(ctx.accept(".", true));
        assert!(!ctx.accept("", true));
        ctx.remove_last();
        ctx.end_segment();
        assert_eq!(ctx.into_path(), "/report");
    }

    #[test]
    fn test_slashes_kept_when_not_encoding() {
        let mut ctx = UriBuildingContext::new();
        assert!(ctx.accept("docs", true));
        ctx.end_segment();
        assert!(ctx.accept("a/b c/d", false));
        assert_eq!(ctx.into_path(), "/docs/a/b%20c/d");
    }

    #[test]
    fn test_root() {
        assert_eq!(UriBuildingContext::new().into_path(), "/");
    }
}
