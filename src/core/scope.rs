//! Ambient scope stack
//!
//! Scopes attach named values to every event created while they are live.
//! Each thread has its own stack ([`ScopeStack::current`]); a stack can also be
//! created explicitly and handed to work that hops between threads.
//!
//! Frames are removed by identity, not by position: dropping a [`ScopeGuard`]
//! removes exactly the frame it pushed even when guards are released out of
//! nesting order. [`ScopeGuard::release`] reports such misuse to the caller,
//! while `Drop` tolerates it silently.

use super::error::{LoggerError, Result};
use super::log_context::LogContext;
use crate::template::{LogProperty, PropertyResolver, ResolvingMode};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static FRAME_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT: ScopeStack = ScopeStack::new();
}

/// One pushed scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeFrame {
    pub id: u64,
    /// Category of the logger that opened the scope
    pub namespace: String,
    pub properties: Vec<LogProperty>,
}

impl ScopeFrame {
    pub fn property(&self, name: &str) -> Option<&LogProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A stack of scope frames for one logical flow.
#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    frames: Arc<Mutex<Vec<Arc<ScopeFrame>>>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// The calling thread's stack.
    pub fn current() -> Self {
        CURRENT.with(Clone::clone)
    }

    /// Push a frame; it stays live until the returned guard is dropped or released.
    #[must_use = "the scope is popped as soon as the guard is dropped"]
    pub fn push(&self, namespace: impl Into<String>, context: LogContext) -> ScopeGuard {
        let resolver = PropertyResolver::new();
        let properties = context
            .fields()
            .iter()
            .map(|(name, value)| resolver.resolve(name.as_str(), value, ResolvingMode::Destructure))
            .collect();

        let frame = Arc::new(ScopeFrame {
            id: FRAME_ID.fetch_add(1, Ordering::Relaxed),
            namespace: namespace.into(),
            properties,
        });
        let frame_id = frame.id;
        self.frames.lock().push(frame);

        ScopeGuard {
            stack: self.clone(),
            frame_id,
            released: false,
        }
    }

    /// Live frames, innermost first.
    pub fn snapshot(&self) -> Vec<Arc<ScopeFrame>> {
        self.frames.lock().iter().rev().cloned().collect()
    }

    pub fn depth(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    /// Drop every frame; outstanding guards become no-ops.
    pub fn clear(&self) {
        self.frames.lock().clear();
    }

    fn remove(&self, frame_id: u64) -> Result<()> {
        let mut frames = self.frames.lock();
        let position = frames
            .iter()
            .position(|f| f.id == frame_id)
            .ok_or(LoggerError::ScopeNotFound { frame_id })?;

        let inner_frames = frames.len() - 1 - position;
        frames.remove(position);

        if inner_frames > 0 {
            return Err(LoggerError::ScopeOutOfOrder {
                frame_id,
                inner_frames,
            });
        }
        Ok(())
    }
}

/// Pops its frame when dropped.
#[derive(Debug)]
pub struct ScopeGuard {
    stack: ScopeStack,
    frame_id: u64,
    released: bool,
}

impl ScopeGuard {
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Pop the frame now.
    ///
    /// The frame is removed in every case; an error reports that it was not
    /// the innermost live frame, or that the stack had already been cleared.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.stack.remove(self.frame_id)
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.stack.remove(self.frame_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{PropertyValue, ScalarValue};

    fn ctx(key: &str, value: i32) -> LogContext {
        LogContext::new().with_field(key, value)
    }

    #[test]
    fn test_push_and_drop() {
        let stack = ScopeStack::new();
        {
            let _outer = stack.push("app", ctx("request", 1));
            {
                let _inner = stack.push("app", ctx("step", 2));
                assert_eq!(stack.depth(), 2);
                let frames = stack.snapshot();
                assert!(frames[0].property("step").is_some());
                assert!(frames[1].property("request").is_some());
            }
            assert_eq!(stack.depth(), 1);
        }
        assert!(stack.is_empty());
    }

    #[test]
    fn test_out_of_order_release_removes_own_frame() {
        let stack = ScopeStack::new();
        let outer = stack.push("app", ctx("outer", 1));
        let inner = stack.push("app", ctx("inner", 2));

        let result = outer.release();
        assert!(matches!(
            result,
            Err(LoggerError::ScopeOutOfOrder {
                inner_frames: 1,
                ..
            })
        ));

        let frames = stack.snapshot();
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].property("inner").map(|p| &p.value),
            Some(&PropertyValue::Scalar(ScalarValue::Int(2)))
        );

        assert!(inner.release().is_ok());
        assert!(stack.is_empty());
    }

    #[test]
    fn test_release_after_clear_reports_not_found() {
        let stack = ScopeStack::new();
        let guard = stack.push("app", ctx("x", 1));
        stack.clear();
        assert!(matches!(guard.release(), Err(LoggerError::ScopeNotFound { .. })));
    }

    #[test]
    fn test_current_is_per_thread() {
        let _guard = ScopeStack::current().push("main", ctx("thread", 0));
        assert_eq!(ScopeStack::current().depth(), 1);

        let depth_elsewhere = std::thread::spawn(|| ScopeStack::current().depth())
            .join()
            .expect("thread panicked");
        assert_eq!(depth_elsewhere, 0);
    }
}
