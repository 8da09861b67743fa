use core::fmt;
use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{error::SchemeError, value::{EvaluationResult, Value}};

struct FrameData {
    bindings: RefCell<HashMap<Rc<str>, Value>>,
    parent: Option<Frame>,
}

/// A lexical scope. Cloning a frame shares it; closures capture frames this way.
#[derive(Clone)]
pub struct Frame(Rc<FrameData>);

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bindings may hold closures capturing this very frame, so only summarize
        f.debug_struct("Frame")
            .field("bindings", &self.0.bindings.borrow().len())
            .field("depth", &self.depth())
            .finish()
    }
}

impl Frame {
    /// The global frame, which has no parent.
    pub fn root() -> Self {
        Self(Rc::new(FrameData {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        }))
    }

    pub fn new(parent: &Frame) -> Self {
        Self(Rc::new(FrameData {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        }))
    }

    pub fn parent(&self) -> Option<&Frame> {
        self.0.parent.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.0.parent.is_none()
    }

    /// Walks up to the global frame.
    pub fn root_frame(&self) -> Frame {
        let mut frame = self;
        while let Some(parent) = frame.parent() {
            frame = parent;
        }
        frame.clone()
    }

    fn depth(&self) -> usize {
        let mut depth = 0;
        let mut frame = self;
        while let Some(parent) = frame.parent() {
            depth += 1;
            frame = parent;
        }
        depth
    }

    /// Inserts or overwrites a binding in this frame only.
    pub fn bind(&self, name: impl Into<Rc<str>>, value: Value) {
        self.0.bindings.borrow_mut().insert(name.into(), value);
    }

    pub fn lookup_local(&self, name: &str) -> Option<Value> {
        self.0.bindings.borrow().get(name).cloned()
    }

    /// Searches this frame and then its ancestors. The innermost binding wins.
    pub fn lookup(&self, name: &str) -> EvaluationResult {
        let mut frame = self;
        loop {
            if let Some(value) = frame.lookup_local(name) {
                return Ok(value)
            }
            match frame.parent() {
                Some(parent) => frame = parent,
                None => return Err(SchemeError::UnboundVariable(name.to_owned())),
            }
        }
    }

    /// Overwrites the nearest existing binding of `name`, which may live in an ancestor.
    /// Returns false when the name is bound nowhere in the chain; no binding is created then.
    pub fn set_bang(&self, name: &str, value: Value) -> bool {
        let mut frame = self;
        loop {
            if let Some(slot) = frame.0.bindings.borrow_mut().get_mut(name) {
                *slot = value;
                return true
            }
            match frame.parent() {
                Some(parent) => frame = parent,
                None => return false,
            }
        }
    }

    /// Drops every binding of this frame, breaking reference cycles through it.
    pub(crate) fn clear(&self) {
        self.0.bindings.borrow_mut().clear();
    }
}
