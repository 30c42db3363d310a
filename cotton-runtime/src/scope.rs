// Lexical scope chain. Frames live in a stack; each frame links to the
// caller frame (`prev`) and to the outermost frame of its lexical region
// (`master`). The global frame is its own master.

use crate::heap::ObjRef;
use cotton_ast::NameId;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Frame {
    pub variables: HashMap<NameId, ObjRef>,
    /// Positional arguments of the call that installed this frame; read by
    /// the `argc`/`argv`/`argg` builtins.
    pub arguments: Vec<ObjRef>,
    pub prev: Option<usize>,
    pub master: usize,
    pub can_access_prev: bool,
    pub is_function_call: bool,
}

#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<Frame>,
}

impl ScopeStack {
    /// Starts with the global frame, which is its own master.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame {
                can_access_prev: false,
                master: 0,
                ..Frame::default()
            }],
        }
    }

    pub fn current(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn frame(&self, idx: usize) -> &Frame {
        &self.frames[idx]
    }

    pub fn frame_mut(&mut self, idx: usize) -> &mut Frame {
        &mut self.frames[idx]
    }

    pub fn current_frame(&self) -> &Frame {
        self.frames.last().expect("scope stack never empty")
    }

    pub fn current_frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("scope stack never empty")
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Pushes a block frame chained to the current one.
    pub fn push(&mut self, can_access_prev: bool) {
        let cur = self.current();
        let master = self.frames[cur].master;
        self.frames.push(Frame {
            prev: Some(cur),
            master,
            can_access_prev,
            ..Frame::default()
        });
    }

    /// Pushes a function-call frame: sealed off from the caller, falling
    /// back to the master (global) frame on lookup.
    pub fn push_call(&mut self, arguments: Vec<ObjRef>) {
        let cur = self.current();
        let master = self.frames[cur].master;
        self.frames.push(Frame {
            prev: Some(cur),
            master,
            can_access_prev: false,
            is_function_call: true,
            arguments,
            ..Frame::default()
        });
    }

    /// Pops the topmost frame. The global frame is never popped.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Truncates back to the global frame; used when an error unwinds the
    /// whole evaluation.
    pub fn reset(&mut self) {
        self.frames.truncate(1);
    }

    /// The frame in which lookup of `id` would succeed, following the
    /// chain: current frame, then `prev` while allowed, with a single jump
    /// to the master frame once the chain refuses to pass through.
    pub fn frame_of(&self, id: NameId) -> Option<usize> {
        let mut s = self.current();
        loop {
            let frame = &self.frames[s];
            if frame.variables.contains_key(&id) {
                return Some(s);
            }
            if frame.can_access_prev {
                s = frame.prev?;
            } else if s == frame.master {
                return None;
            } else {
                s = frame.master;
            }
        }
    }

    pub fn get(&self, id: NameId) -> Option<ObjRef> {
        self.frame_of(id)
            .and_then(|idx| self.frames[idx].variables.get(&id).copied())
    }

    pub fn query(&self, id: NameId) -> bool {
        self.frame_of(id).is_some()
    }

    /// Binds `id` in the current frame; shadowing outer bindings.
    pub fn add_variable(&mut self, id: NameId, obj: ObjRef) {
        self.current_frame_mut().variables.insert(id, obj);
    }

    /// Removes `id` from the current frame only.
    pub fn remove_variable(&mut self, id: NameId) {
        self.current_frame_mut().variables.remove(&id);
    }

    /// Nearest enclosing function-call frame, starting at the current one.
    pub fn nearest_call_frame(&self) -> Option<usize> {
        let mut s = Some(self.current());
        while let Some(idx) = s {
            if self.frames[idx].is_function_call {
                return Some(idx);
            }
            s = self.frames[idx].prev;
        }
        None
    }

    /// Names visible from the current frame, for unresolved-name hints.
    pub fn visible_names(&self) -> Vec<NameId> {
        let mut out = Vec::new();
        let mut s = self.current();
        loop {
            let frame = &self.frames[s];
            out.extend(frame.variables.keys().copied());
            if frame.can_access_prev {
                match frame.prev {
                    Some(p) => s = p,
                    None => break,
                }
            } else if s == frame.master {
                break;
            } else {
                s = frame.master;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heap::ObjRef;

    fn obj(n: u32) -> ObjRef {
        ObjRef { idx: n, gen: 0 }
    }

    #[test]
    fn test_block_frame_sees_outer() {
        let mut scopes = ScopeStack::new();
        let x = NameId(1);
        scopes.add_variable(x, obj(10));
        scopes.push(true);
        assert_eq!(scopes.get(x), Some(obj(10)));
        scopes.pop();
    }

    #[test]
    fn test_call_frame_skips_caller_falls_to_master() {
        let mut scopes = ScopeStack::new();
        let global = NameId(1);
        let local = NameId(2);
        scopes.add_variable(global, obj(1));

        // caller block with a local the callee must not see
        scopes.push(true);
        scopes.add_variable(local, obj(2));

        scopes.push_call(vec![]);
        assert_eq!(scopes.get(global), Some(obj(1)));
        assert_eq!(scopes.get(local), None);

        // unlocking the call frame exposes the caller chain
        let call = scopes.nearest_call_frame().unwrap();
        scopes.frame_mut(call).can_access_prev = true;
        assert_eq!(scopes.get(local), Some(obj(2)));
    }

    #[test]
    fn test_shadowing_and_removal() {
        let mut scopes = ScopeStack::new();
        let x = NameId(1);
        scopes.add_variable(x, obj(1));
        scopes.push(true);
        scopes.add_variable(x, obj(2));
        assert_eq!(scopes.get(x), Some(obj(2)));
        scopes.remove_variable(x);
        assert_eq!(scopes.get(x), Some(obj(1)));
    }
}
