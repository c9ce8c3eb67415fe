//! Bound variables, most recently bound first.

use alloc::vec::Vec;

/// A `Vec` that is iterated from the last to the first pushed element.
///
/// Binders are entered by pushing and left by popping,
/// so the innermost binder is always found first.
#[derive(Clone, Debug)]
pub struct Stack<A>(Vec<A>);

impl<A> Stack<A> {
    pub fn new() -> Self {
        Default::default()
    }

    /// Iterate through the elements of the stack starting from the top.
    pub fn iter(&self) -> impl Iterator<Item = &A> {
        self.0.iter().rev()
    }

    /// Position of the innermost element satisfying `f`, counted from the top.
    pub fn position(&self, f: impl Fn(&A) -> bool) -> Option<usize> {
        self.iter().position(f)
    }

    /// Push several elements, run a function, then pop the elements again.
    pub fn with_pushed<Y>(&mut self, xs: impl IntoIterator<Item = A>, f: impl FnOnce(&mut Self) -> Y) -> Y {
        let len = self.0.len();
        self.0.extend(xs);
        let y = f(self);
        self.0.truncate(len);
        y
    }
}

impl<A> Default for Stack<A> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

#[test]
fn innermost_first() {
    let mut stack = Stack::new();
    let pos = stack.with_pushed(["x"], |s| {
        let inner = s.with_pushed(["y", "x"], |s| s.position(|v| *v == "x"));
        (inner, s.position(|v| *v == "x"), s.position(|v| *v == "y"))
    });
    assert_eq!(pos, (Some(0), Some(0), None));
    assert_eq!(stack.iter().count(), 0);
}
