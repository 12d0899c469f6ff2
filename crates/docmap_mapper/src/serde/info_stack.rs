use core::fmt::{Debug, Formatter};
use core::slice::Iter;

use crate::info::Type;

/// The chain of types being decoded, used to locate errors in nested documents.
#[derive(Default, Clone)]
pub(super) struct TypeStack {
    stack: Vec<Type>,
}

impl TypeStack {
    pub const fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push(&mut self, ty: Type) {
        self.stack.push(ty);
    }

    pub fn pop(&mut self) {
        self.stack.pop();
    }

    pub fn iter(&self) -> Iter<'_, Type> {
        self.stack.iter()
    }
}

impl Debug for TypeStack {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut iter = self.iter();

        if let Some(first) = iter.next() {
            write!(f, "`{}`", first.path())?;
        }

        for ty in iter {
            write!(f, " -> `{}`", ty.path())?;
        }

        Ok(())
    }
}
