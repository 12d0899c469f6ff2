use core::fmt::Display;

use crate::error::DecodeError;
use crate::info::Type;

#[cfg(all(debug_assertions, feature = "debug"))]
std::thread_local! {
    static TYPE_INFO_STACK: core::cell::RefCell<crate::serde::TypeStack> =
        const { core::cell::RefCell::new(crate::serde::TypeStack::new()) };
}

/// Records that `ty` is being decoded, for error messages.
#[inline]
pub(super) fn enter(ty: &Type) {
    #[cfg(all(debug_assertions, feature = "debug"))]
    TYPE_INFO_STACK.with_borrow_mut(|stack| stack.push(*ty));
    #[cfg(not(all(debug_assertions, feature = "debug")))]
    let _ = ty;
}

#[inline]
pub(super) fn leave() {
    #[cfg(all(debug_assertions, feature = "debug"))]
    TYPE_INFO_STACK.with_borrow_mut(|stack| stack.pop());
}

/// Builds a [`DecodeError::Custom`], adding the stack of types being decoded
/// when the `debug` feature is enabled.
#[inline]
pub(super) fn make_custom_error(msg: impl Display) -> DecodeError {
    #[cfg(all(debug_assertions, feature = "debug"))]
    {
        TYPE_INFO_STACK
            .with_borrow(|stack| DecodeError::Custom(format!("{msg} (stack: {stack:?})")))
    }
    #[cfg(not(all(debug_assertions, feature = "debug")))]
    {
        DecodeError::Custom(msg.to_string())
    }
}
