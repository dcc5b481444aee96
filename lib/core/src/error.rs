//! Error handling foundation for parley.
//!
//! Every crate owns its own error enum (tool, gateway, agent, chat, store)
//! and returns it wrapped in a rootcause [`Report`]. Lower layers are lifted
//! into higher ones with `.context()`, so the top-level kind is always the
//! report's current context while the original cause stays attached.

use rootcause::Report;

/// A Result whose error is a rootcause [`Report`] over the context `C`.
pub type Result<T, C> = std::result::Result<T, Report<C>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug, PartialEq, Eq)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "boom")
        }
    }

    impl std::error::Error for Boom {}

    fn explode() -> Result<(), Boom> {
        Err(Boom.into())
    }

    #[test]
    fn typed_context_is_preserved() {
        let err = explode().unwrap_err();
        assert_eq!(err.current_context(), &Boom);
    }
}
