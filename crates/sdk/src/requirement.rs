//! Guard predicates attached to command tree nodes
//!
//! A host node carries a [`Requirement`] that decides whether a source may use
//! (and see) the node. Requirements are shared, immutable function objects:
//! composing a new guard means building a new `Requirement` around the old one
//! and handing it back to the host.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A guard predicate over a command source
pub trait Predicate<S>: Send + Sync + 'static {
    /// Returns true if `source` may use the guarded node
    fn test(&self, source: &S) -> bool;

    /// Access the concrete predicate for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// Adapter turning a closure into a [`Predicate`]
pub struct FnPredicate<F>(pub F);

impl<S, F> Predicate<S> for FnPredicate<F>
where
    S: 'static,
    F: Fn(&S) -> bool + Send + Sync + 'static,
{
    fn test(&self, source: &S) -> bool {
        (self.0)(source)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Shared guard predicate handle
pub struct Requirement<S> {
    predicate: Arc<dyn Predicate<S>>,
}

impl<S: 'static> Requirement<S> {
    /// Wrap a predicate
    pub fn new<P: Predicate<S>>(predicate: P) -> Self {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Wrap a closure
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        Self::new(FnPredicate(f))
    }

    /// Requirement that always passes (the host default for unguarded nodes)
    pub fn always() -> Self {
        Self::from_fn(|_| true)
    }

    /// Evaluate the requirement
    pub fn test(&self, source: &S) -> bool {
        self.predicate.test(source)
    }

    /// Borrow the underlying predicate as `T` if that is its concrete type
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.predicate.as_any().downcast_ref::<T>()
    }

    /// Returns true if both handles point at the same predicate
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.predicate, &other.predicate)
    }
}

impl<S> Clone for Requirement<S> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<S> fmt::Debug for Requirement<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requirement").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MinLevel(u8);

    impl Predicate<u8> for MinLevel {
        fn test(&self, source: &u8) -> bool {
            *source >= self.0
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_from_fn() {
        let req = Requirement::<u8>::from_fn(|level| *level >= 2);
        assert!(req.test(&2));
        assert!(!req.test(&1));
        assert!(Requirement::<u8>::always().test(&0));
    }

    #[test]
    fn test_downcast() {
        let req = Requirement::new(MinLevel(3));
        assert_eq!(req.downcast_ref::<MinLevel>().map(|m| m.0), Some(3));

        let plain = Requirement::<u8>::always();
        assert!(plain.downcast_ref::<MinLevel>().is_none());
    }

    #[test]
    fn test_clone_shares_predicate() {
        let req = Requirement::new(MinLevel(1));
        let copy = req.clone();
        assert!(req.ptr_eq(&copy));
        assert!(!req.ptr_eq(&Requirement::new(MinLevel(1))));
    }
}
