//! Suggestion pass flag
//!
//! Hosts evaluate node requirements both when executing a command and when
//! building completion lists. Guards that behave differently in those two
//! cases read [`is_suggestion_pass`], which the host sets for the duration of
//! a suggestion request via [`SuggestionPass::enter`].

use std::cell::Cell;
use std::marker::PhantomData;

thread_local! {
    static SUGGESTING: Cell<bool> = const { Cell::new(false) };
}

/// Returns true while the current thread is building suggestions
pub fn is_suggestion_pass() -> bool {
    SUGGESTING.with(Cell::get)
}

/// RAII guard marking the current thread as inside a suggestion pass
///
/// The previous state is restored on drop, so passes may nest.
pub struct SuggestionPass {
    previous: bool,
    // Tied to the thread whose flag it flipped
    _not_send: PhantomData<*const ()>,
}

impl SuggestionPass {
    pub fn enter() -> Self {
        let previous = SUGGESTING.with(|flag| flag.replace(true));
        Self {
            previous,
            _not_send: PhantomData,
        }
    }
}

impl Drop for SuggestionPass {
    fn drop(&mut self) {
        SUGGESTING.with(|flag| flag.set(self.previous));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_scoped() {
        assert!(!is_suggestion_pass());
        {
            let _pass = SuggestionPass::enter();
            assert!(is_suggestion_pass());
            {
                let _inner = SuggestionPass::enter();
                assert!(is_suggestion_pass());
            }
            assert!(is_suggestion_pass());
        }
        assert!(!is_suggestion_pass());
    }

    #[test]
    fn test_flag_is_thread_local() {
        let _pass = SuggestionPass::enter();
        let other = std::thread::spawn(is_suggestion_pass).join().unwrap();
        assert!(!other);
        assert!(is_suggestion_pass());
    }
}
