//! List session state and operation outcomes

use crate::error::LoadError;

/// A failed page, kept so the renderer can show an error row and offer retry
#[derive(Debug, Clone, PartialEq)]
pub struct PageFailure {
    pub page: u32,
    pub error: LoadError,
}

/// Snapshot of one list session
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    /// Accumulated items, in the order pages arrived
    pub items: Vec<T>,
    /// Last page applied (or being fetched, while loading)
    pub current_page: u32,
    pub is_initial_loading: bool,
    pub is_loading_more: bool,
    pub has_more: bool,
    pub error: Option<PageFailure>,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            is_initial_loading: false,
            is_loading_more: false,
            has_more: true,
            error: None,
        }
    }
}

/// What a renderer should show for the list as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPhase {
    /// First page in flight, nothing to show yet
    Loading,
    /// Initial load failed; show the error with a retry affordance
    Error,
    /// Loaded, and the server has no items
    Empty,
    /// Items available (possibly with a footer spinner or error row)
    Ready,
}

impl<T> ListState<T> {
    /// Fresh session state with the first page in flight
    pub(crate) fn initial_loading() -> Self {
        Self {
            is_initial_loading: true,
            ..Self::default()
        }
    }

    /// Whether `load_next_page` would issue a request
    pub fn can_load_more(&self) -> bool {
        self.has_more && !self.is_loading_more && !self.is_initial_loading
    }

    pub fn is_loading(&self) -> bool {
        self.is_initial_loading || self.is_loading_more
    }

    pub fn phase(&self) -> ListPhase {
        if self.is_initial_loading {
            ListPhase::Loading
        } else if !self.items.is_empty() {
            ListPhase::Ready
        } else if self.error.is_some() {
            ListPhase::Error
        } else {
            ListPhase::Empty
        }
    }
}

/// Result of a loader operation.
///
/// Failures are already recorded in the session state; the outcome only
/// tells the caller what happened to this particular call.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// A page was fetched and applied
    Loaded {
        page: u32,
        received: usize,
        has_more: bool,
    },
    /// The fetch failed and the failure was applied
    Failed { page: u32, error: LoadError },
    /// Guard conditions were not met; no request was issued
    Skipped,
    /// The session was replaced while the fetch was in flight; result dropped
    Stale,
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, LoadOutcome::Skipped)
    }

    pub fn error(&self) -> Option<&LoadError> {
        match self {
            LoadOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = ListState::<u32>::default();
        assert_eq!(state.current_page, 1);
        assert!(state.has_more);
        assert!(state.can_load_more());
        assert_eq!(state.phase(), ListPhase::Empty);
    }

    #[test]
    fn test_initial_loading_blocks_more() {
        let state = ListState::<u32>::initial_loading();
        assert!(!state.can_load_more());
        assert!(state.is_loading());
        assert_eq!(state.phase(), ListPhase::Loading);
    }

    #[test]
    fn test_phase_with_error() {
        let state = ListState::<u32> {
            has_more: false,
            error: Some(PageFailure {
                page: 1,
                error: LoadError::network("offline"),
            }),
            ..ListState::default()
        };
        assert_eq!(state.phase(), ListPhase::Error);

        let state = ListState {
            items: vec![1, 2],
            ..state
        };
        assert_eq!(state.phase(), ListPhase::Ready);
    }
}
