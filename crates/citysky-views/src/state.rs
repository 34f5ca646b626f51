//! Per-view load state.
//!
//! `Idle -> Loading -> Ready | Error`, re-entrant: a new load can start
//! from `Ready` or `Error`.

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Ready(T),
    Error(String),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> ViewState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Enter `Loading`, dropping any previous data or error.
    pub fn begin(&mut self) {
        *self = Self::Loading;
    }

    /// Leave `Loading` with the outcome.
    pub fn settle(&mut self, outcome: Result<T, String>) {
        *self = match outcome {
            Ok(data) => Self::Ready(data),
            Err(message) => Self::Error(message),
        };
    }

    /// Return to `Idle`, e.g. after a cancelled load.
    pub fn reset(&mut self) {
        *self = Self::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let state: ViewState<u32> = ViewState::default();
        assert!(state.is_idle());
        assert_eq!(state.data(), None);
    }

    #[test]
    fn load_then_ready() {
        let mut state = ViewState::default();
        state.begin();
        assert!(state.is_loading());
        state.settle(Ok(7));
        assert_eq!(state.data(), Some(&7));
    }

    #[test]
    fn error_is_reentrant() {
        let mut state: ViewState<u32> = ViewState::Idle;
        state.begin();
        state.settle(Err("boom".into()));
        assert_eq!(state.error(), Some("boom"));

        state.begin();
        assert!(state.is_loading());
        assert_eq!(state.error(), None);
        state.settle(Ok(1));
        assert_eq!(state, ViewState::Ready(1));
    }

    #[test]
    fn ready_can_reload() {
        let mut state = ViewState::Ready(vec![1, 2]);
        if let Some(items) = state.data_mut() {
            items.retain(|i| *i != 1);
        }
        assert_eq!(state.data(), Some(&vec![2]));
        state.begin();
        assert_eq!(state.data(), None);
        state.reset();
        assert!(state.is_idle());
    }
}
