use std::sync::Arc;

use tokio::sync::Mutex;

use crate::indicator::state::IndicatorState;

/// Lock-guarded lamp state shared by one group's evaluator (writer) and
/// driver (reader).
///
/// Both critical sections are a single copy, so readers only ever see a
/// value some writer stored in full.
#[derive(Debug, Clone, Default)]
pub struct IndicatorCell {
    inner: Arc<Mutex<IndicatorState>>,
}

impl IndicatorCell {
    pub fn new(initial: IndicatorState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    pub async fn load(&self) -> IndicatorState {
        *self.inner.lock().await
    }

    /// Replace the target state, returning the one it replaced.
    pub async fn store(&self, state: IndicatorState) -> IndicatorState {
        std::mem::replace(&mut *self.inner.lock().await, state)
    }
}
