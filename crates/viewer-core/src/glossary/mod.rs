mod cache;
mod debounce;
mod panel;
mod slots;

pub use cache::{CacheKey, GlossaryCache, Resolution};
pub use debounce::{DebounceKey, Debouncer};
pub use panel::{GlossaryPanel, NO_TERMS};
