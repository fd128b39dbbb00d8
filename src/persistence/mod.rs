// Persistence - pattern and theme in a key-value store

pub mod pattern;
pub mod store;
pub mod theme;

pub use pattern::{PATTERN_KEY, PersistedPattern, load_pattern, save_pattern};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use theme::{THEME_KEY, Theme, load_theme, save_theme};
