pub mod client;
pub mod device;
pub mod ops;
pub mod prefs;
pub mod types;

pub use client::BackendClient;
pub use device::{DeviceIdentity, HostnameIdentity, StaticIdentity};
pub use prefs::{JsonFilePreferences, MemoryPreferences, PreferenceStore, ACCOUNT_ID_KEY};
pub use types::Registration;
