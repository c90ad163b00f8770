//! gurukul-providers — Backends for the gurukul collaborator traits.
//!
//! Implements `DocumentStore` over the Firestore REST API and
//! `TextGenerator` over the Gemini API, plus a mock generator and the
//! TOML configuration that selects between them.

pub mod config;
pub mod error;
pub mod firestore;
pub mod gemini;
pub mod mock;

pub use config::{
    create_generator, create_store, load_config, load_config_from, GeneratorConfig, GurukulConfig,
    StoreConfig, StoreHandle,
};
pub use error::ProviderError;
