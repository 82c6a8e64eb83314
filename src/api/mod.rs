//! Remote character API: wire types, domain types and the HTTP client.

pub mod api_types;
mod cache;
pub mod client;
pub mod types;

pub use api_types::{ApiCharacterPage, PageInfo};
pub use client::{ApiClient, CharacterSource, FetchError, RemoteResponse};
pub use types::{Character, CharacterQuery, Place, Status};
