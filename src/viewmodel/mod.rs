//! Screen state: observable cells, debounced queries and keyword filters.

mod characters;
mod debounce;
mod detail;
pub mod keywords;
mod state_cell;

pub use characters::CharactersViewModel;
pub use detail::CharacterDetailViewModel;
