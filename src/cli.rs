use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use futures::StreamExt;
use std::path::PathBuf;

use crate::api::{Character, CharacterQuery, CharacterSource};
use crate::paging::LoadResult;
use crate::repository::CharacterRepository;
use crate::store::RecordStore;

#[derive(Parser, Debug)]
#[command(name = "rmdex")]
#[command(about = "Browse the Rick and Morty character catalog from the terminal")]
#[command(version)]
pub struct Args {
  /// Path to config file (default: ./rmdex.yaml or $XDG_CONFIG_HOME/rmdex/config.yaml)
  #[arg(short, long)]
  pub config: Option<PathBuf>,

  /// API base URL, overriding config and RMDEX_BASE_URL
  #[arg(long)]
  pub base_url: Option<String>,

  #[command(subcommand)]
  pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
  /// Interactive browser (default)
  Browse,
  /// Print characters matching the filters
  List {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    species: Option<String>,
    #[arg(long)]
    gender: Option<String>,
    /// Number of pages to fetch
    #[arg(long, default_value_t = 1)]
    pages: usize,
    /// Read the local cache instead of the API
    #[arg(long)]
    offline: bool,
  },
  /// Print one character
  Show {
    id: i64,
    /// Fetch from the API instead of the local cache
    #[arg(long)]
    refresh: bool,
  },
  /// Delete every cached character
  ClearCache,
}

pub async fn list<R: CharacterSource, S: RecordStore>(
  repository: &CharacterRepository<R, S>,
  query: CharacterQuery,
  pages: usize,
  offline: bool,
) -> Result<()> {
  if offline {
    for character in repository.cached(&query)? {
      println!("{}", row(&character));
    }
    return Ok(());
  }

  let mut stream = std::pin::pin!(repository.page_stream(query).take(pages));
  let mut printed = 0usize;
  while let Some(result) = stream.next().await {
    match result {
      LoadResult::Page { data, .. } => {
        for character in &data {
          println!("{}", row(character));
        }
        printed += data.len();
      }
      LoadResult::Error(err) => return Err(eyre!("{}", err)),
    }
  }
  if printed == 0 {
    println!("No characters match.");
  }
  Ok(())
}

pub async fn show<R: CharacterSource, S: RecordStore>(
  repository: &CharacterRepository<R, S>,
  id: i64,
  refresh: bool,
) -> Result<()> {
  let found = if refresh {
    repository.refresh_by_id(id).await?
  } else {
    repository.by_id(id)?
  };

  match found {
    Some(character) => print!("{}", detail(&character)),
    None if refresh => println!("Character {} does not exist.", id),
    None => println!("Character {} is not cached. Try --refresh.", id),
  }
  Ok(())
}

pub fn clear_cache<R: CharacterSource, S: RecordStore>(
  repository: &CharacterRepository<R, S>,
) -> Result<()> {
  let removed = repository.clear_cache()?;
  println!("Removed {} cached characters.", removed);
  Ok(())
}

fn row(character: &Character) -> String {
  format!(
    "{:>4}  {:<30} {:<8} {:<16} {}",
    character.id, character.name, character.status, character.species, character.gender
  )
}

fn detail(character: &Character) -> String {
  let kind = if character.kind.is_empty() {
    "-"
  } else {
    character.kind.as_str()
  };
  format!(
    "#{} {}\n  status:   {}\n  species:  {}\n  type:     {}\n  gender:   {}\n  origin:   {}\n  location: {}\n  episodes: {}\n  image:    {}\n",
    character.id,
    character.name,
    character.status,
    character.species,
    kind,
    character.gender,
    character.origin.name,
    character.location.name,
    character.episode.len(),
    character.image,
  )
}
