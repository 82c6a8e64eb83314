mod api;
mod app;
mod cli;
mod config;
mod event;
mod logging;
mod paging;
mod query;
mod repository;
mod store;
#[cfg(test)]
mod testing;
mod ui;
mod viewmodel;

use clap::Parser;
use color_eyre::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::api::{ApiClient, CharacterQuery};
use crate::cli::{Args, Command};
use crate::config::Config;
use crate::paging::PagingConfig;
use crate::repository::CharacterRepository;
use crate::store::SqliteStore;
use crate::ui::views::CharacterListView;
use crate::viewmodel::CharactersViewModel;

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut config = Config::load(args.config.as_deref())?;
  if let Some(base_url) = args.base_url {
    config.api.base_url = base_url;
  }

  let _log_guard = logging::init(&config.log, &Config::data_dir()?)?;
  info!(base_url = %config.api.base_url, "starting");

  // One store and one client for the whole process
  let store = Arc::new(SqliteStore::open(&config.cache_path()?)?);
  let client = Arc::new(ApiClient::new(&config)?);
  let api_url = client.base_url().to_string();
  let repository = CharacterRepository::new(
    client,
    store,
    PagingConfig::new(config.paging.page_size),
  );

  match args.command.unwrap_or(Command::Browse) {
    Command::Browse => {
      let vm = CharactersViewModel::new(repository, config.search.debounce());
      let root = Box::new(CharacterListView::new(vm));
      let mut app = app::App::new(root, api_url, Duration::from_millis(config.ui.tick_rate_ms));
      app.run().await?;
    }
    Command::List {
      name,
      status,
      species,
      gender,
      pages,
      offline,
    } => {
      let query = CharacterQuery::from_parts(name.as_deref().unwrap_or(""), status, species, gender);
      cli::list(&repository, query, pages, offline).await?;
    }
    Command::Show { id, refresh } => cli::show(&repository, id, refresh).await?,
    Command::ClearCache => cli::clear_cache(&repository)?,
  }

  Ok(())
}
