pub mod cli;
pub mod commands;
pub mod config;
pub mod filter;
pub mod i18n;
pub mod notify;
pub mod render;
pub mod storage;
pub mod store;
pub mod task;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::info;

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);

    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting stint CLI");

    let mut cfg = config::Config::load(cli.config.as_deref())?;
    cfg.apply_overrides(cli.rc_overrides.into_iter().map(|kv| (kv.key, kv.value)));

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;
    let lang_dir = config::resolve_lang_dir(&cfg, &data_dir);

    let storage = storage::FileStorage::open(&data_dir)
        .with_context(|| format!("failed to open storage at {}", data_dir.display()))?;
    let mut store = store::TaskStore::open(storage)?;

    let mut translator = i18n::Translator::new(&lang_dir);
    translator.seed_catalogs()?;
    let language = i18n::selected_language(store.storage())?;
    translator.load(&language, store.storage_mut())?;

    let mut renderer = render::Renderer::new(&cfg)?;
    let mut notifier = notify::TermNotifier::new(cfg.get_bool("color").unwrap_or(true));

    let command = cli.command.unwrap_or_default();
    commands::dispatch(
        &mut store,
        &mut translator,
        &mut renderer,
        &mut notifier,
        command,
    )?;

    info!("done");
    Ok(())
}
