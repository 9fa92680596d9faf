use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::cli::Command;
use crate::filter::Filter;
use crate::i18n::{self, Translator};
use crate::notify::Notifier;
use crate::render::Renderer;
use crate::storage::Storage;
use crate::store::{Outcome, TaskStore};

#[instrument(skip(store, translator, renderer, notifier, command))]
pub fn dispatch<S: Storage>(
    store: &mut TaskStore<S>,
    translator: &mut Translator,
    renderer: &mut Renderer,
    notifier: &mut dyn Notifier,
    command: Command,
) -> anyhow::Result<()> {
    let now = Utc::now();
    debug!(?command, "dispatching command");

    match command {
        Command::Add { text } => {
            info!("command add");
            let outcome = store.add(&text.join(" "), now)?;
            surface(store, translator, renderer, notifier, &outcome, Filter::All)
        }
        Command::Done { id } => {
            info!("command done");
            let outcome = store.toggle_complete(id)?;
            surface(store, translator, renderer, notifier, &outcome, Filter::All)
        }
        Command::Edit { id, text } => {
            info!("command edit");
            let outcome = store.edit(id, &text.join(" "))?;
            surface(store, translator, renderer, notifier, &outcome, Filter::All)
        }
        Command::Rm { id } => {
            info!("command rm");
            let outcome = store.delete(id)?;
            surface(store, translator, renderer, notifier, &outcome, Filter::All)
        }
        Command::Clear => {
            info!("command clear");
            let outcome = store.clear_completed()?;
            surface(store, translator, renderer, notifier, &outcome, Filter::All)
        }
        Command::List { filter, samples } => {
            info!("command list");
            if samples && store.tasks().is_empty() {
                let outcome = store.add_samples(now)?;
                surface(store, translator, renderer, notifier, &outcome, filter)
            } else {
                render_current(store, translator, renderer, filter)
            }
        }
        Command::Lang { code } => cmd_lang(store, translator, renderer, code),
    }
}

/// Celebration first, then the notice, then the redraw, mirroring the flow
/// of each user action in the original interface.
fn surface<S: Storage>(
    store: &TaskStore<S>,
    translator: &Translator,
    renderer: &mut Renderer,
    notifier: &mut dyn Notifier,
    outcome: &Outcome,
    filter: Filter,
) -> anyhow::Result<()> {
    if outcome.celebrate {
        renderer.celebrate()?;
    }
    if let Some(notice) = &outcome.notice {
        notifier.notify(&translator.resolve(notice.key), notice.severity);
    }
    render_current(store, translator, renderer, filter)
}

fn render_current<S: Storage>(
    store: &TaskStore<S>,
    translator: &Translator,
    renderer: &mut Renderer,
    filter: Filter,
) -> anyhow::Result<()> {
    let view = store.filtered_view(filter);
    let counts = store.counts(filter);
    renderer.print_list(&view, counts, store.tasks().is_empty(), translator)
}

#[instrument(skip(store, translator, renderer))]
fn cmd_lang<S: Storage>(
    store: &mut TaskStore<S>,
    translator: &mut Translator,
    renderer: &mut Renderer,
    code: Option<String>,
) -> anyhow::Result<()> {
    info!("command lang");

    let Some(code) = code else {
        println!("{}", i18n::selected_language(store.storage())?);
        return Ok(());
    };

    translator.load(&code, store.storage_mut())?;
    render_current(store, translator, renderer, Filter::All)
}
