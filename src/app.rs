use std::sync::Arc;
use std::time::Duration;

use crate::environment::model::{Resource, ResourceKey};
use crate::environment::{Environment, Location, MemoryHistory, SearchConfig};
use crate::search::codec::active_filters;
use crate::search::Action;
use crate::store::Store;

const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

pub fn init_logging() {
    use env_logger::Env;
    use std::io::Write;
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{}:{} {} [{}] - {}",
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .try_init();
}

#[derive(Clone, Debug)]
pub struct RunOptions {
    pub config: SearchConfig,
    /// Initial location, e.g. `/search/?q=roads`
    pub location: Location,
    /// How many pages to load in total
    pub pages: u32,
    pub suggest: Option<String>,
    pub select: Option<ResourceKey>,
}

#[derive(Clone, Debug, Default)]
pub struct RunOutput {
    pub resources: Vec<Resource>,
    pub suggestions: Vec<String>,
    pub selected: Option<Resource>,
}

/// Drive one search session against the configured portal
pub async fn run(options: RunOptions) -> Result<RunOutput, String> {
    let history = MemoryHistory::new(options.location.clone());
    let environment = Environment::http(options.config.clone(), Arc::new(history.clone()));
    let mut store = Store::new(environment);
    session(&mut store, &history, &options).await
}

pub async fn session(
    store: &mut Store,
    history: &MemoryHistory,
    options: &RunOptions,
) -> Result<RunOutput, String> {
    store.send(Action::LocationChanged(history.initial_change()));
    settle(store, |s| !s.loading).await?;
    check_error(store)?;

    for _ in 1..options.pages {
        if !store.state().is_next_page_available {
            break;
        }
        let loaded = store.state().resources.len();
        store.send(Action::LoadNextPage);
        settle(store, |s| !s.loading && s.resources.len() != loaded).await?;
        check_error(store)?;
    }

    if let Some(text) = &options.suggest {
        store.send(Action::FetchSuggestions(text.clone()));
        store.step().await;
        settle(store, |s| !s.loading_suggestions).await?;
        check_error(store)?;
    }

    if let Some(pk) = &options.select {
        store.send(Action::RequestResource(Some(pk.clone())));
        settle(store, |s| s.selected.is_some() || s.error.is_some()).await?;
        check_error(store)?;
        if let Some(resource) = &store.state().selected {
            log::info!("Selected {} ({})", resource.pk, resource.kind().unwrap_or("unknown"));
        }
    }

    let state = store.state();
    log::info!(
        "Loaded {} resources for {}",
        state.resources.len(),
        state.location.href()
    );
    log::debug!("Active filters: {:?}", active_filters(&state.params));
    Ok(RunOutput {
        resources: state.resources.iter().cloned().collect(),
        suggestions: state.suggestions.clone(),
        selected: state.selected.clone(),
    })
}

async fn settle(
    store: &mut Store,
    done: impl Fn(&crate::search::State) -> bool,
) -> Result<(), String> {
    tokio::time::timeout(SETTLE_TIMEOUT, store.run_until(|s| done(s) || s.error.is_some()))
        .await
        .map_err(|_| format!("No response within {}s", SETTLE_TIMEOUT.as_secs()))
}

fn check_error(store: &Store) -> Result<(), String> {
    match &store.state().error {
        Some(e) => Err(e.clone()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::mock::MockResourceApi;

    fn options(location: &str) -> RunOptions {
        RunOptions {
            config: SearchConfig {
                page_size: 10,
                ..Default::default()
            },
            location: Location::parse(location),
            pages: 3,
            suggest: Some("ri".to_string()),
            select: Some(ResourceKey::from(40)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn session_loads_pages_suggestions_and_selection() {
        let api = Arc::new(MockResourceApi::numbered(45).with_suggestions(&["rivers", "roads"]));
        let options = options("/search/?q=resource");
        let history = MemoryHistory::new(options.location.clone());
        let environment = Environment::new(api.clone(), Arc::new(history.clone()), options.config.clone());
        let mut store = Store::new(environment);

        let output = session(&mut store, &history, &options).await.unwrap();
        assert_eq!(output.resources.len(), 30);
        assert_eq!(output.suggestions, vec!["rivers".to_string()]);
        assert_eq!(output.selected.unwrap().pk, ResourceKey::from(40));
        assert_eq!(api.search_calls(), 3);
        assert_eq!(api.lookup_calls(), 1);
        assert_eq!(history.depth(), 1);
    }

    #[tokio::test]
    async fn session_reports_api_errors() {
        let api = Arc::new(MockResourceApi::numbered(5));
        api.fail_next_search(crate::environment::model::ApiError::Network("offline".into()));
        let options = options("/search/");
        let history = MemoryHistory::new(options.location.clone());
        let environment = Environment::new(api, Arc::new(history.clone()), options.config.clone());
        let mut store = Store::new(environment);

        let result = session(&mut store, &history, &options).await;
        assert_eq!(result.unwrap_err(), "Network Error: offline");
    }
}
