use im::Vector;

use super::codec::{merge_update, with_page, SearchParams, PAGE_KEY};
use super::orchestrator::{plan_fetch, FetchRequest, PlanInput};
use super::reconciler::{reconcile, Reconciliation};
use crate::effect::{Debouncer, Effect};
use crate::environment::model::{ApiError, Resource, ResourceKey, SearchPage};
use crate::environment::{Environment, Location, LocationChange};
use crate::routes::Route;

#[derive(Clone, Debug, Default)]
pub struct State {
    /// Params of the last applied search, including `page`
    pub params: SearchParams,
    pub resources: Vector<Resource>,
    pub is_next_page_available: bool,
    pub loading: bool,
    pub loading_suggestions: bool,
    pub suggestions: Vec<String>,
    pub selected: Option<Resource>,
    /// Location search of the last applied search
    pub location_search: String,
    pub location_pathname: String,
    /// Set by an in-place update, cleared by every location change
    pub next_params: Option<SearchParams>,
    /// Mirror of the navigation host
    pub location: Location,
    pub error: Option<String>,

    resources_request: u64,
    suggestions_request: u64,
    selection_request: u64,
    suggestions_debounce: Option<Debouncer>,
}

impl State {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            ..Default::default()
        }
    }

    pub fn current_page(&self) -> u32 {
        self.params
            .get(PAGE_KEY)
            .and_then(super::codec::parse_page)
            .unwrap_or(1)
    }

    fn plan_input(&self) -> PlanInput<'_> {
        PlanInput {
            params: &self.params,
            location_search: &self.location_search,
            next_params: self.next_params.as_ref(),
            loaded_resources: self.resources.len(),
        }
    }
}

#[derive(Clone)]
pub enum Action {
    /// Request a search, navigating if the query changed
    SearchResources {
        pathname: Option<String>,
        params: SearchParams,
    },
    /// Merge `params` into the current search and request it
    UpdateSearch {
        pathname: Option<String>,
        params: SearchParams,
    },
    LoadNextPage,
    LocationChanged(LocationChange),
    UpdateResourcesRequest {
        params: SearchParams,
        location: Location,
    },
    LoadedResources {
        request: u64,
        fetch: FetchRequest,
        result: Result<SearchPage, ApiError>,
    },

    FetchSuggestions(String),
    RequestSuggestions {
        request: u64,
        text: String,
    },
    LoadedSuggestions {
        request: u64,
        result: Result<Vec<String>, ApiError>,
    },

    RequestResource(Option<ResourceKey>),
    LoadedResource {
        request: u64,
        result: Result<Resource, ApiError>,
    },
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SearchResources { pathname, params } => f
                .debug_struct("SearchResources")
                .field("pathname", pathname)
                .field("params", params)
                .finish(),
            Self::UpdateSearch { pathname, params } => f
                .debug_struct("UpdateSearch")
                .field("pathname", pathname)
                .field("params", params)
                .finish(),
            Self::LoadNextPage => write!(f, "LoadNextPage"),
            Self::LocationChanged(arg0) => f.debug_tuple("LocationChanged").field(arg0).finish(),
            Self::UpdateResourcesRequest { params, .. } => f
                .debug_struct("UpdateResourcesRequest")
                .field("params", params)
                .finish(),
            Self::LoadedResources { request, result, .. } => f
                .debug_struct("LoadedResources")
                .field("request", request)
                .field("ok", &result.is_ok())
                .finish(),
            Self::FetchSuggestions(arg0) => f.debug_tuple("FetchSuggestions").field(arg0).finish(),
            Self::RequestSuggestions { request, text } => f
                .debug_struct("RequestSuggestions")
                .field("request", request)
                .field("text", text)
                .finish(),
            Self::LoadedSuggestions { request, .. } => f
                .debug_struct("LoadedSuggestions")
                .field("request", request)
                .finish(),
            Self::RequestResource(arg0) => f.debug_tuple("RequestResource").field(arg0).finish(),
            Self::LoadedResource { request, .. } => f
                .debug_struct("LoadedResource")
                .field("request", request)
                .finish(),
        }
    }
}

pub fn reduce(action: Action, state: &mut State, environment: &Environment) -> Effect<Action> {
    log::trace!("{action:?}");
    let config = &environment.config;
    match action {
        Action::SearchResources { pathname, params } => {
            match reconcile(
                &state.params,
                &state.location,
                pathname.as_deref(),
                &params,
                &config.query_keys,
            ) {
                Reconciliation::Navigate(location) => {
                    let change = environment.navigation.push(location);
                    Effect::action(Action::LocationChanged(change))
                }
                Reconciliation::UpdateInPlace { params, location } => {
                    Effect::action(Action::UpdateResourcesRequest { params, location })
                }
                Reconciliation::NoOp => Effect::NONE,
            }
        }
        Action::UpdateSearch { pathname, params } => {
            let params = merge_update(&state.location.search, &state.params, &params);
            Effect::action(Action::SearchResources { pathname, params })
        }
        Action::LoadNextPage => {
            if state.loading || !state.is_next_page_available {
                return Effect::NONE;
            }
            let params = with_page(&state.params, state.current_page() + 1);
            Effect::action(Action::SearchResources {
                pathname: None,
                params,
            })
        }
        Action::LocationChanged(change) => {
            log::debug!("{} {}", change.action, change.location.href());
            state.location = change.location.clone();
            if !change.triggers_search() {
                return Effect::NONE;
            }
            state.next_params = None;
            let select = match Route::matching(&change.location.pathname) {
                Some(Route::Detail { pk, .. }) => {
                    Effect::action(Action::RequestResource(Some(pk)))
                }
                _ => Effect::NONE,
            };
            let fetch = search_resources(
                state,
                environment,
                &change.location,
                change.is_first_rendering,
            );
            Effect::merge2(fetch, select)
        }
        Action::UpdateResourcesRequest { params, location } => {
            state.next_params = Some(params);
            search_resources(state, environment, &location, false)
        }
        Action::LoadedResources {
            request,
            fetch,
            result,
        } => {
            if request != state.resources_request {
                log::debug!("Dropping stale resources response {request}");
                return Effect::NONE;
            }
            state.loading = false;
            match result {
                Ok(page) => {
                    if fetch.reset {
                        state.resources = page.resources.into_iter().collect();
                    } else {
                        state.resources.extend(page.resources);
                    }
                    state.is_next_page_available = page.is_next_page_available;
                    state.params = fetch.params;
                    state.location_search = fetch.location.search;
                    state.location_pathname = fetch.location.pathname;
                    state.error = None;
                }
                Err(e) => {
                    log::error!("Could not load resources: {e}");
                    state.error = Some(e.to_string());
                }
            }
            Effect::NONE
        }
        Action::FetchSuggestions(text) => {
            if let Some(e) = state.suggestions_debounce.as_ref() {
                e.cancel()
            }
            state.suggestions_request += 1;
            let debouncer = Debouncer::default();
            state.suggestions_debounce = Some(debouncer.clone());
            Effect::debounce(
                Action::RequestSuggestions {
                    request: state.suggestions_request,
                    text,
                },
                config.suggestion_debounce(),
                debouncer,
            )
        }
        Action::RequestSuggestions { request, text } => {
            if request != state.suggestions_request {
                return Effect::NONE;
            }
            state.suggestions_debounce = None;
            state.loading_suggestions = true;
            let api = environment.api.clone();
            Effect::future(
                async move { api.autocomplete(&text).await },
                move |result| Action::LoadedSuggestions { request, result },
            )
        }
        Action::LoadedSuggestions { request, result } => {
            if request != state.suggestions_request {
                return Effect::NONE;
            }
            state.loading_suggestions = false;
            match result {
                Ok(suggestions) => state.suggestions = suggestions,
                Err(e) => {
                    log::error!("Could not load suggestions: {e}");
                    state.error = Some(e.to_string());
                }
            }
            Effect::NONE
        }
        Action::RequestResource(pk) => {
            state.selection_request += 1;
            let Some(pk) = pk else {
                state.selected = None;
                return Effect::NONE;
            };
            if let Some(resource) = state.resources.iter().find(|r| r.pk == pk) {
                state.selected = Some(resource.clone());
                return Effect::NONE;
            }
            let request = state.selection_request;
            let api = environment.api.clone();
            Effect::future(
                async move { api.get_by_key(&pk).await },
                move |result| Action::LoadedResource { request, result },
            )
        }
        Action::LoadedResource { request, result } => {
            if request != state.selection_request {
                return Effect::NONE;
            }
            match result {
                Ok(resource) => state.selected = Some(resource),
                Err(e) => {
                    log::error!("Could not load resource: {e}");
                    state.selected = None;
                    state.error = Some(e.to_string());
                }
            }
            Effect::NONE
        }
    }
}

/// Plan and start a resources request. Any request still in flight is superseded,
/// even when no new request is needed.
fn search_resources(
    state: &mut State,
    environment: &Environment,
    location: &Location,
    is_first_rendering: bool,
) -> Effect<Action> {
    let config = &environment.config;
    state.resources_request += 1;
    let Some(fetch) = plan_fetch(
        state.plan_input(),
        location,
        is_first_rendering,
        config.page_size,
        &config.query_keys,
    ) else {
        state.loading = false;
        return Effect::NONE;
    };

    state.suggestions = Vec::new();
    state.loading = true;
    let request = state.resources_request;
    let api = environment.api.clone();
    let page_size = config.page_size;
    let params = fetch.params.clone();
    Effect::future(
        async move { api.search(&params, page_size).await },
        move |result| Action::LoadedResources {
            request,
            fetch,
            result,
        },
    )
}
