//! Decides whether a location change or an in-place update needs a new
//! resources request and how it relates to what is already loaded.

use super::codec::{parse_params, with_page, SearchParams};
use crate::environment::Location;

const FIRST_PAGE: u32 = 1;

/// A resources request ready to be sent
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchRequest {
    /// Search params including `page`
    pub params: SearchParams,
    pub page: u32,
    /// Discard the loaded resources instead of appending
    pub reset: bool,
    pub location: Location,
}

/// The part of the search state a plan depends on
#[derive(Clone, Copy, Debug)]
pub struct PlanInput<'a> {
    pub params: &'a SearchParams,
    pub location_search: &'a str,
    pub next_params: Option<&'a SearchParams>,
    pub loaded_resources: usize,
}

pub fn plan_fetch(
    input: PlanInput<'_>,
    location: &Location,
    is_first_rendering: bool,
    page_size: u32,
    query_keys: &[String],
) -> Option<FetchRequest> {
    let (previous_params, previous_page) =
        parse_params(input.location_search, input.params, FIRST_PAGE, query_keys);

    let Some(next_params) = input.next_params else {
        // plain history navigation
        let (current_params, _) =
            parse_params(&location.search, &SearchParams::new(), FIRST_PAGE, query_keys);
        if !is_first_rendering && previous_params == current_params {
            log::debug!("Skipping search, {} is already loaded", location.href());
            return None;
        }
        return Some(FetchRequest {
            params: with_page(&current_params, FIRST_PAGE),
            page: FIRST_PAGE,
            reset: true,
            location: location.clone(),
        });
    };

    let (current_params, current_page) =
        parse_params(&location.search, next_params, FIRST_PAGE, query_keys);
    let loaded_pages = input.loaded_resources / page_size.max(1) as usize;
    let is_next_page =
        current_page == previous_page + 1 && current_page as usize == loaded_pages + 1;
    let reset = is_first_rendering || previous_params != current_params || !is_next_page;
    let page = if reset { FIRST_PAGE } else { current_page };

    Some(FetchRequest {
        params: with_page(&current_params, page),
        page,
        reset,
        location: location.clone(),
    })
}
