use super::codec::{clean_params, format_query, primary_query, SearchParams};
use crate::environment::Location;

/// What a requested search amounts to, compared with the current state
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Reconciliation {
    /// The search itself changed: move to a new location
    Navigate(Location),
    /// Same search, different secondary params (e.g. page): update without navigating
    UpdateInPlace {
        params: SearchParams,
        location: Location,
    },
    NoOp,
}

pub fn reconcile(
    current_params: &SearchParams,
    current_location: &Location,
    pathname: Option<&str>,
    requested: &SearchParams,
    query_keys: &[String],
) -> Reconciliation {
    let current_params = clean_params(current_params);
    let next_params = clean_params(requested);
    let current_query = primary_query(&current_params, query_keys);
    let next_query = primary_query(&next_params, query_keys);

    if current_query != next_query {
        let pathname = match pathname {
            Some(path) if !path.is_empty() && !current_location.pathname.contains(path) => path,
            _ => current_location.pathname.as_str(),
        };
        return Reconciliation::Navigate(Location::new(pathname, format_query(&next_query)));
    }

    if current_params != next_params {
        return Reconciliation::UpdateInPlace {
            params: next_params,
            location: current_location.clone(),
        };
    }

    Reconciliation::NoOp
}
