use strum_macros::IntoStaticStr;

use crate::environment::model::ResourceKey;

pub const SEARCH_PATH: &str = "/search/";

/// Pages of the portal the search state reacts to
#[derive(Clone, Debug, Eq, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Route {
    #[strum(serialize = "homepage")]
    Home,
    #[strum(serialize = "resources")]
    Search,
    Detail {
        ctype: Option<String>,
        pk: ResourceKey,
    },
}

impl Route {
    /// Match `/`, `/search/`, `/detail/:pk` and `/detail/:ctype/:pk`
    pub fn matching(pathname: &str) -> Option<Route> {
        let segments: Vec<&str> = pathname.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Some(Route::Home),
            ["search"] => Some(Route::Search),
            ["detail", pk] => Some(Route::Detail {
                ctype: None,
                pk: ResourceKey::from(*pk),
            }),
            ["detail", ctype, pk] => Some(Route::Detail {
                ctype: Some(ctype.to_string()),
                pk: ResourceKey::from(*pk),
            }),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}
