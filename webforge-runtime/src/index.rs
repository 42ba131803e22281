//! Route index (§4.5): four fixed-bucket hash tables keyed by string,
//! built once at `Site` load and owned by [`crate::context::RuntimeContext`].
//!
//! Lookup of a concrete URL first attempts an exact-string match, falling
//! back to a linear scan that tries each registered pattern's segment-wise
//! match (§4.12) — the table holds only exact keys, so parameterized routes
//! can't be bucketed by their literal text.

use webforge_core::ast::{ApiEndpoint, HttpMethod, Layout, NamedQuery, NamedScript, NamedTransform, Page, Site};
use webforge_core::index::BucketMap;
use webforge_core::route_pattern::{match_route, RouteParams};

pub struct RouteIndex {
    pages: BucketMap<Page>,
    layouts: BucketMap<Layout>,
    apis: BucketMap<ApiEndpoint>,
    queries: BucketMap<NamedQuery>,
    transforms: BucketMap<NamedTransform>,
    scripts: BucketMap<NamedScript>,
    /// Declaration order, preserved for the linear pattern-match fallback
    /// (§3 invariant: "last registration wins" is handled by `BucketMap`
    /// insertion order, not this list — this list exists only so the
    /// pattern scan has something to iterate).
    page_routes: Vec<String>,
    api_keys: Vec<(String, HttpMethod)>,
}

fn api_key(route: &str, method: HttpMethod) -> String {
    format!("{}\0{}", method.as_str(), route)
}

impl RouteIndex {
    pub fn build(site: &Site) -> Self {
        let mut pages = BucketMap::new();
        let mut page_routes = Vec::new();
        for page in &site.pages {
            if !page_routes.contains(&page.route) {
                page_routes.push(page.route.clone());
            }
            pages.insert(page.route.clone(), page.clone());
        }

        let mut layouts = BucketMap::new();
        for layout in &site.layouts {
            layouts.insert(layout.id.clone(), layout.clone());
        }

        let mut apis = BucketMap::new();
        let mut api_keys = Vec::new();
        for api in &site.apis {
            let key = api_key(&api.route, api.method);
            if !api_keys.iter().any(|(r, m)| r == &api.route && *m == api.method) {
                api_keys.push((api.route.clone(), api.method));
            }
            apis.insert(key, api.clone());
        }

        let mut queries = BucketMap::new();
        for q in &site.queries {
            queries.insert(q.name.clone(), q.clone());
        }

        let mut transforms = BucketMap::new();
        for t in &site.transforms {
            transforms.insert(t.name.clone(), t.clone());
        }

        let mut scripts = BucketMap::new();
        for s in &site.scripts {
            scripts.insert(s.name.clone(), s.clone());
        }

        Self {
            pages,
            layouts,
            apis,
            queries,
            transforms,
            scripts,
            page_routes,
            api_keys,
        }
    }

    pub fn layout(&self, id: &str) -> Option<&Layout> {
        self.layouts.get(id)
    }

    pub fn named_query(&self, name: &str) -> Option<&NamedQuery> {
        self.queries.get(name)
    }

    pub fn named_transform(&self, name: &str) -> Option<&NamedTransform> {
        self.transforms.get(name)
    }

    pub fn named_script(&self, name: &str) -> Option<&NamedScript> {
        self.scripts.get(name)
    }

    /// Resolve `url` against every registered page route, trying an exact
    /// match first and then the `:name`-segment pattern match (§4.5, §4.12).
    pub fn match_page(&self, url: &str, method: HttpMethod) -> Option<(&Page, RouteParams)> {
        if let Some(page) = self.pages.get(url) {
            if page.method == method {
                return Some((page, RouteParams::default()));
            }
        }
        for route in &self.page_routes {
            if route == url {
                continue; // already tried as an exact match above
            }
            if let Some(page) = self.pages.get(route) {
                if page.method != method {
                    continue;
                }
                if let Some(params) = match_route(route, url) {
                    return Some((page, params));
                }
            }
        }
        None
    }

    /// Like [`Self::match_page`] but ignores method, used to distinguish
    /// "route not found" (404) from "method mismatch" (405) at the page
    /// level when another method is registered for the same pattern.
    pub fn page_route_exists(&self, url: &str) -> bool {
        self.page_routes.iter().any(|route| match_route(route, url).is_some())
    }

    pub fn match_api(&self, url: &str, method: HttpMethod) -> Option<(&ApiEndpoint, RouteParams)> {
        let key = api_key(url, method);
        if let Some(api) = self.apis.get(&key) {
            return Some((api, RouteParams::default()));
        }
        for (route, api_method) in &self.api_keys {
            if *api_method != method {
                continue;
            }
            if let Some(params) = match_route(route, url) {
                let key = api_key(route, *api_method);
                if let Some(api) = self.apis.get(&key) {
                    return Some((api, params));
                }
            }
        }
        None
    }

    pub fn api_route_exists(&self, url: &str) -> bool {
        self.api_keys.iter().any(|(route, _)| match_route(route, url).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use webforge_core::ast::{HttpMethod, Page};

    fn site_with_pages(routes: &[(&str, HttpMethod)]) -> Site {
        let mut site = Site::default();
        for (route, method) in routes {
            let mut page = Page::new(*route, *route);
            page.method = *method;
            site.pages.push(page);
        }
        site
    }

    #[test]
    fn exact_match_wins_over_pattern_scan() {
        let site = site_with_pages(&[("/users/:id", HttpMethod::Get), ("/users/me", HttpMethod::Get)]);
        let index = RouteIndex::build(&site);
        let (page, params) = index.match_page("/users/me", HttpMethod::Get).unwrap();
        assert_eq!(page.route, "/users/me");
        assert!(params.is_empty());
    }

    #[test]
    fn falls_back_to_pattern_match_on_miss() {
        let site = site_with_pages(&[("/users/:id", HttpMethod::Get)]);
        let index = RouteIndex::build(&site);
        let (page, params) = index.match_page("/users/42", HttpMethod::Get).unwrap();
        assert_eq!(page.route, "/users/:id");
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn method_mismatch_is_distinguishable_from_not_found() {
        let site = site_with_pages(&[("/users", HttpMethod::Get)]);
        let index = RouteIndex::build(&site);
        assert!(index.match_page("/users", HttpMethod::Post).is_none());
        assert!(index.page_route_exists("/users"));
        assert!(!index.page_route_exists("/nowhere"));
    }

    #[test]
    fn last_registration_wins_for_duplicate_route_and_method() {
        let mut site = Site::default();
        let mut p1 = Page::new("a", "/x");
        p1.title = Some("first".into());
        let mut p2 = Page::new("b", "/x");
        p2.title = Some("second".into());
        site.pages.push(p1);
        site.pages.push(p2);
        let index = RouteIndex::build(&site);
        let (page, _) = index.match_page("/x", HttpMethod::Get).unwrap();
        assert_eq!(page.title.as_deref(), Some("second"));
    }
}
