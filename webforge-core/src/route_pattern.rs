//! Route pattern matching and parameter extraction (§4.12).
//!
//! `/users/:id/posts/:postId` matched against `/users/7/posts/42` binds
//! `id="7"`, `postId="42"`. Parameter bindings are written into a fixed
//! 8-slot array; a pattern needing a ninth parameter fails to match rather
//! than growing — this mirrors the original's fixed-size binding buffer
//! exactly (§4.12: "more than 8 parameters is an overflow condition and
//! the match fails").

pub const MAX_ROUTE_PARAMS: usize = 8;

/// Parameter bindings extracted from a matched route, as `(name, value)`
/// pairs in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    slots: [Option<(String, String)>; MAX_ROUTE_PARAMS],
    len: usize,
}

impl RouteParams {
    fn push(&mut self, name: &str, value: &str) -> bool {
        if self.len >= MAX_ROUTE_PARAMS {
            return false;
        }
        self.slots[self.len] = Some((name.to_string(), value.to_string()));
        self.len += 1;
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.slots[..self.len]
            .iter()
            .flatten()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.slots[..self.len]
            .iter()
            .flatten()
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Match a route pattern (e.g. `/users/:id`) against a concrete URL path,
/// extracting `:name` bindings. Returns `None` on any literal-segment
/// mismatch, a segment-count mismatch, or a parameter-count overflow.
pub fn match_route(pattern: &str, url: &str) -> Option<RouteParams> {
    let pattern_segments: Vec<&str> = split_segments(pattern);
    let url_segments: Vec<&str> = split_segments(url);

    if pattern_segments.len() != url_segments.len() {
        return None;
    }

    let mut params = RouteParams::default();
    for (pat_seg, url_seg) in pattern_segments.iter().zip(url_segments.iter()) {
        if let Some(name) = pat_seg.strip_prefix(':') {
            if !params.push(name, url_seg) {
                return None;
            }
        } else if pat_seg != url_seg {
            return None;
        }
    }
    Some(params)
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_two_params() {
        let params = match_route("/a/:x/b/:y", "/a/1/b/2").unwrap();
        assert_eq!(params.get("x"), Some("1"));
        assert_eq!(params.get("y"), Some("2"));
    }

    #[test]
    fn differing_literal_segment_fails() {
        assert!(match_route("/a/:x/b/:y", "/a/1/c/2").is_none());
    }

    #[test]
    fn differing_segment_count_fails() {
        assert!(match_route("/a/:x", "/a/1/2").is_none());
    }

    #[test]
    fn no_params_requires_exact_match() {
        assert!(match_route("/health", "/health").is_some());
        assert!(match_route("/health", "/healthz").is_none());
    }

    #[test]
    fn nine_params_overflow_fails() {
        let pattern = "/p/:a/:b/:c/:d/:e/:f/:g/:h/:i";
        let url = "/p/1/2/3/4/5/6/7/8/9";
        assert!(match_route(pattern, url).is_none());
    }

    #[test]
    fn eight_params_is_exactly_at_the_limit() {
        let pattern = "/p/:a/:b/:c/:d/:e/:f/:g/:h";
        let url = "/p/1/2/3/4/5/6/7/8";
        let params = match_route(pattern, url).unwrap();
        assert_eq!(params.len(), 8);
        assert_eq!(params.get("h"), Some("8"));
    }
}
