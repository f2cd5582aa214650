//! Property tests for pattern matching.

use http::Method;
use proptest::prelude::*;
use switchyard_router::{Pattern, RouteTable};

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,8}"
}

proptest! {
    #[test]
    fn literal_paths_match_themselves(segments in prop::collection::vec(segment(), 0..6)) {
        let path = format!("/{}", segments.join("/"));
        let pattern = Pattern::parse(&path).unwrap();
        let params = pattern.matches(&path);
        prop_assert!(params.is_some());
        prop_assert!(params.unwrap().is_empty());
    }

    #[test]
    fn captures_return_the_request_segment(prefix in segment(), value in segment()) {
        let pattern = Pattern::parse(&format!("/{prefix}/:value")).unwrap();
        let params = pattern.matches(&format!("/{prefix}/{value}")).unwrap();
        prop_assert_eq!(params.get("value"), Some(value.as_str()));
    }

    #[test]
    fn first_registration_is_yielded_first(count in 1usize..8) {
        let mut table = RouteTable::new();
        for index in 0..count {
            table.route(Method::GET, "/dup", index).unwrap();
        }
        let order: Vec<usize> = table.matches(&Method::GET, "/dup").map(|m| *m.handler).collect();
        prop_assert_eq!(order, (0..count).collect::<Vec<_>>());
    }
}
