//! Exception-handler resolution.
//!
//! Handlers are consulted scope by scope (endpoint, then component, then
//! global). A handler applies when its target tag is the error's tag or an
//! ancestor of it.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::component::{BoxFuture, ExceptionHandler, ExceptionHandlerRef};
use crate::error::{tags, DispatchError, ErrorTag};
use crate::outcome::Outcome;

/// How a handler is picked among several applicable ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    /// The first applicable handler in declaration order.
    #[default]
    FirstMatch,
    /// Within the first scope that has an applicable handler, the one whose
    /// target is closest to the error's tag. Ties go to declaration order.
    MostSpecific,
}

/// Selects the handler for an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionResolver {
    policy: ResolutionPolicy,
}

impl ExceptionResolver {
    /// Creates a resolver with the given policy.
    #[must_use]
    pub const fn new(policy: ResolutionPolicy) -> Self {
        Self { policy }
    }

    /// Returns the policy.
    #[must_use]
    pub const fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Finds the handler for `error`. Earlier scopes take priority over
    /// later ones regardless of policy.
    #[must_use]
    pub fn resolve<'h>(
        &self,
        error: &DispatchError,
        scopes: &[&'h [ExceptionHandlerRef]],
    ) -> Option<&'h ExceptionHandlerRef> {
        let tag = error.tag();
        scopes.iter().copied().find_map(|scope| match self.policy {
            ResolutionPolicy::FirstMatch => scope.iter().find(|h| tag.is_a(h.target())),
            ResolutionPolicy::MostSpecific => scope
                .iter()
                .filter_map(|h| tag.distance_to(h.target()).map(|d| (d, h)))
                .min_by_key(|(distance, _)| *distance)
                .map(|(_, h)| h),
        })
    }
}

/// Renders validation failures as
/// `{code: 400, error: "Validation failed.", violations: [...]}`.
///
/// Installed in the global scope of every application.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationExceptionHandler;

crate::injectable!(ValidationExceptionHandler => Singleton);

impl ExceptionHandler for ValidationExceptionHandler {
    fn target() -> &'static ErrorTag {
        &tags::VALIDATION
    }

    fn handle(&self, error: DispatchError) -> BoxFuture<'_, Outcome> {
        let violations = error.violations().map(<[_]>::to_vec).unwrap_or_default();
        Box::pin(async move {
            Outcome::json(
                StatusCode::BAD_REQUEST,
                json!({
                    "code": 400,
                    "error": "Validation failed.",
                    "violations": violations,
                }),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Container;
    use crate::error::Violation;

    macro_rules! catcher {
        ($name:ident, $tag:expr) => {
            #[derive(Default)]
            struct $name;
            crate::injectable!($name);

            impl ExceptionHandler for $name {
                fn target() -> &'static ErrorTag {
                    $tag
                }

                fn handle(&self, _error: DispatchError) -> BoxFuture<'_, Outcome> {
                    Box::pin(async { Outcome::ok(json!(stringify!($name))) })
                }
            }
        };
    }

    catcher!(CatchAll, &tags::ERROR);
    catcher!(CatchHttp, &tags::HTTP_EXCEPTION);
    catcher!(CatchBadRequest, &tags::BAD_REQUEST);
    catcher!(CatchNotFound, &tags::NOT_FOUND);

    fn name(found: Option<&ExceptionHandlerRef>) -> Option<&'static str> {
        found.map(|h| h.name().rsplit("::").next().unwrap_or_default())
    }

    #[test]
    fn test_exact_and_ancestor_match() {
        let scope = [ExceptionHandlerRef::of::<CatchNotFound>()];
        let resolver = ExceptionResolver::default();

        assert_eq!(
            name(resolver.resolve(&DispatchError::not_found("x"), &[&scope[..]])),
            Some("CatchNotFound")
        );
        assert!(resolver
            .resolve(&DispatchError::bad_request("x"), &[&scope[..]])
            .is_none());

        let scope = [ExceptionHandlerRef::of::<CatchHttp>()];
        assert_eq!(
            name(resolver.resolve(&DispatchError::validation(vec![]), &[&scope[..]])),
            Some("CatchHttp")
        );
    }

    #[test]
    fn test_earlier_scope_wins() {
        let endpoint = [ExceptionHandlerRef::of::<CatchAll>()];
        let component = [ExceptionHandlerRef::of::<CatchNotFound>()];
        let resolver = ExceptionResolver::default();
        let error = DispatchError::not_found("x");

        assert_eq!(name(resolver.resolve(&error, &[&endpoint[..], &component[..]])), Some("CatchAll"));
        assert_eq!(
            name(resolver.resolve(&error, &[&component[..], &endpoint[..]])),
            Some("CatchNotFound")
        );
    }

    #[test]
    fn test_first_match_ignores_specificity() {
        let scope = [
            ExceptionHandlerRef::of::<CatchHttp>(),
            ExceptionHandlerRef::of::<CatchBadRequest>(),
        ];
        let error = DispatchError::validation(vec![]);

        let first = ExceptionResolver::new(ResolutionPolicy::FirstMatch);
        assert_eq!(name(first.resolve(&error, &[&scope[..]])), Some("CatchHttp"));

        let specific = ExceptionResolver::new(ResolutionPolicy::MostSpecific);
        assert_eq!(name(specific.resolve(&error, &[&scope[..]])), Some("CatchBadRequest"));
    }

    #[test]
    fn test_most_specific_keeps_scope_priority() {
        let endpoint = [ExceptionHandlerRef::of::<CatchAll>()];
        let component = [ExceptionHandlerRef::of::<CatchBadRequest>()];
        let resolver = ExceptionResolver::new(ResolutionPolicy::MostSpecific);

        let found = resolver.resolve(&DispatchError::validation(vec![]), &[&endpoint[..], &component[..]]);
        assert_eq!(name(found), Some("CatchAll"));
    }

    #[test]
    fn test_no_match() {
        let scope = [ExceptionHandlerRef::of::<CatchNotFound>()];
        let resolver = ExceptionResolver::default();
        assert!(resolver.resolve(&DispatchError::internal("x"), &[&scope[..], &[]]).is_none());
        assert!(resolver.resolve(&DispatchError::internal("x"), &[]).is_none());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let scope = [
            ExceptionHandlerRef::of::<CatchBadRequest>(),
            ExceptionHandlerRef::of::<CatchAll>(),
        ];
        let resolver = ExceptionResolver::default();
        let error = DispatchError::bad_request("x");

        let first = resolver.resolve(&error, &[&scope[..]]).copied();
        let second = resolver.resolve(&error, &[&scope[..]]).copied();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_validation_handler_envelope() {
        let container = Container::new();
        let handler = ExceptionHandlerRef::of::<ValidationExceptionHandler>()
            .resolve(&container)
            .unwrap();

        let outcome = handler
            .handle(DispatchError::validation(vec![Violation::new("name", "too short")]))
            .await;
        let envelope = outcome.envelope().unwrap();
        assert_eq!(envelope.status, StatusCode::BAD_REQUEST);
        assert_eq!(envelope.data["code"], 400);
        assert_eq!(envelope.data["error"], "Validation failed.");
        assert_eq!(envelope.data["violations"][0]["field"], "name");
    }

    #[test]
    fn test_policy_serde() {
        let policy: ResolutionPolicy = serde_json::from_str("\"most_specific\"").unwrap();
        assert_eq!(policy, ResolutionPolicy::MostSpecific);
    }
}
