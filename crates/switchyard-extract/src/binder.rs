//! Positional parameter binding.

use serde_json::{Map, Value};
use switchyard_core::{
    Argument, Arguments, Container, DispatchResult, ParamSpec, RequestContext, TransformerRef,
};

use crate::query::QueryMap;

/// Maps request fields onto a handler's declared parameters.
///
/// The binder only reads the context. Transformers are resolved from the
/// container on every call, so transient transformers are never shared
/// between requests.
///
/// # Example
///
/// ```rust
/// use bytes::Bytes;
/// use switchyard_core::{Container, Environment, ExecutionContext, ParamSpec, Params, RequestContext};
/// use switchyard_extract::ParamBinder;
///
/// let request = http::Request::get("/users/7?verbose=1").body(Bytes::new()).unwrap();
/// let mut ctx = RequestContext::new(request, Environment::new(), ExecutionContext::new());
/// let mut params = Params::new();
/// params.push("id", "7");
/// ctx.set_params(params);
///
/// let container = Container::new();
/// let args = ParamBinder::new(&container)
///     .map_to(&ctx, &[ParamSpec::path("id"), ParamSpec::query("verbose"), ParamSpec::query("page")])
///     .unwrap();
///
/// assert_eq!(args.len(), 3);
/// assert_eq!(args.text(0), Some("7"));
/// assert_eq!(args.text(1), Some("1"));
/// assert!(args.value(2).is_none());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ParamBinder<'c> {
    container: &'c Container,
}

impl<'c> ParamBinder<'c> {
    /// Creates a binder resolving transformers from `container`.
    #[must_use]
    pub const fn new(container: &'c Container) -> Self {
        Self { container }
    }

    /// Produces one argument per spec, in the same order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query string is malformed, a transformer
    /// cannot be resolved, or a transformer rejects a present value.
    pub fn map_to(&self, ctx: &RequestContext, specs: &[ParamSpec]) -> DispatchResult<Arguments> {
        let query = if specs.iter().any(|spec| matches!(spec, ParamSpec::Query { .. })) {
            QueryMap::parse(ctx.query())?
        } else {
            QueryMap::default()
        };
        let mut args = Vec::with_capacity(specs.len());

        for spec in specs {
            let arg = match *spec {
                ParamSpec::Request => Argument::Request(ctx.view()),
                ParamSpec::Body(_) => Argument::Body(ctx.body().or_else(|| ctx.raw_body()).cloned()),
                ParamSpec::Path { name: None, .. } => Argument::Path(Some(captures(ctx))),
                ParamSpec::Path {
                    name: Some(name),
                    transformer,
                } => Argument::Path(self.convert(ctx.params().get(name), transformer)?),
                ParamSpec::Query { name: None, .. } => Argument::Query(Some(query.to_object())),
                ParamSpec::Query {
                    name: Some(name),
                    transformer,
                } => Argument::Query(self.convert(query.get(name), transformer)?),
            };
            args.push(arg);
        }

        Ok(Arguments::new(args))
    }

    fn convert(
        &self,
        raw: Option<&str>,
        transformer: Option<TransformerRef>,
    ) -> DispatchResult<Option<Value>> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        match transformer {
            None => Ok(Some(Value::String(raw.to_string()))),
            Some(reference) => {
                let transformer = reference.resolve(self.container)?;
                transformer.transform(raw).map(Some)
            }
        }
    }
}

fn captures(ctx: &RequestContext) -> Value {
    let object: Map<String, Value> = ctx
        .params()
        .iter()
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect();
    Value::Object(object)
}
