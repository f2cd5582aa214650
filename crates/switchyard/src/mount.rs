//! Route and gateway mounting.

use std::any::TypeId;
use std::sync::Arc;

use http::Method;
use hyper::upgrade::OnUpgrade;
use switchyard_core::{
    ControllerRef, Declare, GatewaySpec, Outcome, RequestContext, RouteSpec, Target,
};
use switchyard_middleware::{MiddlewareChain, RouteChain};
use switchyard_ws::{check_upgrade, upgrade_response, GatewayDispatcher, MessageRoute};

use crate::app::App;
use crate::error::MountResult;

/// A route-table entry.
pub(crate) enum Entry {
    /// Global middleware, mounted as a catch-all.
    Global(MiddlewareChain),
    /// One controller endpoint.
    Route(RouteChain),
    /// A gateway's upgrade endpoint.
    Gateway(Arc<GatewayDispatcher>),
}

impl App {
    /// Mounts every HTTP endpoint `C` declares.
    ///
    /// A component without a controller root, or without endpoints, mounts
    /// nothing. Otherwise the component is resolved once so a missing
    /// dependency fails here rather than on the first request, and each
    /// endpoint is appended to the route table in declaration order.
    ///
    /// # Errors
    ///
    /// Returns an error if the component cannot be resolved or a path is not
    /// a valid pattern.
    pub fn register_routes<C: Declare>(&mut self) -> MountResult<&mut Self> {
        self.declare::<C>();
        let id = TypeId::of::<C>();
        let Some(root) = self.registry.controller_root(id).map(str::to_string) else {
            return Ok(self);
        };
        let routes: Vec<RouteSpec> = self.registry.routes(id).cloned().collect();
        if routes.is_empty() {
            return Ok(self);
        }

        let component = ControllerRef::of::<C>();
        component.resolve(self.container())?;

        let scope = Target::Component(id);
        let component_middleware: Vec<_> = self.registry.middleware(&scope).copied().collect();
        let component_handlers: Vec<_> = self.registry.exception_handlers(&scope).copied().collect();

        for spec in routes {
            let endpoint = Target::handler::<C>(spec.handler.as_str());
            let chain = RouteChain::new(component, spec.handler.as_str())
                .component_middleware(component_middleware.clone())
                .endpoint_middleware(self.registry.middleware(&endpoint).copied().collect())
                .params(self.registry.params(&endpoint).copied().collect())
                .endpoint_handlers(self.registry.exception_handlers(&endpoint).copied().collect())
                .component_handlers(component_handlers.clone());

            let path = spec.full_path(&root);
            self.table.route(spec.method.clone(), &path, Entry::Route(chain))?;
            self.logger
                .log(&format!("Mounted route: [{}] {}", spec.method, path));
        }
        Ok(self)
    }

    /// Mounts the upgrade endpoint of gateway `G`.
    ///
    /// A component without a gateway root, or without message
    /// subscriptions, mounts nothing. The gateway is resolved once; every
    /// channel accepted at its root shares that instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway cannot be resolved or its root is not
    /// a valid pattern.
    pub fn register_gateways<G: Declare>(&mut self) -> MountResult<&mut Self> {
        self.declare::<G>();
        let specs = self.gateway_specs(TypeId::of::<G>());
        let Some(root) = specs.first().map(|spec| spec.root.clone()) else {
            return Ok(self);
        };

        let component = ControllerRef::of::<G>().resolve(self.container())?;
        let routes = specs
            .iter()
            .map(|spec| MessageRoute::new(spec.message.as_str(), spec.handler.as_str()))
            .collect();
        let dispatcher = GatewayDispatcher::new(root.as_str(), component, routes)
            .with_max_message_bytes(self.gateway.max_message_bytes);

        self.table
            .route(Method::GET, &root, Entry::Gateway(Arc::new(dispatcher)))?;
        for spec in &specs {
            self.logger
                .log(&format!("Mounted gateway: [{}] {}", spec.message, spec.root));
        }
        Ok(self)
    }

    /// Returns the `{root, message, handler}` triples of a gateway, in
    /// declaration order. Empty if the component has no gateway root.
    pub(crate) fn gateway_specs(&self, id: TypeId) -> Vec<GatewaySpec> {
        let Some(root) = self.registry.gateway_root(id) else {
            return Vec::new();
        };
        self.registry
            .message_endpoints(id)
            .map(|spec| GatewaySpec {
                root: root.to_string(),
                message: spec.message.clone(),
                handler: spec.handler.clone(),
            })
            .collect()
    }

    /// Answers an upgrade request for a mounted gateway.
    ///
    /// A request whose `Upgrade` header does not carry the configured
    /// protocol gets the bad-gateway envelope. An accepted request gets
    /// `101 Switching Protocols`; once the connection is handed over the
    /// channel is served on its own task.
    pub(crate) fn accept_gateway(
        &self,
        dispatcher: &Arc<GatewayDispatcher>,
        ctx: &RequestContext,
    ) -> Outcome {
        let response = check_upgrade(ctx.request(), &self.gateway.protocol)
            .and_then(|accept| upgrade_response(&accept, &self.gateway.protocol));
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(gateway = dispatcher.path(), error = %e, "upgrade rejected");
                return Outcome::bad_gateway();
            }
        };

        match ctx.request().extensions().get::<OnUpgrade>().cloned() {
            Some(on_upgrade) => {
                Arc::clone(dispatcher).spawn(on_upgrade);
            }
            None => tracing::warn!(
                gateway = dispatcher.path(),
                "upgrade accepted without an upgradable connection"
            ),
        }
        Outcome::raw(response)
    }

    fn declare<C: Declare>(&mut self) {
        if self.declared.insert(TypeId::of::<C>()) {
            self.registry.declare::<C>();
        }
    }
}
