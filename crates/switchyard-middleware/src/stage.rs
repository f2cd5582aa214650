//! Route chain stage order.

/// The stages of a route chain, in execution order.
///
/// Errors raised by [`BodyTransform`](Self::BodyTransform),
/// [`BodyValidation`](Self::BodyValidation) and [`Handler`](Self::Handler)
/// are offered to endpoint and then component exception handlers. Errors
/// from earlier stages escape to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    /// Stage 1: parse the request body (body-carrying methods only)
    BodyIntake = 1,
    /// Stage 2: middleware declared on the component
    ComponentMiddleware = 2,
    /// Stage 3: middleware declared on the endpoint
    EndpointMiddleware = 3,
    /// Stage 4: convert the body to the declared type
    BodyTransform = 4,
    /// Stage 5: check the converted body
    BodyValidation = 5,
    /// Stage 6: bind arguments and run the handler
    Handler = 6,
}

impl Stage {
    /// Returns true if errors from this stage go through exception
    /// resolution inside the chain.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        (self as u8) >= 4
    }

    /// Returns true if the stage only runs for body-carrying methods.
    #[must_use]
    pub const fn needs_body(self) -> bool {
        matches!(
            self,
            Self::BodyIntake | Self::BodyTransform | Self::BodyValidation
        )
    }

    /// Returns the stage name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BodyIntake => "body_intake",
            Self::ComponentMiddleware => "component_middleware",
            Self::EndpointMiddleware => "endpoint_middleware",
            Self::BodyTransform => "body_transform",
            Self::BodyValidation => "body_validation",
            Self::Handler => "handler",
        }
    }

    /// Returns all stages in order.
    #[must_use]
    pub const fn all() -> [Stage; 6] {
        [
            Self::BodyIntake,
            Self::ComponentMiddleware,
            Self::EndpointMiddleware,
            Self::BodyTransform,
            Self::BodyValidation,
            Self::Handler,
        ]
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
