//! Dependency injection container.
//!
//! Components are resolved per dispatch. A type can either be registered
//! explicitly (an instance or a factory) or describe how to build itself by
//! implementing [`Injectable`]; explicit registrations take precedence.
//!
//! # Example
//!
//! ```rust
//! use switchyard_core::di::{Container, Injectable, InjectionError, Lifecycle};
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! impl Injectable for UserService {
//!     const LIFECYCLE: Lifecycle = Lifecycle::Singleton;
//!
//!     fn create(container: &Container) -> Result<Self, InjectionError> {
//!         Ok(Self { db: container.get_required()? })
//!     }
//! }
//!
//! let mut container = Container::new();
//! container.register(Arc::new(Database { url: "postgres://localhost/db".into() }));
//!
//! let first: Arc<UserService> = container.resolve().unwrap();
//! let second: Arc<UserService> = container.resolve().unwrap();
//! assert!(Arc::ptr_eq(&first, &second));
//! assert_eq!(first.db.url, "postgres://localhost/db");
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

type Instance = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&Container) -> Result<Instance, InjectionError> + Send + Sync>;

/// How long a resolved instance lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// One instance per container, created on first resolution.
    Singleton,
    /// A fresh instance on every resolution.
    #[default]
    Transient,
}

/// Error when a dependency cannot be resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to inject {type_name}: {reason}")]
pub struct InjectionError {
    /// The type name that could not be resolved.
    pub type_name: &'static str,
    /// The reason for the failure.
    pub reason: String,
}

impl InjectionError {
    /// Creates an injection error for a type nothing knows how to build.
    #[must_use]
    pub fn not_registered<T>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            reason: "service not registered".to_string(),
        }
    }

    /// Creates an injection error with a custom reason.
    pub fn custom<T>(reason: impl Into<String>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }
}

/// A type the container can construct on demand.
///
/// Implement this for controllers, gateways, middleware, exception handlers
/// and transformers so they can be referenced by type in declarations.
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Lifecycle used when the type has no explicit registration.
    const LIFECYCLE: Lifecycle = Lifecycle::Transient;

    /// Builds a new instance, resolving dependencies from `container`.
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency cannot be resolved.
    fn create(container: &Container) -> Result<Self, InjectionError>;
}

/// Implements [`Injectable`] for types that implement `Default`.
///
/// ```rust
/// use switchyard_core::injectable;
///
/// #[derive(Default)]
/// struct Clock;
/// #[derive(Default)]
/// struct Cache;
///
/// injectable!(Clock);
/// injectable!(Cache => Singleton);
/// ```
#[macro_export]
macro_rules! injectable {
    ($ty:ty) => {
        $crate::injectable!($ty => Transient);
    };
    ($ty:ty => $lifecycle:ident) => {
        impl $crate::di::Injectable for $ty {
            const LIFECYCLE: $crate::di::Lifecycle = $crate::di::Lifecycle::$lifecycle;

            fn create(_: &$crate::di::Container) -> Result<Self, $crate::di::InjectionError> {
                Ok(<$ty as ::std::default::Default>::default())
            }
        }
    };
}

struct Provider {
    lifecycle: Lifecycle,
    factory: Factory,
}

/// A dependency injection container.
///
/// Registrations happen at startup through `&mut self`; resolution is
/// `&self` and safe to call concurrently while serving.
#[derive(Default)]
pub struct Container {
    providers: HashMap<TypeId, Provider>,
    singletons: Mutex<HashMap<TypeId, Instance>>,
}

impl Container {
    /// Creates a new empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a ready-made instance. It behaves as a singleton.
    pub fn register<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        let id = TypeId::of::<T>();
        self.providers.remove(&id);
        self.singletons.get_mut().insert(id, service);
    }

    /// Registers a factory invoked once, on first resolution.
    pub fn singleton<T, F>(&mut self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, InjectionError> + Send + Sync + 'static,
    {
        self.register_factory(Lifecycle::Singleton, factory);
    }

    /// Registers a factory invoked on every resolution.
    pub fn transient<T, F>(&mut self, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, InjectionError> + Send + Sync + 'static,
    {
        self.register_factory(Lifecycle::Transient, factory);
    }

    /// Registers a factory with an explicit lifecycle.
    pub fn register_factory<T, F>(&mut self, lifecycle: Lifecycle, factory: F)
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, InjectionError> + Send + Sync + 'static,
    {
        let id = TypeId::of::<T>();
        self.singletons.get_mut().remove(&id);
        let factory: Factory = Arc::new(move |container| {
            factory(container).map(|value| Arc::new(value) as Instance)
        });
        self.providers.insert(id, Provider { lifecycle, factory });
    }

    /// Returns true if `T` has an explicit registration.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.providers.contains_key(&id) || self.singletons.lock().contains_key(&id)
    }

    /// Returns the number of explicit registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        let singletons = self.singletons.lock();
        self.providers.len()
            + singletons
                .keys()
                .filter(|id| !self.providers.contains_key(id))
                .count()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves an explicitly registered service.
    ///
    /// Returns `None` if the service is not registered or its factory failed.
    #[must_use]
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.lookup::<T>().and_then(Result::ok)
    }

    /// Resolves an explicitly registered service or returns an error.
    ///
    /// # Errors
    ///
    /// Returns `InjectionError` if the service is not registered or its
    /// factory failed.
    pub fn get_required<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, InjectionError> {
        self.lookup::<T>()
            .unwrap_or_else(|| Err(InjectionError::not_registered::<T>()))
    }

    /// Resolves `T`, building it through [`Injectable`] when it has no
    /// explicit registration.
    ///
    /// # Errors
    ///
    /// Returns `InjectionError` if `T` or one of its dependencies cannot be
    /// built.
    pub fn resolve<T: Injectable>(&self) -> Result<Arc<T>, InjectionError> {
        if let Some(found) = self.lookup::<T>() {
            return found;
        }
        match T::LIFECYCLE {
            Lifecycle::Transient => T::create(self).map(Arc::new),
            Lifecycle::Singleton => {
                let created: Instance = Arc::new(T::create(self)?);
                self.cache::<T>(created)
            }
        }
    }

    fn lookup<T: Send + Sync + 'static>(&self) -> Option<Result<Arc<T>, InjectionError>> {
        let id = TypeId::of::<T>();
        if let Some(instance) = self.singletons.lock().get(&id) {
            return Some(downcast::<T>(Arc::clone(instance)));
        }
        let provider = self.providers.get(&id)?;
        let built = match (provider.factory)(self) {
            Ok(instance) => instance,
            Err(err) => return Some(Err(err)),
        };
        Some(match provider.lifecycle {
            Lifecycle::Transient => downcast::<T>(built),
            Lifecycle::Singleton => self.cache::<T>(built),
        })
    }

    // The lock is not held while factories run, so a factory may resolve
    // other singletons. If two threads race, the first stored instance wins.
    fn cache<T: Send + Sync + 'static>(&self, built: Instance) -> Result<Arc<T>, InjectionError> {
        let stored = Arc::clone(
            self.singletons
                .lock()
                .entry(TypeId::of::<T>())
                .or_insert(built),
        );
        downcast::<T>(stored)
    }
}

fn downcast<T: Send + Sync + 'static>(instance: Instance) -> Result<Arc<T>, InjectionError> {
    instance
        .downcast::<T>()
        .map_err(|_| InjectionError::custom::<T>("registered instance has a different type"))
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registrations", &self.len())
            .finish()
    }
}
