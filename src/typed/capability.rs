//! Per-request preconditions for typed handlers.
//!
//! A [`Capability`] is a value a typed handler needs before it may run, built
//! from the request: an authenticated user, a tenant, a rate-limit token. A
//! typed route names its capabilities as a tuple, `()`, `(A,)`, `(A, B)` or
//! `(A, B, C)`, and receives the resolved tuple as its first argument.
//!
//! Resolution runs over a list of type-erased [`CapabilityDescriptor`]s, one
//! at a time and left to right. The first failure wins: its kind becomes the
//! response status and no later capability is attempted.

use std::any::Any;

use async_trait::async_trait;
use tracing::{debug, error, trace};

use crate::error::{Error, RequestError};
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;

/// A precondition resolved from the request before a typed handler runs.
///
/// ```rust
/// use weft::{async_trait, Capability, Request, RequestError, Response};
///
/// struct ApiKey(String);
///
/// #[async_trait]
/// impl Capability for ApiKey {
///     async fn resolve(req: &mut Request, _res: &mut Response) -> Result<Self, Option<RequestError>> {
///         match req.header("x-api-key") {
///             Some(key) => Ok(ApiKey(key.to_owned())),
///             None => Err(Some(RequestError::Unauthorized)),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Capability: Sized + Send + 'static {
    /// Builds the capability, or refuses the request. `Err(None)` is a
    /// refusal without a reason and maps to `500`.
    async fn resolve(req: &mut Request, res: &mut Response) -> Result<Self, Option<RequestError>>;

    /// Name used in logs and in [`Rejection`].
    fn describe() -> String {
        std::any::type_name::<Self>().to_owned()
    }
}

type Erased = Box<dyn Any + Send>;

type ResolveFn =
    for<'a> fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, Result<Erased, Option<RequestError>>>;

/// One capability with its type erased.
pub struct CapabilityDescriptor {
    name: String,
    resolve: ResolveFn,
}

impl CapabilityDescriptor {
    pub fn of<T: Capability>() -> Self {
        Self { name: T::describe(), resolve: resolve_erased::<T> }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn resolve_erased<'a, T: Capability>(
    req: &'a mut Request,
    res: &'a mut Response,
) -> BoxFuture<'a, Result<Erased, Option<RequestError>>> {
    Box::pin(async move { T::resolve(req, res).await.map(|instance| Box::new(instance) as Erased) })
}

/// An ordered group of capabilities, implemented for tuples of up to three.
pub trait CapabilitySet: Sized + Send + 'static {
    fn descriptors() -> Vec<CapabilityDescriptor>;

    /// Rebuilds the typed tuple from the erased instances, in order.
    fn recover(instances: Vec<Erased>) -> Option<Self>;
}

macro_rules! capability_set {
    ($($cap:ident),*) => {
        impl<$($cap: Capability),*> CapabilitySet for ($($cap,)*) {
            fn descriptors() -> Vec<CapabilityDescriptor> {
                vec![$(CapabilityDescriptor::of::<$cap>()),*]
            }

            #[allow(unused_mut, unused_variables)]
            fn recover(instances: Vec<Erased>) -> Option<Self> {
                let mut instances = instances.into_iter();
                Some(($(*instances.next()?.downcast::<$cap>().ok()?,)*))
            }
        }
    };
}

capability_set!();
capability_set!(A);
capability_set!(A, B);
capability_set!(A, B, C);

/// Why a typed route's handler never ran.
///
/// Left in the request's extensions when a capability refuses it, so later
/// elements of the chain can tell a rejection apart from other statuses:
///
/// ```rust
/// # use weft::{Rejection, Request};
/// # fn inspect(req: &Request) {
/// if let Some(rejection) = req.extensions().get::<Rejection>() {
///     println!("{rejection}");
/// }
/// # }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("capability `{capability}` rejected the request: {kind}")]
pub struct Rejection {
    pub capability: String,
    pub kind: RequestError,
}

/// A failed resolution.
///
/// Instances resolved before the failing capability are kept, in order; the
/// failing one and everything after it are absent.
pub struct Resolution {
    resolved: Vec<Erased>,
    failed: String,
    kind: RequestError,
}

impl Resolution {
    /// Number of capabilities that resolved before the failure.
    pub fn resolved(&self) -> usize {
        self.resolved.len()
    }

    pub fn failed(&self) -> &str {
        &self.failed
    }

    pub fn kind(&self) -> RequestError {
        self.kind
    }
}

/// Resolves every capability in `descriptors`, strictly in order.
///
/// On failure the response gets the failure's status and the request a
/// [`Rejection`] extension. Nothing is recorded in the response's error slot,
/// so the rest of the chain runs as it would after a decode failure.
pub async fn resolve_all(
    descriptors: &[CapabilityDescriptor],
    req: &mut Request,
    res: &mut Response,
) -> Result<Vec<Erased>, Resolution> {
    let mut resolved = Vec::with_capacity(descriptors.len());
    for (index, descriptor) in descriptors.iter().enumerate() {
        trace!(capability = descriptor.name(), index, "resolving capability");
        match (descriptor.resolve)(req, res).await {
            Ok(instance) => resolved.push(instance),
            Err(reason) => {
                let kind = reason.unwrap_or(RequestError::InternalServerError);
                debug!(capability = descriptor.name(), index, status = %kind.status(), "capability rejected the request");
                res.set_status(kind.status());
                req.extensions_mut().insert(Rejection { capability: descriptor.name.clone(), kind });
                return Err(Resolution { resolved, failed: descriptor.name.clone(), kind });
            }
        }
    }
    Ok(resolved)
}

/// Resolves the typed group `C`.
pub(crate) async fn resolve_set<C: CapabilitySet>(req: &mut Request, res: &mut Response) -> Option<C> {
    let instances = resolve_all(&C::descriptors(), req, res).await.ok()?;
    match C::recover(instances) {
        Some(set) => Some(set),
        None => {
            error!("resolved capabilities did not match their declared types");
            res.set_status(RequestError::InternalServerError);
            res.set_error(Error::Adapter("capability type mismatch"));
            None
        }
    }
}
