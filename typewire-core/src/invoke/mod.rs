//! # Invocation capture and dispatch
//!
//! A call on a service handle becomes an [`Invocation`] chain: each link is
//! one method application, pointing at its parent, terminated by a remote
//! method. The client captures chains through an [`InvocationProxy`]; the
//! server replays them against a service object through a
//! [`ServiceInvoker`].

mod invocation;
mod proxy;

pub use invocation::{Invocation, InvocationResult, MethodRef};
pub use proxy::{CallOutcome, InvocationHandler, InvocationProxy, ServiceInvoker};
