//! Orchestration commands.
//!
//! Commands borrow engine services, act through the proxy layer, and report
//! a passed or failed [`ActionResult`]. Member commands also report every
//! change made while they ran.

pub(crate) mod collection;
pub(crate) mod consistency;
pub(crate) mod create;
pub(crate) mod invoke;
pub(crate) mod property;
pub(crate) mod result;
pub(crate) mod save;


use crate::{
    error::Error,
    proxy::ProxyBuilder,
    tracking::{Modifications, Sequence},
};

// re-exports
pub use collection::{AddToCollectionCommand, RemoveFromCollectionCommand};
pub use consistency::ConsistencyCheckCommand;
pub use create::CreateObjectCommand;
pub use invoke::InvokeMethodCommand;
pub use property::{GetPropertyCommand, SetPropertyCommand};
pub use result::{ActionResult, Tracked};
pub use save::SaveObjectCommand;

/// Run `f` between a checkpoint and a modifications report.
pub(crate) fn track<T>(
    proxies: &ProxyBuilder,
    f: impl FnOnce() -> Result<T, Error>,
) -> ActionResult<Tracked<T>> {
    let since = Sequence::current();

    match f() {
        Ok(value) => {
            let observers = proxies.context().retriever().cache().live_observers();
            ActionResult::passed(Tracked {
                value,
                modifications: Modifications::collect(&observers, since),
            })
        }
        Err(err) => ActionResult::failed(err),
    }
}
