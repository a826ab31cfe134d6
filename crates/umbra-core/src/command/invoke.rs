use crate::{
    command::ActionResult,
    error::{ArgumentError, Error, ErrorOrigin},
    observer::{MethodObserver, ObjectObserver, Observer},
    proxy::ProxyBuilder,
};
use std::sync::Arc;

///
/// InvokeMethodCommand
///
/// Runs a method using the parameter values held by its observer. The call
/// goes through a fresh proxy over the target that is passed in, never
/// through whatever instance the method observer was last bound to.
///

pub struct InvokeMethodCommand<'a> {
    proxies: &'a ProxyBuilder,
}

impl<'a> InvokeMethodCommand<'a> {
    #[must_use]
    pub const fn new(proxies: &'a ProxyBuilder) -> Self {
        Self { proxies }
    }

    /// Observer of the returned value on success.
    ///
    /// Missing parameters fail before anything is touched. Once the call
    /// has been attempted the whole cache is rescanned and the method's
    /// parameters are cleared, whether or not it succeeded.
    pub fn invoke(
        &self,
        method: &MethodObserver,
        target: &Arc<ObjectObserver>,
    ) -> ActionResult<Observer> {
        ActionResult::from_result(self.execute(method, target))
    }

    fn execute(
        &self,
        method: &MethodObserver,
        target: &Arc<ObjectObserver>,
    ) -> Result<Observer, Error> {
        let template = method.template();
        if template.owner() != target.template().name() {
            return Err(ArgumentError::UnexpectedObserver {
                expected: template.owner().to_string(),
                actual: target.template().name().to_string(),
            }
            .into_error(ErrorOrigin::Command));
        }

        let missing = method.missing_required_parameters();
        if !missing.is_empty() {
            return Err(ArgumentError::MissingParameters {
                method: template.full_name(),
                missing,
            }
            .into());
        }

        let proxy = self.proxies.object_proxy(target)?;
        let outcome = proxy.invoke(method.name(), &method.arguments());

        let synced = self.proxies.context().synchroniser().sync_all();
        method.reset_parameters();

        let value = outcome?;
        synced?;

        self.proxies.context().retriever().get_observer(&value)
    }
}
