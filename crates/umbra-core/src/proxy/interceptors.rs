//! Built-in interceptors.
//!
//! Object proxies run meta, member and notification interceptors in that
//! order; collection proxies run meta, add/remove and notification. Every
//! argument check happens before the call reaches the wrapped instance.

use crate::{
    error::{ArgumentError, Error, ErrorClass, ErrorOrigin},
    observer::{ObserverCacheSynchroniser, Observer},
    proxy::{
        ChangeNotification, CollectionAction,
        chain::{Call, Interceptor, Invocation, Next, ProxyTarget},
    },
    tracking::{DirtyObjectNotifier, RemovalOutcome},
    value::{Value, ValueKind},
};
use std::sync::Arc;

///
/// MetaInterceptor
/// Traces every call and refuses proxies whose observer was rebound.
///

pub struct MetaInterceptor;

impl Interceptor for MetaInterceptor {
    fn name(&self) -> &'static str {
        "meta"
    }

    fn intercept(&self, invocation: &mut Invocation<'_>, next: Next<'_>) -> Result<Value, Error> {
        let bound = match (&invocation.observer, &invocation.target) {
            (Observer::Object(observer), ProxyTarget::Object(target)) => {
                observer.is_bound_to(target)
            }
            (Observer::Collection(observer), ProxyTarget::Collection(target)) => {
                observer.is_bound_to(target)
            }
            _ => false,
        };
        if !bound {
            return Err(Error::new(
                ErrorClass::InvariantViolation,
                ErrorOrigin::Proxy,
                "proxy observer is no longer bound to the proxied instance",
            ));
        }

        tracing::trace!(
            call = invocation.call.label(),
            member = invocation.call.member(),
            observer = ?invocation.observer.id(),
            "proxy call"
        );

        next.proceed(invocation)
    }
}

///
/// PropertyGetInterceptor
///

pub struct PropertyGetInterceptor;

impl Interceptor for PropertyGetInterceptor {
    fn name(&self) -> &'static str {
        "property_get"
    }

    fn applies_to(&self, call: &Call) -> bool {
        matches!(call, Call::Get { .. })
    }

    fn intercept(&self, invocation: &mut Invocation<'_>, next: Next<'_>) -> Result<Value, Error> {
        let Call::Get { property } = &invocation.call else {
            return next.proceed(invocation);
        };
        let name = property.clone();
        let object = invocation.object_observer()?;
        let observed = object.property(&name)?;
        let template = Arc::clone(observed.template());

        if !template.can_read() {
            return Err(ArgumentError::NotReadable {
                owner: template.owner().to_string(),
                member: name,
            }
            .into_error(ErrorOrigin::Proxy));
        }

        let value = next.proceed(invocation)?;

        // reading a reference resolves it, lazy or not
        if !template.is_non_reference() {
            observed.mark_loaded();
            let child = invocation.context.retriever().get_observer(&value)?;
            match &child {
                Observer::Object(inner) => inner.bind_outer_property(&object, &template),
                Observer::Collection(inner) => inner.bind_outer_property(&object, &template),
                Observer::Value(_) | Observer::Null => {}
            }
            observed.set_resolved((!child.is_null()).then_some(child));
        }

        Ok(value)
    }
}

///
/// PropertySetInterceptor
///

pub struct PropertySetInterceptor;

impl Interceptor for PropertySetInterceptor {
    fn name(&self) -> &'static str {
        "property_set"
    }

    fn applies_to(&self, call: &Call) -> bool {
        matches!(call, Call::Set { .. })
    }

    fn intercept(&self, invocation: &mut Invocation<'_>, next: Next<'_>) -> Result<Value, Error> {
        let Call::Set { property, value } = &invocation.call else {
            return next.proceed(invocation);
        };
        let object = invocation.object_observer()?;
        let template = Arc::clone(object.property(property)?.template());

        if !template.can_write() {
            return Err(ArgumentError::NotWritable {
                owner: template.owner().to_string(),
                member: property.clone(),
            }
            .into_error(ErrorOrigin::Proxy));
        }
        if !template.accepts(value) {
            return Err(ArgumentError::KindMismatch {
                owner: template.owner().to_string(),
                member: property.clone(),
                expected: template.kind().to_string(),
                actual: value.kind_label(),
            }
            .into_error(ErrorOrigin::Proxy));
        }

        let result = next.proceed(invocation)?;
        invocation
            .context
            .synchroniser()
            .sync_from(&Observer::Object(object))?;

        Ok(result)
    }
}

///
/// MethodInvokeInterceptor
///
/// Checks arity, argument kinds and required arguments, then rescans the
/// graph below the target once the method has run.
///

pub struct MethodInvokeInterceptor;

impl Interceptor for MethodInvokeInterceptor {
    fn name(&self) -> &'static str {
        "method_invoke"
    }

    fn applies_to(&self, call: &Call) -> bool {
        matches!(call, Call::Invoke { .. })
    }

    fn intercept(&self, invocation: &mut Invocation<'_>, next: Next<'_>) -> Result<Value, Error> {
        let Call::Invoke { method, args } = &invocation.call else {
            return next.proceed(invocation);
        };
        let object = invocation.object_observer()?;
        let class = object.template();
        let template = class
            .method(method)
            .ok_or_else(|| Error::unknown_member(ErrorOrigin::Proxy, class.name(), method))?;

        if args.len() != template.arity() {
            return Err(ArgumentError::ArityMismatch {
                owner: template.owner().to_string(),
                member: method.clone(),
                expected: template.arity(),
                actual: args.len(),
            }
            .into_error(ErrorOrigin::Proxy));
        }

        let mut missing = Vec::new();
        for (parameter, arg) in template.parameters().zip(args) {
            if !arg.matches(parameter.kind()) {
                return Err(ArgumentError::KindMismatch {
                    owner: template.full_name(),
                    member: parameter.name().to_string(),
                    expected: parameter.kind().to_string(),
                    actual: arg.kind_label(),
                }
                .into_error(ErrorOrigin::Proxy));
            }
            if parameter.is_required() && arg.is_null() {
                missing.push(parameter.name().to_string());
            }
        }
        if !missing.is_empty() {
            return Err(ArgumentError::MissingParameters {
                method: template.full_name(),
                missing,
            }
            .into_error(ErrorOrigin::Proxy));
        }

        let result = next.proceed(invocation)?;
        invocation
            .context
            .synchroniser()
            .sync_from(&Observer::Object(object))?;

        Ok(result)
    }
}

///
/// CollectionAddInterceptor
///
/// Checks the element type before delegation. The addition is recorded only
/// once the element is actually in the collection, so a vetoed or
/// short-circuited add leaves the tracker untouched.
///

pub struct CollectionAddInterceptor;

impl Interceptor for CollectionAddInterceptor {
    fn name(&self) -> &'static str {
        "collection_add"
    }

    fn applies_to(&self, call: &Call) -> bool {
        matches!(call, Call::Add { .. })
    }

    fn intercept(&self, invocation: &mut Invocation<'_>, next: Next<'_>) -> Result<Value, Error> {
        let Call::Add { item } = &invocation.call else {
            return next.proceed(invocation);
        };
        let item = item.clone();
        let collection = invocation.collection_observer()?;
        let element_type = collection.template().element().type_key();

        if item.type_key() != element_type {
            return Err(ArgumentError::KindMismatch {
                owner: collection.template().name().to_string(),
                member: "items".to_string(),
                expected: ValueKind::Object(element_type).to_string(),
                actual: Value::Object(item).kind_label(),
            }
            .into_error(ErrorOrigin::Proxy));
        }
        // template problems surface before the collection is touched
        invocation
            .context
            .retriever()
            .cache()
            .templates()
            .class_template(element_type)?;

        let result = next.proceed(invocation)?;
        if !collection.real_collection()?.contains(&item) {
            return Ok(result);
        }

        let element = invocation.context.retriever().object_observer(&item)?;
        let Some(add) = collection
            .tracker()
            .mark_as_added(Arc::clone(&element), &item)
        else {
            return Ok(result);
        };
        ObserverCacheSynchroniser::attach_element(&collection, &element);
        DirtyObjectNotifier::object_is_dirty(&Observer::Collection(collection));
        tracing::trace!(
            sequence = add.sequence,
            element = %element.id(),
            "collection addition recorded"
        );

        Ok(result)
    }
}

///
/// CollectionRemoveInterceptor
///
/// Records a removal once the element has left the collection. Removing an
/// element whose addition is still pending withdraws that addition instead.
///

pub struct CollectionRemoveInterceptor;

impl Interceptor for CollectionRemoveInterceptor {
    fn name(&self) -> &'static str {
        "collection_remove"
    }

    fn applies_to(&self, call: &Call) -> bool {
        matches!(call, Call::Remove { .. })
    }

    fn intercept(&self, invocation: &mut Invocation<'_>, next: Next<'_>) -> Result<Value, Error> {
        let Call::Remove { item } = &invocation.call else {
            return next.proceed(invocation);
        };
        let item = item.clone();
        let collection = invocation.collection_observer()?;

        let result = next.proceed(invocation)?;
        if collection.real_collection()?.contains(&item) {
            return Ok(result);
        }

        let element = invocation.context.retriever().object_observer(&item)?;
        let Some(outcome) = collection
            .tracker()
            .mark_as_removed(Arc::clone(&element), &item)
        else {
            return Ok(result);
        };

        match outcome {
            RemovalOutcome::Retracted => {
                ObserverCacheSynchroniser::retract_element(&collection, &element);
                if !collection.tracker().is_dirty() {
                    DirtyObjectNotifier::object_is_no_longer_dirty(&Observer::Collection(
                        collection,
                    ));
                }
            }
            RemovalOutcome::Removed(_) => {
                element.unbind_outer_collection(collection.id());
                DirtyObjectNotifier::object_is_dirty(&Observer::Collection(collection));
            }
        }

        Ok(result)
    }
}

///
/// NotifyPropertyChangedInterceptor
///

pub struct NotifyPropertyChangedInterceptor;

impl Interceptor for NotifyPropertyChangedInterceptor {
    fn name(&self) -> &'static str {
        "notify_property_changed"
    }

    fn applies_to(&self, call: &Call) -> bool {
        matches!(call, Call::Set { .. } | Call::Invoke { .. })
    }

    fn intercept(&self, invocation: &mut Invocation<'_>, next: Next<'_>) -> Result<Value, Error> {
        let result = next.proceed(invocation)?;
        let Some(object) = invocation.observer.id() else {
            return Ok(result);
        };

        let notification = match &invocation.call {
            Call::Set { property, .. } => ChangeNotification::PropertyChanged {
                object,
                property: property.clone(),
            },
            Call::Invoke { method, .. } => ChangeNotification::MethodInvoked {
                object,
                method: method.clone(),
            },
            Call::Get { .. } | Call::Add { .. } | Call::Remove { .. } => return Ok(result),
        };
        invocation.context.notifier().publish(&notification);

        Ok(result)
    }
}

///
/// NotifyCollectionChangedInterceptor
///

pub struct NotifyCollectionChangedInterceptor;

impl Interceptor for NotifyCollectionChangedInterceptor {
    fn name(&self) -> &'static str {
        "notify_collection_changed"
    }

    fn applies_to(&self, call: &Call) -> bool {
        matches!(call, Call::Add { .. } | Call::Remove { .. })
    }

    fn intercept(&self, invocation: &mut Invocation<'_>, next: Next<'_>) -> Result<Value, Error> {
        let result = next.proceed(invocation)?;
        let Some(collection) = invocation.observer.id() else {
            return Ok(result);
        };

        let (action, item) = match &invocation.call {
            Call::Add { item } if matches!(result, Value::Bool(true)) => {
                (CollectionAction::Added, item)
            }
            Call::Remove { item } if matches!(result, Value::Bool(true)) => {
                (CollectionAction::Removed, item)
            }
            _ => return Ok(result),
        };
        let element = invocation
            .context
            .retriever()
            .cache()
            .find_observer(&Value::Object(item.clone()))
            .and_then(|observer| observer.id());

        invocation
            .context
            .notifier()
            .publish(&ChangeNotification::CollectionChanged {
                collection,
                action,
                element,
            });

        Ok(result)
    }
}
