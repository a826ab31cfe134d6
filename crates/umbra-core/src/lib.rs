//! Core runtime for Umbra: type templates, the identity-preserving observer
//! cache, change tracking, interceptor proxies and the commands built on
//! top of them.
//!
//! Domain types describe themselves through [`traits::Declare`] and expose
//! their members through [`traits::DomainObject`]. An [`engine::Engine`]
//! observes live instances, records every change against one monotonic
//! sequence and reports exactly what an operation touched.

// public exports are one module level down
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod memo;
pub mod model;
pub mod obs;
pub mod observer;
pub mod persistence;
pub mod proxy;
pub mod tracking;
pub mod traits;
pub mod types;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

pub use error::Error;

///
/// Prelude
///
/// Domain vocabulary and the engine entry points. Trackers, interceptors
/// and metrics stay in their modules.
///

pub mod prelude {
    pub use crate::{
        command::{ActionResult, Tracked},
        engine::{Engine, EngineBuilder},
        error::Error,
        model::{
            Attribute, ClassConfiguration, ClassDeclaration, MethodDeclaration,
            ParameterDeclaration, PropertyDeclaration, Relationship,
        },
        observer::{CollectionObserver, ObjectObserver, Observer},
        proxy::{CollectionProxy, ObjectProxy},
        traits::{Declare, DomainObject, MemberError},
        types::{CollectionRef, ObjectRef, TypeKey},
        value::{Value, ValueKind},
    };
}
