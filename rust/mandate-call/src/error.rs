use mandate_common::AccountId;

use crate::ProxyType;

/// Reasons a proxy is not allowed to dispatch a call.
///
/// These are fatal: a call that fails the filter must not be composed, and
/// the error is meant to be surfaced to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    /// The call's section or method is outside the proxy type's scope.
    #[error("Permission denied: {proxy_type} proxy for {real} cannot call {section}.{method}")]
    PermissionDenied {
        /// Scope of the acting proxy.
        proxy_type: ProxyType,
        /// Account the proxy acts for.
        real: AccountId,
        /// Section of the rejected call.
        section: String,
        /// Method of the rejected call.
        method: String,
    },

    /// An add/remove proxy call would manage a scope wider than the acting one.
    #[error("Permission escalation: {proxy_type} proxy for {real} cannot manage {requested} proxies")]
    PermissionEscalation {
        /// Scope of the acting proxy.
        proxy_type: ProxyType,
        /// Account the proxy acts for.
        real: AccountId,
        /// Scope being granted or removed.
        requested: ProxyType,
    },

    /// `killPure`/`removeProxies` requires an `Any` proxy.
    #[error("Unauthorized management: {proxy_type} proxy for {real} cannot call proxy.{method}")]
    UnauthorizedManagement {
        /// Scope of the acting proxy.
        proxy_type: ProxyType,
        /// Account the proxy acts for.
        real: AccountId,
        /// The management method.
        method: String,
    },
}

/// Reasons a call cannot be encoded for a runtime.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The runtime's proxy type enum has no such scope.
    #[error("Proxy type {0} does not exist on this runtime")]
    UnsupportedProxyType(ProxyType),
}
