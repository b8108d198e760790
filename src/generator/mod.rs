//! Link generation.
//!
//! [`LinkGenerator`] resolves an [`Address`] to candidate endpoints, tries
//! each candidate's [`TemplateBinder`] in order and returns the first link
//! that binds.
//!
//! ```text
//! address ──► AddressSchemes ──► [e1, e2, ...]
//!                                  │
//!              for each endpoint:  ▼
//!              get_values ─► try_process_constraints ─► try_bind_values
//!                                  │ first success
//!                                  ▼
//!                          build_relative / build_absolute
//! ```
//!
//! Not found is `None`. Absolute variants return `Err(LinkError)` when the
//! scheme or host is missing, before any endpoint is looked up.

mod assemble;
mod template;

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

pub use assemble::{build_absolute, build_relative};
pub use template::LinkGenerationTemplate;

use crate::address::{Address, AddressSchemes, RouteValuesAddress};
use crate::binder::{BoundTemplate, TemplateBinder};
use crate::cache::TemplateBinderCache;
use crate::config::{LinkOptions, RouteOptions, resolve_options};
use crate::core::{FragmentString, HostString, PathString, RequestContext, RouteValues};
use crate::diagnostics::{DiagnosticSink, LinkEvent, NullSink};
use crate::endpoint::{EndpointDataSource, RouteEndpoint};
use crate::error::{BindFailure, LinkError};

/// Inputs shared by every candidate of one generation call.
struct Call<'a> {
    request: Option<&'a RequestContext>,
    values: &'a RouteValues,
    ambient: Option<&'a RouteValues>,
    options: RouteOptions,
}

/// Generates paths and absolute URIs for addresses.
pub struct LinkGenerator {
    schemes: AddressSchemes,
    binders: TemplateBinderCache,
    options: ArcSwap<RouteOptions>,
    sink: Arc<dyn DiagnosticSink>,
}

impl LinkGenerator {
    /// Generator with the built-in address schemes, default options and no
    /// diagnostics.
    pub fn new(source: Arc<dyn EndpointDataSource>) -> Self {
        Self {
            schemes: AddressSchemes::with_defaults(Arc::clone(&source)),
            binders: TemplateBinderCache::new(source),
            options: ArcSwap::from_pointee(RouteOptions::default()),
            sink: Arc::new(NullSink),
        }
    }

    pub fn with_schemes(mut self, schemes: AddressSchemes) -> Self {
        self.schemes = schemes;
        self
    }

    pub fn with_options(self, options: RouteOptions) -> Self {
        self.set_route_options(options);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Global options used when a call does not override them.
    pub fn route_options(&self) -> RouteOptions {
        **self.options.load()
    }

    /// Atomically replace the global options. Calls already running keep
    /// the options they started with.
    pub fn set_route_options(&self, options: RouteOptions) {
        self.options.store(Arc::new(options));
    }

    /// Cached binder for `endpoint`, created on first use.
    pub fn template_binder(&self, endpoint: &Arc<RouteEndpoint>) -> Arc<TemplateBinder> {
        self.binders.get(endpoint)
    }

    // ========================================================================
    // By address
    // ========================================================================

    pub fn path_by_address(
        &self,
        address: &Address,
        values: &RouteValues,
        path_base: Option<&PathString>,
        fragment: Option<&FragmentString>,
        options: Option<&LinkOptions>,
    ) -> Option<String> {
        let endpoints = self.find_endpoints(address, None);
        let call = self.call(None, values, None, options);
        self.generate_path(&call, &endpoints, path_base, fragment)
    }

    /// Like [`path_by_address`](Self::path_by_address), with the path base
    /// taken from `ctx` unless given.
    ///
    /// Ambient values are the caller's. Only route-values addresses fall
    /// back to the request's route values when none are given.
    pub fn path_by_address_in(
        &self,
        ctx: &RequestContext,
        address: &Address,
        values: &RouteValues,
        ambient: Option<&RouteValues>,
        path_base: Option<&PathString>,
        fragment: Option<&FragmentString>,
        options: Option<&LinkOptions>,
    ) -> Option<String> {
        let ambient = request_ambient(ctx, address, ambient);
        let endpoints = self.find_endpoints(address, ambient);
        let call = self.call(Some(ctx), values, ambient, options);
        self.generate_path(&call, &endpoints, Some(path_base.unwrap_or(&ctx.path_base)), fragment)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn uri_by_address(
        &self,
        address: &Address,
        values: &RouteValues,
        scheme: &str,
        host: &HostString,
        path_base: Option<&PathString>,
        fragment: Option<&FragmentString>,
        options: Option<&LinkOptions>,
    ) -> Result<Option<String>, LinkError> {
        check_scheme_and_host(scheme, host)?;
        let endpoints = self.find_endpoints(address, None);
        let call = self.call(None, values, None, options);
        Ok(self.generate_uri(&call, &endpoints, scheme, host, path_base, fragment))
    }

    /// Like [`uri_by_address`](Self::uri_by_address), with scheme, host and
    /// path base taken from `ctx` unless given. Ambient values follow
    /// [`path_by_address_in`](Self::path_by_address_in).
    #[allow(clippy::too_many_arguments)]
    pub fn uri_by_address_in(
        &self,
        ctx: &RequestContext,
        address: &Address,
        values: &RouteValues,
        ambient: Option<&RouteValues>,
        scheme: Option<&str>,
        host: Option<&HostString>,
        path_base: Option<&PathString>,
        fragment: Option<&FragmentString>,
        options: Option<&LinkOptions>,
    ) -> Result<Option<String>, LinkError> {
        let scheme = scheme.unwrap_or(&ctx.scheme);
        let host = host.unwrap_or(&ctx.host);
        check_scheme_and_host(scheme, host)?;

        let ambient = request_ambient(ctx, address, ambient);
        let endpoints = self.find_endpoints(address, ambient);
        let call = self.call(Some(ctx), values, ambient, options);
        let path_base = path_base.unwrap_or(&ctx.path_base);
        Ok(self.generate_uri(&call, &endpoints, scheme, host, Some(path_base), fragment))
    }

    pub fn path_by_name(
        &self,
        name: &str,
        values: &RouteValues,
        path_base: Option<&PathString>,
        fragment: Option<&FragmentString>,
        options: Option<&LinkOptions>,
    ) -> Option<String> {
        self.path_by_address(&Address::name(name), values, path_base, fragment, options)
    }

    pub fn path_by_route_values(
        &self,
        route_name: Option<&str>,
        values: &RouteValues,
        path_base: Option<&PathString>,
        fragment: Option<&FragmentString>,
        options: Option<&LinkOptions>,
    ) -> Option<String> {
        let address = Address::route_values(route_name, values.clone());
        self.path_by_address(&address, values, path_base, fragment, options)
    }

    // ========================================================================
    // By endpoints
    // ========================================================================

    /// Generate from an explicit candidate list, skipping address resolution.
    pub fn path_by_endpoints(
        &self,
        endpoints: &[Arc<RouteEndpoint>],
        values: &RouteValues,
        ambient: Option<&RouteValues>,
        path_base: Option<&PathString>,
        fragment: Option<&FragmentString>,
        options: Option<&LinkOptions>,
    ) -> Option<String> {
        let call = self.call(None, values, ambient, options);
        self.generate_path(&call, endpoints, path_base, fragment)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn uri_by_endpoints(
        &self,
        endpoints: &[Arc<RouteEndpoint>],
        values: &RouteValues,
        ambient: Option<&RouteValues>,
        scheme: &str,
        host: &HostString,
        path_base: Option<&PathString>,
        fragment: Option<&FragmentString>,
        options: Option<&LinkOptions>,
    ) -> Result<Option<String>, LinkError> {
        check_scheme_and_host(scheme, host)?;
        let call = self.call(None, values, ambient, options);
        Ok(self.generate_uri(&call, endpoints, scheme, host, path_base, fragment))
    }

    /// Resolve `address` once for repeated generation.
    ///
    /// Returns `None` when the address has no endpoints.
    pub fn template(&self, address: &Address) -> Option<LinkGenerationTemplate<'_>> {
        let endpoints = self.find_endpoints(address, None);
        if endpoints.is_empty() {
            return None;
        }
        Some(LinkGenerationTemplate::new(self, endpoints))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn call<'a>(
        &self,
        request: Option<&'a RequestContext>,
        values: &'a RouteValues,
        ambient: Option<&'a RouteValues>,
        options: Option<&LinkOptions>,
    ) -> Call<'a> {
        Call {
            request,
            values,
            ambient,
            options: resolve_options(options, &self.options.load()),
        }
    }

    fn find_endpoints(
        &self,
        address: &Address,
        ambient: Option<&RouteValues>,
    ) -> Vec<Arc<RouteEndpoint>> {
        let endpoints = match address {
            // Route-values addressing falls back to the request's ambient values
            Address::RouteValues(inner) if inner.ambient_values.is_none() && ambient.is_some() => {
                let address = Address::RouteValues(RouteValuesAddress {
                    ambient_values: ambient.cloned(),
                    ..inner.clone()
                });
                self.schemes.find_endpoints(&address)
            }
            _ => self.schemes.find_endpoints(address),
        };

        if self.sink.enabled() {
            let address = address.to_string();
            let event = if endpoints.is_empty() {
                LinkEvent::EndpointsNotFound { address }
            } else {
                LinkEvent::EndpointsFound {
                    address,
                    endpoints: display_names(&endpoints),
                }
            };
            self.sink.emit(&event);
        }
        endpoints
    }

    fn generate_path(
        &self,
        call: &Call<'_>,
        endpoints: &[Arc<RouteEndpoint>],
        path_base: Option<&PathString>,
        fragment: Option<&FragmentString>,
    ) -> Option<String> {
        let no_base = PathString::empty();
        let no_fragment = FragmentString::empty();
        let path_base = path_base.unwrap_or(&no_base);
        let fragment = fragment.unwrap_or(&no_fragment);

        self.generate(call, endpoints, |bound| {
            build_relative(path_base, &bound.path, &bound.query, fragment)
        })
    }

    fn generate_uri(
        &self,
        call: &Call<'_>,
        endpoints: &[Arc<RouteEndpoint>],
        scheme: &str,
        host: &HostString,
        path_base: Option<&PathString>,
        fragment: Option<&FragmentString>,
    ) -> Option<String> {
        let no_base = PathString::empty();
        let no_fragment = FragmentString::empty();
        let path_base = path_base.unwrap_or(&no_base);
        let fragment = fragment.unwrap_or(&no_fragment);

        self.generate(call, endpoints, |bound| {
            build_absolute(scheme, host, path_base, &bound.path, &bound.query, fragment)
        })
    }

    /// First candidate that binds wins.
    fn generate(
        &self,
        call: &Call<'_>,
        endpoints: &[Arc<RouteEndpoint>],
        assemble: impl Fn(&BoundTemplate) -> String,
    ) -> Option<String> {
        if endpoints.is_empty() {
            return None;
        }

        for endpoint in endpoints {
            let Some(bound) = self.try_process_template(call, endpoint) else {
                continue;
            };
            let uri = assemble(&bound);
            if self.sink.enabled() {
                self.sink.emit(&LinkEvent::LinkGenerationSucceeded {
                    endpoints: display_names(endpoints),
                    uri: uri.clone(),
                });
            }
            return Some(uri);
        }

        if self.sink.enabled() {
            self.sink.emit(&LinkEvent::LinkGenerationFailed {
                endpoints: display_names(endpoints),
            });
        }
        None
    }

    fn try_process_template(
        &self,
        call: &Call<'_>,
        endpoint: &Arc<RouteEndpoint>,
    ) -> Option<BoundTemplate> {
        let binder = self.binders.get(endpoint);
        let pattern = binder.pattern();

        let Ok(result) = binder.get_values(call.ambient, call.values) else {
            if self.sink.enabled() {
                self.sink.emit(&LinkEvent::TemplateFailedRequiredValues {
                    template: pattern.raw_text().to_string(),
                    endpoint: endpoint.display_name.clone(),
                    ambient_values: call
                        .ambient
                        .map(RouteValues::to_diagnostic_string)
                        .unwrap_or_else(|| RouteValues::new().to_diagnostic_string()),
                    values: call.values.to_diagnostic_string(),
                    defaults: pattern.defaults().to_diagnostic_string(),
                });
            }
            return None;
        };

        if let Err(failure) = binder.try_process_constraints(call.request, &result.combined) {
            if self.sink.enabled()
                && let BindFailure::ConstraintFailed {
                    parameter,
                    constraint,
                } = failure
            {
                self.sink.emit(&LinkEvent::TemplateFailedConstraint {
                    template: pattern.raw_text().to_string(),
                    endpoint: endpoint.display_name.clone(),
                    parameter,
                    constraint,
                    values: result.combined.to_diagnostic_string(),
                });
            }
            return None;
        }

        match binder.try_bind_values(&result.accepted, &call.options) {
            Ok(bound) => {
                if self.sink.enabled() {
                    self.sink.emit(&LinkEvent::TemplateSucceeded {
                        template: pattern.raw_text().to_string(),
                        endpoint: endpoint.display_name.clone(),
                        path: bound.path.clone(),
                        query: bound.query.to_string(),
                    });
                }
                Some(bound)
            }
            Err(_) => {
                if self.sink.enabled() {
                    self.sink.emit(&LinkEvent::TemplateFailedExpansion {
                        template: pattern.raw_text().to_string(),
                        endpoint: endpoint.display_name.clone(),
                        values: result.accepted.to_diagnostic_string(),
                    });
                }
                None
            }
        }
    }
}

impl fmt::Debug for LinkGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkGenerator")
            .field("schemes", &self.schemes)
            .field("binders", &self.binders)
            .field("options", &self.route_options())
            .finish_non_exhaustive()
    }
}

fn check_scheme_and_host(scheme: &str, host: &HostString) -> Result<(), LinkError> {
    if scheme.is_empty() {
        return Err(LinkError::MissingScheme);
    }
    if !host.has_value() {
        return Err(LinkError::MissingHost);
    }
    Ok(())
}

/// Ambient values for a request-scoped call.
fn request_ambient<'a>(
    ctx: &'a RequestContext,
    address: &Address,
    ambient: Option<&'a RouteValues>,
) -> Option<&'a RouteValues> {
    match address {
        Address::RouteValues(_) => Some(ambient.unwrap_or(&ctx.route_values)),
        _ => ambient,
    }
}

fn display_names(endpoints: &[Arc<RouteEndpoint>]) -> Vec<String> {
    endpoints.iter().map(|e| e.display_name.clone()).collect()
}
