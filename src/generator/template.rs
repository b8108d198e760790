//! Pre-resolved link generation for hot paths.

use std::sync::Arc;

use super::{LinkGenerator, check_scheme_and_host};
use crate::config::LinkOptions;
use crate::core::{FragmentString, HostString, PathString, RequestContext, RouteValues};
use crate::endpoint::RouteEndpoint;
use crate::error::LinkError;

/// An address resolved once, reused for many generation calls.
///
/// Ambient values from the request are ignored unless
/// [`use_ambient_values`](Self::use_ambient_values) is switched on.
#[derive(Debug)]
pub struct LinkGenerationTemplate<'a> {
    generator: &'a LinkGenerator,
    endpoints: Vec<Arc<RouteEndpoint>>,
    use_ambient_values: bool,
}

impl<'a> LinkGenerationTemplate<'a> {
    pub(super) fn new(generator: &'a LinkGenerator, endpoints: Vec<Arc<RouteEndpoint>>) -> Self {
        Self {
            generator,
            endpoints,
            use_ambient_values: false,
        }
    }

    pub fn use_ambient_values(mut self, enabled: bool) -> Self {
        self.use_ambient_values = enabled;
        self
    }

    /// Candidates in resolution order.
    pub fn endpoints(&self) -> &[Arc<RouteEndpoint>] {
        &self.endpoints
    }

    fn ambient<'c>(&self, ctx: Option<&'c RequestContext>) -> Option<&'c RouteValues> {
        ctx.filter(|_| self.use_ambient_values).map(|c| &c.route_values)
    }

    pub fn path(
        &self,
        ctx: Option<&RequestContext>,
        values: &RouteValues,
        path_base: Option<&PathString>,
        fragment: Option<&FragmentString>,
        options: Option<&LinkOptions>,
    ) -> Option<String> {
        let call = self.generator.call(ctx, values, self.ambient(ctx), options);
        let path_base = path_base.or(ctx.map(|c| &c.path_base));
        self.generator.generate_path(&call, &self.endpoints, path_base, fragment)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn uri(
        &self,
        ctx: Option<&RequestContext>,
        values: &RouteValues,
        scheme: Option<&str>,
        host: Option<&HostString>,
        path_base: Option<&PathString>,
        fragment: Option<&FragmentString>,
        options: Option<&LinkOptions>,
    ) -> Result<Option<String>, LinkError> {
        let scheme = scheme.or(ctx.map(|c| c.scheme.as_str())).unwrap_or_default();
        let no_host = HostString::default();
        let host = host.or(ctx.map(|c| &c.host)).unwrap_or(&no_host);
        check_scheme_and_host(scheme, host)?;

        let call = self.generator.call(ctx, values, self.ambient(ctx), options);
        let path_base = path_base.or(ctx.map(|c| &c.path_base));
        Ok(self
            .generator
            .generate_uri(&call, &self.endpoints, scheme, host, path_base, fragment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::core::RouteValue;
    use crate::endpoint::InMemoryDataSource;
    use crate::pattern::RoutePattern;

    fn generator() -> LinkGenerator {
        let endpoint = RouteEndpoint::new(
            "items",
            RoutePattern::parse("/{controller}/items/{id}").unwrap(),
        )
        .with_name("items")
        .into_shared();
        LinkGenerator::new(Arc::new(InMemoryDataSource::new(vec![endpoint])))
    }

    #[test]
    fn test_missing_address_has_no_template() {
        assert!(generator().template(&Address::name("nope")).is_none());
    }

    #[test]
    fn test_reused_for_many_values() {
        let g = generator();
        let template = g.template(&Address::name("items")).unwrap();
        assert_eq!(template.endpoints().len(), 1);

        for id in 1..=3 {
            let values = RouteValues::from([
                ("controller", RouteValue::from("shop")),
                ("id", RouteValue::from(id)),
            ]);
            assert_eq!(
                template.path(None, &values, None, None, None),
                Some(format!("/shop/items/{id}"))
            );
        }
    }

    #[test]
    fn test_ambient_values_opt_in() {
        let g = generator();
        let ctx = RequestContext::new("https", "example.com")
            .with_route_values(RouteValues::from([("controller", "shop")]));
        let values = RouteValues::from([("id", 9)]);

        let template = g.template(&Address::name("items")).unwrap();
        assert_eq!(template.path(Some(&ctx), &values, None, None, None), None);

        let template = template.use_ambient_values(true);
        assert_eq!(
            template.path(Some(&ctx), &values, None, None, None).as_deref(),
            Some("/shop/items/9")
        );
        assert_eq!(
            template
                .uri(Some(&ctx), &values, None, None, None, None, None)
                .unwrap()
                .as_deref(),
            Some("https://example.com/shop/items/9")
        );
    }

    #[test]
    fn test_uri_without_context_needs_scheme_and_host() {
        let g = generator();
        let template = g.template(&Address::name("items")).unwrap();
        let values = RouteValues::new();
        assert_eq!(
            template.uri(None, &values, None, None, None, None, None),
            Err(LinkError::MissingScheme)
        );
        assert_eq!(
            template.uri(None, &values, Some("https"), None, None, None, None),
            Err(LinkError::MissingHost)
        );
    }
}
