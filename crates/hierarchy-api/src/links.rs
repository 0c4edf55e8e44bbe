use axum::http::{header::HOST, HeaderMap};
use hierarchy_core::{HierarchyId, Link, Links, LinksConfig, Response};
use tracing::warn;
use url::Url;

pub const FORWARDED_PROTO: &str = "x-forwarded-proto";
pub const FORWARDED_HOST: &str = "x-forwarded-host";
pub const FORWARDED_PATH_PREFIX: &str = "x-forwarded-path-prefix";

/// Build a link to `target` under `base`, or to `base` itself when there is no target.
pub fn build_link(base: &str, target: Option<&str>, id: Option<&str>) -> Link {
    let href = match target {
        Some(target) => join_segments(base, &[target]),
        None => base.to_string(),
    };
    Link {
        id: id.map(str::to_string),
        href,
    }
}

/// Base URLs used for the links of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBases {
    pub hierarchy: String,
    pub code_list: String,
}

impl LinkBases {
    pub fn new(hierarchy: impl Into<String>, code_list: impl Into<String>) -> Self {
        Self {
            hierarchy: trim_base(&hierarchy.into()),
            code_list: trim_base(&code_list.into()),
        }
    }
}

/// Chooses link bases for a request: the configured URLs, or the address the
/// client reached us through when URL rewriting is enabled.
#[derive(Debug, Clone)]
pub struct UrlResolver {
    hierarchy_api_url: String,
    code_list_api_url: String,
    rewrite: bool,
}

impl UrlResolver {
    pub fn new(config: &LinksConfig) -> Self {
        Self {
            hierarchy_api_url: trim_base(&config.hierarchy_api_url),
            code_list_api_url: trim_base(&config.code_list_api_url),
            rewrite: config.enable_url_rewriting,
        }
    }

    pub fn rewriting_enabled(&self) -> bool {
        self.rewrite
    }

    pub fn resolve(&self, headers: &HeaderMap) -> LinkBases {
        if !self.rewrite {
            return LinkBases::new(&self.hierarchy_api_url, &self.code_list_api_url);
        }
        LinkBases::new(
            base_from_headers(headers, &self.hierarchy_api_url),
            base_from_headers(headers, &self.code_list_api_url),
        )
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// `X-Forwarded-Host` wins; a forwarded proto or prefix alone applies to the
/// request's own `Host`; without any forwarding headers the default is kept.
fn base_from_headers(headers: &HeaderMap, default: &str) -> String {
    let proto = header(headers, FORWARDED_PROTO);
    let prefix = header(headers, FORWARDED_PATH_PREFIX);
    let host = match header(headers, FORWARDED_HOST) {
        Some(host) => host,
        None if proto.is_some() || prefix.is_some() => match header(headers, HOST.as_str()) {
            Some(host) => host,
            None => return default.to_string(),
        },
        None => return default.to_string(),
    };

    let scheme = proto.unwrap_or("https");
    let mut url = match Url::parse(&format!("{}://{}", scheme, host)) {
        Ok(url) => url,
        Err(e) => {
            warn!(host, scheme, error = %e, "Ignoring malformed forwarding headers");
            return default.to_string();
        }
    };
    let prefix = prefix.map(|p| p.trim_matches('/')).unwrap_or_default();
    if !prefix.is_empty() {
        url.set_path(&format!("/{}", prefix));
    }
    trim_base(url.as_str())
}

fn trim_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

/// Append percent-encoded path segments to `base`.
fn join_segments(base: &str, segments: &[&str]) -> String {
    match Url::parse(base) {
        Ok(mut url) => {
            let appended = match url.path_segments_mut() {
                Ok(mut path) => {
                    path.pop_if_empty().extend(segments);
                    true
                }
                Err(()) => false,
            };
            if appended {
                return trim_base(url.as_str());
            }
            warn!(base, "Link base cannot carry a path, appending segments unencoded");
            format!("{}/{}", base, segments.join("/"))
        }
        Err(e) => {
            warn!(base, error = %e, "Link base is not a URL, appending segments unencoded");
            format!("{}/{}", base, segments.join("/"))
        }
    }
}

/// Absolute URLs of one hierarchy and of the code list it enumerates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyLinks {
    hierarchy_url: String,
    code_list_url: String,
}

impl HierarchyLinks {
    pub fn new(bases: &LinkBases, id: &HierarchyId, code_list_id: &str) -> Self {
        Self {
            hierarchy_url: join_segments(
                &bases.hierarchy,
                &["hierarchies", &id.instance_id, &id.dimension],
            ),
            code_list_url: join_segments(&bases.code_list, &["code-lists", code_list_id, "codes"]),
        }
    }

    pub fn hierarchy_url(&self) -> &str {
        &self.hierarchy_url
    }

    pub fn code_list_url(&self) -> &str {
        &self.code_list_url
    }

    /// Links of the hierarchy root: no code segment on either href.
    pub fn root(&self, code: &str) -> Links {
        Links {
            code: build_link(&self.code_list_url, None, Some(code)),
            self_link: build_link(&self.hierarchy_url, None, None),
        }
    }

    pub fn node(&self, code: &str) -> Links {
        Links {
            code: build_link(&self.code_list_url, Some(code), Some(code)),
            self_link: build_link(&self.hierarchy_url, Some(code), Some(code)),
        }
    }

    /// Attach links to a response, its children and its breadcrumbs.
    pub fn decorate(&self, response: &mut Response, is_root: bool) {
        response.links = Some(if is_root {
            self.root(&response.id)
        } else {
            self.node(&response.id)
        });

        for child in &mut response.children {
            child.links = Some(self.node(&child.id));
        }

        for crumb in &mut response.breadcrumbs {
            crumb.links = Some(self.node(&crumb.id));
        }
        // The last breadcrumb is the hierarchy root; it keeps its id.
        if let Some(links) = response
            .breadcrumbs
            .last_mut()
            .and_then(|root| root.links.as_mut())
        {
            links.self_link.href = self.hierarchy_url.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use hierarchy_core::HierarchyNode;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(*v));
        }
        map
    }

    fn resolver(rewrite: bool) -> UrlResolver {
        UrlResolver::new(&LinksConfig {
            hierarchy_api_url: "http://localhost:22600/".into(),
            code_list_api_url: "http://localhost:22400".into(),
            enable_url_rewriting: rewrite,
        })
    }

    fn node(code: &str) -> HierarchyNode {
        HierarchyNode {
            code: code.into(),
            label: code.to_uppercase(),
            has_data: false,
            number_of_children: 0,
            order: None,
        }
    }

    #[test]
    fn build_link_without_target_is_the_base() {
        assert_eq!(
            build_link("http://h", None, None),
            Link { id: None, href: "http://h".into() }
        );
        assert_eq!(
            build_link("http://h", Some("c1"), Some("c1")),
            Link { id: Some("c1".into()), href: "http://h/c1".into() }
        );
    }

    #[test]
    fn rewriting_disabled_ignores_headers() {
        let bases = resolver(false).resolve(&headers(&[
            (FORWARDED_HOST, "api.example.com"),
            (FORWARDED_PATH_PREFIX, "v1"),
        ]));
        assert_eq!(bases, LinkBases::new("http://localhost:22600", "http://localhost:22400"));
    }

    #[test]
    fn forwarded_headers_build_the_public_base() {
        let bases = resolver(true).resolve(&headers(&[
            (FORWARDED_PROTO, "https"),
            (FORWARDED_HOST, "api.example.com"),
            (FORWARDED_PATH_PREFIX, "/v1/"),
        ]));
        assert_eq!(bases.hierarchy, "https://api.example.com/v1");
        assert_eq!(bases.code_list, "https://api.example.com/v1");
    }

    #[test]
    fn forwarded_host_defaults_to_https() {
        let bases = resolver(true).resolve(&headers(&[(FORWARDED_HOST, "api.example.com:8443")]));
        assert_eq!(bases.hierarchy, "https://api.example.com:8443");
    }

    #[test]
    fn prefix_without_forwarded_host_uses_request_host() {
        let bases = resolver(true).resolve(&headers(&[
            ("host", "internal:22600"),
            (FORWARDED_PROTO, "http"),
            (FORWARDED_PATH_PREFIX, "hierarchy"),
        ]));
        assert_eq!(bases.hierarchy, "http://internal:22600/hierarchy");
    }

    #[test]
    fn no_forwarding_headers_keeps_defaults() {
        let bases = resolver(true).resolve(&headers(&[("host", "internal:22600")]));
        assert_eq!(bases, LinkBases::new("http://localhost:22600", "http://localhost:22400"));
    }

    #[test]
    fn malformed_forwarded_host_falls_back() {
        let bases = resolver(true).resolve(&headers(&[(FORWARDED_HOST, "bad host/..")]));
        assert_eq!(bases.hierarchy, "http://localhost:22600");
    }

    #[test]
    fn root_links_carry_no_code_segment() {
        let links = HierarchyLinks::new(
            &LinkBases::new("http://h", "http://cl"),
            &HierarchyId::new("hier12", "dim34"),
            "clistABC",
        );
        let root = links.root("r");
        assert_eq!(root.self_link, Link { id: None, href: "http://h/hierarchies/hier12/dim34".into() });
        assert_eq!(
            root.code,
            Link { id: Some("r".into()), href: "http://cl/code-lists/clistABC/codes".into() }
        );
        let node = links.node("c1");
        assert_eq!(node.self_link.href, "http://h/hierarchies/hier12/dim34/c1");
        assert_eq!(node.code.href, "http://cl/code-lists/clistABC/codes/c1");
    }

    #[test]
    fn decorate_fixes_the_outermost_breadcrumb() {
        let links = HierarchyLinks::new(
            &LinkBases::new("http://h", "http://cl"),
            &HierarchyId::new("i", "d"),
            "cl",
        );
        let mut response = Response::new(node("leaf"), vec![node("kid")])
            .with_breadcrumbs(vec![node("parent"), node("root")]);
        links.decorate(&mut response, false);

        let own = response.links.as_ref().unwrap();
        assert_eq!(own.self_link.href, "http://h/hierarchies/i/d/leaf");
        assert_eq!(
            response.children[0].links.as_ref().unwrap().self_link.href,
            "http://h/hierarchies/i/d/kid"
        );
        let parent = response.breadcrumbs[0].links.as_ref().unwrap();
        assert_eq!(parent.self_link.href, "http://h/hierarchies/i/d/parent");
        let root = response.breadcrumbs[1].links.as_ref().unwrap();
        assert_eq!(
            root.self_link,
            Link { id: Some("root".into()), href: "http://h/hierarchies/i/d".into() }
        );
        assert_eq!(root.code.href, "http://cl/code-lists/cl/codes/root");
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        let links = HierarchyLinks::new(
            &LinkBases::new("http://h/api", "http://cl"),
            &HierarchyId::new("in st", "d/1"),
            "cl#1",
        );
        assert_eq!(links.hierarchy_url(), "http://h/api/hierarchies/in%20st/d%2F1");
        assert_eq!(links.code_list_url(), "http://cl/code-lists/cl%231/codes");

        let node = links.node("a?b");
        assert_eq!(node.self_link.href, "http://h/api/hierarchies/in%20st/d%2F1/a%3Fb");
        assert_eq!(node.self_link.id.as_deref(), Some("a?b"));
        assert_eq!(node.code.href, "http://cl/code-lists/cl%231/codes/a%3Fb");
    }
}
