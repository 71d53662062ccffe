use axum::http::{header, HeaderName, HeaderValue};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

const PERMISSIONS_POLICY: &str = "permissions-policy";

const NOSNIFF: &str = "nosniff";
const DENY: &str = "DENY";
const XSS_BLOCK: &str = "1; mode=block";
const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";
const CSP_API_VALUE: &str = "default-src 'none'; frame-ancestors 'none'";
const REFERRER_POLICY_VALUE: &str = "strict-origin-when-cross-origin";
const PERMISSIONS_POLICY_VALUE: &str = "geolocation=(), microphone=(), camera=()";

fn security_headers(include_hsts: bool) -> Vec<(HeaderName, HeaderValue)> {
    let mut headers = vec![
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static(NOSNIFF)),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static(DENY)),
        (header::X_XSS_PROTECTION, HeaderValue::from_static(XSS_BLOCK)),
        (header::CONTENT_SECURITY_POLICY, HeaderValue::from_static(CSP_API_VALUE)),
        (header::REFERRER_POLICY, HeaderValue::from_static(REFERRER_POLICY_VALUE)),
        (HeaderName::from_static(PERMISSIONS_POLICY), HeaderValue::from_static(PERMISSIONS_POLICY_VALUE)),
    ];

    // HSTS only makes sense behind HTTPS
    if include_hsts {
        headers.push((header::STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS_VALUE)));
    }

    headers
}

/// Adds the standard security headers to every response from `router`.
pub fn with_security_headers(router: Router, include_hsts: bool) -> Router {
    if include_hsts {
        tracing::info!("Security: HSTS header enabled (production mode)");
    } else {
        tracing::info!("Security: HSTS header disabled (development mode)");
    }

    security_headers(include_hsts)
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::overriding(name, value))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsts_only_in_production() {
        let dev = security_headers(false);
        assert!(!dev
            .iter()
            .any(|(name, _)| *name == header::STRICT_TRANSPORT_SECURITY));

        let prod = security_headers(true);
        assert_eq!(prod.len(), dev.len() + 1);
        assert!(prod
            .iter()
            .any(|(name, _)| *name == header::STRICT_TRANSPORT_SECURITY));
    }
}
