//! Response headers applied to every route: permissive CORS and a
//! helmet-style set of security headers.

use actix_cors::Cors;
use actix_web::middleware::DefaultHeaders;

/// CORS policy allowing any origin, method and header.
pub fn cors() -> Cors {
    Cors::permissive()
}

/// Security headers added to responses that do not already set them.
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "SAMEORIGIN"))
        .add(("X-DNS-Prefetch-Control", "off"))
        .add(("X-Download-Options", "noopen"))
        .add(("X-Permitted-Cross-Domain-Policies", "none"))
        .add(("Referrer-Policy", "no-referrer"))
        .add(("Cross-Origin-Opener-Policy", "same-origin"))
        .add(("Cross-Origin-Resource-Policy", "same-origin"))
        .add((
            "Strict-Transport-Security",
            "max-age=15552000; includeSubDomains",
        ))
        .add((
            "Content-Security-Policy",
            "default-src 'self'; frame-ancestors 'self'; object-src 'none'",
        ))
}
