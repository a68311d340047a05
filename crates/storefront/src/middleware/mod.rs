//! HTTP middleware stack for the storefront API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//! 5. Security headers
//! 6. Rate limiting on register/login (governor)
//!
//! Authentication is not a layer: protected handlers take the [`RequireAuth`]
//! extractor.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::RequireAuth;
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
