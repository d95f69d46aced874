mod jwt;

pub use jwt::{JwtMiddlewareFactory, JwtMiddlewareService};
