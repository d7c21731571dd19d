/// Router Module Index
///
/// Splits the routing surface by access level. Public routes never consult
/// the Authorization header; gated routes each name the exact permission they
/// require, enforced inside the handler after the `BearerClaims` extractor
/// has validated the token.

/// Routes accessible to all clients (anonymous, read-only).
pub mod public;

/// Routes requiring a validated bearer token plus a specific permission.
pub mod gated;
