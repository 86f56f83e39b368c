/// Router Module Index
///
/// Organizes the application's routing into access-segregated modules.
/// Method routing happens before any guard, so an unsupported method on a
/// known path is always 405 (with an `Allow` header), never 401 or 403.
///
/// Routes reachable without an identity: signup (csrf-guarded), token,
/// signin, health.
pub mod public;

/// Routes requiring a resolved identity. Every handler takes the
/// `AuthUser` extractor, which rejects anonymous callers with 401 before
/// existence or ownership is considered.
pub mod authenticated;
