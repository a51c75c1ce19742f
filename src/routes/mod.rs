/// Router Module Index
///
/// Organizes the application's routing logic into access-segregated modules.
/// Access control is applied explicitly at the module level, so protected
/// endpoints can never be exposed by accident.

/// Routes accessible to all clients: health check and login.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware (any valid user).
pub mod authenticated;

/// Routes whose handlers additionally require the admin role.
pub mod admin;
