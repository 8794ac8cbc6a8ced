mod auth;

pub use auth::RequireKeyAuth;
