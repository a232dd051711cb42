//! Signup/login form that talks to the auth service over HTTP.

pub mod api;
pub mod form;

pub use api::{AuthApi, ClientError, HttpAuthApi, DEFAULT_BASE_URL};
pub use form::{AuthForm, Credentials, Field, Mode};
