use std::fmt;

use tracing::warn;

use crate::auth::dto::{AuthResponse, LoginRequest, SignupRequest};
use crate::auth::validation::{is_valid_email, MIN_PASSWORD_LEN, MIN_USERNAME_LEN};
use crate::client::api::{AuthApi, ClientError};

const FILL_ALL_FIELDS: &str = "Please fill in all fields.";
const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";
const SIGNUP_FAILED: &str = "Signup failed. Please try again.";
const USER_EXISTS: &str = "User already exists. Please login or choose a different username.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Signup,
    Login,
}

impl Mode {
    pub fn other(self) -> Self {
        match self {
            Mode::Signup => Mode::Login,
            Mode::Login => Mode::Signup,
        }
    }

    /// Fields the view for this mode collects.
    pub fn fields(self) -> &'static [Field] {
        match self {
            Mode::Signup => &[Field::Username, Field::Email, Field::Password],
            Mode::Login => &[Field::Email, Field::Password],
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Signup => write!(f, "Create Account"),
            Mode::Login => write!(f, "Sign in"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Email,
    Password,
}

/// Immutable credentials value; edits produce a new value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    email: String,
    password: String,
}

impl Credentials {
    pub fn with(&self, field: Field, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        match field {
            Field::Username => next.username = value.into(),
            Field::Email => next.email = value.into(),
            Field::Password => next.password = value.into(),
        }
        next
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Username => &self.username,
            Field::Email => &self.email,
            Field::Password => &self.password,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.email.is_empty() && self.password.is_empty()
    }

    fn signup_request(&self) -> SignupRequest {
        SignupRequest {
            username: self.username.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }

    fn login_request(&self) -> LoginRequest {
        LoginRequest {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Two-mode signup/login form. Toggling resets the credentials and the error.
#[derive(Debug, Clone)]
pub struct AuthForm {
    mode: Mode,
    credentials: Credentials,
    error: Option<String>,
}

impl Default for AuthForm {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthForm {
    pub fn new() -> Self {
        Self {
            mode: Mode::Signup,
            credentials: Credentials::default(),
            error: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn edit(&mut self, field: Field, value: impl Into<String>) {
        self.credentials = self.credentials.with(field, value);
    }

    pub fn toggle(&mut self) {
        self.mode = self.mode.other();
        self.credentials = Credentials::default();
        self.error = None;
    }

    /// Local checks run before any network call; the service re-validates.
    pub fn prevalidate(&self) -> Result<(), &'static str> {
        let c = &self.credentials;
        match self.mode {
            Mode::Login => {
                if c.email.is_empty() || c.password.is_empty() {
                    return Err(FILL_ALL_FIELDS);
                }
            }
            Mode::Signup => {
                if c.username.is_empty() || c.email.is_empty() || c.password.is_empty() {
                    return Err(FILL_ALL_FIELDS);
                }
                if c.username.chars().count() < MIN_USERNAME_LEN {
                    return Err("Username must be at least 3 characters long.");
                }
                if !is_valid_email(&c.email) {
                    return Err("Invalid email address.");
                }
                if c.password.chars().count() < MIN_PASSWORD_LEN {
                    return Err("Password must be at least 6 characters long.");
                }
            }
        }
        Ok(())
    }

    /// Submits the current mode. On failure the error line is set and `None` returned.
    pub async fn submit(&mut self, api: &dyn AuthApi) -> Option<AuthResponse> {
        if let Err(msg) = self.prevalidate() {
            self.error = Some(msg.to_owned());
            return None;
        }

        let result = match self.mode {
            Mode::Login => api.login(&self.credentials.login_request()).await,
            Mode::Signup => api.signup(&self.credentials.signup_request()).await,
        };

        match result {
            Ok(res) => {
                self.error = None;
                Some(res)
            }
            Err(e) => {
                warn!(mode = ?self.mode, error = %e, "submit failed");
                self.error = Some(self.failure_message(&e).to_owned());
                None
            }
        }
    }

    fn failure_message(&self, e: &ClientError) -> &'static str {
        match self.mode {
            Mode::Login => LOGIN_FAILED,
            Mode::Signup if e.mentions("already exists") => USER_EXISTS,
            Mode::Signup => SIGNUP_FAILED,
        }
    }
}
