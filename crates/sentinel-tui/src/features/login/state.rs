use sentinel_core::auth::{Credentials, LoginStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

/// Login surface state.
#[derive(Debug, Clone)]
pub struct LoginState {
    pub strategy: LoginStrategy,
    pub username: String,
    pub password: String,
    pub focus: LoginField,
    /// Message from the last failed attempt.
    pub error: Option<String>,
    /// Mirrors the orchestrator's busy flag; disables submit.
    pub busy: bool,
}

impl LoginState {
    pub fn new(strategy: LoginStrategy) -> Self {
        Self {
            strategy,
            username: String::new(),
            password: String::new(),
            focus: LoginField::Username,
            error: None,
            busy: false,
        }
    }

    pub fn uses_form(&self) -> bool {
        self.strategy == LoginStrategy::Password
    }

    pub fn can_submit(&self) -> bool {
        !self.busy
    }

    /// Credentials to submit, or `None` for the interactive strategy.
    pub fn credentials(&self) -> Option<Credentials> {
        self.uses_form()
            .then(|| Credentials::new(self.username.trim(), self.password.clone()))
    }

    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }
}
