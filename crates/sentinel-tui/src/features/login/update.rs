//! Login surface reducer.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use sentinel_core::auth::{Credentials, LoginOutcome};

use super::state::{LoginField, LoginState};

/// What the app reducer should do after a key on the login surface.
#[derive(Debug, PartialEq, Eq)]
pub enum LoginAction {
    None,
    Submit(Option<Credentials>),
    /// Esc while an attempt is running.
    Cancel,
    /// Esc while idle.
    Quit,
}

pub fn handle_key(login: &mut LoginState, key: KeyEvent) -> LoginAction {
    match key.code {
        KeyCode::Esc => {
            if login.busy {
                LoginAction::Cancel
            } else {
                LoginAction::Quit
            }
        }
        KeyCode::Enter => {
            if !login.can_submit() {
                return LoginAction::None;
            }
            if login.uses_form() && login.focus == LoginField::Username {
                login.focus = LoginField::Password;
                return LoginAction::None;
            }
            LoginAction::Submit(login.credentials())
        }
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down if login.uses_form() => {
            login.toggle_focus();
            LoginAction::None
        }
        KeyCode::Backspace if login.uses_form() && !login.busy => {
            login.focused_mut().pop();
            LoginAction::None
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            if login.uses_form() && !login.busy {
                login.focused_mut().clear();
            }
            LoginAction::None
        }
        KeyCode::Char(c)
            if login.uses_form()
                && !login.busy
                && !key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            login.focused_mut().push(c);
            LoginAction::None
        }
        _ => LoginAction::None,
    }
}

pub fn handle_paste(login: &mut LoginState, text: &str) {
    if login.uses_form() && !login.busy {
        login
            .focused_mut()
            .extend(text.chars().filter(|c| !c.is_control()));
    }
}

/// Applies a finished attempt to the surface.
pub fn handle_outcome(login: &mut LoginState, outcome: &LoginOutcome) {
    login.busy = false;
    match outcome {
        LoginOutcome::Succeeded => {
            login.error = None;
            login.password.clear();
        }
        LoginOutcome::Failed { message, .. } => {
            login.error = Some(message.clone());
            login.password.clear();
            if login.uses_form() {
                login.focus = LoginField::Password;
            }
        }
        LoginOutcome::Busy => {}
    }
}

#[cfg(test)]
mod tests {
    use sentinel_core::auth::{ErrorKind, LoginStrategy};

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(login: &mut LoginState, text: &str) {
        for c in text.chars() {
            handle_key(login, key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_form_entry_and_submit() {
        let mut login = LoginState::new(LoginStrategy::Password);
        type_text(&mut login, "alice");
        assert_eq!(handle_key(&mut login, key(KeyCode::Enter)), LoginAction::None);
        assert_eq!(login.focus, LoginField::Password);
        type_text(&mut login, "secrett");
        handle_key(&mut login, key(KeyCode::Backspace));

        let action = handle_key(&mut login, key(KeyCode::Enter));
        assert_eq!(
            action,
            LoginAction::Submit(Some(Credentials::new("alice", "secret")))
        );
    }

    #[test]
    fn test_busy_blocks_submit_and_esc_cancels() {
        let mut login = LoginState::new(LoginStrategy::Interactive);
        login.busy = true;
        assert_eq!(handle_key(&mut login, key(KeyCode::Enter)), LoginAction::None);
        assert_eq!(handle_key(&mut login, key(KeyCode::Esc)), LoginAction::Cancel);

        login.busy = false;
        assert_eq!(
            handle_key(&mut login, key(KeyCode::Enter)),
            LoginAction::Submit(None)
        );
        assert_eq!(handle_key(&mut login, key(KeyCode::Esc)), LoginAction::Quit);
    }

    #[test]
    fn test_failure_shows_message_and_clears_password() {
        let mut login = LoginState::new(LoginStrategy::Password);
        login.username = "alice".into();
        login.password = "wrong".into();
        login.busy = true;

        handle_outcome(
            &mut login,
            &LoginOutcome::Failed {
                kind: Some(ErrorKind::CredentialsRejected),
                message: "Login failed. Check your username and password.".into(),
            },
        );
        assert!(!login.busy);
        assert!(login.password.is_empty());
        assert_eq!(login.username, "alice");
        assert_eq!(
            login.error.as_deref(),
            Some("Login failed. Check your username and password.")
        );
    }

    #[test]
    fn test_paste_strips_control_chars() {
        let mut login = LoginState::new(LoginStrategy::Password);
        handle_paste(&mut login, "alice\n");
        assert_eq!(login.username, "alice");
    }
}
