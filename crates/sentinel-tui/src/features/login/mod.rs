//! Login surface: credential form (password grant) or browser prompt
//! (interactive).

mod render;
mod state;
mod update;

pub use render::render_login;
pub use state::{LoginField, LoginState};
pub use update::{LoginAction, handle_key, handle_outcome, handle_paste};
