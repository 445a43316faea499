mod credentials;
mod guard;

pub use credentials::{Credentials, TokenSnapshot};
pub use guard::{IssuedTokens, TokenGuard};
