//! Telegram Mini App authentication.

mod init_data;
mod middleware;

pub use init_data::{InitDataValidator, TelegramUser};
pub use middleware::AuthUser;
pub(crate) use middleware::authenticate;

#[cfg(test)]
pub(crate) use init_data::testing;
