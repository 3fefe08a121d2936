pub mod accounts;
pub mod identity;
pub mod invitations;
pub mod notification;
pub mod password_reset;
pub mod tokens;
