//! Well-known role name constants.
//!
//! These are the `role` claim values issued by the identity provider. Any
//! other role name is treated as a plain signed-in user.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_EDITOR: &str = "editor";
pub const ROLE_USER: &str = "user";
