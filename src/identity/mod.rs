//! Identity core: credential verification at sign-in, stateless session
//! tokens, the per-request authentication gate and the authorization guard
//! chain. Keep the public surface thin and split implementation across
//! sub-modules.

mod principal;
mod token;
mod provider;
mod gate;
mod authorizer;

pub use principal::Principal;
pub use token::{Claims, TokenService};
pub use provider::{sign_in, SignInRequest, SignInResponse, UserView};
pub use gate::{authenticate, bearer_token, SESSION_COOKIE};
pub use authorizer::{
    apply, require_course_owner, require_educator, require_self, resolve_course, resolve_profile,
    Access, Guard,
};
