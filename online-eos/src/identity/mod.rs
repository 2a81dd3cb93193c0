//! Identity linking across the account and game-service domains.
//!
//! ```text
//! NoIdentity --login--> FirstStagePending --ok--> FirstStageAuthenticated
//!     --id token--> SecondStagePending --ok--> Linked
//! FirstStagePending --stale credential--> NoIdentity (scrub, retry via portal once)
//! SecondStagePending --unknown user--> create user once --> SecondStagePending
//! anything else --> Failed
//! ```

mod login;
mod state;

pub use login::{begin_login, forget, logout};
pub use state::{IdentityState, LocalIdentity};
