pub mod account;
pub mod distributor;
pub mod id_set;
pub mod invitation;
pub mod outcome;
pub mod password_reset;
pub mod role;

pub use account::{Account, AccountPatch, CreateAccountInput};
pub use distributor::{Distributor, NewOrganization};
pub use invitation::{
    Invitation, InvitationPreview, InvitationRequest, InvitationStatus, InvitationSummary,
};
pub use outcome::{OperationWarning, Outcome};
pub use password_reset::PasswordReset;
pub use role::{InviteRole, Role};
