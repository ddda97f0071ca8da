pub mod create;
pub mod edit;
pub mod form;
pub mod list;

pub use create::CreateController;
pub use edit::EditController;
pub use form::{Draft, FormState, Rejected, SubmitOutcome};
pub use list::{ActionError, ActionRejected, Counts, ListController, RefreshTicket};
