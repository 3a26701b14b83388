pub mod admin;
pub mod admin_session;
pub mod complaint;

pub use admin::{Entity as Admin, Model as AdminModel};
pub use admin_session::{Entity as AdminSession, Model as AdminSessionModel};
pub use complaint::{Entity as Complaint, Model as ComplaintModel};
