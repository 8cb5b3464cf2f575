//! Fixed API endpoints outside the datastore.
//!
//! Each function maps its arguments to one endpoint's query parameters and
//! returns the decoded response. Company search is the only paginated one.

mod catalogue;
mod companies;
mod events;
mod soft_skills;
mod training;

pub use catalogue::*;
pub use companies::*;
pub use events::*;
pub use soft_skills::*;
pub use training::*;
