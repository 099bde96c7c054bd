//! Presentation-facing controllers: the paginated browse session and the detail view.

mod browse;
mod detail;
mod snapshot;
mod state;

pub use browse::BrowseSession;
pub use detail::{DetailSession, DetailState};
pub use snapshot::SessionSnapshot;
pub use state::{BrowseState, Phase};
