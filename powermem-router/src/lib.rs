pub mod router;
pub mod state;

pub use router::{ReadTarget, Router, SubStore};
pub use state::{SubStoreState, SubStoreStatus};
