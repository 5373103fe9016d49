//! PartScout core: pure session state machine, stream chunk model and result merging.
mod chunk;
mod effect;
mod msg;
mod request;
mod results;
mod state;
mod update;
mod view_model;

pub use chunk::{parse_line, Chunk, OfferRecord};
pub use effect::Effect;
pub use msg::Msg;
pub use request::{SearchBody, SearchRequest, SessionId, StopBody};
pub use results::{apply, AccumulatedResult};
pub use state::{
    normalize_base_url, AppState, SessionState, DEFAULT_BASE_URL, STOPPED_STATUS,
    UNREACHABLE_MESSAGE, UNREACHABLE_STATUS,
};
pub use update::update;
pub use view_model::AppViewModel;
