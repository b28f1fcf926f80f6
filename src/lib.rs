pub mod delivery;
pub mod engine;
pub mod model;
pub mod number;
pub mod queue;
pub mod render;
pub mod report;
pub mod store;

pub use engine::{AllocationError, JobError, allocate};
pub use model::{Category, GuardList, JobRequest, Packet, RequesterId};
pub use number::Number;
pub use queue::{CommitPoint, DispatchConfig, Dispatcher, job_channel};
