mod node;
mod report;
mod sample;

pub use node::NodeConfig;
pub use report::{Observation, SyncReport};
pub use sample::{HealthFields, RawSample, SyncFields};
