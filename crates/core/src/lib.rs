pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use error::{CampaignError, CampaignResult};
pub use store::CampaignStore;
pub use types::{Campaign, CampaignStatus, Metric, MetricSample, MetricSeries};
