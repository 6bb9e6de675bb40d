pub mod integrations;
pub mod model;
pub mod repo;
pub mod runner;

pub use integrations::{IntegrationConfig, IntegrationsRepo, NewIntegration};
pub use model::{Integration, NewVideo, Video, VideoStatus};
pub use repo::VideosRepo;
pub use runner::{RenderWorker, RunReport, WorkerError, WorkerSettings};
