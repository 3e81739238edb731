pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod masking;
pub mod utils;

pub use auth::{
    AccessToken, CopilotAuthenticator, CopilotToken, DeviceCodeInfo, DeviceFlow, PollSchedule,
    PollState,
};
pub use clock::{RecordingSleeper, Sleeper, TokioSleeper};
pub use config::AuthConfig;
pub use error::{AuthError, Stage};
pub use masking::mask_secret;
pub use tokio_util::sync::CancellationToken;
