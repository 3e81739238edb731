mod authenticator;
mod device_code;
mod exchange;
mod flow;
mod poller;

pub use authenticator::CopilotAuthenticator;
pub use device_code::DeviceCodeInfo;
pub use exchange::CopilotToken;
pub use flow::DeviceFlow;
pub use poller::{AccessToken, PollSchedule, PollState, DEVICE_CODE_GRANT_TYPE};
