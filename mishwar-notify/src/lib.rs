pub mod dispatcher;
pub mod fcm;
pub mod push;
pub mod router;

pub use dispatcher::{DispatchSummary, Dispatcher};
pub use fcm::FcmClient;
pub use push::{MockPushProvider, PushNotification, PushProvider};
pub use router::NotificationRouter;
