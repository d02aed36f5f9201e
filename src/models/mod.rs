mod info;
mod notification;

pub(crate) use info::info_map;
pub use info::{InfoMap, InfoValue};
pub use notification::{AlertStyle, AuthorizationStatus, NotificationSetting, NotificationSettings};
