pub mod dispatcher;
pub mod images;
pub mod policy;
pub mod sender;
pub mod whatsapp;

pub use dispatcher::{Notifier, NotifyReport, NotifyRequest};
pub use images::find_ranking_images;
pub use policy::{NotificationPolicy, Shift};
pub use sender::{DryRunSender, MessageSender};
pub use whatsapp::WhatsAppWebSender;
