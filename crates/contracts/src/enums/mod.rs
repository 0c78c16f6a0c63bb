pub mod holiday_scope;
pub mod message_category;
pub mod ranking_kind;
pub mod seller_role;
pub mod trophy_kind;

pub use holiday_scope::HolidayScope;
pub use message_category::MessageCategory;
pub use ranking_kind::RankingKind;
pub use seller_role::SellerRole;
pub use trophy_kind::TrophyKind;
