pub mod a101_seller;
pub mod a102_daily_result;
pub mod a103_trophy;
pub mod a104_weekly_goal;
pub mod a105_weekly_result;
pub mod a106_holiday;
pub mod a107_message_template;
pub mod a108_notification;
pub mod a109_ranking_badge;
