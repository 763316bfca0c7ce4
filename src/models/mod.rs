pub mod checklist;
pub mod crew_member;
pub mod daily_log;
pub mod handover_log;
pub mod note;
pub mod permit;
pub mod signature;
