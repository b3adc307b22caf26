//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument, or `&mut PgConnection` where the call has
//! to take part in a caller-owned transaction.

pub mod applicant_repo;
pub mod audit_log_repo;
pub mod automation_repo;
pub mod client_repo;
pub mod client_settings_repo;
pub mod email_template_repo;
pub mod firing_record_repo;
pub mod notification_preference_repo;
pub mod notification_repo;
pub mod pipeline_status_repo;
pub mod portal_user_repo;
pub mod reminder_repo;
pub mod review_queue_repo;

pub use applicant_repo::ApplicantRepo;
pub use audit_log_repo::AuditLogRepo;
pub use automation_repo::AutomationRepo;
pub use client_repo::ClientRepo;
pub use client_settings_repo::ClientSettingsRepo;
pub use email_template_repo::EmailTemplateRepo;
pub use firing_record_repo::FiringRecordRepo;
pub use notification_preference_repo::NotificationPreferenceRepo;
pub use notification_repo::NotificationRepo;
pub use pipeline_status_repo::PipelineStatusRepo;
pub use portal_user_repo::PortalUserRepo;
pub use reminder_repo::ReminderRepo;
pub use review_queue_repo::ReviewQueueRepo;
