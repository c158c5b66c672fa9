pub mod audit;
pub mod board_service;
pub mod entity_store;
pub mod permission;
pub mod print_service;
pub mod realtime;
pub mod settings_service;

pub use audit::AuditService;
pub use board_service::BoardService;
pub use entity_store::EntityStore;
pub use permission::PermissionService;
pub use print_service::{HttpPrintRenderer, PdfDocument, PrintRenderer, PrintService};
pub use realtime::RealtimeService;
pub use settings_service::SettingsService;
