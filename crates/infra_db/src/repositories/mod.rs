//! Repository implementations

pub mod users;
pub mod accidents;
pub mod claims;
pub mod notifications;

pub use users::UserRepository;
pub use accidents::AccidentRepository;
pub use claims::ClaimsRepository;
pub use notifications::NotificationRepository;
