mod profile;
mod session;
mod settings;
mod task;

pub use profile::{Profile, DEFAULT_PROFILE_ID};
pub use session::{Session, SessionKind};
pub use settings::{Settings, MAX_POMODORO_MINUTES, MIN_POMODORO_MINUTES};
pub use task::Task;
