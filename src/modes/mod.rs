pub mod headless;
pub mod spectate;

pub use headless::HeadlessMode;
pub use spectate::SpectateMode;
