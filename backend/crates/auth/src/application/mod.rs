//! Application Module - Use Cases

pub mod check;
pub mod config;
pub mod forgot;
pub mod ga2fa;
pub mod login;
pub mod logout;
pub mod reset;
pub mod roles;
pub mod signup;

pub use check::{CheckOutput, CheckUseCase};
pub use forgot::{ForgotOutput, ForgotUseCase};
pub use ga2fa::{Ga2faInput, Ga2faOutput, Ga2faUseCase};
pub use login::{LoginInput, LoginUseCase};
pub use logout::LogoutUseCase;
pub use reset::ResetUseCase;
pub use roles::RoleService;
pub use signup::{SignupInput, SignupUseCase};
