pub mod contact;
pub mod notification;
pub mod request;
pub mod user;

pub use contact::*;
pub use notification::*;
pub use request::*;
pub use user::*;
