//! 도메인 모델.

mod card;
mod lockout;
mod profile;
mod user;

pub use card::Card;
pub use lockout::{FailureDecision, LockoutPolicy, UnblockDecision};
pub use profile::{Address, Image, PersonName};
pub use user::User;
