pub mod category;
pub mod comment;
pub mod newtypes;
pub mod post;
pub mod user;

use serde::{Deserialize, Serialize};

pub static AUTH_COOKIE: &str = "auth";
pub static REFRESH_COOKIE: &str = "refresh";

#[derive(Deserialize, Serialize, Debug)]
pub struct SuccessResponse {
    success: bool,
}

impl Default for SuccessResponse {
    fn default() -> Self {
        Self { success: true }
    }
}
